//! Authenticated HTTP transport against the conversion provider.
//!
//! [`ApiClient`] is stateless beyond the bearer token and base URL it is
//! constructed with; one instance can serve any number of sequential or
//! concurrent conversions. All provider-specific status-code mapping lives
//! here so the poller and orchestrator deal only in [`RelayError`] kinds:
//! 401/403 become [`RelayError::Auth`], other non-2xx and connection
//! failures become [`RelayError::Transport`], and undecodable bodies become
//! [`RelayError::Decode`].

use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::model::{JobEnvelope, JobRequest, JobSnapshot};
use reqwest::StatusCode;
use tracing::{debug, info};

/// HTTP client for the provider's jobs API and signed download URLs.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    download: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl ApiClient {
    /// Build a client from the relay configuration.
    ///
    /// Two underlying `reqwest::Client`s are kept: one with the short
    /// request timeout for the JSON endpoints, one with the longer
    /// download timeout for artifact streaming.
    pub fn new(config: &RelayConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RelayError::Internal(format!("building HTTP client: {e}")))?;
        let download = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .build()
            .map_err(|e| RelayError::Internal(format!("building download client: {e}")))?;

        Ok(Self {
            http,
            download,
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// The jobs collection endpoint.
    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.api_base)
    }

    /// The endpoint for one job resource.
    fn job_url(&self, job_id: &str) -> String {
        format!("{}/jobs/{}", self.api_base, job_id)
    }

    /// Submit a job, returning the provider's initial snapshot of it.
    ///
    /// The returned snapshot always carries a non-empty job id; an id-less
    /// acceptance is treated as a decode failure.
    pub async fn submit_job(&self, request: &JobRequest) -> Result<JobSnapshot, RelayError> {
        let url = self.jobs_url();
        debug!("Submitting job to {url}");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let snapshot = self.decode_job(response, "submitting job").await?;
        info!("Job created: {}", snapshot.id);
        Ok(snapshot)
    }

    /// Fetch the current snapshot of a job.
    pub async fn fetch_job_status(&self, job_id: &str) -> Result<JobSnapshot, RelayError> {
        let url = self.job_url(job_id);
        debug!("Checking status of job {job_id}");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        self.decode_job(response, "checking job status").await
    }

    /// Open a download of the artifact behind a provider-signed URL.
    ///
    /// Signed URLs embed their own authorisation, so no bearer header is
    /// sent. Body streaming is left to the caller (see [`crate::fetch`]).
    pub async fn download(&self, url: &str) -> Result<reqwest::Response, RelayError> {
        debug!("Downloading artifact from {url}");

        let response = self
            .download
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;

        if !response.status().is_success() {
            return Err(RelayError::Transport {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        Ok(response)
    }

    /// Map status codes and decode the job envelope from a JSON response.
    async fn decode_job(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<JobSnapshot, RelayError> {
        let status = response.status();
        let url = response.url().to_string();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Auth {
                detail: format!("provider returned HTTP {status}: {}", truncate(&body, 200)),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Transport {
                url,
                reason: format!("HTTP {status}: {}", truncate(&body, 200)),
            });
        }

        let envelope: JobEnvelope =
            response.json().await.map_err(|e| RelayError::Decode {
                context: context.to_string(),
                reason: e.to_string(),
            })?;

        if envelope.data.id.is_empty() {
            return Err(RelayError::Decode {
                context: context.to_string(),
                reason: "provider response carries an empty job id".into(),
            });
        }
        Ok(envelope.data)
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> RelayError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    RelayError::Transport {
        url: url.to_string(),
        reason,
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_tolerate_trailing_slash_in_base() {
        let config = RelayConfig::builder()
            .api_key("k")
            .api_base("https://api.example.com/v2/")
            .build()
            .unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.jobs_url(), "https://api.example.com/v2/jobs");
        assert_eq!(
            client.job_url("job123"),
            "https://api.example.com/v2/jobs/job123"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        // Multi-byte chars must not be split.
        assert_eq!(truncate("ééé", 2), "éé");
    }
}
