//! The status poller: drive a submitted job to a terminal state.
//!
//! The job lifecycle is `Submitted → Processing → Finished | Failed`.
//! `Processing` self-loops until the provider reports a terminal task
//! state, the configured attempt bound runs out, or the caller's
//! cancellation token fires. The transition rule itself is the pure
//! function [`evaluate_snapshot`]; the async loop around it only adds
//! scheduling (fixed interval sleeps, transient-error backoff) and the
//! two caller-imposed exits.
//!
//! Two error policies apply per status check:
//! * transport failures are transient and retried with exponential
//!   backoff (`retry_backoff_ms * 2^n`) up to `max_transient_retries`,
//!   without consuming poll attempts;
//! * decode failures, auth rejections, and provider-reported task errors
//!   are definitive and end the loop immediately.

use crate::client::ApiClient;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::model::{JobSnapshot, TaskState};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Observable states of a conversion job, as seen by this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Accepted by the provider; no status check has run yet.
    Submitted,
    /// At least one status check ran without reaching a terminal state.
    Processing { attempt: u32 },
    /// The export task published a result URL.
    Finished { url: String },
    /// A task failed, the poll bound ran out, or the caller cancelled.
    Failed { reason: String },
}

/// Verdict of a single status snapshot.
#[derive(Debug)]
pub enum SnapshotVerdict {
    /// Export finished with a downloadable URL.
    Finished(String),
    /// A task reported a definitive failure.
    Failed(RelayError),
    /// No terminal signal yet; keep polling.
    InProgress,
}

/// Evaluate one job snapshot against the terminal-state rules.
///
/// Every task is inspected, not just the export: a convert-stage `error`
/// with the export still `waiting` must fail the job rather than poll
/// until the deadline. The sole success signal is the export task
/// reporting `finished` with at least one result URL; a finished export
/// without a URL can never become downloadable and also fails.
pub fn evaluate_snapshot(snapshot: &JobSnapshot) -> SnapshotVerdict {
    for task in &snapshot.tasks {
        if task.status == TaskState::Error {
            return SnapshotVerdict::Failed(RelayError::ProviderJob {
                operation: task.operation.clone(),
                detail: task
                    .message
                    .clone()
                    .unwrap_or_else(|| "provider reported task status 'error'".into()),
            });
        }
    }

    match snapshot.export_task() {
        Some(export) if export.status == TaskState::Finished => match export.first_url() {
            Some(url) => SnapshotVerdict::Finished(url.to_string()),
            None => SnapshotVerdict::Failed(RelayError::ProviderJob {
                operation: export.operation.clone(),
                detail: "export task finished without a result URL".into(),
            }),
        },
        _ => SnapshotVerdict::InProgress,
    }
}

/// Poll `job_id` until it terminates, returning the artifact URL.
///
/// Respects `config.max_poll_attempts` (ending in
/// [`RelayError::DeadlineExceeded`]) and checks `cancel` at every
/// suspension point (ending in [`RelayError::Cancelled`]). On success the
/// number of status checks performed and transient retries spent are
/// reported through the returned [`PollReport`].
pub async fn poll_until_terminal(
    client: &ApiClient,
    job_id: &str,
    config: &RelayConfig,
    cancel: &CancellationToken,
) -> Result<PollReport, RelayError> {
    let mut transient_retries_total: u32 = 0;
    let mut state = JobState::Submitted;
    debug!(?state, "Polling job {job_id}");

    for attempt in 1..=config.max_poll_attempts {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }
        if let Some(ref obs) = config.observer {
            obs.on_poll(attempt, config.max_poll_attempts);
        }

        let snapshot =
            fetch_with_transient_retries(client, job_id, config, cancel, &mut transient_retries_total)
                .await?;

        match evaluate_snapshot(&snapshot) {
            SnapshotVerdict::Finished(url) => {
                state = JobState::Finished { url: url.clone() };
                debug!(?state, "Job {job_id} terminal after {attempt} status checks");
                return Ok(PollReport {
                    url,
                    attempts: attempt,
                    transient_retries: transient_retries_total,
                });
            }
            SnapshotVerdict::Failed(err) => {
                state = JobState::Failed {
                    reason: err.to_string(),
                };
                warn!(?state, "Job {job_id} terminal after {attempt} status checks");
                return Err(err);
            }
            SnapshotVerdict::InProgress => {
                state = JobState::Processing { attempt };
                debug!(
                    ?state,
                    "Job {job_id} not yet terminal (check {attempt}/{})",
                    config.max_poll_attempts
                );
            }
        }

        // Do not sleep after the final attempt; the bound is on checks.
        if attempt < config.max_poll_attempts {
            wait_or_cancel(config.poll_interval, cancel).await?;
        }
    }

    Err(RelayError::DeadlineExceeded {
        job_id: job_id.to_string(),
        attempts: config.max_poll_attempts,
    })
}

/// Outcome of a successful poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    /// Signed URL of the converted artifact.
    pub url: String,
    /// Status checks performed, including the terminal one.
    pub attempts: u32,
    /// Transport failures that were retried along the way.
    pub transient_retries: u32,
}

/// One status fetch, retrying transient transport errors with backoff.
async fn fetch_with_transient_retries(
    client: &ApiClient,
    job_id: &str,
    config: &RelayConfig,
    cancel: &CancellationToken,
    retries_spent: &mut u32,
) -> Result<JobSnapshot, RelayError> {
    let mut retry: u32 = 0;
    loop {
        match client.fetch_job_status(job_id).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) if err.is_transient() && retry < config.max_transient_retries => {
                retry += 1;
                *retries_spent += 1;
                let backoff = config.retry_backoff_ms * 2u64.pow(retry - 1);
                warn!(
                    "Status check for {job_id} failed ({err}); retry {retry}/{} in {backoff}ms",
                    config.max_transient_retries
                );
                wait_or_cancel(Duration::from_millis(backoff), cancel).await?;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Sleep for `duration`, racing the cancellation token.
async fn wait_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> Result<(), RelayError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(RelayError::Cancelled),
        _ = sleep(duration) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileRef, TaskResult, TaskStatus};

    fn task(operation: &str, status: TaskState) -> TaskStatus {
        TaskStatus {
            operation: operation.to_string(),
            status,
            result: None,
            message: None,
        }
    }

    fn snapshot(tasks: Vec<TaskStatus>) -> JobSnapshot {
        JobSnapshot {
            id: "job123".into(),
            tasks,
        }
    }

    fn finished_export(url: &str) -> TaskStatus {
        TaskStatus {
            operation: "export/url".into(),
            status: TaskState::Finished,
            result: Some(TaskResult {
                files: vec![FileRef {
                    url: url.to_string(),
                    filename: None,
                }],
            }),
            message: None,
        }
    }

    #[test]
    fn finished_export_with_url_terminates() {
        let snap = snapshot(vec![
            task("import/base64", TaskState::Finished),
            task("convert", TaskState::Finished),
            finished_export("https://x/out.docx"),
        ]);
        match evaluate_snapshot(&snap) {
            SnapshotVerdict::Finished(url) => assert_eq!(url, "https://x/out.docx"),
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn export_error_terminates_in_failure() {
        let snap = snapshot(vec![
            task("import/base64", TaskState::Finished),
            task("convert", TaskState::Finished),
            task("export/url", TaskState::Error),
        ]);
        match evaluate_snapshot(&snap) {
            SnapshotVerdict::Failed(RelayError::ProviderJob { operation, .. }) => {
                assert_eq!(operation, "export/url");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn convert_stage_error_fails_even_with_export_waiting() {
        // The export task alone would report "waiting" forever here.
        let snap = snapshot(vec![
            task("import/base64", TaskState::Finished),
            task("convert", TaskState::Error),
            task("export/url", TaskState::Waiting),
        ]);
        match evaluate_snapshot(&snap) {
            SnapshotVerdict::Failed(RelayError::ProviderJob { operation, .. }) => {
                assert_eq!(operation, "convert");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn finished_export_without_url_fails() {
        let mut export = task("export/url", TaskState::Finished);
        export.result = Some(TaskResult::default());
        let snap = snapshot(vec![export]);
        assert!(matches!(
            evaluate_snapshot(&snap),
            SnapshotVerdict::Failed(RelayError::ProviderJob { .. })
        ));
    }

    #[test]
    fn processing_export_keeps_polling() {
        let snap = snapshot(vec![
            task("import/base64", TaskState::Finished),
            task("convert", TaskState::Processing),
            task("export/url", TaskState::Waiting),
        ]);
        assert!(matches!(evaluate_snapshot(&snap), SnapshotVerdict::InProgress));
    }

    #[test]
    fn unknown_states_keep_polling() {
        let snap = snapshot(vec![task("export/url", TaskState::Unknown)]);
        assert!(matches!(evaluate_snapshot(&snap), SnapshotVerdict::InProgress));
    }

    #[test]
    fn missing_export_task_keeps_polling() {
        let snap = snapshot(vec![task("import/base64", TaskState::Processing)]);
        assert!(matches!(evaluate_snapshot(&snap), SnapshotVerdict::InProgress));
    }

    #[test]
    fn failure_detail_prefers_provider_message() {
        let mut convert = task("convert", TaskState::Error);
        convert.message = Some("password protected".into());
        let snap = snapshot(vec![convert]);
        match evaluate_snapshot(&snap) {
            SnapshotVerdict::Failed(err) => {
                assert!(err.to_string().contains("password protected"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wait_or_cancel_returns_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let err = wait_or_cancel(Duration::from_secs(60), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Cancelled));
    }
}
