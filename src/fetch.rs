//! Result fetcher: stream a finished job's artifact to a local sink.
//!
//! The destination file must never exist in a half-written state. The body
//! is streamed chunk-by-chunk into a `.part` sibling of the destination,
//! flushed, and only then renamed over the final path. On any failure the
//! partial file is removed and the destination is left untouched.

use crate::client::ApiClient;
use crate::error::RelayError;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Download the artifact at `url` and write it atomically to `dest`.
///
/// Parent directories of `dest` are created as needed. Returns the number
/// of bytes written.
pub async fn fetch_artifact(
    client: &ApiClient,
    url: &str,
    dest: &Path,
) -> Result<u64, RelayError> {
    let response = client.download(url).await?;

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| sink_error(dest, e))?;
        }
    }

    let tmp_path = part_path(dest);
    let result = stream_to_file(response, &tmp_path, dest).await;

    match result {
        Ok(bytes) => {
            tokio::fs::rename(&tmp_path, dest)
                .await
                .map_err(|e| sink_error(dest, e))?;
            info!("Artifact written: {} ({bytes} bytes)", dest.display());
            Ok(bytes)
        }
        Err(err) => {
            // Leave no partial file behind.
            let _ = tokio::fs::remove_file(&tmp_path).await;
            Err(err)
        }
    }
}

/// Download the artifact at `url` into memory.
///
/// For callers that forward the bytes directly (e.g. as a chat attachment)
/// without touching the filesystem.
pub async fn fetch_artifact_bytes(
    client: &ApiClient,
    url: &str,
) -> Result<Vec<u8>, RelayError> {
    let response = client.download(url).await?;
    let bytes = response.bytes().await.map_err(|e| RelayError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    debug!("Artifact fetched into memory ({} bytes)", bytes.len());
    Ok(bytes.to_vec())
}

async fn stream_to_file(
    response: reqwest::Response,
    tmp_path: &Path,
    dest: &Path,
) -> Result<u64, RelayError> {
    let url = response.url().to_string();
    let mut file = tokio::fs::File::create(tmp_path)
        .await
        .map_err(|e| sink_error(dest, e))?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| RelayError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| sink_error(dest, e))?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(|e| sink_error(dest, e))?;
    Ok(written)
}

/// Sibling temp path for the in-flight download.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "artifact".into());
    name.push(".part");
    dest.with_file_name(name)
}

fn sink_error(dest: &Path, source: std::io::Error) -> RelayError {
    RelayError::SinkWrite {
        path: dest.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("files/output.docx")),
            PathBuf::from("files/output.docx.part")
        );
        assert_eq!(
            part_path(Path::new("output")),
            PathBuf::from("output.part")
        );
    }
}
