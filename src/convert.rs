//! Orchestrator: sequence encode → submit → poll → fetch as one call.
//!
//! Each entry point treats the pipeline as a single synchronous unit: the
//! caller is blocked (at the await point) until the job finishes or fails.
//! On failure nothing is delivered: the file-sink variant writes the
//! destination only after the download completed, and every error from any
//! stage surfaces as the function's `Err`.
//!
//! Independent conversions share no mutable state and may run concurrently
//! on separate tasks; callers writing to files are responsible for giving
//! each conversion its own destination path.

use crate::client::ApiClient;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::fetch;
use crate::format::DocumentFormat;
use crate::model::build_job_request;
use crate::output::{ConversionOutput, ConversionStats};
use crate::poll::{poll_until_terminal, PollReport};
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Convert an in-memory document, returning the converted bytes.
///
/// This is the primary entry point; the file-based variants wrap it.
///
/// # Errors
/// Any stage failure is returned as a single [`RelayError`]: input
/// validation, submission, polling (including deadline and cancellation),
/// and the download itself.
pub async fn convert_bytes(
    bytes: &[u8],
    file_name: &str,
    source: DocumentFormat,
    target: DocumentFormat,
    config: &RelayConfig,
) -> Result<ConversionOutput, RelayError> {
    convert_bytes_with_cancel(bytes, file_name, source, target, config, &CancellationToken::new())
        .await
}

/// [`convert_bytes`] with a caller-supplied cancellation token, checked at
/// every suspension point of the poll loop.
pub async fn convert_bytes_with_cancel(
    bytes: &[u8],
    file_name: &str,
    source: DocumentFormat,
    target: DocumentFormat,
    config: &RelayConfig,
    cancel: &CancellationToken,
) -> Result<ConversionOutput, RelayError> {
    let run = run_pipeline(bytes, file_name, source, target, config, cancel, None).await;
    notify_failure(config, &run);
    run
}

/// Convert a local file, returning the converted bytes.
///
/// The source format is inferred from the input path's extension.
pub async fn convert_file(
    input: impl AsRef<Path>,
    target: DocumentFormat,
    config: &RelayConfig,
) -> Result<ConversionOutput, RelayError> {
    convert_file_with_cancel(input, target, config, &CancellationToken::new()).await
}

/// [`convert_file`] with a caller-supplied cancellation token.
pub async fn convert_file_with_cancel(
    input: impl AsRef<Path>,
    target: DocumentFormat,
    config: &RelayConfig,
    cancel: &CancellationToken,
) -> Result<ConversionOutput, RelayError> {
    let (bytes, file_name, source) = read_input(input.as_ref()).await?;
    let run = run_pipeline(&bytes, &file_name, source, target, config, cancel, None).await;
    notify_failure(config, &run);
    run
}

/// Convert a local file and stream the artifact to `output_path`.
///
/// The destination is written atomically (temp sibling, then rename); on
/// failure no file appears at `output_path`.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    target: DocumentFormat,
    output_path: impl AsRef<Path>,
    config: &RelayConfig,
) -> Result<ConversionStats, RelayError> {
    convert_to_file_with_cancel(input, target, output_path, config, &CancellationToken::new())
        .await
}

/// [`convert_to_file`] with a caller-supplied cancellation token.
pub async fn convert_to_file_with_cancel(
    input: impl AsRef<Path>,
    target: DocumentFormat,
    output_path: impl AsRef<Path>,
    config: &RelayConfig,
    cancel: &CancellationToken,
) -> Result<ConversionStats, RelayError> {
    let (bytes, file_name, source) = read_input(input.as_ref()).await?;
    let run = run_pipeline(
        &bytes,
        &file_name,
        source,
        target,
        config,
        cancel,
        Some(output_path.as_ref()),
    )
    .await;
    notify_failure(config, &run);
    run.map(|output| output.stats)
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally; do not call from within
/// an async context.
pub fn convert_sync(
    input: impl AsRef<Path>,
    target: DocumentFormat,
    config: &RelayConfig,
) -> Result<ConversionOutput, RelayError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RelayError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert_file(input, target, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Read the input file and classify its format from the extension.
async fn read_input(path: &Path) -> Result<(Vec<u8>, String, DocumentFormat), RelayError> {
    let source = DocumentFormat::from_path(path)?;

    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RelayError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RelayError::InvalidInput {
                reason: format!("cannot read '{}': {e}", path.display()),
            }
        }
    })?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    Ok((bytes, file_name, source))
}

/// The full pipeline for one conversion.
#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    bytes: &[u8],
    file_name: &str,
    source: DocumentFormat,
    target: DocumentFormat,
    config: &RelayConfig,
    cancel: &CancellationToken,
    sink: Option<&Path>,
) -> Result<ConversionOutput, RelayError> {
    let total_start = Instant::now();
    info!("Converting '{file_name}' {source} -> {target}");

    // ── Encode and submit ────────────────────────────────────────────────
    let request = build_job_request(file_name, bytes, source, target)?;
    let client = ApiClient::new(config)?;

    let submit_start = Instant::now();
    let snapshot = client.submit_job(&request).await?;
    let submit_ms = submit_start.elapsed().as_millis() as u64;
    let job_id = snapshot.id.clone();

    if let Some(ref obs) = config.observer {
        obs.on_submitted(&job_id);
    }

    // ── Poll to a terminal state ─────────────────────────────────────────
    let poll_start = Instant::now();
    let PollReport {
        url,
        attempts,
        transient_retries,
    } = poll_until_terminal(&client, &job_id, config, cancel).await?;
    let poll_ms = poll_start.elapsed().as_millis() as u64;

    if let Some(ref obs) = config.observer {
        obs.on_download_start(&url);
    }

    // ── Fetch the artifact ───────────────────────────────────────────────
    let download_start = Instant::now();
    let (artifact_bytes, body, output_path) = match sink {
        Some(dest) => {
            let written = fetch::fetch_artifact(&client, &url, dest).await?;
            (written, None, Some(dest.to_path_buf()))
        }
        None => {
            let body = fetch::fetch_artifact_bytes(&client, &url).await?;
            (body.len() as u64, Some(body), None)
        }
    };
    let download_ms = download_start.elapsed().as_millis() as u64;

    let stats = ConversionStats {
        poll_attempts: attempts,
        transient_retries,
        artifact_bytes,
        submit_ms,
        poll_ms,
        download_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion of '{file_name}' complete: job {job_id}, {} status checks, {artifact_bytes} bytes in {}ms",
        stats.poll_attempts, stats.total_ms
    );
    if let Some(ref obs) = config.observer {
        obs.on_complete(artifact_bytes);
    }

    Ok(ConversionOutput {
        bytes: body,
        output_path,
        job_id,
        stats,
    })
}

/// Forward a pipeline failure to the observer, once, at the outermost seam.
fn notify_failure(config: &RelayConfig, run: &Result<ConversionOutput, RelayError>) {
    if let (Err(err), Some(obs)) = (run, config.observer.as_ref()) {
        obs.on_failed(err);
    }
}
