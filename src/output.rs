//! Output types returned by the orchestrator.

use serde::Serialize;
use std::path::PathBuf;

/// Result of one completed conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The converted artifact, when fetched into memory.
    /// `None` when the caller streamed it to a file instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,

    /// Where the artifact was written, for file-sink conversions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Provider-assigned job identifier, for support and audit trails.
    pub job_id: String,

    /// Timing and effort counters for the run.
    pub stats: ConversionStats,
}

/// Counters and stage timings for one conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Status checks performed, including the terminal one.
    pub poll_attempts: u32,
    /// Transport failures retried during polling.
    pub transient_retries: u32,
    /// Size of the converted artifact in bytes.
    pub artifact_bytes: u64,
    /// Time spent submitting the job.
    pub submit_ms: u64,
    /// Time spent polling to a terminal state (including sleeps).
    pub poll_ms: u64,
    /// Time spent downloading the artifact.
    pub download_ms: u64,
    /// Wall-clock time for the whole pipeline.
    pub total_ms: u64,
}
