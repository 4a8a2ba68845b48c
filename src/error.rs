//! Error types for the docshift library.
//!
//! A single [`RelayError`] enum covers every failure mode of the pipeline.
//! The variants map one-to-one onto the stages that can fail: transport
//! (network), decode (provider response shape), auth (credentials), input
//! validation, provider-reported task failure, poll bounds, and the local
//! sink. The orchestrator never logs-and-continues: every fallible call
//! propagates its error here, and callers receive exactly one terminal
//! `Err` describing which stage broke.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the docshift library.
#[derive(Debug, Error)]
pub enum RelayError {
    // ── Transport errors ──────────────────────────────────────────────────
    /// Network, connection, or non-auth HTTP failure against the provider.
    #[error("Request to '{url}' failed: {reason}")]
    Transport { url: String, reason: String },

    /// The provider responded but the body did not match the expected shape.
    #[error("Malformed provider response while {context}: {reason}")]
    Decode { context: String, reason: String },

    /// Missing or rejected credential (config load, or HTTP 401/403).
    #[error("Authentication failed: {detail}")]
    Auth { detail: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Caller-supplied input rejected before any network traffic.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{}'", path.display())]
    FileNotFound { path: PathBuf },

    // ── Job errors ────────────────────────────────────────────────────────
    /// The provider reported a task in the job as failed.
    #[error("Conversion job failed in the '{operation}' stage: {detail}")]
    ProviderJob { operation: String, detail: String },

    /// The job never reached a terminal state within the poll bound.
    #[error("Job '{job_id}' still not terminal after {attempts} status checks")]
    DeadlineExceeded { job_id: String, attempts: u32 },

    /// The caller's cancellation token fired during polling.
    #[error("Conversion cancelled by caller")]
    Cancelled,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the local artifact sink.
    #[error("Failed to write artifact to '{}': {source}", path.display())]
    SinkWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Whether a retry of the same operation could plausibly succeed.
    ///
    /// Only transport failures qualify. Auth rejections, malformed
    /// responses, and provider-reported task failures are definitive:
    /// repeating the request would replay the same answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, RelayError::Transport { .. })
    }
}
