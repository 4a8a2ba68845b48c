//! # docshift
//!
//! Drive a cloud document-conversion API (PDF ↔ Word) to completion.
//!
//! The heavy lifting (the conversion itself) belongs to the provider; this
//! crate owns the control flow around it: building the task graph,
//! submitting it, polling the job to a terminal state, and streaming the
//! converted artifact to a local sink without ever exposing a partial
//! file.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document bytes
//!  │
//!  ├─ 1. Encode  base64 payload + three-task graph (import → convert → export)
//!  ├─ 2. Submit  POST /jobs with bearer auth, obtain the job id
//!  ├─ 3. Poll    GET /jobs/{id} until Finished or Failed (bounded, cancellable)
//!  └─ 4. Fetch   stream the signed URL to memory or atomically to a file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docshift::{convert_to_file, DocumentFormat, RelayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads DOCSHIFT_API_KEY from the environment, failing fast if unset.
//!     let config = RelayConfig::from_env()?;
//!     let stats = convert_to_file(
//!         "files/report.pdf",
//!         DocumentFormat::Docx,
//!         "files/output.docx",
//!         &config,
//!     )
//!     .await?;
//!     eprintln!("done: {} bytes in {}ms", stats.artifact_bytes, stats.total_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! * One call, one job: each conversion submits and polls exactly one job,
//!   serially. Run calls on separate tasks for concurrency; they share no
//!   mutable state.
//! * Bounded polling: the loop stops after `max_poll_attempts` status
//!   checks and at every suspension point honours the caller's
//!   `CancellationToken`.
//! * No partial delivery: on any failure the error reaches the caller and
//!   no file is written to the destination path.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docshift` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod format;
pub mod model;
pub mod output;
pub mod poll;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::ApiClient;
pub use config::{RelayConfig, RelayConfigBuilder, API_KEY_ENV, DEFAULT_API_BASE};
pub use convert::{
    convert_bytes, convert_bytes_with_cancel, convert_file, convert_file_with_cancel,
    convert_sync, convert_to_file, convert_to_file_with_cancel,
};
pub use error::RelayError;
pub use format::DocumentFormat;
pub use output::{ConversionOutput, ConversionStats};
pub use poll::{evaluate_snapshot, JobState, PollReport, SnapshotVerdict};
pub use progress::ConversionObserver;

/// Re-exported so callers do not need a direct tokio-util dependency to
/// cancel a conversion.
pub use tokio_util::sync::CancellationToken;
