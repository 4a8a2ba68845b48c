//! Observer trait for conversion lifecycle events.
//!
//! Inject an `Arc<dyn ConversionObserver>` via
//! [`crate::config::RelayConfigBuilder::observer`] to receive events as the
//! pipeline submits, polls, and downloads. Callers can forward events to a
//! terminal spinner, a chat "please wait" message edit, or a metrics sink
//! without the library knowing how the host application communicates.
//!
//! All methods have default no-op implementations so implementors only
//! override what they care about. The trait is `Send + Sync`: independent
//! conversions may run on separate tokio tasks sharing one observer.

use crate::error::RelayError;

/// Called by the conversion pipeline as the job advances.
pub trait ConversionObserver: Send + Sync {
    /// The provider accepted the job and assigned an identifier.
    fn on_submitted(&self, job_id: &str) {
        let _ = job_id;
    }

    /// A status check is about to run. `attempt` is 1-indexed and bounded
    /// by `max` (the configured `max_poll_attempts`).
    fn on_poll(&self, attempt: u32, max: u32) {
        let _ = (attempt, max);
    }

    /// The export task published a result URL; the download is starting.
    fn on_download_start(&self, url: &str) {
        let _ = url;
    }

    /// The artifact was fully written to the sink.
    fn on_complete(&self, artifact_bytes: u64) {
        let _ = artifact_bytes;
    }

    /// The pipeline is returning an error to the caller.
    fn on_failed(&self, error: &RelayError) {
        let _ = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counting {
        polls: AtomicU32,
    }

    impl ConversionObserver for Counting {
        fn on_poll(&self, _attempt: u32, _max: u32) {
            self.polls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn default_methods_are_noops() {
        let obs = Counting::default();
        obs.on_submitted("job123");
        obs.on_download_start("https://x/out.docx");
        obs.on_complete(1024);
        obs.on_failed(&RelayError::Cancelled);
        obs.on_poll(1, 60);
        assert_eq!(obs.polls.load(Ordering::SeqCst), 1);
    }
}
