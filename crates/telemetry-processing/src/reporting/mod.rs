//! Advisory quality reporting for the ingestion stage.
//!
//! Ingestion emits one informational notice per call describing the share
//! of BAD-quality readings it saw before dropping them. The notice is
//! advisory output for operators, not part of the data contract; callers
//! that want to capture it (a UI, a metrics bridge, a test) inject a
//! [`QualityReporter`], everyone else gets the `tracing` default.
//!
//! # Example
//!
//! ```rust,ignore
//! use telemetry_processing::{ClosureQualityReporter, Ingestor, PipelineConfig};
//! use std::sync::Arc;
//!
//! let reporter = Arc::new(ClosureQualityReporter::new(|notice| {
//!     println!("{}", notice.message);
//! }));
//! let ingestor = Ingestor::with_reporter(PipelineConfig::default(), reporter);
//! let cleaned = ingestor.ingest(&batches, true)?;
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

/// Informational notice describing data quality observed during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityNotice {
    /// Rows present when the quality share was measured.
    pub total_rows: usize,

    /// Rows carrying a BAD quality flag.
    pub bad_rows: usize,

    /// `bad_rows` as a percentage of `total_rows`; 0.0 for an empty frame.
    pub bad_percentage: f64,

    /// Human-readable one-liner; advisory only, not meant to be parsed.
    pub message: String,
}

impl QualityNotice {
    /// Build the notice for a measured BAD-quality share.
    pub fn bad_quality(total_rows: usize, bad_rows: usize) -> Self {
        let bad_percentage = if total_rows == 0 {
            0.0
        } else {
            (bad_rows as f64 / total_rows as f64) * 100.0
        };
        Self {
            total_rows,
            bad_rows,
            bad_percentage,
            message: format!(
                "Batch evaluation: {:.2}% of readings are BAD",
                bad_percentage
            ),
        }
    }
}

/// Trait for receiving quality notices during ingestion.
///
/// Implementations must be `Send + Sync` so a shared reporter can be used
/// from worker threads feeding batches concurrently.
pub trait QualityReporter: Send + Sync {
    /// Called once per ingestion run with the measured quality share.
    fn report(&self, notice: QualityNotice);
}

/// Wrapper that implements [`QualityReporter`] using a closure.
pub struct ClosureQualityReporter<F>
where
    F: Fn(QualityNotice) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureQualityReporter<F>
where
    F: Fn(QualityNotice) + Send + Sync,
{
    /// Creates a new closure-based quality reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> QualityReporter for ClosureQualityReporter<F>
where
    F: Fn(QualityNotice) + Send + Sync,
{
    fn report(&self, notice: QualityNotice) {
        (self.callback)(notice);
    }
}

/// Default reporter: forwards the notice to the `tracing` info channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingQualityReporter;

impl QualityReporter for TracingQualityReporter {
    fn report(&self, notice: QualityNotice) {
        info!(
            total_rows = notice.total_rows,
            bad_rows = notice.bad_rows,
            "{}",
            notice.message
        );
    }
}

static_assertions::assert_impl_all!(QualityNotice: Send, Sync);
static_assertions::assert_impl_all!(TracingQualityReporter: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_bad_quality_percentage() {
        let notice = QualityNotice::bad_quality(4, 1);
        assert_eq!(notice.total_rows, 4);
        assert_eq!(notice.bad_rows, 1);
        assert!((notice.bad_percentage - 25.0).abs() < 1e-12);
        assert!(notice.message.contains("25.00%"));
    }

    #[test]
    fn test_bad_quality_empty_frame() {
        let notice = QualityNotice::bad_quality(0, 0);
        assert_eq!(notice.bad_percentage, 0.0);
    }

    #[test]
    fn test_closure_quality_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureQualityReporter::new(move |_notice| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(QualityNotice::bad_quality(10, 2));
        reporter.report(QualityNotice::bad_quality(5, 0));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reporter_across_threads() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = Arc::new(ClosureQualityReporter::new(move |_notice| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        let reporter_clone = reporter.clone();
        let handle = std::thread::spawn(move || {
            reporter_clone.report(QualityNotice::bad_quality(100, 30));
        });

        handle.join().expect("Thread should not panic");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_notice_json_serialization() {
        let notice = QualityNotice::bad_quality(200, 14);
        let json = serde_json::to_string(&notice).expect("Should serialize");

        assert!(json.contains("\"total_rows\":200"));
        assert!(json.contains("\"bad_rows\":14"));

        let deserialized: QualityNotice = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(deserialized.total_rows, 200);
        assert_eq!(deserialized.bad_rows, 14);
    }
}
