//! Telemetry Processing Pipeline Library
//!
//! A data-quality and analytics pipeline for industrial sensor telemetry,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline is three sequential, independently callable stages, each a
//! pure transformation over a tabular dataset:
//!
//! - **Ingestion/Cleaning**: merges raw batches into one validated frame:
//!   timestamp coercion, de-duplication, quality normalization, BAD-row
//!   removal, time sorting and global outlier flagging
//! - **Anomaly Detection**: per-reading anomaly score and flag for one
//!   target sensor using z-score, IQR or rolling-window statistics
//! - **Summarization**: per-sensor (or per-group) descriptive statistics,
//!   data-quality metrics and anomaly rates, optionally in time buckets
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use telemetry_processing::{detect_anomalies, ingest_data, summarize_metrics};
//! use polars::prelude::*;
//!
//! // Merge and clean raw batches
//! let cleaned = ingest_data(&batches, true)?;
//!
//! // Score one sensor's readings against its own behavior
//! let annotated = detect_anomalies(&cleaned, "temperature", "zscore", 3.0)?;
//! let flagged = annotated.column("is_anomaly")?.bool()?.into_iter()
//!     .flatten()
//!     .filter(|f| *f)
//!     .count();
//! println!("Found {flagged} anomalies in temperature data");
//!
//! // Per-sensor report
//! let report = summarize_metrics(&annotated, None, None)?;
//! for (sensor, metrics) in &report {
//!     println!("{sensor}: {:?}", metrics);
//! }
//! ```
//!
//! # Configuration
//!
//! The ingestion outlier band and the rolling-window shape are
//! configurable through [`PipelineConfig`]:
//!
//! ```rust,ignore
//! use telemetry_processing::{AnomalyDetector, Ingestor, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .outlier_band(0.05, 0.95)
//!     .rolling_window(20)
//!     .build()?;
//!
//! let cleaned = Ingestor::new(config.clone()).ingest(&batches, true)?;
//! ```
//!
//! # Quality notices
//!
//! Ingestion reports the share of BAD-quality readings it dropped as one
//! advisory [`QualityNotice`] per call. The default sink is `tracing`;
//! inject a [`QualityReporter`] to capture it instead:
//!
//! ```rust,ignore
//! use telemetry_processing::{ClosureQualityReporter, Ingestor, PipelineConfig};
//! use std::sync::Arc;
//!
//! let ingestor = Ingestor::with_reporter(
//!     PipelineConfig::default(),
//!     Arc::new(ClosureQualityReporter::new(|notice| eprintln!("{}", notice.message))),
//! );
//! ```
//!
//! # Errors
//!
//! Every failure is a caller-input problem ([`PipelineError`], see
//! [`PipelineError::is_input_error`]) raised before any computation:
//! empty batch collections, unknown sensors, unsupported methods, missing
//! columns. Numeric degeneracies (zero spread, all-missing groups) are
//! handled with neutral values and never fail the pipeline.

pub mod config;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod reporting;
pub mod stats;
pub mod summary;
pub mod types;

// Re-exports for convenient access
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use detect::{AnomalyDetector, DEFAULT_THRESHOLD, DetectionMethod, detect_anomalies};
pub use error::{PipelineError, Result as PipelineResult, ResultExt};
pub use ingest::{Ingestor, ingest_data};
pub use reporting::{
    ClosureQualityReporter, QualityNotice, QualityReporter, TracingQualityReporter,
};
pub use summary::{Summarizer, TimeWindow, summarize_metrics};
pub use types::{
    COL_ANOMALY_SCORE, COL_DETECTION_METHOD, COL_IS_ANOMALY, COL_IS_OUTLIER, COL_QUALITY,
    COL_SENSOR, COL_TIMESTAMP, COL_VALUE, GroupSummary, METHOD_NONE, QUALITY_BAD, QUALITY_GOOD,
    QUALITY_UNCERTAIN, REQUIRED_COLUMNS, Summary,
};
