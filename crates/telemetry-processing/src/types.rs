//! Shared types and schema constants for the telemetry pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Canonical schema
// =============================================================================

/// Timestamp of a reading, stored as `Datetime(Milliseconds)` after ingestion.
pub const COL_TIMESTAMP: &str = "timestamp";

/// Identifier of the originating sensor.
pub const COL_SENSOR: &str = "sensor";

/// Numeric measurement; may be missing before cleaning.
pub const COL_VALUE: &str = "value";

/// Categorical trustworthiness flag (GOOD/BAD/UNCERTAIN).
pub const COL_QUALITY: &str = "quality";

/// Boolean column added by ingestion: value outside the global quantile band.
pub const COL_IS_OUTLIER: &str = "is_outlier";

/// Boolean column added by the anomaly detector.
pub const COL_IS_ANOMALY: &str = "is_anomaly";

/// Numeric severity column added by the anomaly detector.
pub const COL_ANOMALY_SCORE: &str = "anomaly_score";

/// Name of the method that produced a row's anomaly columns; `"none"` for
/// rows outside the analyzed sensor.
pub const COL_DETECTION_METHOD: &str = "detection_method";

/// Columns every raw batch must carry to take part in ingestion.
pub const REQUIRED_COLUMNS: [&str; 4] = [COL_TIMESTAMP, COL_SENSOR, COL_VALUE, COL_QUALITY];

/// Quality flag for a trustworthy reading.
pub const QUALITY_GOOD: &str = "GOOD";

/// Quality flag for a reading known to be bad; dropped during cleaning.
pub const QUALITY_BAD: &str = "BAD";

/// Quality flag for a reading of unknown trustworthiness; the default for
/// missing quality values.
pub const QUALITY_UNCERTAIN: &str = "UNCERTAIN";

/// Detection-method marker for rows the detector did not analyze.
pub const METHOD_NONE: &str = "none";

// =============================================================================
// Summaries
// =============================================================================

/// Per-group descriptive statistics and data-quality metrics.
///
/// `None` marks an undefined metric: an all-missing group has no
/// `mean`/`std`/`min`/`max`, a single valid reading has no sample `std`,
/// and `good_quality_pct`/`anomaly_rate` are absent when the input lacks
/// the corresponding column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Mean of non-missing values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,

    /// Sample standard deviation of non-missing values; requires at least
    /// two valid readings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,

    /// Minimum non-missing value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Maximum non-missing value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Total rows in the group, missing values included.
    pub count: usize,

    /// Rows whose `value` is missing.
    pub null_count: usize,

    /// Percentage of rows whose quality flag is GOOD (case-insensitive),
    /// over all rows of the group. An all-UNCERTAIN group reports 0.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good_quality_pct: Option<f64>,

    /// Fraction of rows flagged anomalous; only present when the input
    /// carries an `is_anomaly` column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_rate: Option<f64>,
}

/// Summary report: group key to per-group metrics.
///
/// Keys are the group value itself, or `"{group} @ {bucket start}"` when a
/// time window is requested (bucket start formatted `%Y-%m-%d %H:%M:%S`).
pub type Summary = BTreeMap<String, GroupSummary>;
