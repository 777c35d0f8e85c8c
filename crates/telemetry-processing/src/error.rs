//! Custom error types for the telemetry pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Every
//! failure mode is a caller-input problem detected up front; numeric
//! degeneracies (zero spread, all-null groups) are handled with neutral
//! values inside the stages and never surface here.
//!
//! Errors are serializable so they can be forwarded to an operator UI
//! or log sink as `{code, message}` pairs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the telemetry pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The batch collection passed to ingestion was empty.
    #[error("Data batches must be a non-empty collection")]
    EmptyBatchCollection,

    /// Every batch in the collection was empty or malformed.
    #[error("All data batches are empty or invalid")]
    NoValidBatches,

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// The requested sensor has no rows in the dataset.
    #[error("Sensor '{0}' not found in the data")]
    SensorNotFound(String),

    /// The requested detection method is not supported.
    #[error("Method '{0}' not supported. Choose from zscore, iqr, rolling")]
    UnsupportedMethod(String),

    /// Too few valid readings to run a detection method.
    #[error(
        "Insufficient data for anomaly detection for sensor '{sensor}': \
         {valid} valid readings, need at least {required}"
    )]
    InsufficientData {
        sensor: String,
        valid: usize,
        required: usize,
    },

    /// The dataset has no rows.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// A time-window specifier could not be parsed.
    #[error("Invalid time window '{0}' (expected forms like '15min', '1h', '1d')")]
    InvalidTimeWindow(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for frontend/log-sink handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBatchCollection => "EMPTY_BATCH_COLLECTION",
            Self::NoValidBatches => "NO_VALID_BATCHES",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::SensorNotFound(_) => "SENSOR_NOT_FOUND",
            Self::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::InvalidTimeWindow(_) => "INVALID_TIME_WINDOW",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a caller-input problem rather than
    /// an internal engine failure.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::EmptyBatchCollection
            | Self::NoValidBatches
            | Self::ColumnNotFound(_)
            | Self::SensorNotFound(_)
            | Self::UnsupportedMethod(_)
            | Self::InsufficientData { .. }
            | Self::EmptyDataset
            | Self::InvalidTimeWindow(_)
            | Self::InvalidConfig(_) => true,
            Self::Polars(_) => false,
            Self::WithContext { source, .. } => source.is_input_error(),
        }
    }
}

impl From<crate::config::ConfigValidationError> for PipelineError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        PipelineError::InvalidConfig(err.to_string())
    }
}

/// Serialize implementation for IPC/log-sink compatibility.
///
/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}
