//! Per-sensor anomaly detection.
//!
//! Scores one target sensor's readings against its own statistical
//! behavior and annotates the full dataset with the result. Three
//! interchangeable methods are supported; all of them treat numeric
//! degeneracies (zero spread, short windows) as "nothing to flag"
//! rather than errors.

mod scores;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use tracing::warn;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::stats;
use crate::types::{
    COL_ANOMALY_SCORE, COL_DETECTION_METHOD, COL_IS_ANOMALY, COL_SENSOR, COL_TIMESTAMP, COL_VALUE,
    METHOD_NONE,
};

/// Default sensitivity threshold for all detection methods.
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Minimum non-missing readings a sensor needs before any method runs.
const MIN_VALID_READINGS: usize = 2;

/// Statistical method used to score a sensor's readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionMethod {
    /// Standard score against the sensor's global mean/std.
    ZScore,
    /// Quartile fences: beyond `threshold * IQR` outside Q1/Q3.
    Iqr,
    /// Standard score against a trailing window of recent readings.
    Rolling,
}

impl DetectionMethod {
    /// The wire name recorded in the `detection_method` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZScore => "zscore",
            Self::Iqr => "iqr",
            Self::Rolling => "rolling",
        }
    }
}

impl FromStr for DetectionMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zscore" => Ok(Self::ZScore),
            "iqr" => Ok(Self::Iqr),
            "rolling" => Ok(Self::Rolling),
            other => Err(PipelineError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores readings of a single sensor and annotates the full dataset.
pub struct AnomalyDetector {
    config: PipelineConfig,
}

impl AnomalyDetector {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Annotate `data` with `is_anomaly`, `anomaly_score` and
    /// `detection_method` columns for `sensor_name`.
    ///
    /// Statistics are computed over the sensor's non-missing values only,
    /// in the dataset's row order (time order for cleaned data). Rows of
    /// other sensors, and readings the method cannot judge, receive the
    /// defaults `false` / `0.0` / `"none"`. No other column is touched
    /// and the row count is preserved.
    pub fn detect(
        &self,
        data: &DataFrame,
        sensor_name: &str,
        method: DetectionMethod,
        threshold: f64,
    ) -> Result<DataFrame> {
        if !stats::has_column(data, COL_SENSOR) {
            return Err(PipelineError::ColumnNotFound(COL_SENSOR.to_string()));
        }
        if !stats::has_column(data, COL_VALUE) {
            return Err(PipelineError::ColumnNotFound(COL_VALUE.to_string()));
        }

        let sensors = stats::string_values(data.column(COL_SENSOR)?.as_materialized_series())?;
        let indices: Vec<usize> = sensors
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_deref() == Some(sensor_name))
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            return Err(PipelineError::SensorNotFound(sensor_name.to_string()));
        }

        let all_values = stats::numeric_values(data.column(COL_VALUE)?.as_materialized_series())?;
        let subset: Vec<Option<f64>> = indices.iter().map(|i| all_values[*i]).collect();

        let valid = subset.iter().filter(|v| v.is_some()).count();
        if valid < MIN_VALID_READINGS {
            return Err(PipelineError::InsufficientData {
                sensor: sensor_name.to_string(),
                valid,
                required: MIN_VALID_READINGS,
            });
        }

        self.warn_on_duplicate_keys(data, sensor_name, &indices)?;

        let scored = match method {
            DetectionMethod::ZScore => scores::zscore(&subset, threshold),
            DetectionMethod::Iqr => scores::iqr(&subset, threshold),
            DetectionMethod::Rolling => scores::rolling(
                &subset,
                threshold,
                self.config.rolling_window,
                self.config.rolling_min_samples,
            ),
        };

        // Annotate by row identity: analyzed rows get their own result,
        // everything else the defaults
        let height = data.height();
        let mut flags = vec![false; height];
        let mut score_values = vec![0.0f64; height];
        let mut methods = vec![METHOD_NONE; height];

        for (position, row) in indices.iter().enumerate() {
            let reading = scored[position];
            flags[*row] = reading.is_anomaly;
            score_values[*row] = reading.score.unwrap_or(0.0);
            methods[*row] = method.as_str();
        }

        let mut result = data.clone();
        result.with_column(Series::new(COL_IS_ANOMALY.into(), flags))?;
        result.with_column(Series::new(COL_ANOMALY_SCORE.into(), score_values))?;
        result.with_column(Series::new(COL_DETECTION_METHOD.into(), methods))?;
        Ok(result)
    }

    /// The original merge semantics keyed on `(timestamp, sensor)`; that
    /// key is unique for stage-1 output but nothing enforces it here.
    /// Annotation is positional so duplicates stay well-defined, but make
    /// the degradation visible to operators.
    fn warn_on_duplicate_keys(
        &self,
        data: &DataFrame,
        sensor_name: &str,
        indices: &[usize],
    ) -> Result<()> {
        if !stats::has_column(data, COL_TIMESTAMP) {
            return Ok(());
        }

        let ts_column = data.column(COL_TIMESTAMP)?.as_materialized_series();
        if !matches!(ts_column.dtype(), DataType::Datetime(_, _) | DataType::Date) {
            return Ok(());
        }

        let ts_ms = ts_column
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .cast(&DataType::Int64)?;
        let ts_values: Vec<Option<i64>> = ts_ms.i64()?.into_iter().collect();

        let mut seen = HashSet::new();
        for row in indices {
            if let Some(ts) = ts_values[*row]
                && !seen.insert(ts)
            {
                warn!(
                    "Sensor '{}' has duplicate readings at the same timestamp; \
                     scores are assigned per row",
                    sensor_name
                );
                return Ok(());
            }
        }
        Ok(())
    }
}

/// Detect anomalies with the default configuration, parsing the method
/// from its wire name (`zscore`, `iqr`, `rolling`).
pub fn detect_anomalies(
    data: &DataFrame,
    sensor_name: &str,
    method: &str,
    threshold: f64,
) -> Result<DataFrame> {
    let method = DetectionMethod::from_str(method)?;
    AnomalyDetector::new(PipelineConfig::default()).detect(data, sensor_name, method, threshold)
}
