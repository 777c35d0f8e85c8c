//! Per-group summary statistics.
//!
//! Computes descriptive statistics, data-quality metrics and anomaly
//! rates for a dataset, grouped by a column (the sensor identifier by
//! default) and optionally subdivided into fixed time buckets.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::ingest::timestamps;
use crate::stats;
use crate::types::{
    COL_IS_ANOMALY, COL_QUALITY, COL_SENSOR, COL_TIMESTAMP, COL_VALUE, GroupSummary, QUALITY_GOOD,
    Summary,
};

/// Fixed-length bucketing of timestamps, aligned to epoch multiples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl TimeWindow {
    /// Bucket length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::Minutes(n) => n * 60_000,
            Self::Hours(n) => n * 3_600_000,
            Self::Days(n) => n * 86_400_000,
        }
    }

    /// Start of the bucket containing `epoch_ms`.
    fn bucket_start(&self, epoch_ms: i64) -> i64 {
        let len = self.duration_ms();
        epoch_ms.div_euclid(len) * len
    }
}

impl FromStr for TimeWindow {
    type Err = PipelineError;

    /// Parse compact specifiers like `15min`, `15m`, `1h`, `1d`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| PipelineError::InvalidTimeWindow(s.to_string()))?;

        let (digits, unit) = trimmed.split_at(split);
        let n: i64 = digits
            .parse()
            .map_err(|_| PipelineError::InvalidTimeWindow(s.to_string()))?;
        if n <= 0 {
            return Err(PipelineError::InvalidTimeWindow(s.to_string()));
        }

        match unit {
            "min" | "m" => Ok(Self::Minutes(n)),
            "h" => Ok(Self::Hours(n)),
            "d" => Ok(Self::Days(n)),
            _ => Err(PipelineError::InvalidTimeWindow(s.to_string())),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes(n) => write!(f, "{}min", n),
            Self::Hours(n) => write!(f, "{}h", n),
            Self::Days(n) => write!(f, "{}d", n),
        }
    }
}

/// Accumulates one group's rows before metrics are derived.
#[derive(Debug, Default)]
struct GroupAccumulator {
    values: Vec<f64>,
    count: usize,
    null_count: usize,
    good_count: usize,
    anomaly_count: usize,
}

impl GroupAccumulator {
    fn push(&mut self, value: Option<f64>, good: bool, anomaly: bool) {
        self.count += 1;
        match value {
            Some(v) => self.values.push(v),
            None => self.null_count += 1,
        }
        if good {
            self.good_count += 1;
        }
        if anomaly {
            self.anomaly_count += 1;
        }
    }

    fn into_summary(self, has_quality: bool, has_anomalies: bool) -> GroupSummary {
        GroupSummary {
            mean: stats::mean(&self.values),
            std: stats::sample_std(&self.values),
            min: stats::min(&self.values),
            max: stats::max(&self.values),
            count: self.count,
            null_count: self.null_count,
            good_quality_pct: has_quality
                .then(|| (self.good_count as f64 / self.count as f64) * 100.0),
            anomaly_rate: has_anomalies
                .then(|| self.anomaly_count as f64 / self.count as f64),
        }
    }
}

/// Computes per-group summaries over a (cleaned, optionally
/// anomaly-annotated) dataset.
#[derive(Debug, Default, Clone, Copy)]
pub struct Summarizer;

impl Summarizer {
    pub fn new() -> Self {
        Self
    }

    /// Summarize `data` grouped by `group_by` (default: the sensor
    /// column), optionally subdivided into `time_window` buckets.
    ///
    /// Value statistics ignore missing readings; a group with no valid
    /// reading keeps its `count`/`null_count` but reports no
    /// `mean`/`std`/`min`/`max`. `good_quality_pct` and `anomaly_rate`
    /// are only present when the corresponding column exists. Rows with
    /// a null group value (or, with a window, a null timestamp) belong
    /// to no group.
    pub fn summarize(
        &self,
        data: &DataFrame,
        group_by: Option<&str>,
        time_window: Option<TimeWindow>,
    ) -> Result<Summary> {
        if data.height() == 0 {
            return Err(PipelineError::EmptyDataset);
        }

        let group_column = group_by.unwrap_or(COL_SENSOR);
        if !stats::has_column(data, group_column) {
            return Err(PipelineError::ColumnNotFound(group_column.to_string()));
        }
        if !stats::has_column(data, COL_VALUE) {
            return Err(PipelineError::ColumnNotFound(COL_VALUE.to_string()));
        }

        let groups = stats::string_values(data.column(group_column)?.as_materialized_series())?;
        let values = stats::numeric_values(data.column(COL_VALUE)?.as_materialized_series())?;

        let has_quality = stats::has_column(data, COL_QUALITY);
        let good_flags: Vec<bool> = if has_quality {
            stats::string_values(data.column(COL_QUALITY)?.as_materialized_series())?
                .iter()
                .map(|q| {
                    q.as_deref()
                        .is_some_and(|q| q.eq_ignore_ascii_case(QUALITY_GOOD))
                })
                .collect()
        } else {
            vec![false; data.height()]
        };

        let has_anomalies = stats::has_column(data, COL_IS_ANOMALY);
        let anomaly_flags: Vec<bool> = if has_anomalies {
            data.column(COL_IS_ANOMALY)?
                .as_materialized_series()
                .cast(&DataType::Boolean)?
                .bool()?
                .into_iter()
                .map(|v| v.unwrap_or(false))
                .collect()
        } else {
            vec![false; data.height()]
        };

        let bucket_starts: Option<Vec<Option<i64>>> = match time_window {
            Some(window) => {
                if !stats::has_column(data, COL_TIMESTAMP) {
                    return Err(PipelineError::ColumnNotFound(COL_TIMESTAMP.to_string()));
                }
                let epoch_ms = timestamps::coerce_to_epoch_ms(
                    data.column(COL_TIMESTAMP)?.as_materialized_series(),
                )?;
                Some(
                    epoch_ms
                        .iter()
                        .map(|ts| ts.map(|ts| window.bucket_start(ts)))
                        .collect(),
                )
            }
            None => None,
        };

        let mut accumulators: BTreeMap<String, GroupAccumulator> = BTreeMap::new();
        for row in 0..data.height() {
            let Some(group) = groups[row].as_deref() else {
                continue;
            };

            let key = match &bucket_starts {
                Some(starts) => {
                    let Some(start) = starts[row] else {
                        continue;
                    };
                    format!("{} @ {}", group, format_bucket(start))
                }
                None => group.to_string(),
            };

            accumulators.entry(key).or_default().push(
                values[row],
                good_flags[row],
                anomaly_flags[row],
            );
        }

        Ok(accumulators
            .into_iter()
            .map(|(key, acc)| (key, acc.into_summary(has_quality, has_anomalies)))
            .collect())
    }
}

/// Render a bucket start for use in summary keys.
fn format_bucket(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}

/// Summarize with the default grouping column (`sensor`).
pub fn summarize_metrics(
    data: &DataFrame,
    group_by: Option<&str>,
    time_window: Option<TimeWindow>,
) -> Result<Summary> {
    Summarizer::new().summarize(data, group_by, time_window)
}
