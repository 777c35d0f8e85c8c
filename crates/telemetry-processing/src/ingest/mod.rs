//! Batch ingestion and cleaning.
//!
//! Merges raw per-batch frames into one validated dataset:
//! heterogeneous or malformed batches are skipped, timestamps are coerced
//! to `Datetime(Milliseconds)`, and (when validation is on) rows with
//! missing timestamps or values, exact duplicates, and BAD-quality rows
//! are dropped before the frame is time-sorted and its global outlier
//! band computed.

pub(crate) mod timestamps;

use std::sync::Arc;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::reporting::{QualityNotice, QualityReporter, TracingQualityReporter};
use crate::stats;
use crate::types::{
    COL_IS_OUTLIER, COL_QUALITY, COL_SENSOR, COL_TIMESTAMP, COL_VALUE, QUALITY_BAD,
    QUALITY_UNCERTAIN, REQUIRED_COLUMNS,
};

/// Canonical columns of a batch, extracted into uniform storage so
/// batches with differing dtypes can be concatenated.
#[derive(Debug, Default)]
struct RawColumns {
    timestamps: Vec<Option<i64>>,
    sensors: Vec<Option<String>>,
    values: Vec<Option<f64>>,
    qualities: Vec<Option<String>>,
}

impl RawColumns {
    fn append(&mut self, mut other: RawColumns) {
        self.timestamps.append(&mut other.timestamps);
        self.sensors.append(&mut other.sensors);
        self.values.append(&mut other.values);
        self.qualities.append(&mut other.qualities);
    }

    fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    fn into_frame(self) -> Result<DataFrame> {
        let columns = vec![
            timestamps::epoch_ms_series(COL_TIMESTAMP, self.timestamps)?.into(),
            Series::new(COL_SENSOR.into(), self.sensors).into(),
            Series::new(COL_VALUE.into(), self.values).into(),
            Series::new(COL_QUALITY.into(), self.qualities).into(),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

/// Ingests raw sensor batches into one cleaned dataset.
pub struct Ingestor {
    config: PipelineConfig,
    reporter: Arc<dyn QualityReporter>,
}

impl Ingestor {
    /// Create an ingestor reporting quality notices through `tracing`.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_reporter(config, Arc::new(TracingQualityReporter))
    }

    /// Create an ingestor with an injected quality reporter.
    pub fn with_reporter(config: PipelineConfig, reporter: Arc<dyn QualityReporter>) -> Self {
        Self { config, reporter }
    }

    /// Merge `batches` into a single dataset.
    ///
    /// With `validate` set, the cleaning steps run in a fixed order:
    /// drop null timestamps, drop exact duplicates, drop null values,
    /// normalize `quality` (upper-case, missing becomes UNCERTAIN),
    /// report and drop BAD rows, sort by time, and flag values outside
    /// the configured global quantile band as outliers. Without
    /// `validate`, the concatenated frame is returned with timestamps
    /// coerced and nothing removed.
    ///
    /// Batches that are empty, lack a required column, or cannot be
    /// coerced are skipped; only an input with no usable batch at all is
    /// an error.
    pub fn ingest(&self, batches: &[DataFrame], validate: bool) -> Result<DataFrame> {
        if batches.is_empty() {
            return Err(PipelineError::EmptyBatchCollection);
        }

        let mut combined = RawColumns::default();
        for (index, batch) in batches.iter().enumerate() {
            match canonicalize_batch(batch) {
                Some(columns) => combined.append(columns),
                None => debug!("Skipping batch {} (empty or malformed)", index),
            }
        }

        if combined.is_empty() {
            return Err(PipelineError::NoValidBatches);
        }

        let df = combined.into_frame()?;
        if !validate {
            return Ok(df);
        }

        self.clean(df)
    }

    fn clean(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;

        // 1. Remove rows with unparseable timestamps
        let before = df.height();
        let mask = df.column(COL_TIMESTAMP)?.as_materialized_series().is_not_null();
        df = df.filter(&mask)?;
        if df.height() < before {
            debug!("Removed {} rows with missing timestamps", before - df.height());
        }

        // 2. Remove exact-duplicate rows
        let before = df.height();
        df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        if df.height() < before {
            debug!("Removed {} duplicate rows", before - df.height());
        }

        // 3. Remove rows with missing values
        let before = df.height();
        let mask = df.column(COL_VALUE)?.as_materialized_series().is_not_null();
        df = df.filter(&mask)?;
        if df.height() < before {
            debug!("Removed {} rows with missing values", before - df.height());
        }

        // 4. Normalize quality flags: upper-case, missing becomes UNCERTAIN
        let qualities: Vec<String> = df
            .column(COL_QUALITY)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|q| match q {
                Some(q) => q.to_uppercase(),
                None => QUALITY_UNCERTAIN.to_string(),
            })
            .collect();
        df.replace(COL_QUALITY, Series::new(COL_QUALITY.into(), qualities))?;

        // 5. Report the BAD share, then drop those rows
        let quality_ca = df
            .column(COL_QUALITY)?
            .as_materialized_series()
            .str()?
            .clone();
        let bad_rows = quality_ca
            .into_iter()
            .filter(|q| *q == Some(QUALITY_BAD))
            .count();
        self.reporter
            .report(QualityNotice::bad_quality(df.height(), bad_rows));

        if bad_rows > 0 {
            let keep: Vec<bool> = quality_ca
                .into_iter()
                .map(|q| q != Some(QUALITY_BAD))
                .collect();
            let mask = BooleanChunked::from_slice("mask".into(), &keep);
            df = df.filter(&mask)?;
            debug!("Removed {} BAD-quality rows", bad_rows);
        }

        // 6. Sort by time
        df = df.sort(
            [COL_TIMESTAMP],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

        // 7. Flag values outside the global quantile band
        let values = stats::numeric_values(df.column(COL_VALUE)?.as_materialized_series())?;
        let valid = stats::valid_values(&values);
        let lower = stats::quantile(&valid, self.config.outlier_lower_quantile);
        let upper = stats::quantile(&valid, self.config.outlier_upper_quantile);

        let flags: Vec<bool> = match (lower, upper) {
            (Some(lo), Some(hi)) => values
                .iter()
                .map(|v| v.map(|v| v < lo || v > hi).unwrap_or(false))
                .collect(),
            // Everything was dropped during cleaning; keep the schema, flag nothing
            _ => vec![false; df.height()],
        };
        df.with_column(Series::new(COL_IS_OUTLIER.into(), flags))?;

        Ok(df)
    }
}

/// Extract the canonical columns from a batch, or `None` when the batch
/// cannot take part in ingestion.
fn canonicalize_batch(batch: &DataFrame) -> Option<RawColumns> {
    if batch.height() == 0 {
        return None;
    }

    for column in REQUIRED_COLUMNS {
        if !stats::has_column(batch, column) {
            warn!("Skipping batch without required column '{}'", column);
            return None;
        }
    }

    let extract = || -> Result<RawColumns> {
        Ok(RawColumns {
            timestamps: timestamps::coerce_to_epoch_ms(
                batch.column(COL_TIMESTAMP)?.as_materialized_series(),
            )?,
            sensors: stats::string_values(batch.column(COL_SENSOR)?.as_materialized_series())?,
            values: stats::numeric_values(batch.column(COL_VALUE)?.as_materialized_series())?,
            qualities: stats::string_values(batch.column(COL_QUALITY)?.as_materialized_series())?,
        })
    };

    match extract() {
        Ok(columns) => Some(columns),
        Err(e) => {
            warn!("Skipping batch with uncoercible columns: {}", e);
            None
        }
    }
}

/// Ingest batches with the default configuration and `tracing` reporting.
pub fn ingest_data(batches: &[DataFrame], validate: bool) -> Result<DataFrame> {
    Ingestor::new(PipelineConfig::default()).ingest(batches, validate)
}
