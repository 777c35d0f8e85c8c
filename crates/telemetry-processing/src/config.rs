//! Configuration types for the telemetry pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! The defaults reproduce the pipeline's documented behavior (1%/99%
//! outlier band, 10-reading rolling window); tune them per sensor fleet
//! when the defaults do not fit the field data.

use serde::{Deserialize, Serialize};

/// Configuration for the telemetry pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use telemetry_processing::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .outlier_band(0.05, 0.95)
///     .rolling_window(20)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Lower quantile of the global outlier band computed during ingestion.
    /// Values below this quantile are flagged as outliers.
    /// Default: 0.01 (1st percentile)
    pub outlier_lower_quantile: f64,

    /// Upper quantile of the global outlier band computed during ingestion.
    /// Values above this quantile are flagged as outliers.
    /// Default: 0.99 (99th percentile)
    pub outlier_upper_quantile: f64,

    /// Number of consecutive readings in the rolling-statistics window
    /// used by the `rolling` detection method.
    /// Default: 10
    pub rolling_window: usize,

    /// Minimum number of non-missing readings a window must hold before
    /// it produces a statistic. Windows below this yield no score.
    /// Default: 2
    pub rolling_min_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            outlier_lower_quantile: 0.01,
            outlier_upper_quantile: 0.99,
            rolling_window: 10,
            rolling_min_samples: 2,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.outlier_lower_quantile) {
            return Err(ConfigValidationError::InvalidQuantile {
                field: "outlier_lower_quantile".to_string(),
                value: self.outlier_lower_quantile,
            });
        }

        if !(0.0..=1.0).contains(&self.outlier_upper_quantile) {
            return Err(ConfigValidationError::InvalidQuantile {
                field: "outlier_upper_quantile".to_string(),
                value: self.outlier_upper_quantile,
            });
        }

        if self.outlier_lower_quantile >= self.outlier_upper_quantile {
            return Err(ConfigValidationError::InvertedBand {
                lower: self.outlier_lower_quantile,
                upper: self.outlier_upper_quantile,
            });
        }

        if self.rolling_min_samples < 2 {
            return Err(ConfigValidationError::InvalidMinSamples(
                self.rolling_min_samples,
            ));
        }

        if self.rolling_window < self.rolling_min_samples {
            return Err(ConfigValidationError::WindowTooSmall {
                window: self.rolling_window,
                min_samples: self.rolling_min_samples,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid quantile for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidQuantile { field: String, value: f64 },

    #[error("Outlier band is inverted: lower {lower} must be below upper {upper}")]
    InvertedBand { lower: f64, upper: f64 },

    #[error("Invalid rolling_min_samples: {0} (must be at least 2)")]
    InvalidMinSamples(usize),

    #[error("Rolling window of {window} cannot hold the required {min_samples} samples")]
    WindowTooSmall { window: usize, min_samples: usize },
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    outlier_lower_quantile: Option<f64>,
    outlier_upper_quantile: Option<f64>,
    rolling_window: Option<usize>,
    rolling_min_samples: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Set both bounds of the global outlier band.
    ///
    /// # Arguments
    /// * `lower` - Lower quantile (e.g., 0.01 = 1st percentile)
    /// * `upper` - Upper quantile (e.g., 0.99 = 99th percentile)
    pub fn outlier_band(mut self, lower: f64, upper: f64) -> Self {
        self.outlier_lower_quantile = Some(lower);
        self.outlier_upper_quantile = Some(upper);
        self
    }

    /// Set the rolling-statistics window size.
    pub fn rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = Some(window);
        self
    }

    /// Set the minimum non-missing readings a rolling window must hold.
    pub fn rolling_min_samples(mut self, min_samples: usize) -> Self {
        self.rolling_min_samples = Some(min_samples);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            outlier_lower_quantile: self.outlier_lower_quantile.unwrap_or(0.01),
            outlier_upper_quantile: self.outlier_upper_quantile.unwrap_or(0.99),
            rolling_window: self.rolling_window.unwrap_or(10),
            rolling_min_samples: self.rolling_min_samples.unwrap_or(2),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.outlier_lower_quantile, 0.01);
        assert_eq!(config.outlier_upper_quantile, 0.99);
        assert_eq!(config.rolling_window, 10);
        assert_eq!(config.rolling_min_samples, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config.outlier_lower_quantile, 0.01);
        assert_eq!(config.rolling_window, 10);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .outlier_band(0.05, 0.95)
            .rolling_window(20)
            .rolling_min_samples(3)
            .build()
            .unwrap();

        assert_eq!(config.outlier_lower_quantile, 0.05);
        assert_eq!(config.outlier_upper_quantile, 0.95);
        assert_eq!(config.rolling_window, 20);
        assert_eq!(config.rolling_min_samples, 3);
    }

    #[test]
    fn test_validation_quantile_out_of_range() {
        let result = PipelineConfig::builder().outlier_band(-0.1, 0.99).build();

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidQuantile { .. }
        ));
    }

    #[test]
    fn test_validation_inverted_band() {
        let result = PipelineConfig::builder().outlier_band(0.99, 0.01).build();

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvertedBand { .. }
        ));
    }

    #[test]
    fn test_validation_min_samples_too_small() {
        let result = PipelineConfig::builder().rolling_min_samples(1).build();

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidMinSamples(1)
        ));
    }

    #[test]
    fn test_validation_window_smaller_than_min_samples() {
        let result = PipelineConfig::builder()
            .rolling_window(2)
            .rolling_min_samples(5)
            .build();

        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::WindowTooSmall { .. }
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PipelineConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            config.outlier_lower_quantile,
            deserialized.outlier_lower_quantile
        );
        assert_eq!(config.rolling_window, deserialized.rolling_window);
    }
}
