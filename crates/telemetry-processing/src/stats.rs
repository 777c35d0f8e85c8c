//! Shared numeric and column-extraction helpers.
//!
//! The statistical helpers operate on plain `f64` slices so the three
//! pipeline stages can share one set of formulas. Quantiles use linear
//! interpolation between adjacent order statistics.

use polars::prelude::*;

use crate::error::Result;

// =============================================================================
// Column extraction
// =============================================================================

/// Check whether a DataFrame has a column with the given name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Extract a column as `f64` options, casting numerics as needed.
/// Values that cannot be represented become nulls.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Extract a column as owned strings, casting as needed.
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    let str_series = series.cast(&DataType::String)?;
    Ok(str_series
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Keep only the non-missing values of a column.
pub fn valid_values(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().filter_map(|v| *v).collect()
}

// =============================================================================
// Statistics
// =============================================================================

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1); `None` below two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Quantile of a slice by linear interpolation; `None` for an empty slice.
/// `q` is clamped to `[0, 1]`. The input does not need to be sorted.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q = q.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;

    if lower == upper {
        return Some(sorted[lower]);
    }

    let weight = pos - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

/// Minimum of a slice; `None` for an empty slice.
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Maximum of a slice; `None` for an empty slice.
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== mean / sample_std tests ====================

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_sample_std_basic() {
        // Values: 1..5, mean 3, variance 10/4 = 2.5, std ~1.58
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((std - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_single_value_undefined() {
        assert_eq!(sample_std(&[5.0]), None);
        assert_eq!(sample_std(&[]), None);
    }

    #[test]
    fn test_sample_std_identical_values() {
        assert_eq!(sample_std(&[5.0, 5.0, 5.0, 5.0]), Some(0.0));
    }

    // ==================== quantile tests ====================

    #[test]
    fn test_quantile_median() {
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), Some(3.0));
    }

    #[test]
    fn test_quantile_interpolates() {
        // 4 values: position for q=0.25 is 0.75, between 1.0 and 2.0
        let q1 = quantile(&[1.0, 2.0, 3.0, 4.0], 0.25).unwrap();
        assert!((q1 - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_unsorted_input() {
        assert_eq!(quantile(&[5.0, 1.0, 3.0, 2.0, 4.0], 1.0), Some(5.0));
        assert_eq!(quantile(&[5.0, 1.0, 3.0, 2.0, 4.0], 0.0), Some(1.0));
    }

    #[test]
    fn test_quantile_two_values_narrow_band() {
        // The 1st percentile of [20, 21] interpolates to 20.01, so 20.0
        // itself sits below the band.
        let lo = quantile(&[20.0, 21.0], 0.01).unwrap();
        assert!((lo - 20.01).abs() < 1e-12);
        assert!(20.0 < lo);
    }

    #[test]
    fn test_quantile_empty() {
        assert_eq!(quantile(&[], 0.5), None);
    }

    // ==================== min / max tests ====================

    #[test]
    fn test_min_max() {
        let values = [3.0, 1.0, 4.0, 1.5];
        assert_eq!(min(&values), Some(1.0));
        assert_eq!(max(&values), Some(4.0));
        assert_eq!(min(&[]), None);
        assert_eq!(max(&[]), None);
    }

    // ==================== extraction tests ====================

    #[test]
    fn test_numeric_values_casts_integers() {
        let series = Series::new("value".into(), &[1i64, 2, 3]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_numeric_values_keeps_nulls() {
        let series = Series::new("value".into(), &[Some(1.0f64), None, Some(3.0)]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_valid_values_drops_nulls() {
        let values = valid_values(&[Some(1.0), None, Some(3.0)]);
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn test_string_values() {
        let series = Series::new("sensor".into(), &[Some("temp"), None]);
        let values = string_values(&series).unwrap();
        assert_eq!(values, vec![Some("temp".to_string()), None]);
    }

    #[test]
    fn test_has_column() {
        let df = polars::df!["a" => [1, 2], "b" => [3, 4]].unwrap();
        assert!(has_column(&df, "a"));
        assert!(!has_column(&df, "c"));
    }
}
