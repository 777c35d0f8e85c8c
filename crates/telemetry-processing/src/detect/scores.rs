//! Statistical scorers for the anomaly detector.
//!
//! Each scorer maps the analyzed sensor's value column (missing entries
//! included, dataset row order preserved) to per-reading results. A
//! `None` score marks a reading the method cannot judge: a missing
//! value, a rolling window below the sample minimum, or zero spread.
//! Such readings are never flagged.

use crate::stats;

/// Score and flag for one reading of the analyzed sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ScoredReading {
    pub score: Option<f64>,
    pub is_anomaly: bool,
}

impl ScoredReading {
    fn unjudged() -> Self {
        Self {
            score: None,
            is_anomaly: false,
        }
    }

    fn neutral() -> Self {
        Self {
            score: Some(0.0),
            is_anomaly: false,
        }
    }
}

/// Standard-score detection: distance from the sensor mean in units of
/// the sensor's sample standard deviation.
pub(crate) fn zscore(values: &[Option<f64>], threshold: f64) -> Vec<ScoredReading> {
    let valid = stats::valid_values(values);
    let mean = stats::mean(&valid);
    let std = stats::sample_std(&valid);

    match (mean, std) {
        (Some(mean), Some(std)) if std > 0.0 => values
            .iter()
            .map(|v| match v {
                Some(v) => {
                    let score = (v - mean) / std;
                    ScoredReading {
                        score: Some(score),
                        is_anomaly: score.abs() > threshold,
                    }
                }
                None => ScoredReading::unjudged(),
            })
            .collect(),
        // Zero spread: every reading equals the mean, nothing stands out
        _ => vec![ScoredReading::neutral(); values.len()],
    }
}

/// Interquartile-range detection: readings beyond `threshold * IQR`
/// outside the quartiles are flagged; the score measures distance from
/// Q3 in IQR units.
pub(crate) fn iqr(values: &[Option<f64>], threshold: f64) -> Vec<ScoredReading> {
    let valid = stats::valid_values(values);
    let q1 = stats::quantile(&valid, 0.25);
    let q3 = stats::quantile(&valid, 0.75);

    match (q1, q3) {
        (Some(q1), Some(q3)) if q3 - q1 > 0.0 => {
            let iqr = q3 - q1;
            let lower = q1 - threshold * iqr;
            let upper = q3 + threshold * iqr;
            values
                .iter()
                .map(|v| match v {
                    Some(v) => ScoredReading {
                        score: Some(((v - q3) / iqr).abs()),
                        is_anomaly: *v < lower || *v > upper,
                    },
                    None => ScoredReading::unjudged(),
                })
                .collect()
        }
        _ => vec![ScoredReading::neutral(); values.len()],
    }
}

/// Rolling-window detection: each reading is standard-scored against the
/// trailing window that contains it. Windows holding fewer than
/// `min_samples` non-missing readings produce no judgment.
pub(crate) fn rolling(
    values: &[Option<f64>],
    threshold: f64,
    window: usize,
    min_samples: usize,
) -> Vec<ScoredReading> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let Some(v) = v else {
                return ScoredReading::unjudged();
            };

            let start = (i + 1).saturating_sub(window);
            let window_valid = stats::valid_values(&values[start..=i]);
            if window_valid.len() < min_samples {
                return ScoredReading::unjudged();
            }

            let mean = stats::mean(&window_valid);
            let std = stats::sample_std(&window_valid);
            match (mean, std) {
                (Some(mean), Some(std)) if std > 0.0 => {
                    let score = (v - mean) / std;
                    ScoredReading {
                        score: Some(score),
                        is_anomaly: score.abs() > threshold,
                    }
                }
                _ => ScoredReading::unjudged(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    // ==================== zscore tests ====================

    #[test]
    fn test_zscore_flags_spike() {
        let mut values: Vec<f64> = vec![10.0; 20];
        values[3] = 10.1;
        values[19] = 100.0;

        let scored = zscore(&some(&values), 3.0);
        assert!(scored[19].is_anomaly);
        assert!(!scored[0].is_anomaly);
        assert!(scored[19].score.unwrap() > 3.0);
    }

    #[test]
    fn test_zscore_constant_series_is_neutral() {
        let scored = zscore(&some(&[5.0, 5.0, 5.0, 5.0]), 3.0);
        assert!(scored.iter().all(|s| s.score == Some(0.0) && !s.is_anomaly));
    }

    #[test]
    fn test_zscore_missing_value_unjudged() {
        let scored = zscore(&[Some(1.0), None, Some(2.0), Some(3.0)], 3.0);
        assert_eq!(scored[1].score, None);
        assert!(!scored[1].is_anomaly);
        assert!(scored[0].score.is_some());
    }

    // ==================== iqr tests ====================

    #[test]
    fn test_iqr_flags_extreme() {
        let values = some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0]);
        let scored = iqr(&values, 1.5);
        assert!(scored[9].is_anomaly);
        assert!(!scored[4].is_anomaly);
    }

    #[test]
    fn test_iqr_zero_spread_is_neutral() {
        let scored = iqr(&some(&[5.0, 5.0, 5.0, 5.0, 5.0]), 1.5);
        assert!(scored.iter().all(|s| s.score == Some(0.0) && !s.is_anomaly));
    }

    #[test]
    fn test_iqr_score_is_distance_from_q3() {
        // 1..=5: Q1 = 2, Q3 = 4, IQR = 2
        let scored = iqr(&some(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
        assert!((scored[4].score.unwrap() - 0.5).abs() < 1e-12);
        assert!((scored[0].score.unwrap() - 1.5).abs() < 1e-12);
    }

    // ==================== rolling tests ====================

    #[test]
    fn test_rolling_first_reading_unjudged() {
        let scored = rolling(&some(&[1.0, 2.0, 3.0]), 3.0, 10, 2);
        assert_eq!(scored[0].score, None);
        assert!(!scored[0].is_anomaly);
        assert!(scored[1].score.is_some());
    }

    #[test]
    fn test_rolling_flags_local_spike() {
        // A lone spike inside its own 10-reading window tops out at a
        // z-score of (n-1)/sqrt(n) ~ 2.85, so flag at 2.0
        let mut values = vec![10.0, 10.1, 9.9, 10.0, 10.1, 9.9, 10.0, 10.1, 9.9, 10.0];
        values.push(50.0);
        let scored = rolling(&some(&values), 2.0, 10, 2);
        assert!(scored.last().unwrap().is_anomaly);
        assert!(!scored[5].is_anomaly);
    }

    #[test]
    fn test_rolling_constant_window_unjudged() {
        let scored = rolling(&some(&[5.0, 5.0, 5.0]), 3.0, 10, 2);
        assert!(scored.iter().all(|s| s.score.is_none() && !s.is_anomaly));
    }

    #[test]
    fn test_rolling_window_excludes_old_readings() {
        // With a window of 3, the spike at index 0 stops influencing
        // statistics from index 3 on.
        let values = some(&[100.0, 10.0, 10.1, 9.9, 10.0]);
        let scored = rolling(&values, 3.0, 3, 2);
        assert!(scored[4].score.is_some());
        assert!(!scored[4].is_anomaly);
    }

    #[test]
    fn test_rolling_skips_missing_in_window() {
        let values = [Some(10.0), None, Some(10.2), Some(9.9), Some(10.1)];
        let scored = rolling(&values, 3.0, 10, 2);
        assert_eq!(scored[1].score, None);
        assert!(scored[2].score.is_some());
    }
}
