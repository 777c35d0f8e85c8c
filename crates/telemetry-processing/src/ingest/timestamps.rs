//! Timestamp coercion for raw batches.
//!
//! Raw batches arrive with timestamps as strings, temporal columns, or
//! integer epochs depending on the upstream historian. Everything is
//! coerced to epoch milliseconds; values that cannot be interpreted
//! become nulls rather than parse errors, so a single rogue row never
//! rejects a batch.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::error::Result;

/// String layouts accepted for timestamp values, tried in order.
/// RFC 3339 is attempted first, separately, to honor explicit offsets.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Parse a single timestamp string to epoch milliseconds.
pub(crate) fn parse_timestamp_str(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    // Bare dates are midnight UTC
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0)?;
        return Some(dt.and_utc().timestamp_millis());
    }

    None
}

/// Coerce an arbitrary timestamp column to epoch milliseconds.
///
/// Temporal dtypes are converted exactly; strings are parsed per value;
/// integers are taken as epoch milliseconds. Any other dtype (and any
/// unparseable value) coerces to null.
pub(crate) fn coerce_to_epoch_ms(series: &Series) -> Result<Vec<Option<i64>>> {
    match series.dtype() {
        DataType::Datetime(_, _) | DataType::Date => {
            let ms = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            Ok(ms.i64()?.into_iter().collect())
        }
        DataType::String => {
            let parsed = series
                .str()?
                .into_iter()
                .map(|v| v.and_then(parse_timestamp_str))
                .collect();
            Ok(parsed)
        }
        dtype if dtype.is_integer() => {
            let ms = series.cast(&DataType::Int64)?;
            Ok(ms.i64()?.into_iter().collect())
        }
        _ => Ok(vec![None; series.len()]),
    }
}

/// Build a `Datetime(Milliseconds)` series from epoch-millisecond values.
pub(crate) fn epoch_ms_series(name: &str, values: Vec<Option<i64>>) -> Result<Series> {
    let series = Series::new(name.into(), values)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parse_timestamp_str tests ====================

    #[test]
    fn test_parse_iso_datetime() {
        let ms = parse_timestamp_str("2024-03-01T12:30:00").unwrap();
        assert_eq!(ms % 1000, 0);
        assert_eq!(parse_timestamp_str("2024-03-01 12:30:00"), Some(ms));
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let utc = parse_timestamp_str("2024-03-01T12:00:00Z").unwrap();
        let offset = parse_timestamp_str("2024-03-01T13:00:00+01:00").unwrap();
        assert_eq!(utc, offset);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let whole = parse_timestamp_str("2024-03-01 12:00:00").unwrap();
        let frac = parse_timestamp_str("2024-03-01 12:00:00.250").unwrap();
        assert_eq!(frac - whole, 250);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let date = parse_timestamp_str("2024-03-01").unwrap();
        let midnight = parse_timestamp_str("2024-03-01 00:00:00").unwrap();
        assert_eq!(date, midnight);
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_timestamp_str("not-a-timestamp"), None);
        assert_eq!(parse_timestamp_str(""), None);
        assert_eq!(parse_timestamp_str("   "), None);
    }

    // ==================== coerce_to_epoch_ms tests ====================

    #[test]
    fn test_coerce_string_column() {
        let series = Series::new(
            "timestamp".into(),
            &[Some("2024-03-01 00:00:00"), Some("bogus"), None],
        );
        let ms = coerce_to_epoch_ms(&series).unwrap();
        assert!(ms[0].is_some());
        assert_eq!(ms[1], None);
        assert_eq!(ms[2], None);
    }

    #[test]
    fn test_coerce_integer_column_as_epoch_ms() {
        let series = Series::new("timestamp".into(), &[0i64, 86_400_000]);
        let ms = coerce_to_epoch_ms(&series).unwrap();
        assert_eq!(ms, vec![Some(0), Some(86_400_000)]);
    }

    #[test]
    fn test_coerce_unsupported_dtype_is_all_null() {
        let series = Series::new("timestamp".into(), &[true, false]);
        let ms = coerce_to_epoch_ms(&series).unwrap();
        assert_eq!(ms, vec![None, None]);
    }

    #[test]
    fn test_coerce_datetime_roundtrip() {
        let original = epoch_ms_series("timestamp", vec![Some(1000), None]).unwrap();
        let ms = coerce_to_epoch_ms(&original).unwrap();
        assert_eq!(ms, vec![Some(1000), None]);
    }

    #[test]
    fn test_epoch_ms_series_dtype() {
        let series = epoch_ms_series("timestamp", vec![Some(0)]).unwrap();
        assert_eq!(
            series.dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
    }
}
