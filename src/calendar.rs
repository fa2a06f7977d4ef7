//! Epoch-millisecond timestamps to `time` dimension rows.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

use crate::error::{EtlError, Result};
use crate::models::TimeBucket;

/// Storage format of `start_time`; lexicographic order matches time order
/// for years 0000-9999.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn to_datetime(ts_ms: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_millis(ts_ms)
        .map(|dt| dt.naive_utc())
        .ok_or(EtlError::InvalidTimestamp { ts: ts_ms })
}

/// The `start_time` key for an event timestamp.
pub fn start_time(ts_ms: i64) -> Result<String> {
    Ok(to_datetime(ts_ms)?.format(START_TIME_FORMAT).to_string())
}

/// Derive every calendar field for `ts_ms`, interpreted as UTC.
pub fn time_bucket(ts_ms: i64) -> Result<TimeBucket> {
    let dt = to_datetime(ts_ms)?;
    Ok(TimeBucket {
        start_time: dt.format(START_TIME_FORMAT).to_string(),
        hour: dt.hour(),
        day: dt.day(),
        week: dt.iso_week().week(),
        month: dt.month(),
        year: dt.year(),
        weekday: dt.format("%A").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_timestamp() {
        // 2018-11-01 21:01:46.796 UTC, a Thursday in ISO week 44
        let bucket = time_bucket(1541106106796).unwrap();
        assert_eq!(bucket.start_time, "2018-11-01 21:01:46.796");
        assert_eq!(bucket.hour, 21);
        assert_eq!(bucket.day, 1);
        assert_eq!(bucket.week, 44);
        assert_eq!(bucket.month, 11);
        assert_eq!(bucket.year, 2018);
        assert_eq!(bucket.weekday, "Thursday");
    }

    #[test]
    fn test_iso_week_at_year_boundary() {
        // 2021-01-01 is a Friday that belongs to ISO week 53 of 2020
        let bucket = time_bucket(1609459200000).unwrap();
        assert_eq!(bucket.year, 2021);
        assert_eq!(bucket.week, 53);
        assert_eq!(bucket.weekday, "Friday");
    }

    #[test]
    fn test_fields_in_range_and_deterministic() {
        let samples = [
            0_i64,
            1,
            86_399_999,
            951_782_400_000,  // 2000-02-29
            1_541_903_400_123,
            1_700_000_000_000,
            -1,
            4_102_444_799_999, // 2099-12-31 23:59:59.999
        ];
        for ts in samples {
            let a = time_bucket(ts).unwrap();
            let b = time_bucket(ts).unwrap();
            assert_eq!(a, b, "derivation not deterministic for {}", ts);
            assert!(a.hour <= 23);
            assert!((1..=31).contains(&a.day));
            assert!((1..=12).contains(&a.month));
            assert!((1..=53).contains(&a.week));
            assert_eq!(a.start_time, start_time(ts).unwrap());
        }
    }

    #[test]
    fn test_out_of_range_timestamp() {
        assert!(matches!(
            time_bucket(i64::MAX),
            Err(EtlError::InvalidTimestamp { .. })
        ));
    }
}
