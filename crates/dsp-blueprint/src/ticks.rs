//! Conversion between .NET `DateTime.Ticks` (100-nanosecond units since
//! `0001-01-01T00:00:00Z`) and Unix time (spec §4.6, GLOSSARY "Ticks").

use chrono::{DateTime, Utc};

const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks at the Unix epoch (`1970-01-01T00:00:00Z`), computed once rather
/// than re-derived from a `0001-01-01` offset on every call.
const EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Converts a .NET ticks value to a UTC timestamp, or `None` if it is out of
/// `chrono`'s representable range.
pub fn ticks_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    let delta = ticks - EPOCH_TICKS;
    let secs = delta.div_euclid(TICKS_PER_SECOND);
    let rem_ticks = delta.rem_euclid(TICKS_PER_SECOND);
    let nanos = (rem_ticks * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

/// Converts a UTC timestamp back to .NET ticks, the inverse of
/// [`ticks_to_datetime`].
pub fn datetime_to_ticks(dt: DateTime<Utc>) -> i64 {
    let secs = dt.timestamp();
    let nanos = i64::from(dt.timestamp_subsec_nanos());
    EPOCH_TICKS + secs * TICKS_PER_SECOND + nanos / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_tick_vector() {
        let dt = ticks_to_datetime(621_355_968_000_000_000).unwrap();
        assert_eq!(dt.to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn round_trips_through_datetime() {
        let ticks = 637_000_000_000_000_000i64;
        let dt = ticks_to_datetime(ticks).unwrap();
        assert_eq!(datetime_to_ticks(dt), ticks);
    }
}
