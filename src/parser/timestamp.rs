//! Conversion of PAMGuard millisecond timestamps
use time::OffsetDateTime;

/// Convert milliseconds since the Unix epoch to an `OffsetDateTime` in UTC
pub fn from_millis(millis: i64) -> Result<OffsetDateTime, time::error::ComponentRange> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
}

/// Milliseconds since the Unix epoch
pub fn to_millis(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000_000) as i64
}
