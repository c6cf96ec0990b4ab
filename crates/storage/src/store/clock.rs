#![forbid(unsafe_code)]

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn now_ms_i64() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let ms = nanos / 1_000_000i128;
    if ms <= 0 {
        0
    } else if ms >= i64::MAX as i128 {
        i64::MAX
    } else {
        ms as i64
    }
}

pub fn ts_ms_to_rfc3339(ts_ms: i64) -> String {
    let nanos = (ts_ms as i128) * 1_000_000i128;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    dt.format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Parses a stored `lastModified` stamp; `None` for anything that is
/// not valid RFC3339 (such entries sort last in the index).
pub fn rfc3339_to_ts_ms(value: &str) -> Option<i64> {
    let dt = OffsetDateTime::parse(value, &Rfc3339).ok()?;
    let ms = dt.unix_timestamp_nanos() / 1_000_000i128;
    i64::try_from(ms).ok()
}

/// Date part (`yyyy-mm-dd`) of a millisecond stamp, used in export
/// file names.
pub fn ts_ms_to_date(ts_ms: i64) -> String {
    let full = ts_ms_to_rfc3339(ts_ms);
    full.chars().take(10).collect()
}
