use chrono::{DateTime, Utc};

/// Milliseconds since the Unix epoch
///
/// In simulated mode the epoch is whatever the driver decides; the clock
/// only compares and stores these values.
pub type TimestampMillis = i64;

/// Whole seconds since the Unix epoch
pub type TimestampSeconds = i64;

const MILLIS_PER_SECOND: i64 = 1000;

/// Convert milliseconds to seconds, truncating toward zero
///
/// `2999 -> 2`, `-1500 -> -1`. Same behavior as truncating a duration cast.
pub fn to_seconds(millis: TimestampMillis) -> TimestampSeconds {
    millis / MILLIS_PER_SECOND
}

/// Current host wall-clock time in milliseconds
pub fn wall_clock_millis() -> TimestampMillis {
    Utc::now().timestamp_millis()
}

/// Current host wall-clock time in whole seconds
pub fn wall_clock_seconds() -> TimestampSeconds {
    Utc::now().timestamp()
}

/// Render a millisecond timestamp as a UTC date-time
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn to_datetime(millis: TimestampMillis) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Millisecond timestamp of a UTC date-time
pub fn from_datetime(time: DateTime<Utc>) -> TimestampMillis {
    time.timestamp_millis()
}
