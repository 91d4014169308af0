use time::{Duration, OffsetDateTime, Time};

/// Truncates a timestamp to its UTC day. Returns `(period_start, period_end)` where the end is
/// exclusive.
pub fn day_bucket(ts: OffsetDateTime) -> (OffsetDateTime, OffsetDateTime) {
	let start = ts.to_offset(time::UtcOffset::UTC).replace_time(Time::MIDNIGHT);

	(start, start + Duration::days(1))
}
