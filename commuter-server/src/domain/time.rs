//! Time helpers for departures.
//!
//! The feed reports every time as a UTC ISO-8601 timestamp, so unlike
//! HH:MM boards there is no midnight rollover to reconstruct. What remains
//! is arithmetic on those timestamps and rendering durations for riders.

use chrono::{DateTime, Duration, Utc};

/// How long a favorite outlives its departure before the sweep removes it.
pub const FAVORITE_GRACE: Duration = Duration::minutes(10);

/// Signed time from `departure` to `arrival`.
pub fn journey_duration(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> Duration {
    arrival.signed_duration_since(departure)
}

/// Whole minutes until `then`, negative if it is already past.
pub fn minutes_until(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    then.signed_duration_since(now).num_minutes()
}

/// Default expiry for a favorite of a train departing at `departure`.
pub fn remove_after(departure: DateTime<Utc>) -> DateTime<Utc> {
    departure + FAVORITE_GRACE
}

/// Formats a duration as "42 min" or "1 h 05 min".
///
/// Negative durations are clamped to zero; they only arise from
/// inconsistent realtime estimates.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use commuter_server::domain::format_duration;
///
/// assert_eq!(format_duration(Duration::minutes(7)), "7 min");
/// assert_eq!(format_duration(Duration::minutes(65)), "1 h 05 min");
/// assert_eq!(format_duration(Duration::minutes(-3)), "0 min");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_minutes().max(0);
    let (hours, minutes) = (total / 60, total % 60);
    if hours == 0 {
        format!("{minutes} min")
    } else {
        format!("{hours} h {minutes:02} min")
    }
}
