//! Staleness filtering for location records.

use chrono::{DateTime, Duration, Utc};

/// Default freshness window for nearby queries, in minutes.
pub const DEFAULT_FRESHNESS_MINUTES: i64 = 30;

/// How far ahead of `now` a capture time may be and still count as fresh.
pub const MAX_CLOCK_SKEW_MINUTES: i64 = 5;

/// Returns whether a location captured at `captured_at` is still fresh at `now`.
///
/// A record is fresh iff `now - captured_at <= window`. Records without a
/// capture time are stale. Timestamps up to [`MAX_CLOCK_SKEW_MINUTES`] ahead
/// of `now` (device clock skew) count as fresh; anything further ahead is
/// stale, so a bad clock cannot pin a record as fresh indefinitely.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use nearby_core::location::is_fresh;
///
/// let now = Utc::now();
/// let window = Duration::minutes(30);
///
/// assert!(is_fresh(Some(now - Duration::minutes(29)), now, window));
/// assert!(!is_fresh(Some(now - Duration::minutes(31)), now, window));
/// assert!(!is_fresh(None, now, window));
/// ```
#[must_use]
pub fn is_fresh(
    captured_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    let max_skew = Duration::minutes(MAX_CLOCK_SKEW_MINUTES);
    captured_at.is_some_and(|captured_at| {
        captured_at - now <= max_skew && now - captured_at <= window
    })
}
