//! Scoring arithmetic shared by every activity.

use chrono::{DateTime, Utc};

/// Percentage of `correct` over `total`, rounded half up to a whole number.
///
/// `total` is always the size of the original input set, never the number of
/// attempted items. An empty activity scores 0.
///
/// # Examples
///
/// ```
/// use kwento_activity::score::percentage;
///
/// assert_eq!(percentage(2, 3), 67);
/// assert_eq!(percentage(1, 8), 13);
/// assert_eq!(percentage(0, 0), 0);
/// ```
#[must_use]
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    // floor(100c/t + 1/2) == floor((200c + t) / 2t)
    let rounded = (200 * correct + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(100)
}

/// Whole seconds from `started_at` to `now`, truncated; never negative.
#[must_use]
pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - started_at).num_seconds()).unwrap_or(0)
}
