//! Day-bucket labels for message timestamps ("Today", "Yesterday", a date).

use chrono::{Duration, TimeZone, Utc};

use crate::types::Timestamp;

pub const TODAY: &str = "Today";
pub const YESTERDAY: &str = "Yesterday";

/// `strftime` pattern for days older than yesterday, e.g. `March 5, 2026`.
pub const DATE_FORMAT: &str = "%B %-d, %Y";

/// Label `timestamp` relative to `now`, bucketing by UTC calendar day.
pub fn render_date_label(timestamp: Timestamp, now: Timestamp) -> String {
    render_date_label_in(timestamp, now, &Utc)
}

/// Label `timestamp` relative to `now`, bucketing by calendar day in `tz`.
///
/// Timestamps on a later day than `now` (clock skew between devices) get the
/// formatted date rather than a relative label.
pub fn render_date_label_in<Tz: TimeZone>(timestamp: Timestamp, now: Timestamp, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = timestamp.with_timezone(tz);
    let day = local.date_naive();
    let today = now.with_timezone(tz).date_naive();

    if day == today {
        TODAY.to_string()
    } else if Some(day) == today.checked_sub_signed(Duration::days(1)) {
        YESTERDAY.to_string()
    } else {
        local.format(DATE_FORMAT).to_string()
    }
}
