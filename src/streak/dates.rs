//! Calendar arithmetic for streak computation.
//!
//! Everything here works on [`NaiveDate`] so time-of-day can never leak into
//! a comparison; callers truncate incoming timestamps at the boundary via
//! [`normalize`]. Two weekday numberings are in play: the client's native
//! 0-6 convention (0 = Sunday) used for week bucketing, and the ISO 1-7
//! convention (1 = Monday, 7 = Sunday) used by habit schedules.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Truncates a timestamp to its UTC calendar date.
pub fn normalize(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Day of week in the 0-6 convention (0 = Sunday), matching what the web
/// client's date primitive reports.
pub fn day_of_week(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Converts a 0-6 day (0 = Sunday) to the ISO 1-7 numbering used by
/// habit schedules.
pub fn to_iso_day(day_of_week: u32) -> u8 {
    if day_of_week == 0 {
        7
    } else {
        day_of_week as u8
    }
}

/// Offset of an ISO weekday from the Sunday week anchor: Sunday sits on the
/// anchor itself, every other day `d` sits `d` days after it.
pub fn iso_day_offset(iso_day: u8) -> i64 {
    if iso_day == 7 {
        0
    } else {
        iso_day as i64
    }
}

/// The Sunday that begins the week containing `date`. Weekly streaks bucket
/// check-ins by this anchor.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(day_of_week(date) as i64)
}

/// Whole days from `b` to `a` (positive when `a` is later).
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days()
}
