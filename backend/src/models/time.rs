//! Calendar arithmetic shared by the expander, generator and draft validator.
//!
//! Weekdays are numbered `0 = Monday .. 6 = Sunday`. Times of day travel over
//! the wire as `"HH:MM"` strings; `"HH:MM:SS"` is accepted on input.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Number of days in the weekly pattern.
pub const DAYS_PER_WEEK: u8 = 7;

/// English weekday labels indexed by weekday number.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Error returned when a time-of-day string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day '{input}', expected HH:MM")]
pub struct TimeParseError {
    pub input: String,
}

/// Weekday number of a calendar date (`0 = Monday`).
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Whether `weekday` lies in `0..=6`.
pub fn is_valid_weekday(weekday: u8) -> bool {
    weekday < DAYS_PER_WEEK
}

/// Parse `"HH:MM"` (or `"HH:MM:SS"`) into a time of day.
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| TimeParseError {
            input: input.to_string(),
        })
}

/// Format a time of day as `"HH:MM"`.
pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Combine a date with a slot start and return `(start, end)` for a lesson of
/// `duration_minutes`. Non-positive durations yield `end <= start`.
pub fn lesson_span(
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: i32,
) -> (NaiveDateTime, NaiveDateTime) {
    let start_at = date.and_time(start);
    let end_at = start_at + Duration::minutes(i64::from(duration_minutes));
    (start_at, end_at)
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(weekday_index(date)))
}

/// Serde adapter for `NaiveTime` as `"HH:MM"`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}
