//! Validated closed date ranges.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::monday_of;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateWindowError {
    #[error("invalid date range: {from} is after {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },
    #[error("date range spans {days} days, the limit is {max_days}")]
    TooWide { days: i64, max_days: i64 },
}

/// A closed range `[from, to]` of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Validate order and width (inclusive day count at most `max_days`).
    pub fn new(from: NaiveDate, to: NaiveDate, max_days: i64) -> Result<Self, DateWindowError> {
        if from > to {
            return Err(DateWindowError::Inverted { from, to });
        }
        let window = Self { from, to };
        let days = window.days();
        if days > max_days {
            return Err(DateWindowError::TooWide { days, max_days });
        }
        Ok(window)
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Monday to Sunday of the week containing `today`.
pub fn default_school_week(today: NaiveDate) -> DateWindow {
    let from = monday_of(today);
    DateWindow {
        from,
        to: from + Duration::days(6),
    }
}
