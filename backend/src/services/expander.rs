//! Template expansion: weekly slots to dated `(date, slot)` pairs.
//!
//! Slots are bucketed by weekday once, then the window is walked day by day.
//! The returned [`Expansion`] iterator is lazy and finite; calling
//! [`TemplateExpander::iter`] again restarts it from the window start.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{weekday_index, RecurringSlot, DAYS_PER_WEEK};

/// Oracle for days on which no lessons take place.
pub trait HolidayCalendar: Send + Sync {
    fn is_day_off(&self, date: NaiveDate) -> bool;
}

/// Every day is a school day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_day_off(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// A fixed list of days off, usually loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedHolidays {
    dates: BTreeSet<NaiveDate>,
}

impl FixedHolidays {
    pub fn new(dates: BTreeSet<NaiveDate>) -> Self {
        Self { dates }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl FromIterator<NaiveDate> for FixedHolidays {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl HolidayCalendar for FixedHolidays {
    fn is_day_off(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

static NO_HOLIDAYS: NoHolidays = NoHolidays;

/// Expands a slot list over the closed window `[from, to]`.
pub struct TemplateExpander<'a> {
    by_weekday: [Vec<&'a RecurringSlot>; DAYS_PER_WEEK as usize],
    from: NaiveDate,
    to: NaiveDate,
    holidays: &'a dyn HolidayCalendar,
}

impl<'a> TemplateExpander<'a> {
    /// Slots with a weekday outside `0..=6` never match a date.
    pub fn new(slots: &'a [RecurringSlot], from: NaiveDate, to: NaiveDate) -> Self {
        let mut by_weekday: [Vec<&'a RecurringSlot>; DAYS_PER_WEEK as usize] =
            std::array::from_fn(|_| Vec::new());
        for slot in slots {
            if let Some(bucket) = by_weekday.get_mut(slot.weekday as usize) {
                bucket.push(slot);
            }
        }
        for bucket in &mut by_weekday {
            bucket.sort_by_key(|slot| (slot.start, slot.id));
        }
        Self {
            by_weekday,
            from,
            to,
            holidays: &NO_HOLIDAYS,
        }
    }

    /// Skip days the oracle marks as off.
    pub fn with_holidays(mut self, holidays: &'a dyn HolidayCalendar) -> Self {
        self.holidays = holidays;
        self
    }

    /// A fresh pass over the window.
    pub fn iter(&self) -> Expansion<'_, 'a> {
        Expansion {
            expander: self,
            date: (self.from <= self.to).then_some(self.from),
            slot_index: 0,
        }
    }
}

impl<'e, 'a> IntoIterator for &'e TemplateExpander<'a> {
    type Item = (NaiveDate, &'a RecurringSlot);
    type IntoIter = Expansion<'e, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy `(date, slot)` sequence in date order, then slot start order.
pub struct Expansion<'e, 'a> {
    expander: &'e TemplateExpander<'a>,
    date: Option<NaiveDate>,
    slot_index: usize,
}

impl<'e, 'a> Iterator for Expansion<'e, 'a> {
    type Item = (NaiveDate, &'a RecurringSlot);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let date = self.date?;
            if date > self.expander.to {
                self.date = None;
                return None;
            }
            let bucket = &self.expander.by_weekday[weekday_index(date) as usize];
            if self.slot_index < bucket.len() && !self.expander.holidays.is_day_off(date) {
                let slot = bucket[self.slot_index];
                self.slot_index += 1;
                return Some((date, slot));
            }
            self.date = date.succ_opt();
            self.slot_index = 0;
        }
    }
}
