//! Day sequence for a calendar year.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Format used for day keys (`YYYY-MM-DD`).
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

const MONTH_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One day of the displayed year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Day {
    pub date: NaiveDate,
    /// Offset from January 1st.
    pub index: usize,
}

impl Day {
    /// ISO day key, e.g. `2024-02-29`.
    pub fn key(&self) -> String {
        self.date.format(DAY_KEY_FORMAT).to_string()
    }

    pub fn is_first_of_month(&self) -> bool {
        self.date.day() == 1
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Short month name ("Jan", "Feb", ...).
    pub fn month_label(&self) -> &'static str {
        MONTH_SHORT[self.date.month0() as usize]
    }
}

/// Parse a `YYYY-MM-DD` key. Returns `None` for anything else.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DAY_KEY_FORMAT).ok()
}

/// Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Every day from January 1st to December 31st of `year`, in order.
///
/// Years chrono cannot represent produce an empty sequence.
pub fn year_days(year: i32) -> Vec<Day> {
    let Some(start) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };

    start
        .iter_days()
        .take_while(|date| date.year() == year)
        .enumerate()
        .map(|(index, date)| Day { date, index })
        .collect()
}

/// Lookup from date to grid index for one year.
///
/// Besides the days themselves, the day after the last one resolves to
/// `len()` when used as an exclusive end, so ranges ending on December 31st
/// stay addressable.
#[derive(Debug, Clone, Default)]
pub struct DayIndex {
    by_date: HashMap<NaiveDate, usize>,
    end_sentinel: Option<NaiveDate>,
    len: usize,
}

impl DayIndex {
    pub fn new(days: &[Day]) -> Self {
        let by_date = days.iter().map(|d| (d.date, d.index)).collect();
        let end_sentinel = days.last().and_then(|d| d.date.succ_opt());
        Self {
            by_date,
            end_sentinel,
            len: days.len(),
        }
    }

    /// Index of a day inside the year.
    pub fn get(&self, date: NaiveDate) -> Option<usize> {
        self.by_date.get(&date).copied()
    }

    /// Index of an exclusive end date.
    pub fn resolve_end(&self, date: NaiveDate) -> Option<usize> {
        self.get(date)
            .or_else(|| (self.end_sentinel == Some(date)).then_some(self.len))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Build the date → index lookup for a day sequence.
pub fn index_by_day_key(days: &[Day]) -> DayIndex {
    DayIndex::new(days)
}
