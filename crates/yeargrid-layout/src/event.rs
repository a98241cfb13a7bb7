//! All-day events as consumed by the layout.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title used when the calendar returns an event without a summary.
pub const UNTITLED: &str = "(Untitled)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidEvent {
    #[error("event {id} ends on {end} which is not after its start {start}")]
    EmptyRange {
        id: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

/// A date-only event. `end_date` is exclusive: the day after the last day
/// the event covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawAllDayEvent")]
pub struct AllDayEvent {
    /// Unique across every linked calendar.
    pub id: String,
    pub calendar_id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAllDayEvent {
    id: String,
    #[serde(default)]
    calendar_id: String,
    #[serde(alias = "summary", default)]
    title: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TryFrom<RawAllDayEvent> for AllDayEvent {
    type Error = InvalidEvent;

    fn try_from(raw: RawAllDayEvent) -> Result<Self, Self::Error> {
        if raw.start_date >= raw.end_date {
            return Err(InvalidEvent::EmptyRange {
                id: raw.id,
                start: raw.start_date,
                end: raw.end_date,
            });
        }
        Ok(Self {
            id: raw.id,
            calendar_id: raw.calendar_id,
            title: raw.title.unwrap_or_else(|| UNTITLED.to_string()),
            start_date: raw.start_date,
            end_date: raw.end_date,
        })
    }
}

impl AllDayEvent {
    /// Build an event, rejecting empty or inverted ranges.
    pub fn new(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Option<Self> {
        (start_date < end_date).then(|| Self {
            id: id.into(),
            calendar_id: calendar_id.into(),
            title: title.into(),
            start_date,
            end_date,
        })
    }

    /// One-day event on `date`.
    pub fn single_day(
        id: impl Into<String>,
        calendar_id: impl Into<String>,
        title: impl Into<String>,
        date: NaiveDate,
    ) -> Option<Self> {
        Self::new(id, calendar_id, title, date, date.succ_opt()?)
    }

    /// Whether the range is non-empty. Events built through `new` or
    /// deserialization always are; struct literals may not be.
    pub fn is_valid(&self) -> bool {
        self.start_date < self.end_date
    }

    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date < self.end_date
    }

    /// Last day covered by the event.
    pub fn last_date(&self) -> NaiveDate {
        self.end_date.pred_opt().unwrap_or(self.end_date)
    }

    /// Each covered date in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start_date
            .iter_days()
            .take_while(move |d| *d < self.end_date)
    }
}
