//! Calendar API types and data structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use yeargrid_layout::event::UNTITLED;
use yeargrid_layout::AllDayEvent;

use crate::accounts::composite_event_id;
use crate::error::CalendarError;

/// Calendar metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub summary: String,
    pub background_color: Option<String>,
    pub is_primary: bool,
    pub access_role: AccessRole,
}

/// Calendar access role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessRole {
    Owner,
    Writer,
    #[default]
    Reader,
    FreeBusyReader,
}

impl AccessRole {
    /// Unknown or missing roles are treated as read-only.
    pub fn from_api(role: Option<&str>) -> Self {
        match role {
            Some("owner") => Self::Owner,
            Some("writer") => Self::Writer,
            Some("freeBusyReader") => Self::FreeBusyReader,
            _ => Self::Reader,
        }
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Self::Owner | Self::Writer)
    }
}

/// All-day event to create. The end date is inclusive, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub start_date: NaiveDate,
    /// Last day of the event; `None` for a single-day event.
    pub end_date_inclusive: Option<NaiveDate>,
}

impl NewEvent {
    pub fn single_day(title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            start_date: date,
            end_date_inclusive: None,
        }
    }

    /// Exclusive end date as the API expects it.
    pub fn exclusive_end(&self) -> Result<NaiveDate, CalendarError> {
        let last = self.end_date_inclusive.unwrap_or(self.start_date);
        if last < self.start_date {
            return Err(CalendarError::InvalidEventData(
                "end date is before start date".to_string(),
            ));
        }
        last.succ_opt()
            .ok_or_else(|| CalendarError::InvalidEventData("end date out of range".to_string()))
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value, CalendarError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CalendarError::InvalidEventData("title is required".to_string()));
        }
        let end = self.exclusive_end()?;

        Ok(serde_json::json!({
            "summary": title,
            "start": { "date": self.start_date.to_string() },
            "end": { "date": end.to_string() },
        }))
    }
}

/// Partial update for an all-day event. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Inclusive last day. When only the start moves, the event becomes a
    /// single-day event on the new start.
    pub end_date_inclusive: Option<NaiveDate>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.start_date.is_none() && self.end_date_inclusive.is_none()
    }

    pub(crate) fn to_body(&self) -> Result<serde_json::Value, CalendarError> {
        let mut body = serde_json::Map::new();

        if let Some(title) = &self.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(CalendarError::InvalidEventData("title is required".to_string()));
            }
            body.insert("summary".to_string(), serde_json::Value::from(title));
        }

        let last = match (self.start_date, self.end_date_inclusive) {
            (Some(start), end) => {
                let last = end.unwrap_or(start);
                if last < start {
                    return Err(CalendarError::InvalidEventData(
                        "end date is before start date".to_string(),
                    ));
                }
                body.insert(
                    "start".to_string(),
                    serde_json::json!({ "date": start.to_string() }),
                );
                Some(last)
            }
            (None, end) => end,
        };

        if let Some(last) = last {
            let end = last.succ_opt().ok_or_else(|| {
                CalendarError::InvalidEventData("end date out of range".to_string())
            })?;
            body.insert("end".to_string(), serde_json::json!({ "date": end.to_string() }));
        }

        Ok(serde_json::Value::Object(body))
    }
}

// API Response Types

/// Google Calendar API event response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    pub id: String,
    pub summary: Option<String>,
    pub start: Option<ApiEventTime>,
    pub end: Option<ApiEventTime>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    pub date: Option<NaiveDate>,
    pub date_time: Option<String>,
}

impl ApiEvent {
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }

    fn start_date(&self) -> Option<NaiveDate> {
        self.start.as_ref().and_then(|t| t.date)
    }

    fn end_date(&self) -> Option<NaiveDate> {
        self.end.as_ref().and_then(|t| t.date)
    }

    /// Date-only, not cancelled and with a non-empty range.
    pub fn is_all_day(&self) -> bool {
        !self.is_cancelled()
            && matches!((self.start_date(), self.end_date()), (Some(s), Some(e)) if s < e)
    }

    /// Convert to a layout event owned by `calendar_key`. The event id becomes
    /// `{calendar_key}:{id}` so it stays unique across calendars.
    pub fn to_all_day_event(&self, calendar_key: &str) -> Option<AllDayEvent> {
        if self.is_cancelled() {
            return None;
        }
        let title = self
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNTITLED);

        AllDayEvent::new(
            composite_event_id(calendar_key, &self.id),
            calendar_key,
            title,
            self.start_date()?,
            self.end_date()?,
        )
    }
}

/// API response for event list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
    pub next_page_token: Option<String>,
}

/// API response for calendar list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListResponse {
    #[serde(default)]
    pub items: Vec<ApiCalendar>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCalendar {
    pub id: String,
    pub summary: Option<String>,
    pub summary_override: Option<String>,
    pub background_color: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub access_role: Option<String>,
}

impl From<ApiCalendar> for Calendar {
    fn from(api: ApiCalendar) -> Self {
        let summary = api
            .summary_override
            .or(api.summary)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());

        Self {
            access_role: AccessRole::from_api(api.access_role.as_deref()),
            id: api.id,
            summary,
            background_color: api.background_color,
            is_primary: api.primary,
        }
    }
}
