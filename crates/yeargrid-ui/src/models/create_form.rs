//! State of the "new all-day event" form.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use yeargrid_calendar::{CalendarListItem, NewEvent};

use super::selection::default_create_calendar;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("Title is required.")]
    TitleRequired,

    #[error("Date is required.")]
    DateRequired,

    #[error("Calendar is required.")]
    CalendarRequired,

    #[error("End date must be on/after start date.")]
    EndBeforeStart,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEventForm {
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub has_end_date: bool,
    /// Inclusive last day, only used when `has_end_date` is set.
    pub end_date: Option<NaiveDate>,
    /// Composite calendar id.
    pub calendar_id: String,
    pub submitting: bool,
    pub error: Option<String>,
}

/// Today when it falls in `year`, otherwise January 1st of `year`.
pub fn default_create_date(year: i32, today: NaiveDate) -> Option<NaiveDate> {
    if today.year() == year {
        Some(today)
    } else {
        NaiveDate::from_ymd_opt(year, 1, 1)
    }
}

impl CreateEventForm {
    /// Empty form for `year` with the default date and calendar.
    pub fn new(year: i32, today: NaiveDate, calendars: &[CalendarListItem]) -> Self {
        Self {
            start_date: default_create_date(year, today),
            calendar_id: default_create_calendar(calendars)
                .map(|c| c.id.clone())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Form opened from a click on `date`.
    pub fn for_date(date: NaiveDate, calendars: &[CalendarListItem]) -> Self {
        Self {
            start_date: Some(date),
            calendar_id: default_create_calendar(calendars)
                .map(|c| c.id.clone())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn set_has_end_date(&mut self, enabled: bool) {
        self.has_end_date = enabled;
        if enabled && self.end_date.is_none() {
            self.end_date = self.start_date;
        }
    }

    /// Target calendar and event to create.
    pub fn validate(&self) -> Result<(String, NewEvent), FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::TitleRequired);
        }
        let start_date = self.start_date.ok_or(FormError::DateRequired)?;
        if self.calendar_id.is_empty() {
            return Err(FormError::CalendarRequired);
        }

        let end_date_inclusive = if self.has_end_date { self.end_date } else { None };
        if end_date_inclusive.is_some_and(|end| end < start_date) {
            return Err(FormError::EndBeforeStart);
        }

        Ok((
            self.calendar_id.clone(),
            NewEvent {
                title: title.to_string(),
                start_date,
                end_date_inclusive,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yeargrid_calendar::AccessRole;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendars() -> Vec<CalendarListItem> {
        vec![
            CalendarListItem {
                id: "a|holidays".into(),
                account_id: "a".into(),
                account_email: "a@example.com".into(),
                summary: "Holidays".into(),
                primary: false,
                background_color: None,
                access_role: AccessRole::Reader,
            },
            CalendarListItem {
                id: "a|primary".into(),
                account_id: "a".into(),
                account_email: "a@example.com".into(),
                summary: "Me".into(),
                primary: true,
                background_color: None,
                access_role: AccessRole::Owner,
            },
        ]
    }

    fn filled() -> CreateEventForm {
        CreateEventForm {
            title: "  Trip ".into(),
            start_date: Some(date(2024, 6, 10)),
            calendar_id: "a|primary".into(),
            ..CreateEventForm::default()
        }
    }

    #[test]
    fn test_default_date() {
        assert_eq!(default_create_date(2024, date(2024, 5, 2)), Some(date(2024, 5, 2)));
        assert_eq!(default_create_date(2025, date(2024, 5, 2)), Some(date(2025, 1, 1)));
    }

    #[test]
    fn test_new_form_defaults() {
        let form = CreateEventForm::new(2024, date(2024, 5, 2), &calendars());
        assert_eq!(form.start_date, Some(date(2024, 5, 2)));
        assert_eq!(form.calendar_id, "a|primary");
        assert!(!form.has_end_date);

        let empty = CreateEventForm::new(2024, date(2024, 5, 2), &[]);
        assert_eq!(empty.calendar_id, "");
    }

    #[test]
    fn test_valid_single_day() {
        let (calendar, event) = filled().validate().unwrap();
        assert_eq!(calendar, "a|primary");
        assert_eq!(event.title, "Trip");
        assert_eq!(event.end_date_inclusive, None);
    }

    #[test]
    fn test_end_date_only_used_when_enabled() {
        let mut form = filled();
        form.end_date = Some(date(2024, 6, 1));
        assert!(form.validate().is_ok());

        form.has_end_date = true;
        assert_eq!(form.validate().unwrap_err(), FormError::EndBeforeStart);

        form.end_date = Some(date(2024, 6, 12));
        let (_, event) = form.validate().unwrap();
        assert_eq!(event.end_date_inclusive, Some(date(2024, 6, 12)));
    }

    #[test]
    fn test_enabling_end_date_defaults_to_start() {
        let mut form = filled();
        form.set_has_end_date(true);
        assert_eq!(form.end_date, Some(date(2024, 6, 10)));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_required_fields() {
        let mut form = filled();
        form.title = "   ".into();
        assert_eq!(form.validate().unwrap_err(), FormError::TitleRequired);

        let mut form = filled();
        form.start_date = None;
        assert_eq!(form.validate().unwrap_err(), FormError::DateRequired);

        let mut form = filled();
        form.calendar_id.clear();
        assert_eq!(form.validate().unwrap_err(), FormError::CalendarRequired);
        assert_eq!(FormError::CalendarRequired.to_string(), "Calendar is required.");
    }
}
