//! Calendar backend: async operations on the shared runtime, results sent
//! back to the UI thread over the service channel.

use yeargrid_calendar::{AccountStatus, CalendarError, CalendarListItem, EventUpdate, NewEvent};
use yeargrid_core::{NetworkError, ReqwestErrorExt};
use yeargrid_layout::AllDayEvent;

use crate::app_services::AppServices;

/// Error type for calendar operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarServiceError {
    Network(NetworkError),
    Api { status: u16, message: String },
    TokenExpired,
    Auth(String),
    AccountNotLinked(String),
    NotFound(String),
    Invalid(String),
    RateLimited(u64),
    Conflict,
    NoAccounts,
}

impl std::fmt::Display for CalendarServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Calendar network error: {}", e),
            Self::Api { status, message } => write!(f, "Calendar API error {}: {}", status, message),
            Self::TokenExpired => write!(f, "Calendar token expired"),
            Self::Auth(s) => write!(f, "Calendar auth error: {}", s),
            Self::AccountNotLinked(id) => write!(f, "Account not linked: {}", id),
            Self::NotFound(s) => write!(f, "Not found: {}", s),
            Self::Invalid(s) => write!(f, "Invalid event: {}", s),
            Self::RateLimited(secs) => write!(f, "Rate limited for {}s", secs),
            Self::Conflict => write!(f, "Event was modified elsewhere"),
            Self::NoAccounts => write!(f, "No Google account linked"),
        }
    }
}

impl std::error::Error for CalendarServiceError {}

impl From<CalendarError> for CalendarServiceError {
    fn from(e: CalendarError) -> Self {
        match e {
            CalendarError::TokenExpired => Self::TokenExpired,
            CalendarError::AuthRequired => Self::Auth(e.to_string()),
            CalendarError::AccountNotLinked(id) => Self::AccountNotLinked(id),
            CalendarError::NotFound(s) | CalendarError::UnknownCalendar(s) => Self::NotFound(s),
            CalendarError::InvalidEventData(s) => Self::Invalid(s),
            CalendarError::RateLimited(secs) => Self::RateLimited(secs),
            CalendarError::Conflict => Self::Conflict,
            CalendarError::ApiError { status, message } => Self::Api { status, message },
            CalendarError::NetworkError(e) => Self::Network(e.to_network_error()),
        }
    }
}

/// Identifies one event fetch. A response is only applied while its token
/// is still the model's current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub generation: u64,
    pub year: i32,
}

/// Messages sent from async operations back to the UI thread.
#[derive(Debug)]
pub enum CalendarServiceMessage {
    FetchEventsDone {
        token: RequestToken,
        result: Result<Vec<AllDayEvent>, CalendarServiceError>,
    },
    /// Calendar list of every linked account. `refresh` is set when the
    /// listing was part of a manual refresh.
    FetchCalendarsDone {
        refresh: bool,
        calendars: Vec<CalendarListItem>,
        accounts: Vec<AccountStatus>,
    },
    CreateEventDone(Result<AllDayEvent, CalendarServiceError>),
    UpdateEventDone(Result<AllDayEvent, CalendarServiceError>),
    DeleteEventDone {
        event_id: String,
        result: Result<(), CalendarServiceError>,
    },
}

/// Fetch all-day events of `calendar_ids` for `token.year`.
///
/// Starting a fetch cancels the one still in flight; a cancelled fetch sends
/// nothing.
pub fn request_fetch_events(services: &AppServices, token: RequestToken, calendar_ids: Vec<String>) {
    let tx = services.calendar_tx();
    let accounts = services.accounts();
    let cancel = services.begin_fetch();

    services.runtime().spawn(async move {
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(generation = token.generation, "event fetch cancelled");
                return;
            }
            result = accounts.list_events(token.year, &calendar_ids) => {
                result.map_err(CalendarServiceError::from)
            }
        };
        let _ = tx.send(CalendarServiceMessage::FetchEventsDone { token, result });
    });
}

pub fn request_fetch_calendars(services: &AppServices, refresh: bool) {
    let tx = services.calendar_tx();
    let accounts = services.accounts();

    services.runtime().spawn(async move {
        let (calendars, statuses) = accounts.list_calendars().await;
        let _ = tx.send(CalendarServiceMessage::FetchCalendarsDone {
            refresh,
            calendars,
            accounts: statuses,
        });
    });
}

pub fn request_create_event(services: &AppServices, calendar_id: String, event: NewEvent) {
    let tx = services.calendar_tx();
    let accounts = services.accounts();
    if accounts.is_empty() {
        let _ = tx.send(CalendarServiceMessage::CreateEventDone(Err(
            CalendarServiceError::NoAccounts,
        )));
        return;
    }

    services.runtime().spawn(async move {
        let result = accounts
            .create_event(&calendar_id, &event)
            .await
            .map_err(CalendarServiceError::from);
        let _ = tx.send(CalendarServiceMessage::CreateEventDone(result));
    });
}

pub fn request_update_event(
    services: &AppServices,
    calendar_id: String,
    event_id: String,
    update: EventUpdate,
) {
    let tx = services.calendar_tx();
    let accounts = services.accounts();
    if accounts.is_empty() {
        let _ = tx.send(CalendarServiceMessage::UpdateEventDone(Err(
            CalendarServiceError::NoAccounts,
        )));
        return;
    }

    services.runtime().spawn(async move {
        let result = accounts
            .update_event(&calendar_id, &event_id, &update)
            .await
            .map_err(CalendarServiceError::from);
        let _ = tx.send(CalendarServiceMessage::UpdateEventDone(result));
    });
}

pub fn request_delete_event(services: &AppServices, calendar_id: String, event_id: String) {
    let tx = services.calendar_tx();
    let accounts = services.accounts();
    if accounts.is_empty() {
        let _ = tx.send(CalendarServiceMessage::DeleteEventDone {
            event_id,
            result: Err(CalendarServiceError::NoAccounts),
        });
        return;
    }

    services.runtime().spawn(async move {
        let result = accounts
            .delete_event(&calendar_id, &event_id)
            .await
            .map_err(CalendarServiceError::from);
        let _ = tx.send(CalendarServiceMessage::DeleteEventDone { event_id, result });
    });
}
