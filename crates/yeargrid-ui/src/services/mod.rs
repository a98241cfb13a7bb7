pub mod calendar_service;

pub use calendar_service::{
    request_create_event, request_delete_event, request_fetch_calendars, request_fetch_events,
    request_update_event, CalendarServiceError, CalendarServiceMessage, RequestToken,
};
