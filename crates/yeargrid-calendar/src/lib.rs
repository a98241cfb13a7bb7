//! Google Calendar access for YearGrid.
//!
//! [`CalendarClient`] talks to one account; [`AccountSet`] fans out over all
//! linked accounts and hands back layout-ready [`yeargrid_layout::AllDayEvent`]s.

pub mod accounts;
pub mod client;
pub mod error;
pub mod types;

pub use accounts::{
    composite_calendar_id, composite_event_id, split_calendar_id, split_event_id, AccountSet,
    AccountStatus, CalendarListItem, LinkedAccount,
};
pub use client::CalendarClient;
pub use error::CalendarError;
pub use types::{AccessRole, ApiEvent, Calendar, EventUpdate, NewEvent};
