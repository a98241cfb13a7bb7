//! Year view shell: the model the UI binds to and the async services behind it.

pub mod app_services;
pub mod error_mapping;
pub mod models;
pub mod services;

pub use app_services::AppServices;
pub use models::{CreateEventForm, FormError, YearModel};
pub use services::{CalendarServiceError, CalendarServiceMessage, RequestToken};
