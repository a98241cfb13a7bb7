pub mod create_form;
pub mod selection;
pub mod year_model;

pub use create_form::{default_create_date, CreateEventForm, FormError};
pub use selection::{
    account_id_of, default_create_calendar, group_by_account, merge_calendar_colors,
    reconcile_selection, retain_valid_selection, writable_calendars, AccountGroup,
};
pub use year_model::YearModel;
