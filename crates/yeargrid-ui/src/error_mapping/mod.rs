//! Maps UI service errors to yeargrid_core::AppError for consistent user-facing messages.

mod calendar;
