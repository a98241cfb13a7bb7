use crate::services::calendar_service::CalendarServiceError;
use yeargrid_core::{AppError, AuthError, CalendarAccessError, NetworkError};

impl From<CalendarServiceError> for AppError {
    fn from(e: CalendarServiceError) -> Self {
        match e {
            CalendarServiceError::Network(e) => AppError::Network(e),
            CalendarServiceError::Api { status, message } if status >= 500 => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            CalendarServiceError::Api { status, message } => {
                AppError::Calendar(CalendarAccessError::Api { status, message })
            }
            CalendarServiceError::TokenExpired => AppError::Auth(AuthError::TokenExpired),
            CalendarServiceError::Auth(_) => AppError::Auth(AuthError::InvalidToken),
            CalendarServiceError::AccountNotLinked(id) => {
                AppError::Auth(AuthError::AccountNotLinked(id))
            }
            CalendarServiceError::NoAccounts => {
                AppError::Auth(AuthError::TokenNotFound("google".into()))
            }
            CalendarServiceError::NotFound(s) => {
                AppError::Calendar(CalendarAccessError::NotFound(s))
            }
            CalendarServiceError::Invalid(s) => {
                AppError::Calendar(CalendarAccessError::InvalidRequest(s))
            }
            CalendarServiceError::RateLimited(secs) => {
                AppError::Calendar(CalendarAccessError::RateLimited {
                    retry_after_secs: secs,
                })
            }
            CalendarServiceError::Conflict => {
                AppError::Calendar(CalendarAccessError::Conflict("event was modified".into()))
            }
        }
    }
}
