//! Calendar-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown calendar: {0}")]
    UnknownCalendar(String),

    #[error("Account not linked: {0}")]
    AccountNotLinked(String),

    #[error("Invalid event data: {0}")]
    InvalidEventData(String),

    #[error("Conflict: event was modified")]
    Conflict,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl CalendarError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "Please sign in to your Google account".to_string(),
            Self::TokenExpired => "Your session has expired. Please sign in again.".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::NotFound(_) => "Event or calendar not found".to_string(),
            Self::UnknownCalendar(_) => "That calendar is not available".to_string(),
            Self::AccountNotLinked(_) => "That Google account is no longer connected".to_string(),
            Self::InvalidEventData(msg) => format!("Invalid event: {}", msg),
            Self::Conflict => "The event was modified elsewhere. Please refresh.".to_string(),
            Self::ApiError { status, .. } => format!("Calendar error (HTTP {})", status),
            Self::NetworkError(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Whether this error should trigger a token refresh.
    pub fn should_refresh_token(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::AuthRequired)
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited(_) | Self::NetworkError(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
