//! Centralized error types for YearGrid.
//!
//! Every crate-level error converts into [`AppError`], and `user_message()`
//! gives the text shown in the UI. The full error stays available for logs.

use thiserror::Error;

/// Top-level application error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarAccessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service error: {0}")]
    Service(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Auth(e) => e.user_message(),
            AppError::Calendar(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Service(_) => "Something went wrong. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "Google Calendar is having trouble. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Problems with `config.toml` or its environment overrides.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::ParseError(_) => "config.toml could not be read. Check its syntax.",
            ConfigError::Invalid(_) => "config.toml has invalid settings. See the log for details.",
        }
    }
}

/// Access token problems for a linked Google account.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Token not found for account: {0}")]
    TokenNotFound(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Account not linked: {0}")]
    AccountNotLinked(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::TokenExpired => "Your Google session has expired. Please reconnect.",
            AuthError::TokenNotFound(_) => "Not signed in. Please connect a Google account.",
            AuthError::InvalidToken => "Google access was denied. Please reconnect.",
            AuthError::AccountNotLinked(_) => "That Google account is no longer connected.",
        }
    }
}

/// Calendar API failures that are not transport or auth problems.
#[derive(Debug, Error)]
pub enum CalendarAccessError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

impl CalendarAccessError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CalendarAccessError::NotFound(_) => {
                "That event or calendar no longer exists. Try refreshing."
            }
            CalendarAccessError::Conflict(_) => {
                "The event was changed elsewhere. Refresh and try again."
            }
            CalendarAccessError::RateLimited { .. } => {
                "Too many requests to Google Calendar. Please wait a moment."
            }
            CalendarAccessError::InvalidRequest(_) => "The event details are not valid.",
            CalendarAccessError::Api { status, .. } if *status >= 500 => {
                "Google Calendar is having trouble. Please try again later."
            }
            CalendarAccessError::Api { .. } => "The calendar request failed. Please try again.",
        }
    }
}

/// Classify transport failures so timeouts and undecodable bodies get
/// their own user messages.
pub trait ReqwestErrorExt {
    fn to_network_error(&self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn to_network_error(&self) -> NetworkError {
        let detail = self.to_string();
        match self.status() {
            _ if self.is_timeout() => NetworkError::Timeout,
            _ if self.is_decode() => NetworkError::InvalidResponse(detail),
            Some(status) => NetworkError::ServerError {
                status: status.as_u16(),
                message: detail,
            },
            None => NetworkError::ConnectionFailed(detail),
        }
    }
}
