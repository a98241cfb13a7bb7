use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Prefix for environment overrides, e.g. `YEARGRID__LAYOUT__GAP_PX=2`.
pub const ENV_PREFIX: &str = "YEARGRID";
const ENV_SEPARATOR: &str = "__";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grid measures
    pub layout: LayoutConfig,

    /// Window and display preferences
    pub ui: UiConfig,

    /// Google Calendar access
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between day cells in pixels
    pub gap_px: u32,
    /// Space above the event lanes for the day number
    pub label_offset_px: f32,
    /// Height of one event lane
    pub lane_height_px: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gap_px: 1,
            label_offset_px: 18.0,
            lane_height_px: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Show weekday initials in day cells
    pub show_days_of_week: bool,
    /// Show events the user has hidden
    pub show_hidden: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_width: 1200,
            window_height: 800,
            show_days_of_week: false,
            show_hidden: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Calendar API v3 root
    pub api_base_url: String,
    /// Colour used for calendars without a background colour
    pub default_calendar_color: String,
    /// Page size for event listing
    pub max_results: u32,
    /// Linked accounts with their access tokens
    pub accounts: Vec<AccountConfig>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            default_calendar_color: "#cbd5e1".to_string(),
            max_results: 2500,
            accounts: Vec::new(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub account_id: String,
    pub email: String,
    pub access_token: String,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Load configuration from the user config directory, creating the file
    /// with defaults if it doesn't exist. Environment overrides apply on top.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!(path = %config_path.display(), "writing default config");
            Self::default().save_to(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit file plus process environment overrides.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load from `path` with environment overrides taken from `env` instead
    /// of the process environment when given.
    pub fn load_with_env(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env);

        let settings = config::Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(environment)
            .build()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        settings
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails; warnings are logged.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.checked()?;
        Ok((config, validation))
    }

    /// Validate, failing with [`ConfigError::Invalid`] on any error.
    pub fn checked(&self) -> std::result::Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.google.api_base_url, "google.api_base_url", &mut result);

        if self.ui.window_width == 0 {
            result.add_error("ui.window_width", "Window width must be greater than 0");
        } else if self.ui.window_width > 10000 {
            result.add_warning("ui.window_width", "Window width is unusually large (>10000)");
        }

        if self.ui.window_height == 0 {
            result.add_error("ui.window_height", "Window height must be greater than 0");
        } else if self.ui.window_height > 10000 {
            result.add_warning("ui.window_height", "Window height is unusually large (>10000)");
        }

        let lane_height = self.layout.lane_height_px;
        if lane_height.is_nan() || lane_height <= 0.0 {
            result.add_error("layout.lane_height_px", "Lane height must be greater than 0");
        }
        let label_offset = self.layout.label_offset_px;
        if label_offset.is_nan() || label_offset < 0.0 {
            result.add_error("layout.label_offset_px", "Label offset cannot be negative");
        }
        if self.layout.gap_px > 20 {
            result.add_warning("layout.gap_px", "Cell gap is unusually large (>20)");
        }

        if self.google.max_results == 0 || self.google.max_results > 2500 {
            result.add_error("google.max_results", "Page size must be between 1 and 2500");
        }

        if !is_hex_color(&self.google.default_calendar_color) {
            result.add_error(
                "google.default_calendar_color",
                format!(
                    "Expected a #rrggbb colour, got: {}",
                    self.google.default_calendar_color
                ),
            );
        }

        if self.google.accounts.is_empty() {
            result.add_warning(
                "google.accounts",
                "No Google accounts configured - the grid will be empty",
            );
        }
        for (i, account) in self.google.accounts.iter().enumerate() {
            if account.account_id.is_empty() {
                result.add_error(format!("google.accounts[{i}].account_id"), "Account id is empty");
            } else if account.account_id.contains('|') {
                result.add_error(
                    format!("google.accounts[{i}].account_id"),
                    "Account id cannot contain '|'",
                );
            }
            if account.access_token.is_empty() {
                result.add_warning(
                    format!("google.accounts[{i}].access_token"),
                    "No access token - this account will fail to load",
                );
            }
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// `<config_dir>/yeargrid/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("yeargrid");

        Ok(config_dir.join("config.toml"))
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> AccountConfig {
        AccountConfig {
            account_id: id.to_string(),
            email: format!("{id}@example.com"),
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn test_valid_default_config() {
        let result = Config::default().validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
        assert!(result.warnings.iter().any(|w| w.field == "google.accounts"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.google.api_base_url = "ftp://example.com".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_window_dimensions() {
        let mut config = Config::default();
        config.ui.window_height = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "ui.window_height"));
    }

    #[test]
    fn test_lane_height_must_be_positive() {
        let mut config = Config::default();
        config.layout.lane_height_px = 0.0;
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_colour_format() {
        assert!(is_hex_color("#cbd5e1"));
        assert!(!is_hex_color("cbd5e1"));
        assert!(!is_hex_color("#cbd5e"));
        assert!(!is_hex_color("#cbd5eg"));

        let mut config = Config::default();
        config.google.default_calendar_color = "slate".to_string();
        assert!(!config.validate().is_valid());
    }

    #[test]
    fn test_account_id_cannot_contain_separator() {
        let mut config = Config::default();
        config.google.accounts = vec![account("a|b")];
        let result = config.validate();
        assert!(result.errors.iter().any(|e| e.field == "google.accounts[0].account_id"));
    }

    #[test]
    fn test_access_token_not_in_debug_output() {
        let text = format!("{:?}", account("me"));
        assert!(!text.contains("token\""));
        assert!(text.contains("<redacted>"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ui.show_days_of_week = true;
        config.google.accounts = vec![account("work")];
        config.save_to(&path).unwrap();

        let loaded = Config::load_with_env(&path, Some(HashMap::new())).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[layout]\ngap_px = 3\n").unwrap();

        let loaded = Config::load_with_env(&path, Some(HashMap::new())).unwrap();
        assert_eq!(loaded.layout.gap_px, 3);
        assert_eq!(loaded.layout.lane_height_px, 12.0);
        assert_eq!(loaded.ui, UiConfig::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let loaded = Config::load_with_env(&path, Some(HashMap::new())).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ui]\nwindow_width = 900\n").unwrap();

        let env = HashMap::from([
            ("YEARGRID__UI__WINDOW_WIDTH".to_string(), "1600".to_string()),
            ("YEARGRID__UI__SHOW_HIDDEN".to_string(), "true".to_string()),
        ]);
        let loaded = Config::load_with_env(&path, Some(env)).unwrap();
        assert_eq!(loaded.ui.window_width, 1600);
        assert!(loaded.ui.show_hidden);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[layout\ngap_px = ").unwrap();

        let err = Config::load_with_env(&path, Some(HashMap::new())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_checked_rejects_invalid_config() {
        let mut config = Config::default();
        config.ui.window_width = 0;
        config.google.max_results = 0;

        let err = config.checked().unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::Invalid(summary)
                if summary.contains("ui.window_width") && summary.contains("google.max_results")
        ));
        assert!(Config::default().checked().is_ok());
    }
}
