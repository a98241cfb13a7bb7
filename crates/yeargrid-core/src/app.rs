use anyhow::Result;
use std::sync::Arc;

use crate::config::ValidationResult;
use crate::Config;

/// Application state and lifecycle.
pub struct App {
    config: Arc<Config>,
    validation: ValidationResult,
}

impl App {
    /// Load and validate configuration from the user config directory.
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        Ok(Self::with_config(config, validation))
    }

    /// Build from an already loaded configuration.
    pub fn with_config(config: Config, validation: ValidationResult) -> Self {
        Self {
            config: Arc::new(config),
            validation,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            accounts = self.config.google.accounts.len(),
            warnings = self.validation.warnings.len(),
            "Initializing application"
        );

        if self.config.google.accounts.is_empty() {
            tracing::warn!("No Google accounts configured; add one under [[google.accounts]]");
        }

        tracing::info!("Application initialized successfully");
        Ok(())
    }

    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle for services that outlive a borrow of the app.
    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub fn validation(&self) -> &ValidationResult {
        &self.validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_config_shares_config() {
        let mut config = Config::default();
        config.ui.window_width = 640;
        let validation = config.validate();

        let mut app = App::with_config(config, validation);
        app.initialize().unwrap();

        let shared = app.shared_config();
        assert_eq!(shared.ui.window_width, 640);
        assert!(Arc::ptr_eq(&shared, &app.shared_config()));
        assert!(app.validation().is_valid());
        app.shutdown().unwrap();
    }
}
