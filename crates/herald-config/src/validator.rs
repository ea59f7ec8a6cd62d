//! Runtime validation of a loaded configuration.

use crate::defaults::MAX_SELECTABLE_DAYS;
use crate::loader::ConfigError;
use crate::schema::Config;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, collecting every problem found.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] listing all violations.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if config.discord.token.trim().is_empty() {
            problems.push("discord.token cannot be empty".to_string());
        }
        if config.discord.prefix.trim().is_empty() {
            problems.push("discord.prefix cannot be empty".to_string());
        }
        if let Err(e) = config.scheduling.tz() {
            problems.push(format!("scheduling.timezone: {e}"));
        }
        if !(1..=MAX_SELECTABLE_DAYS).contains(&config.scheduling.selectable_days) {
            problems.push(format!(
                "scheduling.selectable_days must be between 1 and {MAX_SELECTABLE_DAYS}"
            ));
        }
        if config.auto_delete.response_delay_seconds < config.auto_delete.min_response_delay_seconds {
            problems.push(format!(
                "auto_delete.response_delay_seconds must be at least {}",
                config.auto_delete.min_response_delay_seconds
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// See [`ConfigValidator::validate`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigValidator::validate(self)
    }
}
