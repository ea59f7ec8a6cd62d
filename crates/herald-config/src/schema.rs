//! Configuration schema definitions using serde.

use chrono_tz::Tz;
use herald_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for Herald.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord configuration.
    pub discord: DiscordConfig,
    /// Scheduled message configuration.
    pub scheduling: SchedulingConfig,
    /// Auto-delete configuration.
    pub auto_delete: AutoDeleteConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    pub token: String,
    /// Prefix for text commands.
    pub prefix: String,
}

/// Scheduled message configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// IANA time zone used to interpret and display schedule times.
    pub timezone: String,
    /// Number of days, starting today, offered by the date picker.
    pub selectable_days: u32,
}

impl SchedulingConfig {
    /// Parses the configured time zone.
    ///
    /// # Errors
    ///
    /// Returns the parser message when the zone name is unknown.
    pub fn tz(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("unknown time zone '{}': {e}", self.timezone))
    }
}

/// Auto-delete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoDeleteConfig {
    /// Delay before bot responses without an explicit policy are deleted.
    pub response_delay_seconds: u64,
    /// Lowest value `set_response_delay` accepts.
    pub min_response_delay_seconds: u64,
}

impl AutoDeleteConfig {
    /// Default response delay as a [`Duration`].
    pub const fn response_delay(&self) -> Duration {
        Duration::from_secs(self.response_delay_seconds)
    }
}
