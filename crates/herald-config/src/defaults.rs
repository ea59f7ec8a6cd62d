//! Default values, matching the behaviour of an unconfigured bot.

use crate::schema::{AutoDeleteConfig, DiscordConfig, SchedulingConfig};

/// Default command prefix.
pub const DEFAULT_PREFIX: &str = "!";
/// Default scheduling time zone.
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";
/// Default number of selectable days in the date picker.
pub const DEFAULT_SELECTABLE_DAYS: u32 = 7;
/// Discord caps select menus at 25 options.
pub const MAX_SELECTABLE_DAYS: u32 = 25;

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            selectable_days: DEFAULT_SELECTABLE_DAYS,
        }
    }
}

impl Default for AutoDeleteConfig {
    fn default() -> Self {
        Self {
            response_delay_seconds: 30,
            min_response_delay_seconds: 5,
        }
    }
}
