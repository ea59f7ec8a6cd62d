//! Configuration loading from YAML files with environment variable overrides.

use crate::schema::Config;
use herald_common::HeraldError;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "HERALD_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Invalid(String),
}

impl From<ConfigError> for HeraldError {
    fn from(err: ConfigError) -> Self {
        Self::config(err.to_string())
    }
}

/// Source of environment values, so overrides can be tested without
/// touching the process environment.
pub trait EnvSource {
    /// Returns the value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl<S: ::std::hash::BuildHasher> EnvSource for std::collections::HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration the way the bot does at startup.
    ///
    /// Looks at `$HERALD_CONFIG_PATH`, then `config.yaml`, then `config.yml`,
    /// and falls back to defaults when no file exists. Environment overrides
    /// are applied and the result is validated.
    ///
    /// # Errors
    ///
    /// Fails when a file cannot be read or parsed, or validation fails.
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_with(&ProcessEnv)
    }

    /// Same as [`ConfigLoader::load`] with an explicit environment.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::load`].
    pub fn load_with(env: &impl EnvSource) -> Result<Config, ConfigError> {
        let path = env
            .var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .or_else(|| {
                ["config.yaml", "config.yml"]
                    .into_iter()
                    .map(PathBuf::from)
                    .find(|p| p.exists())
            });

        let mut config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        };

        Self::apply_env_overrides(&mut config, env);
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a specific file, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or validation fails.
    pub fn load_from_file(path: impl AsRef<Path>, env: &impl EnvSource) -> Result<Config, ConfigError> {
        let mut config = Self::parse_file(path.as_ref())?;
        Self::apply_env_overrides(&mut config, env);
        config.validate()?;
        Ok(config)
    }

    /// Parses YAML text without overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed YAML.
    pub fn parse_str(content: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn parse_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config, env: &impl EnvSource) {
        if let Some(token) = env.var("DISCORD_TOKEN") {
            debug!("Discord token taken from environment");
            config.discord.token = token;
        }
        if let Some(prefix) = env.var("HERALD_PREFIX") {
            config.discord.prefix = prefix;
        }
        if let Some(timezone) = env.var("TIMEZONE") {
            config.scheduling.timezone = timezone;
        }
        if let Some(level) = env.var("HERALD_LOG_LEVEL") {
            config.logging.level = level;
        }
    }
}
