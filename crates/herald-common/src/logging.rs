//! Structured logging infrastructure for Herald.

use crate::HeraldError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Output format of the console log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored output for development.
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "herald=debug"). `RUST_LOG` takes precedence.
    pub level: String,
    /// Console output format.
    pub format: LogFormat,
    /// Optional file that receives a plain-text copy of all log output.
    pub file_path: Option<PathBuf>,
    /// Whether to include target module information
    pub include_targets: bool,
    /// Whether to log span open/close events
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file_path: None,
            include_targets: true,
            include_spans: false,
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the tracing subscriber with the given configuration.
///
/// # Errors
///
/// Fails if the level filter cannot be parsed, the log file directory is
/// unusable, or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), HeraldError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| HeraldError::Logging(format!("invalid log level '{}': {e}", config.level)))?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = fmt::layer()
        .with_span_events(span_events.clone())
        .with_target(config.include_targets);
    layers.push(match config.format {
        LogFormat::Pretty => console.pretty().boxed(),
        LogFormat::Compact => console.compact().boxed(),
        LogFormat::Json => console.json().boxed(),
    });

    if let Some(path) = &config.file_path {
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        let file_name = path
            .file_name()
            .ok_or_else(|| HeraldError::Logging(format!("log path {} has no file name", path.display())))?;
        std::fs::create_dir_all(&directory)?;

        let appender = tracing_appender::rolling::never(directory, file_name);
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_span_events(span_events)
                .with_target(config.include_targets)
                .with_writer(appender)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| HeraldError::Logging(e.to_string()))
}
