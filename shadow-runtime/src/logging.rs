//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - JSON, pretty-print and compact output formats
//! - Module-level filtering through `EnvFilter`
//! - Span contexts around blocking reads and worker steps
//!
//! ## Usage
//!
//! ```ignore
//! use shadow_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug);
//!
//! init_logging(config).expect("Failed to initialize logging");
//!
//! tracing::info!("Mirror started");
//! ```
//!
//! The sync worker logs every copy step at `debug`, bypass service at
//! `debug`, lifecycle transitions at `info` and inconsistencies at `warn`.
//! A filter such as `shadow_sync=trace` is usually all that is needed to
//! follow a single mirror. [`LoggingConfig::from_env`] picks it up from
//! `SHADOW_LOG`.

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::env;
use std::io;
use std::str::FromStr;
use tracing_subscriber::fmt::{self, format::FmtSpan};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Output encoding of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, colored; for local debugging
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line text
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Minimum severity that passes the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Subscriber settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied to the mirror crates when no custom filter is set
    pub level: LogLevel,
    /// Custom filter string (e.g., "shadow_sync=trace,shadow_store=debug")
    pub filter: Option<String>,
    /// Enable span contexts
    pub enable_spans: bool,
    /// Print the emitting module
    pub display_target: bool,
    /// Display thread info (useful to tell the sync worker from readers)
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Replaces the default directives entirely.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Log span open/close around blocking reads and copy steps.
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Environment variable holding a filter directive, e.g. `shadow_sync=trace`.
pub const LOG_FILTER_ENV: &str = "SHADOW_LOG";

/// Environment variable selecting `pretty`, `json` or `compact` output.
pub const LOG_FORMAT_ENV: &str = "SHADOW_LOG_FORMAT";

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::Config(format!("Unknown log format: {}", other))),
        }
    }
}

impl LoggingConfig {
    /// Defaults overridden by `SHADOW_LOG` and `SHADOW_LOG_FORMAT`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(filter) = env::var(LOG_FILTER_ENV) {
            if !filter.trim().is_empty() {
                config = config.with_filter(filter);
            }
        }
        if let Ok(format) = env::var(LOG_FORMAT_ENV) {
            config = config.with_format(format.parse()?);
        }
        Ok(config)
    }
}

/// Installs the global subscriber. Fails if one is already installed or the
/// filter does not parse.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    // Thread names tell the sync worker apart from reader threads.
    let layer = fmt::layer()
        .with_target(config.display_target)
        .with_thread_names(config.display_thread_info)
        .with_span_events(span_events)
        .with_writer(io::stderr);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Compact => registry.with(layer.compact()).try_init(),
        LogFormat::Json => registry
            .with(
                layer
                    .json()
                    .flatten_event(true)
                    .with_current_span(config.enable_spans),
            )
            .try_init(),
    };
    installed.map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str();
            // Mirror crates at the requested level, dependencies at warn.
            std::iter::once("warn".to_string())
                .chain(
                    [
                        env!("CARGO_PKG_NAME"),
                        "shadow_store",
                        "shadow_sync",
                        "shadow_view",
                    ]
                    .iter()
                    .map(|target| format!("{}={}", target.replace('-', "_"), level)),
                )
                .collect::<Vec<_>>()
                .join(",")
        }
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Strip full file paths to basename only
///
/// Cache files usually live in temp directories with long random names;
/// logging only the basename keeps worker lines readable:
///
/// ```ignore
/// use tracing::info;
/// use shadow_runtime::logging::strip_path;
///
/// let path = "/tmp/.tmpA1b2C3/mirror.bin";
/// info!(file = %strip_path(path), "Opened cache file");
/// // Logs: file="mirror.bin"
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Debug)
            .with_filter("shadow_sync=trace")
            .with_spans(false)
            .with_target(true)
            .with_thread_info(false);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter, Some("shadow_sync=trace".to_string()));
        assert!(!config.enable_spans);
        assert!(config.display_target);
        assert!(!config.display_thread_info);
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/tmp/.tmpXyZ/cache.bin"), "cache.bin");
        assert_eq!(strip_path("C:\\Temp\\cache.bin"), "cache.bin");
        assert_eq!(strip_path("cache.bin"), "cache.bin");
        assert_eq!(strip_path("/var/cache/"), "");
    }

    #[test]
    fn test_default_format() {
        #[cfg(debug_assertions)]
        assert_eq!(LogFormat::default(), LogFormat::Pretty);

        #[cfg(not(debug_assertions))]
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Info.as_str(), "info");
    }

    #[test]
    fn test_build_filter() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("shadow_sync=debug"));
    }

    #[test]
    fn test_build_custom_filter() {
        let config = LoggingConfig::default().with_filter("shadow_store=trace,shadow_sync=debug");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("shadow_store=trace"));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Compact ".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_build_invalid_filter() {
        let config = LoggingConfig::default().with_filter("shadow_sync=notalevel");
        assert!(matches!(build_filter(&config), Err(Error::Config(_))));
    }
}
