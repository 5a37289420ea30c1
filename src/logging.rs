//! Logging Setup
//!
//! Console output (plain or JSON) plus an optional diagnostic log file that
//! rolls daily under the log directory.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Base name of the daily diagnostic log
pub const LOG_FILE_NAME: &str = "capacity-inventory.log";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Emit console logs as JSON
    pub json: bool,
    /// Directory of the daily log file; no file when `None`
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: Some(PathBuf::from("logs")),
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the log file on drop and must be held until
/// the run finishes.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&config.level, rust_log.as_deref())?;

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let (writer, guard) = open_log_writer(dir)?;
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };
    installed.map_err(|e| Error::Internal(format!("failed to install logger: {}", e)))?;

    Ok(guard)
}

/// Map a level name to a level, defaulting to info
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Filter from `RUST_LOG` when it is set and valid, otherwise from `level`.
/// HTTP client internals are held at warn either way.
fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    let base = rust_log
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(parse_level(level).into()));

    Ok(base
        .add_directive(directive("hyper=warn")?)
        .add_directive(directive("reqwest=warn")?))
}

fn directive(raw: &str) -> Result<tracing_subscriber::filter::Directive> {
    raw.parse()
        .map_err(|e| Error::Configuration(format!("bad log directive '{}': {}", raw, e)))
}

/// Daily appender under `dir`, created if missing
fn open_log_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("verbose"), Level::INFO);
    }

    #[test]
    fn test_log_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");

        let (_writer, _guard) = open_log_writer(&log_dir).unwrap();

        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_rust_log_overrides_level() {
        let filter = build_filter("info", Some("debug")).unwrap().to_string();
        assert!(filter.contains("debug"));
        assert!(!filter.contains("info"));
        assert!(filter.contains("hyper=warn"));
    }

    #[test]
    fn test_level_applies_without_rust_log() {
        let filter = build_filter("error", None).unwrap().to_string();
        assert!(filter.contains("error"));

        let filter = build_filter("error", Some("  ")).unwrap().to_string();
        assert!(filter.contains("error"));
    }

    #[test]
    fn test_directives() {
        assert!(directive("hyper=warn").is_ok());
        assert!(directive("array_capacity_inventory::collector=debug").is_ok());
    }
}
