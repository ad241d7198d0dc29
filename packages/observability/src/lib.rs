//! # Observability
//!
//! Logging initialisation shared by the sign-in binaries.
//!
//! Binaries call `observability::init()` once at startup and use standard
//! `tracing` macros everywhere else. Library crates only depend on `tracing`.
//!
//! Every event is written as one JSON line to
//! `~/.credential-sign-in/logs/sign-in.jsonl` (or `LogConfig::log_path`), with
//! password, code, nonce and token fields redacted before they reach the file.
//! Human-readable output on stderr is opt-in.
//!
//! ```rust,ignore
//! fn main() -> anyhow::Result<()> {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "sign-in".into(),
//!         stderr_level: Some("warn".into()),
//!         ..Default::default()
//!     })?;
//!
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

mod file;
mod json_layer;
mod redact;

use std::path::PathBuf;
use thiserror::Error;

pub use file::{default_log_path, LogFileWriter};
pub use json_layer::{JsonLayer, LogEntry};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line for filtering.
    pub service_name: String,

    /// Default level filter for the file (e.g., "debug", "info").
    /// Overridden by `RUST_LOG`.
    pub default_level: String,

    /// Custom log file path. Defaults to [`default_log_path`].
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr at this level.
    pub stderr_level: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            stderr_level: None,
        }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Error, Debug)]
pub enum ObservabilityError {
    #[error("Home directory not found; set an explicit log path")]
    NoHomeDir,

    #[error("Failed to open log file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed
    #[error("Failed to install subscriber: {0}")]
    Init(String),
}

pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) -> ObservabilityResult<PathBuf> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Initialize logging with custom configuration.
///
/// Returns the path of the log file in use.
pub fn init_with_config(config: LogConfig) -> ObservabilityResult<PathBuf> {
    file::init_subscriber(&config)
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(config.stderr_level.is_none());
    }

    #[test]
    fn test_io_error_names_path() {
        let err = ObservabilityError::Io {
            path: PathBuf::from("/nonexistent/sign-in.jsonl"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/nonexistent/sign-in.jsonl"));
    }
}
