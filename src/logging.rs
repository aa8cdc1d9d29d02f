//! Logging System
//!
//! Structured logging via the `tracing` crate: configurable level, text or
//! JSON format, and stderr or file destinations.

use crate::error::InstallError;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration, resolved from CLI flags and environment.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    pub level: String,
    /// Output format: json, text
    pub format: String,
    /// Output destination: stderr, file
    pub output: String,
    /// Log file path when output is "file"; None means the platform default.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
            output: "stderr".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Resolve from CLI flags. `--verbose` bumps the default level to debug;
    /// an explicit `--log-level` wins over both.
    pub fn from_flags(
        verbose: bool,
        level: Option<String>,
        format: Option<String>,
        output: Option<String>,
        file: Option<PathBuf>,
    ) -> Self {
        let default = Self::default();
        Self {
            level: level.unwrap_or_else(|| {
                if verbose {
                    "debug".to_string()
                } else {
                    default.level
                }
            }),
            format: format.unwrap_or(default.format),
            output: output.unwrap_or(default.output),
            file,
        }
    }
}

/// Default log file location under the platform state directory.
fn default_log_file_path() -> Result<PathBuf, InstallError> {
    let project_dirs = directories::ProjectDirs::from("", "loadout", "loadout").ok_or_else(|| {
        InstallError::ConfigError(
            "Could not determine platform state directory for log file".to_string(),
        )
    })?;
    let dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_dir())
        .to_path_buf();
    Ok(dir.join("loadout.log"))
}

/// Initialize the global subscriber. `LOADOUT_LOG` overrides the level with
/// a full EnvFilter directive string.
pub fn init_logging(config: &LoggingConfig) -> Result<(), InstallError> {
    let filter = EnvFilter::try_from_env("LOADOUT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    match (config.output.as_str(), config.format.as_str()) {
        ("file", format) => {
            let path = match &config.file {
                Some(p) => p.clone(),
                None => default_log_file_path()?,
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            if format == "json" {
                Registry::default()
                    .with(filter)
                    .with(fmt::layer().json().with_writer(file).with_ansi(false))
                    .try_init()
            } else {
                Registry::default()
                    .with(filter)
                    .with(fmt::layer().with_writer(file).with_ansi(false))
                    .try_init()
            }
        }
        (_, "json") => Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).with_ansi(false))
            .try_init(),
        _ => Registry::default()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|e| InstallError::ConfigError(format!("Failed to initialize logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_resolution_precedence() {
        let config = LoggingConfig::from_flags(true, None, None, None, None);
        assert_eq!(config.level, "debug");

        let config = LoggingConfig::from_flags(true, Some("trace".to_string()), None, None, None);
        assert_eq!(config.level, "trace");

        let config = LoggingConfig::from_flags(false, None, None, None, None);
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, "text");
        assert_eq!(config.output, "stderr");
        assert!(config.file.is_none());
    }
}
