//! CLI runner for common setup.
//!
//! Loads `config.ini` and initializes logging once per command.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use tileforge::config::ConfigFile;
use tileforge::logging::{init_logging, LoggingGuard, DEFAULT_LOG_FILE};
use tracing::info;

use crate::error::CliError;

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a runner, loading config and initializing logging.
    ///
    /// When stdout is a terminal the progress bar owns it, so log lines
    /// only go to the log file.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let (log_dir, log_file) = log_location(&config.logging.file);
        let stdout_enabled = !std::io::stdout().is_terminal();

        let logging_guard = init_logging(&log_dir, &log_file, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TileForge v{}", tileforge::VERSION);
        info!("TileForge CLI: {} command", command);
    }
}

/// Split the configured log path into directory and file name.
///
/// A bare file name lives in the working directory.
fn log_location(path: &Path) -> (PathBuf, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
    (dir, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_location_splits_path() {
        let (dir, file) = log_location(Path::new("/var/log/tileforge/run.log"));
        assert_eq!(dir, PathBuf::from("/var/log/tileforge"));
        assert_eq!(file, "run.log");
    }

    #[test]
    fn test_bare_log_name_uses_working_directory() {
        let (dir, file) = log_location(Path::new("run.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, "run.log");
    }

    #[test]
    fn test_log_location_without_file_name() {
        let (dir, file) = log_location(Path::new("/"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, DEFAULT_LOG_FILE);
    }
}
