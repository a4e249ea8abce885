//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tileforge::config::{ConfigFileError, JobFileError};
use tileforge::generation::GenerationError;
use tileforge::render::RenderError;

/// Exit code used when the user interrupts a run.
pub const EXIT_CANCELLED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Job file could not be loaded
    Job(JobFileError),
    /// Label font could not be loaded
    Font(RenderError),
    /// Async runtime could not be started
    Runtime(std::io::Error),
    /// Generation failed or was cancelled
    Generation(GenerationError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        if let CliError::Generation(GenerationError::Cancelled { completed, failed }) = self {
            eprintln!(
                "Cancelled after {} tiles ({} failed). Output may be incomplete.",
                completed, failed
            );
            process::exit(EXIT_CANCELLED);
        }

        eprintln!("Error: {}", self);

        match self {
            CliError::Generation(GenerationError::OutputExists(_)) => {
                eprintln!();
                eprintln!("Use --overwrite or set \"overwrite\": true in the job file.");
            }
            CliError::Job(JobFileError::Source(_)) => {
                eprintln!();
                eprintln!("Data source paths are resolved relative to the job file.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Job(e) => write!(f, "Invalid job file: {}", e),
            CliError::Font(e) => write!(f, "Failed to load label font: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Generation(e) => write!(f, "Generation failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Job(e) => Some(e),
            CliError::Font(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Generation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<JobFileError> for CliError {
    fn from(e: JobFileError) -> Self {
        CliError::Job(e)
    }
}

impl From<GenerationError> for CliError {
    fn from(e: GenerationError) -> Self {
        CliError::Generation(e)
    }
}
