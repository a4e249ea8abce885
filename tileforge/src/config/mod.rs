//! Configuration.
//!
//! Two layers of configuration feed a run:
//!
//! - `config.ini` ([`ConfigFile`]): per-user settings such as worker count,
//!   tile size, label font and log location
//! - job files ([`JobFile`]): JSON descriptors of one generation run
//!
//! Job values take precedence over `config.ini`; CLI flags take precedence
//! over both.

mod file;
mod job;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use job::{DataSourceConfig, DataSourceKind, JobFile, JobFileError};
pub use settings::{ConfigFile, GenerationConfig, LoggingConfig, OutputConfig, RenderConfig};
