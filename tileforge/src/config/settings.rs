//! Settings structs for each `[section]` of `config.ini`.

use std::path::PathBuf;

use crate::coord::TILE_SIZE;
use crate::generation::{GenerationSettings, DEFAULT_PROGRESS_INTERVAL};
use crate::output::OutputFormat;
use crate::render::{RasterSettings, DEFAULT_BUFFER_RATIO};

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub generation: GenerationConfig,
    pub render: RenderConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// `[generation]`
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Concurrent tile renders; 0 uses every core.
    pub threads: usize,
    /// Completions between progress reports.
    pub progress_interval: u64,
}

/// `[render]`
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub tile_size: u32,
    pub buffer_ratio: f64,
    /// Default label font file.
    pub font: Option<PathBuf>,
}

/// `[output]`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub file: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            generation: GenerationConfig {
                threads: 0,
                progress_interval: DEFAULT_PROGRESS_INTERVAL,
            },
            render: RenderConfig {
                tile_size: TILE_SIZE,
                buffer_ratio: DEFAULT_BUFFER_RATIO,
                font: None,
            },
            output: OutputConfig {
                format: OutputFormat::Xyz,
            },
            logging: LoggingConfig {
                file: super::config_directory().join("tileforge.log"),
            },
        }
    }
}

impl ConfigFile {
    pub fn raster_settings(&self) -> RasterSettings {
        RasterSettings::default()
            .with_tile_size(self.render.tile_size)
            .with_buffer_ratio(self.render.buffer_ratio)
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            progress_interval: self.generation.progress_interval,
        }
    }
}
