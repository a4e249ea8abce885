//! Tile storage writers.
//!
//! Every writer follows the same lifecycle: [`TileWriter::initialize`] once,
//! any number of [`TileWriter::write_tile`] calls from worker threads, then
//! [`TileWriter::finalize`] once. Two layouts are supported:
//!
//! - [`XyzTileWriter`]: `{root}/{z}/{x}/{y}.png` directory tree
//! - [`MbtilesWriter`]: single SQLite file with TMS row numbering

mod mbtiles;
mod xyz;

pub use mbtiles::MbtilesWriter;
pub use xyz::XyzTileWriter;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{BoundingBox, TileIndex};

/// Errors raised by tile writers.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Writer used before initialize")]
    NotInitialized,

    #[error("Writer already finalized")]
    AlreadyFinalized,

    #[error("Unknown output format '{0}' (expected 'xyz' or 'mbtiles')")]
    UnknownFormat(String),
}

/// Destination for rendered tiles.
///
/// `write_tile` takes `&self` and may be called concurrently; a repeated
/// write to the same address replaces the earlier tile.
pub trait TileWriter: Send + Sync {
    /// Prepare the destination. Called once, before any write.
    fn initialize(&mut self, output: &Path) -> Result<(), WriterError>;

    /// Store encoded bytes for one tile.
    fn write_tile(&self, tile: TileIndex, data: &[u8]) -> Result<(), WriterError>;

    /// Flush and close the destination.
    fn finalize(&self) -> Result<(), WriterError>;
}

/// Supported tile storage layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xyz,
    Mbtiles,
}

impl OutputFormat {
    /// Path the writer will actually produce for `output`.
    ///
    /// MBTiles files always carry the `.mbtiles` extension.
    pub fn resolve_path(&self, output: &Path) -> PathBuf {
        match self {
            OutputFormat::Xyz => output.to_path_buf(),
            OutputFormat::Mbtiles => {
                let has_ext = output
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("mbtiles"));
                if has_ext {
                    output.to_path_buf()
                } else {
                    let mut name = output.as_os_str().to_os_string();
                    name.push(".mbtiles");
                    PathBuf::from(name)
                }
            }
        }
    }
}

impl FromStr for OutputFormat {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xyz" => Ok(OutputFormat::Xyz),
            "mbtiles" => Ok(OutputFormat::Mbtiles),
            other => Err(WriterError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Xyz => write!(f, "xyz"),
            OutputFormat::Mbtiles => write!(f, "mbtiles"),
        }
    }
}

/// Descriptive metadata for the produced tileset.
///
/// Only the MBTiles writer persists it.
#[derive(Debug, Clone, PartialEq)]
pub struct TilesetInfo {
    pub name: String,
    /// Geographic extent in degrees.
    pub bounds: Option<BoundingBox>,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
    pub description: Option<String>,
}

impl Default for TilesetInfo {
    fn default() -> Self {
        Self {
            name: "TileForge Layer".to_string(),
            bounds: None,
            min_zoom: None,
            max_zoom: None,
            description: None,
        }
    }
}

/// Build the writer for a format.
pub fn create_writer(format: OutputFormat, info: TilesetInfo) -> Box<dyn TileWriter> {
    match format {
        OutputFormat::Xyz => Box::new(XyzTileWriter::new()),
        OutputFormat::Mbtiles => Box::new(MbtilesWriter::new(info)),
    }
}
