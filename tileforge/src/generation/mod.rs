//! Tile pyramid generation.
//!
//! [`TileGenerationService`] enumerates every tile of a region over a zoom
//! range, renders them concurrently and stores the results through a
//! [`crate::output::TileWriter`]. Operators can pause, resume and cancel a
//! running job; progress snapshots go to an optional [`ProgressSink`].
//!
//! # Example
//!
//! ```ignore
//! let service = TileGenerationService::new(Arc::new(factory));
//! let options = GenerationOptions::new("out/tiles", Region::Bbox(bbox))
//!     .with_zoom_range(0, 8)
//!     .with_layers(layers);
//!
//! let result = service
//!     .generate(options, Some(sink), CancellationToken::new())
//!     .await?;
//! println!("{} tiles, {} failed", result.completed_tiles, result.failed_tiles);
//! ```

mod context;
mod options;
mod service;

pub use context::{JobContext, PauseGate, ProgressSink, ProgressTracker, DEFAULT_PROGRESS_INTERVAL};
pub use options::{GenerationOptions, GenerationProgress, GenerationResult, Region};
pub use service::{GenerationSettings, TileGenerationService};

use std::path::PathBuf;

use thiserror::Error;

use crate::output::WriterError;
use crate::render::RenderError;

/// Errors that end a generation job.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The job descriptor cannot run.
    #[error("Invalid generation options: {0}")]
    InvalidOptions(String),

    /// Output exists and overwrite was not requested.
    #[error("Output already exists: {0} (enable overwrite to replace it)")]
    OutputExists(PathBuf),

    /// Another job is already running on this service.
    #[error("A generation job is already running")]
    AlreadyRunning,

    /// The renderer could not be built for the layer stack.
    #[error("Failed to create renderer: {0}")]
    Renderer(#[from] RenderError),

    #[error("Failed to initialize output: {0}")]
    WriterInit(#[source] WriterError),

    #[error("Failed to finalize output: {0}")]
    Finalize(#[source] WriterError),

    /// A background task could not be joined.
    #[error("Worker task failed: {0}")]
    Worker(String),

    /// The job was cancelled; the writer was finalized with the tiles done so far.
    #[error("Generation cancelled after {completed} tiles ({failed} failed)")]
    Cancelled { completed: u64, failed: u64 },
}

impl GenerationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GenerationError::Cancelled { .. })
    }
}
