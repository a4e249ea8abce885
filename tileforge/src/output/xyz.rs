//! `{root}/{z}/{x}/{y}.png` directory writer.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use super::{TileWriter, WriterError};
use crate::coord::TileIndex;

/// Writes each tile as its own PNG file.
///
/// Tiles go to a temporary sibling first and are renamed into place, so a
/// reader never sees a partial file. Writes to distinct addresses are safe
/// from any number of threads.
#[derive(Debug, Default)]
pub struct XyzTileWriter {
    root: Option<PathBuf>,
    finalized: AtomicBool,
}

impl XyzTileWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final path for a tile under `root`.
    pub fn tile_path(root: &Path, tile: TileIndex) -> PathBuf {
        root.join(tile.z.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.png", tile.y))
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> WriterError + '_ {
    move |source| WriterError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl TileWriter for XyzTileWriter {
    fn initialize(&mut self, output: &Path) -> Result<(), WriterError> {
        fs::create_dir_all(output).map_err(io_err(output))?;
        info!(root = %output.display(), "XYZ output ready");
        self.root = Some(output.to_path_buf());
        self.finalized.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn write_tile(&self, tile: TileIndex, data: &[u8]) -> Result<(), WriterError> {
        if self.finalized.load(Ordering::SeqCst) {
            return Err(WriterError::AlreadyFinalized);
        }
        let root = self.root.as_deref().ok_or(WriterError::NotInitialized)?;

        let path = Self::tile_path(root, tile);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(io_err(dir))?;
        }

        let tmp = path.with_extension("png.tmp");
        fs::write(&tmp, data).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;

        debug!(tile = %tile, bytes = data.len(), "Wrote tile");
        Ok(())
    }

    fn finalize(&self) -> Result<(), WriterError> {
        if self.root.is_none() {
            return Err(WriterError::NotInitialized);
        }
        if self.finalized.swap(true, Ordering::SeqCst) {
            return Err(WriterError::AlreadyFinalized);
        }
        Ok(())
    }
}
