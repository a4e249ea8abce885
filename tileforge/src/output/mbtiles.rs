//! MBTiles (SQLite) writer.
//!
//! Rows are stored in TMS order: `tile_row = 2^z - 1 - y`. One connection is
//! shared by all workers behind a mutex, so writes are serialized.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use super::{OutputFormat, TileWriter, TilesetInfo, WriterError};
use crate::coord::TileIndex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS metadata (name text, value text);
    CREATE TABLE IF NOT EXISTS tiles (zoom_level integer, tile_column integer, tile_row integer, tile_data blob);
    CREATE UNIQUE INDEX IF NOT EXISTS tile_index ON tiles (zoom_level, tile_column, tile_row);
";

enum State {
    Idle,
    Open(Connection),
    Finalized,
}

/// Writes tiles into a single `.mbtiles` file.
pub struct MbtilesWriter {
    info: TilesetInfo,
    path: Option<PathBuf>,
    state: Mutex<State>,
}

impl MbtilesWriter {
    pub fn new(info: TilesetInfo) -> Self {
        Self {
            info,
            path: None,
            state: Mutex::new(State::Idle),
        }
    }

    /// Database file in use, once initialized.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn metadata(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("name", self.info.name.clone()),
            ("format", "png".to_string()),
            ("type", "overlay".to_string()),
            ("version", "1.0".to_string()),
        ];
        if let Some(b) = self.info.bounds {
            rows.push((
                "bounds",
                format!("{},{},{},{}", b.min_x, b.min_y, b.max_x, b.max_y),
            ));
        }
        if let Some(z) = self.info.min_zoom {
            rows.push(("minzoom", z.to_string()));
        }
        if let Some(z) = self.info.max_zoom {
            rows.push(("maxzoom", z.to_string()));
        }
        if let Some(d) = &self.info.description {
            rows.push(("description", d.clone()));
        }
        rows
    }
}

impl TileWriter for MbtilesWriter {
    fn initialize(&mut self, output: &Path) -> Result<(), WriterError> {
        let path = OutputFormat::Mbtiles.resolve_path(output);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| WriterError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA synchronous=OFF;")?;
        // journal_mode returns the new mode as a row
        conn.query_row("PRAGMA journal_mode=MEMORY", [], |_| Ok(()))?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("DELETE FROM metadata; DELETE FROM tiles;")?;

        info!(path = %path.display(), "MBTiles output ready");
        *self.state.get_mut() = State::Open(conn);
        self.path = Some(path);
        Ok(())
    }

    fn write_tile(&self, tile: TileIndex, data: &[u8]) -> Result<(), WriterError> {
        let state = self.state.lock();
        let conn = match &*state {
            State::Open(conn) => conn,
            State::Idle => return Err(WriterError::NotInitialized),
            State::Finalized => return Err(WriterError::AlreadyFinalized),
        };

        conn.prepare_cached(
            "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)",
        )?
        .execute(params![tile.z, tile.x, tile.tms_y(), data])?;

        debug!(tile = %tile, tms_row = tile.tms_y(), bytes = data.len(), "Inserted tile");
        Ok(())
    }

    fn finalize(&self) -> Result<(), WriterError> {
        let mut state = self.state.lock();
        let mut conn = match std::mem::replace(&mut *state, State::Finalized) {
            State::Open(conn) => conn,
            State::Idle => {
                *state = State::Idle;
                return Err(WriterError::NotInitialized);
            }
            State::Finalized => return Err(WriterError::AlreadyFinalized),
        };

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO metadata (name, value) VALUES (?1, ?2)")?;
            for (name, value) in self.metadata() {
                stmt.execute(params![name, value])?;
            }
        }
        tx.commit()?;

        conn.close().map_err(|(_, e)| WriterError::Sqlite(e))?;
        info!(path = ?self.path, "MBTiles output finalized");
        Ok(())
    }
}
