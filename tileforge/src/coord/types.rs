//! Coordinate value types for the XYZ tile grid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.0511287798;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.0511287798;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Deepest zoom level the generator accepts.
pub const MAX_ZOOM: u8 = 24;

/// Edge length of a raster tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Half the circumference of the Web Mercator sphere in meters (π · 6378137).
pub const ORIGIN_SHIFT: f64 = 20_037_508.342_789_244;

/// Address of a tile in the XYZ quad-tree.
///
/// `x` grows eastward and `y` grows southward from the top-left tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    /// Zoom level
    pub z: u8,
    /// Column
    pub x: u32,
    /// Row, counted from the north edge
    pub y: u32,
}

impl TileIndex {
    /// Create a tile index.
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom level.
    #[inline]
    pub fn grid_size(&self) -> u64 {
        1u64 << self.z
    }

    /// Row counted from the south edge, as stored by TMS-style containers.
    #[inline]
    pub fn tms_y(&self) -> u32 {
        (self.grid_size() - 1 - self.y as u64) as u32
    }

    /// Whether x and y fall inside the grid for this zoom.
    pub fn is_valid(&self) -> bool {
        self.z <= MAX_ZOOM && (self.x as u64) < self.grid_size() && (self.y as u64) < self.grid_size()
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Axis-aligned extent.
///
/// The unit depends on the caller: degrees (lon/lat) for grid math input,
/// meters (EPSG:3857) for rasterizer queries. Zero-area boxes are legal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// True when every edge is finite and min ≤ max on both axes.
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite())
            && self.min_x <= self.max_x
            && self.min_y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow the box by `amount` on every side.
    pub fn expand(&self, amount: f64) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    /// Closed-interval overlap test; touching edges count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Inclusive rectangle of tiles at one zoom level.
///
/// Iterates row by row. Cloning yields a fresh iterator over the remaining
/// tiles, so a range captured before iteration can be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    zoom: u8,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    next_x: u32,
    next_y: u32,
    exhausted: bool,
}

impl TileRange {
    /// Create a range covering `min_x..=max_x` × `min_y..=max_y`.
    pub fn new(zoom: u8, min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            zoom,
            min_x,
            min_y,
            max_x,
            max_y,
            next_x: min_x,
            next_y: min_y,
            exhausted: min_x > max_x || min_y > max_y,
        }
    }

    /// A range with no tiles.
    pub fn empty(zoom: u8) -> Self {
        Self::new(zoom, 1, 1, 0, 0)
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// The full rectangle split into one range per row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = TileRange> + Send {
        let (zoom, min_x, max_x) = (self.zoom, self.min_x, self.max_x);
        let rows = if min_x > max_x { 1..=0 } else { self.min_y..=self.max_y };
        rows.map(move |y| TileRange::new(zoom, min_x, y, max_x, y))
    }

    /// Number of tiles in the full rectangle, independent of iteration state.
    pub fn tile_count(&self) -> u64 {
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return 0;
        }
        self.columns() * ((self.max_y - self.min_y) as u64 + 1)
    }

    fn columns(&self) -> u64 {
        (self.max_x - self.min_x) as u64 + 1
    }

    fn remaining(&self) -> u64 {
        if self.exhausted {
            return 0;
        }
        let full_rows_after = (self.max_y - self.next_y) as u64;
        let in_current_row = (self.max_x - self.next_x) as u64 + 1;
        full_rows_after * self.columns() + in_current_row
    }
}

impl Iterator for TileRange {
    type Item = TileIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let tile = TileIndex::new(self.zoom, self.next_x, self.next_y);

        if self.next_x == self.max_x {
            if self.next_y == self.max_y {
                self.exhausted = true;
            } else {
                self.next_x = self.min_x;
                self.next_y += 1;
            }
        } else {
            self.next_x += 1;
        }

        Some(tile)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_index_display() {
        assert_eq!(TileIndex::new(3, 2, 5).to_string(), "3/2/5");
    }

    #[test]
    fn test_tms_flip() {
        assert_eq!(TileIndex::new(3, 2, 5).tms_y(), 2);
        assert_eq!(TileIndex::new(0, 0, 0).tms_y(), 0);
        assert_eq!(TileIndex::new(1, 0, 0).tms_y(), 1);
    }

    #[test]
    fn test_tile_index_validity() {
        assert!(TileIndex::new(2, 3, 3).is_valid());
        assert!(!TileIndex::new(2, 4, 0).is_valid());
        assert!(!TileIndex::new(25, 0, 0).is_valid());
    }

    #[test]
    fn test_bbox_validity() {
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_valid());
        assert!(!BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
    }

    #[test]
    fn test_bbox_intersects_touching_edges() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        let c = BoundingBox::new(1.5, 1.5, 2.0, 2.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_tile_range_enumerates_rectangle() {
        let range = TileRange::new(4, 2, 5, 4, 6);
        assert_eq!(range.tile_count(), 6);

        let tiles: Vec<_> = range.clone().collect();
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[0], TileIndex::new(4, 2, 5));
        assert_eq!(tiles[5], TileIndex::new(4, 4, 6));
    }

    #[test]
    fn test_tile_range_rows_cover_rectangle() {
        let range = TileRange::new(4, 2, 5, 4, 6);
        let rows: Vec<Vec<TileIndex>> = range.rows().map(|row| row.collect()).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert!(rows[1].iter().all(|t| t.y == 6));
        assert_eq!(TileRange::empty(4).count(), 0);
        assert_eq!(TileRange::empty(4).rows().count(), 0);
    }

    #[test]
    fn test_tile_range_size_hint_tracks_progress() {
        let mut range = TileRange::new(3, 0, 0, 2, 1);
        assert_eq!(range.size_hint(), (6, Some(6)));
        range.next();
        range.next();
        range.next();
        assert_eq!(range.size_hint(), (3, Some(3)));
        assert_eq!(range.by_ref().count(), 3);
        assert_eq!(range.next(), None);
    }

    #[test]
    fn test_tile_range_single_tile() {
        let tiles: Vec<_> = TileRange::new(0, 0, 0, 0, 0).collect();
        assert_eq!(tiles, vec![TileIndex::new(0, 0, 0)]);
    }

    #[test]
    fn test_tile_range_clone_replays() {
        let range = TileRange::new(2, 0, 0, 1, 1);
        let first: Vec<_> = range.clone().collect();
        let second: Vec<_> = range.collect();
        assert_eq!(first, second);
    }
}
