//! Tile grid math
//!
//! Pure Web Mercator transforms between geographic coordinates and the XYZ
//! tile quad-tree. Latitude is clamped to ±85.0511287798° before projection
//! so the poles map to the top and bottom rows rather than to infinity.
//!
//! All functions are stateless and safe to call from any thread.

mod types;

pub use types::{
    BoundingBox, TileIndex, TileRange, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    ORIGIN_SHIFT, TILE_SIZE,
};

use std::f64::consts::PI;

use geo::{BoundingRect, Intersects, MultiPolygon, Rect};
use rayon::prelude::*;

/// Converts geographic coordinates to the tile containing them.
///
/// Latitude is clamped to the Mercator limits and longitude to ±180°, and
/// the resulting column/row are clamped to the grid, so every finite input
/// yields a valid tile. Longitude 180° maps to the last column.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees
/// * `zoom` - Zoom level
#[inline]
pub fn lat_lon_to_tile(lat: f64, lon: f64, zoom: u8) -> TileIndex {
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let lon = lon.clamp(MIN_LON, MAX_LON);

    let n = 2.0_f64.powi(zoom as i32);
    let last = (n - 1.0).max(0.0);

    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, last);

    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, last);

    TileIndex::new(zoom, x as u32, y as u32)
}

/// Geographic extent of a tile in degrees.
///
/// `min_y`/`max_y` are latitudes of the south/north edges; `min_x`/`max_x`
/// are longitudes of the west/east edges.
pub fn tile_bounds(z: u8, x: u32, y: u32) -> BoundingBox {
    let n = 2.0_f64.powi(z as i32);

    let west = x as f64 / n * 360.0 - 180.0;
    let east = (x as f64 + 1.0) / n * 360.0 - 180.0;
    let north = row_to_lat(y as f64, n);
    let south = row_to_lat(y as f64 + 1.0, n);

    BoundingBox::new(west, south, east, north)
}

/// Inverse Mercator for a (possibly fractional) row.
#[inline]
fn row_to_lat(row: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees()
}

/// Projected (EPSG:3857) extent of a tile in meters.
pub fn tile_bounds_mercator(tile: TileIndex) -> BoundingBox {
    let n = 2.0_f64.powi(tile.z as i32);
    let resolution = 2.0 * ORIGIN_SHIFT / n;

    let min_x = tile.x as f64 * resolution - ORIGIN_SHIFT;
    let max_x = (tile.x as f64 + 1.0) * resolution - ORIGIN_SHIFT;
    let max_y = ORIGIN_SHIFT - tile.y as f64 * resolution;
    let min_y = ORIGIN_SHIFT - (tile.y as f64 + 1.0) * resolution;

    BoundingBox::new(min_x, min_y, max_x, max_y)
}

/// Forward spherical Mercator: WGS84 degrees to EPSG:3857 meters.
#[inline]
pub fn lon_lat_to_meters(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let x = lon * ORIGIN_SHIFT / 180.0;
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() / (PI / 180.0);
    (x, y * ORIGIN_SHIFT / 180.0)
}

/// Tiles covering a geographic bounding box at one zoom level.
///
/// The corner tiles of (min lat, min lon) and (max lat, max lon) are
/// computed, their x and y ordered independently, and every pair in the
/// inclusive rectangle is produced.
pub fn tiles_in_bbox(bbox: &BoundingBox, zoom: u8) -> TileRange {
    let a = lat_lon_to_tile(bbox.min_y, bbox.min_x, zoom);
    let b = lat_lon_to_tile(bbox.max_y, bbox.max_x, zoom);

    TileRange::new(
        zoom,
        a.x.min(b.x),
        a.y.min(b.y),
        a.x.max(b.x),
        a.y.max(b.y),
    )
}

/// Tiles whose geographic rectangle intersects the polygon at one zoom level.
///
/// Candidates come from the polygon's envelope; tiles that merely touch the
/// boundary are kept. An empty polygon yields no tiles.
pub fn tiles_in_polygon(
    polygon: &MultiPolygon<f64>,
    zoom: u8,
) -> impl Iterator<Item = TileIndex> + '_ {
    polygon_candidates(polygon, zoom)
        .filter(move |tile| tile_intersects_polygon(polygon, *tile))
}

/// Envelope tiles of a polygon at one zoom, before the intersection test.
pub fn polygon_candidates(polygon: &MultiPolygon<f64>, zoom: u8) -> TileRange {
    match polygon_envelope(polygon) {
        Some(bbox) => tiles_in_bbox(&bbox, zoom),
        None => TileRange::empty(zoom),
    }
}

/// Whether a tile's geographic rectangle touches the polygon.
#[inline]
pub fn tile_intersects_polygon(polygon: &MultiPolygon<f64>, tile: TileIndex) -> bool {
    polygon.intersects(&tile_rect(tile).to_polygon())
}

/// Number of tiles [`tiles_in_polygon`] yields over a zoom range.
pub fn count_tiles_in_polygon(polygon: &MultiPolygon<f64>, min_zoom: u8, max_zoom: u8) -> u64 {
    count_tiles_in_polygon_until(polygon, min_zoom, max_zoom, || false).unwrap_or(0)
}

/// Like [`count_tiles_in_polygon`], but gives up once `stop` returns true.
///
/// There is no closed form for arbitrary shapes, so the rows of each zoom
/// are tested in parallel with rayon. `stop` is checked before every row;
/// `None` means the count was abandoned.
pub fn count_tiles_in_polygon_until<F>(
    polygon: &MultiPolygon<f64>,
    min_zoom: u8,
    max_zoom: u8,
    stop: F,
) -> Option<u64>
where
    F: Fn() -> bool + Sync,
{
    let Some(bbox) = polygon_envelope(polygon) else {
        return Some(0);
    };

    let mut total = 0;
    for zoom in min_zoom..=max_zoom {
        let at_zoom: Option<u64> = tiles_in_bbox(&bbox, zoom)
            .rows()
            .par_bridge()
            .map(|row| {
                if stop() {
                    return None;
                }
                Some(row.filter(|tile| tile_intersects_polygon(polygon, *tile)).count() as u64)
            })
            .sum();
        total += at_zoom?;
    }
    Some(total)
}

fn polygon_envelope(polygon: &MultiPolygon<f64>) -> Option<BoundingBox> {
    polygon.bounding_rect().map(|envelope| {
        BoundingBox::new(
            envelope.min().x,
            envelope.min().y,
            envelope.max().x,
            envelope.max().y,
        )
    })
}

/// Geographic rectangle of a tile as a `geo` primitive.
fn tile_rect(tile: TileIndex) -> Rect<f64> {
    let b = tile_bounds(tile.z, tile.x, tile.y);
    Rect::new((b.min_x, b.min_y), (b.max_x, b.max_y))
}

/// Closed-form tile count for a bounding box over a zoom range.
///
/// For each zoom, `(|x_max - x_min| + 1) · (|y_max - y_min| + 1)` using the
/// same corner tiles as [`tiles_in_bbox`], summed over `min_zoom..=max_zoom`.
pub fn count_tiles(bbox: &BoundingBox, min_zoom: u8, max_zoom: u8) -> u64 {
    (min_zoom..=max_zoom)
        .map(|zoom| count_tiles_at_zoom(bbox, zoom))
        .sum()
}

/// Closed-form tile count for a single zoom level.
pub fn count_tiles_at_zoom(bbox: &BoundingBox, zoom: u8) -> u64 {
    let a = lat_lon_to_tile(bbox.min_y, bbox.min_x, zoom);
    let b = lat_lon_to_tile(bbox.max_y, bbox.max_x, zoom);

    let dx = (a.x as i64 - b.x as i64).unsigned_abs();
    let dy = (a.y as i64 - b.y as i64).unsigned_abs();
    (dx + 1) * (dy + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = lat_lon_to_tile(40.7128, -74.0060, 16);
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.z, 16);
    }

    #[test]
    fn test_zoom_zero_is_single_tile() {
        assert_eq!(lat_lon_to_tile(0.0, 0.0, 0), TileIndex::new(0, 0, 0));
        assert_eq!(lat_lon_to_tile(80.0, 179.0, 0), TileIndex::new(0, 0, 0));
    }

    #[test]
    fn test_latitude_clamped_at_poles() {
        let north = lat_lon_to_tile(90.0, 0.0, 4);
        let south = lat_lon_to_tile(-90.0, 0.0, 4);
        assert_eq!(north.y, 0);
        assert_eq!(south.y, 15);
    }

    #[test]
    fn test_antimeridian_maps_to_last_column() {
        let tile = lat_lon_to_tile(0.0, 180.0, 3);
        assert_eq!(tile.x, 7);
        let tile = lat_lon_to_tile(0.0, -180.0, 3);
        assert_eq!(tile.x, 0);
    }

    #[test]
    fn test_tile_bounds_world_tile() {
        let b = tile_bounds(0, 0, 0);
        assert!((b.min_x - -180.0).abs() < 1e-9);
        assert!((b.max_x - 180.0).abs() < 1e-9);
        assert!((b.max_y - MAX_LAT).abs() < 1e-6);
        assert!((b.min_y - MIN_LAT).abs() < 1e-6);
    }

    #[test]
    fn test_tile_bounds_northwest_corner_near_nyc() {
        let b = tile_bounds(16, 19295, 24640);
        assert!((b.max_y - 40.713).abs() < 0.01);
        assert!((b.min_x - -74.007).abs() < 0.01);
    }

    #[test]
    fn test_tile_bounds_mercator_world() {
        let b = tile_bounds_mercator(TileIndex::new(0, 0, 0));
        assert!((b.min_x + ORIGIN_SHIFT).abs() < 1e-6);
        assert!((b.max_x - ORIGIN_SHIFT).abs() < 1e-6);
        assert!((b.min_y + ORIGIN_SHIFT).abs() < 1e-6);
        assert!((b.max_y - ORIGIN_SHIFT).abs() < 1e-6);
    }

    #[test]
    fn test_tile_bounds_mercator_quadrant() {
        // z1 tile (1,0) is the north-east quadrant
        let b = tile_bounds_mercator(TileIndex::new(1, 1, 0));
        assert!(b.min_x.abs() < 1e-6);
        assert!(b.min_y.abs() < 1e-6);
        assert!((b.max_x - ORIGIN_SHIFT).abs() < 1e-6);
        assert!((b.max_y - ORIGIN_SHIFT).abs() < 1e-6);
    }

    #[test]
    fn test_lon_lat_to_meters_matches_tile_edges() {
        let (x, y) = lon_lat_to_meters(180.0, MAX_LAT);
        assert!((x - ORIGIN_SHIFT).abs() < 1e-3);
        assert!((y - ORIGIN_SHIFT).abs() < 1.0);

        let (x, y) = lon_lat_to_meters(0.0, 0.0);
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_tiles_in_bbox_orders_corners() {
        // Northern latitude gives the smaller row; both corners must be ordered
        let bbox = BoundingBox::new(-10.0, -10.0, 10.0, 10.0);
        let tiles: Vec<_> = tiles_in_bbox(&bbox, 2).collect();
        assert_eq!(tiles.len(), 4);
        for t in &tiles {
            assert!(t.x == 1 || t.x == 2);
            assert!(t.y == 1 || t.y == 2);
        }
    }

    #[test]
    fn test_tiles_in_bbox_degenerate_point() {
        let bbox = BoundingBox::new(2.35, 48.85, 2.35, 48.85);
        let tiles: Vec<_> = tiles_in_bbox(&bbox, 10).collect();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0], lat_lon_to_tile(48.85, 2.35, 10));
    }

    #[test]
    fn test_count_tiles_scenario_bbox() {
        // East Asia extent, zoom 0..2
        let bbox = BoundingBox::new(124.0, 33.0, 132.0, 43.0);
        assert_eq!(count_tiles_at_zoom(&bbox, 0), 1);
        assert_eq!(count_tiles_at_zoom(&bbox, 1), 1);
        assert_eq!(count_tiles_at_zoom(&bbox, 2), 1);
        assert_eq!(count_tiles(&bbox, 0, 2), 3);
    }

    #[test]
    fn test_count_tiles_whole_world() {
        let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
        // 1 + 4 + 16 + 64
        assert_eq!(count_tiles(&bbox, 0, 3), 85);
    }

    #[test]
    fn test_tiles_in_polygon_drops_outside_tiles() {
        // L-shape covering the west and south of a 2×2 block at z2 around the origin
        let shape: MultiPolygon<f64> = MultiPolygon(vec![polygon![
            (x: -80.0, y: -60.0),
            (x: 80.0, y: -60.0),
            (x: 80.0, y: -30.0),
            (x: -30.0, y: -30.0),
            (x: -30.0, y: 60.0),
            (x: -80.0, y: 60.0),
            (x: -80.0, y: -60.0),
        ]]);

        let envelope = tiles_in_bbox(&BoundingBox::new(-80.0, -60.0, 80.0, 60.0), 2);
        let envelope_count = envelope.tile_count();
        let inside: Vec<_> = tiles_in_polygon(&shape, 2).collect();

        assert_eq!(envelope_count, 4);
        assert_eq!(inside.len(), 3);
        assert!(!inside.contains(&TileIndex::new(2, 2, 1)));

        let enumerated: u64 = (0..=4)
            .map(|z| tiles_in_polygon(&shape, z).count() as u64)
            .sum();
        assert_eq!(count_tiles_in_polygon(&shape, 0, 4), enumerated);
    }

    #[test]
    fn test_count_tiles_in_empty_polygon() {
        let empty: MultiPolygon<f64> = MultiPolygon(vec![]);
        assert_eq!(count_tiles_in_polygon(&empty, 0, 5), 0);
        assert_eq!(tiles_in_polygon(&empty, 3).count(), 0);
    }

    #[test]
    fn test_tiles_in_polygon_keeps_edge_touching_tile() {
        // Square in the south-west quadrant whose east edge lies on the prime meridian
        let shape: MultiPolygon<f64> = MultiPolygon(vec![polygon![
            (x: -40.0, y: -40.0),
            (x: 0.0, y: -40.0),
            (x: 0.0, y: -10.0),
            (x: -40.0, y: -10.0),
            (x: -40.0, y: -40.0),
        ]]);

        let tiles: Vec<_> = tiles_in_polygon(&shape, 1).collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.contains(&TileIndex::new(1, 0, 1)));
        assert!(tiles.contains(&TileIndex::new(1, 1, 1)));
    }

    #[test]
    fn test_polygon_count_stops_when_asked() {
        let shape: MultiPolygon<f64> = MultiPolygon(vec![polygon![
            (x: -80.0, y: -60.0),
            (x: 80.0, y: -60.0),
            (x: 80.0, y: 60.0),
            (x: -80.0, y: 60.0),
            (x: -80.0, y: -60.0),
        ]]);

        assert_eq!(
            count_tiles_in_polygon_until(&shape, 0, 4, || false),
            Some(count_tiles_in_polygon(&shape, 0, 4))
        );

        // Stopping at the first row must skip every deeper zoom
        let rows = std::sync::atomic::AtomicUsize::new(0);
        let stopped = count_tiles_in_polygon_until(&shape, 0, 18, || {
            rows.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            true
        });
        assert_eq!(stopped, None);
        assert_eq!(rows.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn test_tiles_in_empty_polygon() {
        let shape: MultiPolygon<f64> = MultiPolygon(vec![]);
        assert_eq!(tiles_in_polygon(&shape, 5).count(), 0);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_count_matches_enumeration(
                lon_a in -180.0..180.0_f64,
                lon_b in -180.0..180.0_f64,
                lat_a in -85.0..85.0_f64,
                lat_b in -85.0..85.0_f64,
                zoom in 0u8..=8
            ) {
                let bbox = BoundingBox::new(
                    lon_a.min(lon_b),
                    lat_a.min(lat_b),
                    lon_a.max(lon_b),
                    lat_a.max(lat_b),
                );
                let enumerated = tiles_in_bbox(&bbox, zoom).count() as u64;
                prop_assert_eq!(enumerated, count_tiles(&bbox, zoom, zoom));
            }

            #[test]
            fn test_center_roundtrip(
                zoom in 0u8..=18,
                fx in 0.0..1.0_f64,
                fy in 0.0..1.0_f64
            ) {
                let n = 1u32 << zoom;
                let x = ((fx * n as f64) as u32).min(n - 1);
                let y = ((fy * n as f64) as u32).min(n - 1);

                let (lon, lat) = tile_bounds(zoom, x, y).center();
                let back = lat_lon_to_tile(lat, lon, zoom);

                prop_assert_eq!(back, TileIndex::new(zoom, x, y));
            }

            #[test]
            fn test_tile_in_grid(
                lat in -90.0..90.0_f64,
                lon in -180.0..=180.0_f64,
                zoom in 0u8..=MAX_ZOOM
            ) {
                prop_assert!(lat_lon_to_tile(lat, lon, zoom).is_valid());
            }
        }
    }
}
