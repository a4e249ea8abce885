//! Count command - preview the size of a pyramid.

use tileforge::coord::{count_tiles, count_tiles_at_zoom, BoundingBox, MAX_ZOOM};

use crate::error::CliError;

/// Run the count command.
pub fn run(bbox: BoundingBox, min_zoom: u8, max_zoom: u8) -> Result<(), CliError> {
    if min_zoom > max_zoom {
        return Err(CliError::Config(format!(
            "min zoom {} is greater than max zoom {}",
            min_zoom, max_zoom
        )));
    }
    if max_zoom > MAX_ZOOM {
        return Err(CliError::Config(format!(
            "max zoom {} exceeds {}",
            max_zoom, MAX_ZOOM
        )));
    }

    println!(
        "Tiles in [{}, {}, {}, {}]:",
        bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y
    );
    for zoom in min_zoom..=max_zoom {
        println!("  z{:<3} {:>14}", zoom, count_tiles_at_zoom(&bbox, zoom));
    }
    println!("  total {:>14}", count_tiles(&bbox, min_zoom, max_zoom));
    Ok(())
}
