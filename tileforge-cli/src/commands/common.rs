//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use tileforge::coord::BoundingBox;
use tileforge::output::OutputFormat;

/// Output format selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormatArg {
    /// Directory tree of `{z}/{x}/{y}.png` files
    Xyz,
    /// Single SQLite file with TMS row order
    Mbtiles,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Xyz => OutputFormat::Xyz,
            FormatArg::Mbtiles => OutputFormat::Mbtiles,
        }
    }
}

/// Parse `minLon,minLat,maxLon,maxLat` into a bounding box.
pub fn parse_bbox(value: &str) -> Result<BoundingBox, String> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let [min_x, min_y, max_x, max_y] = parts[..] else {
        return Err(format!(
            "expected 4 comma-separated values, got {}",
            parts.len()
        ));
    };

    let bbox = BoundingBox::new(min_x, min_y, max_x, max_y);
    if !bbox.is_valid() {
        return Err("min values must not exceed max values".to_string());
    }
    Ok(bbox)
}
