//! Job descriptor and outcome types.

use std::path::PathBuf;
use std::time::Duration;

use geo::{BoundingRect, MultiPolygon};

use super::GenerationError;
use crate::coord::{
    count_tiles, count_tiles_in_polygon, count_tiles_in_polygon_until, polygon_candidates,
    tile_intersects_polygon, tiles_in_bbox, tiles_in_polygon, BoundingBox, TileIndex, TileRange,
    MAX_ZOOM,
};
use crate::output::OutputFormat;
use crate::style::LayerConfig;

/// Area to generate, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Bbox(BoundingBox),
    Polygon(MultiPolygon<f64>),
}

impl Region {
    /// Every tile of the pyramid, zoom by zoom.
    pub fn tiles(&self, min_zoom: u8, max_zoom: u8) -> Box<dyn Iterator<Item = TileIndex> + Send + '_> {
        match self {
            Region::Bbox(bbox) => {
                let bbox = *bbox;
                Box::new((min_zoom..=max_zoom).flat_map(move |z| tiles_in_bbox(&bbox, z)))
            }
            Region::Polygon(polygon) => Box::new(
                (min_zoom..=max_zoom).flat_map(move |z| tiles_in_polygon(polygon, z)),
            ),
        }
    }

    /// Rectangle at one zoom that holds every tile of the region.
    ///
    /// Pair with [`Region::covers`] to walk the region one candidate at a time.
    pub fn candidates(&self, zoom: u8) -> TileRange {
        match self {
            Region::Bbox(bbox) => tiles_in_bbox(bbox, zoom),
            Region::Polygon(polygon) => polygon_candidates(polygon, zoom),
        }
    }

    /// Whether a candidate tile belongs to the region.
    pub fn covers(&self, tile: TileIndex) -> bool {
        match self {
            Region::Bbox(_) => true,
            Region::Polygon(polygon) => tile_intersects_polygon(polygon, tile),
        }
    }

    /// Number of tiles [`Region::tiles`] yields.
    ///
    /// Closed form for boxes; polygons are enumerated.
    pub fn tile_count(&self, min_zoom: u8, max_zoom: u8) -> u64 {
        match self {
            Region::Bbox(bbox) => count_tiles(bbox, min_zoom, max_zoom),
            Region::Polygon(polygon) => count_tiles_in_polygon(polygon, min_zoom, max_zoom),
        }
    }

    /// [`Region::tile_count`] that returns `None` once `stop` reports true.
    pub fn tile_count_until<F>(&self, min_zoom: u8, max_zoom: u8, stop: F) -> Option<u64>
    where
        F: Fn() -> bool + Sync,
    {
        match self {
            Region::Bbox(bbox) => Some(count_tiles(bbox, min_zoom, max_zoom)),
            Region::Polygon(polygon) => {
                count_tiles_in_polygon_until(polygon, min_zoom, max_zoom, stop)
            }
        }
    }

    /// Geographic envelope of the region.
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Region::Bbox(bbox) => Some(*bbox),
            Region::Polygon(polygon) => polygon.bounding_rect().map(|r| {
                BoundingBox::new(r.min().x, r.min().y, r.max().x, r.max().y)
            }),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Region::Bbox(bbox) if !bbox.is_valid() => Err(format!("invalid bounding box {bbox}")),
            Region::Polygon(polygon) if polygon.0.is_empty() || polygon.bounding_rect().is_none() => {
                Err("region polygon is empty".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Everything needed to run one generation job.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub region: Region,
    /// Replace an existing, non-empty output.
    pub overwrite: bool,
    /// Tiles rendered at once; 0 uses every available core.
    pub threads: usize,
    /// Drawn in order, later layers on top.
    pub layers: Vec<LayerConfig>,
}

impl GenerationOptions {
    pub fn new(output: impl Into<PathBuf>, region: Region) -> Self {
        Self {
            output: output.into(),
            format: OutputFormat::default(),
            min_zoom: 0,
            max_zoom: 0,
            region,
            overwrite: false,
            threads: 0,
            layers: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_layers(mut self, layers: Vec<LayerConfig>) -> Self {
        self.layers = layers;
        self
    }

    /// Effective number of concurrent tile renders.
    pub fn worker_count(&self) -> usize {
        if self.threads > 0 {
            return self.threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    /// Reject descriptors that cannot run.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let invalid = |reason: String| Err(GenerationError::InvalidOptions(reason));

        if self.output.as_os_str().is_empty() {
            return invalid("output path is empty".to_string());
        }
        if self.min_zoom > self.max_zoom {
            return invalid(format!(
                "min_zoom {} is greater than max_zoom {}",
                self.min_zoom, self.max_zoom
            ));
        }
        if self.max_zoom > MAX_ZOOM {
            return invalid(format!(
                "max_zoom {} exceeds the supported maximum of {}",
                self.max_zoom, MAX_ZOOM
            ));
        }
        self.region.validate().or_else(invalid)
    }
}

/// Progress snapshot delivered to a [`super::ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationProgress {
    /// Tiles processed without error, including empty ones.
    pub completed: u64,
    pub total: u64,
    pub failed: u64,
    pub elapsed: Duration,
    pub estimated_remaining: Duration,
    pub tiles_per_second: f64,
}

impl GenerationProgress {
    /// Snapshot with linearly extrapolated rate and remaining time.
    pub fn new(completed: u64, total: u64, failed: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let tiles_per_second = if secs > 0.0 {
            completed as f64 / secs
        } else {
            0.0
        };
        let estimated_remaining = if tiles_per_second > 0.0 {
            Duration::from_secs_f64(total.saturating_sub(completed) as f64 / tiles_per_second)
        } else {
            Duration::ZERO
        };

        Self {
            completed,
            total,
            failed,
            elapsed,
            estimated_remaining,
            tiles_per_second,
        }
    }

    /// Completed share of the job, 0.0 to 1.0.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }
}

/// Outcome of a job that ran to the end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationResult {
    pub success: bool,
    pub total_tiles: u64,
    pub completed_tiles: u64,
    pub failed_tiles: u64,
    pub duration: Duration,
}
