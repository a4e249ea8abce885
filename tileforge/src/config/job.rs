//! JSON job descriptors.
//!
//! A job file names the output, zoom range, region, data sources and layer
//! stack of one generation run:
//!
//! ```json
//! {
//!   "output": "tiles/coast",
//!   "format": "mbtiles",
//!   "min_zoom": 0,
//!   "max_zoom": 8,
//!   "bbox": [124.0, 33.0, 132.0, 43.0],
//!   "data_sources": [{ "id": "osm", "kind": "geojson", "path": "data" }],
//!   "layers": [{ "id": "land", "data_source_id": "osm", "source_name": "land" }]
//! }
//! ```
//!
//! Relative paths are resolved against the job file's directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::coord::BoundingBox;
use crate::generation::{GenerationOptions, Region};
use crate::output::OutputFormat;
use crate::source::{GeoJsonSource, SourceError, SourceRegistry};
use crate::style::LayerConfig;

/// Job file errors.
#[derive(Debug, Error)]
pub enum JobFileError {
    #[error("Failed to read job file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid job file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid region: {0}")]
    Region(String),

    #[error("Data source '{0}' is declared more than once")]
    DuplicateSource(String),

    #[error("Layer '{layer}' references unknown data source '{data_source}'")]
    MissingSource { layer: String, data_source: String },

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Kind of geometry store behind a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    /// Directory of GeoJSON FeatureCollections, one per source name.
    Geojson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub id: String,
    pub kind: DataSourceKind,
    pub path: PathBuf,
}

/// One generation run, as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    #[serde(default)]
    pub name: Option<String>,
    pub output: PathBuf,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// `[min_lon, min_lat, max_lon, max_lat]`
    #[serde(default)]
    pub bbox: Option<[f64; 4]>,
    /// Rings of `[lon, lat]` positions; the first is the exterior, the rest holes.
    #[serde(default)]
    pub polygon: Option<Vec<Vec<[f64; 2]>>>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub data_sources: Vec<DataSourceConfig>,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl JobFile {
    /// Read a job file, resolving relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self, JobFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| JobFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut job = Self::from_json(&content)?;
        job.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(job)
    }

    pub fn from_json(content: &str) -> Result<Self, JobFileError> {
        let job: JobFile = serde_json::from_str(content)?;
        job.check_sources()?;
        Ok(job)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output)
    }

    fn check_sources(&self) -> Result<(), JobFileError> {
        let mut ids = HashSet::new();
        for source in &self.data_sources {
            if !ids.insert(source.id.as_str()) {
                return Err(JobFileError::DuplicateSource(source.id.clone()));
            }
        }
        for layer in &self.layers {
            if !ids.contains(layer.data_source_id.as_str()) {
                return Err(JobFileError::MissingSource {
                    layer: layer.id.clone(),
                    data_source: layer.data_source_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// The job's region; exactly one of `bbox` and `polygon` must be set.
    pub fn region(&self) -> Result<Region, JobFileError> {
        match (&self.bbox, &self.polygon) {
            (Some([min_x, min_y, max_x, max_y]), None) => Ok(Region::Bbox(BoundingBox::new(
                *min_x, *min_y, *max_x, *max_y,
            ))),
            (None, Some(rings)) => polygon_from_rings(rings).map(Region::Polygon),
            (Some(_), Some(_)) => Err(JobFileError::Region(
                "set either 'bbox' or 'polygon', not both".to_string(),
            )),
            (None, None) => Err(JobFileError::Region(
                "one of 'bbox' or 'polygon' is required".to_string(),
            )),
        }
    }

    /// Generation options; the CLI or config supplies `default_format` and
    /// `default_threads` when the job leaves them out.
    pub fn to_options(
        &self,
        default_format: OutputFormat,
        default_threads: usize,
    ) -> Result<GenerationOptions, JobFileError> {
        Ok(GenerationOptions::new(self.output_path(), self.region()?)
            .with_format(self.format.unwrap_or(default_format))
            .with_zoom_range(self.min_zoom, self.max_zoom)
            .with_overwrite(self.overwrite)
            .with_threads(self.threads.unwrap_or(default_threads))
            .with_layers(self.layers.clone()))
    }

    /// Load every declared data source.
    pub fn build_sources(&self) -> Result<SourceRegistry, JobFileError> {
        let mut registry = SourceRegistry::new();
        for source in &self.data_sources {
            let path = self.resolve(&source.path);
            match source.kind {
                DataSourceKind::Geojson => {
                    let loaded = GeoJsonSource::load_dir(&path)?;
                    info!(id = %source.id, path = %path.display(), "Loaded data source");
                    registry.register(source.id.clone(), Arc::new(loaded));
                }
            }
        }
        Ok(registry)
    }
}

fn polygon_from_rings(rings: &[Vec<[f64; 2]>]) -> Result<MultiPolygon<f64>, JobFileError> {
    let mut rings = rings.iter().map(|ring| {
        if ring.len() < 3 {
            return Err(JobFileError::Region(format!(
                "polygon ring needs at least 3 positions, got {}",
                ring.len()
            )));
        }
        Ok(LineString::new(
            ring.iter().map(|[x, y]| Coord { x: *x, y: *y }).collect(),
        ))
    });

    let exterior = rings
        .next()
        .ok_or_else(|| JobFileError::Region("polygon has no rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(MultiPolygon(vec![Polygon::new(exterior, interiors)]))
}
