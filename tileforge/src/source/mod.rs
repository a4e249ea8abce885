//! Geometry sources consumed by the rasterizer.
//!
//! A [`GeometrySource`] answers "which features of this layer fall inside
//! this extent" for a single tile. Implementations must be `Send + Sync`
//! because every render worker queries the same source concurrently.
//!
//! # Implementors
//!
//! - [`MemorySource`] - features registered in memory, per source name
//! - [`GeoJsonSource`] - a directory of GeoJSON files projected at load time
//! - [`SourceRegistry`] - dispatches by data source id to other sources

mod geojson;
mod memory;

pub use geojson::{load_feature_collection, GeoJsonSource};
pub use memory::MemorySource;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::coord::BoundingBox;
use crate::geometry::Feature;

/// Errors raised while querying or loading geometry.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading a source file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is not valid GeoJSON.
    #[error("Invalid GeoJSON in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The layer names a table/collection the source does not have.
    #[error("Unknown source '{0}'")]
    UnknownSource(String),

    /// The layer names a data source that was never registered.
    #[error("Unknown data source '{0}'")]
    UnknownDataSource(String),
}

/// Parameters of a single geometry query.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerQuery {
    /// Data source the layer belongs to.
    pub data_source_id: String,
    /// Table, collection or file within the data source.
    pub source_name: String,
    /// Query extent in EPSG:3857 meters.
    pub bbox: BoundingBox,
    /// Size of one output pixel in meters; sources may simplify to it.
    pub resolution: f64,
    /// Attribute columns to return. Others may be omitted.
    pub attributes: Vec<String>,
}

/// Provider of styled-layer geometry.
pub trait GeometrySource: Send + Sync {
    /// Features of `query.source_name` intersecting `query.bbox`.
    ///
    /// The returned sequence is finite and may be empty.
    fn geometries(&self, query: &LayerQuery) -> Result<Vec<Feature>, SourceError>;
}

/// Routes queries to the source registered for their data source id.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn GeometrySource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the source for a data source id.
    pub fn register(&mut self, id: impl Into<String>, source: Arc<dyn GeometrySource>) {
        self.sources.insert(id.into(), source);
    }

    pub fn with_source(mut self, id: impl Into<String>, source: Arc<dyn GeometrySource>) -> Self {
        self.register(id, source);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl GeometrySource for SourceRegistry {
    fn geometries(&self, query: &LayerQuery) -> Result<Vec<Feature>, SourceError> {
        self.sources
            .get(&query.data_source_id)
            .ok_or_else(|| SourceError::UnknownDataSource(query.data_source_id.clone()))?
            .geometries(query)
    }
}
