//! In-memory geometry source.

use std::collections::HashMap;

use geo::Simplify;

use super::{GeometrySource, LayerQuery, SourceError};
use crate::coord::BoundingBox;
use crate::geometry::{Attributes, Feature, Geometry};

/// Feature plus its precomputed envelope.
#[derive(Debug, Clone)]
struct IndexedFeature {
    feature: Feature,
    bbox: Option<BoundingBox>,
}

/// Features held in memory, grouped by source name.
///
/// Queries return features whose envelope intersects the query extent,
/// carrying only the requested attributes.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: HashMap<String, Vec<IndexedFeature>>,
    simplify: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simplify lines and polygons to the query resolution before returning.
    pub fn with_simplification(mut self, enabled: bool) -> Self {
        self.simplify = enabled;
        self
    }

    /// Add a feature to a named collection, creating it if needed.
    pub fn insert(&mut self, source_name: impl Into<String>, feature: Feature) {
        let bbox = feature.geometry.bounding_box();
        self.collections
            .entry(source_name.into())
            .or_default()
            .push(IndexedFeature { feature, bbox });
    }

    /// Register an empty collection so queries against it succeed.
    pub fn add_collection(&mut self, source_name: impl Into<String>) {
        self.collections.entry(source_name.into()).or_default();
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Number of features in a collection.
    pub fn len(&self, source_name: &str) -> usize {
        self.collections.get(source_name).map_or(0, Vec::len)
    }
}

impl GeometrySource for MemorySource {
    fn geometries(&self, query: &LayerQuery) -> Result<Vec<Feature>, SourceError> {
        let collection = self
            .collections
            .get(&query.source_name)
            .ok_or_else(|| SourceError::UnknownSource(query.source_name.clone()))?;

        let features = collection
            .iter()
            .filter(|f| f.bbox.is_some_and(|b| b.intersects(&query.bbox)))
            .map(|f| {
                let geometry = if self.simplify && query.resolution > 0.0 {
                    simplify(&f.feature.geometry, query.resolution)
                } else {
                    f.feature.geometry.clone()
                };
                Feature {
                    geometry,
                    attributes: select_attributes(&f.feature.attributes, &query.attributes),
                }
            })
            .collect();

        Ok(features)
    }
}

fn select_attributes(attributes: &Attributes, wanted: &[String]) -> Attributes {
    wanted
        .iter()
        .filter_map(|name| attributes.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

/// Douglas-Peucker simplification of every line and ring.
fn simplify(geometry: &Geometry, epsilon: f64) -> Geometry {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => geometry.clone(),
        Geometry::LineString(l) => Geometry::LineString(l.simplify(&epsilon)),
        Geometry::Polygon(p) => Geometry::Polygon(p.simplify(&epsilon)),
        Geometry::MultiLineString(ml) => Geometry::MultiLineString(ml.simplify(&epsilon)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify(&epsilon)),
        Geometry::Collection(members) => {
            Geometry::Collection(members.iter().map(|g| simplify(g, epsilon)).collect())
        }
    }
}
