//! GeoJSON directory source.
//!
//! Each `*.geojson` / `*.json` file in the directory is one collection,
//! keyed by its file stem. Coordinates are WGS84 on disk and are projected
//! to EPSG:3857 once at load time.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, Position, Value as GeoValue};
use serde_json::Value;
use tracing::{debug, info};

use super::memory::MemorySource;
use super::{GeometrySource, LayerQuery, SourceError};
use crate::coord::lon_lat_to_meters;
use crate::geometry::{AttributeValue, Attributes, Feature, Geometry};

/// Features loaded from a directory of GeoJSON files.
///
/// Lines and polygons are simplified to the query resolution.
#[derive(Debug, Clone)]
pub struct GeoJsonSource {
    root: PathBuf,
    inner: MemorySource,
}

impl GeoJsonSource {
    /// Load every GeoJSON file directly inside `root`.
    pub fn load_dir(root: impl AsRef<Path>) -> Result<Self, SourceError> {
        let root = root.as_ref().to_path_buf();
        let entries = fs::read_dir(&root).map_err(|source| SourceError::Io {
            path: root.clone(),
            source,
        })?;

        let mut inner = MemorySource::new().with_simplification(true);
        let mut files = 0usize;

        for entry in entries {
            let path = entry
                .map_err(|source| SourceError::Io {
                    path: root.clone(),
                    source,
                })?
                .path();

            let is_geojson = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("geojson") || e.eq_ignore_ascii_case("json"));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !path.is_file() || !is_geojson {
                continue;
            }

            let features = load_feature_collection(&path)?;
            debug!(collection = stem, features = features.len(), "Loaded GeoJSON collection");

            inner.add_collection(stem);
            for feature in features {
                inner.insert(stem, feature);
            }
            files += 1;
        }

        info!(root = %root.display(), collections = files, "GeoJSON source ready");
        Ok(Self { root, inner })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of features in a collection.
    pub fn len(&self, source_name: &str) -> usize {
        self.inner.len(source_name)
    }
}

impl GeometrySource for GeoJsonSource {
    fn geometries(&self, query: &LayerQuery) -> Result<Vec<Feature>, SourceError> {
        self.inner.geometries(query)
    }
}

/// Read a FeatureCollection file and project it to EPSG:3857.
///
/// Features without geometry, or whose geometry has no usable positions,
/// are dropped.
pub fn load_feature_collection(path: &Path) -> Result<Vec<Feature>, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feature_collection(&content).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Accepts a FeatureCollection, a single Feature or a bare geometry.
fn parse_feature_collection(content: &str) -> Result<Vec<Feature>, geojson::Error> {
    let features = match content.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![geojson::Feature::from(geometry)],
    };

    Ok(features
        .into_iter()
        .filter_map(|raw| {
            let geometry = convert_geometry(raw.geometry?.value)?;
            let attributes = raw
                .properties
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, convert_value(v)))
                .collect::<Attributes>();
            Some(Feature {
                geometry,
                attributes,
            })
        })
        .collect())
}

fn convert_value(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::Text(s),
        other => AttributeValue::Text(other.to_string()),
    }
}

fn project(position: &Position) -> Option<Coord<f64>> {
    match position.as_slice() {
        [lon, lat, ..] => {
            let (x, y) = lon_lat_to_meters(*lon, *lat);
            Some(Coord { x, y })
        }
        _ => None,
    }
}

fn line(positions: &[Position]) -> Option<LineString<f64>> {
    let coords: Option<Vec<_>> = positions.iter().map(project).collect();
    coords.filter(|c| !c.is_empty()).map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> Option<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line(r));
    let exterior = rings.next()??;
    let interiors: Option<Vec<_>> = rings.collect();
    Some(Polygon::new(exterior, interiors?))
}

fn convert_geometry(value: GeoValue) -> Option<Geometry> {
    let geometry = match value {
        GeoValue::Point(position) => Geometry::Point(Point::from(project(&position)?)),
        GeoValue::MultiPoint(positions) => Geometry::MultiPoint(MultiPoint::new(
            positions
                .iter()
                .filter_map(project)
                .map(Point::from)
                .collect(),
        )),
        GeoValue::LineString(positions) => Geometry::LineString(line(&positions)?),
        GeoValue::MultiLineString(lines) => Geometry::MultiLineString(MultiLineString::new(
            lines.iter().filter_map(|l| line(l)).collect(),
        )),
        GeoValue::Polygon(rings) => Geometry::Polygon(polygon(&rings)?),
        GeoValue::MultiPolygon(polygons) => Geometry::MultiPolygon(MultiPolygon::new(
            polygons.iter().filter_map(|p| polygon(p)).collect(),
        )),
        GeoValue::GeometryCollection(geometries) => Geometry::Collection(
            geometries
                .into_iter()
                .filter_map(|g| convert_geometry(g.value))
                .collect(),
        ),
    };
    Some(geometry)
}
