//! Geometry and attribute model shared by sources and the rasterizer.
//!
//! Geometry kinds form a closed set; multi-part geometries and collections
//! nest arbitrarily and are flattened by the renderer through
//! [`Geometry::visit`].

use std::collections::HashMap;
use std::fmt;

use geo::{BoundingRect, Centroid, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Rect};

use crate::coord::BoundingBox;

/// A single geometry in projected (EPSG:3857) meters.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    LineString(LineString<f64>),
    Polygon(Polygon<f64>),
    MultiPoint(MultiPoint<f64>),
    MultiLineString(MultiLineString<f64>),
    MultiPolygon(MultiPolygon<f64>),
    Collection(Vec<Geometry>),
}

/// A leaf part produced when walking a geometry.
#[derive(Debug, Clone, Copy)]
pub enum Part<'a> {
    Point(&'a Point<f64>),
    Line(&'a LineString<f64>),
    Polygon(&'a Polygon<f64>),
}

impl Geometry {
    /// Call `f` for every point, line and polygon contained in this geometry.
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(Part<'a>),
    {
        match self {
            Geometry::Point(p) => f(Part::Point(p)),
            Geometry::LineString(l) => f(Part::Line(l)),
            Geometry::Polygon(p) => f(Part::Polygon(p)),
            Geometry::MultiPoint(mp) => mp.0.iter().for_each(|p| f(Part::Point(p))),
            Geometry::MultiLineString(ml) => ml.0.iter().for_each(|l| f(Part::Line(l))),
            Geometry::MultiPolygon(mp) => mp.0.iter().for_each(|p| f(Part::Polygon(p))),
            Geometry::Collection(members) => members.iter().for_each(|g| g.visit(f)),
        }
    }

    /// Envelope of the geometry, or `None` when it has no coordinates.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_rect().map(|r| {
            BoundingBox::new(r.min().x, r.min().y, r.max().x, r.max().y)
        })
    }

    fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Geometry::Point(p) => Some(p.bounding_rect()),
            Geometry::LineString(l) => l.bounding_rect(),
            Geometry::Polygon(p) => p.bounding_rect(),
            Geometry::MultiPoint(mp) => mp.bounding_rect(),
            Geometry::MultiLineString(ml) => ml.bounding_rect(),
            Geometry::MultiPolygon(mp) => mp.bounding_rect(),
            Geometry::Collection(members) => members
                .iter()
                .filter_map(Geometry::bounding_rect)
                .reduce(|a, b| {
                    Rect::new(
                        (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                        (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
                    )
                }),
        }
    }

    /// Point at which a label for this geometry is anchored.
    ///
    /// Points anchor at themselves, lines at their middle vertex and polygons
    /// at their centroid. Multi-part geometries and collections use their
    /// first part that yields an anchor.
    pub fn label_anchor(&self) -> Option<(f64, f64)> {
        match self {
            Geometry::Point(p) => Some((p.x(), p.y())),
            Geometry::LineString(l) => middle_vertex(l),
            Geometry::Polygon(p) => p.centroid().map(|c| (c.x(), c.y())),
            Geometry::MultiPoint(mp) => mp.0.first().map(|p| (p.x(), p.y())),
            Geometry::MultiLineString(ml) => ml.0.iter().find_map(middle_vertex),
            Geometry::MultiPolygon(mp) => mp.centroid().map(|c| (c.x(), c.y())),
            Geometry::Collection(members) => members.iter().find_map(Geometry::label_anchor),
        }
    }
}

fn middle_vertex(line: &LineString<f64>) -> Option<(f64, f64)> {
    let coords = &line.0;
    coords.get(coords.len() / 2).map(|c| (c.x, c.y))
}

/// A single attribute value attached to a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

/// Attribute map carried by every feature.
pub type Attributes = HashMap<String, AttributeValue>;

/// A geometry together with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute insertion.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}
