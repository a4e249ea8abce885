//! Offscreen tile canvas backed by tiny-skia.
//!
//! Geometry arrives in projected meters and is mapped into pixel space with
//! the tile's north-west corner at (0, 0).

use geo::{LineString, Point, Polygon};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

use super::RenderError;
use crate::coord::BoundingBox;
use crate::style::{DashStyle, EffectiveStyle, Rgba};

/// Raster surface for a single tile render.
pub struct TileCanvas {
    pixmap: Pixmap,
    extent: BoundingBox,
    resolution: f64,
}

impl TileCanvas {
    /// Create a transparent square canvas covering `extent`.
    pub fn new(size: u32, extent: BoundingBox) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(size, size).ok_or(RenderError::InvalidSize(size))?;
        let resolution = extent.width() / size as f64;
        Ok(Self {
            pixmap,
            extent,
            resolution,
        })
    }

    pub fn size(&self) -> u32 {
        self.pixmap.width()
    }

    /// Meters per pixel.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Map projected coordinates to pixel coordinates.
    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        (
            ((x - self.extent.min_x) / self.resolution) as f32,
            ((self.extent.max_y - y) / self.resolution) as f32,
        )
    }

    /// Filled circle. Returns false when nothing could be drawn.
    pub fn draw_point(&mut self, point: &Point<f64>, style: &EffectiveStyle) -> bool {
        if style.point_radius <= 0.0 {
            return false;
        }
        let (px, py) = self.to_pixel(point.x(), point.y());
        let Some(path) = PathBuilder::from_circle(px, py, style.point_radius) else {
            return false;
        };
        self.pixmap.fill_path(
            &path,
            &paint(style.point),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        true
    }

    /// Stroked polyline with the layer's dash pattern.
    pub fn draw_line(&mut self, line: &LineString<f64>, style: &EffectiveStyle) -> bool {
        let mut pb = PathBuilder::new();
        self.push_ring(&mut pb, line, false);
        let Some(path) = pb.finish() else {
            return false;
        };
        self.stroke(&path, style.stroke, style.stroke_width, style.dash)
    }

    /// Polygon fill (even-odd, so holes stay open) followed by its outline.
    pub fn draw_polygon(&mut self, polygon: &Polygon<f64>, style: &EffectiveStyle) -> bool {
        let mut pb = PathBuilder::new();
        self.push_ring(&mut pb, polygon.exterior(), true);
        for interior in polygon.interiors() {
            self.push_ring(&mut pb, interior, true);
        }
        let Some(path) = pb.finish() else {
            return false;
        };

        let mut drawn = false;
        if let Some(fill) = style.fill {
            self.pixmap.fill_path(
                &path,
                &paint(fill),
                FillRule::EvenOdd,
                Transform::identity(),
                None,
            );
            drawn = true;
        }
        drawn |= self.stroke(&path, style.stroke, style.stroke_width, style.dash);
        drawn
    }

    /// Fill a path already expressed in pixel space.
    pub fn fill_pixel_path(&mut self, path: &Path, color: Rgba) {
        self.pixmap.fill_path(
            path,
            &paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// Stroke a path already expressed in pixel space with a solid line.
    pub fn stroke_pixel_path(&mut self, path: &Path, color: Rgba, width: f32) {
        self.stroke(path, color, width, DashStyle::Solid);
    }

    fn stroke(&mut self, path: &Path, color: Rgba, width: f32, dash: DashStyle) -> bool {
        if width <= 0.0 {
            return false;
        }
        let stroke = Stroke {
            width,
            dash: dash
                .intervals()
                .and_then(|intervals| StrokeDash::new(intervals.to_vec(), 0.0)),
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, &paint(color), &stroke, Transform::identity(), None);
        true
    }

    fn push_ring(&self, pb: &mut PathBuilder, ring: &LineString<f64>, close: bool) {
        let mut coords = ring.coords();
        let Some(first) = coords.next() else {
            return;
        };
        let (x, y) = self.to_pixel(first.x, first.y);
        pb.move_to(x, y);
        for c in coords {
            let (x, y) = self.to_pixel(c.x, c.y);
            pb.line_to(x, y);
        }
        if close {
            pb.close();
        }
    }

    /// Straight-alpha RGBA value of one pixel, for inspection.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Rgba::new(c.red(), c.green(), c.blue(), c.alpha())
        })
    }

    /// Encode the canvas as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let mut image = RgbaImage::new(width, height);
        for (dst, src) in image.pixels_mut().zip(self.pixmap.pixels()) {
            let c = src.demultiply();
            *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let mut out = Vec::new();
        PngEncoder::new(&mut out).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        )?;
        Ok(out)
    }
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}
