//! Label placement and glyph rendering.
//!
//! Glyph outlines come from TrueType/OpenType faces parsed with
//! `ttf-parser` and are drawn as tiny-skia paths. Placement is greedy:
//! the first label to claim an area keeps it for the rest of the tile.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tiny_skia::PathBuilder;
use tracing::debug;
use ttf_parser::{Face, OutlineBuilder};

use super::canvas::TileCanvas;
use super::RenderError;
use crate::style::Rgba;

/// Width of one character, in multiples of the font size, when no font is loaded.
const FALLBACK_ADVANCE: f32 = 0.6;

/// Padding added around every label box before collision tests.
const LABEL_PADDING: f32 = 2.0;

/// Raw font file, validated at load time.
#[derive(Debug)]
struct FontData {
    bytes: Vec<u8>,
}

impl FontData {
    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.bytes, 0).ok()
    }
}

/// Registry of label fonts by name.
#[derive(Debug, Default, Clone)]
pub struct FontBook {
    named: HashMap<String, Arc<FontData>>,
    default: Option<Arc<FontData>>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font from raw bytes.
    ///
    /// The first registered font also becomes the default.
    pub fn add_font(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Result<(), RenderError> {
        let name = name.into();
        Face::parse(&bytes, 0).map_err(|e| RenderError::Font {
            name: name.clone(),
            reason: e.to_string(),
        })?;

        let data = Arc::new(FontData { bytes });
        if self.default.is_none() {
            self.default = Some(Arc::clone(&data));
        }
        self.named.insert(name.to_lowercase(), data);
        Ok(())
    }

    /// Register a font file, named after its file stem.
    pub fn load_file(&mut self, path: &Path) -> Result<String, RenderError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "default".to_string());
        let bytes = std::fs::read(path).map_err(|e| RenderError::Font {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        self.add_font(name.clone(), bytes)?;
        Ok(name)
    }

    /// Font for a layer's requested name, falling back to the default.
    fn resolve(&self, name: Option<&str>) -> Option<&FontData> {
        name.and_then(|n| self.named.get(&n.to_lowercase()))
            .or(self.default.as_ref())
            .map(Arc::as_ref)
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none()
    }
}

/// Axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl LabelBox {
    fn centered(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            left: x - width / 2.0,
            top: y - height / 2.0,
            right: x + width / 2.0,
            bottom: y + height / 2.0,
        }
    }

    fn inflate(self, amount: f32) -> Self {
        Self {
            left: self.left - amount,
            top: self.top - amount,
            right: self.right + amount,
            bottom: self.bottom + amount,
        }
    }

    /// Strict overlap; boxes sharing only an edge do not collide.
    pub fn intersects(&self, other: &LabelBox) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }
}

/// Text style for one label.
#[derive(Debug, Clone)]
pub struct LabelStyle<'a> {
    pub size: f32,
    pub color: Rgba,
    pub halo_radius: f32,
    pub halo_color: Rgba,
    pub font_name: Option<&'a str>,
}

/// Outcome of one label placement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Space claimed and glyphs painted.
    Drawn,
    /// Space claimed, but no font was available to paint with.
    Reserved,
    /// Overlaps an earlier label.
    Rejected,
}

impl Placement {
    pub fn is_placed(self) -> bool {
        self != Placement::Rejected
    }
}

/// Collision list for a single tile render.
#[derive(Debug, Default)]
pub struct LabelPlacer {
    occupied: Vec<LabelBox>,
}

impl LabelPlacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placed(&self) -> &[LabelBox] {
        &self.occupied
    }

    /// Try to place `text` centered at pixel `(x, y)` and draw it.
    ///
    /// A label whose padded box overlaps an earlier one is rejected.
    pub fn place(
        &mut self,
        canvas: &mut TileCanvas,
        fonts: &FontBook,
        text: &str,
        x: f32,
        y: f32,
        style: &LabelStyle<'_>,
    ) -> Placement {
        let font = fonts.resolve(style.font_name);
        let face = font.and_then(FontData::face);

        let (width, height) = measure(face.as_ref(), text, style.size);
        let bounds = LabelBox::centered(x, y, width, height).inflate(LABEL_PADDING);

        if self.occupied.iter().any(|b| b.intersects(&bounds)) {
            return Placement::Rejected;
        }
        self.occupied.push(bounds);

        match face {
            Some(face) if draw_text(canvas, &face, text, x - width / 2.0, y, style) => {
                Placement::Drawn
            }
            Some(_) => Placement::Reserved,
            None => {
                debug!(text, "No font available, reserving label space only");
                Placement::Reserved
            }
        }
    }
}

/// Label extent in pixels.
fn measure(face: Option<&Face<'_>>, text: &str, size: f32) -> (f32, f32) {
    match face {
        Some(face) => {
            let scale = size / face.units_per_em() as f32;
            let advance: f32 = text
                .chars()
                .map(|c| {
                    face.glyph_index(c)
                        .and_then(|id| face.glyph_hor_advance(id))
                        .map_or(size * FALLBACK_ADVANCE, |a| a as f32 * scale)
                })
                .sum();
            (advance, size)
        }
        None => (text.chars().count() as f32 * size * FALLBACK_ADVANCE, size),
    }
}

/// Outline sink that transforms font units into pixel space.
struct GlyphPath<'a> {
    builder: &'a mut PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
}

impl GlyphPath<'_> {
    #[inline]
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPath<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Draw text starting at `left`, vertically centered on `center_y`.
///
/// Returns false when no glyph had an outline to paint.
fn draw_text(
    canvas: &mut TileCanvas,
    face: &Face<'_>,
    text: &str,
    left: f32,
    center_y: f32,
    style: &LabelStyle<'_>,
) -> bool {
    let scale = style.size / face.units_per_em() as f32;
    let baseline = center_y + (face.ascender() as f32 + face.descender() as f32) / 2.0 * scale;

    let mut builder = PathBuilder::new();
    let mut pen_x = left;

    for c in text.chars() {
        let Some(id) = face.glyph_index(c) else {
            pen_x += style.size * FALLBACK_ADVANCE;
            continue;
        };
        let mut glyph = GlyphPath {
            builder: &mut builder,
            origin_x: pen_x,
            baseline,
            scale,
        };
        // Whitespace glyphs have no outline
        let _ = face.outline_glyph(id, &mut glyph);
        pen_x += face
            .glyph_hor_advance(id)
            .map_or(style.size * FALLBACK_ADVANCE, |a| a as f32 * scale);
    }

    let Some(path) = builder.finish() else {
        return false;
    };

    if style.halo_radius > 0.0 {
        canvas.stroke_pixel_path(&path, style.halo_color, style.halo_radius * 2.0);
    }
    canvas.fill_pixel_path(&path, style.color);
    true
}
