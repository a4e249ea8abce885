//! Styled vector-to-raster tile renderer.

use std::sync::Arc;

use tracing::{debug, warn};

use super::canvas::TileCanvas;
use super::labels::{FontBook, LabelPlacer, LabelStyle, Placement};
use super::{RenderError, TileRenderer};
use crate::coord::{tile_bounds_mercator, TileIndex, TILE_SIZE};
use crate::geometry::{Feature, Part};
use crate::source::{GeometrySource, LayerQuery};
use crate::style::{parse_color, resolve_style, LayerConfig, StyleDecision, WHITE};

/// Default fraction of the tile width added around the query extent.
pub const DEFAULT_BUFFER_RATIO: f64 = 0.05;

/// Raster output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSettings {
    /// Edge length of the output image in pixels.
    pub tile_size: u32,
    /// Query buffer on each side, as a fraction of the tile width.
    pub buffer_ratio: f64,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            buffer_ratio: DEFAULT_BUFFER_RATIO,
        }
    }
}

impl RasterSettings {
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_buffer_ratio(mut self, buffer_ratio: f64) -> Self {
        self.buffer_ratio = buffer_ratio;
        self
    }
}

/// Counters collected while rendering one tile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub layers_rendered: usize,
    pub layers_failed: usize,
    pub features_drawn: usize,
    pub features_hidden: usize,
    /// Labels that claimed space, painted or not.
    pub labels_placed: usize,
    /// Labels whose glyphs were painted.
    pub labels_drawn: usize,
    pub labels_rejected: usize,
}

/// Renders an ordered layer stack into one tile image.
///
/// Immutable after construction and shared by every worker: each render
/// owns a fresh canvas and a fresh label collision list.
pub struct StyledRasterizer {
    source: Arc<dyn GeometrySource>,
    layers: Vec<LayerConfig>,
    settings: RasterSettings,
    fonts: Arc<FontBook>,
}

impl StyledRasterizer {
    pub fn new(
        source: Arc<dyn GeometrySource>,
        layers: Vec<LayerConfig>,
        settings: RasterSettings,
        fonts: Arc<FontBook>,
    ) -> Self {
        Self {
            source,
            layers,
            settings,
            fonts,
        }
    }

    pub fn layers(&self) -> &[LayerConfig] {
        &self.layers
    }

    /// Render a tile and report what was drawn.
    ///
    /// Returns `None` bytes when neither a feature nor a label was painted.
    pub fn render_with_stats(
        &self,
        tile: TileIndex,
    ) -> Result<(Option<Vec<u8>>, RenderStats), RenderError> {
        let extent = tile_bounds_mercator(tile);
        let mut canvas = TileCanvas::new(self.settings.tile_size, extent)?;
        let mut labels = LabelPlacer::new();
        let mut stats = RenderStats::default();

        let query_bbox = extent.expand(extent.width() * self.settings.buffer_ratio);

        for layer in self.layers.iter().filter(|l| l.visible) {
            let query = LayerQuery {
                data_source_id: layer.data_source_id.clone(),
                source_name: layer.source_name.clone(),
                bbox: query_bbox,
                resolution: canvas.resolution(),
                attributes: layer.required_attributes(),
            };

            let features = match self.source.geometries(&query) {
                Ok(features) => features,
                Err(e) => {
                    warn!(tile = %tile, layer = %layer.id, error = %e, "Layer query failed, skipping layer");
                    stats.layers_failed += 1;
                    continue;
                }
            };

            for feature in &features {
                self.draw_feature(&mut canvas, &mut labels, layer, feature, &mut stats);
            }
            stats.layers_rendered += 1;
        }

        debug!(
            tile = %tile,
            features = stats.features_drawn,
            labels = stats.labels_placed,
            "Tile rendered"
        );

        if stats.features_drawn == 0 && stats.labels_drawn == 0 {
            return Ok((None, stats));
        }
        Ok((Some(canvas.encode_png()?), stats))
    }

    fn draw_feature(
        &self,
        canvas: &mut TileCanvas,
        labels: &mut LabelPlacer,
        layer: &LayerConfig,
        feature: &Feature,
        stats: &mut RenderStats,
    ) {
        let style = match resolve_style(layer, &feature.attributes) {
            StyleDecision::Draw(style) => style,
            StyleDecision::Hidden => {
                stats.features_hidden += 1;
                return;
            }
        };

        let mut drawn = false;
        feature.geometry.visit(&mut |part| {
            drawn |= match part {
                Part::Point(p) => canvas.draw_point(p, &style),
                Part::Line(l) => canvas.draw_line(l, &style),
                Part::Polygon(p) => canvas.draw_polygon(p, &style),
            };
        });
        if drawn {
            stats.features_drawn += 1;
        }

        let Some(column) = layer.label_column() else {
            return;
        };
        let text = match feature.attribute(column) {
            Some(value) if !value.is_null() => value.to_string(),
            _ => return,
        };
        if text.trim().is_empty() {
            return;
        }
        let Some((x, y)) = feature.geometry.label_anchor() else {
            return;
        };

        let (px, py) = canvas.to_pixel(x, y);
        let label_style = LabelStyle {
            size: layer.label_size as f32,
            color: parse_color(&layer.label_color),
            halo_radius: layer.label_halo_radius as f32,
            halo_color: WHITE,
            font_name: layer.font_name.as_deref(),
        };

        match labels.place(canvas, &self.fonts, &text, px, py, &label_style) {
            Placement::Drawn => {
                stats.labels_placed += 1;
                stats.labels_drawn += 1;
            }
            Placement::Reserved => stats.labels_placed += 1,
            Placement::Rejected => stats.labels_rejected += 1,
        }
    }
}

impl TileRenderer for StyledRasterizer {
    fn render(&self, tile: TileIndex) -> Result<Option<Vec<u8>>, RenderError> {
        self.render_with_stats(tile).map(|(bytes, _)| bytes)
    }
}
