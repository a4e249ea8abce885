//! Tile rendering.
//!
//! The [`TileRenderer`] trait abstracts "turn a tile address into encoded
//! image bytes" so the generation service can run any renderer. The
//! production implementation is [`StyledRasterizer`], which queries a
//! [`GeometrySource`] per layer, applies conditional style rules and
//! rasterizes with tiny-skia.
//!
//! # Example
//!
//! ```ignore
//! let rasterizer = StyledRasterizer::new(source, layers, RasterSettings::default(), fonts);
//! match rasterizer.render(TileIndex::new(3, 6, 3))? {
//!     Some(png) => writer.write_tile(tile, &png)?,
//!     None => {} // nothing to draw on this tile
//! }
//! ```

mod canvas;
mod labels;
mod rasterizer;

pub use canvas::TileCanvas;
pub use labels::{FontBook, LabelBox, LabelPlacer, LabelStyle, Placement};
pub use rasterizer::{RasterSettings, RenderStats, StyledRasterizer, DEFAULT_BUFFER_RATIO};

use std::sync::Arc;

use thiserror::Error;

use crate::coord::TileIndex;
use crate::source::GeometrySource;
use crate::style::LayerConfig;

/// Errors that fail a whole tile render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The canvas could not be allocated.
    #[error("Invalid tile size: {0}")]
    InvalidSize(u32),

    /// PNG encoding failed.
    #[error("Failed to encode tile: {0}")]
    Encode(#[from] image::ImageError),

    /// A font could not be loaded.
    #[error("Failed to load font '{name}': {reason}")]
    Font { name: String, reason: String },

    /// Renderer-specific failure.
    #[error("Render failed: {0}")]
    Failed(String),
}

/// Renders a single tile.
///
/// Implementations must be thread-safe (`Send + Sync`): the generation
/// service calls `render` from many worker threads at once.
pub trait TileRenderer: Send + Sync {
    /// Encoded image bytes for `tile`, or `None` when there is nothing to draw.
    fn render(&self, tile: TileIndex) -> Result<Option<Vec<u8>>, RenderError>;
}

/// Builds a renderer for a job's layer stack.
pub trait RendererFactory: Send + Sync {
    fn create(&self, layers: &[LayerConfig]) -> Result<Arc<dyn TileRenderer>, RenderError>;
}

/// Factory producing [`StyledRasterizer`]s over a shared source and font book.
pub struct StyledRendererFactory {
    source: Arc<dyn GeometrySource>,
    settings: RasterSettings,
    fonts: Arc<FontBook>,
}

impl StyledRendererFactory {
    pub fn new(source: Arc<dyn GeometrySource>) -> Self {
        Self {
            source,
            settings: RasterSettings::default(),
            fonts: Arc::new(FontBook::new()),
        }
    }

    pub fn with_settings(mut self, settings: RasterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = Arc::new(fonts);
        self
    }
}

impl RendererFactory for StyledRendererFactory {
    fn create(&self, layers: &[LayerConfig]) -> Result<Arc<dyn TileRenderer>, RenderError> {
        if self.settings.tile_size == 0 {
            return Err(RenderError::InvalidSize(0));
        }
        Ok(Arc::new(StyledRasterizer::new(
            Arc::clone(&self.source),
            layers.to_vec(),
            self.settings.clone(),
            Arc::clone(&self.fonts),
        )))
    }
}

/// Font book holding the DejaVu Sans test fixture.
#[cfg(test)]
pub(crate) fn fixture_fonts() -> FontBook {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf");
    let mut fonts = FontBook::new();
    fonts.load_file(&path).unwrap();
    fonts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    /// Renderer returning fixed bytes, used to check trait-object behavior.
    struct FixedRenderer {
        data: Option<Vec<u8>>,
    }

    impl TileRenderer for FixedRenderer {
        fn render(&self, _tile: TileIndex) -> Result<Option<Vec<u8>>, RenderError> {
            Ok(self.data.clone())
        }
    }

    #[test]
    fn test_renderer_as_trait_object() {
        let renderer: Arc<dyn TileRenderer> = Arc::new(FixedRenderer {
            data: Some(vec![1, 2, 3]),
        });
        assert_eq!(
            renderer.render(TileIndex::new(0, 0, 0)).unwrap(),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_factory_rejects_zero_tile_size() {
        let factory = StyledRendererFactory::new(Arc::new(MemorySource::new()))
            .with_settings(RasterSettings::default().with_tile_size(0));
        assert!(matches!(
            factory.create(&[]),
            Err(RenderError::InvalidSize(0))
        ));
    }

    #[test]
    fn test_factory_builds_renderer_for_layers() {
        let mut source = MemorySource::new();
        source.add_collection("roads");
        let factory = StyledRendererFactory::new(Arc::new(source));

        let renderer = factory
            .create(&[LayerConfig::new("roads", "mem", "roads")])
            .unwrap();
        assert!(renderer.render(TileIndex::new(2, 1, 1)).unwrap().is_none());
    }

    #[test]
    fn test_error_display() {
        let err = RenderError::Font {
            name: "Sans".to_string(),
            reason: "bad magic".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to load font 'Sans': bad magic");
    }
}
