//! TileForge - vector-to-raster map tile pyramid generator
//!
//! Renders styled vector layers into XYZ raster tiles over a region and
//! zoom range, storing them as a `{z}/{x}/{y}.png` tree or an MBTiles file.
//!
//! # Modules
//!
//! - [`coord`] - Web Mercator tile grid math
//! - [`geometry`] - feature and attribute model
//! - [`source`] - geometry sources queried per tile
//! - [`style`] - layer styling and conditional rules
//! - [`render`] - the styled rasterizer
//! - [`output`] - XYZ and MBTiles writers
//! - [`generation`] - concurrent job orchestration with pause/resume/cancel
//! - [`config`] - `config.ini` settings and JSON job files
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod coord;
pub mod generation;
pub mod geometry;
pub mod logging;
pub mod output;
pub mod render;
pub mod source;
pub mod style;

/// Library version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
