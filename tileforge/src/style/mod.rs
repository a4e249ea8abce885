//! Layer styling: configuration, conditional rules and colors.

mod color;
mod layer;
mod rules;

pub use color::{parse_color, parse_color_with_opacity, Rgba, BLACK, GRAY, WHITE};
pub use layer::{DashStyle, FilterCondition, FilterOperator, LayerConfig, StyleRule};
pub use rules::{evaluate_filter, matching_rule, resolve_style, EffectiveStyle, StyleDecision};
