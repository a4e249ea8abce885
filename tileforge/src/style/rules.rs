//! Per-feature rule evaluation.

use std::cmp::Ordering;

use super::color::{parse_color_with_opacity, Rgba};
use super::layer::{DashStyle, FilterCondition, FilterOperator, LayerConfig, StyleRule};
use crate::geometry::Attributes;

/// Fully resolved style for one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveStyle {
    pub fill: Option<Rgba>,
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub dash: DashStyle,
    pub point: Rgba,
    pub point_radius: f32,
    /// Name of the rule that produced this style, if any.
    pub rule: Option<String>,
}

/// Outcome of resolving a feature against a layer.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleDecision {
    Draw(EffectiveStyle),
    /// A matching rule is invisible.
    Hidden,
}

/// First rule matching the attributes, in declaration order.
pub fn matching_rule<'a>(layer: &'a LayerConfig, attributes: &Attributes) -> Option<&'a StyleRule> {
    layer.rules.iter().find(|rule| match &rule.filter {
        None => true,
        Some(filter) => evaluate_filter(filter, attributes),
    })
}

/// Resolve the effective style of a feature.
///
/// A matching rule supplies fill, stroke and point colors; otherwise the
/// layer's base style applies. Layer opacity scales every color. Dash style
/// and point size always come from the layer.
pub fn resolve_style(layer: &LayerConfig, attributes: &Attributes) -> StyleDecision {
    let opacity = layer.opacity;

    let style = match matching_rule(layer, attributes) {
        Some(rule) if !rule.visible => return StyleDecision::Hidden,
        Some(rule) => EffectiveStyle {
            fill: Some(parse_color_with_opacity(&rule.fill_color, opacity)),
            stroke: parse_color_with_opacity(&rule.stroke_color, opacity),
            stroke_width: rule.stroke_width as f32,
            dash: layer.stroke_dash,
            point: parse_color_with_opacity(&rule.fill_color, opacity),
            point_radius: layer.point_size as f32,
            rule: Some(rule.name.clone()),
        },
        None => EffectiveStyle {
            fill: layer
                .fill_visible
                .then(|| parse_color_with_opacity(&layer.fill_color, opacity)),
            stroke: parse_color_with_opacity(&layer.stroke_color, opacity),
            stroke_width: layer.stroke_width as f32,
            dash: layer.stroke_dash,
            point: parse_color_with_opacity(&layer.point_color, opacity),
            point_radius: layer.point_size as f32,
            rule: None,
        },
    };

    StyleDecision::Draw(style)
}

/// Evaluate a filter against a feature's attributes.
///
/// Missing or null attributes only satisfy `IsNull`. Equality and
/// containment compare case-insensitively. Ordering compares numerically
/// when both sides parse as numbers and falls back to case-insensitive text
/// ordering otherwise.
pub fn evaluate_filter(filter: &FilterCondition, attributes: &Attributes) -> bool {
    let value = match attributes.get(&filter.column) {
        Some(v) if !v.is_null() => v.to_string(),
        _ => return filter.operator == FilterOperator::IsNull,
    };

    let actual = value.to_lowercase();
    let expected = filter.value.to_lowercase();

    match filter.operator {
        FilterOperator::Equals => actual == expected,
        FilterOperator::NotEquals => actual != expected,
        FilterOperator::Contains => actual.contains(&expected),
        FilterOperator::GreaterThan => compare(&actual, &expected) == Some(Ordering::Greater),
        FilterOperator::LessThan => compare(&actual, &expected) == Some(Ordering::Less),
        FilterOperator::IsNull => false,
    }
}

fn compare(actual: &str, expected: &str) -> Option<Ordering> {
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b),
        _ => Some(actual.cmp(expected)),
    }
}
