//! Layer and rule configuration.
//!
//! These types deserialize straight from the job file; every styling field
//! has a default so a minimal layer only needs an id and a source.

use serde::{Deserialize, Serialize};

/// Stroke pattern for lines and polygon outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashStyle {
    #[default]
    Solid,
    Dash,
    Dot,
}

impl DashStyle {
    /// On/off intervals in pixels, or `None` for a solid stroke.
    pub fn intervals(&self) -> Option<[f32; 2]> {
        match self {
            DashStyle::Solid => None,
            DashStyle::Dash => Some([10.0, 5.0]),
            DashStyle::Dot => Some([2.0, 2.0]),
        }
    }
}

/// Comparison applied by a [`FilterCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    IsNull,
}

/// Attribute predicate attached to a style rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: String,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Conditional style override.
///
/// Rules are evaluated in order and the first match wins. A rule without a
/// filter always matches and acts as the default branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub filter: Option<FilterCondition>,
    #[serde(default)]
    pub fill_color: String,
    #[serde(default)]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl StyleRule {
    /// Rule that matches every feature.
    pub fn default_rule(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
            fill_color: String::new(),
            stroke_color: String::new(),
            stroke_width: default_stroke_width(),
            visible: true,
        }
    }

    /// Rule guarded by a filter.
    pub fn when(name: impl Into<String>, filter: FilterCondition) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default_rule(name)
        }
    }

    pub fn with_fill(mut self, color: impl Into<String>) -> Self {
        self.fill_color = color.into();
        self
    }

    pub fn with_stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.stroke_color = color.into();
        self.stroke_width = width;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A styled layer drawn onto every tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Data source the layer reads from.
    pub data_source_id: String,
    /// Table, collection or file inside the data source.
    pub source_name: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,

    #[serde(default = "default_fill_color")]
    pub fill_color: String,
    #[serde(default = "default_true")]
    pub fill_visible: bool,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub stroke_dash: DashStyle,

    #[serde(default)]
    pub label_column: Option<String>,
    #[serde(default = "default_label_size")]
    pub label_size: f64,
    #[serde(default = "default_label_color")]
    pub label_color: String,
    #[serde(default)]
    pub label_halo_radius: f64,
    #[serde(default)]
    pub font_name: Option<String>,

    #[serde(default = "default_point_color")]
    pub point_color: String,
    #[serde(default = "default_point_size")]
    pub point_size: f64,

    #[serde(default)]
    pub rules: Vec<StyleRule>,
}

impl LayerConfig {
    /// Layer with default styling reading `source_name` from `data_source_id`.
    pub fn new(
        id: impl Into<String>,
        data_source_id: impl Into<String>,
        source_name: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            data_source_id: data_source_id.into(),
            source_name: source_name.into(),
            visible: true,
            opacity: default_opacity(),
            fill_color: default_fill_color(),
            fill_visible: true,
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            stroke_dash: DashStyle::Solid,
            label_column: None,
            label_size: default_label_size(),
            label_color: default_label_color(),
            label_halo_radius: 0.0,
            font_name: None,
            point_color: default_point_color(),
            point_size: default_point_size(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: StyleRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_label(mut self, column: impl Into<String>, size: f64) -> Self {
        self.label_column = Some(column.into());
        self.label_size = size;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Non-empty label column, if any.
    pub fn label_column(&self) -> Option<&str> {
        self.label_column.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Attribute columns the renderer needs from the source: every rule's
    /// filter column plus the label column, without duplicates.
    pub fn required_attributes(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        let filter_columns = self
            .rules
            .iter()
            .filter_map(|r| r.filter.as_ref())
            .map(|f| f.column.as_str());

        for column in filter_columns.chain(self.label_column()) {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
        columns
    }
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

fn default_fill_color() -> String {
    "#3388FF".to_string()
}

fn default_stroke_color() -> String {
    "#1F4E99".to_string()
}

fn default_stroke_width() -> f64 {
    1.0
}

fn default_label_size() -> f64 {
    12.0
}

fn default_label_color() -> String {
    "#000000".to_string()
}

fn default_point_color() -> String {
    "#E8491D".to_string()
}

fn default_point_size() -> f64 {
    4.0
}
