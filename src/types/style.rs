use tracing::warn;

use super::feature::{lookup_field, Feature};
use super::Color;

/// Polygon fill pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum FillStyle {
    #[default]
    Solid,
    BackwardDiagonal,
    Cross,
    DiagonalCross,
    ForwardDiagonal,
    Horizontal,
    Vertical,
    Null,
}

impl FillStyle {
    /// Parse a fill style name. Unknown names fall back to [`FillStyle::Solid`]
    /// with a logged warning.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "solid" => FillStyle::Solid,
            "backwardDiagonal" => FillStyle::BackwardDiagonal,
            "cross" => FillStyle::Cross,
            "diagonalCross" => FillStyle::DiagonalCross,
            "forwardDiagonal" => FillStyle::ForwardDiagonal,
            "horizontal" => FillStyle::Horizontal,
            "vertical" => FillStyle::Vertical,
            "null" => FillStyle::Null,
            other => {
                warn!(fill_style = other, "unsupported fill style, using solid");
                FillStyle::Solid
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FillStyle::Solid => "solid",
            FillStyle::BackwardDiagonal => "backwardDiagonal",
            FillStyle::Cross => "cross",
            FillStyle::DiagonalCross => "diagonalCross",
            FillStyle::ForwardDiagonal => "forwardDiagonal",
            FillStyle::Horizontal => "horizontal",
            FillStyle::Vertical => "vertical",
            FillStyle::Null => "null",
        }
    }
}

/// Stroke dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineStyle {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "solid"))]
    Solid,
    #[cfg_attr(feature = "serde", serde(rename = "dash"))]
    Dash,
    #[cfg_attr(feature = "serde", serde(rename = "dash-dot"))]
    DashDot,
    #[cfg_attr(feature = "serde", serde(rename = "dash-dot-dot"))]
    DashDotDot,
    #[cfg_attr(feature = "serde", serde(rename = "dot"))]
    Dot,
    #[cfg_attr(feature = "serde", serde(rename = "longDash"))]
    LongDash,
    #[cfg_attr(feature = "serde", serde(rename = "longDash-dot"))]
    LongDashDot,
    #[cfg_attr(feature = "serde", serde(rename = "shortDash"))]
    ShortDash,
    #[cfg_attr(feature = "serde", serde(rename = "shortDash-dot"))]
    ShortDashDot,
    #[cfg_attr(feature = "serde", serde(rename = "shortDash-dot-dot"))]
    ShortDashDotDot,
    #[cfg_attr(feature = "serde", serde(rename = "null"))]
    Null,
}

impl LineStyle {
    /// Parse a line style name. Unknown names fall back to [`LineStyle::Solid`]
    /// with a logged warning.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "solid" => LineStyle::Solid,
            "dash" => LineStyle::Dash,
            "dash-dot" => LineStyle::DashDot,
            "dash-dot-dot" => LineStyle::DashDotDot,
            "dot" => LineStyle::Dot,
            "longDash" => LineStyle::LongDash,
            "longDash-dot" => LineStyle::LongDashDot,
            "shortDash" => LineStyle::ShortDash,
            "shortDash-dot" => LineStyle::ShortDashDot,
            "shortDash-dot-dot" => LineStyle::ShortDashDotDot,
            "null" => LineStyle::Null,
            other => {
                warn!(line_style = other, "unsupported line style, using solid");
                LineStyle::Solid
            }
        }
    }

    /// Dash lengths scaled by the stroke width. Empty means a continuous line.
    #[must_use]
    pub fn dash_pattern(self, width: f64) -> Vec<f64> {
        let unit: &[f64] = match self {
            LineStyle::Solid | LineStyle::Null => &[],
            LineStyle::Dash => &[5.0, 5.0],
            LineStyle::DashDot => &[5.0, 3.0, 1.0, 3.0],
            LineStyle::DashDotDot => &[5.0, 3.0, 1.0, 3.0, 1.0, 3.0],
            LineStyle::Dot => &[1.0, 3.0],
            LineStyle::LongDash => &[10.0, 5.0],
            LineStyle::LongDashDot => &[10.0, 5.0, 1.0, 5.0],
            LineStyle::ShortDash => &[3.0, 3.0],
            LineStyle::ShortDashDot => &[3.0, 3.0, 1.0, 3.0],
            LineStyle::ShortDashDotDot => &[3.0, 3.0, 1.0, 3.0, 1.0, 3.0],
        };
        let scale = width.max(1.0);
        unit.iter().map(|len| len * scale).collect()
    }
}

/// Point marker shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointShape {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "circle"))]
    Circle,
    #[cfg_attr(feature = "serde", serde(rename = "+"))]
    Cross,
    #[cfg_attr(feature = "serde", serde(rename = "diamond"))]
    Diamond,
    #[cfg_attr(feature = "serde", serde(rename = "square"))]
    Square,
    #[cfg_attr(feature = "serde", serde(rename = "triangle"))]
    Triangle,
    #[cfg_attr(feature = "serde", serde(rename = "X"))]
    X,
    #[cfg_attr(feature = "serde", serde(rename = "star"))]
    Star,
    #[cfg_attr(feature = "serde", serde(rename = "icon"))]
    Icon,
}

impl PointShape {
    /// Parse a marker name. Unknown names fall back to [`PointShape::Circle`]
    /// with a logged warning.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "circle" => PointShape::Circle,
            "+" => PointShape::Cross,
            "diamond" => PointShape::Diamond,
            "square" => PointShape::Square,
            "triangle" => PointShape::Triangle,
            "X" | "x" => PointShape::X,
            "star" => PointShape::Star,
            "icon" => PointShape::Icon,
            other => {
                warn!(symbol = other, "unsupported point symbol, using circle");
                PointShape::Circle
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub line_style: LineStyle,
}

impl Stroke {
    #[must_use]
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            line_style: LineStyle::Solid,
        }
    }

    #[must_use]
    pub fn with_line_style(mut self, line_style: LineStyle) -> Self {
        self.line_style = line_style;
        self
    }
}

/// Raster marker drawn in place of a vector shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IconImage {
    pub src: String,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PointSettings {
    pub shape: PointShape,
    pub color: Color,
    pub stroke: Stroke,
    /// Marker diameter in pixels.
    pub size: f64,
    /// Radians.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rotation: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset: (f64, f64),
    #[cfg_attr(feature = "serde", serde(default))]
    pub icon: Option<IconImage>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSettings {
    pub stroke: Stroke,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PolygonSettings {
    pub fill_color: Color,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fill_style: FillStyle,
    pub stroke: Stroke,
}

/// Drawing settings attached to a rule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum StyleSettings {
    Point(PointSettings),
    Line(LineSettings),
    Polygon(PolygonSettings),
}

impl StyleSettings {
    #[must_use]
    pub fn point(color: Color, size: f64) -> Self {
        StyleSettings::Point(PointSettings {
            shape: PointShape::Circle,
            color,
            stroke: Stroke::new(Color::BLACK, 1.0),
            size,
            rotation: 0.0,
            offset: (0.0, 0.0),
            icon: None,
        })
    }

    #[must_use]
    pub fn line(color: Color, width: f64) -> Self {
        StyleSettings::Line(LineSettings {
            stroke: Stroke::new(color, width),
        })
    }

    #[must_use]
    pub fn polygon(fill_color: Color, stroke: Stroke) -> Self {
        StyleSettings::Polygon(PolygonSettings {
            fill_color,
            fill_style: FillStyle::Solid,
            stroke,
        })
    }
}

/// Label settings. `{FIELD}` placeholders in `text` are replaced with the
/// feature's attribute values.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TextSettings {
    pub text: String,
    pub font: String,
    pub color: Color,
    #[cfg_attr(feature = "serde", serde(default))]
    pub halo_color: Option<Color>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub halo_width: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub offset: (f64, f64),
}

impl TextSettings {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            font: "12px sans-serif".to_owned(),
            color: Color::BLACK,
            halo_color: None,
            halo_width: 0.0,
            offset: (0.0, 0.0),
        }
    }

    /// Substitute `{FIELD}` placeholders. Unknown fields and nulls render empty.
    pub fn render<F: Feature + ?Sized>(&self, feature: &F) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                return out;
            };
            let name = &after[..close];
            if let Some(value) = lookup_field(feature, name).filter(|v| !v.is_null()) {
                out.push_str(&value.to_string());
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

/// A rendered label.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedText {
    pub content: String,
    pub settings: TextSettings,
}

/// Geometry-agnostic drawing parameters handed to the renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedStyle {
    /// Label of the rule that produced this style.
    pub label: String,
    pub fill_color: Option<Color>,
    pub fill_style: FillStyle,
    pub stroke_color: Option<Color>,
    pub stroke_width: f64,
    pub line_dash: Vec<f64>,
    pub point_radius: Option<f64>,
    pub point_shape: Option<PointShape>,
    /// Radians.
    pub rotation: f64,
    pub offset: (f64, f64),
    pub icon: Option<IconImage>,
    pub text: Option<ResolvedText>,
}

impl ResolvedStyle {
    pub(crate) fn from_settings(settings: &StyleSettings, label: &str) -> Self {
        let mut resolved = ResolvedStyle {
            label: label.to_owned(),
            ..ResolvedStyle::default()
        };
        let stroke = match settings {
            StyleSettings::Point(point) => {
                resolved.fill_color = Some(point.color);
                resolved.point_radius = Some(point.size / 2.0);
                resolved.point_shape = Some(point.shape);
                resolved.rotation = point.rotation;
                resolved.offset = point.offset;
                resolved.icon = point.icon.clone();
                &point.stroke
            }
            StyleSettings::Line(line) => &line.stroke,
            StyleSettings::Polygon(polygon) => {
                resolved.fill_color = Some(polygon.fill_color);
                resolved.fill_style = polygon.fill_style;
                &polygon.stroke
            }
        };
        if stroke.line_style != LineStyle::Null {
            resolved.stroke_color = Some(stroke.color);
            resolved.stroke_width = stroke.width;
            resolved.line_dash = stroke.line_style.dash_pattern(stroke.width);
        }
        resolved
    }
}
