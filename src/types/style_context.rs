use super::color::Color;
use super::feature::GeometryKind;
use super::rule_table::{RuleTable, SimpleStyle};
use super::style::{StyleSettings, Stroke};

const DEFAULT_PALETTE: [Color; 8] = [
    Color::rgb(0, 114, 178),
    Color::rgb(230, 159, 0),
    Color::rgb(0, 158, 115),
    Color::rgb(204, 121, 167),
    Color::rgb(86, 180, 233),
    Color::rgb(213, 94, 0),
    Color::rgb(240, 228, 66),
    Color::rgb(90, 90, 90),
];

/// Caller-owned state for generating default styles.
///
/// Each generated style takes the next palette color, so layers created in
/// sequence get distinct colors. Keep one per map.
#[derive(Debug, Clone, Default)]
pub struct StyleContext {
    next_color_index: usize,
}

impl StyleContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next palette color.
    pub fn next_color(&mut self) -> Color {
        let color = DEFAULT_PALETTE[self.next_color_index % DEFAULT_PALETTE.len()];
        self.next_color_index += 1;
        color
    }

    /// Default settings for a geometry family. Unknown geometries get point
    /// settings.
    pub fn default_settings(&mut self, geometry: GeometryKind) -> StyleSettings {
        let color = self.next_color();
        match geometry {
            GeometryKind::Line => StyleSettings::line(color, 1.0),
            GeometryKind::Polygon => {
                StyleSettings::polygon(color.with_alpha(0.5), Stroke::new(color, 1.0))
            }
            GeometryKind::Point | GeometryKind::Unknown => StyleSettings::point(color, 8.0),
        }
    }

    /// A simple table using [`default_settings`](Self::default_settings).
    pub fn default_table(&mut self, geometry: GeometryKind) -> RuleTable {
        RuleTable::Simple(SimpleStyle::new(self.default_settings(geometry)))
    }
}
