use super::Color;

/// Where a visual variable reads its driving value from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ValueSource {
    Field(String),
    /// Arithmetic over `$feature["FIELD"]` references.
    ValueExpression(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorStop {
    pub value: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeStop {
    pub value: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpacityStop {
    pub value: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SizeMapping {
    #[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
    Range {
        min_data_value: f64,
        max_data_value: f64,
        min_size: f64,
        max_size: f64,
    },
    Stops(Vec<SizeStop>),
}

/// Angle convention of a rotation variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum RotationType {
    /// Counter-clockwise from east.
    Arithmetic,
    /// Clockwise from north.
    #[default]
    Geographic,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum VisualVariableKind {
    Color(Vec<ColorStop>),
    Size(SizeMapping),
    Rotation(RotationType),
    Opacity(Vec<OpacityStop>),
}

/// A continuous mapping from a data value to one style property.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct VisualVariable {
    pub kind: VisualVariableKind,
    pub source: ValueSource,
    #[cfg_attr(feature = "serde", serde(default))]
    pub normalization_field: Option<String>,
}

impl VisualVariable {
    #[must_use]
    pub fn new(kind: VisualVariableKind, source: ValueSource) -> Self {
        Self {
            kind,
            source,
            normalization_field: None,
        }
    }

    #[must_use]
    pub fn color(field: &str, stops: Vec<ColorStop>) -> Self {
        Self::new(VisualVariableKind::Color(stops), field_source(field))
    }

    #[must_use]
    pub fn size_range(
        field: &str,
        (min_data_value, max_data_value): (f64, f64),
        (min_size, max_size): (f64, f64),
    ) -> Self {
        Self::new(
            VisualVariableKind::Size(SizeMapping::Range {
                min_data_value,
                max_data_value,
                min_size,
                max_size,
            }),
            field_source(field),
        )
    }

    #[must_use]
    pub fn size_stops(field: &str, stops: Vec<SizeStop>) -> Self {
        Self::new(
            VisualVariableKind::Size(SizeMapping::Stops(stops)),
            field_source(field),
        )
    }

    #[must_use]
    pub fn rotation(field: &str, rotation_type: RotationType) -> Self {
        Self::new(VisualVariableKind::Rotation(rotation_type), field_source(field))
    }

    #[must_use]
    pub fn opacity(field: &str, stops: Vec<OpacityStop>) -> Self {
        Self::new(VisualVariableKind::Opacity(stops), field_source(field))
    }

    /// Drive this variable from a value expression instead of a field.
    #[must_use]
    pub fn with_expression(mut self, expression: &str) -> Self {
        self.source = ValueSource::ValueExpression(expression.to_owned());
        self
    }

    /// Divide the driving value by another field's value.
    #[must_use]
    pub fn normalized_by(mut self, field: &str) -> Self {
        self.normalization_field = Some(field.to_owned());
        self
    }
}

fn field_source(field: &str) -> ValueSource {
    ValueSource::Field(field.to_owned())
}
