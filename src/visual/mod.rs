//! Continuous visual variables: color, size, rotation and opacity driven by
//! feature data.

mod expression;

pub use expression::{evaluate_expression, ExpressionError, ValueExpression};

use std::f64::consts::PI;

use tracing::warn;

use crate::{
    Color, ColorStop, Feature, OpacityStop, RotationType, SizeMapping, SizeStop, StyleSettings,
    ValueSource, VisualVariable, VisualVariableKind,
};

/// Apply visual variables to a copy of `base`.
///
/// A variable whose driving value cannot be computed is skipped with a
/// warning; the others still apply. `base` is never modified.
#[must_use]
pub fn apply<F: Feature + ?Sized>(
    base: &StyleSettings,
    feature: &F,
    variables: &[VisualVariable],
) -> StyleSettings {
    let mut style = base.clone();
    for variable in variables {
        if let Err(err) = apply_one(&mut style, feature, variable) {
            warn!(variable = kind_name(&variable.kind), error = %err, "visual variable skipped");
        }
    }
    style
}

/// Parse every value expression so a broken one is caught at configuration
/// time.
///
/// # Errors
///
/// Returns the first [`ExpressionError`] found.
pub fn validate(variables: &[VisualVariable]) -> Result<(), ExpressionError> {
    for variable in variables {
        if let ValueSource::ValueExpression(source) = &variable.source {
            ValueExpression::parse(source)?;
        }
    }
    Ok(())
}

fn kind_name(kind: &VisualVariableKind) -> &'static str {
    match kind {
        VisualVariableKind::Color(_) => "color",
        VisualVariableKind::Size(_) => "size",
        VisualVariableKind::Rotation(_) => "rotation",
        VisualVariableKind::Opacity(_) => "opacity",
    }
}

/// The numeric value driving `variable` for this feature, normalized when a
/// normalization field is set.
///
/// # Errors
///
/// Returns [`ExpressionError`] for a bad expression, a missing or
/// non-numeric field, or a zero normalization value.
pub fn driving_value<F: Feature + ?Sized>(
    variable: &VisualVariable,
    feature: &F,
) -> Result<f64, ExpressionError> {
    let value = match &variable.source {
        ValueSource::Field(field) => expression::field_number(feature, field)?,
        ValueSource::ValueExpression(source) => evaluate_expression(source, feature)?,
    };
    match &variable.normalization_field {
        None => Ok(value),
        Some(field) => {
            let divisor = expression::field_number(feature, field)?;
            if divisor == 0.0 {
                Err(ExpressionError::DivisionByZero)
            } else {
                Ok(value / divisor)
            }
        }
    }
}

fn apply_one<F: Feature + ?Sized>(
    style: &mut StyleSettings,
    feature: &F,
    variable: &VisualVariable,
) -> Result<(), ExpressionError> {
    let value = driving_value(variable, feature)?;
    match &variable.kind {
        VisualVariableKind::Color(stops) => {
            if let Some(color) = interpolate_color(stops, value) {
                set_color(style, color);
            }
        }
        VisualVariableKind::Size(mapping) => {
            if let Some(size) = size_for(mapping, value) {
                set_size(style, size);
            }
        }
        VisualVariableKind::Rotation(rotation_type) => {
            if let StyleSettings::Point(point) = style {
                point.rotation = rotation_radians(*rotation_type, value);
            }
        }
        VisualVariableKind::Opacity(stops) => {
            if let Some(opacity) = interpolate_opacity(stops, value) {
                set_opacity(style, opacity);
            }
        }
    }
    Ok(())
}

// -- Interpolation -----------------------------------------------------------

/// Piecewise-linear lookup over `(value, output)` stops. Stops are sorted
/// first; values outside the range clamp to the edge stop. Fewer than two
/// stops, or a NaN value, yields `None`.
fn interpolate<T: Copy>(
    stops: impl IntoIterator<Item = (f64, T)>,
    value: f64,
    lerp: impl Fn(T, T, f64) -> T,
) -> Option<T> {
    let mut stops: Vec<(f64, T)> = stops.into_iter().collect();
    if stops.len() < 2 || value.is_nan() {
        return None;
    }
    stops.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (first, last) = (stops[0], stops[stops.len() - 1]);
    if value <= first.0 {
        return Some(first.1);
    }
    if value >= last.0 {
        return Some(last.1);
    }
    stops.windows(2).find_map(|pair| {
        let ((lo, from), (hi, to)) = (pair[0], pair[1]);
        if value < lo || value > hi {
            return None;
        }
        let span = hi - lo;
        let t = if span == 0.0 { 0.0 } else { (value - lo) / span };
        Some(lerp(from, to, t))
    })
}

fn lerp_f64(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Color at `value`, each RGBA channel interpolated independently.
#[must_use]
pub fn interpolate_color(stops: &[ColorStop], value: f64) -> Option<Color> {
    interpolate(stops.iter().map(|s| (s.value, s.color)), value, Color::lerp)
}

/// Opacity at `value`, clamped to 0–1.
#[must_use]
pub fn interpolate_opacity(stops: &[OpacityStop], value: f64) -> Option<f64> {
    interpolate(stops.iter().map(|s| (s.value, s.opacity)), value, lerp_f64)
        .map(|o| o.clamp(0.0, 1.0))
}

fn interpolate_size(stops: &[SizeStop], value: f64) -> Option<f64> {
    interpolate(stops.iter().map(|s| (s.value, s.size)), value, lerp_f64)
}

/// Size at `value` for either mapping. A range maps linearly and clamps
/// outside `[min_data_value, max_data_value]`.
#[must_use]
pub fn size_for(mapping: &SizeMapping, value: f64) -> Option<f64> {
    match mapping {
        SizeMapping::Range {
            min_data_value,
            max_data_value,
            min_size,
            max_size,
        } => {
            if value.is_nan() {
                return None;
            }
            let span = max_data_value - min_data_value;
            let t = if span == 0.0 {
                0.0
            } else {
                ((value - min_data_value) / span).clamp(0.0, 1.0)
            };
            Some(lerp_f64(*min_size, *max_size, t))
        }
        SizeMapping::Stops(stops) => interpolate_size(stops, value),
    }
}

/// Radians for a rotation value in degrees.
#[must_use]
pub fn rotation_radians(rotation_type: RotationType, degrees: f64) -> f64 {
    match rotation_type {
        RotationType::Arithmetic => degrees * PI / 180.0,
        RotationType::Geographic => (90.0 - degrees) * PI / 180.0,
    }
}

// -- Style updates -----------------------------------------------------------

fn set_color(style: &mut StyleSettings, color: Color) {
    match style {
        StyleSettings::Point(point) => point.color = color,
        StyleSettings::Line(line) => line.stroke.color = color,
        StyleSettings::Polygon(polygon) => polygon.fill_color = color,
    }
}

fn set_size(style: &mut StyleSettings, size: f64) {
    match style {
        StyleSettings::Point(point) => point.size = size,
        StyleSettings::Line(line) => line.stroke.width = size,
        StyleSettings::Polygon(polygon) => polygon.stroke.width = size,
    }
}

fn set_opacity(style: &mut StyleSettings, opacity: f64) {
    match style {
        StyleSettings::Point(point) => {
            point.color = point.color.with_alpha(opacity);
            point.stroke.color = point.stroke.color.with_alpha(opacity);
            if let Some(icon) = &mut point.icon {
                icon.opacity = opacity;
            }
        }
        StyleSettings::Line(line) => {
            line.stroke.color = line.stroke.color.with_alpha(opacity);
        }
        StyleSettings::Polygon(polygon) => {
            polygon.fill_color = polygon.fill_color.with_alpha(opacity);
            polygon.stroke.color = polygon.stroke.color.with_alpha(opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::{FeatureRecord, Stroke};

    fn gray_ramp() -> Vec<ColorStop> {
        vec![
            ColorStop {
                value: 10.0,
                color: Color::WHITE,
            },
            ColorStop {
                value: 0.0,
                color: Color::BLACK,
            },
        ]
    }

    #[test]
    fn color_midpoint_rounds() {
        let color = interpolate_color(&gray_ramp(), 5.0).unwrap();
        assert_eq!(color.to_string(), "rgba(128,128,128,1)");
    }

    #[test]
    fn color_clamps_outside_stops() {
        assert_eq!(interpolate_color(&gray_ramp(), -5.0), Some(Color::BLACK));
        assert_eq!(interpolate_color(&gray_ramp(), 50.0), Some(Color::WHITE));
    }

    #[test]
    fn single_stop_has_no_effect() {
        let stops = vec![ColorStop {
            value: 0.0,
            color: Color::WHITE,
        }];
        assert_eq!(interpolate_color(&stops, 0.0), None);
    }

    #[test]
    fn size_range_maps_linearly_and_clamps() {
        let mapping = SizeMapping::Range {
            min_data_value: 0.0,
            max_data_value: 100.0,
            min_size: 4.0,
            max_size: 24.0,
        };
        assert_eq!(size_for(&mapping, 50.0), Some(14.0));
        assert_eq!(size_for(&mapping, -10.0), Some(4.0));
        assert_eq!(size_for(&mapping, 1000.0), Some(24.0));
    }

    #[test]
    fn size_stops_interpolate() {
        let mapping = SizeMapping::Stops(vec![
            SizeStop {
                value: 0.0,
                size: 2.0,
            },
            SizeStop {
                value: 10.0,
                size: 4.0,
            },
            SizeStop {
                value: 20.0,
                size: 12.0,
            },
        ]);
        assert_eq!(size_for(&mapping, 15.0), Some(8.0));
        assert_eq!(size_for(&mapping, 5.0), Some(3.0));
    }

    #[test]
    fn rotation_conventions() {
        assert!((rotation_radians(RotationType::Arithmetic, 90.0) - PI / 2.0).abs() < 1e-12);
        assert!(rotation_radians(RotationType::Geographic, 90.0).abs() < 1e-12);
        assert!((rotation_radians(RotationType::Geographic, 0.0) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn opacity_is_clamped() {
        let stops = vec![
            OpacityStop {
                value: 0.0,
                opacity: -1.0,
            },
            OpacityStop {
                value: 10.0,
                opacity: 3.0,
            },
        ];
        assert_eq!(interpolate_opacity(&stops, 0.0), Some(0.0));
        assert_eq!(interpolate_opacity(&stops, 10.0), Some(1.0));
    }

    #[test]
    fn apply_leaves_base_untouched() {
        let base = StyleSettings::point(Color::rgb(1, 2, 3), 6.0);
        let f = FeatureRecord::new().set("V", 5_i64);
        let styled = apply(&base, &f, &[VisualVariable::color("V", gray_ramp())]);
        assert_eq!(base, StyleSettings::point(Color::rgb(1, 2, 3), 6.0));
        match styled {
            StyleSettings::Point(point) => assert_eq!(point.color, Color::rgb(128, 128, 128)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn opacity_applies_to_fill_and_stroke() {
        let base = StyleSettings::polygon(Color::rgb(10, 20, 30), Stroke::new(Color::BLACK, 1.0));
        let f = FeatureRecord::new().set("V", 5_i64);
        let variable = VisualVariable::opacity(
            "V",
            vec![
                OpacityStop {
                    value: 0.0,
                    opacity: 0.0,
                },
                OpacityStop {
                    value: 10.0,
                    opacity: 1.0,
                },
            ],
        );
        match apply(&base, &f, &[variable]) {
            StyleSettings::Polygon(polygon) => {
                assert!((polygon.fill_color.a - 0.5).abs() < 1e-12);
                assert!((polygon.stroke.color.a - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn normalization_divides() {
        let f = FeatureRecord::new().set("POP", 500_i64).set("AREA", 50_i64);
        let variable = VisualVariable::size_range("POP", (0.0, 100.0), (0.0, 100.0))
            .normalized_by("AREA");
        assert_eq!(driving_value(&variable, &f), Ok(10.0));
    }

    #[test]
    fn expression_source() {
        let f = FeatureRecord::new().set("A", 3_i64).set("B", 4_i64);
        let variable = VisualVariable::rotation("A", RotationType::Arithmetic)
            .with_expression("$feature.A * $feature.B");
        assert_eq!(driving_value(&variable, &f), Ok(12.0));
    }

    #[traced_test]
    #[test]
    fn failing_variable_is_skipped_with_warning() {
        let base = StyleSettings::point(Color::BLACK, 6.0);
        let f = FeatureRecord::new().set("V", 5_i64).set("ZERO", 0_i64);
        let variables = [
            VisualVariable::size_range("V", (0.0, 10.0), (0.0, 20.0)).normalized_by("ZERO"),
            VisualVariable::rotation("V", RotationType::Arithmetic).with_expression("eval(1)"),
            VisualVariable::color("V", gray_ramp()),
        ];
        match apply(&base, &f, &variables) {
            StyleSettings::Point(point) => {
                assert_eq!(point.size, 6.0);
                assert_eq!(point.rotation, 0.0);
                assert_eq!(point.color, Color::rgb(128, 128, 128));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(logs_contain("visual variable skipped"));
        assert!(logs_contain("division by zero"));
        assert!(logs_contain("forbidden character"));
    }

    #[test]
    fn validate_reports_bad_expression() {
        let variables = [VisualVariable::rotation("V", RotationType::Geographic)
            .with_expression("$feature.V; drop")];
        assert!(matches!(
            validate(&variables),
            Err(ExpressionError::ForbiddenCharacter { found: ';', .. })
        ));
    }
}
