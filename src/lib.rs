mod error;
pub mod filter;
mod layer;
pub mod matcher;
pub mod synthesize;
mod types;
pub mod visual;

pub use error::{FieldResolutionWarning, StyleError};
pub use filter::{Filter, FilterSyntaxError};
pub use layer::{
    evaluate_visibility, resolve_style, synthesize_filter, LayerStyle, LayerStyleBuilder,
    ResolveOptions,
};
pub use types::{
    field_type_of, lookup_field, resolve_field, AliasLookup, BreakConditions, ClassBreakRule,
    ClassBreakTable, CodedValue, CodedValueDomain, Color, ColorParseError, ColorStop, CompareOp,
    DomainsLookup, Feature, FeatureRecord, FieldLookups, FieldMeta, FieldType, FillStyle,
    GeometryKind, IconImage, LineSettings, LineStyle, LowerBound, OpacityStop, PointSettings,
    PointShape, PolygonSettings, ResolvedStyle, ResolvedText, RotationType, RuleTable,
    SelectedRule, SimpleStyle, SizeMapping, SizeStop, StyleContext, StyleSettings, Stroke,
    TextSettings, UniqueValueRule, UniqueValueTable, UpperBound, Value, ValueSource,
    VisualVariable, VisualVariableKind,
};
pub use visual::ExpressionError;
