mod color;
mod feature;
mod field_meta;
mod lookup;
mod rule;
mod rule_table;
mod style;
mod style_context;
mod value;
mod visual_variable;

pub use color::{Color, ColorParseError};
pub use feature::{lookup_field, Feature, FeatureRecord, GeometryKind};
pub use field_meta::{field_type_of, FieldMeta, FieldType};
pub use lookup::{
    resolve_field, AliasLookup, CodedValue, CodedValueDomain, DomainsLookup, FieldLookups,
};
pub use rule::{BreakConditions, ClassBreakRule, LowerBound, UniqueValueRule, UpperBound};
pub use rule_table::{ClassBreakTable, RuleTable, SelectedRule, SimpleStyle, UniqueValueTable};
pub use style::{
    FillStyle, IconImage, LineSettings, LineStyle, PointSettings, PointShape, PolygonSettings,
    ResolvedStyle, ResolvedText, StyleSettings, Stroke, TextSettings,
};
pub use style_context::StyleContext;
pub use value::{CompareOp, Value};
pub use visual_variable::{
    ColorStop, OpacityStop, RotationType, SizeMapping, SizeStop, ValueSource, VisualVariable,
    VisualVariableKind,
};
