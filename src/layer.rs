use tracing::debug;

use crate::error::StyleError;
use crate::filter::{Filter, FilterSyntaxError};
use crate::synthesize::synthesize;
use crate::visual;
use crate::{
    AliasLookup, Color, ColorStop, DomainsLookup, Feature, FieldLookups, FieldMeta, GeometryKind,
    ResolvedStyle, ResolvedText, RuleTable, StyleContext, VisualVariable,
};

/// Per-call inputs for [`resolve_style`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions<'a> {
    pub lookups: Option<&'a FieldLookups>,
    pub visual_variables: &'a [VisualVariable],
    /// Resolve features whose rule is hidden (legend previews).
    pub ignore_rule_visibility: bool,
}

/// Select the feature's rule and turn it into drawing parameters.
///
/// Returns `None` when no rule applies, or when the selected rule is hidden
/// and `ignore_rule_visibility` is off.
#[must_use]
pub fn resolve_style<F: Feature + ?Sized>(
    table: &RuleTable,
    feature: &F,
    options: &ResolveOptions<'_>,
) -> Option<ResolvedStyle> {
    let no_lookups = FieldLookups::default();
    let selected = table.select(feature, options.lookups.unwrap_or(&no_lookups))?;
    if !selected.visible && !options.ignore_rule_visibility {
        return None;
    }
    let settings = visual::apply(selected.settings, feature, options.visual_variables);
    let mut resolved = ResolvedStyle::from_settings(&settings, selected.label);
    resolved.text = selected.text.map(|text| ResolvedText {
        content: text.render(feature),
        settings: text.clone(),
    });
    Some(resolved)
}

/// Parse `filter` and evaluate it against one feature. `None` is SQL null;
/// the caller decides whether that shows the feature.
///
/// # Errors
///
/// Returns [`FilterSyntaxError`] for a filter that does not parse or does not
/// fit the feature's values.
pub fn evaluate_visibility<F: Feature + ?Sized>(
    filter: &str,
    feature: &F,
) -> Result<Option<bool>, FilterSyntaxError> {
    Filter::parse(filter)?.evaluate(feature)
}

/// Filter string selecting the features drawn by visible rules.
#[must_use]
pub fn synthesize_filter(table: &RuleTable, out_fields: &[FieldMeta]) -> String {
    synthesize(table, out_fields)
}

/// Builder for a [`LayerStyle`].
///
/// # Example
///
/// ```
/// use stylefilter::{
///     Color, FeatureRecord, LayerStyleBuilder, RuleTable, StyleSettings, UniqueValueRule,
///     UniqueValueTable,
/// };
///
/// let table = RuleTable::UniqueValue(UniqueValueTable {
///     fields: vec!["TYPE".into()],
///     has_default: true,
///     rules: vec![
///         UniqueValueRule::new(vec!["A".into()], StyleSettings::point(Color::BLACK, 6.0)),
///         UniqueValueRule::new(vec!["B".into()], StyleSettings::point(Color::WHITE, 6.0))
///             .visible(false),
///         UniqueValueRule::default_rule(StyleSettings::point(Color::BLACK, 4.0)),
///     ],
/// });
/// let layer = LayerStyleBuilder::new()
///     .table(table)
///     .filter("POP > 1000")
///     .build()
///     .unwrap();
///
/// let feature = FeatureRecord::new().set("TYPE", "A").set("POP", 5000_i64);
/// assert!(layer.resolve_style(&feature).unwrap().is_some());
/// assert_eq!(layer.synthesize_filter(), "NOT (TYPE in ('B'))");
/// ```
#[derive(Debug, Default)]
pub struct LayerStyleBuilder {
    table: Option<RuleTable>,
    filter: Option<String>,
    visual_variables: Vec<VisualVariable>,
    lookups: FieldLookups,
    out_fields: Vec<FieldMeta>,
    include_undetermined: bool,
    error: Option<StyleError>,
}

impl LayerStyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table(mut self, table: RuleTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Use a generated simple table, advancing the context's palette.
    #[must_use]
    pub fn default_table(self, ctx: &mut StyleContext, geometry: GeometryKind) -> Self {
        self.table(ctx.default_table(geometry))
    }

    /// Definition filter. A blank string means no filter.
    #[must_use]
    pub fn filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_owned());
        self
    }

    #[must_use]
    pub fn visual_variable(mut self, variable: VisualVariable) -> Self {
        self.visual_variables.push(variable);
        self
    }

    /// Color variable from `(value, color)` pairs written as CSS-style
    /// strings. An unparsable color fails [`build`](Self::build).
    #[must_use]
    pub fn color_ramp(mut self, field: &str, stops: &[(f64, &str)]) -> Self {
        let parsed: Result<Vec<ColorStop>, _> = stops
            .iter()
            .map(|(value, color)| {
                Color::parse(color).map(|color| ColorStop {
                    value: *value,
                    color,
                })
            })
            .collect();
        match parsed {
            Ok(stops) => self.visual_variable(VisualVariable::color(field, stops)),
            Err(err) => {
                self.error.get_or_insert(StyleError::from(err));
                self
            }
        }
    }

    #[must_use]
    pub fn aliases(mut self, aliases: AliasLookup) -> Self {
        self.lookups.aliases = aliases;
        self
    }

    #[must_use]
    pub fn domains(mut self, domains: DomainsLookup) -> Self {
        self.lookups.domains = domains;
        self
    }

    /// Field metadata used to format synthesized filter values.
    #[must_use]
    pub fn out_fields(mut self, fields: Vec<FieldMeta>) -> Self {
        self.out_fields = fields;
        self
    }

    /// Whether a filter that evaluates to SQL null shows the feature.
    /// Off by default.
    #[must_use]
    pub fn include_undetermined(mut self, include: bool) -> Self {
        self.include_undetermined = include;
        self
    }

    /// Validate the configuration into an immutable [`LayerStyle`].
    ///
    /// # Errors
    ///
    /// Returns [`StyleError`] for a missing table, a bad filter, a bad value
    /// expression, or an unparsable ramp color.
    pub fn build(self) -> Result<LayerStyle, StyleError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let table = self.table.ok_or(StyleError::MissingRuleTable)?;
        let filter = match self.filter.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(Filter::parse(raw)?),
            _ => None,
        };
        visual::validate(&self.visual_variables)?;
        debug!(
            rules = table.rule_count(),
            filter = filter.as_ref().map(Filter::source),
            visual_variables = self.visual_variables.len(),
            "built layer style"
        );
        Ok(LayerStyle {
            table,
            filter,
            visual_variables: self.visual_variables,
            lookups: self.lookups,
            out_fields: self.out_fields,
            include_undetermined: self.include_undetermined,
        })
    }
}

/// A validated layer style: rule table, optional definition filter and visual
/// variables. Immutable during evaluation and safe to share behind `Arc`.
#[derive(Debug, Clone)]
pub struct LayerStyle {
    table: RuleTable,
    filter: Option<Filter>,
    visual_variables: Vec<VisualVariable>,
    lookups: FieldLookups,
    out_fields: Vec<FieldMeta>,
    include_undetermined: bool,
}

impl LayerStyle {
    /// Raw tri-state result of the definition filter; `Some(true)` without one.
    ///
    /// # Errors
    ///
    /// Returns [`FilterSyntaxError`] when the feature's values do not fit the
    /// filter's operators.
    pub fn evaluate_visibility<F: Feature + ?Sized>(
        &self,
        feature: &F,
    ) -> Result<Option<bool>, FilterSyntaxError> {
        match &self.filter {
            Some(filter) => filter.evaluate(feature),
            None => Ok(Some(true)),
        }
    }

    /// Visibility with SQL null resolved by
    /// [`include_undetermined`](LayerStyleBuilder::include_undetermined).
    ///
    /// # Errors
    ///
    /// See [`evaluate_visibility`](Self::evaluate_visibility).
    pub fn is_visible<F: Feature + ?Sized>(&self, feature: &F) -> Result<bool, FilterSyntaxError> {
        Ok(self
            .evaluate_visibility(feature)?
            .unwrap_or(self.include_undetermined))
    }

    /// Full per-feature pipeline: filter, rule selection, visual variables.
    /// `Ok(None)` means the feature is not drawn.
    ///
    /// # Errors
    ///
    /// See [`evaluate_visibility`](Self::evaluate_visibility).
    pub fn resolve_style<F: Feature + ?Sized>(
        &self,
        feature: &F,
    ) -> Result<Option<ResolvedStyle>, FilterSyntaxError> {
        if !self.is_visible(feature)? {
            return Ok(None);
        }
        let options = ResolveOptions {
            lookups: Some(&self.lookups),
            visual_variables: &self.visual_variables,
            ignore_rule_visibility: false,
        };
        Ok(resolve_style(&self.table, feature, &options))
    }

    /// Filter selecting the features drawn by visible rules.
    #[must_use]
    pub fn synthesize_filter(&self) -> String {
        synthesize(&self.table, &self.out_fields)
    }

    /// The definition filter AND-ed with the synthesized rule filter.
    #[must_use]
    pub fn combined_filter(&self) -> String {
        let rules = self.synthesize_filter();
        match &self.filter {
            Some(filter) => format!("({}) and {rules}", filter.source()),
            None => rules,
        }
    }

    /// Toggle one rule's visibility. Returns `false` for an out-of-range index.
    pub fn set_rule_visible(&mut self, index: usize, visible: bool) -> bool {
        self.table.set_rule_visible(index, visible)
    }

    #[must_use]
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn lookups(&self) -> &FieldLookups {
        &self.lookups
    }

    #[must_use]
    pub fn visual_variables(&self) -> &[VisualVariable] {
        &self.visual_variables
    }
}
