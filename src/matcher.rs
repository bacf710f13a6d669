//! Rule selection for unique-value and class-break tables.
//!
//! Both matchers see only the non-default rules; default fallback lives in
//! [`RuleTable::select`](crate::RuleTable::select).

use tracing::warn;

use crate::error::FieldResolutionWarning;
use crate::{resolve_field, AliasLookup, ClassBreakRule, DomainsLookup, Feature, UniqueValueRule, Value};

fn resolve_or_warn<'f, F: Feature + ?Sized>(
    feature: &'f F,
    field: &str,
    aliases: &AliasLookup,
) -> Option<&'f Value> {
    let value = resolve_field(feature, field, aliases);
    if value.is_none() {
        let warning = FieldResolutionWarning {
            field: field.to_owned(),
        };
        warn!(field, "{warning}");
    }
    value
}

/// Direct equality first, then the feature value decoded through the
/// field's coded-value domain.
fn value_matches(actual: &Value, expected: &Value, field: &str, domains: &DomainsLookup) -> bool {
    if actual.loose_eq(expected) {
        return true;
    }
    domains
        .get(field)
        .and_then(|domain| domain.label_for(actual))
        .is_some_and(|label| match expected {
            Value::String(s) => s == label,
            other => Value::from(label).loose_eq(other),
        })
}

/// First rule whose values match the feature on every field of the composite
/// key.
///
/// A field missing from the feature (directly, case-insensitively and
/// through `aliases`) logs a [`FieldResolutionWarning`] and matches nothing.
pub fn match_unique<'r, F: Feature + ?Sized>(
    fields: &[String],
    rules: &'r [UniqueValueRule],
    feature: &F,
    aliases: &AliasLookup,
    domains: &DomainsLookup,
) -> Option<&'r UniqueValueRule> {
    let actual: Vec<&Value> = fields
        .iter()
        .map(|field| resolve_or_warn(feature, field, aliases))
        .collect::<Option<_>>()?;
    rules.iter().find(|rule| {
        rule.values.len() >= fields.len()
            && fields
                .iter()
                .zip(&actual)
                .zip(&rule.values)
                .all(|((field, actual), expected)| value_matches(actual, expected, field, domains))
    })
}

/// First rule whose range contains the feature's numeric value.
///
/// Each rule uses its own boundary conditions, or the legacy defaults for its
/// position when none are set. Non-numeric values match nothing.
pub fn match_class_break<'r, F: Feature + ?Sized>(
    field: &str,
    rules: &'r [ClassBreakRule],
    feature: &F,
    aliases: &AliasLookup,
) -> Option<&'r ClassBreakRule> {
    let value = resolve_or_warn(feature, field, aliases)?.as_number()?;
    if value.is_nan() {
        return None;
    }
    rules
        .iter()
        .enumerate()
        .find(|(index, rule)| rule.effective_conditions(*index).contains(value, rule.min, rule.max))
        .map(|(_, rule)| rule)
}
