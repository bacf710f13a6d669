use std::fmt;

use tracing::trace;

use super::feature::Feature;
use super::lookup::FieldLookups;
use super::rule::{ClassBreakRule, UniqueValueRule};
use super::style::{StyleSettings, TextSettings};

/// A single unconditional style.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimpleStyle {
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    #[cfg_attr(feature = "serde", serde(default = "visible_by_default"))]
    pub visible: bool,
    pub settings: StyleSettings,
    #[cfg_attr(feature = "serde", serde(default))]
    pub text: Option<TextSettings>,
}

impl SimpleStyle {
    #[must_use]
    pub fn new(settings: StyleSettings) -> Self {
        Self {
            label: String::new(),
            visible: true,
            settings,
            text: None,
        }
    }
}

/// Rules keyed by the composite value of `fields`.
///
/// When `has_default` is set the last rule is the catch-all and never takes
/// part in exact matching.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UniqueValueTable {
    pub fields: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_default: bool,
    pub rules: Vec<UniqueValueRule>,
}

/// Numeric ranges over a single field. Same default convention as
/// [`UniqueValueTable`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ClassBreakTable {
    pub field: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub has_default: bool,
    pub rules: Vec<ClassBreakRule>,
}

macro_rules! default_split {
    ($table:ty, $rule:ty) => {
        impl $table {
            /// Rules that take part in exact matching.
            #[must_use]
            pub fn matchable_rules(&self) -> &[$rule] {
                match self.default_rule() {
                    Some(_) => &self.rules[..self.rules.len() - 1],
                    None => &self.rules,
                }
            }

            /// The catch-all rule, if the table declares one.
            #[must_use]
            pub fn default_rule(&self) -> Option<&$rule> {
                if self.has_default {
                    self.rules.last()
                } else {
                    None
                }
            }

            /// Whether features that fall through to the default are drawn.
            #[must_use]
            pub fn default_visible(&self) -> bool {
                self.default_rule().is_some_and(|rule| rule.visible)
            }
        }
    };
}

default_split!(UniqueValueTable, UniqueValueRule);
default_split!(ClassBreakTable, ClassBreakRule);

/// A layer's rule-based style definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum RuleTable {
    Simple(SimpleStyle),
    UniqueValue(UniqueValueTable),
    ClassBreaks(ClassBreakTable),
}

/// The rule chosen for one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectedRule<'a> {
    /// Position of the rule in its table.
    pub index: usize,
    pub label: &'a str,
    pub visible: bool,
    pub settings: &'a StyleSettings,
    pub text: Option<&'a TextSettings>,
    /// Whether the feature fell through to the catch-all rule.
    pub is_default: bool,
}

impl<'a> SelectedRule<'a> {
    fn unique(index: usize, rule: &'a UniqueValueRule, is_default: bool) -> Self {
        Self {
            index,
            label: &rule.label,
            visible: rule.visible,
            settings: &rule.settings,
            text: rule.text.as_ref(),
            is_default,
        }
    }

    fn class_break(index: usize, rule: &'a ClassBreakRule, is_default: bool) -> Self {
        Self {
            index,
            label: &rule.label,
            visible: rule.visible,
            settings: &rule.settings,
            text: rule.text.as_ref(),
            is_default,
        }
    }
}

impl RuleTable {
    /// Pick the rule that applies to `feature`, falling back to the default
    /// rule when nothing matches. Visibility is reported, not enforced.
    pub fn select<F: Feature + ?Sized>(
        &self,
        feature: &F,
        lookups: &FieldLookups,
    ) -> Option<SelectedRule<'_>> {
        let selected = match self {
            RuleTable::Simple(simple) => Some(SelectedRule {
                index: 0,
                label: &simple.label,
                visible: simple.visible,
                settings: &simple.settings,
                text: simple.text.as_ref(),
                is_default: false,
            }),
            RuleTable::UniqueValue(table) => {
                let rules = table.matchable_rules();
                crate::matcher::match_unique(
                    &table.fields,
                    rules,
                    feature,
                    &lookups.aliases,
                    &lookups.domains,
                )
                .map(|rule| SelectedRule::unique(position_of(rules, rule), rule, false))
                .or_else(|| {
                    table
                        .default_rule()
                        .map(|rule| SelectedRule::unique(table.rules.len() - 1, rule, true))
                })
            }
            RuleTable::ClassBreaks(table) => {
                let rules = table.matchable_rules();
                crate::matcher::match_class_break(&table.field, rules, feature, &lookups.aliases)
                    .map(|rule| SelectedRule::class_break(position_of(rules, rule), rule, false))
                    .or_else(|| {
                        table.default_rule().map(|rule| {
                            SelectedRule::class_break(table.rules.len() - 1, rule, true)
                        })
                    })
            }
        };
        trace!(
            rule = selected.map(|s| s.label),
            is_default = selected.is_some_and(|s| s.is_default),
            "selected rule"
        );
        selected
    }

    /// Number of rules, the default included.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        match self {
            RuleTable::Simple(_) => 1,
            RuleTable::UniqueValue(table) => table.rules.len(),
            RuleTable::ClassBreaks(table) => table.rules.len(),
        }
    }

    /// Toggle a rule's visibility (a legend item). Returns `false` when the
    /// index is out of range.
    pub fn set_rule_visible(&mut self, index: usize, visible: bool) -> bool {
        let flag = match self {
            RuleTable::Simple(simple) => (index == 0).then_some(&mut simple.visible),
            RuleTable::UniqueValue(table) => table.rules.get_mut(index).map(|r| &mut r.visible),
            RuleTable::ClassBreaks(table) => table.rules.get_mut(index).map(|r| &mut r.visible),
        };
        match flag {
            Some(flag) => {
                *flag = visible;
                true
            }
            None => false,
        }
    }

    /// Visibility flag of every rule, in table order.
    #[must_use]
    pub fn visibility(&self) -> Vec<bool> {
        match self {
            RuleTable::Simple(simple) => vec![simple.visible],
            RuleTable::UniqueValue(table) => table.rules.iter().map(|r| r.visible).collect(),
            RuleTable::ClassBreaks(table) => table.rules.iter().map(|r| r.visible).collect(),
        }
    }
}

fn position_of<T>(rules: &[T], rule: &T) -> usize {
    rules
        .iter()
        .position(|candidate| std::ptr::eq(candidate, rule))
        .unwrap_or_default()
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTable::Simple(_) => write!(f, "Simple"),
            RuleTable::UniqueValue(table) => write!(
                f,
                "UniqueValue({}; {} rules, default: {})",
                table.fields.join(", "),
                table.rules.len(),
                table.has_default
            ),
            RuleTable::ClassBreaks(table) => write!(
                f,
                "ClassBreaks({}; {} rules, default: {})",
                table.field,
                table.rules.len(),
                table.has_default
            ),
        }
    }
}

#[cfg(feature = "serde")]
fn visible_by_default() -> bool {
    true
}
