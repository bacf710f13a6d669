//! Rule visibility back to a filter string for the data source.
//!
//! The produced filter selects exactly the features whose matched rule is
//! visible, for non-null values of the style fields.

use tracing::debug;

use crate::filter::format_date_millis;
use crate::{
    field_type_of, ClassBreakRule, ClassBreakTable, CompareOp, FieldMeta, FieldType, RuleTable,
    UniqueValueRule, UniqueValueTable, Value,
};

/// Filter that selects every feature.
pub const MATCH_ALL: &str = "(1=1)";
/// Filter that selects no feature.
pub const MATCH_NONE: &str = "(1=0)";

/// Build a filter that keeps only features drawn by a visible rule.
///
/// `out_fields` supplies field types for value formatting; fields without
/// metadata are typed from the rule values.
#[must_use]
pub fn synthesize(table: &RuleTable, out_fields: &[FieldMeta]) -> String {
    let filter = match table {
        RuleTable::Simple(simple) => constant(simple.visible).to_owned(),
        RuleTable::UniqueValue(t) => unique_values(t, out_fields),
        RuleTable::ClassBreaks(t) => class_breaks(t, out_fields),
    };
    debug!(%filter, "synthesized filter");
    filter
}

fn constant(matches_everything: bool) -> &'static str {
    if matches_everything {
        MATCH_ALL
    } else {
        MATCH_NONE
    }
}

/// With a visible default, exclude the hidden rules. Otherwise include the
/// visible ones.
fn invert_strategy(default_visible: bool, clauses: &[String]) -> String {
    match (default_visible, clauses.is_empty()) {
        (true, true) => MATCH_ALL.to_owned(),
        (false, true) => MATCH_NONE.to_owned(),
        (true, false) => format!("NOT ({})", clauses.join(" or ")),
        (false, false) => clauses.join(" or "),
    }
}

// -- Unique values -----------------------------------------------------------

fn unique_values(table: &UniqueValueTable, out_fields: &[FieldMeta]) -> String {
    let default_visible = table.default_visible();
    let selected: Vec<&UniqueValueRule> = reachable_rules(table)
        .into_iter()
        .filter(|rule| rule.visible != default_visible)
        .collect();

    let clauses = match table.fields.as_slice() {
        [field] => single_field_clauses(field, &selected, out_fields, default_visible),
        fields => selected
            .iter()
            .map(|rule| composite_clause(fields, rule, out_fields))
            .collect(),
    };
    invert_strategy(default_visible, &clauses)
}

/// Rules the matcher can select: a rule whose key an earlier rule already
/// matches is shadowed and dropped.
fn reachable_rules(table: &UniqueValueTable) -> Vec<&UniqueValueRule> {
    let arity = table.fields.len();
    let rules = table.matchable_rules();
    let same_key = |a: &UniqueValueRule, b: &UniqueValueRule| {
        a.values.len() >= arity
            && b.values.len() >= arity
            && a.values[..arity]
                .iter()
                .zip(&b.values[..arity])
                .all(|(x, y)| x.loose_eq(y))
    };
    rules
        .iter()
        .enumerate()
        .filter(|(i, rule)| !rules[..*i].iter().any(|earlier| same_key(earlier, *rule)))
        .map(|(_, rule)| rule)
        .collect()
}

fn single_field_clauses(
    field: &str,
    rules: &[&UniqueValueRule],
    out_fields: &[FieldMeta],
    default_visible: bool,
) -> Vec<String> {
    let name = field_sql(field);
    let mut values: Vec<&Value> = Vec::new();
    let mut has_null = false;
    for value in rules.iter().filter_map(|rule| rule.values.first()) {
        if value.is_null() {
            has_null = true;
        } else if !values.iter().any(|seen| *seen == value) {
            values.push(value);
        }
    }

    let mut clauses = Vec::new();
    match values.as_slice() {
        [] => {}
        [only] if !default_visible => {
            clauses.push(format!("{name} = {}", format_value(field, only, out_fields)));
        }
        many => {
            let list: Vec<String> = many
                .iter()
                .map(|v| format_value(field, v, out_fields))
                .collect();
            clauses.push(format!("{name} in ({})", list.join(", ")));
        }
    }
    if has_null {
        clauses.push(format!("{name} is null"));
    }
    clauses
}

fn composite_clause(fields: &[String], rule: &UniqueValueRule, out_fields: &[FieldMeta]) -> String {
    let parts: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let name = field_sql(field);
            match rule.values.get(i) {
                Some(value) if !value.is_null() => {
                    format!("{name} = {}", format_value(field, value, out_fields))
                }
                _ => format!("{name} is null"),
            }
        })
        .collect();
    format!("({})", parts.join(" and "))
}

// -- Class breaks ------------------------------------------------------------

fn class_breaks(table: &ClassBreakTable, out_fields: &[FieldMeta]) -> String {
    let default_visible = table.default_visible();
    let target = !default_visible;
    let rules = table.matchable_rules();
    let mut clauses = Vec::new();

    let mut i = 0;
    while i < rules.len() {
        if rules[i].visible != target {
            i += 1;
            continue;
        }
        let start = i;
        while i + 1 < rules.len()
            && rules[i + 1].visible == target
            && contiguous(&rules[i], i, &rules[i + 1], i + 1)
        {
            i += 1;
        }
        clauses.push(range_clause(table, rules, start, i, out_fields));
        i += 1;
    }
    invert_strategy(default_visible, &clauses)
}

/// Whether `a` and `b` leave no gap between them.
fn contiguous(a: &ClassBreakRule, a_index: usize, b: &ClassBreakRule, b_index: usize) -> bool {
    a.max == b.min
        && (a.effective_conditions(a_index).upper.is_inclusive()
            || b.effective_conditions(b_index).lower.is_inclusive())
}

fn range_clause(
    table: &ClassBreakTable,
    rules: &[ClassBreakRule],
    start: usize,
    end: usize,
    out_fields: &[FieldMeta],
) -> String {
    let first = &rules[start];
    let last = &rules[end];
    let mut lower = first.effective_conditions(start).lower.op();
    // A preceding rule with the other visibility claims a shared inclusive
    // boundary first.
    if let Some(prev_index) = start.checked_sub(1) {
        let prev = &rules[prev_index];
        if prev.max == first.min && prev.effective_conditions(prev_index).upper.is_inclusive() {
            lower = CompareOp::Gt;
        }
    }
    let upper = last.effective_conditions(end).upper.op();

    let name = field_sql(&table.field);
    let bound = |value: f64| format_value(&table.field, &Value::Number(value), out_fields);
    let mut parts = Vec::new();
    if first.min.is_finite() {
        parts.push(format!("{name} {lower} {}", bound(first.min)));
    }
    if last.max.is_finite() {
        parts.push(format!("{name} {upper} {}", bound(last.max)));
    }
    if parts.is_empty() {
        return MATCH_ALL.to_owned();
    }
    format!("({})", parts.join(" and "))
}

// -- Formatting --------------------------------------------------------------

const RESERVED: &[&str] = &[
    "and", "or", "not", "like", "in", "is", "null", "date", "upper", "lower",
];

/// Bare identifier when the lexer reads it back as one, double-quoted
/// otherwise.
fn field_sql(name: &str) -> String {
    let mut chars = name.chars();
    let bare = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !RESERVED.iter().any(|word| word.eq_ignore_ascii_case(name));
    if bare {
        name.to_owned()
    } else {
        format!("\"{name}\"")
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn number_sql(value: &Value) -> String {
    match value.as_number() {
        Some(n) if n.is_finite() => Value::Number(n).to_string(),
        _ => "0".to_owned(),
    }
}

/// SQL literal for `value` according to the type of `field`.
#[must_use]
pub fn format_value(field: &str, value: &Value, out_fields: &[FieldMeta]) -> String {
    let field_type = field_type_of(out_fields, field).unwrap_or_else(|| FieldType::infer(value));
    match field_type {
        FieldType::Date => {
            let text = match value {
                #[allow(clippy::cast_possible_truncation)]
                Value::Number(ms) if ms.is_finite() => {
                    format_date_millis(*ms as i64).unwrap_or_else(|| value.to_string())
                }
                other => other.to_string(),
            };
            format!("date {}", quote(&text))
        }
        FieldType::String => quote(&value.to_string()),
        FieldType::Number => number_sql(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, LowerBound, SimpleStyle, StyleSettings, UpperBound};

    fn settings() -> StyleSettings {
        StyleSettings::point(Color::BLACK, 4.0)
    }

    fn unique_table(entries: &[(&str, bool)], default: Option<bool>) -> RuleTable {
        let mut rules: Vec<UniqueValueRule> = entries
            .iter()
            .map(|(v, visible)| UniqueValueRule::new(vec![(*v).into()], settings()).visible(*visible))
            .collect();
        if let Some(visible) = default {
            rules.push(UniqueValueRule::default_rule(settings()).visible(visible));
        }
        RuleTable::UniqueValue(UniqueValueTable {
            fields: vec!["TYPE".into()],
            has_default: default.is_some(),
            rules,
        })
    }

    #[test]
    fn visible_default_excludes_hidden_values() {
        let table = unique_table(&[("A", true), ("B", false)], Some(true));
        assert_eq!(synthesize(&table, &[]), "NOT (TYPE in ('B'))");
    }

    #[test]
    fn hidden_default_includes_visible_values() {
        let table = unique_table(&[("A", true), ("B", false), ("C", true)], Some(false));
        assert_eq!(synthesize(&table, &[]), "TYPE in ('A', 'C')");
        let single = unique_table(&[("A", true), ("B", false)], None);
        assert_eq!(synthesize(&single, &[]), "TYPE = 'A'");
    }

    #[test]
    fn constant_filters() {
        assert_eq!(
            synthesize(&unique_table(&[("A", true)], Some(true)), &[]),
            MATCH_ALL
        );
        assert_eq!(
            synthesize(&unique_table(&[("A", false)], Some(false)), &[]),
            MATCH_NONE
        );
        assert_eq!(
            synthesize(&unique_table(&[("A", false)], None), &[]),
            MATCH_NONE
        );
        let mut simple = SimpleStyle::new(settings());
        assert_eq!(synthesize(&RuleTable::Simple(simple.clone()), &[]), MATCH_ALL);
        simple.visible = false;
        assert_eq!(synthesize(&RuleTable::Simple(simple), &[]), MATCH_NONE);
    }

    #[test]
    fn values_follow_field_types() {
        let fields = [FieldMeta::number("TYPE")];
        let table = unique_table(&[("1", true), ("2", true), ("x", true)], None);
        assert_eq!(synthesize(&table, &fields), "TYPE in (1, 2, 0)");
    }

    #[test]
    fn strings_are_escaped() {
        let table = unique_table(&[("O'Brien", true)], None);
        assert_eq!(synthesize(&table, &[]), "TYPE = 'O''Brien'");
    }

    #[test]
    fn dates_are_tagged() {
        assert_eq!(
            format_value("D", &Value::Number(1_577_923_200_000.0), &[FieldMeta::date("D")]),
            "date '2020-01-02 00:00:00'"
        );
        assert_eq!(
            format_value("D", &Value::from("2020-01-02"), &[FieldMeta::date("d")]),
            "date '2020-01-02'"
        );
    }

    #[test]
    fn null_rule_values() {
        let table = RuleTable::UniqueValue(UniqueValueTable {
            fields: vec!["TYPE".into()],
            has_default: false,
            rules: vec![
                UniqueValueRule::new(vec!["A".into()], settings()),
                UniqueValueRule::new(vec![Value::Null], settings()),
            ],
        });
        assert_eq!(synthesize(&table, &[]), "TYPE = 'A' or TYPE is null");
    }

    #[test]
    fn composite_keys() {
        let table = RuleTable::UniqueValue(UniqueValueTable {
            fields: vec!["TYPE".into(), "CODE".into()],
            has_default: true,
            rules: vec![
                UniqueValueRule::new(vec!["A".into(), 1_i64.into()], settings()).visible(false),
                UniqueValueRule::new(vec!["B".into(), 2_i64.into()], settings()).visible(false),
                UniqueValueRule::default_rule(settings()),
            ],
        });
        assert_eq!(
            synthesize(&table, &[]),
            "NOT ((TYPE = 'A' and CODE = 1) or (TYPE = 'B' and CODE = 2))"
        );
    }

    #[test]
    fn awkward_field_names_are_quoted() {
        assert_eq!(field_sql("Land Use"), "\"Land Use\"");
        assert_eq!(field_sql("date"), "\"date\"");
        assert_eq!(field_sql("POP_2020"), "POP_2020");
    }

    fn breaks(visible: &[bool], default: Option<bool>) -> RuleTable {
        let mut rules: Vec<ClassBreakRule> = visible
            .iter()
            .enumerate()
            .map(|(i, v)| {
                #[allow(clippy::cast_precision_loss)]
                let min = (i * 10) as f64;
                ClassBreakRule::new(min, min + 10.0, settings()).visible(*v)
            })
            .collect();
        if let Some(v) = default {
            rules.push(ClassBreakRule::default_rule(settings()).visible(v));
        }
        RuleTable::ClassBreaks(ClassBreakTable {
            field: "POP".into(),
            has_default: default.is_some(),
            rules,
        })
    }

    #[test]
    fn adjacent_visible_breaks_merge() {
        assert_eq!(
            synthesize(&breaks(&[true, true, false], Some(false)), &[]),
            "(POP >= 0 and POP <= 20)"
        );
    }

    #[test]
    fn separate_ranges_are_ored() {
        assert_eq!(
            synthesize(&breaks(&[true, false, true], None), &[]),
            "(POP >= 0 and POP <= 10) or (POP > 20 and POP <= 30)"
        );
    }

    #[test]
    fn visible_default_negates_hidden_ranges() {
        assert_eq!(
            synthesize(&breaks(&[true, false, true], Some(true)), &[]),
            "NOT ((POP > 10 and POP <= 20))"
        );
        assert_eq!(synthesize(&breaks(&[true, true], Some(true)), &[]), MATCH_ALL);
        assert_eq!(synthesize(&breaks(&[false, false], None), &[]), MATCH_NONE);
    }

    #[test]
    fn shared_inclusive_boundary_is_tightened() {
        let table = RuleTable::ClassBreaks(ClassBreakTable {
            field: "V".into(),
            has_default: false,
            rules: vec![
                ClassBreakRule::new(0.0, 10.0, settings())
                    .conditions(LowerBound::Gte, UpperBound::Lte)
                    .visible(false),
                ClassBreakRule::new(10.0, 20.0, settings())
                    .conditions(LowerBound::Gte, UpperBound::Lt),
            ],
        });
        assert_eq!(synthesize(&table, &[]), "(V > 10 and V < 20)");
    }

    #[test]
    fn gap_between_breaks_is_not_merged() {
        let table = RuleTable::ClassBreaks(ClassBreakTable {
            field: "V".into(),
            has_default: false,
            rules: vec![
                ClassBreakRule::new(0.0, 10.0, settings())
                    .conditions(LowerBound::Gte, UpperBound::Lt),
                ClassBreakRule::new(10.0, 20.0, settings())
                    .conditions(LowerBound::Gt, UpperBound::Lte),
            ],
        });
        assert_eq!(
            synthesize(&table, &[]),
            "(V >= 0 and V < 10) or (V > 10 and V <= 20)"
        );
    }

    #[test]
    fn unbounded_ranges_drop_the_open_side() {
        let table = RuleTable::ClassBreaks(ClassBreakTable {
            field: "V".into(),
            has_default: false,
            rules: vec![ClassBreakRule::new(100.0, f64::INFINITY, settings())],
        });
        assert_eq!(synthesize(&table, &[]), "(V >= 100)");
    }

    #[test]
    fn shadowed_duplicates_follow_the_first_rule() {
        let table = unique_table(&[("A", true), ("A", false)], Some(true));
        assert_eq!(synthesize(&table, &[]), MATCH_ALL);
        let table = unique_table(&[("A", false), ("B", true), ("A", true)], Some(true));
        assert_eq!(synthesize(&table, &[]), "NOT (TYPE in ('A'))");
    }

    #[test]
    fn negative_numbers_are_listed() {
        let table = RuleTable::UniqueValue(UniqueValueTable {
            fields: vec!["CODE".into()],
            has_default: true,
            rules: vec![
                UniqueValueRule::new(vec![(-1_i64).into()], settings()),
                UniqueValueRule::new(vec![2_i64.into()], settings()),
                UniqueValueRule::new(vec![3_i64.into()], settings()).visible(false),
                UniqueValueRule::default_rule(settings()).visible(false),
            ],
        });
        assert_eq!(synthesize(&table, &[]), "CODE in (-1, 2)");
    }
}
