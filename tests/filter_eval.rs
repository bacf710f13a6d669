use stylefilter::filter::{parse_date_millis, tokenize, FilterNode, Operator};
use stylefilter::{evaluate_visibility, FeatureRecord, Filter, FilterSyntaxError, Value};

fn eval(filter: &str, feature: &FeatureRecord) -> Result<Option<bool>, FilterSyntaxError> {
    evaluate_visibility(filter, feature)
}

fn parcel() -> FeatureRecord {
    FeatureRecord::new()
        .set("OWNER", "O'Neil")
        .set("ZONE", "R-1")
        .set("ACRES", 2.5)
        .set("UNITS", 4_i64)
        .set("VACANT", Value::Null)
        .set("BUILT", "2019-06-01")
}

// ---------------------------------------------------------------------------
// Null propagation
// ---------------------------------------------------------------------------

#[test]
fn comparison_with_null_is_undetermined() {
    let f = FeatureRecord::new().set("A", Value::Null);
    assert_eq!(eval("A = 1", &f), Ok(None));
    assert_eq!(eval("A is null", &f), Ok(Some(true)));
    assert_eq!(eval("A is not null", &f), Ok(Some(false)));
}

#[test]
fn missing_field_behaves_as_null() {
    let f = FeatureRecord::new();
    assert_eq!(eval("NOPE > 3", &f), Ok(None));
    assert_eq!(eval("NOPE is null", &f), Ok(Some(true)));
}

#[test]
fn sql_and_or_truth_tables() {
    let f = parcel();
    // VACANT = 1 is null
    assert_eq!(eval("VACANT = 1 and UNITS = 0", &f), Ok(Some(false)));
    assert_eq!(eval("VACANT = 1 and UNITS = 4", &f), Ok(None));
    assert_eq!(eval("VACANT = 1 or UNITS = 4", &f), Ok(Some(true)));
    assert_eq!(eval("VACANT = 1 or UNITS = 0", &f), Ok(None));
    assert_eq!(eval("not (VACANT = 1)", &f), Ok(None));
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[test]
fn like_is_case_insensitive_and_anchored() {
    let abc = FeatureRecord::new().set("NAME", "ABC");
    let xyz = FeatureRecord::new().set("NAME", "XYZ");
    assert_eq!(eval("NAME like 'A%'", &abc), Ok(Some(true)));
    assert_eq!(eval("NAME like 'a%'", &abc), Ok(Some(true)));
    assert_eq!(eval("NAME like 'A%'", &xyz), Ok(Some(false)));
    assert_eq!(eval("NAME like 'B'", &abc), Ok(Some(false)));
    assert_eq!(eval("NAME like '_B_'", &abc), Ok(Some(true)));
    assert_eq!(eval("NAME not like 'X%'", &abc), Ok(Some(true)));
}

#[test]
fn like_escapes_regex_metacharacters() {
    let f = FeatureRecord::new().set("CODE", "a.b+c");
    assert_eq!(eval("CODE like 'a.b+c'", &f), Ok(Some(true)));
    assert_eq!(eval("CODE like 'a.b+'", &f), Ok(Some(false)));
    let g = FeatureRecord::new().set("CODE", "axb+c");
    assert_eq!(eval("CODE like 'a.b+c'", &g), Ok(Some(false)));
}

#[test]
fn in_lists() {
    let f = parcel();
    assert_eq!(eval("UNITS in (1, 2, 3)", &f), Ok(Some(false)));
    assert_eq!(eval("UNITS in (1, 2, 3, 4)", &f), Ok(Some(true)));
    assert_eq!(eval("UNITS not in (1, 2, 3)", &f), Ok(Some(true)));
    assert_eq!(eval("ZONE in ('R-1')", &f), Ok(Some(true)));
    assert_eq!(eval("VACANT in (1, 2)", &f), Ok(None));
    assert_eq!(eval("UNITS in (1, null)", &f), Ok(None));
}

#[test]
fn in_list_matches_or_of_equalities() {
    for units in [1_i64, 2, 3, 4] {
        let f = FeatureRecord::new().set("V", units);
        assert_eq!(
            eval("V in (1, 2, 3)", &f),
            eval("V = 1 or V = 2 or V = 3", &f),
            "V = {units}"
        );
    }
}

#[test]
fn mixed_in_list_is_rejected() {
    let err = eval("UNITS in (1, 'two')", &parcel()).unwrap_err();
    assert_eq!(
        err,
        FilterSyntaxError::MixedListTypes {
            first: "number",
            second: "string"
        }
    );
}

#[test]
fn arithmetic_and_concatenation() {
    let f = parcel();
    assert_eq!(eval("UNITS / ACRES > 1.5", &f), Ok(Some(true)));
    assert_eq!(eval("UNITS * 2 - 1 = 7", &f), Ok(Some(true)));
    assert_eq!(eval("-UNITS = -4", &f), Ok(Some(true)));
    assert_eq!(eval("ZONE || '/' || UNITS = 'R-1/4'", &f), Ok(Some(true)));
    assert_eq!(eval("UNITS / 0 = 1", &f), Ok(None));
}

#[test]
fn upper_lower_and_null_passthrough() {
    let f = parcel();
    assert_eq!(eval("upper(OWNER) = 'O''NEIL'", &f), Ok(Some(true)));
    assert_eq!(eval("lower(ZONE) = 'r-1'", &f), Ok(Some(true)));
    assert_eq!(eval("upper(VACANT) = 'X'", &f), Ok(None));
}

#[test]
fn date_literals_compare_as_timestamps() {
    let f = FeatureRecord::new().set("BUILT", parse_date_millis("2019-06-01").map(|ms| ms as f64));
    assert_eq!(eval("BUILT > date '2019-01-01'", &f), Ok(Some(true)));
    assert_eq!(eval("BUILT < date '2019/01/01'", &f), Ok(Some(false)));
    assert_eq!(eval("BUILT = date '2019-06-01 00:00:00'", &f), Ok(Some(true)));
    assert_eq!(eval("date BUILT = date '2019-06-01'", &f), Ok(Some(true)));
}

#[test]
fn string_date_field_is_coerced() {
    let f = parcel();
    assert_eq!(eval("date BUILT >= date '2019-06-01'", &f), Ok(Some(true)));
}

// ---------------------------------------------------------------------------
// Precedence
// ---------------------------------------------------------------------------

#[test]
fn and_binds_tighter_than_or() {
    let f = FeatureRecord::new().set("A", 1_i64).set("B", 0_i64);
    assert_eq!(eval("A = 1 or B = 1 and B = 2", &f), Ok(Some(true)));
    assert_eq!(eval("(A = 1 or B = 1) and B = 2", &f), Ok(Some(false)));
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let f = FeatureRecord::new().set("A", 2_i64);
    assert_eq!(eval("A + 3 * 4 = 14", &f), Ok(Some(true)));
    assert_eq!(eval("(A + 3) * 4 = 20", &f), Ok(Some(true)));
    assert_eq!(eval("12 / A / 3 = 2", &f), Ok(Some(true)));
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[test]
fn tokenizes_null_tests_and_keywords() {
    let nodes = tokenize("A IS NOT null AND B in (1, 2)").unwrap();
    assert_eq!(
        nodes,
        vec![
            FilterNode::Variable("A".into()),
            FilterNode::Operator(Operator::IsNot),
            FilterNode::Null,
            FilterNode::Operator(Operator::And),
            FilterNode::Variable("B".into()),
            FilterNode::Operator(Operator::In),
            FilterNode::Open,
            FilterNode::Number(1.0),
            FilterNode::Operator(Operator::Comma),
            FilterNode::Number(2.0),
            FilterNode::Close,
        ]
    );
}

#[test]
fn keywords_inside_strings_stay_literal() {
    let nodes = tokenize("NAME = 'cats and dogs (or not)'").unwrap();
    assert_eq!(nodes[2], FilterNode::String("cats and dogs (or not)".into()));
    assert_eq!(nodes.len(), 3);
}

#[test]
fn keyword_prefixes_are_field_names() {
    let nodes = tokenize("ANDERSON = INDEX").unwrap();
    assert_eq!(nodes[0], FilterNode::Variable("ANDERSON".into()));
    assert_eq!(nodes[2], FilterNode::Variable("INDEX".into()));
}

#[test]
fn unary_and_binary_minus() {
    let nodes = tokenize("A - -1").unwrap();
    assert_eq!(nodes[1], FilterNode::Operator(Operator::Sub));
    assert_eq!(nodes[2], FilterNode::Operator(Operator::Minus));
}

#[test]
fn parsed_filter_reports_source() {
    let filter = Filter::parse("ZONE = 'R-1'").unwrap();
    assert_eq!(filter.source(), "ZONE = 'R-1'");
    assert_eq!(filter.to_string(), "ZONE = 'R-1'");
    assert_eq!(filter.evaluate(&parcel()), Ok(Some(true)));
}
