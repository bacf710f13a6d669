//! SQL-like filter expressions: tokenizing, classification and evaluation.

mod date;
mod error;
mod evaluate;
mod lexer;
mod node;

use std::collections::HashMap;
use std::fmt;

use regex::Regex;

pub use date::{format_date_millis, parse_date_millis};
pub use error::FilterSyntaxError;
pub use evaluate::evaluate;
pub use lexer::tokenize;
pub use node::{Arity, FilterNode, Operator};

use crate::{Feature, FeatureRecord};

/// A parsed filter, immutable and shareable across threads.
///
/// Literal `LIKE` patterns are compiled once at parse time.
#[derive(Debug, Clone)]
pub struct Filter {
    source: String,
    nodes: Vec<FilterNode>,
    patterns: HashMap<String, Regex>,
}

impl Filter {
    /// Tokenize and validate a filter string.
    ///
    /// Validation runs the expression once against a feature with no
    /// attributes, which surfaces structural errors before any real feature
    /// is seen.
    ///
    /// # Errors
    ///
    /// Returns [`FilterSyntaxError`] if the string cannot be tokenized or its
    /// structure cannot reduce to a single boolean.
    pub fn parse(raw: &str) -> Result<Self, FilterSyntaxError> {
        let nodes = tokenize(raw)?;
        let mut patterns = HashMap::new();
        for pair in nodes.windows(2) {
            if let [FilterNode::Operator(Operator::Like | Operator::NotLike), FilterNode::String(pattern)] =
                pair
            {
                if !patterns.contains_key(pattern) {
                    patterns.insert(pattern.clone(), evaluate::like_regex(pattern)?);
                }
            }
        }
        let filter = Self {
            source: raw.to_owned(),
            nodes,
            patterns,
        };
        filter.evaluate(&FeatureRecord::new())?;
        tracing::debug!(
            filter = %filter.source,
            nodes = filter.nodes.len(),
            patterns = filter.patterns.len(),
            "parsed filter"
        );
        Ok(filter)
    }

    /// Evaluate against one feature. `None` is SQL null.
    ///
    /// # Errors
    ///
    /// Returns [`FilterSyntaxError`] when the feature's values do not fit the
    /// operators (for example a string field used in arithmetic).
    pub fn evaluate<F: Feature + ?Sized>(
        &self,
        feature: &F,
    ) -> Result<Option<bool>, FilterSyntaxError> {
        evaluate::evaluate_with_patterns(&self.nodes, feature, &self.patterns)
    }

    #[must_use]
    pub fn nodes(&self) -> &[FilterNode] {
        &self.nodes
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn parse_and_evaluate() {
        let filter = Filter::parse("POP > 1000 and NAME like 'S%'").unwrap();
        let f = FeatureRecord::new().set("POP", 5000_i64).set("NAME", "Springfield");
        assert_eq!(filter.evaluate(&f), Ok(Some(true)));
        assert_eq!(filter.to_string(), "POP > 1000 and NAME like 'S%'");
    }

    #[test]
    fn like_patterns_are_precompiled() {
        let filter = Filter::parse("A like 'x%' or B not like 'y_'").unwrap();
        assert_eq!(filter.patterns.len(), 2);
    }

    #[test]
    fn parse_rejects_structural_errors() {
        assert_eq!(
            Filter::parse("A is 3").unwrap_err(),
            FilterSyntaxError::MalformedNullTest { operator: "is" }
        );
        assert_eq!(
            Filter::parse("(A = 1").unwrap_err(),
            FilterSyntaxError::UnbalancedParentheses
        );
        assert_eq!(Filter::parse("").unwrap_err(), FilterSyntaxError::Empty);
        assert!(Filter::parse("'abc'").is_err());
    }

    #[test]
    fn parse_accepts_null_tolerant_filters() {
        let filter = Filter::parse("A + 1 > 3").unwrap();
        let f = FeatureRecord::new().set("A", Value::Null);
        assert_eq!(filter.evaluate(&f), Ok(None));
    }

    #[test]
    fn filter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Filter>();
    }
}
