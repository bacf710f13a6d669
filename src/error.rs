use thiserror::Error;

use crate::filter::FilterSyntaxError;
use crate::visual::ExpressionError;
use crate::ColorParseError;

/// Unified error type covering filters, colors and value expressions.
///
/// Returned by [`LayerStyleBuilder::build()`](crate::LayerStyleBuilder::build).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    #[error(transparent)]
    Filter(#[from] FilterSyntaxError),

    #[error(transparent)]
    Color(#[from] ColorParseError),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("layer style has no rule table")]
    MissingRuleTable,
}

/// A rule references a field the feature does not carry.
///
/// Logged at `warn` level and treated as "no match"; never returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field '{field}' not found on feature")]
pub struct FieldResolutionWarning {
    pub field: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_error_is_transparent() {
        let err = StyleError::from(FilterSyntaxError::UnbalancedParentheses);
        assert_eq!(err.to_string(), "unbalanced parentheses");
    }

    #[test]
    fn warning_message() {
        let warning = FieldResolutionWarning {
            field: "TYPE".into(),
        };
        assert_eq!(warning.to_string(), "field 'TYPE' not found on feature");
    }
}
