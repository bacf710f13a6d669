use thiserror::Error;

/// A filter that cannot be tokenized or evaluated.
///
/// Never recovered from silently: a broken filter must not show or hide the
/// wrong features.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterSyntaxError {
    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("unterminated string literal starting at {position}")]
    UnterminatedString { position: usize },

    #[error("unexpected character '{found}' at {position}")]
    UnexpectedCharacter { position: usize, found: char },

    #[error("'{function}' must be followed by '('")]
    MissingFunctionParenthesis { function: &'static str },

    #[error("'{operator}' must be followed by null")]
    MalformedNullTest { operator: &'static str },

    #[error("invalid {operand} operand for '{operator}'")]
    InvalidOperand {
        operator: &'static str,
        operand: &'static str,
    },

    #[error("list mixes {first} and {second} values")]
    MixedListTypes {
        first: &'static str,
        second: &'static str,
    },

    #[error("missing operand for '{operator}'")]
    MissingOperand { operator: &'static str },

    #[error("malformed expression: {0}")]
    Malformed(&'static str),

    #[error("empty filter")]
    Empty,

    #[error("filter produced a {found} instead of a boolean")]
    InvalidResult { found: &'static str },

    #[error("invalid date '{input}'")]
    InvalidDate { input: String },

    #[error("invalid LIKE pattern '{pattern}'")]
    InvalidPattern { pattern: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unterminated_string_message() {
        let err = FilterSyntaxError::UnterminatedString { position: 7 };
        assert_eq!(err.to_string(), "unterminated string literal starting at 7");
    }

    #[test]
    fn invalid_operand_message() {
        let err = FilterSyntaxError::InvalidOperand {
            operator: "+",
            operand: "string",
        };
        assert_eq!(err.to_string(), "invalid string operand for '+'");
    }

    #[test]
    fn mixed_list_message() {
        let err = FilterSyntaxError::MixedListTypes {
            first: "number",
            second: "string",
        };
        assert_eq!(err.to_string(), "list mixes number and string values");
    }

    #[test]
    fn malformed_null_test_message() {
        let err = FilterSyntaxError::MalformedNullTest { operator: "is not" };
        assert_eq!(err.to_string(), "'is not' must be followed by null");
    }
}
