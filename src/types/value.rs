use std::cmp::Ordering;
use std::fmt;

/// Comparison operators shared by filter evaluation and class-break bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// Apply this operator to an already computed ordering.
    #[must_use]
    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Neq => ord != Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
        }
    }

    /// The SQL spelling of the operator.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "<>",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A feature attribute value.
///
/// Dates travel as [`Value::Number`] holding UTC epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Value {
    /// SQL `NULL`, also used for absent attributes.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. Strings are parsed after trimming; booleans
    /// and nulls have no numeric view.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse().ok()
                }
            }
            Value::Bool(_) | Value::Null => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
        }
    }

    /// Equality used by rule matching and by the filter `=` operator.
    ///
    /// Numbers and numeric strings compare numerically. `Null` equals only
    /// `Null`; callers that need SQL null propagation check for it first.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.partial_cmp_value(other) == Some(Ordering::Equal),
        }
    }

    /// Ordering between two values, `None` for incompatible types or nulls.
    #[must_use]
    pub fn partial_cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Number(a), Value::String(_)) => a.partial_cmp(&other.as_number()?),
            (Value::String(_), Value::Number(b)) => self.as_number()?.partial_cmp(b),
            _ => None,
        }
    }

    /// Compare this value to another using the given operator.
    /// Returns `None` when either side is null or the types are incompatible.
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Value) -> Option<bool> {
        if self.is_null() || other.is_null() {
            return None;
        }
        match op {
            CompareOp::Eq => Some(self.loose_eq(other)),
            CompareOp::Neq => Some(!self.loose_eq(other)),
            _ => Some(op.holds(self.partial_cmp_value(other)?)),
        }
    }

    /// Whether two non-null values share a type for list homogeneity checks.
    #[must_use]
    pub(crate) fn same_kind(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(42_i64), Value::Number(42.0));
        assert_eq!(Value::from(7_i32), Value::Number(7.0));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_owned()));
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".to_owned()));
    }

    #[test]
    fn display() {
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(3.25).to_string(), "3.25");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::String("abc".into()).to_string(), "abc");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn as_number_parses_trimmed_strings() {
        assert_eq!(Value::from(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Value::from("").as_number(), None);
        assert_eq!(Value::from("abc").as_number(), None);
        assert_eq!(Value::Bool(true).as_number(), None);
    }

    #[test]
    fn loose_eq_crosses_number_and_string() {
        assert!(Value::from(1_i64).loose_eq(&Value::from("1")));
        assert!(Value::from("1.0").loose_eq(&Value::from(1_i64)));
        assert!(!Value::from("1.0").loose_eq(&Value::from("1")));
        assert!(!Value::from(1_i64).loose_eq(&Value::from("one")));
        assert!(Value::Null.loose_eq(&Value::Null));
        assert!(!Value::Null.loose_eq(&Value::from(0_i64)));
        assert!(!Value::Bool(true).loose_eq(&Value::from(1_i64)));
    }

    #[test]
    fn compare_numbers() {
        let a = Value::from(10_i64);
        let b = Value::from(20_i64);
        assert_eq!(a.compare(CompareOp::Lt, &b), Some(true));
        assert_eq!(a.compare(CompareOp::Lte, &a), Some(true));
        assert_eq!(a.compare(CompareOp::Gt, &b), Some(false));
        assert_eq!(a.compare(CompareOp::Gte, &a), Some(true));
        assert_eq!(a.compare(CompareOp::Neq, &b), Some(true));
    }

    #[test]
    fn compare_strings_lexically() {
        let a = Value::from("apple");
        let b = Value::from("banana");
        assert_eq!(a.compare(CompareOp::Lt, &b), Some(true));
        assert_eq!(a.compare(CompareOp::Eq, &a), Some(true));
    }

    #[test]
    fn compare_with_null_is_unknown() {
        let a = Value::from(1_i64);
        assert_eq!(a.compare(CompareOp::Eq, &Value::Null), None);
        assert_eq!(Value::Null.compare(CompareOp::Neq, &a), None);
    }

    #[test]
    fn compare_incompatible_ordering_is_none() {
        let a = Value::from(1_i64);
        let s = Value::from("abc");
        assert_eq!(a.compare(CompareOp::Lt, &s), None);
        assert_eq!(a.compare(CompareOp::Eq, &s), Some(false));
        assert_eq!(a.compare(CompareOp::Neq, &s), Some(true));
    }

    #[test]
    fn compare_op_symbols() {
        assert_eq!(CompareOp::Neq.to_string(), "<>");
        assert_eq!(CompareOp::Gte.symbol(), ">=");
    }
}
