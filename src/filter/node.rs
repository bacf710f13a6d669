use std::fmt;

use crate::CompareOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Unary,
    Binary,
}

/// Filter operators, keywords included (`and`, `in`, `date`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Is,
    IsNot,
    Like,
    NotLike,
    In,
    NotIn,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Not,
    /// Unary `+`, written `u+`.
    Plus,
    /// Unary `-`, written `u-`.
    Minus,
    Date,
    Upper,
    Lower,
    /// List builder used by `in (a, b, c)`.
    Comma,
}

impl Operator {
    #[must_use]
    pub fn arity(self) -> Arity {
        match self {
            Operator::Not
            | Operator::Plus
            | Operator::Minus
            | Operator::Date
            | Operator::Upper
            | Operator::Lower => Arity::Unary,
            _ => Arity::Binary,
        }
    }

    /// The value comparison behind `=`, `<>`, `<`, `<=`, `>` and `>=`.
    #[must_use]
    pub fn compare_op(self) -> Option<CompareOp> {
        match self {
            Operator::Eq => Some(CompareOp::Eq),
            Operator::Neq => Some(CompareOp::Neq),
            Operator::Lt => Some(CompareOp::Lt),
            Operator::Lte => Some(CompareOp::Lte),
            Operator::Gt => Some(CompareOp::Gt),
            Operator::Gte => Some(CompareOp::Gte),
            _ => None,
        }
    }

    /// Binding strength, low to high:
    /// `or` < `and` < comparisons < `||` < additive < multiplicative < unary < `,`.
    #[must_use]
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Or => 1,
            Operator::And => 2,
            Operator::Eq
            | Operator::Neq
            | Operator::Lt
            | Operator::Lte
            | Operator::Gt
            | Operator::Gte
            | Operator::Is
            | Operator::IsNot
            | Operator::Like
            | Operator::NotLike
            | Operator::In
            | Operator::NotIn => 3,
            Operator::Concat => 4,
            Operator::Add | Operator::Sub => 5,
            Operator::Mul | Operator::Div => 6,
            Operator::Not
            | Operator::Plus
            | Operator::Minus
            | Operator::Date
            | Operator::Upper
            | Operator::Lower => 7,
            Operator::Comma => 8,
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Or => "or",
            Operator::And => "and",
            Operator::Eq => "=",
            Operator::Neq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Concat => "||",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Not => "not",
            Operator::Plus => "u+",
            Operator::Minus => "u-",
            Operator::Date => "date",
            Operator::Upper => "upper",
            Operator::Lower => "lower",
            Operator::Comma => ",",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One classified token of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// Single-quoted string literal, quotes removed and `''` unescaped.
    String(String),
    Number(f64),
    /// Field reference.
    Variable(String),
    /// The literal `null`.
    Null,
    Operator(Operator),
    Open,
    Close,
}

impl FilterNode {
    /// Whether this node ends an operand, which makes a following `+`/`-` binary.
    #[must_use]
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            FilterNode::String(_)
                | FilterNode::Number(_)
                | FilterNode::Variable(_)
                | FilterNode::Null
                | FilterNode::Close
        )
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            FilterNode::Number(n) => write!(f, "{n}"),
            FilterNode::Variable(name) => f.write_str(name),
            FilterNode::Null => f.write_str("null"),
            FilterNode::Operator(op) => write!(f, "{op}"),
            FilterNode::Open => f.write_str("("),
            FilterNode::Close => f.write_str(")"),
        }
    }
}
