use std::collections::HashMap;

use regex::Regex;

use super::date::parse_date_millis;
use super::error::FilterSyntaxError;
use super::node::{Arity, FilterNode, Operator};
use crate::{lookup_field, Feature, Value};

/// Data stack entry.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    /// Sentinel pushed by `(`.
    Mark,
    /// The literal `null`, kept apart from null field values for `is`/`is not`.
    NullLiteral,
    Value(Value),
    /// Built by `,`.
    List(Vec<Value>),
}

impl Slot {
    fn type_name(&self) -> &'static str {
        match self {
            Slot::Mark => "group",
            Slot::NullLiteral => "null",
            Slot::Value(v) => v.type_name(),
            Slot::List(_) => "list",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StackOp {
    Open,
    Op(Operator),
}

/// Translate a SQL `LIKE` pattern into an anchored, case-insensitive regex.
pub(crate) fn like_regex(pattern: &str) -> Result<Regex, FilterSyntaxError> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str("(?is)^");
    let mut buf = [0_u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|_| FilterSyntaxError::InvalidPattern {
        pattern: pattern.to_owned(),
    })
}

/// Evaluate classified nodes against one feature.
///
/// Returns `Some(bool)` for a determinate result and `None` when SQL null
/// propagates to the top. Absent fields read as null.
///
/// # Errors
///
/// Returns [`FilterSyntaxError`] for operand type mismatches, malformed
/// `is`/`is not`, mixed-type lists, or an end state that is not exactly one
/// boolean or null.
pub fn evaluate<F: Feature + ?Sized>(
    nodes: &[FilterNode],
    feature: &F,
) -> Result<Option<bool>, FilterSyntaxError> {
    Evaluator::new(feature, None).run(nodes)
}

pub(crate) fn evaluate_with_patterns<F: Feature + ?Sized>(
    nodes: &[FilterNode],
    feature: &F,
    patterns: &HashMap<String, Regex>,
) -> Result<Option<bool>, FilterSyntaxError> {
    Evaluator::new(feature, Some(patterns)).run(nodes)
}

struct Evaluator<'a, F: ?Sized> {
    feature: &'a F,
    patterns: Option<&'a HashMap<String, Regex>>,
    data: Vec<Slot>,
    ops: Vec<StackOp>,
}

impl<'a, F: Feature + ?Sized> Evaluator<'a, F> {
    fn new(feature: &'a F, patterns: Option<&'a HashMap<String, Regex>>) -> Self {
        Self {
            feature,
            patterns,
            data: Vec::new(),
            ops: Vec::new(),
        }
    }

    fn run(mut self, nodes: &[FilterNode]) -> Result<Option<bool>, FilterSyntaxError> {
        for node in nodes {
            match node {
                FilterNode::String(s) => self.data.push(Slot::Value(Value::String(s.clone()))),
                FilterNode::Number(n) => self.data.push(Slot::Value(Value::Number(*n))),
                FilterNode::Variable(name) => {
                    let value = lookup_field(self.feature, name).cloned().unwrap_or_default();
                    self.data.push(Slot::Value(value));
                }
                FilterNode::Null => self.data.push(Slot::NullLiteral),
                FilterNode::Open => {
                    self.ops.push(StackOp::Open);
                    self.data.push(Slot::Mark);
                }
                FilterNode::Close => self.close_group()?,
                FilterNode::Operator(op) => self.push_operator(*op)?,
            }
        }
        while let Some(top) = self.ops.pop() {
            match top {
                StackOp::Op(op) => self.apply(op)?,
                StackOp::Open => return Err(FilterSyntaxError::UnbalancedParentheses),
            }
        }
        self.finish()
    }

    /// Binary operators reduce everything of equal or higher precedence
    /// first, not only strictly higher, which keeps `a - b - c`
    /// left-associative. A `,` also reduces pending prefix operators so that
    /// `-1, 2` and `date '...', date '...'` list finished items. Prefix
    /// operators have no left operand and reduce nothing.
    fn push_operator(&mut self, op: Operator) -> Result<(), FilterSyntaxError> {
        if op.arity() == Arity::Binary {
            while let Some(&StackOp::Op(top)) = self.ops.last() {
                let prefix_item = op == Operator::Comma && top.arity() == Arity::Unary;
                if top.precedence() < op.precedence() && !prefix_item {
                    break;
                }
                self.ops.pop();
                self.apply(top)?;
            }
        }
        self.ops.push(StackOp::Op(op));
        Ok(())
    }

    fn close_group(&mut self) -> Result<(), FilterSyntaxError> {
        loop {
            match self.ops.pop() {
                Some(StackOp::Op(op)) => self.apply(op)?,
                Some(StackOp::Open) => break,
                None => return Err(FilterSyntaxError::UnbalancedParentheses),
            }
        }
        match self.data.pop() {
            Some(Slot::Mark) => Err(FilterSyntaxError::Malformed("empty parentheses")),
            Some(inner) => match self.data.pop() {
                Some(Slot::Mark) => {
                    self.data.push(inner);
                    Ok(())
                }
                _ => Err(FilterSyntaxError::Malformed("missing operator inside parentheses")),
            },
            None => Err(FilterSyntaxError::UnbalancedParentheses),
        }
    }

    fn finish(mut self) -> Result<Option<bool>, FilterSyntaxError> {
        let result = match self.data.pop() {
            None => return Err(FilterSyntaxError::Empty),
            Some(slot) => slot,
        };
        if !self.data.is_empty() {
            return Err(FilterSyntaxError::Malformed("missing operator"));
        }
        match result {
            Slot::Value(Value::Bool(b)) => Ok(Some(b)),
            Slot::Value(Value::Null) | Slot::NullLiteral => Ok(None),
            other => Err(FilterSyntaxError::InvalidResult {
                found: other.type_name(),
            }),
        }
    }

    fn pop_operand(&mut self, op: Operator) -> Result<Slot, FilterSyntaxError> {
        match self.data.pop() {
            Some(Slot::Mark) | None => Err(FilterSyntaxError::MissingOperand {
                operator: op.symbol(),
            }),
            Some(slot) => Ok(slot),
        }
    }

    fn apply(&mut self, op: Operator) -> Result<(), FilterSyntaxError> {
        let result = match op.arity() {
            Arity::Unary => {
                let operand = self.pop_operand(op)?;
                apply_unary(op, operand)?
            }
            Arity::Binary => {
                let rhs = self.pop_operand(op)?;
                let lhs = self.pop_operand(op)?;
                self.apply_binary(op, lhs, rhs)?
            }
        };
        self.data.push(result);
        Ok(())
    }

    fn apply_binary(&self, op: Operator, lhs: Slot, rhs: Slot) -> Result<Slot, FilterSyntaxError> {
        match op {
            Operator::Comma => build_list(lhs, rhs),
            Operator::Is | Operator::IsNot => {
                if rhs != Slot::NullLiteral {
                    return Err(FilterSyntaxError::MalformedNullTest {
                        operator: op.symbol(),
                    });
                }
                let is_null = scalar(op, lhs)?.is_null();
                Ok(boolean(is_null == (op == Operator::Is)))
            }
            Operator::In | Operator::NotIn => {
                let needle = scalar(op, lhs)?;
                let haystack = match rhs {
                    Slot::List(values) => values,
                    Slot::Value(v) => vec![v],
                    Slot::NullLiteral => vec![Value::Null],
                    Slot::Mark => return Err(missing(op)),
                };
                Ok(negate_if(op == Operator::NotIn, membership(&needle, &haystack)))
            }
            Operator::Like | Operator::NotLike => {
                let text = scalar(op, lhs)?;
                let pattern = scalar(op, rhs)?;
                let matched = self.like(op, &text, &pattern)?;
                Ok(negate_if(op == Operator::NotLike, matched))
            }
            Operator::And | Operator::Or => {
                let l = logical(op, scalar(op, lhs)?)?;
                let r = logical(op, scalar(op, rhs)?)?;
                Ok(tri_state(if op == Operator::And {
                    and3(l, r)
                } else {
                    or3(l, r)
                }))
            }
            Operator::Eq
            | Operator::Neq
            | Operator::Lt
            | Operator::Lte
            | Operator::Gt
            | Operator::Gte => compare(op, scalar(op, lhs)?, scalar(op, rhs)?),
            Operator::Concat => {
                let (l, r) = (scalar(op, lhs)?, scalar(op, rhs)?);
                if l.is_null() || r.is_null() {
                    return Ok(Slot::Value(Value::Null));
                }
                Ok(Slot::Value(Value::String(format!(
                    "{}{}",
                    concat_text(op, &l)?,
                    concat_text(op, &r)?
                ))))
            }
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div => {
                let (l, r) = (scalar(op, lhs)?, scalar(op, rhs)?);
                if l.is_null() || r.is_null() {
                    return Ok(Slot::Value(Value::Null));
                }
                let (a, b) = (number(op, &l)?, number(op, &r)?);
                let value = match op {
                    Operator::Add => Value::Number(a + b),
                    Operator::Sub => Value::Number(a - b),
                    Operator::Mul => Value::Number(a * b),
                    _ if b == 0.0 => Value::Null,
                    _ => Value::Number(a / b),
                };
                Ok(Slot::Value(value))
            }
            _ => Err(FilterSyntaxError::Malformed("unary operator used as binary")),
        }
    }

    /// `None` when either side is null.
    fn like(&self, op: Operator, text: &Value, pattern: &Value) -> Result<Option<bool>, FilterSyntaxError> {
        if text.is_null() || pattern.is_null() {
            return Ok(None);
        }
        let Value::String(pattern) = pattern else {
            return Err(invalid(op, pattern.type_name()));
        };
        let text = match text {
            Value::String(s) => s.clone(),
            Value::Number(_) | Value::Bool(_) => text.to_string(),
            Value::Null => return Ok(None),
        };
        if let Some(re) = self.patterns.and_then(|cache| cache.get(pattern.as_str())) {
            return Ok(Some(re.is_match(&text)));
        }
        Ok(Some(like_regex(pattern)?.is_match(&text)))
    }
}

fn apply_unary(op: Operator, operand: Slot) -> Result<Slot, FilterSyntaxError> {
    let value = scalar(op, operand)?;
    if value.is_null() {
        return Ok(Slot::Value(Value::Null));
    }
    let result = match (op, value) {
        (Operator::Not, Value::Bool(b)) => Value::Bool(!b),
        (Operator::Plus, Value::Number(n)) => Value::Number(n),
        (Operator::Minus, Value::Number(n)) => Value::Number(-n),
        (Operator::Date, Value::Number(n)) => Value::Number(n),
        (Operator::Date, Value::String(s)) => match parse_date_millis(&s) {
            #[allow(clippy::cast_precision_loss)]
            Some(millis) => Value::Number(millis as f64),
            None => return Err(FilterSyntaxError::InvalidDate { input: s }),
        },
        (Operator::Upper, Value::String(s)) => Value::String(s.to_uppercase()),
        (Operator::Lower, Value::String(s)) => Value::String(s.to_lowercase()),
        (_, other) => return Err(invalid(op, other.type_name())),
    };
    Ok(Slot::Value(result))
}

// -- Operand helpers ---------------------------------------------------------

fn invalid(op: Operator, operand: &'static str) -> FilterSyntaxError {
    FilterSyntaxError::InvalidOperand {
        operator: op.symbol(),
        operand,
    }
}

fn missing(op: Operator) -> FilterSyntaxError {
    FilterSyntaxError::MissingOperand {
        operator: op.symbol(),
    }
}

fn scalar(op: Operator, slot: Slot) -> Result<Value, FilterSyntaxError> {
    match slot {
        Slot::Value(v) => Ok(v),
        Slot::NullLiteral => Ok(Value::Null),
        Slot::List(_) => Err(invalid(op, "list")),
        Slot::Mark => Err(missing(op)),
    }
}

fn number(op: Operator, value: &Value) -> Result<f64, FilterSyntaxError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(invalid(op, other.type_name())),
    }
}

fn concat_text(op: Operator, value: &Value) -> Result<String, FilterSyntaxError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(_) => Ok(value.to_string()),
        other => Err(invalid(op, other.type_name())),
    }
}

fn logical(op: Operator, value: Value) -> Result<Option<bool>, FilterSyntaxError> {
    match value {
        Value::Bool(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        other => Err(invalid(op, other.type_name())),
    }
}

fn boolean(b: bool) -> Slot {
    Slot::Value(Value::Bool(b))
}

fn tri_state(result: Option<bool>) -> Slot {
    Slot::Value(result.map_or(Value::Null, Value::Bool))
}

fn negate_if(negate: bool, result: Option<bool>) -> Slot {
    tri_state(if negate { result.map(|b| !b) } else { result })
}

fn and3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(l: Option<bool>, r: Option<bool>) -> Option<bool> {
    match (l, r) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn compare(op: Operator, lhs: Value, rhs: Value) -> Result<Slot, FilterSyntaxError> {
    if lhs.is_null() || rhs.is_null() {
        return Ok(Slot::Value(Value::Null));
    }
    let cmp = op
        .compare_op()
        .ok_or(FilterSyntaxError::Malformed("not a comparison operator"))?;
    lhs.compare(cmp, &rhs)
        .map(boolean)
        .ok_or_else(|| invalid(op, rhs.type_name()))
}

/// Membership with SQL null semantics: a miss against a list holding null is
/// undetermined.
fn membership(needle: &Value, haystack: &[Value]) -> Option<bool> {
    if needle.is_null() {
        return None;
    }
    if haystack.iter().any(|v| needle.loose_eq(v)) {
        Some(true)
    } else if haystack.iter().any(Value::is_null) {
        None
    } else {
        Some(false)
    }
}

fn list_items(slot: Slot) -> Result<Vec<Value>, FilterSyntaxError> {
    match slot {
        Slot::List(values) => Ok(values),
        Slot::Value(v) => Ok(vec![v]),
        Slot::NullLiteral => Ok(vec![Value::Null]),
        Slot::Mark => Err(missing(Operator::Comma)),
    }
}

/// Flatten `a, b, c` into one list and require every non-null item to share
/// a type.
fn build_list(lhs: Slot, rhs: Slot) -> Result<Slot, FilterSyntaxError> {
    let mut items = list_items(lhs)?;
    items.extend(list_items(rhs)?);
    let mut non_null = items.iter().filter(|v| !v.is_null());
    if let Some(first) = non_null.next() {
        if let Some(other) = non_null.find(|v| !v.same_kind(first)) {
            return Err(FilterSyntaxError::MixedListTypes {
                first: first.type_name(),
                second: other.type_name(),
            });
        }
    }
    Ok(Slot::List(items))
}
