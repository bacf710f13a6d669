use std::fmt;

use thiserror::Error;
use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat, terminated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use crate::{lookup_field, Feature};

/// Characters accepted outside `$feature` references.
const ALLOWED_SYMBOLS: &str = ".+-*/%^()$[]\"'";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("forbidden character '{found}' at position {position}")]
    ForbiddenCharacter { position: usize, found: char },

    #[error("invalid value expression: {message}")]
    Syntax { message: String },

    #[error("field '{field}' not found on feature")]
    MissingField { field: String },

    #[error("field '{field}' holds a {found}, not a number")]
    NonNumeric { field: String, found: &'static str },

    #[error("division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum ExprNode {
    Number(f64),
    Field(String),
    Neg(Box<ExprNode>),
    Binary(BinOp, Box<ExprNode>, Box<ExprNode>),
}

impl ExprNode {
    fn binary(op: BinOp, lhs: ExprNode, rhs: ExprNode) -> Self {
        ExprNode::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    fn eval<F: Feature + ?Sized>(&self, feature: &F) -> Result<f64, ExpressionError> {
        match self {
            ExprNode::Number(n) => Ok(*n),
            ExprNode::Field(name) => field_number(feature, name),
            ExprNode::Neg(inner) => Ok(-inner.eval(feature)?),
            ExprNode::Binary(op, lhs, rhs) => {
                let a = lhs.eval(feature)?;
                let b = rhs.eval(feature)?;
                match op {
                    BinOp::Add => Ok(a + b),
                    BinOp::Sub => Ok(a - b),
                    BinOp::Mul => Ok(a * b),
                    BinOp::Div | BinOp::Rem if b == 0.0 => Err(ExpressionError::DivisionByZero),
                    BinOp::Div => Ok(a / b),
                    BinOp::Rem => Ok(a % b),
                    BinOp::Pow => Ok(a.powf(b)),
                }
            }
        }
    }
}

/// Numeric attribute value, numeric strings included.
pub(crate) fn field_number<F: Feature + ?Sized>(
    feature: &F,
    name: &str,
) -> Result<f64, ExpressionError> {
    let value = lookup_field(feature, name).ok_or_else(|| ExpressionError::MissingField {
        field: name.to_owned(),
    })?;
    value.as_number().ok_or_else(|| ExpressionError::NonNumeric {
        field: name.to_owned(),
        found: value.type_name(),
    })
}

// -- Grammar (precedence: + - < * / % < unary sign < ^ < primary) -----------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., char::is_whitespace).void().parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f64> {
    alt(((digit1, opt(('.', digit0))).take(), ('.', digit1).take()))
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn quoted_name(input: &mut &str) -> ModalResult<String> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .map(str::to_owned)
    .parse_next(input)
}

fn field_ref(input: &mut &str) -> ModalResult<ExprNode> {
    "$feature".parse_next(input)?;
    let name = cut_err(alt((
        delimited(('[', ws), quoted_name, (ws, ']')),
        preceded(
            '.',
            take_while(1.., |c: char| c.is_alphanumeric() || c == '_').map(str::to_owned),
        ),
    )))
    .context(StrContext::Expected(StrContextValue::Description(
        "field reference",
    )))
    .parse_next(input)?;
    Ok(ExprNode::Field(name))
}

fn primary(input: &mut &str) -> ModalResult<ExprNode> {
    ws.parse_next(input)?;
    alt((
        number.map(ExprNode::Number),
        field_ref,
        delimited('(', sum, (ws, cut_err(')'))),
    ))
    .context(StrContext::Expected(StrContextValue::Description("operand")))
    .parse_next(input)
}

/// `^` is right-associative and binds tighter than a leading sign.
fn power(input: &mut &str) -> ModalResult<ExprNode> {
    let base = primary(input)?;
    let exponent = opt(preceded((ws, '^'), cut_err(unary))).parse_next(input)?;
    Ok(match exponent {
        Some(exponent) => ExprNode::binary(BinOp::Pow, base, exponent),
        None => base,
    })
}

fn unary(input: &mut &str) -> ModalResult<ExprNode> {
    ws.parse_next(input)?;
    let signs: Vec<char> = repeat(0.., terminated(one_of(['-', '+']), ws)).parse_next(input)?;
    let operand = power(input)?;
    Ok(signs.iter().rev().fold(operand, |acc, sign| {
        if *sign == '-' {
            ExprNode::Neg(Box::new(acc))
        } else {
            acc
        }
    }))
}

fn term(input: &mut &str) -> ModalResult<ExprNode> {
    let first = unary(input)?;
    let rest: Vec<(BinOp, ExprNode)> = repeat(
        0..,
        (
            preceded(
                ws,
                alt((
                    '*'.value(BinOp::Mul),
                    '/'.value(BinOp::Div),
                    '%'.value(BinOp::Rem),
                )),
            ),
            cut_err(unary),
        ),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, (op, rhs)| ExprNode::binary(op, acc, rhs)))
}

fn sum(input: &mut &str) -> ModalResult<ExprNode> {
    let first = term(input)?;
    let rest: Vec<(BinOp, ExprNode)> = repeat(
        0..,
        (
            preceded(ws, alt(('+'.value(BinOp::Add), '-'.value(BinOp::Sub)))),
            cut_err(term),
        ),
    )
    .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, (op, rhs)| ExprNode::binary(op, acc, rhs)))
}

fn expression(input: &mut &str) -> ModalResult<ExprNode> {
    let node = sum(input)?;
    ws.parse_next(input)?;
    Ok(node)
}

/// First character outside quoted names and `$feature.name` references that
/// the grammar never accepts.
fn forbidden_character(source: &str) -> Option<(usize, char)> {
    let mut chars = source.char_indices().peekable();
    while let Some((position, c)) = chars.next() {
        match c {
            '"' | '\'' => {
                for (_, d) in chars.by_ref() {
                    if d == c {
                        break;
                    }
                }
            }
            '$' if source[position..].starts_with("$feature") => {
                for _ in 0.."feature".len() {
                    chars.next();
                }
                if chars.next_if(|&(_, d)| d == '.').is_some() {
                    while chars
                        .next_if(|&(_, d)| d.is_alphanumeric() || d == '_')
                        .is_some()
                    {}
                }
            }
            c if c.is_ascii_digit() || c.is_whitespace() || ALLOWED_SYMBOLS.contains(c) => {}
            c => return Some((position, c)),
        }
    }
    None
}

/// A parsed arithmetic value expression over `$feature` references.
///
/// Only numbers, `$feature["NAME"]` / `$feature['NAME']` / `$feature.NAME`,
/// `+ - * / % ^` and parentheses are accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueExpression {
    source: String,
    root: ExprNode,
}

impl ValueExpression {
    /// # Errors
    ///
    /// Returns [`ExpressionError::ForbiddenCharacter`] for any character
    /// outside the grammar and [`ExpressionError::Syntax`] for malformed input.
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        if let Some((position, found)) = forbidden_character(source) {
            return Err(ExpressionError::ForbiddenCharacter { position, found });
        }
        let root = expression
            .parse(source)
            .map_err(|e| ExpressionError::Syntax {
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_owned(),
            root,
        })
    }

    /// # Errors
    ///
    /// Returns [`ExpressionError`] for missing or non-numeric fields and
    /// division by zero.
    pub fn evaluate<F: Feature + ?Sized>(&self, feature: &F) -> Result<f64, ExpressionError> {
        self.root.eval(feature)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for ValueExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate a value expression in one step.
///
/// # Errors
///
/// See [`ValueExpression::parse`] and [`ValueExpression::evaluate`].
pub fn evaluate_expression<F: Feature + ?Sized>(
    expr: &str,
    feature: &F,
) -> Result<f64, ExpressionError> {
    ValueExpression::parse(expr)?.evaluate(feature)
}
