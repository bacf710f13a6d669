use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, delimited, opt};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, one_of, take_till, take_while};

use super::error::FilterSyntaxError;
use super::node::{FilterNode, Operator};

/// Token before keyword and sign resolution.
#[derive(Debug, Clone, PartialEq)]
enum RawToken<'i> {
    Str(String),
    Quoted(String),
    Number(f64),
    Word(&'i str),
    Symbol(&'i str),
}

// -- Scanners ----------------------------------------------------------------

/// `'...'` with `''` as the escape for a literal quote.
fn string_literal(input: &mut &str) -> ModalResult<String> {
    '\''.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        if ch != '\'' {
            s.push(ch);
        } else if opt('\'').parse_next(input)?.is_some() {
            s.push('\'');
        } else {
            return Ok(s);
        }
    }
}

fn quoted_identifier(input: &mut &str) -> ModalResult<String> {
    delimited('"', take_till(0.., '"'), '"')
        .map(str::to_owned)
        .parse_next(input)
}

fn exponent(input: &mut &str) -> ModalResult<()> {
    (one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)
        .void()
        .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f64> {
    alt((
        (digit1, opt(('.', digit0)), opt(exponent)).take(),
        ('.', digit1, opt(exponent)).take(),
    ))
    .try_map(|s: &str| s.parse::<f64>())
    .parse_next(input)
}

fn word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1, |c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '.'),
    )
        .take()
        .parse_next(input)
}

fn symbol<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((
        "<>", "<=", ">=", "!=", "||", "<", ">", "=", "+", "-", "*", "/", "(", ")", ",",
    ))
    .parse_next(input)
}

fn raw_token<'i>(input: &mut &'i str) -> ModalResult<RawToken<'i>> {
    alt((
        string_literal.map(RawToken::Str),
        quoted_identifier.map(RawToken::Quoted),
        number.map(RawToken::Number),
        word.map(RawToken::Word),
        symbol.map(RawToken::Symbol),
    ))
    .parse_next(input)
}

fn scan(raw: &str) -> Result<Vec<RawToken<'_>>, FilterSyntaxError> {
    let mut input = raw;
    let mut tokens = Vec::new();
    loop {
        input = input.trim_start();
        if input.is_empty() {
            return Ok(tokens);
        }
        let position = raw.len() - input.len();
        match raw_token.parse_next(&mut input) {
            Ok(token) => tokens.push(token),
            Err(_) => {
                let found = raw[position..].chars().next().unwrap_or_default();
                return Err(if found == '\'' || found == '"' {
                    FilterSyntaxError::UnterminatedString { position }
                } else {
                    FilterSyntaxError::UnexpectedCharacter { position, found }
                });
            }
        }
    }
}

// -- Classification ----------------------------------------------------------

fn is_word(tokens: &[RawToken<'_>], index: usize, expected: &str) -> bool {
    matches!(tokens.get(index), Some(RawToken::Word(w)) if w.eq_ignore_ascii_case(expected))
}

fn symbol_operator(symbol: &str, follows_operand: bool) -> Option<Operator> {
    Some(match symbol {
        "," => Operator::Comma,
        "+" if follows_operand => Operator::Add,
        "+" => Operator::Plus,
        "-" if follows_operand => Operator::Sub,
        "-" => Operator::Minus,
        "*" => Operator::Mul,
        "/" => Operator::Div,
        "=" => Operator::Eq,
        "<>" | "!=" => Operator::Neq,
        "<" => Operator::Lt,
        "<=" => Operator::Lte,
        ">" => Operator::Gt,
        ">=" => Operator::Gte,
        "||" => Operator::Concat,
        _ => return None,
    })
}

fn classify(tokens: &[RawToken<'_>]) -> Result<Vec<FilterNode>, FilterSyntaxError> {
    let mut nodes: Vec<FilterNode> = Vec::with_capacity(tokens.len());
    let mut depth = 0_usize;
    let mut i = 0;
    while i < tokens.len() {
        let follows_operand = nodes.last().is_some_and(FilterNode::ends_operand);
        let node = match &tokens[i] {
            RawToken::Str(s) => FilterNode::String(s.clone()),
            RawToken::Quoted(name) => FilterNode::Variable(name.clone()),
            RawToken::Number(n) => FilterNode::Number(*n),
            RawToken::Symbol("(") => {
                depth += 1;
                FilterNode::Open
            }
            RawToken::Symbol(")") => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(FilterSyntaxError::UnbalancedParentheses)?;
                FilterNode::Close
            }
            RawToken::Symbol(symbol) => FilterNode::Operator(
                symbol_operator(symbol, follows_operand)
                    .ok_or(FilterSyntaxError::Malformed("unknown operator"))?,
            ),
            RawToken::Word(word) => match word.to_ascii_lowercase().as_str() {
                "and" => FilterNode::Operator(Operator::And),
                "or" => FilterNode::Operator(Operator::Or),
                "like" => FilterNode::Operator(Operator::Like),
                "in" => FilterNode::Operator(Operator::In),
                "date" => FilterNode::Operator(Operator::Date),
                "null" => FilterNode::Null,
                "is" if is_word(tokens, i + 1, "not") => {
                    i += 1;
                    FilterNode::Operator(Operator::IsNot)
                }
                "is" => FilterNode::Operator(Operator::Is),
                "not" if follows_operand && is_word(tokens, i + 1, "in") => {
                    i += 1;
                    FilterNode::Operator(Operator::NotIn)
                }
                "not" if follows_operand && is_word(tokens, i + 1, "like") => {
                    i += 1;
                    FilterNode::Operator(Operator::NotLike)
                }
                "not" => FilterNode::Operator(Operator::Not),
                function @ ("upper" | "lower") => {
                    let (operator, name) = if function == "upper" {
                        (Operator::Upper, "upper")
                    } else {
                        (Operator::Lower, "lower")
                    };
                    if !matches!(tokens.get(i + 1), Some(RawToken::Symbol("("))) {
                        return Err(FilterSyntaxError::MissingFunctionParenthesis {
                            function: name,
                        });
                    }
                    FilterNode::Operator(operator)
                }
                _ => FilterNode::Variable((*word).to_owned()),
            },
        };
        nodes.push(node);
        i += 1;
    }
    if depth != 0 {
        return Err(FilterSyntaxError::UnbalancedParentheses);
    }
    Ok(nodes)
}

/// Split a raw filter string into classified nodes.
///
/// Keywords are case-insensitive and matched on word boundaries. `+`/`-`
/// directly after an operand are binary, otherwise unary.
///
/// # Errors
///
/// Returns [`FilterSyntaxError`] for unbalanced parentheses, unterminated
/// strings, unknown characters, or `upper`/`lower` without `(`.
pub fn tokenize(raw: &str) -> Result<Vec<FilterNode>, FilterSyntaxError> {
    let tokens = scan(raw)?;
    classify(&tokens)
}
