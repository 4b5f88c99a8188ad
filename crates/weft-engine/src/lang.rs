//! The host expression language.
//!
//! A small s-expression surface over the combinator vocabulary:
//!
//! ```text
//! (fast 2 "bd [sd cp]")            ; bare strings are mini notation
//! (stack (s "bd sd") (n "0 3 7"))  ; or use [a, b] stack sugar
//! (every 3 rev "bd sd hh cp")      ; transform names are values
//! (off 0.25 (fast 2) "bd sd")     ; partially applied transforms too
//! ```
//!
//! Evaluation happens against a [`crate::registry::Registry`] scope.
//! Every failure is a [`Diag`]; user code cannot panic the engine.

use crate::diag::Diag;
use crate::registry::Registry;
use std::fmt;
use std::sync::Arc;
use weft_core::{pure, Pattern, Rational, Value};

/// A transformation from pattern to pattern, as a first-class value.
pub type Transform = Arc<dyn Fn(Pattern) -> Result<Pattern, Diag> + Send + Sync>;

/// Values the language evaluates to.
#[derive(Clone)]
pub enum LangValue {
    Number(f64),
    Str(String),
    Pattern(Pattern),
    Transform(Transform),
}

impl fmt::Debug for LangValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LangValue::Number(n) => write!(f, "number {}", n),
            LangValue::Str(s) => write!(f, "string {:?}", s),
            LangValue::Pattern(_) => write!(f, "pattern"),
            LangValue::Transform(_) => write!(f, "transform"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Number(f64),
    Str(String),
    Symbol(String),
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, Diag> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            ';' => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            '[' => {
                tokens.push(Token::LBracket);
                chars.next();
            }
            ']' => {
                tokens.push(Token::RBracket);
                chars.next();
            }
            ',' => {
                tokens.push(Token::Comma);
                chars.next();
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some((_, escaped)) = chars.next() {
                                match escaped {
                                    'n' => text.push('\n'),
                                    't' => text.push('\t'),
                                    other => text.push(other),
                                }
                            }
                        }
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(Diag::eval("unterminated string literal")
                        .with_span(pos, input.len()));
                }
                tokens.push(Token::Str(text));
            }
            _ if c.is_ascii_digit()
                || (c == '-'
                    && matches!(chars.clone().nth(1), Some((_, d)) if d.is_ascii_digit())) =>
            {
                let mut number = String::new();
                if c == '-' {
                    number.push(c);
                    chars.next();
                }
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        number.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let parsed = number.parse().map_err(|_| {
                    Diag::eval(format!("bad number literal {:?}", number))
                        .with_span(pos, pos + number.len())
                })?;
                tokens.push(Token::Number(parsed));
            }
            _ if is_symbol_char(c) => {
                let mut symbol = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if is_symbol_char(c) {
                        symbol.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Symbol(symbol));
            }
            other => {
                return Err(
                    Diag::eval(format!("unexpected character {:?}", other))
                        .with_span(pos, pos + other.len_utf8()),
                );
            }
        }
    }

    Ok(tokens)
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '_' | '-' | '+' | '*' | '/' | '!' | '?' | '<' | '>' | '=' | ':' | '.' | '~' | '#' | '%'
        )
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Symbol(String),
    List(Vec<Expr>),
}

/// Parse a single expression; trailing tokens are an error.
pub fn parse(tokens: &[Token]) -> Result<Expr, Diag> {
    let mut pos = 0;
    let expr = parse_expr(tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(Diag::eval("trailing input after expression"));
    }
    Ok(expr)
}

fn parse_expr(tokens: &[Token], pos: &mut usize) -> Result<Expr, Diag> {
    let Some(token) = tokens.get(*pos) else {
        return Err(Diag::eval("unexpected end of input"));
    };

    match token {
        Token::Number(n) => {
            *pos += 1;
            Ok(Expr::Number(*n))
        }
        Token::Str(s) => {
            *pos += 1;
            Ok(Expr::Str(s.clone()))
        }
        Token::Symbol(s) => {
            *pos += 1;
            Ok(Expr::Symbol(s.clone()))
        }
        Token::LParen => {
            *pos += 1;
            let mut items = Vec::new();
            while tokens.get(*pos) != Some(&Token::RParen) {
                if *pos >= tokens.len() {
                    return Err(Diag::eval("unclosed parenthesis"));
                }
                items.push(parse_expr(tokens, pos)?);
            }
            *pos += 1;
            Ok(Expr::List(items))
        }
        Token::LBracket => {
            // [a, b, c] sugars to (stack a b c).
            *pos += 1;
            let mut items = vec![Expr::Symbol("stack".to_string())];
            loop {
                match tokens.get(*pos) {
                    Some(Token::RBracket) => {
                        *pos += 1;
                        break;
                    }
                    Some(Token::Comma) => {
                        *pos += 1;
                    }
                    Some(_) => items.push(parse_expr(tokens, pos)?),
                    None => return Err(Diag::eval("unclosed bracket")),
                }
            }
            Ok(Expr::List(items))
        }
        Token::RParen | Token::RBracket | Token::Comma => {
            Err(Diag::eval(format!("unexpected {:?}", token)))
        }
    }
}

/// Evaluate an expression against a registry scope.
pub fn eval(registry: &Registry, expr: &Expr) -> Result<LangValue, Diag> {
    match expr {
        Expr::Number(n) => Ok(LangValue::Number(*n)),
        Expr::Str(s) => Ok(LangValue::Str(s.clone())),
        Expr::Symbol(name) => registry.resolve(name),
        Expr::List(items) => {
            let Some(head) = items.first() else {
                return Err(Diag::eval("empty application ()"));
            };
            let Expr::Symbol(name) = head else {
                return Err(Diag::eval("application head must be a name"));
            };
            let args: Result<Vec<LangValue>, Diag> =
                items[1..].iter().map(|e| eval(registry, e)).collect();
            registry.apply(name, args?)
        }
    }
}

// Coercions shared by builtins.

pub fn as_pattern(registry: &Registry, value: LangValue) -> Result<Pattern, Diag> {
    match value {
        LangValue::Pattern(p) => Ok(p),
        LangValue::Str(s) => registry.reify(&s),
        LangValue::Number(n) => Ok(pure(Value::Number(n))),
        LangValue::Transform(_) => Err(Diag::eval(
            "expected a pattern, found a transform",
        )),
    }
}

pub fn as_number(value: &LangValue) -> Result<f64, Diag> {
    match value {
        LangValue::Number(n) => Ok(*n),
        other => Err(Diag::eval(format!("expected a number, found {:?}", other))),
    }
}

pub fn as_rational(value: &LangValue) -> Result<Rational, Diag> {
    Ok(Rational::approximate(as_number(value)?))
}

/// A non-zero rational, for speed factors.
pub fn as_factor(value: &LangValue) -> Result<Rational, Diag> {
    let factor = as_rational(value)?;
    if factor.is_zero() {
        return Err(Diag::eval("speed factor must not be zero"));
    }
    Ok(factor)
}

pub fn as_integer(value: &LangValue) -> Result<i64, Diag> {
    let n = as_number(value)?;
    if n.fract() != 0.0 {
        return Err(Diag::eval(format!("expected a whole number, found {}", n)));
    }
    Ok(n as i64)
}

pub fn as_transform(value: LangValue) -> Result<Transform, Diag> {
    match value {
        LangValue::Transform(t) => Ok(t),
        other => Err(Diag::eval(format!(
            "expected a transform, found {:?}",
            other
        ))),
    }
}

pub fn as_name(value: &LangValue) -> Result<String, Diag> {
    match value {
        LangValue::Str(s) => Ok(s.clone()),
        other => Err(Diag::eval(format!("expected a name, found {:?}", other))),
    }
}
