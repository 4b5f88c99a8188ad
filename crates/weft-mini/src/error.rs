//! Parse and lowering errors.
//!
//! The parser never panics on input: every failure is a `MiniError`
//! carrying a position so editors can point at the offending token.

use crate::span::Span;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MiniError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MiniError {
    #[error("expected {expected}, found {found} at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("unclosed '{delimiter}' opened at {span}")]
    UnclosedDelimiter { delimiter: char, span: Span },

    #[error("{message} at {span}")]
    BadModifier { message: String, span: Span },
}

impl MiniError {
    pub fn unexpected(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        MiniError::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn eof(expected: impl Into<String>) -> Self {
        MiniError::UnexpectedEnd {
            expected: expected.into(),
        }
    }

    pub fn unclosed(delimiter: char, span: Span) -> Self {
        MiniError::UnclosedDelimiter { delimiter, span }
    }

    pub fn modifier(message: impl Into<String>, span: Span) -> Self {
        MiniError::BadModifier {
            message: message.into(),
            span,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            MiniError::UnexpectedToken { span, .. } => Some(*span),
            MiniError::UnexpectedEnd { .. } => None,
            MiniError::UnclosedDelimiter { span, .. } => Some(*span),
            MiniError::BadModifier { span, .. } => Some(*span),
        }
    }
}
