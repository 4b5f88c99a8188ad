//! User-facing diagnostics.
//!
//! Everything that can go wrong on behalf of user code (bad notation,
//! evaluation failures, blown tick budgets, sink refusals) becomes a
//! `Diag` delivered over a channel. Nothing in the engine panics across
//! a tick boundary.

use std::fmt;
use thiserror::Error;
use weft_mini::MiniError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    /// Malformed mini notation.
    Parse,
    /// Host-language evaluation failure, including panicking queries.
    Eval,
    /// A combinator met a value it cannot work with.
    Type,
    /// A pattern query outran the tick budget; its window was skipped.
    Timing,
    /// The output sink rejected an event.
    Sink,
}

impl fmt::Display for DiagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagKind::Parse => "parse",
            DiagKind::Eval => "eval",
            DiagKind::Type => "type",
            DiagKind::Timing => "timing",
            DiagKind::Sink => "sink",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error: {message}")]
pub struct Diag {
    pub kind: DiagKind,
    pub message: String,
    /// Byte range into the originating source, when known.
    pub span: Option<(usize, usize)>,
}

impl Diag {
    pub fn new(kind: DiagKind, message: impl Into<String>) -> Self {
        Diag {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Diag::new(DiagKind::Parse, message)
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Diag::new(DiagKind::Eval, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Diag::new(DiagKind::Type, message)
    }

    pub fn timing(message: impl Into<String>) -> Self {
        Diag::new(DiagKind::Timing, message)
    }

    pub fn sink(message: impl Into<String>) -> Self {
        Diag::new(DiagKind::Sink, message)
    }
}

impl From<MiniError> for Diag {
    fn from(err: MiniError) -> Self {
        let span = err.span();
        let mut diag = Diag::parse(err.to_string());
        if let Some(s) = span {
            diag = diag.with_span(s.start, s.end);
        }
        diag
    }
}
