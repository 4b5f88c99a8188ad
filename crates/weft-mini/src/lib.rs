//! Mini-notation front end for Weft patterns.
//!
//! The mini notation is a compact rhythm language: `bd [sd cp]*2` packs
//! a kick and a doubled snare/clap group into one cycle. This crate
//! lexes, parses, formats and lowers it to [`weft_core::Pattern`]
//! values, attaching source spans so editors can highlight playing
//! events.
//!
//! ```
//! let pat = weft_mini::pattern("bd [sd cp]*2").unwrap();
//! assert_eq!(pat.first_cycle().len(), 5);
//! ```
//!
//! Syntax overview:
//!
//! - sequences: `bd sd cp`, rests: `~` / `-`
//! - grouping: `[bd sd]`, layering: `a, b`, choice per cycle: `a | b`
//! - alternation: `<a b c>`, polymeter: `{a b, c d e}` (`%n` sets steps)
//! - modifiers: `*2` `/2` `(3,8,1)` `@3` `!2` `?` `??0.3` `:3`

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod span;

pub use ast::{GroupNode, GroupShape, Modifier, Node, NodeKind, SelectArg, StepNode};
pub use error::{MiniError, Result};
pub use evaluator::{lower, pattern};
pub use formatter::format;
pub use lexer::{Lexer, Token};
pub use parser::{parse, Parser};
pub use span::Span;
