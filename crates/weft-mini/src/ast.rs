//! Mini-notation syntax tree.
//!
//! Every node carries the byte span it was parsed from; the evaluator
//! forwards spans into hap contexts so editors can highlight the tokens
//! behind the events they hear.

use crate::span::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { kind, span }
    }

    pub fn rest(span: Span) -> Self {
        Node::new(NodeKind::Rest, span)
    }

    pub fn number(n: f64, span: Span) -> Self {
        Node::new(NodeKind::Number(n), span)
    }

    pub fn name(s: impl Into<String>, span: Span) -> Self {
        Node::new(NodeKind::Name(s.into()), span)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// `~` or `-`: silence for one step.
    Rest,
    Number(f64),
    Name(String),
    Group(GroupNode),
    Step(StepNode),
}

/// How a group's children share the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupShape {
    /// Space-separated sequence packed into one cycle.
    Cat,
    /// Comma-separated layers playing at once.
    Stack,
    /// Pipe-separated alternatives, one picked per cycle.
    Choice,
    /// `{...}` rows sharing a step grid.
    Polymeter,
    /// `<...>`: one child per cycle.
    Alternate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupNode {
    pub shape: GroupShape,
    pub children: Vec<Node>,
    /// `%n` on a polymeter: the target step count.
    pub steps: Option<Box<Node>>,
    /// Random stream id for `Choice` groups, fixed at parse time.
    pub choice_seed: Option<u64>,
}

impl GroupNode {
    pub fn new(shape: GroupShape, children: Vec<Node>) -> Self {
        GroupNode {
            shape,
            children,
            steps: None,
            choice_seed: None,
        }
    }
}

/// One element of a sequence: a source with modifiers, a weight (`@`)
/// and a replicate count (`!`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepNode {
    pub source: Box<Node>,
    pub modifiers: Vec<Modifier>,
    pub weight: f64,
    pub replicate: usize,
}

impl StepNode {
    pub fn new(source: Node) -> Self {
        StepNode {
            source: Box::new(source),
            modifiers: Vec::new(),
            weight: 1.0,
            replicate: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// `*e`
    Fast(Box<Node>),
    /// `/e`
    Slow(Box<Node>),
    /// `(k,n,r?)`
    Euclid {
        pulses: Box<Node>,
        steps: Box<Node>,
        rotation: Option<Box<Node>>,
    },
    /// `?` / `??p`, with a parse-time random stream id.
    Degrade { amount: f64, seed: u64 },
    /// `:x`, a sample index or bank name.
    Select(SelectArg),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectArg {
    Index(f64),
    Name(String),
}
