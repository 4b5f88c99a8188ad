//! Recursive-descent parser for the mini notation.
//!
//! Grammar sketch (one cycle per expression):
//!
//! ```text
//! rows      := seq ( (',' seq)* | ('|' seq)* )
//! seq       := step+
//! step      := term modifier*
//! term      := NAME | NUMBER | '~' | '-'
//!            | '[' rows ']'
//!            | '{' seq (',' seq)* '}' ('%' term)?
//!            | '<' seq (',' seq)* '>'
//! modifier  := '*' term | '/' term
//!            | '(' step ',' step (',' step)? ')'
//!            | '@' NUMBER | '!' NUMBER? | '?' | '??' NUMBER
//!            | ':' (NAME | NUMBER)
//! ```
//!
//! `,` layers rows, `|` picks one row per cycle. The parser hands every
//! random construct (`|`, `?`) a fresh stream id so queries replay
//! deterministically.

use crate::ast::*;
use crate::error::{MiniError, Result};
use crate::lexer::{Lexer, Token};
use crate::span::Span;

pub struct Parser<'source> {
    lexer: Lexer<'source>,
    seed_counter: u64,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            seed_counter: 0,
        }
    }

    /// Parse a complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Node> {
        let node = self.parse_rows()?;
        match self.peek() {
            None => Ok(node),
            Some((token, span)) => Err(MiniError::unexpected(
                "end of input",
                token.to_string(),
                span,
            )),
        }
    }

    fn next_seed(&mut self) -> u64 {
        let seed = self.seed_counter;
        self.seed_counter += 1;
        seed
    }

    /// Comma- or pipe-separated rows of sequences.
    fn parse_rows(&mut self) -> Result<Node> {
        let first = self.parse_sequence()?;

        let shape = match self.peek() {
            Some((Token::Comma, _)) => GroupShape::Stack,
            Some((Token::Pipe, _)) => GroupShape::Choice,
            _ => return Ok(first),
        };
        let separator = match shape {
            GroupShape::Stack => Token::Comma,
            _ => Token::Pipe,
        };

        let mut children = vec![first];
        while let Some((token, _)) = self.peek() {
            if token != separator {
                break;
            }
            self.advance();
            children.push(self.parse_sequence()?);
        }

        let span = children
            .first()
            .map(|n| n.span)
            .unwrap_or(Span::new(0, 0))
            .merge(children.last().map(|n| n.span).unwrap_or(Span::new(0, 0)));

        let mut group = GroupNode::new(shape, children);
        if shape == GroupShape::Choice {
            group.choice_seed = Some(self.next_seed());
        }
        Ok(Node::new(NodeKind::Group(group), span))
    }

    /// A space-separated run of steps.
    fn parse_sequence(&mut self) -> Result<Node> {
        let mut steps = Vec::new();

        loop {
            match self.peek() {
                None => break,
                Some((token, _)) if is_sequence_end(&token) => break,
                Some(_) => steps.push(self.parse_step()?),
            }
        }

        if steps.is_empty() {
            return match self.peek() {
                None => Err(MiniError::eof("a pattern step")),
                Some((token, span)) => Err(MiniError::unexpected(
                    "a pattern step",
                    token.to_string(),
                    span,
                )),
            };
        }

        let span = steps[0].span.merge(steps[steps.len() - 1].span);
        Ok(Node::new(
            NodeKind::Group(GroupNode::new(GroupShape::Cat, steps)),
            span,
        ))
    }

    /// A term plus its trailing modifiers, weight and replication.
    fn parse_step(&mut self) -> Result<Node> {
        let source = self.parse_term()?;
        let start = source.span;
        let mut step = StepNode::new(source);
        let mut end = start;

        loop {
            let Some((token, span)) = self.peek() else { break };
            match token {
                Token::Star => {
                    self.advance();
                    let amount = self.parse_term()?;
                    end = amount.span;
                    step.modifiers.push(Modifier::Fast(Box::new(amount)));
                }
                Token::Slash => {
                    self.advance();
                    let amount = self.parse_term()?;
                    end = amount.span;
                    step.modifiers.push(Modifier::Slow(Box::new(amount)));
                }
                Token::LParen => {
                    self.advance();
                    let pulses = self.parse_step()?;
                    self.expect(Token::Comma)?;
                    let steps = self.parse_step()?;
                    let rotation = if let Some((Token::Comma, _)) = self.peek() {
                        self.advance();
                        Some(Box::new(self.parse_step()?))
                    } else {
                        None
                    };
                    end = self.expect(Token::RParen)?;
                    step.modifiers.push(Modifier::Euclid {
                        pulses: Box::new(pulses),
                        steps: Box::new(steps),
                        rotation,
                    });
                }
                Token::At => {
                    self.advance();
                    match self.next() {
                        Some((Token::Number(w), wspan)) => {
                            step.weight = w;
                            end = wspan;
                        }
                        Some((other, ospan)) => {
                            return Err(MiniError::unexpected(
                                "a weight after '@'",
                                other.to_string(),
                                ospan,
                            ))
                        }
                        None => return Err(MiniError::eof("a weight after '@'")),
                    }
                }
                Token::Bang => {
                    self.advance();
                    end = span;
                    if let Some((Token::Number(n), nspan)) = self.peek() {
                        self.advance();
                        if n < 1.0 || n.fract() != 0.0 {
                            return Err(MiniError::modifier(
                                "replicate count must be a positive integer",
                                nspan,
                            ));
                        }
                        step.replicate = n as usize;
                        end = nspan;
                    } else {
                        step.replicate += 1;
                    }
                }
                Token::Question => {
                    self.advance();
                    end = span;
                    let seed = self.next_seed();
                    step.modifiers.push(Modifier::Degrade { amount: 0.5, seed });
                }
                Token::DoubleQuestion => {
                    self.advance();
                    match self.next() {
                        Some((Token::Number(p), pspan)) => {
                            if !(0.0..=1.0).contains(&p) {
                                return Err(MiniError::modifier(
                                    "drop probability must be between 0 and 1",
                                    pspan,
                                ));
                            }
                            end = pspan;
                            let seed = self.next_seed();
                            step.modifiers.push(Modifier::Degrade { amount: p, seed });
                        }
                        Some((other, ospan)) => {
                            return Err(MiniError::unexpected(
                                "a probability after '??'",
                                other.to_string(),
                                ospan,
                            ))
                        }
                        None => return Err(MiniError::eof("a probability after '??'")),
                    }
                }
                Token::Colon => {
                    self.advance();
                    match self.next() {
                        Some((Token::Number(n), nspan)) => {
                            end = nspan;
                            step.modifiers.push(Modifier::Select(SelectArg::Index(n)));
                        }
                        Some((Token::Name, nspan)) => {
                            end = nspan;
                            let name = self.lexer.slice(nspan).to_string();
                            step.modifiers.push(Modifier::Select(SelectArg::Name(name)));
                        }
                        Some((other, ospan)) => {
                            return Err(MiniError::unexpected(
                                "a name or index after ':'",
                                other.to_string(),
                                ospan,
                            ))
                        }
                        None => return Err(MiniError::eof("a name or index after ':'")),
                    }
                }
                _ => break,
            }
        }

        let span = start.merge(end);
        Ok(Node::new(NodeKind::Step(step), span))
    }

    fn parse_term(&mut self) -> Result<Node> {
        match self.peek() {
            Some((Token::LBracket, open)) => {
                self.advance();
                let inner = self.parse_rows()?;
                let close = self.close(Token::RBracket, '[', open)?;
                Ok(Node::new(inner.kind, open.merge(close)))
            }
            Some((Token::LBrace, open)) => self.parse_polymeter(open),
            Some((Token::LAngle, open)) => self.parse_alternate(open),
            Some((Token::Tilde | Token::Dash, span)) => {
                self.advance();
                Ok(Node::rest(span))
            }
            Some((Token::Number(n), span)) => {
                self.advance();
                Ok(Node::number(n, span))
            }
            Some((Token::Name, span)) => {
                self.advance();
                Ok(Node::name(self.lexer.slice(span), span))
            }
            Some((token, span)) => Err(MiniError::unexpected(
                "a name, number, rest or group",
                token.to_string(),
                span,
            )),
            None => Err(MiniError::eof("a name, number, rest or group")),
        }
    }

    /// `{seq, seq, ...}` with an optional `%steps`.
    fn parse_polymeter(&mut self, open: Span) -> Result<Node> {
        self.advance();
        let mut rows = vec![self.parse_sequence()?];
        while let Some((Token::Comma, _)) = self.peek() {
            self.advance();
            rows.push(self.parse_sequence()?);
        }
        let mut end = self.close(Token::RBrace, '{', open)?;

        let mut group = GroupNode::new(GroupShape::Polymeter, rows);
        if let Some((Token::Percent, _)) = self.peek() {
            self.advance();
            let steps = self.parse_term()?;
            end = steps.span;
            group.steps = Some(Box::new(steps));
        }
        Ok(Node::new(NodeKind::Group(group), open.merge(end)))
    }

    /// `<step step ...>`, with comma-separated rows layering.
    fn parse_alternate(&mut self, open: Span) -> Result<Node> {
        self.advance();
        let mut rows = vec![self.parse_sequence()?];
        while let Some((Token::Comma, _)) = self.peek() {
            self.advance();
            rows.push(self.parse_sequence()?);
        }
        let close = self.close(Token::RAngle, '<', open)?;
        let span = open.merge(close);

        let alternates: Vec<Node> = rows
            .into_iter()
            .map(|row| {
                let row_span = row.span;
                let children = match row.kind {
                    NodeKind::Group(g) if g.shape == GroupShape::Cat => g.children,
                    other => vec![Node::new(other, row_span)],
                };
                Node::new(
                    NodeKind::Group(GroupNode::new(GroupShape::Alternate, children)),
                    row_span,
                )
            })
            .collect();

        if alternates.len() == 1 {
            let only = alternates.into_iter().next().expect("len checked");
            Ok(Node::new(only.kind, span))
        } else {
            Ok(Node::new(
                NodeKind::Group(GroupNode::new(GroupShape::Stack, alternates)),
                span,
            ))
        }
    }

    // Helpers

    fn peek(&mut self) -> Option<(Token, Span)> {
        self.lexer.peek_token()
    }

    fn next(&mut self) -> Option<(Token, Span)> {
        self.lexer.next_token()
    }

    fn advance(&mut self) {
        let _ = self.lexer.next_token();
    }

    fn expect(&mut self, expected: Token) -> Result<Span> {
        match self.next() {
            Some((token, span)) if token == expected => Ok(span),
            Some((token, span)) => Err(MiniError::unexpected(
                expected.to_string(),
                token.to_string(),
                span,
            )),
            None => Err(MiniError::eof(expected.to_string())),
        }
    }

    /// Like `expect` for closing delimiters, reporting the opener when
    /// the input ran out.
    fn close(&mut self, expected: Token, delimiter: char, open: Span) -> Result<Span> {
        match self.next() {
            Some((token, span)) if token == expected => Ok(span),
            Some((token, span)) => Err(MiniError::unexpected(
                expected.to_string(),
                token.to_string(),
                span,
            )),
            None => Err(MiniError::unclosed(delimiter, open)),
        }
    }
}

fn is_sequence_end(token: &Token) -> bool {
    matches!(
        token,
        Token::Comma
            | Token::Pipe
            | Token::RBracket
            | Token::RBrace
            | Token::RAngle
            | Token::RParen
            | Token::Percent
    )
}

/// Parse one mini-notation expression into its syntax tree.
pub fn parse(source: &str) -> Result<Node> {
    Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat_children(node: &Node) -> &[Node] {
        match &node.kind {
            NodeKind::Group(g) if g.shape == GroupShape::Cat => &g.children,
            other => panic!("expected cat group, got {:?}", other),
        }
    }

    fn step(node: &Node) -> &StepNode {
        match &node.kind {
            NodeKind::Step(s) => s,
            other => panic!("expected step, got {:?}", other),
        }
    }

    #[test]
    fn single_name() {
        let ast = parse("bd").unwrap();
        let children = cat_children(&ast);
        assert_eq!(children.len(), 1);
        assert_eq!(
            *step(&children[0]).source,
            Node::name("bd", Span::new(0, 2))
        );
    }

    #[test]
    fn sequence_of_names() {
        let ast = parse("bd sd cp").unwrap();
        assert_eq!(cat_children(&ast).len(), 3);
        assert_eq!(ast.span, Span::new(0, 8));
    }

    #[test]
    fn rests_parse_to_rest_nodes() {
        let ast = parse("~ bd -").unwrap();
        let children = cat_children(&ast);
        assert!(matches!(step(&children[0]).source.kind, NodeKind::Rest));
        assert!(matches!(step(&children[2]).source.kind, NodeKind::Rest));
    }

    #[test]
    fn bracket_groups_nest() {
        let ast = parse("bd [sd cp]").unwrap();
        let children = cat_children(&ast);
        assert_eq!(children.len(), 2);
        let inner = &step(&children[1]).source;
        assert_eq!(cat_children(inner).len(), 2);
        // the group's span covers the brackets
        assert_eq!(inner.span, Span::new(3, 10));
    }

    #[test]
    fn fast_modifier() {
        let ast = parse("bd*2").unwrap();
        let children = cat_children(&ast);
        let s = step(&children[0]);
        assert_eq!(s.modifiers.len(), 1);
        assert!(matches!(s.modifiers[0], Modifier::Fast(_)));
    }

    #[test]
    fn modifiers_chain() {
        let ast = parse("bd*2?").unwrap();
        let s = step(&cat_children(&ast)[0]);
        assert_eq!(s.modifiers.len(), 2);
        assert!(matches!(s.modifiers[1], Modifier::Degrade { amount, .. } if amount == 0.5));
    }

    #[test]
    fn degrade_with_probability() {
        let ast = parse("bd??0.25").unwrap();
        let s = step(&cat_children(&ast)[0]);
        assert!(matches!(
            s.modifiers[0],
            Modifier::Degrade { amount, .. } if amount == 0.25
        ));
    }

    #[test]
    fn degrade_seeds_are_distinct() {
        let ast = parse("bd? sd?").unwrap();
        let children = cat_children(&ast);
        let a = match step(&children[0]).modifiers[0] {
            Modifier::Degrade { seed, .. } => seed,
            _ => unreachable!(),
        };
        let b = match step(&children[1]).modifiers[0] {
            Modifier::Degrade { seed, .. } => seed,
            _ => unreachable!(),
        };
        assert_ne!(a, b);
    }

    #[test]
    fn euclid_modifier() {
        let ast = parse("bd(3,8)").unwrap();
        let s = step(&cat_children(&ast)[0]);
        assert!(matches!(s.modifiers[0], Modifier::Euclid { .. }));
    }

    #[test]
    fn euclid_with_rotation() {
        let ast = parse("bd(3,8,2)").unwrap();
        let s = step(&cat_children(&ast)[0]);
        match &s.modifiers[0] {
            Modifier::Euclid { rotation, .. } => assert!(rotation.is_some()),
            other => panic!("expected euclid, got {:?}", other),
        }
    }

    #[test]
    fn weight_and_replicate() {
        let ast = parse("bd@3 sd!2 cp!").unwrap();
        let children = cat_children(&ast);
        assert_eq!(step(&children[0]).weight, 3.0);
        assert_eq!(step(&children[1]).replicate, 2);
        assert_eq!(step(&children[2]).replicate, 2);
    }

    #[test]
    fn select_modifier() {
        let ast = parse("bd:3 sd:room").unwrap();
        let children = cat_children(&ast);
        assert!(matches!(
            step(&children[0]).modifiers[0],
            Modifier::Select(SelectArg::Index(n)) if n == 3.0
        ));
        assert!(matches!(
            &step(&children[1]).modifiers[0],
            Modifier::Select(SelectArg::Name(n)) if n == "room"
        ));
    }

    #[test]
    fn stack_rows() {
        let ast = parse("bd sd, hh hh hh").unwrap();
        match &ast.kind {
            NodeKind::Group(g) => {
                assert_eq!(g.shape, GroupShape::Stack);
                assert_eq!(g.children.len(), 2);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn choice_rows_take_a_seed() {
        let ast = parse("bd | sd | cp").unwrap();
        match &ast.kind {
            NodeKind::Group(g) => {
                assert_eq!(g.shape, GroupShape::Choice);
                assert_eq!(g.children.len(), 3);
                assert!(g.choice_seed.is_some());
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn polymeter_with_steps() {
        let ast = parse("{bd sd, hh oh cp}%4").unwrap();
        match &ast.kind {
            NodeKind::Group(g) => {
                assert_eq!(g.shape, GroupShape::Polymeter);
                assert_eq!(g.children.len(), 2);
                assert!(g.steps.is_some());
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn alternate_group() {
        let ast = parse("<bd sd cp>").unwrap();
        match &ast.kind {
            NodeKind::Group(g) => {
                assert_eq!(g.shape, GroupShape::Alternate);
                assert_eq!(g.children.len(), 3);
            }
            other => panic!("expected group, got {:?}", other),
        }
    }

    #[test]
    fn errors_carry_positions() {
        let err = parse("bd @").unwrap_err();
        assert!(matches!(err, MiniError::UnexpectedEnd { .. }));
        let err = parse("[bd sd").unwrap_err();
        assert_eq!(err, MiniError::unclosed('[', Span::new(0, 1)));
        let err = parse("bd )").unwrap_err();
        assert!(matches!(err, MiniError::UnexpectedToken { .. }));
        assert_eq!(err.span(), Some(Span::new(3, 4)));
    }

    #[test]
    fn whitespace_and_comments_do_not_change_structure() {
        let plain = parse("bd [sd cp]*2").unwrap();
        let spaced = parse("bd    [sd cp]*2 // trailing words").unwrap();
        // Shapes match even though spans differ.
        assert_eq!(cat_children(&plain).len(), cat_children(&spaced).len());
        let a = step(&cat_children(&plain)[1]);
        let b = step(&cat_children(&spaced)[1]);
        assert_eq!(a.modifiers.len(), b.modifiers.len());
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(parse("bd ]").is_err());
        assert!(parse("").is_err());
    }
}
