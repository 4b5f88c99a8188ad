//! Mini-notation lexer, built on logos.

use crate::span::Span;
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", parse_number, priority = 10)]
    Number(f64),

    // Names start with a letter; digits, dashes and underscores may
    // follow (`bd`, `hh-open`, `feel_2`).
    #[regex(r"[a-zA-Z][a-zA-Z0-9_-]*", priority = 5)]
    Name,

    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,

    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("@")]
    At,
    #[token("!")]
    Bang,
    #[token("??")]
    DoubleQuestion,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("%")]
    Percent,

    #[token("~")]
    Tilde,
    #[token("-")]
    Dash,

    // Catch-all so junk input surfaces as a reportable token instead
    // of a lexer-level failure.
    #[regex(r".", priority = 0)]
    Error,
}

fn parse_number(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Token::Number(n) => return write!(f, "number {}", n),
            Token::Name => "name",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LAngle => "<",
            Token::RAngle => ">",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::Comma => ",",
            Token::Pipe => "|",
            Token::Star => "*",
            Token::Slash => "/",
            Token::At => "@",
            Token::Bang => "!",
            Token::DoubleQuestion => "??",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Percent => "%",
            Token::Tilde => "~",
            Token::Dash => "-",
            Token::Error => "invalid input",
        };
        write!(f, "{}", text)
    }
}

/// Peekable lexer with byte spans and access to the source slice.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<(Token, Span)>>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Lexer {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    pub fn next_token(&mut self) -> Option<(Token, Span)> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }
        let token = self.inner.next()?;
        let span = Span::from(self.inner.span());
        Some((token.unwrap_or(Token::Error), span))
    }

    pub fn peek_token(&mut self) -> Option<(Token, Span)> {
        if self.peeked.is_none() {
            let next = {
                let token = self.inner.next();
                token.map(|t| (t.unwrap_or(Token::Error), Span::from(self.inner.span())))
            };
            self.peeked = Some(next);
        }
        self.peeked.as_ref().and_then(|x| x.clone())
    }

    pub fn source(&self) -> &'source str {
        self.inner.source()
    }

    pub fn slice(&self, span: Span) -> &'source str {
        &self.source()[span.to_range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some((token, _)) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn names_and_rests() {
        assert_eq!(
            lex("bd ~ hh-open -"),
            vec![Token::Name, Token::Tilde, Token::Name, Token::Dash]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            lex("1 2.5 -3 4e2"),
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(-3.0),
                Token::Number(400.0),
            ]
        );
    }

    #[test]
    fn modifier_operators() {
        assert_eq!(
            lex("bd*2 sd@3 cp? hh??0.3 oh:2"),
            vec![
                Token::Name,
                Token::Star,
                Token::Number(2.0),
                Token::Name,
                Token::At,
                Token::Number(3.0),
                Token::Name,
                Token::Question,
                Token::Name,
                Token::DoubleQuestion,
                Token::Number(0.3),
                Token::Name,
                Token::Colon,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn double_question_beats_single() {
        assert_eq!(lex("??"), vec![Token::DoubleQuestion]);
        assert_eq!(lex("? ?"), vec![Token::Question, Token::Question]);
    }

    #[test]
    fn groups_and_separators() {
        assert_eq!(
            lex("{bd sd, cp}%4 <a b> [x,y] (3,8,1)"),
            vec![
                Token::LBrace,
                Token::Name,
                Token::Name,
                Token::Comma,
                Token::Name,
                Token::RBrace,
                Token::Percent,
                Token::Number(4.0),
                Token::LAngle,
                Token::Name,
                Token::Name,
                Token::RAngle,
                Token::LBracket,
                Token::Name,
                Token::Comma,
                Token::Name,
                Token::RBracket,
                Token::LParen,
                Token::Number(3.0),
                Token::Comma,
                Token::Number(8.0),
                Token::Comma,
                Token::Number(1.0),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(lex("bd // the kick\nsd"), vec![Token::Name, Token::Name]);
    }

    #[test]
    fn spans_slice_the_source() {
        let mut lexer = Lexer::new("bd sd");
        let (_, span) = lexer.next_token().unwrap();
        assert_eq!(lexer.slice(span), "bd");
        let (_, span) = lexer.next_token().unwrap();
        assert_eq!(lexer.slice(span), "sd");
    }

    #[test]
    fn peek_does_not_consume() {
        let mut lexer = Lexer::new("bd sd");
        let (a, _) = lexer.peek_token().unwrap();
        let (b, _) = lexer.peek_token().unwrap();
        assert_eq!(a, b);
        assert!(lexer.next_token().is_some());
        assert!(lexer.next_token().is_some());
        assert!(lexer.next_token().is_none());
    }
}
