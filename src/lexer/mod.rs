//! Longest-match, priority-ordered tokenizer for Amy source files.
//!
//! Rules are tried in the priority order spec'd for the language: keywords
//! before identifiers, multi-character operators before their single-char
//! prefixes, and so on. Each file is lexed independently; positions never
//! carry over between files.

use crate::diagnostics::{Position, Span};

const KEYWORDS: &[&str] = &[
    "abstract", "case", "class", "def", "else", "extends", "if", "match", "object", "val",
    "error",
];

const PRIMITIVE_TYPES: &[&str] = &["Int", "String", "Boolean", "Unit"];

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(String),
    PrimitiveType(String),
    BoolLiteral(bool),
    Identifier(String),
    IntLiteral(i32),
    StringLiteral(String),
    Operator(String),
    Delimiter(String),
    /// `_` used as a wildcard pattern; lexed as its own keyword-ish terminal
    /// since it appears in both keyword position (spec §4.1 rule 1) and the
    /// pattern grammar.
    Underscore,
    Comment,
    Whitespace,
    Error(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Comment | TokenKind::Whitespace)
    }
}

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.span.render(&self.message))
    }
}

impl std::error::Error for LexError {}

pub type LexResult<T> = Result<T, LexError>;

/// Lexes one source file into a positioned, trivia-free token stream ending
/// in exactly one [`TokenKind::Eof`].
pub struct Lexer<'a> {
    input: &'a [u8],
    file: String,
    position: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file: impl Into<String>) -> Self {
        Self {
            input: input.as_bytes(),
            file: file.into(),
            position: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.position + offset).copied()
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.position += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.position..].starts_with(s.as_bytes())
    }

    /// Lex the whole file, dropping whitespace and comments, logging a
    /// trace-level event per emitted token.
    pub fn lex(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            if let TokenKind::Error(message) = &token.kind {
                return Err(LexError {
                    message: message.clone(),
                    span: token.span,
                });
            }
            if !token.is_trivia() {
                log::trace!("lexed {:?} at {:?}", token.kind, token.span.start);
                tokens.push(token);
            }
            if is_eof {
                break;
            }
        }
        log::info!("lexed {} '{}' into {} tokens", self.file, self.file, tokens.len());
        Ok(tokens)
    }

    fn next_token(&mut self) -> LexResult<Token> {
        let Some(c) = self.peek() else {
            let p = self.pos();
            return Ok(Token {
                kind: TokenKind::Eof,
                span: Span::new(p, p, self.file.clone()),
            });
        };

        if c.is_ascii_whitespace() {
            return Ok(self.lex_whitespace());
        }
        if self.starts_with("//") {
            return Ok(self.lex_line_comment());
        }
        if self.starts_with("/*") {
            return self.lex_block_comment();
        }
        if c == b'"' {
            return self.lex_string();
        }
        if c.is_ascii_digit() {
            return self.lex_int();
        }
        if c.is_ascii_alphabetic() || c == b'_' {
            return Ok(self.lex_word());
        }
        self.lex_symbol()
    }

    fn lex_whitespace(&mut self) -> Token {
        let start = self.pos();
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.advance();
        }
        Token {
            kind: TokenKind::Whitespace,
            span: Span::new(start, self.pos(), self.file.clone()),
        }
    }

    fn lex_line_comment(&mut self) -> Token {
        let start = self.pos();
        while self.peek().is_some_and(|c| c != b'\n') {
            self.advance();
        }
        Token {
            kind: TokenKind::Comment,
            span: Span::new(start, self.pos(), self.file.clone()),
        }
    }

    fn lex_block_comment(&mut self) -> LexResult<Token> {
        let start = self.pos();
        self.advance();
        self.advance();
        loop {
            if self.starts_with("*/") {
                self.advance();
                self.advance();
                return Ok(Token {
                    kind: TokenKind::Comment,
                    span: Span::new(start, self.pos(), self.file.clone()),
                });
            }
            if self.advance().is_none() {
                let end = self.pos();
                return Err(LexError {
                    message: "unclosed comment".to_string(),
                    span: Span::new(start, end, self.file.clone()),
                });
            }
        }
    }

    fn lex_string(&mut self) -> LexResult<Token> {
        let start = self.pos();
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.advance();
                    return Ok(Token {
                        kind: TokenKind::StringLiteral(value),
                        span: Span::new(start, self.pos(), self.file.clone()),
                    });
                }
                Some(b'\n') | None => {
                    let end = self.pos();
                    return Err(LexError {
                        message: "unterminated string literal".to_string(),
                        span: Span::new(start, end, self.file.clone()),
                    });
                }
                Some(c) => {
                    value.push(c as char);
                    self.advance();
                }
            }
        }
    }

    fn lex_int(&mut self) -> LexResult<Token> {
        let start = self.pos();
        let mut digits = String::new();
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            digits.push(self.advance().unwrap() as char);
        }
        let span = Span::new(start, self.pos(), self.file.clone());
        match digits.parse::<i32>() {
            Ok(value) => Ok(Token {
                kind: TokenKind::IntLiteral(value),
                span,
            }),
            Err(_) => Ok(Token {
                kind: TokenKind::Error(format!("integer literal '{digits}' out of range")),
                span,
            }),
        }
    }

    fn lex_word(&mut self) -> Token {
        let start = self.pos();
        let mut word = String::new();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            word.push(self.advance().unwrap() as char);
        }
        let span = Span::new(start, self.pos(), self.file.clone());
        let kind = if word == "_" {
            TokenKind::Underscore
        } else if KEYWORDS.contains(&word.as_str()) {
            TokenKind::Keyword(word)
        } else if PRIMITIVE_TYPES.contains(&word.as_str()) {
            TokenKind::PrimitiveType(word)
        } else if word == "true" {
            TokenKind::BoolLiteral(true)
        } else if word == "false" {
            TokenKind::BoolLiteral(false)
        } else {
            TokenKind::Identifier(word)
        };
        Token { kind, span }
    }

    fn lex_symbol(&mut self) -> LexResult<Token> {
        const MULTI_OPS: &[&str] = &["==", "++", "||", "&&", "<=", "=>"];
        const SINGLE_OPS: &[u8] = b"+-*/%<!";
        const DELIMITERS: &[u8] = b".,:;()[]{}=";

        let start = self.pos();
        for op in MULTI_OPS {
            if self.starts_with(op) {
                self.advance();
                self.advance();
                let span = Span::new(start, self.pos(), self.file.clone());
                return Ok(Token {
                    kind: if *op == "=>" {
                        TokenKind::Delimiter((*op).to_string())
                    } else {
                        TokenKind::Operator((*op).to_string())
                    },
                    span,
                });
            }
        }

        let c = self.peek().unwrap();
        if SINGLE_OPS.contains(&c) {
            self.advance();
            return Ok(Token {
                kind: TokenKind::Operator((c as char).to_string()),
                span: Span::new(start, self.pos(), self.file.clone()),
            });
        }
        if DELIMITERS.contains(&c) {
            self.advance();
            return Ok(Token {
                kind: TokenKind::Delimiter((c as char).to_string()),
                span: Span::new(start, self.pos(), self.file.clone()),
            });
        }

        self.advance();
        Err(LexError {
            message: format!("unexpected character '{}'", c as char),
            span: Span::new(start, self.pos(), self.file.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src, "test.amy")
            .lex()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_before_identifiers() {
        assert_eq!(
            kinds("object val"),
            vec![
                TokenKind::Keyword("object".into()),
                TokenKind::Keyword("val".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_bool_literals_before_identifiers() {
        assert_eq!(
            kinds("true false x"),
            vec![
                TokenKind::BoolLiteral(true),
                TokenKind::BoolLiteral(false),
                TokenKind::Identifier("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_multichar_operators_before_singles() {
        assert_eq!(
            kinds("<= < == && ="),
            vec![
                TokenKind::Operator("<=".into()),
                TokenKind::Operator("<".into()),
                TokenKind::Operator("==".into()),
                TokenKind::Operator("&&".into()),
                TokenKind::Delimiter("=".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn decodes_integer_literals_as_base_ten() {
        assert_eq!(kinds("0 42 007"), {
            vec![
                TokenKind::IntLiteral(0),
                TokenKind::IntLiteral(42),
                TokenKind::IntLiteral(7),
                TokenKind::Eof,
            ]
        });
    }

    #[test]
    fn overflowing_integer_literal_is_a_fatal_lex_error() {
        let err = Lexer::new("99999999999999", "test.amy").lex().unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn unterminated_block_comment_is_a_lex_error() {
        let err = Lexer::new("/* nope", "test.amy").lex().unwrap_err();
        assert_eq!(err.message, "unclosed comment");
    }

    #[test]
    fn string_literal_has_no_escape_processing() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![
                TokenKind::StringLiteral("a\\nb".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn whitespace_and_comments_are_dropped() {
        assert_eq!(
            kinds("val // comment\n/* block */ x"),
            vec![
                TokenKind::Keyword("val".into()),
                TokenKind::Identifier("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn underscore_is_its_own_kind() {
        assert_eq!(kinds("_"), vec![TokenKind::Underscore, TokenKind::Eof]);
    }
}
