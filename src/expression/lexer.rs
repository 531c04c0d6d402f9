// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tokenizer for the expression language.
//!
//! The lexer is the first line of the sandbox: statement keywords, assignment
//! operators, statement separators and prefixed string literals never make it
//! to the parser.

use crate::errors::CompilationError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Keyword(Keyword),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Dot,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Lambda,
    If,
    Else,
    And,
    Or,
    Not,
    In,
    Is,
    For,
    None,
    True,
    False,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Name(name) => format!("name '{}'", name),
            Token::Int(i) => format!("number {}", i),
            Token::Float(f) => format!("number {}", f),
            Token::Str(_) => "string literal".to_string(),
            Token::Keyword(kw) => format!("keyword '{}'", kw.as_str()),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::DoubleStar => "**",
            Token::Slash => "/",
            Token::DoubleSlash => "//",
            Token::Percent => "%",
            Token::EqualEqual => "==",
            Token::NotEqual => "!=",
            Token::Less => "<",
            Token::LessEqual => "<=",
            Token::Greater => ">",
            Token::GreaterEqual => ">=",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::Comma => ",",
            Token::Colon => ":",
            Token::Dot => ".",
            Token::Arrow => "->",
            _ => "?",
        }
    }
}

impl Keyword {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Keyword::Lambda => "lambda",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::In => "in",
            Keyword::Is => "is",
            Keyword::For => "for",
            Keyword::None => "None",
            Keyword::True => "True",
            Keyword::False => "False",
        }
    }

    fn from_word(word: &str) -> Option<Keyword> {
        let kw = match word {
            "lambda" => Keyword::Lambda,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "in" => Keyword::In,
            "is" => Keyword::Is,
            "for" => Keyword::For,
            "None" | "null" => Keyword::None,
            "True" | "true" => Keyword::True,
            "False" | "false" => Keyword::False,
            _ => return None,
        };
        Some(kw)
    }
}

/// Words that introduce statements or side effects. They are rejected wherever
/// they appear outside a string literal.
const STATEMENT_KEYWORDS: &[&str] = &[
    "import", "from", "def", "class", "return", "yield", "await", "async", "global",
    "nonlocal", "del", "pass", "raise", "try", "except", "finally", "with", "while",
    "assert", "break", "continue", "elif", "exec", "print",
];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, CompilationError> {
    Lexer {
        source,
        bytes: source.as_bytes(),
        position: 0,
    }
    .run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    fn error(&self, position: usize, reason: impl Into<String>) -> CompilationError {
        CompilationError {
            expression: self.source.to_string(),
            position,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.position + offset).copied()
    }

    fn run(mut self) -> Result<Vec<Spanned>, CompilationError> {
        let mut tokens = Vec::new();

        while let Some(byte) = self.peek() {
            let start = self.position;
            let token = match byte {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.position += 1;
                    continue;
                }
                b'#' => return Err(self.error(start, "comments are not allowed")),
                b';' => {
                    return Err(self.error(start, "multiple statements are not allowed"))
                }
                b'\\' => return Err(self.error(start, "line continuations are not allowed")),
                b'0'..=b'9' => self.number()?,
                b'.' if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => self.number()?,
                b'\'' | b'"' => self.string()?,
                b if b == b'_' || b.is_ascii_alphabetic() => self.word()?,
                _ => self.operator()?,
            };
            tokens.push(Spanned {
                token,
                position: start,
            });
        }

        Ok(tokens)
    }

    fn word(&mut self) -> Result<Token, CompilationError> {
        let start = self.position;
        while self
            .peek()
            .is_some_and(|b| b == b'_' || b.is_ascii_alphanumeric())
        {
            self.position += 1;
        }
        let word = &self.source[start..self.position];

        if matches!(self.peek(), Some(b'\'') | Some(b'"'))
            && word.len() <= 2
            && word.chars().all(|c| "rbfuRBFU".contains(c))
        {
            return Err(self.error(start, format!("string prefix '{}' is not supported", word)));
        }
        if STATEMENT_KEYWORDS.contains(&word) {
            return Err(self.error(
                start,
                format!("statement keyword '{}' is not allowed", word),
            ));
        }

        Ok(match Keyword::from_word(word) {
            Some(kw) => Token::Keyword(kw),
            None => Token::Name(word.to_string()),
        })
    }

    fn number(&mut self) -> Result<Token, CompilationError> {
        let start = self.position;
        let mut is_float = false;

        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.position += 1;
        }
        if self.peek() == Some(b'.') {
            is_float = true;
            self.position += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.position += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let sign = matches!(self.peek_at(1), Some(b'+') | Some(b'-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                self.position += digit_at;
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.position += 1;
                }
            }
        }
        if self
            .peek()
            .is_some_and(|b| b == b'_' || b.is_ascii_alphabetic())
        {
            return Err(self.error(self.position, "malformed number literal"));
        }

        let text = &self.source[start..self.position];
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(start, format!("malformed number literal '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| self.error(start, format!("integer literal '{}' is out of range", text)))
        }
    }

    fn string(&mut self) -> Result<Token, CompilationError> {
        let start = self.position;
        let quote = self.bytes[start];
        self.position += 1;
        let mut value = String::new();

        loop {
            let rest = &self.source[self.position..];
            let mut chars = rest.chars();
            let c = chars
                .next()
                .ok_or_else(|| self.error(start, "unterminated string literal"))?;
            self.position += c.len_utf8();

            match c {
                c if c as u32 == quote as u32 => break,
                '\n' => return Err(self.error(start, "unterminated string literal")),
                '\\' => {
                    let escaped = chars
                        .next()
                        .ok_or_else(|| self.error(start, "unterminated string literal"))?;
                    self.position += escaped.len_utf8();
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        '\\' => value.push('\\'),
                        '\'' => value.push('\''),
                        '"' => value.push('"'),
                        'u' => value.push(self.unicode_escape()?),
                        other => {
                            return Err(self.error(
                                self.position - other.len_utf8() - 1,
                                format!("unknown escape sequence '\\{}'", other),
                            ))
                        }
                    }
                }
                c => value.push(c),
            }
        }

        Ok(Token::Str(value))
    }

    fn unicode_escape(&mut self) -> Result<char, CompilationError> {
        let start = self.position;
        let digits = self
            .source
            .get(start..start + 4)
            .ok_or_else(|| self.error(start, "truncated \\u escape"))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| self.error(start, "invalid \\u escape"))?;
        self.position += 4;
        char::from_u32(code).ok_or_else(|| self.error(start, "invalid \\u escape"))
    }

    fn operator(&mut self) -> Result<Token, CompilationError> {
        let start = self.position;
        let first = self.bytes[start];
        let second = self.peek_at(1);

        let (token, width) = match (first, second) {
            (b'*', Some(b'*')) if self.peek_at(2) == Some(b'=') => {
                return Err(self.error(start, "assignment is not allowed"))
            }
            (b'/', Some(b'/')) if self.peek_at(2) == Some(b'=') => {
                return Err(self.error(start, "assignment is not allowed"))
            }
            (b'*', Some(b'*')) => (Token::DoubleStar, 2),
            (b'/', Some(b'/')) => (Token::DoubleSlash, 2),
            (b'=', Some(b'=')) => (Token::EqualEqual, 2),
            (b'!', Some(b'=')) => (Token::NotEqual, 2),
            (b'<', Some(b'=')) => (Token::LessEqual, 2),
            (b'>', Some(b'=')) => (Token::GreaterEqual, 2),
            (b'-', Some(b'>')) => (Token::Arrow, 2),
            (b':', Some(b'=')) => return Err(self.error(start, "assignment is not allowed")),
            (b'+' | b'-' | b'*' | b'/' | b'%', Some(b'=')) => {
                return Err(self.error(start, "assignment is not allowed"))
            }
            (b'=', _) => return Err(self.error(start, "assignment is not allowed")),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'<', _) => (Token::Less, 1),
            (b'>', _) => (Token::Greater, 1),
            (b'(', _) => (Token::LeftParen, 1),
            (b')', _) => (Token::RightParen, 1),
            (b'[', _) => (Token::LeftBracket, 1),
            (b']', _) => (Token::RightBracket, 1),
            (b'{', _) => (Token::LeftBrace, 1),
            (b'}', _) => (Token::RightBrace, 1),
            (b',', _) => (Token::Comma, 1),
            (b':', _) => (Token::Colon, 1),
            (b'.', _) => (Token::Dot, 1),
            _ => {
                let c = self.source[start..].chars().next().unwrap_or('?');
                return Err(self.error(start, format!("unsupported character '{}'", c)));
            }
        };

        self.position += width;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_tokenizes_lambda_header() {
        assert_eq!(
            tokens("lambda x: x >= 2.5"),
            vec![
                Token::Keyword(Keyword::Lambda),
                Token::Name("x".into()),
                Token::Colon,
                Token::Name("x".into()),
                Token::GreaterEqual,
                Token::Float(2.5),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#"'it\'s' "a\tb" 'é'"#),
            vec![
                Token::Str("it's".into()),
                Token::Str("a\tb".into()),
                Token::Str("é".into()),
            ]
        );
    }

    #[test]
    fn test_rejections() {
        let cases = vec![
            ("import os", "statement keyword 'import'"),
            ("lambda x: x; 1", "multiple statements"),
            ("lambda x: y = 1", "assignment"),
            ("lambda x: (y := 1)", "assignment"),
            ("lambda x: x += 1", "assignment"),
            ("lambda x: f'{x}'", "string prefix"),
            ("lambda x: x @ x", "unsupported character"),
            ("lambda x: 'open", "unterminated"),
            ("lambda x: 99999999999999999999", "out of range"),
        ];

        for (source, expected) in cases {
            let err = tokenize(source).unwrap_err();
            assert!(
                err.reason.contains(expected),
                "source {:?}: expected reason containing {:?}, got {:?}",
                source,
                expected,
                err.reason
            );
        }
    }
}
