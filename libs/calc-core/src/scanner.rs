//! Scanner - turns an input line into tokens
//!
//! One left-to-right pass over the characters with two cursors: `start`
//! marks the beginning of the current token, `current` the next character to
//! read. Lexical errors do not stop the pass; each is recorded, scanning
//! resumes after the offending character, and all of them are reported
//! together once the line has been consumed.
//!
//! | Input                 | Token                          |
//! |-----------------------|--------------------------------|
//! | `sin`, `log10`, `x_1` | `Identifier`                   |
//! | `12`, `1.5`, `2e-3`   | `Number` (literal text kept)   |
//! | `+ - * / % ^`         | `Operator`                     |
//! | `(` `)` `,`           | `OpeningParen`, `ClosingParen`, `Comma` |
//! | end of line           | `Eof`                          |

use crate::error::{Diagnostic, Report, ScanError, ScanErrorKind};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Identifier,
    Operator,
    OpeningParen,
    ClosingParen,
    Comma,
    Eof,
    /// Lookahead placeholder, never produced by the scanner
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    /// Character offset of the first character of the token
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            offset,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::Null => f.write_str("nothing"),
            _ => write!(f, "'{}'", self.literal),
        }
    }
}

fn char_token(c: char) -> Option<TokenKind> {
    match c {
        '+' | '-' | '*' | '/' | '%' | '^' => Some(TokenKind::Operator),
        '(' => Some(TokenKind::OpeningParen),
        ')' => Some(TokenKind::ClosingParen),
        ',' => Some(TokenKind::Comma),
        _ => None,
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenizer over one input line
pub struct Scanner<'a> {
    input: &'a str,
    chars: Vec<char>,
    start: usize,
    current: usize,
    tokens: Vec<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            start: 0,
            current: 0,
            tokens: Vec::new(),
        }
    }

    /// Scan the whole line
    ///
    /// On success the tokens end with exactly one `Eof` token positioned
    /// after the last character.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ScanError> {
        let mut errors = Vec::new();

        while !self.at_end() {
            self.start = self.current;
            if let Err(diagnostic) = self.scan_token() {
                // Resume right after the character that failed
                if let Some(offset) = diagnostic.offset {
                    self.current = offset + 1;
                }
                errors.push(diagnostic);
            }
        }

        if !errors.is_empty() {
            debug!(errors = errors.len(), "scan failed");
            return Err(Report::new(self.input, errors));
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, "", self.current));
        debug!(tokens = self.tokens.len(), "scanned input");
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), Diagnostic<ScanErrorKind>> {
        let c = self.chars[self.current];

        if is_letter(c) {
            self.advance_while(is_word);
            self.add_token(TokenKind::Identifier);
        } else if is_digit(c) {
            self.scan_number()?;
        } else if let Some(kind) = char_token(c) {
            self.current += 1;
            self.add_token(kind);
        } else if c.is_whitespace() {
            self.current += 1;
        } else {
            return Err(Diagnostic::at(
                ScanErrorKind::IllegalCharacter(c),
                self.start,
            ));
        }
        Ok(())
    }

    fn scan_number(&mut self) -> Result<(), Diagnostic<ScanErrorKind>> {
        self.advance_while(is_digit);

        if self.peek() == Some('.') {
            if !self.peek_next().is_some_and(is_digit) {
                return Err(Diagnostic::at(
                    ScanErrorKind::MissingFractionDigit,
                    self.current,
                ));
            }
            self.current += 1;
            self.advance_while(is_digit);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            self.current += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.current += 1;
            }
            if !self.peek().is_some_and(is_digit) {
                return Err(Diagnostic::at(
                    ScanErrorKind::MissingExponentDigit,
                    self.current,
                ));
            }
            self.advance_while(is_digit);
        }

        if let Some(c) = self.peek().filter(|c| is_letter(*c)) {
            return Err(Diagnostic::at(
                ScanErrorKind::LetterAfterNumber(c),
                self.current,
            ));
        }

        self.add_token(TokenKind::Number);
        Ok(())
    }

    fn add_token(&mut self, kind: TokenKind) {
        let literal: String = self.chars[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, literal, self.start));
    }

    fn advance_while(&mut self, pred: fn(char) -> bool) {
        while self.peek().is_some_and(pred) {
            self.current += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn at_end(&self) -> bool {
        self.current >= self.chars.len()
    }
}

/// Scan `input` into tokens
pub fn tokenize(input: &str) -> Result<Vec<Token>, ScanError> {
    Scanner::new(input).tokenize()
}
