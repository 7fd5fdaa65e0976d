//! Error types for calc-core
//!
//! Scan and parse problems are collected over a full pass and reported
//! together; evaluation stops at the first fault. Every located problem is
//! rendered against the input line with a caret under the offending column:
//!
//! ```text
//! illegal character '$':
//! 1 + $
//!     ^
//! ```

use std::fmt;
use thiserror::Error;

/// Lexical problems found by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanErrorKind {
    #[error("illegal character '{0}'")]
    IllegalCharacter(char),

    #[error("digit must follow decimal point")]
    MissingFractionDigit,

    #[error("digit must follow exponent")]
    MissingExponentDigit,

    #[error("illegal character '{0}' in number")]
    LetterAfterNumber(char),
}

/// Syntactic problems found by the parser
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("illegal token {0}")]
    IllegalToken(String),

    #[error("unexpected token {0}")]
    UnexpectedToken(String),

    #[error("unmatched parenthesis")]
    UnmatchedParenthesis,

    #[error("failed to parse number '{0}'")]
    InvalidNumber(String),

    #[error("token sequence has no end-of-input marker")]
    MissingEndOfInput,
}

/// Runtime faults raised while executing postfix code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalErrorKind {
    #[error("unknown constant '{0}'")]
    UnknownConstant(String),

    #[error("unknown unary operator '{0}'")]
    UnknownUnaryOperator(String),

    #[error("unknown binary operator '{0}'")]
    UnknownBinaryOperator(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("invalid operand for operator '{0}'")]
    InvalidOperand(String),

    #[error("invalid operands for operator '{0}'")]
    InvalidOperands(String),

    #[error("incorrect number of operands for operator '{operator}', expected {expected}")]
    OperandCount { operator: String, expected: usize },

    #[error("incorrect number of arguments for function '{function}', expected {expected}, got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("no matching call start for function '{0}'")]
    NoCallStart(String),

    #[error("math domain error in '{0}'")]
    Domain(String),

    #[error("illegal postfix node")]
    IllegalNode,

    #[error("malformed expression, {0} values left on the stack")]
    Malformed(usize),
}

/// A single problem, optionally tied to a character offset in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic<K> {
    pub kind: K,
    pub offset: Option<usize>,
}

impl<K> Diagnostic<K> {
    pub fn at(kind: K, offset: usize) -> Self {
        Self {
            kind,
            offset: Some(offset),
        }
    }

    pub fn unlocated(kind: K) -> Self {
        Self { kind, offset: None }
    }
}

/// One or more diagnostics against the input line they refer to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report<K> {
    input: String,
    diagnostics: Vec<Diagnostic<K>>,
}

impl<K> Report<K> {
    pub fn new(input: impl Into<String>, diagnostics: Vec<Diagnostic<K>>) -> Self {
        Self {
            input: input.into(),
            diagnostics,
        }
    }

    pub fn single(input: impl Into<String>, diagnostic: Diagnostic<K>) -> Self {
        Self::new(input, vec![diagnostic])
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn diagnostics(&self) -> &[Diagnostic<K>] {
        &self.diagnostics
    }

    /// Kinds in the order they were recorded
    pub fn kinds(&self) -> impl Iterator<Item = &K> {
        self.diagnostics.iter().map(|d| &d.kind)
    }

    /// First recorded kind. Reports are never built empty.
    pub fn kind(&self) -> Option<&K> {
        self.diagnostics.first().map(|d| &d.kind)
    }
}

impl<K: fmt::Display> fmt::Display for Report<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match diagnostic.offset {
                Some(offset) => {
                    f.write_str(&annotate(&diagnostic.kind.to_string(), &self.input, offset))?
                },
                None => write!(f, "{}", diagnostic.kind)?,
            }
        }
        Ok(())
    }
}

impl<K: fmt::Debug + fmt::Display> std::error::Error for Report<K> {}

pub type ScanError = Report<ScanErrorKind>;
pub type ParseError = Report<ParseErrorKind>;
pub type EvalError = Report<EvalErrorKind>;

/// Base error for the whole pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error("{0}")]
    Scan(ScanError),

    #[error("{0}")]
    Parse(ParseError),

    #[error("{0}")]
    Eval(EvalError),
}

impl From<ScanError> for CalcError {
    fn from(err: ScanError) -> Self {
        Self::Scan(err)
    }
}

impl From<ParseError> for CalcError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<EvalError> for CalcError {
    fn from(err: EvalError) -> Self {
        Self::Eval(err)
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;

/// Render `message` followed by the input line and a caret under `offset`
pub fn annotate(message: &str, input: &str, offset: usize) -> String {
    format!("{}:\n{}\n{:>width$}", message, input, "^", width = offset + 1)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_aligns_caret() {
        assert_eq!(annotate("oops", "1 + x", 4), "oops:\n1 + x\n    ^");
        assert_eq!(annotate("oops", "x", 0), "oops:\nx\n^");
    }

    #[test]
    fn test_report_joins_diagnostics() {
        let report = Report::new(
            "a $ b #",
            vec![
                Diagnostic::at(ScanErrorKind::IllegalCharacter('$'), 2),
                Diagnostic::at(ScanErrorKind::IllegalCharacter('#'), 6),
            ],
        );
        assert_eq!(
            report.to_string(),
            "illegal character '$':\na $ b #\n  ^\nillegal character '#':\na $ b #\n      ^"
        );
    }

    #[test]
    fn test_unlocated_diagnostic_has_no_caret() {
        let report: ParseError =
            Report::single("", Diagnostic::unlocated(ParseErrorKind::MissingEndOfInput));
        assert_eq!(
            report.to_string(),
            "token sequence has no end-of-input marker"
        );
    }

    #[test]
    fn test_calc_error_displays_inner_report() {
        let err: CalcError =
            Report::single("1/0", Diagnostic::at(EvalErrorKind::DivisionByZero, 1)).into();
        assert_eq!(err.to_string(), "division by zero:\n1/0\n ^");
        assert!(matches!(err, CalcError::Eval(_)));
    }
}
