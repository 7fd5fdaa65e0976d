//! calc-core - arithmetic expression engine
//!
//! Evaluates one line of infix arithmetic in three stages:
//!
//! 1. [`scanner`] turns characters into tokens
//! 2. [`parser`] reorders tokens into postfix with a shunting-yard pass
//! 3. [`evaluator`] runs the postfix nodes on a value stack
//!
//! All names (constants, operators, functions) are resolved through an
//! immutable [`Environment`].
//!
//! # Example
//!
//! ```rust
//! use calc_core::{Calculator, Number};
//!
//! let calc = Calculator::new();
//! assert_eq!(calc.evaluate("1 + 2 * 3").unwrap(), Number::from(7));
//! assert_eq!(calc.evaluate("2 ^ 3 ^ 2").unwrap().to_string(), "512");
//! assert_eq!(calc.evaluate("hypot(3, 4)").unwrap().to_string(), "5.0");
//!
//! let err = calc.evaluate("1 / 0").unwrap_err();
//! assert_eq!(err.to_string(), "division by zero:\n1 / 0\n  ^");
//! ```
//!
//! # Operators
//!
//! | Operator | Kind   | Precedence | Associativity |
//! |----------|--------|------------|---------------|
//! | `+` `-`  | binary | 2          | left          |
//! | `*` `/` `%` | binary | 3       | left          |
//! | `^`      | binary | 4          | right         |
//! | `-`      | unary  | 4          | right         |

pub mod environment;
pub mod error;
pub mod evaluator;
pub mod number;
pub mod parser;
pub mod scanner;

use std::sync::Arc;
use tracing::debug;

// Re-exports for convenience
pub use environment::{Associativity, Binding, Environment, EnvironmentBuilder};
pub use error::{
    CalcError, Diagnostic, EvalError, EvalErrorKind, ParseError, ParseErrorKind, Report, Result,
    ScanError, ScanErrorKind,
};
pub use evaluator::Evaluator;
pub use number::Number;
pub use parser::{NodeKind, Parser, PostfixNode};
pub use scanner::{Scanner, Token, TokenKind};

/// Runs the full pipeline against a shared environment
#[derive(Debug, Clone)]
pub struct Calculator {
    environment: Arc<Environment>,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    /// Calculator over [`Environment::standard`]
    pub fn new() -> Self {
        Self::with_environment(Arc::new(Environment::standard()))
    }

    pub fn with_environment(environment: Arc<Environment>) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Evaluate one expression line
    ///
    /// Surrounding whitespace is trimmed first; error carets point into the
    /// trimmed line.
    pub fn evaluate(&self, expression: &str) -> Result<Number> {
        let input = expression.trim();
        debug!(input, "evaluating");

        let tokens = scanner::tokenize(input)?;
        let postfix = parser::parse(&tokens, input, &self.environment)?;
        let value = evaluator::evaluate(&postfix, input, &self.environment)?;

        debug!(%value, "evaluated");
        Ok(value)
    }
}

/// Evaluate `expression` with the standard environment
pub fn evaluate(expression: &str) -> Result<Number> {
    Calculator::new().evaluate(expression)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_trims_before_annotating() {
        let err = evaluate("   2 $  ").unwrap_err();
        assert_eq!(err.to_string(), "illegal character '$':\n2 $\n  ^");
    }

    #[test]
    fn test_empty_and_blank_input_is_zero() {
        assert_eq!(evaluate("").unwrap(), Number::from(0));
        assert_eq!(evaluate("  \t ").unwrap(), Number::from(0));
    }

    #[test]
    fn test_stage_errors_are_tagged() {
        assert!(matches!(evaluate("1 # 2"), Err(CalcError::Scan(_))));
        assert!(matches!(evaluate("1 2"), Err(CalcError::Parse(_))));
        assert!(matches!(evaluate("foo(1)"), Err(CalcError::Eval(_))));
        // Operator after a binary operator is syntactically allowed
        assert!(matches!(evaluate("1 + + 2"), Err(CalcError::Eval(_))));
    }

    #[test]
    fn test_custom_environment() {
        let env = Environment::builder()
            .constant("answer", 42i64)
            .binary("+", Binding::ADDITIVE, |a, b| a + b)
            .function("twice", 1, |a| a[0] * 2.0)
            .build();
        let calc = Calculator::with_environment(Arc::new(env));

        assert_eq!(calc.evaluate("answer + 1").unwrap(), Number::from(43));
        assert_eq!(calc.evaluate("twice(4)").unwrap(), Number::Float(8.0));
        assert!(matches!(calc.evaluate("pi"), Err(CalcError::Eval(_))));

        // Operators missing from the environment fail at evaluation
        let err = calc.evaluate("1 * 2").unwrap_err();
        match err {
            CalcError::Eval(report) => assert_eq!(
                report.kind(),
                Some(&EvalErrorKind::UnknownBinaryOperator("*".into()))
            ),
            other => panic!("expected evaluation error, got {:?}", other),
        }
        assert!(matches!(
            calc.evaluate("-1"),
            Err(CalcError::Eval(report))
                if report.kind() == Some(&EvalErrorKind::UnknownUnaryOperator("-".into()))
        ));
    }

    #[test]
    fn test_calculator_is_shareable() {
        let calc = Calculator::new();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let calc = calc.clone();
                std::thread::spawn(move || calc.evaluate(&format!("{} * 10", i)).unwrap())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results,
            vec![
                Number::from(0),
                Number::from(10),
                Number::from(20),
                Number::from(30)
            ]
        );
    }

    #[traced_test]
    #[test]
    fn test_stages_are_logged() {
        evaluate("sin(1) + 2").unwrap();
        assert!(logs_contain("scanned input"));
        assert!(logs_contain("parsed postfix"));
        assert!(logs_contain("evaluated"));
    }
}
