//! Evaluator - executes postfix nodes on a value stack
//!
//! Stack entries are either numbers or argument boundaries. A function node
//! pops entries down to the nearest boundary, restores their left-to-right
//! order and applies the function. The first fault aborts evaluation since
//! the stack can no longer be trusted.

use crate::environment::Environment;
use crate::error::{Diagnostic, EvalError, EvalErrorKind, Report};
use crate::number::Number;
use crate::parser::{NodeKind, PostfixNode};
use tracing::debug;

/// Value stack entry
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Value(Number),
    Boundary,
}

type Fault = (EvalErrorKind, usize);

/// Postfix executor bound to an environment
pub struct Evaluator<'a> {
    env: &'a Environment,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    /// Run `postfix` (parsed from `input`) to a single number
    ///
    /// An empty program evaluates to `0`.
    pub fn evaluate(&self, postfix: &[PostfixNode], input: &str) -> Result<Number, EvalError> {
        let mut stack = Vec::new();

        for node in postfix {
            if let Err((kind, offset)) = self.execute(node, &mut stack) {
                debug!(error = %kind, offset, "evaluation failed");
                return Err(Report::single(input, Diagnostic::at(kind, offset)));
            }
        }

        let result = match stack.len() {
            0 => Ok(Number::from(0)),
            1 => match stack.pop() {
                Some(Slot::Value(n)) => Ok(n),
                _ => Err((EvalErrorKind::InvalidOperand("result".into()), last_offset(postfix))),
            },
            depth => Err((EvalErrorKind::Malformed(depth), last_offset(postfix))),
        };

        result.map_err(|(kind, offset)| Report::single(input, Diagnostic::at(kind, offset)))
    }

    fn execute(&self, node: &PostfixNode, stack: &mut Vec<Slot>) -> Result<(), Fault> {
        let at = |kind: EvalErrorKind| (kind, node.offset);

        match &node.kind {
            NodeKind::Number(n) => stack.push(Slot::Value(n.clone())),
            NodeKind::ArgumentBoundary => stack.push(Slot::Boundary),
            NodeKind::Constant(name) => {
                let value = self
                    .env
                    .constant(name)
                    .ok_or_else(|| at(EvalErrorKind::UnknownConstant(name.clone())))?;
                stack.push(Slot::Value(value.clone()));
            },
            NodeKind::UnaryOperator { name, .. } => {
                let operand = match stack.pop() {
                    Some(Slot::Value(n)) => n,
                    Some(Slot::Boundary) => {
                        return Err(at(EvalErrorKind::InvalidOperand(name.clone())))
                    },
                    None => {
                        return Err(at(EvalErrorKind::OperandCount {
                            operator: name.clone(),
                            expected: 1,
                        }))
                    },
                };
                let op = self
                    .env
                    .unary_operator(name)
                    .ok_or_else(|| at(EvalErrorKind::UnknownUnaryOperator(name.clone())))?;
                stack.push(Slot::Value((op.eval)(&operand)));
            },
            NodeKind::BinaryOperator { name, .. } => {
                let (rhs, lhs) = match (stack.pop(), stack.pop()) {
                    (Some(rhs), Some(lhs)) => (rhs, lhs),
                    _ => {
                        return Err(at(EvalErrorKind::OperandCount {
                            operator: name.clone(),
                            expected: 2,
                        }))
                    },
                };
                let (lhs, rhs) = match (lhs, rhs) {
                    (Slot::Value(l), Slot::Value(r)) => (l, r),
                    _ => return Err(at(EvalErrorKind::InvalidOperands(name.clone()))),
                };
                let op = self
                    .env
                    .binary_operator(name)
                    .ok_or_else(|| at(EvalErrorKind::UnknownBinaryOperator(name.clone())))?;
                if matches!(name.as_str(), "/" | "%") && rhs.is_zero() {
                    return Err(at(EvalErrorKind::DivisionByZero));
                }
                stack.push(Slot::Value((op.eval)(&lhs, &rhs)));
            },
            NodeKind::Function(name) => {
                let args = collect_arguments(stack)
                    .ok_or_else(|| at(EvalErrorKind::NoCallStart(name.clone())))?;
                let function = self
                    .env
                    .function(name)
                    .ok_or_else(|| at(EvalErrorKind::UnknownFunction(name.clone())))?;
                if args.len() != function.arity {
                    return Err(at(EvalErrorKind::ArgumentCount {
                        function: name.clone(),
                        expected: function.arity,
                        found: args.len(),
                    }));
                }
                let result = function.call(&args);
                stack.push(Slot::Value(check_domain(name, &args, result).map_err(at)?));
            },
            NodeKind::Null => return Err(at(EvalErrorKind::IllegalNode)),
        }
        Ok(())
    }
}

/// Pop values down to the nearest boundary, which is consumed
///
/// Returns `None` when the stack runs out before a boundary is found.
fn collect_arguments(stack: &mut Vec<Slot>) -> Option<Vec<Number>> {
    let mut args = Vec::new();
    loop {
        match stack.pop()? {
            Slot::Boundary => break,
            Slot::Value(n) => args.push(n),
        }
    }
    args.reverse();
    Some(args)
}

/// NaN out of non-NaN arguments means the function was called outside its
/// domain. Operators are exempt and follow IEEE arithmetic.
fn check_domain(name: &str, inputs: &[Number], result: Number) -> Result<Number, EvalErrorKind> {
    if result.is_nan() && !inputs.iter().any(Number::is_nan) {
        return Err(EvalErrorKind::Domain(name.to_string()));
    }
    Ok(result)
}

fn last_offset(postfix: &[PostfixNode]) -> usize {
    postfix.last().map_or(0, |node| node.offset)
}

/// Evaluate parsed `postfix` against `env`
pub fn evaluate(postfix: &[PostfixNode], input: &str, env: &Environment) -> Result<Number, EvalError> {
    Evaluator::new(env).evaluate(postfix, input)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::environment::{Associativity, Binding};

    fn num(n: i64, offset: usize) -> PostfixNode {
        PostfixNode::new(NodeKind::Number(Number::from(n)), offset)
    }

    fn binary(name: &str, offset: usize) -> PostfixNode {
        PostfixNode::new(
            NodeKind::BinaryOperator {
                name: name.into(),
                binding: Binding::new(2, Associativity::Left),
            },
            offset,
        )
    }

    fn unary(name: &str, offset: usize) -> PostfixNode {
        PostfixNode::new(
            NodeKind::UnaryOperator {
                name: name.into(),
                binding: Binding::new(4, Associativity::Right),
            },
            offset,
        )
    }

    fn boundary() -> PostfixNode {
        PostfixNode::new(NodeKind::ArgumentBoundary, 0)
    }

    fn function(name: &str) -> PostfixNode {
        PostfixNode::new(NodeKind::Function(name.into()), 0)
    }

    fn run(postfix: &[PostfixNode]) -> Result<Number, EvalError> {
        let env = Environment::standard();
        evaluate(postfix, "", &env)
    }

    fn fault(postfix: &[PostfixNode]) -> EvalErrorKind {
        run(postfix).unwrap_err().kind().cloned().unwrap()
    }

    #[test]
    fn test_empty_program_is_zero() {
        assert_eq!(run(&[]).unwrap(), Number::from(0));
    }

    #[test]
    fn test_binary_keeps_operand_order() {
        let result = run(&[num(10, 0), num(4, 3), binary("-", 2)]).unwrap();
        assert_eq!(result, Number::from(6));
    }

    #[test]
    fn test_unary() {
        assert_eq!(run(&[num(5, 1), unary("-", 0)]).unwrap(), Number::from(-5));
    }

    #[test]
    fn test_constants_resolve() {
        let node = PostfixNode::new(NodeKind::Constant("pi".into()), 0);
        assert_eq!(run(&[node]).unwrap(), Number::Float(std::f64::consts::PI));

        let node = PostfixNode::new(NodeKind::Constant("phi".into()), 0);
        assert_eq!(fault(&[node]), EvalErrorKind::UnknownConstant("phi".into()));
    }

    #[test]
    fn test_function_arguments_in_order() {
        let result = run(&[boundary(), num(1, 0), num(2, 0), function("atan2")]).unwrap();
        assert_eq!(result, Number::Float(1f64.atan2(2.0)));
    }

    #[test]
    fn test_function_argument_count() {
        assert_eq!(
            fault(&[boundary(), num(1, 0), num(2, 0), function("sin")]),
            EvalErrorKind::ArgumentCount {
                function: "sin".into(),
                expected: 1,
                found: 2,
            }
        );
        assert_eq!(
            fault(&[boundary(), function("sin")]),
            EvalErrorKind::ArgumentCount {
                function: "sin".into(),
                expected: 1,
                found: 0,
            }
        );
    }

    #[test]
    fn test_function_without_boundary() {
        assert_eq!(
            fault(&[num(1, 0), function("sin")]),
            EvalErrorKind::NoCallStart("sin".into())
        );
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(
            fault(&[boundary(), num(1, 0), function("nope")]),
            EvalErrorKind::UnknownFunction("nope".into())
        );
        assert_eq!(
            fault(&[num(1, 0), num(2, 0), binary("&", 0)]),
            EvalErrorKind::UnknownBinaryOperator("&".into())
        );
        assert_eq!(
            fault(&[num(1, 0), unary("!", 0)]),
            EvalErrorKind::UnknownUnaryOperator("!".into())
        );
    }

    #[test]
    fn test_boundary_is_not_an_operand() {
        assert_eq!(
            fault(&[boundary(), unary("-", 0)]),
            EvalErrorKind::InvalidOperand("-".into())
        );
        assert_eq!(
            fault(&[boundary(), num(1, 0), binary("+", 0)]),
            EvalErrorKind::InvalidOperands("+".into())
        );
    }

    #[test]
    fn test_operand_underflow() {
        assert_eq!(
            fault(&[num(1, 0), binary("+", 0)]),
            EvalErrorKind::OperandCount {
                operator: "+".into(),
                expected: 2,
            }
        );
        assert_eq!(
            fault(&[unary("-", 0)]),
            EvalErrorKind::OperandCount {
                operator: "-".into(),
                expected: 1,
            }
        );
    }

    #[test]
    fn test_division_and_modulo_by_zero() {
        assert_eq!(
            fault(&[num(1, 0), num(0, 2), binary("/", 1)]),
            EvalErrorKind::DivisionByZero
        );
        assert_eq!(
            fault(&[num(1, 0), num(0, 2), binary("%", 1)]),
            EvalErrorKind::DivisionByZero
        );
        let zero = PostfixNode::new(NodeKind::Number(Number::Float(0.0)), 2);
        assert_eq!(
            fault(&[num(1, 0), zero, binary("/", 1)]),
            EvalErrorKind::DivisionByZero
        );
    }

    #[test]
    fn test_error_offset_comes_from_node() {
        let err = evaluate(
            &[num(1, 0), num(0, 2), binary("/", 1)],
            "1/0",
            &Environment::standard(),
        )
        .unwrap_err();
        assert_eq!(err.diagnostics()[0].offset, Some(1));
        assert_eq!(err.to_string(), "division by zero:\n1/0\n ^");
    }

    #[test]
    fn test_domain_error() {
        assert_eq!(
            fault(&[boundary(), num(-1, 0), function("sqrt")]),
            EvalErrorKind::Domain("sqrt".into())
        );
    }

    #[test]
    fn test_operators_may_produce_nan() {
        let inf = || PostfixNode::new(NodeKind::Number(Number::Float(f64::INFINITY)), 0);
        assert!(run(&[inf(), inf(), binary("-", 0)]).unwrap().is_nan());
        assert!(run(&[inf(), num(0, 0), binary("*", 0)]).unwrap().is_nan());
    }

    #[test]
    fn test_null_node_is_illegal() {
        let node = PostfixNode::new(NodeKind::Null, 0);
        assert_eq!(fault(&[node]), EvalErrorKind::IllegalNode);
    }

    #[test]
    fn test_leftover_values_are_malformed() {
        assert_eq!(fault(&[num(1, 0), num(2, 2)]), EvalErrorKind::Malformed(2));
        assert_eq!(
            fault(&[boundary()]),
            EvalErrorKind::InvalidOperand("result".into())
        );
    }
}
