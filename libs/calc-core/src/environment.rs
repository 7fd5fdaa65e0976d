//! Environment - immutable registry of constants, operators and functions
//!
//! Built once and shared read-only (`Arc<Environment>`) between any number
//! of evaluations. Names resolve by table lookup:
//!
//! | Table            | Entry                                        |
//! |------------------|----------------------------------------------|
//! | constants        | value                                        |
//! | unary operators  | binding power + primitive                    |
//! | binary operators | binding power + primitive                    |
//! | functions        | arity + primitive over `f64` arguments       |

use crate::number::Number;
use std::collections::BTreeMap;
use std::f64::consts;

/// Associativity of an operator at equal precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

impl std::fmt::Display for Associativity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Associativity::Left => f.write_str("left"),
            Associativity::Right => f.write_str("right"),
        }
    }
}

/// Precedence and associativity of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub precedence: u8,
    pub associativity: Associativity,
}

impl Binding {
    pub const ADDITIVE: Binding = Binding::new(2, Associativity::Left);
    pub const MULTIPLICATIVE: Binding = Binding::new(3, Associativity::Left);
    pub const POWER: Binding = Binding::new(4, Associativity::Right);
    pub const NEGATION: Binding = Binding::new(4, Associativity::Right);

    /// Grammar binding of a binary operator symbol, independent of any
    /// environment
    pub fn binary(symbol: &str) -> Option<Binding> {
        match symbol {
            "+" | "-" => Some(Binding::ADDITIVE),
            "*" | "/" | "%" => Some(Binding::MULTIPLICATIVE),
            "^" => Some(Binding::POWER),
            _ => None,
        }
    }

    /// Grammar binding of a unary operator symbol
    pub fn unary(symbol: &str) -> Option<Binding> {
        match symbol {
            "-" => Some(Binding::NEGATION),
            _ => None,
        }
    }

    pub const fn new(precedence: u8, associativity: Associativity) -> Self {
        Self {
            precedence,
            associativity,
        }
    }

    /// Whether an operator with this binding, sitting on the operator stack,
    /// must be output before `incoming` is pushed
    pub fn yields_to(&self, incoming: &Binding) -> bool {
        match self.associativity {
            Associativity::Left => self.precedence >= incoming.precedence,
            Associativity::Right => self.precedence > incoming.precedence,
        }
    }
}

pub type UnaryFn = fn(&Number) -> Number;
pub type BinaryFn = fn(&Number, &Number) -> Number;
pub type MathFn = fn(&[f64]) -> f64;

#[derive(Clone, Copy)]
pub struct UnaryOperator {
    pub binding: Binding,
    pub eval: UnaryFn,
}

#[derive(Clone, Copy)]
pub struct BinaryOperator {
    pub binding: Binding,
    pub eval: BinaryFn,
}

#[derive(Clone, Copy)]
pub struct Function {
    pub arity: usize,
    pub eval: MathFn,
}

impl std::fmt::Debug for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnaryOperator")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryOperator")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl Function {
    /// Apply to arguments already checked against `arity`
    pub fn call(&self, args: &[Number]) -> Number {
        let args: Vec<f64> = args.iter().map(Number::to_f64).collect();
        Number::Float((self.eval)(&args))
    }
}

/// Read-only name tables used by the parser and evaluator
#[derive(Debug, Clone)]
pub struct Environment {
    constants: BTreeMap<String, Number>,
    unary_operators: BTreeMap<String, UnaryOperator>,
    binary_operators: BTreeMap<String, BinaryOperator>,
    functions: BTreeMap<String, Function>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::standard()
    }
}

impl Environment {
    /// Constants `pi`, `e`, `tau`, the arithmetic operators and the
    /// trigonometric, hyperbolic and logarithmic functions
    pub fn standard() -> Self {
        EnvironmentBuilder::new()
            .constant("pi", consts::PI)
            .constant("e", consts::E)
            .constant("tau", consts::TAU)
            .binary("+", Binding::ADDITIVE, |a, b| a + b)
            .binary("-", Binding::ADDITIVE, |a, b| a - b)
            .binary("*", Binding::MULTIPLICATIVE, |a, b| a * b)
            .binary("/", Binding::MULTIPLICATIVE, |a, b| a / b)
            .binary("%", Binding::MULTIPLICATIVE, |a, b| a % b)
            .binary("^", Binding::POWER, Number::pow)
            .unary("-", Binding::NEGATION, |a| -a)
            .function("sin", 1, |a| a[0].sin())
            .function("cos", 1, |a| a[0].cos())
            .function("tan", 1, |a| a[0].tan())
            .function("asin", 1, |a| a[0].asin())
            .function("acos", 1, |a| a[0].acos())
            .function("atan", 1, |a| a[0].atan())
            .function("atan2", 2, |a| a[0].atan2(a[1]))
            .function("sinh", 1, |a| a[0].sinh())
            .function("cosh", 1, |a| a[0].cosh())
            .function("tanh", 1, |a| a[0].tanh())
            .function("asinh", 1, |a| a[0].asinh())
            .function("acosh", 1, |a| a[0].acosh())
            .function("atanh", 1, |a| a[0].atanh())
            .function("exp", 1, |a| a[0].exp())
            .function("log", 2, |a| a[0].log(a[1]))
            .function("log2", 1, |a| a[0].log2())
            .function("log10", 1, |a| a[0].log10())
            .function("sqrt", 1, |a| a[0].sqrt())
            .function("cbrt", 1, |a| a[0].cbrt())
            .function("hypot", 2, |a| a[0].hypot(a[1]))
            .function("ldexp", 2, |a| a[0] * 2f64.powf(a[1].trunc()))
            .build()
    }

    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    pub fn constant(&self, name: &str) -> Option<&Number> {
        self.constants.get(name)
    }

    pub fn unary_operator(&self, name: &str) -> Option<&UnaryOperator> {
        self.unary_operators.get(name)
    }

    pub fn binary_operator(&self, name: &str) -> Option<&BinaryOperator> {
        self.binary_operators.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn constants(&self) -> impl Iterator<Item = (&str, &Number)> {
        self.constants.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn unary_operators(&self) -> impl Iterator<Item = (&str, &UnaryOperator)> {
        self.unary_operators.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn binary_operators(&self) -> impl Iterator<Item = (&str, &BinaryOperator)> {
        self.binary_operators.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.functions.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Assembles an `Environment`; the result is frozen once built
#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
    constants: BTreeMap<String, Number>,
    unary_operators: BTreeMap<String, UnaryOperator>,
    binary_operators: BTreeMap<String, BinaryOperator>,
    functions: BTreeMap<String, Function>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(mut self, name: &str, value: impl Into<Number>) -> Self {
        self.constants.insert(name.to_string(), value.into());
        self
    }

    pub fn unary(mut self, name: &str, binding: Binding, eval: UnaryFn) -> Self {
        self.unary_operators
            .insert(name.to_string(), UnaryOperator { binding, eval });
        self
    }

    pub fn binary(mut self, name: &str, binding: Binding, eval: BinaryFn) -> Self {
        self.binary_operators
            .insert(name.to_string(), BinaryOperator { binding, eval });
        self
    }

    pub fn function(mut self, name: &str, arity: usize, eval: MathFn) -> Self {
        self.functions
            .insert(name.to_string(), Function { arity, eval });
        self
    }

    pub fn build(self) -> Environment {
        Environment {
            constants: self.constants,
            unary_operators: self.unary_operators,
            binary_operators: self.binary_operators,
            functions: self.functions,
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_constants() {
        let env = Environment::standard();
        assert_eq!(env.constant("pi"), Some(&Number::Float(consts::PI)));
        assert_eq!(env.constant("tau"), Some(&Number::Float(consts::TAU)));
        assert!(env.constant("phi").is_none());
    }

    #[test]
    fn test_operator_bindings() {
        let env = Environment::standard();
        let plus = env.binary_operator("+").unwrap().binding;
        let times = env.binary_operator("*").unwrap().binding;
        let power = env.binary_operator("^").unwrap().binding;
        let neg = env.unary_operator("-").unwrap().binding;

        assert_eq!(plus, Binding::new(2, Associativity::Left));
        assert_eq!(times.precedence, 3);
        assert_eq!(power, Binding::new(4, Associativity::Right));
        assert_eq!(neg, Binding::new(4, Associativity::Right));
    }

    #[test]
    fn test_grammar_bindings() {
        assert_eq!(Binding::binary("-"), Some(Binding::ADDITIVE));
        assert_eq!(Binding::binary("%"), Some(Binding::MULTIPLICATIVE));
        assert_eq!(Binding::binary("^"), Some(Binding::POWER));
        assert_eq!(Binding::binary("&"), None);
        assert_eq!(Binding::unary("-"), Some(Binding::NEGATION));
        assert_eq!(Binding::unary("+"), None);
    }

    #[test]
    fn test_yields_to() {
        let plus = Binding::new(2, Associativity::Left);
        let times = Binding::new(3, Associativity::Left);
        let power = Binding::new(4, Associativity::Right);

        assert!(plus.yields_to(&plus));
        assert!(times.yields_to(&plus));
        assert!(!plus.yields_to(&times));
        assert!(!power.yields_to(&power));
        assert!(power.yields_to(&times));
    }

    #[test]
    fn test_functions_have_fixed_arity() {
        let env = Environment::standard();
        assert_eq!(env.function("sin").unwrap().arity, 1);
        assert_eq!(env.function("atan2").unwrap().arity, 2);
        assert_eq!(env.function("log").unwrap().arity, 2);
        assert!(env.function("frobnicate").is_none());
    }

    #[test]
    fn test_function_call_converts_integers() {
        let env = Environment::standard();
        let hypot = env.function("hypot").unwrap();
        let result = hypot.call(&[Number::from(3), Number::from(4)]);
        assert_eq!(result, Number::Float(5.0));

        let log = env.function("log").unwrap();
        assert_eq!(log.call(&[Number::from(8), Number::from(2)]), Number::Float(3.0));
    }

    #[test]
    fn test_listings_are_sorted() {
        let env = Environment::standard();
        let names: Vec<&str> = env.constants().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["e", "pi", "tau"]);

        let ops: Vec<&str> = env.binary_operators().map(|(name, _)| name).collect();
        assert_eq!(ops, vec!["%", "*", "+", "-", "/", "^"]);
    }

    #[test]
    fn test_builder_custom_environment() {
        let env = Environment::builder()
            .constant("answer", 42i64)
            .function("double", 1, |a| a[0] * 2.0)
            .build();
        assert_eq!(env.constant("answer"), Some(&Number::from(42)));
        assert!(env.binary_operator("+").is_none());
        assert_eq!(env.function("double").unwrap().arity, 1);
    }
}
