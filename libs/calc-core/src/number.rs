//! Numeric values produced by literals, operators and functions
//!
//! Integers are exact and unbounded; anything touching a float, and true
//! division, falls back to `f64`.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};
use std::str::FromStr;

/// Exact integer powers larger than this many bits are computed as floats
const MAX_EXACT_POW_BITS: u64 = 1 << 20;

/// A calculator value, tagged as integer or floating point
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    Integer(BigInt),
    Float(f64),
}

impl Number {
    /// Parse a numeric literal as written in an expression
    ///
    /// The literal is an integer only if it has neither a decimal point nor
    /// an exponent marker.
    pub fn parse_literal(literal: &str) -> Option<Self> {
        if literal.contains(['.', 'e', 'E']) {
            literal.parse::<f64>().ok().map(Number::Float)
        } else {
            BigInt::from_str(literal).ok().map(Number::Integer)
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => bigint_to_f64(i),
            Number::Float(f) => *f,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(i) => i.is_zero(),
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Number::Float(f) if f.is_nan())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Exact for integers while the result fits the bit budget, else `powf`
    pub fn pow(&self, rhs: &Number) -> Number {
        if let (Number::Integer(base), Number::Integer(exp)) = (self, rhs) {
            if let Some(exact) = exact_pow(base, exp) {
                return Number::Integer(exact);
            }
        }
        Number::Float(self.to_f64().powf(rhs.to_f64()))
    }
}

impl Neg for &Number {
    type Output = Number;

    fn neg(self) -> Number {
        match self {
            Number::Integer(i) => Number::Integer(-i),
            Number::Float(f) => Number::Float(-f),
        }
    }
}

impl Add for &Number {
    type Output = Number;

    fn add(self, rhs: Self) -> Number {
        match (self, rhs) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a + b),
            _ => Number::Float(self.to_f64() + rhs.to_f64()),
        }
    }
}

impl Sub for &Number {
    type Output = Number;

    fn sub(self, rhs: Self) -> Number {
        match (self, rhs) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a - b),
            _ => Number::Float(self.to_f64() - rhs.to_f64()),
        }
    }
}

impl Mul for &Number {
    type Output = Number;

    fn mul(self, rhs: Self) -> Number {
        match (self, rhs) {
            (Number::Integer(a), Number::Integer(b)) => Number::Integer(a * b),
            _ => Number::Float(self.to_f64() * rhs.to_f64()),
        }
    }
}

/// True division, always a float
impl Div for &Number {
    type Output = Number;

    fn div(self, rhs: Self) -> Number {
        Number::Float(self.to_f64() / rhs.to_f64())
    }
}

/// Floored modulo: the result takes the sign of the divisor
///
/// Integer operands require a non-zero divisor; the evaluator rejects zero
/// before getting here.
impl Rem for &Number {
    type Output = Number;

    fn rem(self, rhs: Self) -> Number {
        match (self, rhs) {
            (Number::Integer(a), Number::Integer(b)) => {
                let r = a % b;
                if !r.is_zero() && r.is_negative() != b.is_negative() {
                    Number::Integer(r + b)
                } else {
                    Number::Integer(r)
                }
            },
            _ => {
                let (a, b) = (self.to_f64(), rhs.to_f64());
                let r = a % b;
                if r != 0.0 && (r < 0.0) != (b < 0.0) {
                    Number::Float(r + b)
                } else {
                    Number::Float(r)
                }
            },
        }
    }
}

/// Integer power when the exponent is non-negative and the result stays
/// within `MAX_EXACT_POW_BITS`
fn exact_pow(base: &BigInt, exp: &BigInt) -> Option<BigInt> {
    if exp.is_negative() {
        return None;
    }
    if base.is_zero() {
        return Some(if exp.is_zero() {
            BigInt::one()
        } else {
            BigInt::zero()
        });
    }
    if base.abs().is_one() {
        let odd = (exp % 2u32).is_one();
        return Some(if base.is_negative() && odd {
            -BigInt::one()
        } else {
            BigInt::one()
        });
    }
    let exp = exp.to_u32()?;
    if base.bits().saturating_mul(u64::from(exp)) > MAX_EXACT_POW_BITS {
        return None;
    }
    Some(base.pow(exp))
}

fn bigint_to_f64(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(if value.is_negative() {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    })
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(x) if x.is_nan() => f.write_str("NaN"),
            Number::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { "Infinity" } else { "-Infinity" })
            },
            Number::Float(x) => f.write_str(ryu::Buffer::new().format_finite(*x)),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(BigInt::from(value))
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(BigInt::from(value))
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}
