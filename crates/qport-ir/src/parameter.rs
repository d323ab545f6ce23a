//! Parameter expressions for gate angles.
//!
//! Angles are radians. Expressions may contain free symbols (inside box
//! definitions or variational circuits); backends that execute circuits
//! require every expression to evaluate to a constant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

/// Unary functions allowed inside an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryFunc {
    /// Sine.
    Sin,
    /// Cosine.
    Cos,
    /// Tangent.
    Tan,
    /// Exponential.
    Exp,
    /// Natural logarithm.
    Ln,
    /// Square root.
    Sqrt,
}

impl UnaryFunc {
    /// Look up a function by its OpenQASM name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "exp" => Some(Self::Exp),
            "ln" => Some(Self::Ln),
            "sqrt" => Some(Self::Sqrt),
            _ => None,
        }
    }

    /// Name as written in OpenQASM.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Exp => "exp",
            Self::Ln => "ln",
            Self::Sqrt => "sqrt",
        }
    }

    fn apply(self, x: f64) -> Option<f64> {
        let v = match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Exp => x.exp(),
            Self::Ln if x > 0.0 => x.ln(),
            Self::Sqrt if x >= 0.0 => x.sqrt(),
            Self::Ln | Self::Sqrt => return None,
        };
        v.is_finite().then_some(v)
    }
}

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A numeric constant.
    Constant(f64),
    /// A free symbol.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Application of a unary function.
    Func(UnaryFunc, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// π.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Check whether any symbol occurs in the expression.
    pub fn is_symbolic(&self) -> bool {
        match self {
            Self::Symbol(_) => true,
            Self::Constant(_) | Self::Pi => false,
            Self::Neg(e) | Self::Func(_, e) => e.is_symbolic(),
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) => {
                a.is_symbolic() || b.is_symbolic()
            }
        }
    }

    /// Evaluate to a number, or `None` if symbolic or undefined.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Constant(v) => Some(*v),
            Self::Symbol(_) => None,
            Self::Pi => Some(PI),
            Self::Neg(e) => e.as_f64().map(|v| -v),
            Self::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            Self::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            Self::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            Self::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
            Self::Func(f, e) => f.apply(e.as_f64()?),
        }
    }

    /// Free symbols, sorted by name.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match self {
            Self::Constant(_) | Self::Pi => {}
            Self::Symbol(name) => {
                set.insert(name.clone());
            }
            Self::Neg(e) | Self::Func(_, e) => e.collect_symbols(set),
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Replace every occurrence of symbol `name` with `value`.
    pub fn substitute(&self, name: &str, value: &ParameterExpression) -> Self {
        let sub = |e: &ParameterExpression| Box::new(e.substitute(name, value));
        match self {
            Self::Symbol(n) if n == name => value.clone(),
            Self::Constant(_) | Self::Pi | Self::Symbol(_) => self.clone(),
            Self::Neg(e) => Self::Neg(sub(e)),
            Self::Func(f, e) => Self::Func(*f, sub(e)),
            Self::Add(a, b) => Self::Add(sub(a), sub(b)),
            Self::Sub(a, b) => Self::Sub(sub(a), sub(b)),
            Self::Mul(a, b) => Self::Mul(sub(a), sub(b)),
            Self::Div(a, b) => Self::Div(sub(a), sub(b)),
        }
    }

    /// Bind symbol `name` to a number.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        self.substitute(name, &Self::Constant(value))
    }

    /// Fold constant subexpressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return Self::Constant(v);
        }
        match self {
            Self::Neg(e) => Self::Neg(Box::new(e.simplify())),
            Self::Func(f, e) => Self::Func(*f, Box::new(e.simplify())),
            Self::Add(a, b) => Self::Add(Box::new(a.simplify()), Box::new(b.simplify())),
            Self::Sub(a, b) => Self::Sub(Box::new(a.simplify()), Box::new(b.simplify())),
            Self::Mul(a, b) => Self::Mul(Box::new(a.simplify()), Box::new(b.simplify())),
            Self::Div(a, b) => Self::Div(Box::new(a.simplify()), Box::new(b.simplify())),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "{v}"),
            Self::Symbol(name) => write!(f, "{name}"),
            Self::Pi => write!(f, "pi"),
            Self::Neg(e) => write!(f, "-({e})"),
            Self::Add(a, b) => write!(f, "({a} + {b})"),
            Self::Sub(a, b) => write!(f, "({a} - {b})"),
            Self::Mul(a, b) => write!(f, "({a} * {b})"),
            Self::Div(a, b) => write!(f, "({a} / {b})"),
            Self::Func(func, e) => write!(f, "{}({e})", func.name()),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        Self::Constant(f64::from(value))
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Self::Constant(v) => Self::Constant(-v),
            other => Self::Neg(Box::new(other)),
        }
    }
}
