//! Abstract syntax tree for `OpenQASM` 2.0.

use serde::{Deserialize, Serialize};

/// A parsed program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Version from the header, e.g. `2.0`.
    pub version: String,
    /// Top-level statements.
    pub statements: Vec<Statement>,
}

/// A top-level statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// `include "file";`
    Include(String),
    /// `qreg name[size];`
    QReg { name: String, size: u32 },
    /// `creg name[size];`
    CReg { name: String, size: u32 },
    /// `gate name(params) qubits { body }`
    GateDef(GateDef),
    /// `opaque name(params) qubits;`
    Opaque { name: String },
    /// A quantum operation.
    Op(Operation),
    /// `if(register==value) op;`
    If {
        register: String,
        value: u64,
        op: Operation,
    },
}

/// A user gate definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDef {
    /// Gate name.
    pub name: String,
    /// Formal parameter names.
    pub params: Vec<String>,
    /// Formal qubit names.
    pub qubits: Vec<String>,
    /// Body operations. Only gate calls and barriers are allowed.
    pub body: Vec<Operation>,
}

/// A quantum operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    /// `name(params) args;`
    Call(GateCall),
    /// `measure q -> c;`
    Measure { qubit: Argument, bit: Argument },
    /// `reset q;`
    Reset(Argument),
    /// `barrier a, b;`
    Barrier(Vec<Argument>),
}

/// A gate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name.
    pub name: String,
    /// Parameter expressions.
    pub params: Vec<Expression>,
    /// Qubit arguments.
    pub args: Vec<Argument>,
    /// Source line.
    pub line: usize,
}

/// A register or a single register element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// Register (or formal qubit) name.
    pub name: String,
    /// Element index, `None` for the whole register.
    pub index: Option<u32>,
}

/// A parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Real literal.
    Real(f64),
    /// Integer literal.
    Integer(u64),
    /// `pi`.
    Pi,
    /// Identifier.
    Identifier(String),
    /// Unary minus.
    Neg(Box<Expression>),
    /// Binary operation.
    Binary(BinOp, Box<Expression>, Box<Expression>),
    /// `func(arg)`.
    Call(String, Box<Expression>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}
