//! Errors raised while reading or writing `OpenQASM` 2.0.

use thiserror::Error;

/// Why a QASM source could not become a circuit, or a circuit could not
/// be written as QASM.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Text the lexer does not recognise.
    #[error("Lexer error at position {position}: {message}")]
    LexerError {
        /// Byte offset into the source.
        position: usize,
        message: String,
    },

    /// A token that does not fit the grammar at this point.
    #[error("Unexpected token at line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        line: usize,
        expected: String,
        found: String,
    },

    /// Source ended mid-statement; holds what was still expected.
    #[error("Unexpected end of input: {0}")]
    UnexpectedEof(String),

    /// Header names a version other than 2.0.
    #[error("Invalid OPENQASM version: {0}")]
    InvalidVersion(String),

    /// Register, gate argument or function name never declared.
    #[error("Undefined identifier: {0}")]
    UndefinedIdentifier(String),

    /// Neither a qelib1 gate nor a `gate` definition in the source.
    #[error("Unknown gate: {0}")]
    UnknownGate(String),

    #[error("Gate '{gate}' expects {expected} qubits, got {got}")]
    WrongQubitCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    #[error("Gate '{gate}' expects {expected} parameters, got {got}")]
    WrongParameterCount {
        gate: String,
        expected: usize,
        got: usize,
    },

    /// `q[i]` with `i` past the end of `q`.
    #[error("Index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        register: String,
        index: usize,
        size: usize,
    },

    /// Valid QASM that has no counterpart in the circuit model, or the
    /// other way round.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The circuit model rejected an operation built from the source.
    #[error("Circuit error: {0}")]
    CircuitError(#[from] qport_ir::IrError),
}

/// Result of reading or writing QASM.
pub type ParseResult<T> = Result<T, ParseError>;
