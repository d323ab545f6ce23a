//! Error types for the compilation crate.

use qport_ir::IrError;
use thiserror::Error;

/// Errors raised by compilation passes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the circuit layer.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// A gate with no decomposition into the target gate set.
    #[error("Gate '{gate}' cannot be expressed in the gate set {{{target}}}")]
    GateNotInBasis {
        /// Offending gate.
        gate: String,
        /// Comma-separated target gate names.
        target: String,
    },

    /// A pass that needs numeric angles met a symbolic one.
    #[error("Symbolic parameter in '{0}' cannot be handled here")]
    SymbolicParameter(String),

    /// A pass could not complete.
    #[error("Pass '{pass}' failed: {reason}")]
    PassFailed {
        /// Name of the pass.
        pass: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
