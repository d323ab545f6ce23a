//! `OpenQASM` 2.0 Reader and Writer for qport
//!
//! This is the interchange format with Qiskit: [`circuit_from_qasm`] reads a
//! program exported by `QuantumCircuit.qasm()`, and [`circuit_to_qasm`] writes
//! one that `QuantumCircuit.from_qasm_str` accepts.
//!
//! # Supported Features
//!
//! | Feature | Example |
//! |---------|---------|
//! | Registers | `qreg q[5];`, `creg c[5];` |
//! | `qelib1.inc` gates | `h q[0];`, `cu1(pi/4) q[0], q[1];` |
//! | Register broadcast | `h q;`, `cx a, b;` |
//! | Gate definitions (as boxes) | `gate bell a, b { h a; cx a, b; }` |
//! | Conditions | `if(c==1) x q[0];` |
//! | Free parameters | `rz(theta/2) q[0];` |
//! | Measure, reset, barrier | `measure q -> c;` |
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use qport_qasm::{circuit_from_qasm, circuit_to_qasm};
//!
//! let source = r#"
//! OPENQASM 2.0;
//! include "qelib1.inc";
//! qreg q[2];
//! creg c[2];
//! h q[0];
//! cx q[0], q[1];
//! measure q -> c;
//! "#;
//!
//! let circuit = circuit_from_qasm(source).unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//!
//! let emitted = circuit_to_qasm(&circuit).unwrap();
//! assert!(emitted.contains("cx q[0],q[1];"));
//!
//! let reparsed = circuit_from_qasm(&emitted).unwrap();
//! assert_eq!(reparsed.num_ops(), circuit.num_ops());
//! ```

mod ast;
mod emitter;
mod error;
mod lexer;
mod lower;
mod parser;

pub use emitter::circuit_to_qasm;
pub use error::{ParseError, ParseResult};
pub use lower::circuit_from_qasm;
pub use parser::parse_program;

// Re-export AST types for callers that want the syntax tree
pub mod syntax {
    pub use crate::ast::*;
}
