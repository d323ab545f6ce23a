//! qport Circuit Intermediate Representation
//!
//! Core data structures shared by every qport crate: wires, gates,
//! parameter expressions, instructions, and the DAG-backed [`Circuit`].
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qport_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Example: Boxes
//!
//! A [`CustomGate`] may carry a [`GateDefinition`]; compilation passes expand
//! it in place.
//!
//! ```rust
//! use qport_ir::{Circuit, CustomGate, GateDefinition, Instruction, QubitId, StandardGate};
//!
//! let body = vec![
//!     Instruction::single_qubit_gate(StandardGate::H, QubitId(0)),
//!     Instruction::two_qubit_gate(StandardGate::CX, QubitId(0), QubitId(1)),
//! ];
//! let bell = CustomGate::new("bell", 2).with_definition(GateDefinition::new(vec![], 2, body));
//!
//! let mut circuit = Circuit::with_size("boxed", 2, 0);
//! circuit.gate(bell, [QubitId(0), QubitId(1)]).unwrap();
//! assert_eq!(circuit.n_gates_of("bell"), 1);
//! ```

pub mod circuit;
pub mod dag;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use circuit::{Circuit, CircuitData};
pub use dag::{CircuitDag, DagEdge, DagNode, NodeIndex, WireId};
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, CustomGate, Gate, GateDefinition, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::{ParameterExpression, UnaryFunc};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId, RegisterSlot};
