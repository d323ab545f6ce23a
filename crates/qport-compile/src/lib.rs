//! qport Compilation Framework
//!
//! Passes that rewrite a [`qport_ir::Circuit`] towards what a device accepts,
//! predicates that check the result, and the postprocessing that moves
//! trailing basis-state gates into classical readout corrections.
//!
//! # Example
//!
//! ```rust
//! use qport_compile::{Pass, PassManager, Rebase, RemoveRedundancies};
//! use qport_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cz(QubitId(0), QubitId(1)).unwrap();
//!
//! let pm = PassManager::new()
//!     .with(Rebase::new(["rx", "ry", "rz", "h", "cx"]))
//!     .with(RemoveRedundancies);
//! pm.run(&mut circuit).unwrap();
//!
//! assert_eq!(circuit.n_gates_of("cz"), 0);
//! assert_eq!(circuit.n_gates_of("cx"), 1);
//! ```

pub mod error;
pub mod manager;
pub mod pass;
pub mod passes;
pub mod postprocess;
pub mod predicate;
pub mod synthesis;
pub mod unitary;

pub use error::{CompileError, CompileResult};
pub use manager::{PassManager, RepeatPass, SequencePass, full_peephole_optimise, synthesise};
pub use pass::Pass;
pub use passes::{
    DecomposeBoxes, FlattenRegisters, Rebase, RemoveRedundancies, RenameQubits, SimplifyInitial,
    SquashCustom, SquashReplacement, SquashSingleQubit,
};
pub use postprocess::{PostprocessCircuit, prepare_circuit};
pub use predicate::{
    GateSetPredicate, MaxNQubits, NoClassicalControl, NoFastFeedforward, NoMidMeasure, NoSymbols,
    Predicate,
};
pub use unitary::Unitary2x2;
