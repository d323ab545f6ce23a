//! Simplification from the known initial state.

use std::f64::consts::PI;

use qport_ir::{Circuit, Instruction, InstructionKind, QubitId, StandardGate};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::redundancy::plain_standard;
use crate::unitary::is_multiple_of;

/// Push computational basis states forward from the start of the circuit.
///
/// While a qubit is in a known basis state, gates that only permute or phase
/// basis states are dropped and the state is updated. An `X` re-creates a
/// `|1⟩` just before the first operation that needs it.
#[derive(Debug, Clone, Copy)]
pub struct SimplifyInitial {
    allow_classical: bool,
    create_all_qubits: bool,
}

impl SimplifyInitial {
    /// Create the pass.
    ///
    /// With `create_all_qubits` every qubit starts in `|0⟩`; otherwise no
    /// initial state is assumed and the pass leaves the circuit alone.
    /// The circuit model has no classical write operation, so measurements
    /// are always kept whatever `allow_classical` says.
    pub fn new(allow_classical: bool, create_all_qubits: bool) -> Self {
        Self {
            allow_classical,
            create_all_qubits,
        }
    }

    /// Whether classical operations may replace measurements.
    pub fn allow_classical(&self) -> bool {
        self.allow_classical
    }
}

impl Default for SimplifyInitial {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[derive(Default)]
struct KnownStates {
    states: FxHashMap<QubitId, bool>,
    out: Vec<Instruction>,
}

impl KnownStates {
    fn get(&self, q: QubitId) -> Option<bool> {
        self.states.get(&q).copied()
    }

    fn set(&mut self, q: QubitId, value: bool) {
        self.states.insert(q, value);
    }

    /// Emit the gates that realise the known states of `qubits`, then
    /// forget them.
    fn materialize(&mut self, qubits: &[QubitId]) {
        for &q in qubits {
            if self.states.remove(&q) == Some(true) {
                self.out
                    .push(Instruction::single_qubit_gate(StandardGate::X, q));
            }
        }
    }

    /// Try to absorb a gate whose qubits all have known states.
    fn absorb(&mut self, gate: &StandardGate, qubits: &[QubitId]) -> bool {
        let Some(values) = qubits.iter().map(|&q| self.get(q)).collect::<Option<Vec<_>>>() else {
            return false;
        };
        let half_turn = |p: &qport_ir::ParameterExpression| {
            p.as_f64().is_some_and(|v| is_multiple_of(v - PI, 2.0 * PI))
        };
        match gate {
            g if g.is_diagonal() => {}
            StandardGate::X | StandardGate::Y => self.set(qubits[0], !values[0]),
            StandardGate::Rx(p) | StandardGate::Ry(p) if half_turn(p) => {
                self.set(qubits[0], !values[0]);
            }
            StandardGate::CX | StandardGate::CY => {
                if values[0] {
                    self.set(qubits[1], !values[1]);
                }
            }
            StandardGate::CCX => {
                if values[0] && values[1] {
                    self.set(qubits[2], !values[2]);
                }
            }
            StandardGate::Swap => {
                self.set(qubits[0], values[1]);
                self.set(qubits[1], values[0]);
            }
            _ => return false,
        }
        true
    }

    /// Handle a controlled gate whose control alone is known.
    fn absorb_control(&mut self, gate: &StandardGate, qubits: &[QubitId]) -> bool {
        let target_gate = match gate {
            StandardGate::CX => StandardGate::X,
            StandardGate::CY => StandardGate::Y,
            StandardGate::CZ => StandardGate::Z,
            _ => return false,
        };
        match self.get(qubits[0]) {
            Some(false) => true,
            Some(true) => {
                self.materialize(&qubits[1..]);
                self.out
                    .push(Instruction::single_qubit_gate(target_gate, qubits[1]));
                true
            }
            None => false,
        }
    }
}

impl Pass for SimplifyInitial {
    fn name(&self) -> &'static str {
        "SimplifyInitial"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        if !self.create_all_qubits {
            return Ok(());
        }
        let instructions = circuit.instructions();
        let before = instructions.len();

        let mut known = KnownStates::default();
        for q in circuit.qubits() {
            known.set(q.id, false);
        }

        for inst in instructions {
            match &inst.kind {
                InstructionKind::Barrier => known.out.push(inst),
                InstructionKind::Reset => {
                    let q = inst.qubits[0];
                    if known.get(q).is_none() {
                        known.out.push(inst);
                    }
                    known.set(q, false);
                }
                InstructionKind::Gate(_) => {
                    if let Some(gate) = plain_standard(&inst) {
                        if known.absorb(gate, &inst.qubits) || known.absorb_control(gate, &inst.qubits) {
                            continue;
                        }
                    }
                    known.materialize(&inst.qubits);
                    known.out.push(inst);
                }
                InstructionKind::Measure => {
                    known.materialize(&inst.qubits);
                    known.out.push(inst);
                }
            }
        }

        let remaining: Vec<_> = circuit.qubits().iter().map(|q| q.id).collect();
        known.materialize(&remaining);

        debug!(
            "SimplifyInitial: {} -> {} instructions",
            before,
            known.out.len()
        );
        circuit.rebuild_with(known.out)?;
        Ok(())
    }
}
