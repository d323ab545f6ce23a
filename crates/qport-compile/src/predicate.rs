//! Circuit predicates that backends require before accepting a circuit.

use std::fmt;

use rustc_hash::FxHashSet;

use qport_ir::{Circuit, WireId};

/// A yes/no property of a circuit.
pub trait Predicate: Send + Sync + fmt::Debug {
    /// Name used when reporting a failed check.
    fn name(&self) -> String;

    /// Check the circuit.
    fn verify(&self, circuit: &Circuit) -> bool;
}

/// No gate carries a classical condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassicalControl;

impl Predicate for NoClassicalControl {
    fn name(&self) -> String {
        "NoClassicalControlPredicate".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .dag()
            .topological_ops()
            .all(|(_, inst)| inst.condition().is_none())
    }
}

/// No gate is conditioned on a bit written by an earlier measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFastFeedforward;

impl Predicate for NoFastFeedforward {
    fn name(&self) -> String {
        "NoFastFeedforwardPredicate".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        let dag = circuit.dag();
        dag.topological_ops().all(|(node, inst)| {
            let Some(cond) = inst.condition() else {
                return true;
            };
            circuit.creg_bits(&cond.register).into_iter().all(|bit| {
                let mut current = node;
                while let Some(prev) = dag.prev_on_wire(current, WireId::Clbit(bit)) {
                    if dag.get_instruction(prev).is_some_and(|i| i.is_measure()) {
                        return false;
                    }
                    current = prev;
                }
                true
            })
        })
    }
}

/// Every measurement is final on its qubit and its bit.
///
/// Barriers may follow a measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMidMeasure;

impl Predicate for NoMidMeasure {
    fn name(&self) -> String {
        "NoMidMeasurePredicate".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        let dag = circuit.dag();
        dag.topological_ops()
            .filter(|(_, inst)| inst.is_measure())
            .all(|(node, inst)| {
                let qubits_final = inst.qubits.iter().all(|&q| {
                    let mut current = node;
                    while let Some(next) = dag.next_on_wire(current, WireId::Qubit(q)) {
                        if !dag.get_instruction(next).is_some_and(|i| i.is_barrier()) {
                            return false;
                        }
                        current = next;
                    }
                    true
                });
                let bits_final = inst
                    .clbits
                    .iter()
                    .all(|&c| dag.next_on_wire(node, WireId::Clbit(c)).is_none());
                qubits_final && bits_final
            })
    }
}

/// No symbolic parameters remain.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl Predicate for NoSymbols {
    fn name(&self) -> String {
        "NoSymbolsPredicate".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        !circuit.is_symbolic()
    }
}

/// Every operation name is in the allowed set.
#[derive(Debug, Clone, Default)]
pub struct GateSetPredicate {
    allowed: FxHashSet<String>,
}

impl GateSetPredicate {
    /// Create the predicate.
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }
}

impl Predicate for GateSetPredicate {
    fn name(&self) -> String {
        "GateSetPredicate".into()
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit
            .dag()
            .topological_ops()
            .all(|(_, inst)| self.allowed.contains(inst.name()))
    }
}

/// At most `n` qubits.
#[derive(Debug, Clone, Copy)]
pub struct MaxNQubits(pub usize);

impl Predicate for MaxNQubits {
    fn name(&self) -> String {
        format!("MaxNQubitsPredicate({})", self.0)
    }

    fn verify(&self, circuit: &Circuit) -> bool {
        circuit.num_qubits() <= self.0
    }
}
