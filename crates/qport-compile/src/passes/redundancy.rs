//! Peephole removal of gates that do nothing.

use std::f64::consts::PI;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use qport_ir::{
    Circuit, CircuitDag, Instruction, InstructionKind, NodeIndex, ParameterExpression,
    StandardGate,
};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::unitary::is_multiple_of;

/// Remove gates with no effect until nothing changes.
///
/// Each sweep:
/// - drops identities and rotations by a full period,
/// - cancels a gate against its inverse when nothing sits between them,
/// - merges adjacent rotations about the same axis,
/// - drops diagonal single-qubit gates directly before a measurement.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveRedundancies;

impl Pass for RemoveRedundancies {
    fn name(&self) -> &'static str {
        "RemoveRedundancies"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let mut sweeps = 0usize;
        while let Some(instructions) = sweep(circuit.dag()) {
            circuit.rebuild_with(instructions)?;
            sweeps += 1;
        }
        debug!("RemoveRedundancies finished after {sweeps} rewriting sweeps");
        Ok(())
    }
}

/// One pass over the DAG. Returns the rewritten body, or `None` when
/// nothing changed.
fn sweep(dag: &CircuitDag) -> Option<Vec<Instruction>> {
    let mut removed: FxHashSet<NodeIndex> = FxHashSet::default();
    let mut replaced: FxHashMap<NodeIndex, Instruction> = FxHashMap::default();

    for (node, inst) in dag.topological_ops() {
        if removed.contains(&node) || replaced.contains_key(&node) {
            continue;
        }
        let Some(gate) = plain_standard(inst) else {
            continue;
        };

        if is_identity(gate) {
            removed.insert(node);
            continue;
        }

        if let Some(next) = shared_successor(dag, node, inst) {
            if !removed.contains(&next) && !replaced.contains_key(&next) {
                if let Some(next_inst) = dag.get_instruction(next) {
                    if let Some(next_gate) = plain_standard(next_inst) {
                        let same_order = inst.qubits == next_inst.qubits;
                        if cancels(gate, next_gate, same_order) {
                            removed.insert(node);
                            removed.insert(next);
                            continue;
                        }
                        if let Some(merged) = merge(gate, next_gate, same_order) {
                            removed.insert(node);
                            replaced.insert(next, Instruction::gate(merged, next_inst.qubits.clone()));
                            continue;
                        }
                    }
                }
            }
        }

        if inst.qubits.len() == 1 && gate.is_diagonal() {
            let measured_next = dag
                .next_on_wire(node, inst.qubits[0].into())
                .and_then(|n| dag.get_instruction(n))
                .is_some_and(Instruction::is_measure);
            if measured_next {
                removed.insert(node);
            }
        }
    }

    if removed.is_empty() && replaced.is_empty() {
        return None;
    }
    Some(
        dag.topological_ops()
            .filter(|(node, _)| !removed.contains(node))
            .map(|(node, inst)| replaced.remove(&node).unwrap_or_else(|| inst.clone()))
            .collect(),
    )
}

/// The standard gate of an unconditioned gate instruction.
pub(crate) fn plain_standard(inst: &Instruction) -> Option<&StandardGate> {
    match &inst.kind {
        InstructionKind::Gate(gate) if gate.condition.is_none() => gate.as_standard(),
        _ => None,
    }
}

/// The operation that directly follows `node` on every one of its qubits,
/// acting on exactly the same qubits.
fn shared_successor(dag: &CircuitDag, node: NodeIndex, inst: &Instruction) -> Option<NodeIndex> {
    let mut next = None;
    for &q in &inst.qubits {
        let n = dag.next_on_wire(node, q.into())?;
        if next.is_some_and(|m| m != n) {
            return None;
        }
        next = Some(n);
    }
    let next = next?;
    let succ = dag.get_instruction(next)?;
    (succ.qubits.len() == inst.qubits.len()
        && succ.qubits.iter().all(|q| inst.qubits.contains(q)))
    .then_some(next)
}

fn constant_multiple(p: &ParameterExpression, period: f64) -> bool {
    p.as_f64().is_some_and(|v| is_multiple_of(v, period))
}

/// Check whether a gate acts as the identity up to global phase.
pub(crate) fn is_identity(gate: &StandardGate) -> bool {
    match gate {
        StandardGate::I => true,
        StandardGate::Rx(p)
        | StandardGate::Ry(p)
        | StandardGate::Rz(p)
        | StandardGate::P(p)
        | StandardGate::CP(p)
        | StandardGate::RXX(p)
        | StandardGate::RYY(p)
        | StandardGate::RZZ(p) => constant_multiple(p, 2.0 * PI),
        StandardGate::CRz(p) => constant_multiple(p, 4.0 * PI),
        StandardGate::U(theta, phi, lambda) => {
            constant_multiple(theta, 2.0 * PI)
                && constant_multiple(&(phi.clone() + lambda.clone()), 2.0 * PI)
        }
        _ => false,
    }
}

fn params_equal(a: &ParameterExpression, b: &ParameterExpression) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() < 1e-9,
        _ => a == b,
    }
}

fn gates_equal(a: &StandardGate, b: &StandardGate) -> bool {
    a.name() == b.name()
        && a
            .parameters()
            .iter()
            .zip(b.parameters())
            .all(|(x, y)| params_equal(x, y))
}

fn is_symmetric(gate: &StandardGate) -> bool {
    matches!(
        gate,
        StandardGate::CZ
            | StandardGate::Swap
            | StandardGate::CP(_)
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_)
    )
}

fn cancels(first: &StandardGate, second: &StandardGate, same_order: bool) -> bool {
    (same_order || is_symmetric(first)) && gates_equal(&first.inverse(), second)
}

fn merge(first: &StandardGate, second: &StandardGate, same_order: bool) -> Option<StandardGate> {
    if !same_order && !is_symmetric(first) {
        return None;
    }
    let sum = |a: &ParameterExpression, b: &ParameterExpression| (a.clone() + b.clone()).simplify();
    Some(match (first, second) {
        (StandardGate::Rx(a), StandardGate::Rx(b)) => StandardGate::Rx(sum(a, b)),
        (StandardGate::Ry(a), StandardGate::Ry(b)) => StandardGate::Ry(sum(a, b)),
        (StandardGate::Rz(a), StandardGate::Rz(b)) => StandardGate::Rz(sum(a, b)),
        (StandardGate::P(a), StandardGate::P(b)) => StandardGate::P(sum(a, b)),
        (StandardGate::CRz(a), StandardGate::CRz(b)) => StandardGate::CRz(sum(a, b)),
        (StandardGate::CP(a), StandardGate::CP(b)) => StandardGate::CP(sum(a, b)),
        (StandardGate::RXX(a), StandardGate::RXX(b)) => StandardGate::RXX(sum(a, b)),
        (StandardGate::RYY(a), StandardGate::RYY(b)) => StandardGate::RYY(sum(a, b)),
        (StandardGate::RZZ(a), StandardGate::RZZ(b)) => StandardGate::RZZ(sum(a, b)),
        _ => return None,
    })
}
