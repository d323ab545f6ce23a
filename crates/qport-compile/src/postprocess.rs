//! Moving trailing single-qubit gates into classical postprocessing.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use qport_ir::{Circuit, NodeIndex, StandardGate, WireId};

use crate::error::CompileResult;
use crate::passes::redundancy::plain_standard;

/// Classical corrections to apply to each readout.
///
/// Readout positions follow the measured classical bits in declaration
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostprocessCircuit {
    /// Readout positions to invert.
    pub flips: Vec<usize>,
}

impl PostprocessCircuit {
    /// Check whether this does nothing.
    pub fn is_empty(&self) -> bool {
        self.flips.is_empty()
    }

    /// Apply the corrections to one readout.
    pub fn apply(&self, readout: &[bool]) -> Vec<bool> {
        let mut out = readout.to_vec();
        for &i in &self.flips {
            if let Some(bit) = out.get_mut(i) {
                *bit = !*bit;
            }
        }
        out
    }
}

/// Strip gates before final measurements that only permute or phase basis
/// states.
///
/// Diagonal gates are dropped. With `allow_classical`, `X` and `Y` become
/// bit flips on the readout. Returns the circuit to run and the correction.
pub fn prepare_circuit(
    circuit: &Circuit,
    allow_classical: bool,
) -> CompileResult<(Circuit, PostprocessCircuit)> {
    let dag = circuit.dag();

    let mut measured: Vec<usize> = dag
        .topological_ops()
        .filter(|(_, inst)| inst.is_measure())
        .flat_map(|(_, inst)| inst.clbits.iter().filter_map(|&c| circuit.clbit_index(c)))
        .collect();
    measured.sort_unstable();
    measured.dedup();

    let mut removed: FxHashSet<NodeIndex> = FxHashSet::default();
    let mut flipped: Vec<usize> = vec![];

    for (node, inst) in dag.topological_ops() {
        if !inst.is_measure() || inst.qubits.len() != 1 {
            continue;
        }
        let (q, c) = (inst.qubits[0], inst.clbits[0]);
        if dag.next_on_wire(node, WireId::Qubit(q)).is_some()
            || dag.next_on_wire(node, WireId::Clbit(c)).is_some()
        {
            continue;
        }

        let mut flip = false;
        let mut current = node;
        while let Some(prev) = dag.prev_on_wire(current, WireId::Qubit(q)) {
            let Some(gate) = dag
                .get_instruction(prev)
                .filter(|i| i.qubits.len() == 1)
                .and_then(plain_standard)
            else {
                break;
            };
            if gate.is_diagonal() {
                removed.insert(prev);
            } else if allow_classical && matches!(gate, StandardGate::X | StandardGate::Y) {
                flip = !flip;
                removed.insert(prev);
            } else {
                break;
            }
            current = prev;
        }

        if flip {
            let position = circuit
                .clbit_index(c)
                .and_then(|index| measured.binary_search(&index).ok());
            if let Some(position) = position {
                flipped.push(position);
            }
        }
    }

    flipped.sort_unstable();
    debug!(
        "prepare_circuit removed {} gates, {} readout flips",
        removed.len(),
        flipped.len()
    );

    let mut prepared = circuit.clone();
    if !removed.is_empty() {
        let kept = dag
            .topological_ops()
            .filter(|(node, _)| !removed.contains(node))
            .map(|(_, inst)| inst.clone())
            .collect();
        prepared.rebuild_with(kept)?;
    }
    Ok((prepared, PostprocessCircuit { flips: flipped }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qport_ir::{ClbitId, QubitId};

    fn sample() -> Circuit {
        let mut circuit = Circuit::with_size("pp", 3, 3);
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .x(QubitId(1))
            .unwrap()
            .t(QubitId(1))
            .unwrap()
            .x(QubitId(2))
            .unwrap()
            .measure_all()
            .unwrap();
        circuit
    }

    #[test]
    fn test_trailing_gates_become_flips() {
        let (prepared, ppcirc) = prepare_circuit(&sample(), true).unwrap();
        assert_eq!(ppcirc.flips, vec![1, 2]);
        let names: Vec<_> = prepared
            .instructions()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(names, ["h", "cx", "measure", "measure", "measure"]);
        assert_eq!(
            ppcirc.apply(&[false, false, false]),
            vec![false, true, true]
        );
    }

    #[test]
    fn test_without_classical_only_diagonals_go() {
        let (prepared, ppcirc) = prepare_circuit(&sample(), false).unwrap();
        assert!(ppcirc.is_empty());
        assert_eq!(prepared.n_gates_of("x"), 2);
        assert_eq!(prepared.n_gates_of("t"), 0);
    }

    #[test]
    fn test_mid_circuit_measure_untouched() {
        let mut circuit = Circuit::with_size("mid", 1, 1);
        circuit
            .x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .h(QubitId(0))
            .unwrap();
        let (prepared, ppcirc) = prepare_circuit(&circuit, true).unwrap();
        assert!(ppcirc.is_empty());
        assert_eq!(prepared.num_ops(), 3);
    }

    #[test]
    fn test_serde_shape() {
        let pp = PostprocessCircuit { flips: vec![0, 3] };
        assert_eq!(serde_json::to_string(&pp).unwrap(), r#"{"flips":[0,3]}"#);
    }
}
