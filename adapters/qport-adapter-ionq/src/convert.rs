//! Conversion of circuits into IonQ's JSON circuit format.

use serde::{Deserialize, Serialize};

use qport_compile::{PassManager, Rebase, RemoveRedundancies};
use qport_ir::{Circuit, GateKind, InstructionKind, ParameterExpression, QubitId, StandardGate};

use crate::error::{IonQError, IonQResult};

/// Operations IonQ devices accept.
pub const IONQ_GATES: [&str; 20] = [
    "x", "y", "z", "rx", "ry", "rz", "h", "cx", "s", "sdg", "t", "tdg", "sx", "sxdg", "swap",
    "rxx", "ryy", "rzz", "measure", "barrier",
];

/// Single-qubit gates in [`IONQ_GATES`].
pub const IONQ_SINGLEQS: [&str; 13] = [
    "x", "y", "z", "rx", "ry", "rz", "h", "s", "sdg", "t", "tdg", "sx", "sxdg",
];

/// Rebase into [`IONQ_GATES`], then clean up.
pub fn ionq_pass() -> PassManager {
    PassManager::named("IonQRebase")
        .with(Rebase::new(IONQ_GATES))
        .with(RemoveRedundancies)
}

/// One IonQ gate.
///
/// Single-qubit gates set `target`; `cnot` sets `control` and `target`;
/// other two-qubit gates set `targets`. Rotations carry their angle in
/// radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonQGate {
    /// IonQ gate name.
    pub gate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl IonQGate {
    fn single(gate: &str, target: u32) -> Self {
        Self {
            gate: gate.into(),
            control: None,
            target: Some(target),
            targets: None,
            rotation: None,
        }
    }

    fn pair(gate: &str, targets: [u32; 2]) -> Self {
        Self {
            gate: gate.into(),
            control: None,
            target: None,
            targets: Some(targets.to_vec()),
            rotation: None,
        }
    }

    fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }
}

/// A circuit in IonQ's JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonQCircuit {
    /// Number of qubits.
    pub qubits: u32,
    /// Gates in order.
    pub circuit: Vec<IonQGate>,
}

fn angle(param: &ParameterExpression, gate: &str) -> IonQResult<f64> {
    if param.is_symbolic() {
        return Err(IonQError::SymbolicParameter(gate.to_string()));
    }
    match param.as_f64() {
        Some(value) if value.is_finite() => Ok(value),
        value => Err(IonQError::UnsupportedGate(format!(
            "{gate} with angle {}",
            value.unwrap_or(f64::NAN)
        ))),
    }
}

fn ionq_gate(gate: &StandardGate, qubits: &[u32]) -> IonQResult<IonQGate> {
    use StandardGate as G;
    let unsupported = || IonQError::UnsupportedGate(gate.name().to_string());
    let q = |i: usize| qubits.get(i).copied().ok_or_else(unsupported);

    Ok(match gate {
        G::X => IonQGate::single("x", q(0)?),
        G::Y => IonQGate::single("y", q(0)?),
        G::Z => IonQGate::single("z", q(0)?),
        G::H => IonQGate::single("h", q(0)?),
        G::S => IonQGate::single("s", q(0)?),
        G::Sdg => IonQGate::single("si", q(0)?),
        G::T => IonQGate::single("t", q(0)?),
        G::Tdg => IonQGate::single("ti", q(0)?),
        G::SX => IonQGate::single("v", q(0)?),
        G::SXdg => IonQGate::single("vi", q(0)?),
        G::Rx(p) => IonQGate::single("rx", q(0)?).with_rotation(angle(p, "rx")?),
        G::Ry(p) => IonQGate::single("ry", q(0)?).with_rotation(angle(p, "ry")?),
        G::Rz(p) => IonQGate::single("rz", q(0)?).with_rotation(angle(p, "rz")?),
        G::CX => IonQGate {
            control: Some(q(0)?),
            ..IonQGate::single("cnot", q(1)?)
        },
        G::Swap => IonQGate::pair("swap", [q(0)?, q(1)?]),
        G::RXX(p) => IonQGate::pair("xx", [q(0)?, q(1)?]).with_rotation(angle(p, "rxx")?),
        G::RYY(p) => IonQGate::pair("yy", [q(0)?, q(1)?]).with_rotation(angle(p, "ryy")?),
        G::RZZ(p) => IonQGate::pair("zz", [q(0)?, q(1)?]).with_rotation(angle(p, "rzz")?),
        _ => return Err(unsupported()),
    })
}

/// Convert a circuit in the IonQ gate set.
///
/// Returns the JSON circuit and the measure permutation: the measured qubit
/// indices, ordered by the classical bit they are read into. Barriers are
/// dropped.
pub fn tk_to_ionq(circuit: &Circuit) -> IonQResult<(IonQCircuit, Vec<u32>)> {
    let index = |id: QubitId| {
        circuit
            .qubit_index(id)
            .and_then(|i| u32::try_from(i).ok())
            .ok_or_else(|| IonQError::UnsupportedGate(format!("operation on unknown qubit {id}")))
    };

    let mut gates = vec![];
    let mut measures: Vec<(usize, u32)> = vec![];
    for inst in circuit.instructions() {
        let qubits = inst
            .qubits
            .iter()
            .map(|&q| index(q))
            .collect::<IonQResult<Vec<_>>>()?;
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                if gate.condition.is_some() {
                    return Err(IonQError::UnsupportedGate(format!(
                        "conditional {}",
                        gate.name()
                    )));
                }
                match &gate.kind {
                    GateKind::Standard(sg) => gates.push(ionq_gate(sg, &qubits)?),
                    GateKind::Custom(cg) => {
                        return Err(IonQError::UnsupportedGate(cg.name.clone()));
                    }
                }
            }
            InstructionKind::Measure => {
                for (q, c) in qubits.iter().zip(&inst.clbits) {
                    let bit = circuit.clbit_index(*c).ok_or_else(|| {
                        IonQError::UnsupportedGate(format!("measure into unknown bit {c}"))
                    })?;
                    measures.push((bit, *q));
                }
            }
            InstructionKind::Barrier => {}
            InstructionKind::Reset => return Err(IonQError::UnsupportedGate("reset".into())),
        }
    }

    measures.sort_unstable();
    let permutation = measures.into_iter().map(|(_, q)| q).collect();
    let qubits = u32::try_from(circuit.num_qubits())
        .map_err(|_| IonQError::UnsupportedGate("circuit is too wide".into()))?;
    Ok((
        IonQCircuit {
            qubits,
            circuit: gates,
        },
        permutation,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qport_compile::{GateSetPredicate, Pass, Predicate};
    use qport_ir::ClbitId;
    use serde_json::json;

    #[test]
    fn test_gate_json() {
        let mut circuit = Circuit::with_size("gates", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.sdg(QubitId(1)).unwrap();
        circuit.sx(QubitId(2)).unwrap();
        circuit.rz(0.5, QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        circuit.rxx(0.25, QubitId(1), QubitId(2)).unwrap();
        circuit.barrier([QubitId(0), QubitId(1)]).unwrap();
        circuit.swap(QubitId(0), QubitId(1)).unwrap();

        let (body, perm) = tk_to_ionq(&circuit).unwrap();
        assert!(perm.is_empty());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "qubits": 3,
                "circuit": [
                    {"gate": "h", "target": 0},
                    {"gate": "si", "target": 1},
                    {"gate": "v", "target": 2},
                    {"gate": "rz", "target": 0, "rotation": 0.5},
                    {"gate": "cnot", "control": 0, "target": 2},
                    {"gate": "xx", "targets": [1, 2], "rotation": 0.25},
                    {"gate": "swap", "targets": [0, 1]},
                ]
            })
        );
    }

    #[test]
    fn test_measure_permutation_follows_bits() {
        let mut circuit = Circuit::with_size("perm", 3, 3);
        circuit.measure(QubitId(0), ClbitId(2)).unwrap();
        circuit.measure(QubitId(2), ClbitId(0)).unwrap();
        circuit.measure(QubitId(1), ClbitId(1)).unwrap();

        let (body, perm) = tk_to_ionq(&circuit).unwrap();
        assert!(body.circuit.is_empty());
        assert_eq!(perm, vec![2, 1, 0]);
    }

    #[test]
    fn test_rejects_gates_outside_the_set() {
        let mut circuit = Circuit::with_size("ccx", 3, 0);
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        assert!(matches!(
            tk_to_ionq(&circuit),
            Err(IonQError::UnsupportedGate(ref g)) if g == "ccx"
        ));

        let mut circuit = Circuit::with_size("sym", 1, 0);
        circuit
            .rx(ParameterExpression::symbol("theta"), QubitId(0))
            .unwrap();
        assert!(matches!(
            tk_to_ionq(&circuit),
            Err(IonQError::SymbolicParameter(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_angles() {
        let infinite = ParameterExpression::constant(f64::INFINITY);
        let undefined = ParameterExpression::constant(1.0) / ParameterExpression::constant(0.0);
        for param in [infinite, undefined, ParameterExpression::constant(f64::NAN)] {
            let mut circuit = Circuit::with_size("inf", 2, 0);
            circuit.rz(param.clone(), QubitId(0)).unwrap();
            assert!(matches!(
                tk_to_ionq(&circuit),
                Err(IonQError::UnsupportedGate(ref g)) if g.starts_with("rz with angle")
            ));

            let mut circuit = Circuit::with_size("inf", 2, 0);
            circuit.rzz(param, QubitId(0), QubitId(1)).unwrap();
            assert!(tk_to_ionq(&circuit).is_err());
        }
    }

    #[test]
    fn test_ionq_pass_reaches_gate_set() {
        let mut circuit = Circuit::with_size("toffoli", 3, 0);
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        circuit.cz(QubitId(0), QubitId(1)).unwrap();
        circuit.u(0.1, 0.2, 0.3, QubitId(2)).unwrap();

        ionq_pass().run(&mut circuit).unwrap();
        assert!(GateSetPredicate::new(IONQ_GATES).verify(&circuit));
        assert!(tk_to_ionq(&circuit).is_ok());
    }
}
