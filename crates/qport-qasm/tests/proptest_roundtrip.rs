//! Property-based tests for QASM 2.0 roundtrip conversion.
//!
//! Tests that circuit → QASM → circuit preserves registers, structure and
//! gate parameters.

use proptest::prelude::*;
use qport_ir::{Circuit, QubitId, StandardGate};
use qport_qasm::{circuit_from_qasm, circuit_to_qasm};

/// Gate operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum GateOp {
    H(u32),
    X(u32),
    Sdg(u32),
    Rz(f64, u32),
    U(f64, f64, f64, u32),
    CX(u32, u32),
    Rzz(f64, u32, u32),
    Ryy(f64, u32, u32),
    Measure(u32),
}

impl GateOp {
    fn apply(self, circuit: &mut Circuit) {
        let _ = match self {
            GateOp::H(q) => circuit.h(QubitId(q)),
            GateOp::X(q) => circuit.x(QubitId(q)),
            GateOp::Sdg(q) => circuit.sdg(QubitId(q)),
            GateOp::Rz(a, q) => circuit.rz(a, QubitId(q)),
            GateOp::U(t, p, l, q) => circuit.u(t, p, l, QubitId(q)),
            GateOp::CX(c, t) => circuit.cx(QubitId(c), QubitId(t)),
            GateOp::Rzz(a, q1, q2) => circuit.rzz(a, QubitId(q1), QubitId(q2)),
            GateOp::Ryy(a, q1, q2) => circuit.ryy(a, QubitId(q1), QubitId(q2)),
            GateOp::Measure(q) => circuit.measure(QubitId(q), qport_ir::ClbitId(q)),
        };
    }
}

/// Angles that are either pi fractions or arbitrary reals.
fn arb_angle() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-8_i32..=8, prop::sample::select(vec![1.0, 2.0, 4.0, 8.0]))
            .prop_map(|(n, d)| f64::from(n) * std::f64::consts::PI / d),
        -10.0_f64..10.0,
    ]
}

fn arb_gate_op(num_qubits: u32) -> impl Strategy<Value = GateOp> {
    let single = prop_oneof![
        (0..num_qubits).prop_map(GateOp::H),
        (0..num_qubits).prop_map(GateOp::X),
        (0..num_qubits).prop_map(GateOp::Sdg),
        (arb_angle(), 0..num_qubits).prop_map(|(a, q)| GateOp::Rz(a, q)),
        (arb_angle(), arb_angle(), arb_angle(), 0..num_qubits)
            .prop_map(|(t, p, l, q)| GateOp::U(t, p, l, q)),
        (0..num_qubits).prop_map(GateOp::Measure),
    ];
    if num_qubits < 2 {
        single.boxed()
    } else {
        let pair = (0..num_qubits, 0..num_qubits)
            .prop_filter("Qubits must differ", |(a, b)| a != b);
        prop_oneof![
            3 => single,
            1 => pair.clone().prop_map(|(c, t)| GateOp::CX(c, t)),
            1 => (arb_angle(), pair.clone()).prop_map(|(a, (x, y))| GateOp::Rzz(a, x, y)),
            1 => (arb_angle(), pair).prop_map(|(a, (x, y))| GateOp::Ryy(a, x, y)),
        ]
        .boxed()
    }
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (1_u32..=5).prop_flat_map(|num_qubits| {
        prop::collection::vec(arb_gate_op(num_qubits), 1..=12).prop_map(move |ops| {
            let mut circuit = Circuit::with_size("test", num_qubits, num_qubits);
            for op in ops {
                op.apply(&mut circuit);
            }
            circuit
        })
    })
}

fn parameters(circuit: &Circuit) -> Vec<f64> {
    circuit
        .instructions()
        .iter()
        .filter_map(|inst| inst.as_standard().map(StandardGate::parameters))
        .flatten()
        .filter_map(qport_ir::ParameterExpression::as_f64)
        .collect()
}

proptest! {
    #[test]
    fn test_circuit_qasm_roundtrip_preserves_structure(circuit in arb_circuit()) {
        let qasm = circuit_to_qasm(&circuit).expect("Failed to write circuit as QASM");
        let parsed = circuit_from_qasm(&qasm).expect("Failed to read QASM back");

        prop_assert_eq!(parsed.num_qubits(), circuit.num_qubits());
        prop_assert_eq!(parsed.num_clbits(), circuit.num_clbits());
        prop_assert_eq!(parsed.qregs(), circuit.qregs());
        prop_assert_eq!(parsed.cregs(), circuit.cregs());
        prop_assert_eq!(parsed.num_ops(), circuit.num_ops());
        prop_assert_eq!(parsed.depth(), circuit.depth());

        let names: Vec<String> = circuit.instructions().iter().map(|i| i.name().to_string()).collect();
        let parsed_names: Vec<String> = parsed.instructions().iter().map(|i| i.name().to_string()).collect();
        prop_assert_eq!(parsed_names, names);
    }

    #[test]
    fn test_roundtrip_preserves_angles(circuit in arb_circuit()) {
        let qasm = circuit_to_qasm(&circuit).expect("Failed to write circuit as QASM");
        let parsed = circuit_from_qasm(&qasm).expect("Failed to read QASM back");

        let before = parameters(&circuit);
        let after = parameters(&parsed);
        prop_assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            prop_assert!((a - b).abs() < 1e-9, "angle {} became {}", a, b);
        }
    }

    #[test]
    fn test_empty_circuit_roundtrip(num_qubits in 1_u32..=10, num_clbits in 0_u32..=10) {
        let circuit = Circuit::with_size("empty", num_qubits, num_clbits);

        let qasm = circuit_to_qasm(&circuit).expect("Failed to write empty circuit");
        let parsed = circuit_from_qasm(&qasm).expect("Failed to read empty circuit");

        prop_assert_eq!(parsed.num_qubits(), num_qubits as usize);
        prop_assert_eq!(parsed.num_clbits(), num_clbits as usize);
        prop_assert_eq!(parsed.num_ops(), 0);
    }

    #[test]
    fn test_qasm_generation_is_deterministic(circuit in arb_circuit()) {
        let first = circuit_to_qasm(&circuit).expect("First conversion failed");
        let second = circuit_to_qasm(&circuit).expect("Second conversion failed");
        prop_assert_eq!(first, second);
    }
}
