//! Translation into a target gate set.

use std::f64::consts::FRAC_PI_2;

use rustc_hash::FxHashSet;
use tracing::debug;

use qport_ir::{Circuit, Gate, GateKind, Instruction, InstructionKind, ParameterExpression, QubitId, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;
use crate::synthesis::{EulerBasis, zyz_angles};

const MAX_DEPTH: usize = 8;

/// Rewrite every gate outside `target` using a fixed decomposition library.
///
/// Single-qubit gates are resynthesised through Euler angles. Multi-qubit
/// gates are expanded into CX and single-qubit gates, and CX itself into CZ
/// or XX when the target lacks it.
#[derive(Debug, Clone)]
pub struct Rebase {
    target: FxHashSet<String>,
}

impl Rebase {
    /// Create a rebase into the named gates.
    pub fn new(target: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            target: target.into_iter().map(Into::into).collect(),
        }
    }

    fn contains(&self, name: &str) -> bool {
        self.target.contains(name)
    }

    fn not_in_basis(&self, gate: &str) -> CompileError {
        let mut names: Vec<_> = self.target.iter().map(String::as_str).collect();
        names.sort_unstable();
        CompileError::GateNotInBasis {
            gate: gate.to_string(),
            target: names.join(", "),
        }
    }

    fn rebase_gate(
        &self,
        gate: &StandardGate,
        qubits: &[QubitId],
        depth: usize,
        out: &mut Vec<(StandardGate, Vec<QubitId>)>,
    ) -> CompileResult<()> {
        if self.contains(gate.name()) {
            out.push((gate.clone(), qubits.to_vec()));
            return Ok(());
        }
        if depth > MAX_DEPTH {
            return Err(self.not_in_basis(gate.name()));
        }

        if qubits.len() == 1 {
            let basis = EulerBasis::for_target(|n| self.contains(n))
                .ok_or_else(|| self.not_in_basis(gate.name()))?;
            let angles = zyz_angles(gate).ok_or_else(|| self.not_in_basis(gate.name()))?;
            for g in basis.emit(angles) {
                out.push((g, qubits.to_vec()));
            }
            return Ok(());
        }

        let steps = self
            .decompose(gate)
            .ok_or_else(|| self.not_in_basis(gate.name()))?;
        for (g, local) in steps {
            let mapped: Vec<_> = local.iter().map(|&i| qubits[i]).collect();
            self.rebase_gate(&g, &mapped, depth + 1, out)?;
        }
        Ok(())
    }

    /// One decomposition step over local qubit indices.
    fn decompose(&self, gate: &StandardGate) -> Option<Vec<(StandardGate, Vec<usize>)>> {
        use StandardGate as G;
        let c = ParameterExpression::Constant;
        let half = |p: &ParameterExpression| (p.clone() / c(2.0)).simplify();
        let neg_half = |p: &ParameterExpression| (-(p.clone() / c(2.0))).simplify();
        let cx = |a: usize, b: usize| (G::CX, vec![a, b]);
        let on = |g: StandardGate, q: usize| (g, vec![q]);

        Some(match gate {
            G::CX if self.contains("cz") => vec![on(G::H, 1), (G::CZ, vec![0, 1]), on(G::H, 1)],
            G::CX if self.contains("rxx") => vec![
                on(G::Ry(c(FRAC_PI_2)), 0),
                (G::RXX(c(FRAC_PI_2)), vec![0, 1]),
                on(G::Ry(c(-FRAC_PI_2)), 0),
                on(G::Rx(c(-FRAC_PI_2)), 1),
                on(G::Rz(c(-FRAC_PI_2)), 0),
            ],
            G::CX => return None,
            G::CY => vec![on(G::Sdg, 1), cx(0, 1), on(G::S, 1)],
            G::CZ => vec![on(G::H, 1), cx(0, 1), on(G::H, 1)],
            G::CH => vec![
                on(G::H, 1),
                on(G::Sdg, 1),
                cx(0, 1),
                on(G::H, 1),
                on(G::T, 1),
                cx(0, 1),
                on(G::T, 1),
                on(G::H, 1),
                on(G::S, 1),
                on(G::X, 1),
                on(G::S, 0),
            ],
            G::Swap => vec![cx(0, 1), cx(1, 0), cx(0, 1)],
            G::CRz(t) => vec![
                on(G::Rz(half(t)), 1),
                cx(0, 1),
                on(G::Rz(neg_half(t)), 1),
                cx(0, 1),
            ],
            G::CP(l) => vec![
                on(G::P(half(l)), 0),
                cx(0, 1),
                on(G::P(neg_half(l)), 1),
                cx(0, 1),
                on(G::P(half(l)), 1),
            ],
            G::RXX(t) => vec![
                on(G::H, 0),
                on(G::H, 1),
                cx(0, 1),
                on(G::Rz(t.clone()), 1),
                cx(0, 1),
                on(G::H, 0),
                on(G::H, 1),
            ],
            G::RYY(t) => vec![
                on(G::Rx(c(FRAC_PI_2)), 0),
                on(G::Rx(c(FRAC_PI_2)), 1),
                cx(0, 1),
                on(G::Rz(t.clone()), 1),
                cx(0, 1),
                on(G::Rx(c(-FRAC_PI_2)), 0),
                on(G::Rx(c(-FRAC_PI_2)), 1),
            ],
            G::RZZ(t) => vec![cx(0, 1), on(G::Rz(t.clone()), 1), cx(0, 1)],
            G::CCX => vec![
                on(G::H, 2),
                cx(1, 2),
                on(G::Tdg, 2),
                cx(0, 2),
                on(G::T, 2),
                cx(1, 2),
                on(G::Tdg, 2),
                cx(0, 2),
                on(G::T, 1),
                on(G::T, 2),
                on(G::H, 2),
                cx(0, 1),
                on(G::T, 0),
                on(G::Tdg, 1),
                cx(0, 1),
            ],
            _ => return None,
        })
    }
}

impl Pass for Rebase {
    fn name(&self) -> &'static str {
        "Rebase"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let instructions = circuit.instructions();
        let mut out = Vec::with_capacity(instructions.len());
        let mut rewritten = 0usize;

        for inst in instructions {
            let InstructionKind::Gate(gate) = &inst.kind else {
                out.push(inst);
                continue;
            };
            if self.contains(gate.name()) {
                out.push(inst);
                continue;
            }
            let GateKind::Standard(standard) = &gate.kind else {
                return Err(self.not_in_basis(gate.name()));
            };

            let mut pieces = vec![];
            self.rebase_gate(standard, &inst.qubits, 0, &mut pieces)?;
            rewritten += 1;
            for (g, qubits) in pieces {
                let mut new_gate = Gate::standard(g);
                new_gate.condition = gate.condition.clone();
                out.push(Instruction::gate(new_gate, qubits));
            }
        }

        debug!("Rebase rewrote {rewritten} gates");
        if rewritten > 0 {
            circuit.rebuild_with(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unitary::Unitary2x2;
    use num_complex::Complex64;

    const IONQ_LIKE: [&str; 9] = ["x", "y", "z", "rx", "ry", "rz", "h", "rxx", "measure"];

    /// 4x4 unitary of a two-qubit circuit, qubit 0 most significant.
    fn two_qubit_matrix(circuit: &Circuit) -> [[Complex64; 4]; 4] {
        let mut m = [[Complex64::new(0.0, 0.0); 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = Complex64::new(1.0, 0.0);
        }
        for inst in circuit.instructions() {
            let g = inst.as_standard().unwrap();
            let op = gate_4x4(g, &inst.qubits);
            m = matmul(&op, &m);
        }
        m
    }

    fn matmul(a: &[[Complex64; 4]; 4], b: &[[Complex64; 4]; 4]) -> [[Complex64; 4]; 4] {
        let mut r = [[Complex64::new(0.0, 0.0); 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                r[i][j] = (0..4).map(|k| a[i][k] * b[k][j]).sum();
            }
        }
        r
    }

    fn gate_4x4(g: &StandardGate, qubits: &[QubitId]) -> [[Complex64; 4]; 4] {
        let mut r = [[Complex64::new(0.0, 0.0); 4]; 4];
        if let Some(u) = Unitary2x2::from_gate(g) {
            let target = qubits[0].0 as usize;
            for i in 0..4 {
                for j in 0..4 {
                    let (bi, bj) = (bit(i, target), bit(j, target));
                    let (oi, oj) = (i & !mask(target), j & !mask(target));
                    if oi == oj {
                        r[i][j] = u.data[bi * 2 + bj];
                    }
                }
            }
            return r;
        }
        // Two-qubit gates act as a permutation with phases on basis states.
        for j in 0..4 {
            let (a, b) = (bit(j, qubits[0].0 as usize), bit(j, qubits[1].0 as usize));
            let one = Complex64::new(1.0, 0.0);
            let angle = |p: &ParameterExpression| p.as_f64().unwrap();
            match g {
                StandardGate::CX => r[with_bits(qubits, a, b ^ a)][j] = one,
                StandardGate::Swap => r[with_bits(qubits, b, a)][j] = one,
                StandardGate::CZ => r[j][j] = if a & b == 1 { -one } else { one },
                StandardGate::CRz(t) => {
                    let t = angle(t);
                    r[j][j] = match (a, b) {
                        (0, _) => one,
                        (_, 0) => Complex64::from_polar(1.0, -t / 2.0),
                        _ => Complex64::from_polar(1.0, t / 2.0),
                    };
                }
                StandardGate::RZZ(t) => {
                    let t = angle(t);
                    let sign = if a == b { -1.0 } else { 1.0 };
                    r[j][j] = Complex64::from_polar(1.0, sign * t / 2.0);
                }
                StandardGate::RXX(t) => {
                    let t = angle(t);
                    r[j][j] = Complex64::new((t / 2.0).cos(), 0.0);
                    r[with_bits(qubits, a ^ 1, b ^ 1)][j] = Complex64::new(0.0, -(t / 2.0).sin());
                }
                other => panic!("no matrix for {}", other.name()),
            }
        }
        r
    }

    fn mask(q: usize) -> usize {
        1 << (1 - q)
    }

    fn bit(i: usize, q: usize) -> usize {
        (i >> (1 - q)) & 1
    }

    fn with_bits(qubits: &[QubitId], a: usize, b: usize) -> usize {
        (a << (1 - qubits[0].0 as usize)) | (b << (1 - qubits[1].0 as usize))
    }

    fn eq_up_to_phase(a: &[[Complex64; 4]; 4], b: &[[Complex64; 4]; 4]) -> bool {
        let (i, j) = (0..16)
            .map(|k| (k / 4, k % 4))
            .max_by(|x, y| b[x.0][x.1].norm().total_cmp(&b[y.0][y.1].norm()))
            .unwrap();
        let phase = a[i][j] / b[i][j];
        (0..16).all(|k| (a[k / 4][k % 4] - phase * b[k / 4][k % 4]).norm() < 1e-8)
    }

    fn check_equivalent(gate: StandardGate, target: &[&str]) {
        let mut original = Circuit::with_size("g", 2, 0);
        original.gate(gate, [QubitId(0), QubitId(1)]).unwrap();
        let mut rebased = original.clone();
        Rebase::new(target.iter().copied()).run(&mut rebased).unwrap();

        for inst in rebased.instructions() {
            assert!(target.contains(&inst.name()), "{} escaped", inst.name());
        }
        assert!(eq_up_to_phase(
            &two_qubit_matrix(&rebased),
            &two_qubit_matrix(&original)
        ));
    }

    #[test]
    fn test_two_qubit_gates_into_xx_basis() {
        for gate in [
            StandardGate::CX,
            StandardGate::CZ,
            StandardGate::Swap,
            StandardGate::CRz(0.7.into()),
            StandardGate::RZZ(0.4.into()),
        ] {
            check_equivalent(gate, &IONQ_LIKE);
        }
    }

    #[test]
    fn test_two_qubit_gates_into_cx_basis() {
        for gate in [
            StandardGate::CZ,
            StandardGate::RXX(1.1.into()),
            StandardGate::CRz((-0.3).into()),
        ] {
            check_equivalent(gate, &["cx", "rz", "sx"]);
        }
    }

    #[test]
    fn test_single_qubit_into_zxz() {
        let mut circuit = Circuit::with_size("one", 1, 0);
        circuit.sx(QubitId(0)).unwrap().t(QubitId(0)).unwrap();
        Rebase::new(["rz", "rx"]).run(&mut circuit).unwrap();
        assert!(
            circuit
                .instructions()
                .iter()
                .all(|i| matches!(i.name(), "rz" | "rx"))
        );
    }

    #[test]
    fn test_missing_entangler_fails() {
        let mut circuit = Circuit::with_size("cx", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let err = Rebase::new(["rz", "rx"]).run(&mut circuit).unwrap_err();
        assert!(matches!(err, CompileError::GateNotInBasis { .. }));
    }

    #[test]
    fn test_symbolic_rotation_rebased() {
        let mut circuit = Circuit::with_size("sym", 1, 0);
        circuit
            .p(ParameterExpression::symbol("l"), QubitId(0))
            .unwrap();
        Rebase::new(["rz", "rx"]).run(&mut circuit).unwrap();
        assert_eq!(circuit.n_gates_of("rz"), 1);
        assert!(circuit.is_symbolic());
    }

    #[test]
    fn test_condition_kept_on_pieces() {
        let mut circuit = Circuit::with_size("cond", 2, 1);
        circuit
            .gate_if(StandardGate::CZ, [QubitId(0), QubitId(1)], "c", 1)
            .unwrap();
        Rebase::new(["cx", "h"]).run(&mut circuit).unwrap();
        let insts = circuit.instructions();
        assert_eq!(insts.len(), 3);
        assert!(insts.iter().all(|i| i.condition().is_some()));
    }
}
