//! Euler-angle synthesis of single-qubit gates.

use std::f64::consts::{FRAC_PI_2, PI};

use qport_ir::{ParameterExpression, StandardGate};

use crate::passes::redundancy::is_identity;
use crate::unitary::{Unitary2x2, normalize_angle};

/// Angles `(α, β, γ)` with `gate = Rz(α)·Ry(β)·Rz(γ)` up to global phase.
pub type EulerAngles = (ParameterExpression, ParameterExpression, ParameterExpression);

/// A family of single-qubit gate sequences able to express any rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EulerBasis {
    /// `Rz Ry Rz`.
    Zyz,
    /// `Rz Rx Rz`.
    Zxz,
    /// A single `U`.
    U,
    /// `Rz SX Rz SX Rz`.
    Zsx,
}

impl EulerBasis {
    /// The first basis whose gates all lie in `target`.
    pub fn for_target(target: impl Fn(&str) -> bool) -> Option<Self> {
        if target("rz") && target("ry") {
            Some(Self::Zyz)
        } else if target("rz") && target("rx") {
            Some(Self::Zxz)
        } else if target("u") {
            Some(Self::U)
        } else if target("rz") && target("sx") {
            Some(Self::Zsx)
        } else {
            None
        }
    }

    /// Gates, in circuit order, realising `Rz(α)·Ry(β)·Rz(γ)`.
    ///
    /// Rotations by a full turn are left out.
    pub fn emit(self, (alpha, beta, gamma): EulerAngles) -> Vec<StandardGate> {
        let beta_zero = beta.as_f64().is_some_and(|b| b.abs() < 1e-12);
        let gates = match self {
            Self::U => vec![StandardGate::U(beta, alpha, gamma)],
            _ if beta_zero => vec![StandardGate::Rz(add(&alpha, &gamma))],
            Self::Zyz => vec![
                StandardGate::Rz(gamma),
                StandardGate::Ry(beta),
                StandardGate::Rz(alpha),
            ],
            Self::Zxz => vec![
                StandardGate::Rz(offset(&gamma, -FRAC_PI_2)),
                StandardGate::Rx(beta),
                StandardGate::Rz(offset(&alpha, FRAC_PI_2)),
            ],
            Self::Zsx => vec![
                StandardGate::Rz(gamma),
                StandardGate::SX,
                StandardGate::Rz(offset(&beta, PI)),
                StandardGate::SX,
                StandardGate::Rz(offset(&alpha, PI)),
            ],
        };
        gates.into_iter().filter(|g| !is_identity(g)).collect()
    }
}

fn offset(p: &ParameterExpression, by: f64) -> ParameterExpression {
    match p.as_f64() {
        Some(v) => ParameterExpression::Constant(normalize_angle(v + by)),
        None => (p.clone() + ParameterExpression::Constant(by)).simplify(),
    }
}

fn add(a: &ParameterExpression, b: &ParameterExpression) -> ParameterExpression {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => ParameterExpression::Constant(normalize_angle(x + y)),
        _ => (a.clone() + b.clone()).simplify(),
    }
}

/// Euler angles of a single-qubit gate.
///
/// Numeric gates go through their matrix. Symbolic rotations keep their
/// expressions. Returns `None` for multi-qubit gates.
pub fn zyz_angles(gate: &StandardGate) -> Option<EulerAngles> {
    let c = ParameterExpression::Constant;
    if let Some(u) = Unitary2x2::from_gate(gate) {
        let (alpha, beta, gamma, _) = u.zyz_decomposition();
        return Some((
            c(normalize_angle(alpha)),
            c(beta),
            c(normalize_angle(gamma)),
        ));
    }
    match gate {
        StandardGate::Rz(t) | StandardGate::P(t) => Some((t.clone(), c(0.0), c(0.0))),
        StandardGate::Ry(t) => Some((c(0.0), t.clone(), c(0.0))),
        StandardGate::Rx(t) => Some((c(-FRAC_PI_2), t.clone(), c(FRAC_PI_2))),
        StandardGate::U(theta, phi, lambda) => Some((phi.clone(), theta.clone(), lambda.clone())),
        _ => None,
    }
}

/// Euler angles of a matrix.
pub fn zyz_angles_of(u: &Unitary2x2) -> EulerAngles {
    let (alpha, beta, gamma, _) = u.zyz_decomposition();
    (
        ParameterExpression::Constant(normalize_angle(alpha)),
        ParameterExpression::Constant(beta),
        ParameterExpression::Constant(normalize_angle(gamma)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix_of(gates: &[StandardGate]) -> Unitary2x2 {
        gates.iter().fold(Unitary2x2::identity(), |acc, g| {
            Unitary2x2::from_gate(g).unwrap() * acc
        })
    }

    #[test]
    fn test_every_basis_reproduces_hadamard() {
        let angles = zyz_angles(&StandardGate::H).unwrap();
        for basis in [EulerBasis::Zyz, EulerBasis::Zxz, EulerBasis::U, EulerBasis::Zsx] {
            let gates = basis.emit(angles.clone());
            assert!(
                matrix_of(&gates).approx_eq_up_to_phase(&Unitary2x2::h()),
                "{basis:?} failed"
            );
        }
    }

    #[test]
    fn test_diagonal_collapses_to_one_rz() {
        let gates = EulerBasis::Zxz.emit(zyz_angles(&StandardGate::T).unwrap());
        assert_eq!(gates.len(), 1);
        assert_eq!(gates[0].name(), "rz");
    }

    #[test]
    fn test_symbolic_rx_angles() {
        let theta = ParameterExpression::symbol("theta");
        let gates = EulerBasis::Zyz.emit(zyz_angles(&StandardGate::Rx(theta)).unwrap());
        let names: Vec<_> = gates.iter().map(StandardGate::name).collect();
        assert_eq!(names, ["rz", "ry", "rz"]);
        let bound: Vec<_> = gates
            .iter()
            .map(|g| g.map_params(|p| p.bind("theta", 0.8)))
            .collect();
        assert!(matrix_of(&bound).approx_eq_up_to_phase(&Unitary2x2::rx(0.8)));
    }

    #[test]
    fn test_for_target() {
        let set = ["rz", "rx", "cx"];
        assert_eq!(EulerBasis::for_target(|n| set.contains(&n)), Some(EulerBasis::Zxz));
        assert_eq!(EulerBasis::for_target(|n| n == "cx"), None);
    }
}
