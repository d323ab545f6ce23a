//! 2x2 unitary arithmetic for single-qubit synthesis.

use num_complex::Complex64;
use std::f64::consts::PI;

use qport_ir::StandardGate;

/// Tolerance for floating point comparisons.
pub(crate) const EPSILON: f64 = 1e-10;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// A 2x2 unitary matrix in row-major order.
#[derive(Debug, Clone, Copy)]
pub struct Unitary2x2 {
    /// The matrix elements: [[a, b], [c, d]].
    pub data: [Complex64; 4],
}

impl Unitary2x2 {
    /// Create a matrix from its elements.
    pub fn new(a: Complex64, b: Complex64, c: Complex64, d: Complex64) -> Self {
        Self { data: [a, b, c, d] }
    }

    /// Identity.
    pub fn identity() -> Self {
        Self::new(ONE, ZERO, ZERO, ONE)
    }

    fn diag_phase(lambda: f64) -> Self {
        Self::new(ONE, ZERO, ZERO, Complex64::from_polar(1.0, lambda))
    }

    /// Hadamard.
    pub fn h() -> Self {
        let s = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
        Self::new(s, s, s, -s)
    }

    /// Pauli-X.
    pub fn x() -> Self {
        Self::new(ZERO, ONE, ONE, ZERO)
    }

    /// Pauli-Y.
    pub fn y() -> Self {
        Self::new(ZERO, Complex64::new(0.0, -1.0), Complex64::new(0.0, 1.0), ZERO)
    }

    /// Pauli-Z.
    pub fn z() -> Self {
        Self::new(ONE, ZERO, ZERO, -ONE)
    }

    /// sqrt(X).
    pub fn sx() -> Self {
        let p = Complex64::new(0.5, 0.5);
        let m = Complex64::new(0.5, -0.5);
        Self::new(p, m, m, p)
    }

    /// Rx(θ).
    pub fn rx(theta: f64) -> Self {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        Self::new(c, s, s, c)
    }

    /// Ry(θ).
    pub fn ry(theta: f64) -> Self {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new((theta / 2.0).sin(), 0.0);
        Self::new(c, -s, s, c)
    }

    /// Rz(θ).
    pub fn rz(theta: f64) -> Self {
        Self::new(
            Complex64::from_polar(1.0, -theta / 2.0),
            ZERO,
            ZERO,
            Complex64::from_polar(1.0, theta / 2.0),
        )
    }

    /// U(θ, φ, λ).
    pub fn u(theta: f64, phi: f64, lambda: f64) -> Self {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        Self::new(
            Complex64::new(c, 0.0),
            -Complex64::from_polar(s, lambda),
            Complex64::from_polar(s, phi),
            Complex64::from_polar(c, phi + lambda),
        )
    }

    /// Matrix of a single-qubit standard gate with numeric parameters.
    ///
    /// Returns `None` for multi-qubit gates and symbolic angles.
    pub fn from_gate(gate: &StandardGate) -> Option<Self> {
        let angle = |p: &qport_ir::ParameterExpression| p.as_f64();
        Some(match gate {
            StandardGate::I => Self::identity(),
            StandardGate::X => Self::x(),
            StandardGate::Y => Self::y(),
            StandardGate::Z => Self::z(),
            StandardGate::H => Self::h(),
            StandardGate::S => Self::diag_phase(PI / 2.0),
            StandardGate::Sdg => Self::diag_phase(-PI / 2.0),
            StandardGate::T => Self::diag_phase(PI / 4.0),
            StandardGate::Tdg => Self::diag_phase(-PI / 4.0),
            StandardGate::SX => Self::sx(),
            StandardGate::SXdg => Self::sx().adjoint(),
            StandardGate::Rx(t) => Self::rx(angle(t)?),
            StandardGate::Ry(t) => Self::ry(angle(t)?),
            StandardGate::Rz(t) => Self::rz(angle(t)?),
            StandardGate::P(l) => Self::diag_phase(angle(l)?),
            StandardGate::U(t, p, l) => Self::u(angle(t)?, angle(p)?, angle(l)?),
            _ => return None,
        })
    }

    /// Conjugate transpose.
    #[must_use]
    pub fn adjoint(&self) -> Self {
        let [a, b, c, d] = self.data;
        Self::new(a.conj(), c.conj(), b.conj(), d.conj())
    }

    /// Matrix product `self · other` (apply `other` first).
    #[must_use]
    pub fn mul(&self, other: &Self) -> Self {
        let [a, b, c, d] = self.data;
        let [e, f, g, h] = other.data;
        Self::new(a * e + b * g, a * f + b * h, c * e + d * g, c * f + d * h)
    }

    /// Check equality up to a global phase.
    pub fn approx_eq_up_to_phase(&self, other: &Self) -> bool {
        let pivot = (0..4).max_by(|&i, &j| {
            other.data[i]
                .norm()
                .partial_cmp(&other.data[j].norm())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let Some(k) = pivot else {
            return false;
        };
        if other.data[k].norm() < EPSILON {
            return false;
        }
        let phase = self.data[k] / other.data[k];
        if (phase.norm() - 1.0).abs() > 1e-8 {
            return false;
        }
        self.data
            .iter()
            .zip(&other.data)
            .all(|(x, y)| (x - phase * y).norm() < 1e-8)
    }

    /// Check whether the matrix is the identity up to a global phase.
    pub fn is_identity(&self) -> bool {
        self.approx_eq_up_to_phase(&Self::identity())
    }

    /// Decompose as `Rz(α)·Ry(β)·Rz(γ)` up to a global phase.
    ///
    /// Returns `(α, β, γ, phase)` with `β` in `[0, π]`.
    pub fn zyz_decomposition(&self) -> (f64, f64, f64, f64) {
        let [a, b, c, d] = self.data;
        let det = a * d - b * c;
        let global_phase = det.arg() / 2.0;

        let unphase = Complex64::from_polar(1.0, -global_phase);
        let a = a * unphase;
        let c = c * unphase;

        let beta = 2.0 * a.norm().clamp(0.0, 1.0).acos();

        if beta.abs() < EPSILON {
            return (-2.0 * a.arg(), 0.0, 0.0, global_phase);
        }
        if (beta - PI).abs() < EPSILON {
            return (2.0 * c.arg(), PI, 0.0, global_phase);
        }

        // a = cos(β/2)·e^{-i(α+γ)/2}, c = sin(β/2)·e^{i(α-γ)/2}
        let sum = -2.0 * a.arg();
        let diff = 2.0 * c.arg();
        (
            f64::midpoint(sum, diff),
            beta,
            (sum - diff) / 2.0,
            global_phase,
        )
    }

    /// Angles `(a, b, c)` with `U = Rz(a)·Rx(b)·Rz(c)` up to a global phase.
    pub fn zxz_angles(&self) -> (f64, f64, f64) {
        let (alpha, beta, gamma, _) = self.zyz_decomposition();
        (
            normalize_angle(alpha + PI / 2.0),
            beta,
            normalize_angle(gamma - PI / 2.0),
        )
    }
}

impl Default for Unitary2x2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Unitary2x2 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Unitary2x2::mul(&self, &rhs)
    }
}

/// Normalize an angle into `(-π, π]`. Non-finite input maps to 0.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle.rem_euclid(2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Check whether an angle is a multiple of `period`.
pub(crate) fn is_multiple_of(angle: f64, period: f64) -> bool {
    let r = angle.rem_euclid(period);
    r < 1e-9 || (period - r) < 1e-9
}
