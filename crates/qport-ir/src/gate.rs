//! Quantum gate types.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;

/// Gates with fixed semantics (the `qelib1.inc` set).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Hadamard.
    H,
    /// S = sqrt(Z).
    S,
    /// S-dagger.
    Sdg,
    /// T = fourth root of Z.
    T,
    /// T-dagger.
    Tdg,
    /// sqrt(X), also called V.
    SX,
    /// sqrt(X)-dagger.
    SXdg,
    /// Rotation about X.
    Rx(ParameterExpression),
    /// Rotation about Y.
    Ry(ParameterExpression),
    /// Rotation about Z.
    Rz(ParameterExpression),
    /// Phase gate diag(1, e^{iλ}).
    P(ParameterExpression),
    /// Generic single-qubit gate U(θ, φ, λ).
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),
    /// Controlled-X.
    CX,
    /// Controlled-Y.
    CY,
    /// Controlled-Z.
    CZ,
    /// Controlled-Hadamard.
    CH,
    /// SWAP.
    Swap,
    /// Controlled Rz.
    CRz(ParameterExpression),
    /// Controlled phase.
    CP(ParameterExpression),
    /// exp(-iθ/2 XX).
    RXX(ParameterExpression),
    /// exp(-iθ/2 YY).
    RYY(ParameterExpression),
    /// exp(-iθ/2 ZZ).
    RZZ(ParameterExpression),
    /// Toffoli.
    CCX,
}

impl StandardGate {
    /// Lower-case OpenQASM name.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(..) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
        }
    }

    /// Number of qubits the gate acts on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_) => 2,
            StandardGate::CCX => 3,
            _ => 1,
        }
    }

    /// Parameters, in declaration order.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p)
            | StandardGate::RXX(p)
            | StandardGate::RYY(p)
            | StandardGate::RZZ(p) => vec![p],
            StandardGate::U(a, b, c) => vec![a, b, c],
            _ => vec![],
        }
    }

    /// Check whether any parameter is symbolic.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Check whether the gate is diagonal in the computational basis.
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            StandardGate::I
                | StandardGate::Z
                | StandardGate::S
                | StandardGate::Sdg
                | StandardGate::T
                | StandardGate::Tdg
                | StandardGate::Rz(_)
                | StandardGate::P(_)
                | StandardGate::CZ
                | StandardGate::CRz(_)
                | StandardGate::CP(_)
                | StandardGate::RZZ(_)
        )
    }

    /// The inverse gate.
    pub fn inverse(&self) -> StandardGate {
        match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::SX => StandardGate::SXdg,
            StandardGate::SXdg => StandardGate::SX,
            StandardGate::U(theta, phi, lambda) => {
                StandardGate::U(-theta.clone(), -lambda.clone(), -phi.clone())
            }
            other => other.map_params(|p| -p.clone()),
        }
    }

    /// Apply `f` to every parameter.
    #[must_use]
    pub fn map_params(&self, f: impl Fn(&ParameterExpression) -> ParameterExpression) -> Self {
        match self {
            StandardGate::Rx(p) => StandardGate::Rx(f(p)),
            StandardGate::Ry(p) => StandardGate::Ry(f(p)),
            StandardGate::Rz(p) => StandardGate::Rz(f(p)),
            StandardGate::P(p) => StandardGate::P(f(p)),
            StandardGate::U(a, b, c) => StandardGate::U(f(a), f(b), f(c)),
            StandardGate::CRz(p) => StandardGate::CRz(f(p)),
            StandardGate::CP(p) => StandardGate::CP(f(p)),
            StandardGate::RXX(p) => StandardGate::RXX(f(p)),
            StandardGate::RYY(p) => StandardGate::RYY(f(p)),
            StandardGate::RZZ(p) => StandardGate::RZZ(f(p)),
            other => other.clone(),
        }
    }
}

/// Either a standard gate or a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateKind {
    /// A standard gate.
    Standard(StandardGate),
    /// A user-defined box.
    Custom(CustomGate),
}

impl GateKind {
    /// Name of the gate.
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            GateKind::Standard(g) => g.name(),
            GateKind::Custom(g) => &g.name,
        }
    }

    /// Number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Custom(g) => g.num_qubits,
        }
    }

    /// Parameters of the gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            GateKind::Standard(g) => g.parameters(),
            GateKind::Custom(g) => g.params.iter().collect(),
        }
    }
}

/// Body of a box: formal parameters and instructions over local qubits
/// `0..num_qubits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    /// Formal parameter names.
    pub params: Vec<String>,
    /// Number of formal qubits.
    pub num_qubits: u32,
    /// Instructions, addressing qubits by local index.
    pub body: Vec<Instruction>,
}

impl GateDefinition {
    /// Create a definition.
    pub fn new(params: Vec<String>, num_qubits: u32, body: Vec<Instruction>) -> Self {
        Self {
            params,
            num_qubits,
            body,
        }
    }

    /// Instantiate the body for concrete arguments and qubits.
    pub fn expand(
        &self,
        name: &str,
        args: &[ParameterExpression],
        qubits: &[QubitId],
    ) -> IrResult<Vec<Instruction>> {
        if args.len() != self.params.len() {
            return Err(IrError::DefinitionArity {
                name: name.to_string(),
                what: "parameters",
                expected: self.params.len(),
                got: args.len(),
            });
        }
        if qubits.len() != self.num_qubits as usize {
            return Err(IrError::DefinitionArity {
                name: name.to_string(),
                what: "qubits",
                expected: self.num_qubits as usize,
                got: qubits.len(),
            });
        }

        let bind = |p: &ParameterExpression| {
            self.params
                .iter()
                .zip(args)
                .fold(p.clone(), |acc, (formal, actual)| {
                    acc.substitute(formal, actual)
                })
                .simplify()
        };

        let mut out = Vec::with_capacity(self.body.len());
        for inst in &self.body {
            let mapped_qubits = inst
                .qubits
                .iter()
                .map(|q| {
                    qubits
                        .get(q.0 as usize)
                        .copied()
                        .ok_or_else(|| IrError::QubitNotFound {
                            qubit: *q,
                            gate_name: Some(name.to_string()),
                        })
                })
                .collect::<IrResult<Vec<_>>>()?;

            let kind = match &inst.kind {
                InstructionKind::Gate(gate) => {
                    let kind = match &gate.kind {
                        GateKind::Standard(sg) => GateKind::Standard(sg.map_params(bind)),
                        GateKind::Custom(cg) => {
                            let mut cg = cg.clone();
                            cg.params = cg.params.iter().map(bind).collect();
                            GateKind::Custom(cg)
                        }
                    };
                    InstructionKind::Gate(Gate {
                        kind,
                        label: gate.label.clone(),
                        condition: gate.condition.clone(),
                    })
                }
                other => other.clone(),
            };

            out.push(Instruction {
                kind,
                qubits: mapped_qubits,
                clbits: inst.clbits.clone(),
            });
        }
        Ok(out)
    }
}

/// A named box, optionally carrying its definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomGate {
    /// Name of the box.
    pub name: String,
    /// Number of qubits it acts on.
    pub num_qubits: u32,
    /// Actual parameter values.
    pub params: Vec<ParameterExpression>,
    /// Body, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Box<GateDefinition>>,
}

impl CustomGate {
    /// Create an opaque box.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            params: vec![],
            definition: None,
        }
    }

    /// Set the actual parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParameterExpression>) -> Self {
        self.params = params;
        self
    }

    /// Attach a definition.
    #[must_use]
    pub fn with_definition(mut self, definition: GateDefinition) -> Self {
        self.definition = Some(Box::new(definition));
        self
    }
}

/// Condition `register == value` guarding a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalCondition {
    /// Classical register name.
    pub register: String,
    /// Value the register must hold (little-endian over its bits).
    pub value: u64,
}

impl ClassicalCondition {
    /// Create a condition.
    pub fn new(register: impl Into<String>, value: u64) -> Self {
        Self {
            register: register.into(),
            value,
        }
    }
}

/// A gate with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// What the gate is.
    pub kind: GateKind,
    /// Optional label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Optional classical condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Gate {
    /// Wrap a standard gate.
    pub fn standard(gate: StandardGate) -> Self {
        Self {
            kind: GateKind::Standard(gate),
            label: None,
            condition: None,
        }
    }

    /// Wrap a box.
    pub fn custom(gate: CustomGate) -> Self {
        Self {
            kind: GateKind::Custom(gate),
            label: None,
            condition: None,
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attach a classical condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Name of the gate.
    pub fn name(&self) -> &str {
        self.kind.name()
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.kind.num_qubits()
    }

    /// The standard gate, if this is one.
    pub fn as_standard(&self) -> Option<&StandardGate> {
        match &self.kind {
            GateKind::Standard(g) => Some(g),
            GateKind::Custom(_) => None,
        }
    }
}

impl From<StandardGate> for Gate {
    fn from(gate: StandardGate) -> Self {
        Gate::standard(gate)
    }
}

impl From<CustomGate> for Gate {
    fn from(gate: CustomGate) -> Self {
        Gate::custom(gate)
    }
}
