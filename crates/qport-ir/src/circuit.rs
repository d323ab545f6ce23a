//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::{ClassicalCondition, Gate, StandardGate};
use crate::instruction::Instruction;
use crate::parameter::ParameterExpression;
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId, RegisterSlot};

/// A quantum circuit.
///
/// Wires keep their declaration order. Register membership lives on each
/// [`Qubit`] and [`Clbit`], so a register is simply the set of wires sharing
/// a register name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "CircuitData", try_from = "CircuitData")]
pub struct Circuit {
    /// Name of the circuit. Empty when unnamed.
    name: String,
    qubits: Vec<Qubit>,
    clbits: Vec<Clbit>,
    dag: CircuitDag,
    next_qubit_id: u32,
    next_clbit_id: u32,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new("")
    }
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            dag: CircuitDag::new(),
            next_qubit_id: 0,
            next_clbit_id: 0,
        }
    }

    /// Create a circuit with registers `q[num_qubits]` and `c[num_clbits]`.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        circuit.add_qreg("q", num_qubits);
        circuit.add_creg("c", num_clbits);
        circuit
    }

    /// Add a qubit outside any register.
    pub fn add_qubit(&mut self) -> QubitId {
        self.push_qubit(None)
    }

    /// Add a quantum register.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> Vec<QubitId> {
        let name = name.into();
        (0..size)
            .map(|i| self.push_qubit(Some(RegisterSlot::new(&name, i))))
            .collect()
    }

    /// Add a classical bit outside any register.
    pub fn add_clbit(&mut self) -> ClbitId {
        self.push_clbit(None)
    }

    /// Add a classical register.
    pub fn add_creg(&mut self, name: impl Into<String>, size: u32) -> Vec<ClbitId> {
        let name = name.into();
        (0..size)
            .map(|i| self.push_clbit(Some(RegisterSlot::new(&name, i))))
            .collect()
    }

    fn push_qubit(&mut self, slot: Option<RegisterSlot>) -> QubitId {
        let id = QubitId(self.next_qubit_id);
        self.next_qubit_id += 1;
        self.qubits.push(Qubit { id, slot });
        self.dag.add_qubit(id);
        id
    }

    fn push_clbit(&mut self, slot: Option<RegisterSlot>) -> ClbitId {
        let id = ClbitId(self.next_clbit_id);
        self.next_clbit_id += 1;
        self.clbits.push(Clbit { id, slot });
        self.dag.add_clbit(id);
        id
    }

    // =========================================================================
    // Gates
    // =========================================================================

    fn std1(&mut self, gate: StandardGate, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::single_qubit_gate(gate, qubit))
    }

    fn std2(&mut self, gate: StandardGate, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::two_qubit_gate(gate, q1, q2))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::H, qubit)
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::X, qubit)
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::Y, qubit)
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::Z, qubit)
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::S, qubit)
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::Sdg, qubit)
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::T, qubit)
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::Tdg, qubit)
    }

    /// Apply sqrt(X).
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::SX, qubit)
    }

    /// Apply sqrt(X)-dagger.
    pub fn sxdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.std1(StandardGate::SXdg, qubit)
    }

    /// Apply Rx(θ).
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.std1(StandardGate::Rx(theta.into()), qubit)
    }

    /// Apply Ry(θ).
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.std1(StandardGate::Ry(theta.into()), qubit)
    }

    /// Apply Rz(θ).
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.std1(StandardGate::Rz(theta.into()), qubit)
    }

    /// Apply the phase gate P(λ).
    pub fn p(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.std1(StandardGate::P(lambda.into()), qubit)
    }

    /// Apply U(θ, φ, λ).
    pub fn u(
        &mut self,
        theta: impl Into<ParameterExpression>,
        phi: impl Into<ParameterExpression>,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.std1(
            StandardGate::U(theta.into(), phi.into(), lambda.into()),
            qubit,
        )
    }

    /// Apply CNOT.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.std2(StandardGate::CX, control, target)
    }

    /// Apply controlled-Y.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.std2(StandardGate::CY, control, target)
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.std2(StandardGate::CZ, control, target)
    }

    /// Apply controlled-Hadamard.
    pub fn ch(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.std2(StandardGate::CH, control, target)
    }

    /// Apply SWAP.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.std2(StandardGate::Swap, q1, q2)
    }

    /// Apply controlled Rz(θ).
    pub fn crz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.std2(StandardGate::CRz(theta.into()), control, target)
    }

    /// Apply controlled phase.
    pub fn cp(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.std2(StandardGate::CP(lambda.into()), control, target)
    }

    /// Apply XX(θ).
    pub fn rxx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.std2(StandardGate::RXX(theta.into()), q1, q2)
    }

    /// Apply YY(θ).
    pub fn ryy(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.std2(StandardGate::RYY(theta.into()), q1, q2)
    }

    /// Apply ZZ(θ).
    pub fn rzz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.std2(StandardGate::RZZ(theta.into()), q1, q2)
    }

    /// Apply Toffoli.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    /// Apply an arbitrary gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.append(Instruction::gate(gate, qubits))
    }

    /// Apply a gate only when classical register `register` holds `value`.
    pub fn gate_if(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
        register: impl Into<String>,
        value: u64,
    ) -> IrResult<&mut Self> {
        let gate = gate
            .into()
            .with_condition(ClassicalCondition::new(register, value));
        self.append(Instruction::gate(gate, qubits))
    }

    /// Measure a qubit into a bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.append(Instruction::measure(qubit, clbit))
    }

    /// Measure every qubit `i` into bit `i`, adding a register `c` when
    /// there are too few bits.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        let missing = self.qubits.len().saturating_sub(self.clbits.len());
        if missing > 0 {
            let start = u32::try_from(self.clbits.len()).unwrap_or(u32::MAX);
            for i in 0..missing {
                let index = start.saturating_add(u32::try_from(i).unwrap_or(u32::MAX));
                self.push_clbit(Some(RegisterSlot::new("c", index)));
            }
        }
        let pairs: Vec<_> = self
            .qubits
            .iter()
            .zip(&self.clbits)
            .map(|(q, c)| (q.id, c.id))
            .collect();
        for (q, c) in pairs {
            self.measure(q, c)?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::reset(qubit))
    }

    /// Barrier across the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.append(Instruction::barrier(qubits))
    }

    /// Append an instruction, resolving any classical condition to the bits
    /// of its register.
    pub fn append(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        let reads = match instruction.condition() {
            Some(cond) => {
                let bits = self.creg_bits(&cond.register);
                if bits.is_empty() {
                    return Err(IrError::UnknownRegister(cond.register.clone()));
                }
                bits
            }
            None => vec![],
        };
        self.dag.apply_reading(instruction, &reads)?;
        Ok(self)
    }

    /// Replace the circuit body with `instructions` over the same wires.
    pub fn rebuild_with(&mut self, instructions: Vec<Instruction>) -> IrResult<()> {
        let mut dag = CircuitDag::new();
        for q in &self.qubits {
            dag.add_qubit(q.id);
        }
        for c in &self.clbits {
            dag.add_clbit(c.id);
        }
        let old = std::mem::replace(&mut self.dag, dag);
        for inst in instructions {
            if let Err(e) = self.append(inst) {
                self.dag = old;
                return Err(e);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.dag.num_qubits()
    }

    /// Number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.dag.num_clbits()
    }

    /// Number of operations, barriers included.
    pub fn num_ops(&self) -> usize {
        self.dag.num_ops()
    }

    /// Circuit depth.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// The underlying DAG.
    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    /// Qubits in declaration order.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Classical bits in declaration order.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Position of a qubit in declaration order.
    pub fn qubit_index(&self, id: QubitId) -> Option<usize> {
        self.qubits.iter().position(|q| q.id == id)
    }

    /// Position of a bit in declaration order.
    pub fn clbit_index(&self, id: ClbitId) -> Option<usize> {
        self.clbits.iter().position(|c| c.id == id)
    }

    /// Change the register slot of a qubit.
    pub fn set_qubit_slot(&mut self, id: QubitId, slot: Option<RegisterSlot>) -> IrResult<()> {
        let qubit = self
            .qubits
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or(IrError::QubitNotFound {
                qubit: id,
                gate_name: None,
            })?;
        qubit.slot = slot;
        Ok(())
    }

    /// Change the register slot of a bit.
    pub fn set_clbit_slot(&mut self, id: ClbitId, slot: Option<RegisterSlot>) -> IrResult<()> {
        let clbit = self
            .clbits
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(IrError::ClbitNotFound {
                clbit: id,
                gate_name: None,
            })?;
        clbit.slot = slot;
        Ok(())
    }

    /// Quantum registers as `(name, size)`, in order of first appearance.
    pub fn qregs(&self) -> Vec<(String, u32)> {
        registers(self.qubits.iter().map(|q| q.slot.as_ref()))
    }

    /// Classical registers as `(name, size)`, in order of first appearance.
    pub fn cregs(&self) -> Vec<(String, u32)> {
        registers(self.clbits.iter().map(|c| c.slot.as_ref()))
    }

    /// Bits of classical register `name`, ordered by index.
    pub fn creg_bits(&self, name: &str) -> Vec<ClbitId> {
        let mut bits: Vec<_> = self
            .clbits
            .iter()
            .filter_map(|c| match &c.slot {
                Some(slot) if slot.register == name => Some((slot.index, c.id)),
                _ => None,
            })
            .collect();
        bits.sort_unstable_by_key(|(index, _)| *index);
        bits.into_iter().map(|(_, id)| id).collect()
    }

    /// Instructions in topological order.
    pub fn instructions(&self) -> Vec<Instruction> {
        self.dag
            .topological_ops()
            .map(|(_, inst)| inst.clone())
            .collect()
    }

    /// Number of operations with the given name.
    pub fn n_gates_of(&self, name: &str) -> usize {
        self.dag
            .topological_ops()
            .filter(|(_, inst)| inst.name() == name)
            .count()
    }

    /// Check whether any gate parameter is symbolic.
    pub fn is_symbolic(&self) -> bool {
        self.dag.topological_ops().any(|(_, inst)| {
            inst.as_gate()
                .is_some_and(|g| g.kind.parameters().iter().any(|p| p.is_symbolic()))
        })
    }

    /// Check whether the circuit measures anything.
    pub fn has_measurements(&self) -> bool {
        self.dag.topological_ops().any(|(_, inst)| inst.is_measure())
    }
}

fn registers<'a>(slots: impl Iterator<Item = Option<&'a RegisterSlot>>) -> Vec<(String, u32)> {
    let mut regs: Vec<(String, u32)> = vec![];
    for slot in slots.flatten() {
        match regs.iter_mut().find(|(name, _)| *name == slot.register) {
            Some((_, size)) => *size = (*size).max(slot.index + 1),
            None => regs.push((slot.register.clone(), slot.index + 1)),
        }
    }
    regs
}

/// Serializable form of a [`Circuit`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitData {
    /// Circuit name.
    #[serde(default)]
    pub name: String,
    /// Qubits in declaration order.
    pub qubits: Vec<Qubit>,
    /// Classical bits in declaration order.
    #[serde(default)]
    pub clbits: Vec<Clbit>,
    /// Instructions in order.
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl From<Circuit> for CircuitData {
    fn from(circuit: Circuit) -> Self {
        let instructions = circuit.instructions();
        Self {
            name: circuit.name,
            qubits: circuit.qubits,
            clbits: circuit.clbits,
            instructions,
        }
    }
}

impl TryFrom<CircuitData> for Circuit {
    type Error = IrError;

    fn try_from(data: CircuitData) -> IrResult<Self> {
        let mut circuit = Circuit::new(data.name);
        for q in data.qubits {
            circuit.dag.add_qubit(q.id);
            circuit.next_qubit_id = circuit.next_qubit_id.max(q.id.0 + 1);
            circuit.qubits.push(q);
        }
        for c in data.clbits {
            circuit.dag.add_clbit(c.id);
            circuit.next_clbit_id = circuit.next_clbit_id.max(c.id.0 + 1);
            circuit.clbits.push(c);
        }
        for inst in data.instructions {
            circuit.append(inst)?;
        }
        Ok(circuit)
    }
}
