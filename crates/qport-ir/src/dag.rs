//! DAG-based circuit representation.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node.
    Op(Instruction),
}

impl DagNode {
    /// The instruction, if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge carries one wire between consecutive nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge belongs to.
    pub wire: WireId,
}

/// DAG-based circuit representation.
///
/// Each wire runs from an `In` node through the operations touching it to an
/// `Out` node. A classically conditioned gate also sits on the wires of the
/// bits its condition reads.
///
/// Operations are only ever appended at the wire fronts, so node insertion
/// order is a topological order. Passes that restructure a circuit build a
/// fresh DAG instead of editing one in place.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    graph: DiGraph<DagNode, DagEdge, u32>,
    qubits: Vec<QubitId>,
    clbits: Vec<ClbitId>,
    inputs: FxHashMap<WireId, NodeIndex>,
    outputs: FxHashMap<WireId, NodeIndex>,
    /// The node just before each wire's output node.
    wire_front: FxHashMap<WireId, NodeIndex>,
}

impl CircuitDag {
    /// Create an empty DAG.
    pub fn new() -> Self {
        Self::default()
    }

    fn add_wire(&mut self, wire: WireId) -> bool {
        if self.inputs.contains_key(&wire) {
            return false;
        }
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.inputs.insert(wire, in_node);
        self.outputs.insert(wire, out_node);
        self.wire_front.insert(wire, in_node);
        true
    }

    /// Add a qubit wire. Adding an existing qubit is a no-op.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.add_wire(WireId::Qubit(qubit)) {
            self.qubits.push(qubit);
        }
    }

    /// Add a classical wire. Adding an existing bit is a no-op.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if self.add_wire(WireId::Clbit(clbit)) {
            self.clbits.push(clbit);
        }
    }

    /// Append an instruction at the end of its wires.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        self.apply_reading(instruction, &[])
    }

    /// Append an instruction that additionally reads `condition_bits`.
    pub fn apply_reading(
        &mut self,
        instruction: Instruction,
        condition_bits: &[ClbitId],
    ) -> IrResult<NodeIndex> {
        let gate_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let got = instruction.qubits.len();
            if gate.num_qubits() as usize != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_qubits(),
                    got: u32::try_from(got).unwrap_or(u32::MAX),
                });
            }
        }
        if instruction.is_measure() && instruction.qubits.len() != instruction.clbits.len() {
            return Err(IrError::MeasureArity {
                qubits: instruction.qubits.len(),
                clbits: instruction.clbits.len(),
            });
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !self.inputs.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        for &clbit in instruction.clbits.iter().chain(condition_bits) {
            if !self.inputs.contains_key(&WireId::Clbit(clbit)) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let mut wires: Vec<WireId> = instruction
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(instruction.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect();
        for &c in condition_bits {
            let wire = WireId::Clbit(c);
            if !wires.contains(&wire) {
                wires.push(wire);
            }
        }

        let op_node = self.graph.add_node(DagNode::Op(instruction));
        for wire in wires {
            self.splice_before_output(wire, op_node)?;
        }
        Ok(op_node)
    }

    fn splice_before_output(&mut self, wire: WireId, op_node: NodeIndex) -> IrResult<()> {
        let out_node = self.outputs[&wire];
        let prev_node = self.wire_front[&wire];
        let edge = self
            .graph
            .edges_directed(prev_node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire && e.target() == out_node)
            .map(|e| e.id())
            .ok_or_else(|| {
                IrError::InvalidDag(format!("wire {wire:?} is not connected to its output"))
            })?;
        self.graph.remove_edge(edge);
        self.graph.add_edge(prev_node, op_node, DagEdge { wire });
        self.graph.add_edge(op_node, out_node, DagEdge { wire });
        self.wire_front.insert(wire, op_node);
        Ok(())
    }

    /// Iterate over operations in topological order.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph[idx].instruction().map(|inst| (idx, inst)))
    }

    /// The instruction at `node`.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(DagNode::instruction)
    }

    /// The operation following `node` on `wire`, or `None` at the wire end.
    pub fn next_on_wire(&self, node: NodeIndex, wire: WireId) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.target())
            .filter(|&n| matches!(self.graph[n], DagNode::Op(_)))
    }

    /// The operation preceding `node` on `wire`, or `None` at the wire start.
    pub fn prev_on_wire(&self, node: NodeIndex, wire: WireId) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.source())
            .filter(|&n| matches!(self.graph[n], DagNode::Op(_)))
    }

    /// All operations on `wire`, in order.
    pub fn wire_ops(&self, wire: impl Into<WireId>) -> Vec<NodeIndex> {
        let wire = wire.into();
        let mut ops = vec![];
        let Some(&start) = self.inputs.get(&wire) else {
            return ops;
        };
        let mut current = start;
        while let Some(next) = self.next_on_wire(current, wire) {
            ops.push(next);
            current = next;
        }
        ops
    }

    /// Number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.graph
            .node_count()
            .saturating_sub(2 * (self.qubits.len() + self.clbits.len()))
    }

    /// Longest chain of operations through the circuit.
    pub fn depth(&self) -> usize {
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(self.graph.node_count(), Default::default());
        let mut max_depth = 0;

        for node in self.graph.node_indices() {
            let pred = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            let depth = match self.graph[node] {
                DagNode::Op(ref inst) if !inst.is_barrier() => pred + 1,
                _ => pred,
            };
            max_depth = max_depth.max(depth);
            depths.insert(node, depth);
        }
        max_depth
    }

    /// Qubits, in declaration order.
    pub fn qubits(&self) -> &[QubitId] {
        &self.qubits
    }

    /// Classical bits, in declaration order.
    pub fn clbits(&self) -> &[ClbitId] {
        &self.clbits
    }

    /// The underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    fn two_qubit_dag() -> CircuitDag {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag.add_clbit(ClbitId(0));
        dag
    }

    #[test]
    fn test_apply_and_order() {
        let mut dag = two_qubit_dag();
        let h = dag
            .apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let cx = dag
            .apply(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();

        let names: Vec<_> = dag.topological_ops().map(|(_, i)| i.name()).collect();
        assert_eq!(names, ["h", "cx"]);
        assert_eq!(dag.next_on_wire(h, QubitId(0).into()), Some(cx));
        assert_eq!(dag.prev_on_wire(cx, QubitId(1).into()), None);
        assert_eq!(dag.depth(), 2);
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_apply_rejects_bad_operands() {
        let mut dag = two_qubit_dag();
        assert!(matches!(
            dag.apply(Instruction::single_qubit_gate(StandardGate::X, QubitId(7))),
            Err(IrError::QubitNotFound { .. })
        ));
        assert!(matches!(
            dag.apply(Instruction::gate(StandardGate::CX, [QubitId(0), QubitId(0)])),
            Err(IrError::DuplicateQubit { .. })
        ));
        assert!(matches!(
            dag.apply(Instruction::gate(StandardGate::CX, [QubitId(0)])),
            Err(IrError::QubitCountMismatch { expected: 2, got: 1, .. })
        ));
        assert_eq!(dag.num_ops(), 0);
    }

    #[test]
    fn test_condition_reads_clbit_wire() {
        let mut dag = two_qubit_dag();
        let m = dag
            .apply(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        let x = dag
            .apply_reading(
                Instruction::single_qubit_gate(StandardGate::X, QubitId(1)),
                &[ClbitId(0)],
            )
            .unwrap();
        assert_eq!(dag.prev_on_wire(x, ClbitId(0).into()), Some(m));
        assert_eq!(dag.wire_ops(ClbitId(0)), vec![m, x]);
    }

    #[test]
    fn test_parallel_ops_share_depth() {
        let mut dag = two_qubit_dag();
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.apply(Instruction::single_qubit_gate(StandardGate::H, QubitId(1)))
            .unwrap();
        assert_eq!(dag.depth(), 1);
    }
}
