//! Single-qubit squashing.

use std::fmt;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use qport_ir::{Circuit, CircuitDag, Instruction, NodeIndex, StandardGate};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::redundancy::{is_identity, plain_standard};
use crate::synthesis::{EulerBasis, zyz_angles_of};
use crate::unitary::Unitary2x2;

/// Maximal runs of consecutive numeric single-qubit gates accepted by
/// `member`, per qubit.
fn single_qubit_runs(
    circuit: &Circuit,
    member: impl Fn(&StandardGate) -> bool,
) -> Vec<Vec<(NodeIndex, Unitary2x2)>> {
    let dag = circuit.dag();
    let mut runs = vec![];
    for &qubit in dag.qubits() {
        let mut current: Vec<(NodeIndex, Unitary2x2)> = vec![];
        for node in dag.wire_ops(qubit) {
            let unitary = dag
                .get_instruction(node)
                .filter(|inst| inst.qubits.len() == 1)
                .and_then(plain_standard)
                .filter(|g| member(g))
                .and_then(Unitary2x2::from_gate);
            match unitary {
                Some(u) => current.push((node, u)),
                None => {
                    if !current.is_empty() {
                        runs.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
    }
    runs
}

/// Replace each run by the gates `synth` produces for its product, keeping
/// the change only when it shortens the run.
fn squash_runs(
    circuit: &mut Circuit,
    member: impl Fn(&StandardGate) -> bool,
    synth: impl Fn(&Unitary2x2) -> Vec<StandardGate>,
) -> CompileResult<usize> {
    let mut removed: FxHashSet<NodeIndex> = FxHashSet::default();
    let mut inserted: FxHashMap<NodeIndex, Vec<Instruction>> = FxHashMap::default();

    for run in single_qubit_runs(circuit, member) {
        let product = run
            .iter()
            .fold(Unitary2x2::identity(), |acc, (_, u)| u.mul(&acc));
        let gates: Vec<_> = synth(&product)
            .into_iter()
            .filter(|g| !is_identity(g))
            .collect();
        if gates.len() >= run.len() {
            continue;
        }
        let Some(qubit) = circuit
            .dag()
            .get_instruction(run[0].0)
            .map(|inst| inst.qubits[0])
        else {
            continue;
        };
        inserted.insert(
            run[0].0,
            gates
                .into_iter()
                .map(|g| Instruction::single_qubit_gate(g, qubit))
                .collect(),
        );
        removed.extend(run.iter().map(|(node, _)| *node));
    }

    if removed.is_empty() {
        return Ok(0);
    }
    let squashed = inserted.len();
    let instructions = rebuild(circuit.dag(), &removed, inserted);
    circuit.rebuild_with(instructions)?;
    Ok(squashed)
}

fn rebuild(
    dag: &CircuitDag,
    removed: &FxHashSet<NodeIndex>,
    mut inserted: FxHashMap<NodeIndex, Vec<Instruction>>,
) -> Vec<Instruction> {
    let mut out = vec![];
    for (node, inst) in dag.topological_ops() {
        if let Some(gates) = inserted.remove(&node) {
            out.extend(gates);
        }
        if !removed.contains(&node) {
            out.push(inst.clone());
        }
    }
    out
}

/// Merge runs of single-qubit gates into `Rz·Ry·Rz`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SquashSingleQubit;

impl Pass for SquashSingleQubit {
    fn name(&self) -> &'static str {
        "SquashSingleQubit"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let n = squash_runs(
            circuit,
            |_| true,
            |u| EulerBasis::Zyz.emit(zyz_angles_of(u)),
        )?;
        debug!("Squashed {n} single-qubit runs");
        Ok(())
    }
}

/// Builds the replacement for `Rz(a)·Rx(b)·Rz(c)`, in circuit order.
pub type SquashReplacement = Arc<dyn Fn(f64, f64, f64) -> Vec<StandardGate> + Send + Sync>;

/// Merge runs of gates from `gateset` into the sequence produced by
/// `replacement(a, b, c)`, where the run equals `Rz(a)·Rx(b)·Rz(c)`.
#[derive(Clone)]
pub struct SquashCustom {
    gateset: FxHashSet<String>,
    replacement: SquashReplacement,
}

impl SquashCustom {
    /// Create the pass.
    pub fn new(
        gateset: impl IntoIterator<Item = impl Into<String>>,
        replacement: impl Fn(f64, f64, f64) -> Vec<StandardGate> + Send + Sync + 'static,
    ) -> Self {
        Self {
            gateset: gateset.into_iter().map(Into::into).collect(),
            replacement: Arc::new(replacement),
        }
    }
}

impl fmt::Debug for SquashCustom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SquashCustom")
            .field("gateset", &self.gateset)
            .finish_non_exhaustive()
    }
}

impl Pass for SquashCustom {
    fn name(&self) -> &'static str {
        "SquashCustom"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let n = squash_runs(
            circuit,
            |g| self.gateset.contains(g.name()),
            |u| {
                let (a, b, c) = u.zxz_angles();
                (self.replacement)(a, b, c)
            },
        )?;
        debug!("Squashed {n} single-qubit runs into custom form");
        Ok(())
    }
}
