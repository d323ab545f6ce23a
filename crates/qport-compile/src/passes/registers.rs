//! Register renaming passes.

use rustc_hash::{FxHashMap, FxHashSet};

use qport_ir::{Circuit, InstructionKind, RegisterSlot};

use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;

/// Put all qubits into one register `q` and all bits into one register `c`,
/// numbered in declaration order.
///
/// A lone classical register that conditions refer to is renamed along with
/// the conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenRegisters;

impl Pass for FlattenRegisters {
    fn name(&self) -> &'static str {
        "FlattenRegisters"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let conditioned = circuit
            .dag()
            .topological_ops()
            .any(|(_, inst)| inst.condition().is_some());
        if conditioned && circuit.cregs().len() > 1 {
            return Err(CompileError::PassFailed {
                pass: self.name().into(),
                reason: "conditions refer to classical registers that would be merged".into(),
            });
        }

        let qubits: Vec<_> = circuit.qubits().iter().map(|q| q.id).collect();
        for (index, id) in (0u32..).zip(qubits) {
            circuit.set_qubit_slot(id, Some(RegisterSlot::new("q", index)))?;
        }
        let clbits: Vec<_> = circuit.clbits().iter().map(|c| c.id).collect();
        for (index, id) in (0u32..).zip(clbits) {
            circuit.set_clbit_slot(id, Some(RegisterSlot::new("c", index)))?;
        }

        if conditioned {
            let instructions = circuit
                .instructions()
                .into_iter()
                .map(|mut inst| {
                    if let InstructionKind::Gate(gate) = &mut inst.kind {
                        if let Some(cond) = &mut gate.condition {
                            cond.register = "c".into();
                        }
                    }
                    inst
                })
                .collect();
            circuit.rebuild_with(instructions)?;
        }
        Ok(())
    }
}

/// Rename qubits through a map between register slots.
///
/// Qubits whose slot is not in the map keep their name.
#[derive(Debug, Clone, Default)]
pub struct RenameQubits {
    map: FxHashMap<RegisterSlot, RegisterSlot>,
}

impl RenameQubits {
    /// Create the pass from `(from, to)` pairs.
    pub fn new(map: impl IntoIterator<Item = (RegisterSlot, RegisterSlot)>) -> Self {
        Self {
            map: map.into_iter().collect(),
        }
    }

    /// Map `q[i]` to `{register}[i]` for `i < n`.
    pub fn to_register(register: &str, n: u32) -> Self {
        Self::new((0..n).map(|i| (RegisterSlot::new("q", i), RegisterSlot::new(register, i))))
    }
}

impl Pass for RenameQubits {
    fn name(&self) -> &'static str {
        "RenameQubits"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let renames: Vec<_> = circuit
            .qubits()
            .iter()
            .map(|q| {
                let slot = q.slot.as_ref().and_then(|s| self.map.get(s)).cloned();
                (q.id, slot.or_else(|| q.slot.clone()))
            })
            .collect();

        let mut seen = FxHashSet::default();
        for (_, slot) in &renames {
            if let Some(slot) = slot {
                if !seen.insert(slot) {
                    return Err(CompileError::PassFailed {
                        pass: self.name().into(),
                        reason: format!("two qubits renamed to {slot}"),
                    });
                }
            }
        }

        for (id, slot) in renames {
            circuit.set_qubit_slot(id, slot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qport_ir::QubitId;

    #[test]
    fn test_flatten_then_rename() {
        let mut circuit = Circuit::new("regs");
        circuit.add_qreg("a", 2);
        circuit.add_qreg("b", 1);
        circuit.add_creg("m", 1);
        circuit.add_creg("n", 1);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();

        FlattenRegisters.run(&mut circuit).unwrap();
        assert_eq!(circuit.qregs(), vec![("q".to_string(), 3)]);
        assert_eq!(circuit.cregs(), vec![("c".to_string(), 2)]);

        RenameQubits::to_register("node", 3).run(&mut circuit).unwrap();
        let names: Vec<_> = circuit.qubits().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["node[0]", "node[1]", "node[2]"]);
        assert_eq!(circuit.num_ops(), 1);
    }

    #[test]
    fn test_flatten_renames_condition_register() {
        let mut circuit = Circuit::new("cond");
        circuit.add_qreg("a", 1);
        circuit.add_creg("flag", 1);
        circuit
            .gate_if(qport_ir::StandardGate::X, [QubitId(0)], "flag", 1)
            .unwrap();
        FlattenRegisters.run(&mut circuit).unwrap();
        let cond = circuit.instructions()[0].condition().cloned().unwrap();
        assert_eq!(cond.register, "c");
    }

    #[test]
    fn test_rename_collision_fails() {
        let mut circuit = Circuit::with_size("c", 2, 0);
        let pass = RenameQubits::new([(RegisterSlot::new("q", 0), RegisterSlot::new("q", 1))]);
        assert!(matches!(
            pass.run(&mut circuit),
            Err(CompileError::PassFailed { .. })
        ));
    }
}
