//! Box decomposition.

use qport_ir::{Circuit, GateKind, Instruction, InstructionKind};
use tracing::debug;

use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;

const MAX_NESTING: usize = 64;

/// Replace every box that carries a definition with its body, recursively.
///
/// Boxes without a definition stay in place. A condition on a box is
/// copied onto each gate of its body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecomposeBoxes;

impl DecomposeBoxes {
    fn expand(inst: Instruction, depth: usize, out: &mut Vec<Instruction>) -> CompileResult<()> {
        let InstructionKind::Gate(gate) = &inst.kind else {
            out.push(inst);
            return Ok(());
        };
        let GateKind::Custom(custom) = &gate.kind else {
            out.push(inst);
            return Ok(());
        };
        let Some(definition) = &custom.definition else {
            out.push(inst);
            return Ok(());
        };
        if depth >= MAX_NESTING {
            return Err(CompileError::PassFailed {
                pass: "DecomposeBoxes".into(),
                reason: format!("box '{}' nests deeper than {MAX_NESTING} levels", custom.name),
            });
        }

        let body = definition.expand(&custom.name, &custom.params, &inst.qubits)?;
        for mut child in body {
            if let (Some(cond), InstructionKind::Gate(g)) = (&gate.condition, &mut child.kind) {
                if g.condition.is_none() {
                    g.condition = Some(cond.clone());
                }
            }
            Self::expand(child, depth + 1, out)?;
        }
        Ok(())
    }
}

impl Pass for DecomposeBoxes {
    fn name(&self) -> &'static str {
        "DecomposeBoxes"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        let instructions = circuit.instructions();
        if !instructions.iter().any(Instruction::is_box) {
            return Ok(());
        }
        let mut out = Vec::with_capacity(instructions.len());
        for inst in instructions {
            Self::expand(inst, 0, &mut out)?;
        }
        debug!("Decomposed boxes into {} instructions", out.len());
        circuit.rebuild_with(out)?;
        Ok(())
    }
}
