//! Pass sequencing.

use tracing::{debug, info, instrument};

use qport_ir::Circuit;

use crate::error::{CompileError, CompileResult};
use crate::pass::Pass;
use crate::passes::{RemoveRedundancies, SquashSingleQubit};

/// Runs a list of passes in order. A sequence is itself a [`Pass`].
pub struct PassManager {
    name: String,
    passes: Vec<Box<dyn Pass>>,
}

/// Alias matching the usual name of a pass sequence.
pub type SequencePass = PassManager;

impl PassManager {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::named("SequencePass")
    }

    /// Create an empty sequence with a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: vec![],
        }
    }

    /// Add a pass to the end of the sequence.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Builder form of [`add_pass`](Self::add_pass).
    #[must_use]
    pub fn with(mut self, pass: impl Pass + 'static) -> Self {
        self.add_pass(pass);
        self
    }

    /// Names of the contained passes.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Pass for PassManager {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(sequence = %self.name))]
    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        info!(
            "Running {} passes on circuit with {} qubits",
            self.passes.len(),
            circuit.num_qubits()
        );
        for pass in &self.passes {
            debug!("Running pass: {}", pass.name());
            pass.run(circuit)?;
            debug!("Pass {} completed, ops: {}", pass.name(), circuit.num_ops());
        }
        info!(
            "Sequence completed, final depth: {}, ops: {}",
            circuit.depth(),
            circuit.num_ops()
        );
        Ok(())
    }
}

/// Repeats a pass until the circuit stops changing.
pub struct RepeatPass<P> {
    pass: P,
    max_iterations: usize,
}

impl<P: Pass> RepeatPass<P> {
    /// Repeat `pass` to a fixed point, at most 100 times.
    pub fn new(pass: P) -> Self {
        Self {
            pass,
            max_iterations: 100,
        }
    }
}

impl<P: Pass> Pass for RepeatPass<P> {
    fn name(&self) -> &str {
        "RepeatPass"
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        for iteration in 0..self.max_iterations {
            let before = circuit.instructions();
            self.pass.run(circuit)?;
            if circuit.instructions() == before {
                debug!("Fixed point reached after {} iterations", iteration + 1);
                return Ok(());
            }
        }
        Err(CompileError::PassFailed {
            pass: self.pass.name().to_string(),
            reason: format!("no fixed point after {} iterations", self.max_iterations),
        })
    }
}

/// Light single-qubit synthesis: squash runs, then clean up.
pub fn synthesise() -> PassManager {
    PassManager::named("Synthesise")
        .with(SquashSingleQubit)
        .with(RemoveRedundancies)
}

/// Squash and redundancy removal, iterated to a fixed point.
pub fn full_peephole_optimise() -> PassManager {
    PassManager::named("FullPeepholeOptimise").with(RepeatPass::new(synthesise()))
}
