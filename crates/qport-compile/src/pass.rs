//! The compilation pass trait.

use qport_ir::Circuit;

use crate::error::CompileResult;

/// A compilation pass that rewrites a circuit in place.
///
/// Passes are the unit of compilation: backends assemble them into
/// sequences, and sequences are passes themselves.
pub trait Pass: Send + Sync {
    /// Name of this pass, used in logs and errors.
    fn name(&self) -> &str;

    /// Run the pass.
    fn run(&self, circuit: &mut Circuit) -> CompileResult<()>;
}

impl<P: Pass + ?Sized> Pass for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<()> {
        (**self).run(circuit)
    }
}
