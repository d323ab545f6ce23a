//! Built-in compilation passes.

mod boxes;
pub(crate) mod redundancy;
mod rebase;
mod registers;
mod simplify_initial;
mod squash;

pub use boxes::DecomposeBoxes;
pub use rebase::Rebase;
pub use redundancy::RemoveRedundancies;
pub use registers::{FlattenRegisters, RenameQubits};
pub use simplify_initial::SimplifyInitial;
pub use squash::{SquashCustom, SquashReplacement, SquashSingleQubit};
