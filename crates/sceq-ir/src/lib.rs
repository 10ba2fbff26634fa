//! Shared data model for the shader compiler equivalence harness.
//!
//! This crate describes what a compiler backend produces (`CompiledVariant`)
//! and the register/constant capacities of the instruction-level simulator.
//! It carries no knowledge of either backend's allocation strategy: all
//! physical placement is expressed per-variant through [`Slot`] records.

mod slot;
mod stage;
mod variant;

pub use slot::*;
pub use stage::*;
pub use variant::*;

/// Scalar capacity of the simulator register file.
pub const REG_FILE_CAPACITY: usize = 256;

/// Scalar capacity of the simulator constant bank.
pub const CONST_BANK_CAPACITY: usize = 256;

/// Scalar capacity of the shared input pool (16 logical slots x 4).
pub const INPUT_POOL_SIZE: usize = 64;

/// Scalar components per logical slot.
pub const COMPS_PER_SLOT: usize = 4;

/// Maximum number of logical input slots the input pool can feed.
pub const MAX_INPUT_SLOTS: usize = INPUT_POOL_SIZE / COMPS_PER_SLOT;
