//! sceq - differential correctness oracle for shader compiler backends.
//!
//! Compiles one input program through two independent code-generation paths,
//! executes both machine-code streams on an instruction-level simulator with
//! identical logical inputs, and proves or disproves behavioral equivalence
//! by comparing outputs at bit precision.
//!
//! The two paths are free to choose entirely different physical register
//! assignments; every value crossing the harness boundary is indirected
//! through the variant's own declared slot placements, so the comparison is
//! over logical outputs, never raw register dumps.
//!
//! # Example
//!
//! ```ignore
//! use sceq::{Harness, HarnessConfig, SharedToolchain};
//!
//! let toolchain = SharedToolchain::load("libtoolchain.so")?;
//! let mut harness = Harness::new(
//!     toolchain.frontend(),
//!     Box::new(toolchain.reference_backend()),
//!     Box::new(toolchain.candidate_backend()),
//!     toolchain.simulator(),
//!     HarnessConfig::default(),
//! );
//! let summary = harness.run(&programs)?;
//! ```

pub mod compare;
pub mod driver;
pub mod dump;
pub mod error;
pub mod harness;
pub mod placement;
pub mod test_support;
pub mod toolchain;
pub mod vector;

pub use compare::{Comparison, LivenessSkew, Mismatch};
pub use driver::DriverError;
pub use error::{Error, Result};
pub use harness::{CaseReport, CaseStatus, Harness, HarnessConfig, RunSummary};
pub use placement::OutputVector;
pub use toolchain::{
    Backend, CompileError, Frontend, ParseError, SharedToolchain, SimFault, Simulator,
    ToolchainLoadError,
};
pub use vector::{Entropy, TestVector};

// Re-export the data model.
pub use sceq_ir::{
    COMP_NAMES, COMPS_PER_SLOT, CONST_BANK_CAPACITY, CompMask, CompiledVariant,
    INPUT_POOL_SIZE, MAX_INPUT_SLOTS, REG_FILE_CAPACITY, Slot, Stage,
};
