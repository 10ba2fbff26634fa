//! Trait seams for the external collaborators.
//!
//! The harness never implements a parser, a compiler, or a simulator itself;
//! it consumes them behind these traits. Production wiring binds all of them
//! to one shared library (see [`shared`]); tests use the in-process doubles
//! from `test_support`.

mod shared;

pub use shared::*;

use std::fmt;

use thiserror::Error;

use sceq_ir::{CompiledVariant, Stage};

/// Parse failure from the frontend collaborator. Run-fatal.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ParseError(pub String);

/// Compile failure from one backend. Fatal for the case, not the run.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
    /// Return code reported by the failing compiler, if it has one.
    pub code: Option<i32>,
}

impl CompileError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(message: impl Into<String>, code: i32) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

/// Fault raised by the simulator while executing a variant's machine code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimFault {
    #[error("instruction budget of {0} exhausted")]
    BudgetExhausted(u64),
    #[error("simulator trapped: {0}")]
    Trap(String),
}

/// Text-to-program frontend plus the optional lowering pass.
pub trait Frontend {
    /// Parsed intermediate representation, opaque to the harness.
    type Program;

    /// Parse one text-format shader program.
    fn parse(&self, source: &[u8]) -> Result<Self::Program, ParseError>;

    /// Apply the lowering pass. `None` means the pass declined to transform
    /// and the original program is used unchanged.
    fn lower(&self, program: &Self::Program) -> Option<Self::Program> {
        let _ = program;
        None
    }

    /// Stage tag declared by the program.
    fn stage(&self, program: &Self::Program) -> Stage;
}

/// One code-generation path.
///
/// Two independent implementations run per case; the harness never assumes
/// they agree on physical register assignment.
pub trait Backend<P> {
    /// Backend name for diagnostics ("which compiler failed").
    fn name(&self) -> &str;

    /// Compile a program into an executable variant.
    fn compile(&self, program: &P) -> Result<CompiledVariant, CompileError>;

    /// Render a disassembly of the variant, if this backend can.
    ///
    /// Purely observational; never affects comparison.
    fn disassemble(&self, variant: &CompiledVariant, out: &mut dyn fmt::Write) -> fmt::Result {
        let _ = (variant, out);
        Ok(())
    }
}

/// Instruction-level simulator.
///
/// Mutates `regs` in place and returns synchronously; assumed deterministic
/// for a given (code, consts, regs) triple. `budget` bounds the number of
/// executed instructions; `None` leaves execution unbounded.
pub trait Simulator {
    fn execute(
        &self,
        code: &[u32],
        consts: &[f32],
        regs: &mut [f32],
        budget: Option<u64>,
    ) -> Result<(), SimFault>;
}
