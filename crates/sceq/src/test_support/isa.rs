//! Toy instruction set and in-process interpreter used as a simulator double.
//!
//! One instruction per word: opcode in bits 24..32, then three 8-bit scalar
//! operand fields (destination register, source A, source B). Source A is a
//! constant-bank index for `LDC`, a register index otherwise.

use crate::toolchain::{SimFault, Simulator};

/// Instruction word constructors.
pub mod ops {
    pub const MOV: u32 = 1;
    pub const LDC: u32 = 2;
    pub const ADD: u32 = 3;
    pub const MUL: u32 = 4;

    const fn word(op: u32, dst: u32, a: u32, b: u32) -> u32 {
        op << 24 | (dst & 0xFF) << 16 | (a & 0xFF) << 8 | (b & 0xFF)
    }

    /// `regs[dst] = regs[src]`
    #[must_use]
    pub const fn mov(dst: u32, src: u32) -> u32 {
        word(MOV, dst, src, 0)
    }

    /// `regs[dst] = consts[idx]`
    #[must_use]
    pub const fn ldc(dst: u32, idx: u32) -> u32 {
        word(LDC, dst, idx, 0)
    }

    /// `regs[dst] = regs[a] + regs[b]`
    #[must_use]
    pub const fn add(dst: u32, a: u32, b: u32) -> u32 {
        word(ADD, dst, a, b)
    }

    /// `regs[dst] = regs[a] * regs[b]`
    #[must_use]
    pub const fn mul(dst: u32, a: u32, b: u32) -> u32 {
        word(MUL, dst, a, b)
    }

    /// A word no interpreter accepts.
    #[must_use]
    pub const fn invalid() -> u32 {
        word(0xFF, 0, 0, 0)
    }
}

/// Interpreter over the toy instruction set.
///
/// Deterministic for a given (code, consts, regs) triple; mutates `regs` in
/// place like the real simulator collaborator.
pub struct InterpSimulator;

impl Simulator for InterpSimulator {
    fn execute(
        &self,
        code: &[u32],
        consts: &[f32],
        regs: &mut [f32],
        budget: Option<u64>,
    ) -> Result<(), SimFault> {
        let mut executed = 0u64;
        for &word in code {
            if let Some(limit) = budget {
                if executed >= limit {
                    return Err(SimFault::BudgetExhausted(limit));
                }
            }
            executed += 1;

            let op = word >> 24;
            let dst = (word >> 16 & 0xFF) as usize;
            let a = (word >> 8 & 0xFF) as usize;
            let b = (word & 0xFF) as usize;

            let read = |source: &[f32], index: usize, what: &str| {
                source.get(index).copied().ok_or_else(|| {
                    SimFault::Trap(format!("{what} index {index} out of range"))
                })
            };

            let value = match op {
                ops::MOV => read(regs, a, "register")?,
                ops::LDC => read(consts, a, "constant")?,
                ops::ADD => read(regs, a, "register")? + read(regs, b, "register")?,
                ops::MUL => read(regs, a, "register")? * read(regs, b, "register")?,
                other => return Err(SimFault::Trap(format!("illegal opcode {other:#x}"))),
            };
            if dst >= regs.len() {
                return Err(SimFault::Trap(format!(
                    "destination register {dst} out of range"
                )));
            }
            regs[dst] = value;
        }
        Ok(())
    }
}
