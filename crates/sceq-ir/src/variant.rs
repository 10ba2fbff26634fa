//! Output of one compiler backend applied to one program.

use crate::{COMPS_PER_SLOT, CONST_BANK_CAPACITY, REG_FILE_CAPACITY, Slot, Stage};

/// One backend's compilation of a program: machine code plus the declared
/// placement and resource-usage bounds the harness needs to execute it.
///
/// Immutable once built; discarded after the case's comparison completes.
#[derive(Clone, Debug)]
pub struct CompiledVariant {
    /// Stage tag, copied from the source program.
    pub stage: Stage,
    /// Assembled machine-code stream, owned by this variant.
    pub code: Vec<u32>,
    /// Declared input placements, in logical slot order.
    ///
    /// Only meaningful for [`Stage::Vertex`]; other stages take inputs
    /// through a fixed register convention.
    pub inputs: Vec<Slot>,
    /// Declared output placements, in logical slot order. Always present.
    pub outputs: Vec<Slot>,
    /// Highest vec4 register referenced.
    pub max_reg: u32,
    /// Highest vec4 constant referenced.
    pub max_const: u32,
}

impl CompiledVariant {
    /// Scalar register-file window this variant executes against.
    #[must_use]
    pub const fn reg_window(&self) -> usize {
        (self.max_reg as usize + 1) * COMPS_PER_SLOT
    }

    /// Scalar constant-bank window this variant reads.
    #[must_use]
    pub const fn const_window(&self) -> usize {
        (self.max_const as usize + 1) * COMPS_PER_SLOT
    }

    /// Whether the declared windows fit the simulator's capacities.
    #[must_use]
    pub const fn fits_simulator(&self) -> bool {
        self.reg_window() < REG_FILE_CAPACITY && self.const_window() < CONST_BANK_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompMask;

    fn variant(max_reg: u32, max_const: u32) -> CompiledVariant {
        CompiledVariant {
            stage: Stage::Fragment,
            code: vec![],
            inputs: vec![],
            outputs: vec![Slot::new(0, CompMask::ALL)],
            max_reg,
            max_const,
        }
    }

    #[test]
    fn windows_are_scalar_counts() {
        let v = variant(3, 7);
        assert_eq!(v.reg_window(), 16);
        assert_eq!(v.const_window(), 32);
        assert!(v.fits_simulator());
    }

    #[test]
    fn capacity_bound_is_strict() {
        // (63 + 1) * 4 == 256 is not strictly below capacity.
        assert!(!variant(63, 0).fits_simulator());
        assert!(variant(62, 0).fits_simulator());
        assert!(!variant(0, 63).fits_simulator());
    }
}
