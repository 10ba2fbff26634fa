//! Logical slot placement records.

use std::fmt;

use crate::COMPS_PER_SLOT;

/// Component letters in slot order.
pub const COMP_NAMES: [char; COMPS_PER_SLOT] = ['x', 'y', 'z', 'w'];

/// Active-component mask over the four scalar components of a slot.
///
/// A compiler may legitimately drop unused components of a logical value, so
/// a mask with fewer than four bits set is normal, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CompMask(u8);

impl CompMask {
    /// All four components active.
    pub const ALL: Self = Self(0b1111);

    /// No components active.
    pub const NONE: Self = Self(0);

    /// Build a mask from the low four bits of `bits`.
    #[must_use]
    pub const fn new(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Raw bits, low four only.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether component `comp` (0..4) is active.
    #[must_use]
    pub const fn contains(self, comp: usize) -> bool {
        comp < COMPS_PER_SLOT && self.0 & (1 << comp) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Components active in both masks.
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Components active in either mask.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Iterate the active component indices.
    pub fn components(self) -> impl Iterator<Item = usize> {
        (0..COMPS_PER_SLOT).filter(move |&c| self.contains(c))
    }
}

impl fmt::Display for CompMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in 0..COMPS_PER_SLOT {
            if self.contains(c) {
                write!(f, "{}", COMP_NAMES[c])?;
            }
        }
        Ok(())
    }
}

/// One logical input or output position and its physical placement.
///
/// The logical index is the slot's position in the variant's declared order;
/// `reg` is the base scalar index in that variant's register file. Two
/// variants of the same program agree on logical order but not on `reg`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Base scalar register index (component `c` lives at `reg + c`).
    pub reg: u32,
    /// Components live in this slot.
    ///
    /// For inputs: which components the compiled code reads. For outputs:
    /// which components the compiled code actually writes.
    pub mask: CompMask,
}

impl Slot {
    #[must_use]
    pub const fn new(reg: u32, mask: CompMask) -> Self {
        Self { reg, mask }
    }

    /// Scalar register index of component `comp`.
    #[must_use]
    pub const fn component_reg(&self, comp: usize) -> u32 {
        self.reg + comp as u32
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}.{}", self.reg / COMPS_PER_SLOT as u32, self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_membership() {
        let m = CompMask::new(0b0101);
        assert!(m.contains(0));
        assert!(!m.contains(1));
        assert!(m.contains(2));
        assert!(!m.contains(3));
        assert_eq!(m.components().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn mask_truncates_high_bits() {
        assert_eq!(CompMask::new(0xFF).bits(), 0b1111);
    }

    #[test]
    fn mask_set_ops() {
        let a = CompMask::new(0b0011);
        let b = CompMask::new(0b0110);
        assert_eq!(a.intersect(b).bits(), 0b0010);
        assert_eq!(a.union(b).bits(), 0b0111);
        assert!(CompMask::NONE.is_empty());
    }

    #[test]
    fn slot_rendering() {
        let slot = Slot::new(8, CompMask::new(0b0011));
        assert_eq!(slot.to_string(), "r2.xy");
        assert_eq!(slot.component_reg(3), 11);
    }
}
