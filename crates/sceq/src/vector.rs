//! Test-vector generation.
//!
//! All randomness in a run flows through one [`Entropy`] value built from an
//! explicit seed, so a failing case is reproduced by replaying the seed
//! rather than by replaying the whole run up to that point.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sceq_ir::{COMPS_PER_SLOT, CONST_BANK_CAPACITY, INPUT_POOL_SIZE};

/// Shared randomized input and constant data for one comparison.
///
/// Generated once per test iteration and read identically by both variants;
/// never mutated during execution.
#[derive(Clone, Debug)]
pub struct TestVector {
    /// Input pool, logical slot-major, 4 scalars per slot.
    pub inputs: [f32; INPUT_POOL_SIZE],
    /// Constant bank contents.
    pub consts: [f32; CONST_BANK_CAPACITY],
}

impl TestVector {
    /// Input scalar for component `comp` of logical slot `slot`.
    #[must_use]
    pub const fn input(&self, slot: usize, comp: usize) -> f32 {
        self.inputs[slot * COMPS_PER_SLOT + comp]
    }
}

/// Explicit pseudo-random generator state for the run.
///
/// State advances monotonically across cases and is never reset, so
/// successive cases draw disjoint values from the same seeded sequence.
pub struct Entropy {
    rng: StdRng,
    seed: u64,
}

impl Entropy {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this generator was built from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Overwrite every element of `buf` with an independent draw in [0, 1).
    pub fn fill(&mut self, buf: &mut [f32]) {
        for v in buf {
            *v = self.rng.random();
        }
    }

    /// Draw a fresh test vector, one independent value per scalar slot.
    pub fn test_vector(&mut self) -> TestVector {
        let mut vector = TestVector {
            inputs: [0.0; INPUT_POOL_SIZE],
            consts: [0.0; CONST_BANK_CAPACITY],
        };
        self.fill(&mut vector.inputs);
        self.fill(&mut vector.consts);
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Entropy::from_seed(7);
        let mut b = Entropy::from_seed(7);
        let va = a.test_vector();
        let vb = b.test_vector();
        assert_eq!(va.inputs, vb.inputs);
        assert_eq!(va.consts, vb.consts);
    }

    #[test]
    fn sequence_advances_between_draws() {
        let mut e = Entropy::from_seed(7);
        let first = e.test_vector();
        let second = e.test_vector();
        assert_ne!(first.inputs, second.inputs);
    }

    #[test]
    fn fill_touches_every_element() {
        let mut e = Entropy::from_seed(0);
        let mut buf = [-1.0f32; 32];
        e.fill(&mut buf);
        assert!(buf.iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn input_indexing_is_slot_major() {
        let mut e = Entropy::from_seed(3);
        let v = e.test_vector();
        assert_eq!(v.input(2, 1).to_bits(), v.inputs[9].to_bits());
    }
}
