//! Bit-exact comparison of the two variants' logical outputs.

use std::fmt;

use tracing::warn;

use sceq_ir::{COMP_NAMES, COMPS_PER_SLOT, Slot};

use crate::placement::OutputVector;

/// A single component position where reference and candidate bit patterns
/// differ.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mismatch {
    /// Logical output slot index.
    pub slot: usize,
    /// Component index within the slot (0..4).
    pub comp: usize,
    pub reference: f32,
    pub candidate: f32,
}

impl Mismatch {
    /// Component letter for diagnostics.
    #[must_use]
    pub const fn comp_name(&self) -> char {
        COMP_NAMES[self.comp]
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "out{}.{}: {:.6} ({:08x}) vs {:.6} ({:08x})",
            self.slot,
            self.comp_name(),
            self.reference,
            self.reference.to_bits(),
            self.candidate,
            self.candidate.to_bits(),
        )
    }
}

/// Component declared written by exactly one variant.
///
/// Such a component cannot be bit-compared (the unwritten side holds
/// randomized fill), but the disagreement itself is worth surfacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LivenessSkew {
    pub slot: usize,
    pub comp: usize,
    /// True if the reference wrote the component, false if the candidate did.
    pub reference_written: bool,
}

/// Result of comparing one pair of output vectors.
#[derive(Clone, Debug, Default)]
pub struct Comparison {
    /// Components actually bit-compared.
    pub compared: usize,
    pub mismatches: Vec<Mismatch>,
    pub liveness_skew: Vec<LivenessSkew>,
}

impl Comparison {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compare two logical output vectors component-wise at exact bit
/// representation.
///
/// Values that differ in any bit are mismatches, including differing NaN
/// payloads and the signed-zero sign bit. Only components declared written
/// by both variants are compared: a component written by neither originates
/// from independently randomized register fill and would diverge
/// meaninglessly, and one written by a single variant is reported as
/// liveness skew instead.
///
/// Precondition: both vectors and both slot lists have the same slot count
/// (enforced by the orchestrator before this is called).
#[must_use]
pub fn compare(
    reference: &OutputVector,
    candidate: &OutputVector,
    ref_slots: &[Slot],
    cand_slots: &[Slot],
) -> Comparison {
    debug_assert_eq!(reference.slot_count(), candidate.slot_count());
    debug_assert_eq!(ref_slots.len(), cand_slots.len());

    let mut result = Comparison::default();

    for (slot, (ref_slot, cand_slot)) in ref_slots.iter().zip(cand_slots).enumerate() {
        let both = ref_slot.mask.intersect(cand_slot.mask);
        let either = ref_slot.mask.union(cand_slot.mask);

        for comp in 0..COMPS_PER_SLOT {
            if both.contains(comp) {
                let r = reference.get(slot, comp);
                let c = candidate.get(slot, comp);
                result.compared += 1;
                if r.to_bits() != c.to_bits() {
                    result.mismatches.push(Mismatch {
                        slot,
                        comp,
                        reference: r,
                        candidate: c,
                    });
                }
            } else if either.contains(comp) {
                let reference_written = ref_slot.mask.contains(comp);
                warn!(
                    slot,
                    comp = %COMP_NAMES[comp],
                    written_by = if reference_written { "reference" } else { "candidate" },
                    "output component written by only one variant; excluded from comparison"
                );
                result.liveness_skew.push(LivenessSkew {
                    slot,
                    comp,
                    reference_written,
                });
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::read_outputs;
    use sceq_ir::{CompMask, CompiledVariant, Stage};

    fn outputs(values: &[f32]) -> OutputVector {
        // Build through the resolver so the test stays honest about layout.
        let slots = values.len() / COMPS_PER_SLOT;
        let variant = CompiledVariant {
            stage: Stage::Fragment,
            code: vec![],
            inputs: vec![],
            outputs: (0..slots)
                .map(|i| Slot::new((i * COMPS_PER_SLOT) as u32, CompMask::ALL))
                .collect(),
            max_reg: slots.max(1) as u32 - 1,
            max_const: 0,
        };
        read_outputs(&variant, values)
    }

    fn full_slots(n: usize) -> Vec<Slot> {
        (0..n)
            .map(|i| Slot::new((i * COMPS_PER_SLOT) as u32, CompMask::ALL))
            .collect()
    }

    #[test]
    fn identical_vectors_pass() {
        let a = outputs(&[1.0, 2.0, 3.0, 4.0]);
        let result = compare(&a, &a.clone(), &full_slots(1), &full_slots(1));
        assert!(result.passed());
        assert_eq!(result.compared, 4);
    }

    #[test]
    fn signed_zero_is_a_mismatch() {
        let a = outputs(&[0.0, 1.0, 1.0, 1.0]);
        let b = outputs(&[-0.0, 1.0, 1.0, 1.0]);
        let result = compare(&a, &b, &full_slots(1), &full_slots(1));
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].slot, 0);
        assert_eq!(result.mismatches[0].comp_name(), 'x');
    }

    #[test]
    fn identical_nan_payload_is_not_a_mismatch() {
        let nan = f32::from_bits(0x7fc0_0001);
        let a = outputs(&[nan, 0.0, 0.0, 0.0]);
        let result = compare(&a, &a.clone(), &full_slots(1), &full_slots(1));
        assert!(result.passed());
    }

    #[test]
    fn differing_nan_payload_is_a_mismatch() {
        let a = outputs(&[f32::from_bits(0x7fc0_0001), 0.0, 0.0, 0.0]);
        let b = outputs(&[f32::from_bits(0x7fc0_0002), 0.0, 0.0, 0.0]);
        let result = compare(&a, &b, &full_slots(1), &full_slots(1));
        assert_eq!(result.mismatches.len(), 1);
    }

    #[test]
    fn unwritten_components_are_skipped() {
        let a = outputs(&[1.0, 2.0, 10.0, 20.0]);
        let b = outputs(&[1.0, 2.0, 30.0, 40.0]);
        let xy = vec![Slot::new(0, CompMask::new(0b0011))];
        let result = compare(&a, &b, &xy, &xy.clone());
        assert!(result.passed());
        assert_eq!(result.compared, 2);
        assert!(result.liveness_skew.is_empty());
    }

    #[test]
    fn one_sided_write_is_skew_not_mismatch() {
        let a = outputs(&[1.0, 2.0, 3.0, 0.0]);
        let b = outputs(&[1.0, 2.0, 99.0, 0.0]);
        let xyz = vec![Slot::new(0, CompMask::new(0b0111))];
        let xy = vec![Slot::new(0, CompMask::new(0b0011))];
        let result = compare(&a, &b, &xyz, &xy);
        assert!(result.passed());
        assert_eq!(result.liveness_skew.len(), 1);
        assert!(result.liveness_skew[0].reference_written);
        assert_eq!(result.liveness_skew[0].comp, 2);
    }

    #[test]
    fn mismatch_rendering_carries_both_forms() {
        let m = Mismatch {
            slot: 0,
            comp: 0,
            reference: 1.0,
            candidate: 0.5,
        };
        assert_eq!(m.to_string(), "out0.x: 1.000000 (3f800000) vs 0.500000 (3f000000)");
    }

    #[test]
    fn mismatches_on_different_slots_reported_per_component() {
        let a = outputs(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let b = outputs(&[1.0, 9.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0]);
        let result = compare(&a, &b, &full_slots(2), &full_slots(2));
        assert_eq!(result.mismatches.len(), 2);
        assert_eq!((result.mismatches[0].slot, result.mismatches[0].comp), (0, 1));
        assert_eq!((result.mismatches[1].slot, result.mismatches[1].comp), (1, 3));
    }
}
