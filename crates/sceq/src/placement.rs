//! Register-placement resolution.
//!
//! Two variants compiled from the same program are free to place a logical
//! value anywhere in their own register files. Comparing raw register dumps
//! would therefore be meaningless; every access goes through the variant's
//! declared slot records so that results come out logical-slot-indexed.

use sceq_ir::{COMPS_PER_SLOT, CompiledVariant};

use crate::vector::TestVector;

/// Leading scalar registers fed by the fixed non-vertex input convention
/// (built-in coordinates rather than user-declared attributes).
pub const FIXED_INPUT_REGS: usize = 2;

/// Logical-slot-indexed outputs extracted from one executed register file.
///
/// Four scalars per declared output slot, in logical order. Immutable once
/// produced.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputVector {
    values: Vec<f32>,
}

impl OutputVector {
    /// Number of logical output slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.values.len() / COMPS_PER_SLOT
    }

    /// Scalar for component `comp` of output slot `slot`.
    #[must_use]
    pub fn get(&self, slot: usize, comp: usize) -> f32 {
        self.values[slot * COMPS_PER_SLOT + comp]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// Write the mapped input values from `vector` into `regs`.
///
/// Vertex programs take per-slot writes: only components flagged active in
/// the slot mask are written, so inactive components keep whatever
/// randomized fill they already hold. Other stages bypass the per-slot
/// mapping and receive the leading pool scalars at fixed registers.
pub fn write_inputs(variant: &CompiledVariant, vector: &TestVector, regs: &mut [f32]) {
    if variant.stage.has_declared_inputs() {
        for (slot_index, slot) in variant.inputs.iter().enumerate() {
            for comp in slot.mask.components() {
                regs[slot.component_reg(comp) as usize] = vector.input(slot_index, comp);
            }
        }
    } else {
        for reg in 0..FIXED_INPUT_REGS {
            regs[reg] = vector.inputs[reg];
        }
    }
}

/// Extract the logical output vector from an executed register file.
///
/// Always reads all four components per output slot; which of them carry
/// defined values is recorded in the slot masks and resolved at comparison
/// time.
#[must_use]
pub fn read_outputs(variant: &CompiledVariant, regs: &[f32]) -> OutputVector {
    let mut values = Vec::with_capacity(variant.outputs.len() * COMPS_PER_SLOT);
    for slot in &variant.outputs {
        for comp in 0..COMPS_PER_SLOT {
            values.push(regs[slot.component_reg(comp) as usize]);
        }
    }
    OutputVector { values }
}
