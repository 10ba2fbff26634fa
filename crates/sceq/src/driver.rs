//! Execution of one compiled variant against the simulator.

use thiserror::Error;
use tracing::debug;

use sceq_ir::{CONST_BANK_CAPACITY, CompiledVariant, MAX_INPUT_SLOTS, REG_FILE_CAPACITY};

use crate::dump;
use crate::placement::{self, OutputVector};
use crate::toolchain::{SimFault, Simulator};
use crate::vector::{Entropy, TestVector};

/// Errors that reject a variant before or during simulated execution.
/// Fatal for the current case only.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("register window {window} exceeds simulator capacity {capacity}")]
    RegisterCapacity { window: usize, capacity: usize },

    #[error("constant window {window} exceeds simulator capacity {capacity}")]
    ConstantCapacity { window: usize, capacity: usize },

    #[error("slot placement at scalar register {reg} lies outside register window {window}")]
    PlacementOutOfRange { reg: u32, window: usize },

    #[error("{slots} declared input slots exceed input pool capacity {capacity}")]
    InputSlotOverflow { slots: usize, capacity: usize },

    #[error(transparent)]
    Sim(#[from] SimFault),
}

/// Reject a variant whose declared windows or placements don't fit.
///
/// Runs before any simulator invocation so a malformed variant never
/// executes.
pub fn preflight(variant: &CompiledVariant) -> Result<(), DriverError> {
    let reg_window = variant.reg_window();
    if reg_window >= REG_FILE_CAPACITY {
        return Err(DriverError::RegisterCapacity {
            window: reg_window,
            capacity: REG_FILE_CAPACITY,
        });
    }
    let const_window = variant.const_window();
    if const_window >= CONST_BANK_CAPACITY {
        return Err(DriverError::ConstantCapacity {
            window: const_window,
            capacity: CONST_BANK_CAPACITY,
        });
    }
    // Declared inputs index the shared input pool slot-by-slot; a variant
    // declaring more slots than the pool holds must never reach the resolver.
    if variant.stage.has_declared_inputs() && variant.inputs.len() > MAX_INPUT_SLOTS {
        return Err(DriverError::InputSlotOverflow {
            slots: variant.inputs.len(),
            capacity: MAX_INPUT_SLOTS,
        });
    }
    let declared = variant.inputs.iter().chain(&variant.outputs);
    for slot in declared {
        let top = slot.component_reg(sceq_ir::COMPS_PER_SLOT - 1);
        if top as usize >= reg_window {
            return Err(DriverError::PlacementOutOfRange {
                reg: slot.reg,
                window: reg_window,
            });
        }
    }
    Ok(())
}

/// Run one variant with the shared test vector and extract its outputs.
///
/// The register file is filled with fresh independent draws on every
/// invocation. A correct program's result depends only on its declared
/// inputs and constants, so any residual dependency on initial register
/// content shows up as a mismatch between the two variants' runs instead of
/// hiding behind a shared fill.
pub fn run_variant<S: Simulator>(
    variant: &CompiledVariant,
    vector: &TestVector,
    simulator: &S,
    entropy: &mut Entropy,
    budget: Option<u64>,
) -> Result<OutputVector, DriverError> {
    preflight(variant)?;

    let mut regs = vec![0.0f32; variant.reg_window()];
    entropy.fill(&mut regs);

    placement::write_inputs(variant, vector, &mut regs);

    let consts = &vector.consts[..variant.const_window()];
    simulator.execute(&variant.code, consts, &mut regs, budget)?;

    debug!(
        stage = %variant.stage,
        regs = regs.len(),
        "execution complete"
    );
    dump::register_file(&regs);

    Ok(placement::read_outputs(variant, &regs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InterpSimulator, ops};
    use sceq_ir::{CompMask, Slot, Stage};

    fn passthrough_variant() -> CompiledVariant {
        // Copies the two fixed fragment input scalars into r1.xy.
        CompiledVariant {
            stage: Stage::Fragment,
            code: vec![ops::mov(4, 0), ops::mov(5, 1)],
            inputs: vec![],
            outputs: vec![Slot::new(4, CompMask::new(0b0011))],
            max_reg: 1,
            max_const: 0,
        }
    }

    #[test]
    fn outputs_come_from_inputs_not_fill() {
        let variant = passthrough_variant();
        let sim = InterpSimulator;
        let mut entropy = Entropy::from_seed(11);
        let vector = entropy.test_vector();

        let a = run_variant(&variant, &vector, &sim, &mut entropy, None).unwrap();
        let b = run_variant(&variant, &vector, &sim, &mut entropy, None).unwrap();

        // x and y are written by the program, so they survive differing fills.
        assert_eq!(a.get(0, 0).to_bits(), vector.inputs[0].to_bits());
        assert_eq!(a.get(0, 1).to_bits(), vector.inputs[1].to_bits());
        assert_eq!(a.get(0, 0).to_bits(), b.get(0, 0).to_bits());
        // z and w come from independent randomized fills.
        assert_ne!(a.get(0, 2).to_bits(), b.get(0, 2).to_bits());
    }

    #[test]
    fn register_capacity_rejected_before_execution() {
        let mut variant = passthrough_variant();
        variant.max_reg = 63; // (63 + 1) * 4 == 256, not strictly below capacity
        let sim = InterpSimulator;
        let mut entropy = Entropy::from_seed(0);
        let vector = entropy.test_vector();

        let err = run_variant(&variant, &vector, &sim, &mut entropy, None).unwrap_err();
        assert!(matches!(err, DriverError::RegisterCapacity { window: 256, .. }));
    }

    #[test]
    fn constant_capacity_rejected() {
        let mut variant = passthrough_variant();
        variant.max_const = 70;
        assert!(matches!(
            preflight(&variant),
            Err(DriverError::ConstantCapacity { .. })
        ));
    }

    #[test]
    fn out_of_window_placement_rejected() {
        let mut variant = passthrough_variant();
        variant.outputs = vec![Slot::new(60, CompMask::ALL)];
        assert!(matches!(
            preflight(&variant),
            Err(DriverError::PlacementOutOfRange { reg: 60, .. })
        ));
    }

    #[test]
    fn too_many_input_slots_rejected_before_execution() {
        // Every placement fits the register window, so only the pool bound
        // can reject this; without it the resolver would index past the pool.
        let variant = CompiledVariant {
            stage: Stage::Vertex,
            code: vec![],
            inputs: (0..17).map(|_| Slot::new(0, CompMask::ALL)).collect(),
            outputs: vec![],
            max_reg: 0,
            max_const: 0,
        };
        let sim = InterpSimulator;
        let mut entropy = Entropy::from_seed(2);
        let vector = entropy.test_vector();

        let err = run_variant(&variant, &vector, &sim, &mut entropy, None).unwrap_err();
        assert!(matches!(
            err,
            DriverError::InputSlotOverflow { slots: 17, capacity: 16 }
        ));
    }

    #[test]
    fn budget_exhaustion_is_a_fault() {
        let variant = passthrough_variant();
        let sim = InterpSimulator;
        let mut entropy = Entropy::from_seed(1);
        let vector = entropy.test_vector();

        let err = run_variant(&variant, &vector, &sim, &mut entropy, Some(1)).unwrap_err();
        assert!(matches!(err, DriverError::Sim(SimFault::BudgetExhausted(1))));
    }
}
