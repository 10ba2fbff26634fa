//! Diagnostic dumps: variant summaries, placements, register files.
//!
//! Everything here is observational and routed through `tracing`; none of it
//! affects comparison outcomes.

use std::fmt::Write as _;

use tracing::{debug, info, trace};

use sceq_ir::{COMPS_PER_SLOT, CompiledVariant, Slot};

use crate::toolchain::Backend;

/// Log a per-variant summary: stage tag, instruction count, register and
/// constant usage, declared placements.
pub fn variant_info(label: &str, variant: &CompiledVariant) {
    info!(
        backend = label,
        stage = %variant.stage,
        instructions = variant.code.len(),
        regs = variant.max_reg + 1,
        consts = variant.max_const + 1,
        "compiled"
    );
    if variant.stage.has_declared_inputs() {
        debug!(backend = label, inputs = %render_slots(&variant.inputs), "input placement");
    }
    debug!(backend = label, outputs = %render_slots(&variant.outputs), "output placement");
}

/// Log the backend's disassembly of a variant, one line per `debug!` event.
pub fn disassembly<P>(backend: &dyn Backend<P>, variant: &CompiledVariant) {
    let mut text = String::new();
    if backend.disassemble(variant, &mut text).is_err() || text.is_empty() {
        return;
    }
    for line in text.lines() {
        debug!(backend = backend.name(), "{line}");
    }
}

/// Log the full register file, one vec4 row per line, raw bit patterns.
pub fn register_file(regs: &[f32]) {
    for (row, chunk) in regs.chunks(COMPS_PER_SLOT).enumerate() {
        let mut line = String::new();
        for v in chunk {
            let _ = write!(line, " {:08x}", v.to_bits());
        }
        trace!("r{row:02}:{line}");
    }
}

fn render_slots(slots: &[Slot]) -> String {
    let mut out = String::new();
    for slot in slots {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{slot}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceq_ir::CompMask;

    #[test]
    fn slot_list_rendering() {
        let slots = [
            Slot::new(0, CompMask::ALL),
            Slot::new(8, CompMask::new(0b0011)),
        ];
        assert_eq!(render_slots(&slots), "r0.xyzw r2.xy");
    }
}
