//! In-process doubles for the external collaborators.
//!
//! The two mock backends compile the same program description with
//! deliberately different register allocation, which exercises the
//! placement indirection the same way two real code generators would.
//! Also provides switches for injecting classic compiler bugs (dropped
//! output slot, read-before-write, constant indexing skew) so the harness's
//! detection paths can be tested.

mod isa;

pub use isa::{InterpSimulator, ops};

use std::fmt::Write as _;

use sceq_ir::{COMPS_PER_SLOT, CompMask, CompiledVariant, MAX_INPUT_SLOTS, Slot, Stage};

use crate::toolchain::{Backend, CompileError, Frontend, ParseError};

/// Program description consumed by the mock backends.
#[derive(Clone, Debug)]
pub struct MockProgram {
    pub stage: Stage,
    /// Declared input slots with their live-component masks (vertex only).
    pub inputs: Vec<CompMask>,
    /// One entry per output slot, in logical order.
    pub ops: Vec<MockOp>,
}

/// How one output slot is produced.
#[derive(Clone, Copy, Debug)]
pub enum MockOp {
    /// Copy components in `mask` from input slot `src`.
    ///
    /// For non-vertex stages the source is the fixed input convention, so
    /// only x and y can carry defined values.
    CopyInput { src: usize, mask: CompMask },
    /// Load constant vec4 `index`, all components.
    LoadConst { index: usize },
    /// Componentwise sum of two input slots. For non-vertex stages this
    /// produces the sum of the two fixed input scalars in x only.
    AddInputs { a: usize, b: usize },
}

/// Line-oriented frontend double.
///
/// ```text
/// stage vertex
/// in xy
/// out copy 0 xy
/// out const 3
/// out add 0 1
/// ```
pub struct MockFrontend;

impl Frontend for MockFrontend {
    type Program = MockProgram;

    fn parse(&self, source: &[u8]) -> Result<MockProgram, ParseError> {
        let text = std::str::from_utf8(source)
            .map_err(|_| ParseError("program source is not UTF-8".into()))?;
        let mut stage = None;
        let mut inputs = Vec::new();
        let mut ops = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut words = line.split_whitespace();
            match words.next() {
                Some("stage") => {
                    stage = Some(match words.next() {
                        Some("vertex") => Stage::Vertex,
                        Some("fragment") => Stage::Fragment,
                        Some("compute") => Stage::Compute,
                        other => {
                            return Err(ParseError(format!("bad stage: {other:?}")));
                        }
                    });
                }
                Some("in") => inputs.push(parse_mask(words.next())?),
                Some("out") => ops.push(parse_op(&mut words)?),
                Some(other) => {
                    return Err(ParseError(format!("unknown directive: {other}")));
                }
                None => unreachable!("blank lines are skipped"),
            }
        }

        let stage = stage.ok_or_else(|| ParseError("missing stage directive".into()))?;
        Ok(MockProgram { stage, inputs, ops })
    }

    fn stage(&self, program: &MockProgram) -> Stage {
        program.stage
    }
}

fn parse_mask(word: Option<&str>) -> Result<CompMask, ParseError> {
    let word = word.ok_or_else(|| ParseError("missing component mask".into()))?;
    let mut bits = 0u8;
    for c in word.chars() {
        match c {
            'x' => bits |= 1,
            'y' => bits |= 2,
            'z' => bits |= 4,
            'w' => bits |= 8,
            other => return Err(ParseError(format!("bad mask component: {other}"))),
        }
    }
    Ok(CompMask::new(bits))
}

fn parse_index(word: Option<&str>) -> Result<usize, ParseError> {
    word.ok_or_else(|| ParseError("missing index".into()))?
        .parse()
        .map_err(|_| ParseError("bad index".into()))
}

fn parse_op<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<MockOp, ParseError> {
    match words.next() {
        Some("copy") => Ok(MockOp::CopyInput {
            src: parse_index(words.next())?,
            mask: parse_mask(words.next())?,
        }),
        Some("const") => Ok(MockOp::LoadConst {
            index: parse_index(words.next())?,
        }),
        Some("add") => Ok(MockOp::AddInputs {
            a: parse_index(words.next())?,
            b: parse_index(words.next())?,
        }),
        other => Err(ParseError(format!("unknown output op: {other:?}"))),
    }
}

/// Register allocation strategy of a mock backend.
#[derive(Clone, Copy, Debug)]
enum AllocPolicy {
    /// Inputs at low vec registers, outputs packed right after.
    Dense,
    /// Inputs at odd vec registers, outputs spread across even ones.
    Sparse,
}

/// Compiler double over the toy instruction set.
#[derive(Clone, Debug)]
pub struct MockBackend {
    name: &'static str,
    policy: AllocPolicy,
    drop_output: bool,
    undef_read: bool,
    trap: bool,
    const_skew: bool,
    reject: bool,
    max_reg_override: Option<u32>,
}

impl MockBackend {
    #[must_use]
    pub const fn reference() -> Self {
        Self::new("reference", AllocPolicy::Dense)
    }

    #[must_use]
    pub const fn candidate() -> Self {
        Self::new("candidate", AllocPolicy::Sparse)
    }

    const fn new(name: &'static str, policy: AllocPolicy) -> Self {
        Self {
            name,
            policy,
            drop_output: false,
            undef_read: false,
            trap: false,
            const_skew: false,
            reject: false,
            max_reg_override: None,
        }
    }

    /// Miscompile: drop the last output slot of any multi-output program.
    #[must_use]
    pub const fn with_dropped_output(mut self) -> Self {
        self.drop_output = true;
        self
    }

    /// Bug injection: the first output component is rewritten from a
    /// register nothing ever writes.
    #[must_use]
    pub const fn with_undef_read(mut self) -> Self {
        self.undef_read = true;
        self
    }

    /// Emit an illegal trailing instruction so the simulator traps.
    #[must_use]
    pub const fn with_trap(mut self) -> Self {
        self.trap = true;
        self
    }

    /// Miscompile: constant loads read one scalar past their index.
    #[must_use]
    pub const fn with_const_skew(mut self) -> Self {
        self.const_skew = true;
        self
    }

    /// Reject every program.
    #[must_use]
    pub const fn with_reject(mut self) -> Self {
        self.reject = true;
        self
    }

    /// Report an inflated register bound (capacity-violation testing).
    #[must_use]
    pub const fn with_max_reg(mut self, max_reg: u32) -> Self {
        self.max_reg_override = Some(max_reg);
        self
    }

    const fn input_base(&self, slot: usize) -> u32 {
        (match self.policy {
            AllocPolicy::Dense => slot,
            AllocPolicy::Sparse => 2 * slot + 1,
        } * COMPS_PER_SLOT) as u32
    }

    const fn output_base(&self, num_inputs: usize, slot: usize) -> u32 {
        (match self.policy {
            AllocPolicy::Dense => num_inputs + slot,
            AllocPolicy::Sparse => 2 * (num_inputs + slot),
        } * COMPS_PER_SLOT) as u32
    }
}

impl Backend<MockProgram> for MockBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn compile(&self, program: &MockProgram) -> Result<CompiledVariant, CompileError> {
        if self.reject {
            return Err(CompileError::with_code("mock backend rejected program", 1));
        }
        let declared_inputs = if program.stage.has_declared_inputs() {
            program.inputs.as_slice()
        } else {
            &[]
        };
        let num_inputs = declared_inputs.len();
        if num_inputs > MAX_INPUT_SLOTS {
            return Err(CompileError::new("too many input slots"));
        }
        // Non-vertex stages reserve one leading vec register so outputs never
        // collide with the fixed input convention.
        let alloc_inputs = if program.stage.has_declared_inputs() {
            num_inputs
        } else {
            1
        };

        let vertex_src = |src: usize| -> Result<(u32, CompMask), CompileError> {
            declared_inputs
                .get(src)
                .map(|&mask| (self.input_base(src), mask))
                .ok_or_else(|| CompileError::new(format!("undeclared input slot {src}")))
        };

        let mut code = Vec::new();
        let mut outputs = Vec::new();
        let mut max_const = 0u32;

        for (j, op) in program.ops.iter().enumerate() {
            let base = self.output_base(alloc_inputs, j);
            let mask = match *op {
                MockOp::CopyInput { src, mask } => {
                    if program.stage.has_declared_inputs() {
                        let (src_base, declared) = vertex_src(src)?;
                        let live = mask.intersect(declared);
                        for comp in live.components() {
                            code.push(ops::mov(base + comp as u32, src_base + comp as u32));
                        }
                        live
                    } else {
                        // Only the fixed convention registers carry defined
                        // values for non-vertex stages.
                        let live = mask.intersect(CompMask::new(0b0011));
                        for comp in live.components() {
                            code.push(ops::mov(base + comp as u32, comp as u32));
                        }
                        live
                    }
                }
                MockOp::LoadConst { index } => {
                    let skew = u32::from(self.const_skew);
                    max_const = max_const.max(index as u32 + skew);
                    for comp in 0..COMPS_PER_SLOT as u32 {
                        code.push(ops::ldc(
                            base + comp,
                            (index * COMPS_PER_SLOT) as u32 + comp + skew,
                        ));
                    }
                    CompMask::ALL
                }
                MockOp::AddInputs { a, b } => {
                    if program.stage.has_declared_inputs() {
                        let (a_base, a_mask) = vertex_src(a)?;
                        let (b_base, b_mask) = vertex_src(b)?;
                        let live = a_mask.intersect(b_mask);
                        for comp in live.components() {
                            let c = comp as u32;
                            code.push(ops::add(base + c, a_base + c, b_base + c));
                        }
                        live
                    } else {
                        code.push(ops::add(base, 0, 1));
                        CompMask::new(0b0001)
                    }
                }
            };
            outputs.push(Slot::new(base, mask));
        }

        let used_vecs = match self.policy {
            AllocPolicy::Dense => alloc_inputs + program.ops.len(),
            AllocPolicy::Sparse => 2 * (alloc_inputs + program.ops.len()),
        }
        .max(1);
        let mut max_reg = used_vecs as u32 - 1;

        if self.undef_read {
            // Scratch vec register nothing writes; rereading it makes the
            // first output component depend on initial register content.
            let scratch = used_vecs as u32 * COMPS_PER_SLOT as u32;
            max_reg += 1;
            if let Some(slot) = outputs.first() {
                if let Some(comp) = slot.mask.components().next() {
                    code.push(ops::mov(slot.component_reg(comp), scratch));
                }
            }
        }
        if self.trap {
            code.push(ops::invalid());
        }
        if let Some(forced) = self.max_reg_override {
            max_reg = forced;
        }
        if self.drop_output && outputs.len() > 1 {
            outputs.pop();
        }

        let inputs = declared_inputs
            .iter()
            .enumerate()
            .map(|(i, &mask)| Slot::new(self.input_base(i), mask))
            .collect();

        Ok(CompiledVariant {
            stage: program.stage,
            code,
            inputs,
            outputs,
            max_reg,
            max_const,
        })
    }

    fn disassemble(
        &self,
        variant: &CompiledVariant,
        out: &mut dyn std::fmt::Write,
    ) -> std::fmt::Result {
        for &word in &variant.code {
            writeln!(out, "{word:08x}")?;
        }
        Ok(())
    }
}

/// The standard pair: dense reference, sparse candidate.
#[must_use]
pub fn mock_backends() -> (MockBackend, MockBackend) {
    (MockBackend::reference(), MockBackend::candidate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vertex_program() {
        let source = b"# comment\nstage vertex\nin xy\nin xyzw\nout copy 0 xy\nout add 0 1\n";
        let program = MockFrontend.parse(source).unwrap();
        assert_eq!(program.stage, Stage::Vertex);
        assert_eq!(program.inputs.len(), 2);
        assert_eq!(program.ops.len(), 2);
        assert_eq!(program.inputs[0].bits(), 0b0011);
    }

    #[test]
    fn rejects_missing_stage() {
        assert!(MockFrontend.parse(b"in xy\n").is_err());
    }

    #[test]
    fn rejects_unknown_directive() {
        assert!(MockFrontend.parse(b"stage vertex\nfoo bar\n").is_err());
    }

    #[test]
    fn backends_allocate_differently() {
        let program = MockProgram {
            stage: Stage::Vertex,
            inputs: vec![CompMask::ALL],
            ops: vec![MockOp::CopyInput {
                src: 0,
                mask: CompMask::ALL,
            }],
        };
        let (reference, candidate) = mock_backends();
        let a = reference.compile(&program).unwrap();
        let b = candidate.compile(&program).unwrap();
        assert_eq!(a.outputs.len(), b.outputs.len());
        assert_ne!(a.inputs[0].reg, b.inputs[0].reg);
        assert_ne!(a.outputs[0].reg, b.outputs[0].reg);
    }

    #[test]
    fn undeclared_input_is_a_compile_error() {
        let program = MockProgram {
            stage: Stage::Vertex,
            inputs: vec![],
            ops: vec![MockOp::CopyInput {
                src: 0,
                mask: CompMask::ALL,
            }],
        };
        assert!(MockBackend::reference().compile(&program).is_err());
    }

    #[test]
    fn const_skew_shifts_bank_reads() {
        let program = MockProgram {
            stage: Stage::Fragment,
            inputs: vec![],
            ops: vec![MockOp::LoadConst { index: 2 }],
        };
        let clean = MockBackend::reference().compile(&program).unwrap();
        let skewed = MockBackend::reference().with_const_skew().compile(&program).unwrap();
        assert_ne!(clean.code, skewed.code);
        assert_eq!(skewed.max_const, 3);
    }
}
