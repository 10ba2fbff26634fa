//! Toolchain collaborators loaded from a shared library.
//!
//! The parser, lowering pass, the two compilers, and the simulator live in
//! one shared object with a small C ABI. Symbols:
//!
//! ```text
//! sq_parse(src, len) -> *mut Program            // null = parse error
//! sq_program_free(p)
//! sq_program_stage(p) -> u32                    // 0 vert, 1 frag, 2 comp
//! sq_lower(p) -> *mut Program                   // null = pass declined
//! sq_compile_ref(p, *mut SqShaderDesc) -> i32   // 0 = ok
//! sq_compile_new(p, *mut SqShaderDesc) -> i32
//! sq_shader_free(*mut SqShaderDesc)
//! sq_execute(code, code_len, consts, consts_len, regs, regs_len, max_instrs) -> i32
//! ```
//!
//! `sq_execute` returns 0 on success, 1 on a trap, 2 on budget exhaustion
//! (`max_instrs` 0 means unbounded).

use std::ffi::c_void;
use std::path::Path;
use std::rc::Rc;

use libloading::Library;
use thiserror::Error;

use sceq_ir::{CompMask, CompiledVariant, Slot, Stage, StageError};

use super::{Backend, CompileError, Frontend, ParseError, SimFault, Simulator};

/// Maximum slots the descriptor exchanges per direction.
pub const DESC_MAX_SLOTS: usize = 16;

/// Placement record in the C descriptor.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct SqSlotDesc {
    /// Base scalar register index.
    pub reg: u32,
    /// Active-component mask, low 4 bits.
    pub mask: u32,
}

/// Compilation result descriptor filled in by a compiler collaborator.
///
/// `code` stays owned by the library until `sq_shader_free`.
#[repr(C)]
#[derive(Debug)]
pub struct SqShaderDesc {
    pub code: *const u32,
    pub code_len: u32,
    pub num_inputs: u32,
    pub num_outputs: u32,
    pub inputs: [SqSlotDesc; DESC_MAX_SLOTS],
    pub outputs: [SqSlotDesc; DESC_MAX_SLOTS],
    pub max_reg: u32,
    pub max_const: u32,
}

impl Default for SqShaderDesc {
    fn default() -> Self {
        Self {
            code: std::ptr::null(),
            code_len: 0,
            num_inputs: 0,
            num_outputs: 0,
            inputs: [SqSlotDesc::default(); DESC_MAX_SLOTS],
            outputs: [SqSlotDesc::default(); DESC_MAX_SLOTS],
            max_reg: 0,
            max_const: 0,
        }
    }
}

/// Errors while binding the shared library. Run-fatal.
#[derive(Debug, Error)]
pub enum ToolchainLoadError {
    #[error("failed to load toolchain library: {0}")]
    Load(#[from] libloading::Error),

    #[error("toolchain library not found: {0}")]
    NotFound(String),

    #[error("failed to find symbol '{0}': {1}")]
    SymbolNotFound(String, libloading::Error),
}

type SqParse = unsafe extern "C" fn(*const u8, usize) -> *mut c_void;
type SqProgramFree = unsafe extern "C" fn(*mut c_void);
type SqProgramStage = unsafe extern "C" fn(*const c_void) -> u32;
type SqLower = unsafe extern "C" fn(*const c_void) -> *mut c_void;
type SqCompile = unsafe extern "C" fn(*const c_void, *mut SqShaderDesc) -> i32;
type SqShaderFree = unsafe extern "C" fn(*mut SqShaderDesc);
type SqExecute =
    unsafe extern "C" fn(*const u32, u32, *const f32, u32, *mut f32, u32, u64) -> i32;

#[derive(Clone, Copy)]
struct Api {
    parse: SqParse,
    program_free: SqProgramFree,
    program_stage: SqProgramStage,
    lower: SqLower,
    compile_ref: SqCompile,
    compile_new: SqCompile,
    shader_free: SqShaderFree,
    execute: SqExecute,
}

impl Api {
    unsafe fn load(lib: &Library) -> Result<Self, ToolchainLoadError> {
        unsafe {
            Ok(Self {
                parse: load_symbol(lib, b"sq_parse", "sq_parse")?,
                program_free: load_symbol(lib, b"sq_program_free", "sq_program_free")?,
                program_stage: load_symbol(lib, b"sq_program_stage", "sq_program_stage")?,
                lower: load_symbol(lib, b"sq_lower", "sq_lower")?,
                compile_ref: load_symbol(lib, b"sq_compile_ref", "sq_compile_ref")?,
                compile_new: load_symbol(lib, b"sq_compile_new", "sq_compile_new")?,
                shader_free: load_symbol(lib, b"sq_shader_free", "sq_shader_free")?,
                execute: load_symbol(lib, b"sq_execute", "sq_execute")?,
            })
        }
    }
}

unsafe fn load_symbol<T: Copy>(
    lib: &Library,
    symbol: &'static [u8],
    label: &'static str,
) -> Result<T, ToolchainLoadError> {
    let sym: libloading::Symbol<'_, T> = unsafe { lib.get(symbol) }
        .map_err(|e| ToolchainLoadError::SymbolNotFound(label.to_string(), e))?;
    Ok(*sym)
}

struct ToolchainLib {
    // Keeps the mapping alive for every Api call.
    _lib: Library,
    api: Api,
}

/// Handle to the whole collaborator set; clone out the individual pieces.
#[derive(Clone)]
pub struct SharedToolchain {
    inner: Rc<ToolchainLib>,
}

impl SharedToolchain {
    /// Load a toolchain shared library and resolve its symbol table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ToolchainLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ToolchainLoadError::NotFound(path.display().to_string()));
        }
        let lib = unsafe { Library::new(path)? };
        let api = unsafe { Api::load(&lib)? };
        Ok(Self {
            inner: Rc::new(ToolchainLib { _lib: lib, api }),
        })
    }

    #[must_use]
    pub fn frontend(&self) -> SharedFrontend {
        SharedFrontend {
            lib: Rc::clone(&self.inner),
        }
    }

    #[must_use]
    pub fn reference_backend(&self) -> SharedBackend {
        SharedBackend {
            lib: Rc::clone(&self.inner),
            entry: CompileEntry::Reference,
        }
    }

    #[must_use]
    pub fn candidate_backend(&self) -> SharedBackend {
        SharedBackend {
            lib: Rc::clone(&self.inner),
            entry: CompileEntry::Candidate,
        }
    }

    #[must_use]
    pub fn simulator(&self) -> SharedSimulator {
        SharedSimulator {
            lib: Rc::clone(&self.inner),
        }
    }
}

/// Owned parsed-program handle; freed on drop.
///
/// The stage tag is decoded once when the handle is built, so a handle
/// always carries a valid stage.
pub struct ProgramHandle {
    ptr: *mut c_void,
    stage: Stage,
    lib: Rc<ToolchainLib>,
}

impl Drop for ProgramHandle {
    fn drop(&mut self) {
        unsafe { (self.lib.api.program_free)(self.ptr) };
    }
}

/// Frontend collaborator bound to the shared library.
pub struct SharedFrontend {
    lib: Rc<ToolchainLib>,
}

impl SharedFrontend {
    /// Decode the stage tag and take ownership of `ptr`. A program with an
    /// unknown tag is freed and rejected; it never reaches compilation.
    fn wrap(&self, ptr: *mut c_void) -> Result<ProgramHandle, StageError> {
        let raw = unsafe { (self.lib.api.program_stage)(ptr) };
        match Stage::try_from(raw) {
            Ok(stage) => Ok(ProgramHandle {
                ptr,
                stage,
                lib: Rc::clone(&self.lib),
            }),
            Err(e) => {
                unsafe { (self.lib.api.program_free)(ptr) };
                Err(e)
            }
        }
    }
}

impl Frontend for SharedFrontend {
    type Program = ProgramHandle;

    fn parse(&self, source: &[u8]) -> Result<ProgramHandle, ParseError> {
        let ptr = unsafe { (self.lib.api.parse)(source.as_ptr(), source.len()) };
        if ptr.is_null() {
            return Err(ParseError("toolchain parser rejected input".into()));
        }
        self.wrap(ptr).map_err(|e| ParseError(e.to_string()))
    }

    fn lower(&self, program: &ProgramHandle) -> Option<ProgramHandle> {
        let ptr = unsafe { (self.lib.api.lower)(program.ptr) };
        if ptr.is_null() {
            None
        } else {
            // Lowering preserves the stage tag.
            Some(ProgramHandle {
                ptr,
                stage: program.stage,
                lib: Rc::clone(&self.lib),
            })
        }
    }

    fn stage(&self, program: &ProgramHandle) -> Stage {
        program.stage
    }
}

#[derive(Clone, Copy)]
enum CompileEntry {
    Reference,
    Candidate,
}

/// One compiler collaborator bound to the shared library.
pub struct SharedBackend {
    lib: Rc<ToolchainLib>,
    entry: CompileEntry,
}

impl Backend<ProgramHandle> for SharedBackend {
    fn name(&self) -> &str {
        match self.entry {
            CompileEntry::Reference => "reference",
            CompileEntry::Candidate => "candidate",
        }
    }

    fn compile(&self, program: &ProgramHandle) -> Result<CompiledVariant, CompileError> {
        let compile = match self.entry {
            CompileEntry::Reference => self.lib.api.compile_ref,
            CompileEntry::Candidate => self.lib.api.compile_new,
        };
        let mut desc = SqShaderDesc::default();
        let rc = unsafe { compile(program.ptr, &raw mut desc) };
        if rc != 0 {
            return Err(CompileError::with_code(
                format!("{} compiler returned {rc}", self.name()),
                rc,
            ));
        }
        let variant = convert_desc(&desc, program.stage);
        unsafe { (self.lib.api.shader_free)(&raw mut desc) };
        variant
    }
}

fn convert_desc(desc: &SqShaderDesc, stage: Stage) -> Result<CompiledVariant, CompileError> {
    let num_inputs = desc.num_inputs as usize;
    let num_outputs = desc.num_outputs as usize;
    if num_inputs > DESC_MAX_SLOTS || num_outputs > DESC_MAX_SLOTS {
        return Err(CompileError::new("compiler descriptor slot count overflow"));
    }
    if desc.code.is_null() && desc.code_len > 0 {
        return Err(CompileError::new("compiler descriptor has null code"));
    }
    let code = if desc.code_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(desc.code, desc.code_len as usize) }.to_vec()
    };
    let to_slot = |d: &SqSlotDesc| Slot::new(d.reg, CompMask::new(d.mask as u8));
    Ok(CompiledVariant {
        stage,
        code,
        inputs: desc.inputs[..num_inputs].iter().map(to_slot).collect(),
        outputs: desc.outputs[..num_outputs].iter().map(to_slot).collect(),
        max_reg: desc.max_reg,
        max_const: desc.max_const,
    })
}

/// Simulator collaborator bound to the shared library.
pub struct SharedSimulator {
    lib: Rc<ToolchainLib>,
}

impl Simulator for SharedSimulator {
    fn execute(
        &self,
        code: &[u32],
        consts: &[f32],
        regs: &mut [f32],
        budget: Option<u64>,
    ) -> Result<(), SimFault> {
        let rc = unsafe {
            (self.lib.api.execute)(
                code.as_ptr(),
                code.len() as u32,
                consts.as_ptr(),
                consts.len() as u32,
                regs.as_mut_ptr(),
                regs.len() as u32,
                budget.unwrap_or(0),
            )
        };
        match rc {
            0 => Ok(()),
            2 => Err(SimFault::BudgetExhausted(budget.unwrap_or(0))),
            other => Err(SimFault::Trap(format!("simulator returned {other}"))),
        }
    }
}
