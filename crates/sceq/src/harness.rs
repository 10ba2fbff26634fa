//! Case orchestration: parse, lower, compile both paths, execute, compare.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use sceq_ir::Stage;

use crate::compare::{self, Comparison, Mismatch};
use crate::driver::{self, DriverError};
use crate::dump;
use crate::error::{Error, Result};
use crate::toolchain::{Backend, CompileError, Frontend, Simulator};
use crate::vector::Entropy;

/// Default simulator instruction budget per execution.
pub const DEFAULT_SIM_BUDGET: u64 = 1 << 20;

/// Harness configuration, fixed for the lifetime of a run.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    /// Seed for the run's entropy; replaying it reproduces the run.
    pub seed: u64,
    /// Test vectors per case.
    pub iterations: usize,
    /// Simulator instruction budget; `None` leaves execution unbounded.
    pub budget: Option<u64>,
    /// Emit backend disassembly at debug level.
    pub disasm: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            iterations: 1,
            budget: Some(DEFAULT_SIM_BUDGET),
            disasm: false,
        }
    }
}

/// Why a case did not pass. Case-local; the run continues either way.
#[derive(Debug)]
pub enum CaseStatus {
    Passed,
    /// At least one component pair differed in bit pattern.
    Mismatched(Vec<Mismatch>),
    /// One of the two compilers rejected the program.
    CompileFailed {
        backend: String,
        error: CompileError,
    },
    /// The two variants disagree on the number of declared output slots.
    /// Precondition violation; comparison never ran.
    SlotCountMismatch {
        reference: usize,
        candidate: usize,
    },
    /// A variant was rejected before or during execution.
    Rejected {
        backend: String,
        error: DriverError,
    },
}

impl CaseStatus {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "pass"),
            Self::Mismatched(mismatches) => {
                write!(f, "{} mismatched component(s)", mismatches.len())
            }
            Self::CompileFailed { backend, error } => {
                write!(f, "{backend} compiler failed: {error}")
            }
            Self::SlotCountMismatch {
                reference,
                candidate,
            } => write!(
                f,
                "output slot count mismatch: reference {reference} vs candidate {candidate}"
            ),
            Self::Rejected { backend, error } => write!(f, "{backend} rejected: {error}"),
        }
    }
}

/// Outcome of one input program.
#[derive(Debug)]
pub struct CaseReport {
    pub path: PathBuf,
    pub stage: Option<Stage>,
    pub status: CaseStatus,
}

impl CaseReport {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.status.passed()
    }
}

/// Aggregate outcome over all input programs.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub cases: Vec<CaseReport>,
}

impl RunSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.cases.iter().all(CaseReport::passed)
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.cases.len() - self.passed_count()
    }
}

/// The equivalence-testing harness.
///
/// Owns the frontend, the two code-generation paths, the simulator, and the
/// run's entropy. Cases run strictly one after another; all resources are
/// case-scoped except the advancing entropy sequence.
pub struct Harness<F: Frontend, S: Simulator> {
    frontend: F,
    reference: Box<dyn Backend<F::Program>>,
    candidate: Box<dyn Backend<F::Program>>,
    simulator: S,
    entropy: Entropy,
    config: HarnessConfig,
}

impl<F: Frontend, S: Simulator> Harness<F, S> {
    pub fn new(
        frontend: F,
        reference: Box<dyn Backend<F::Program>>,
        candidate: Box<dyn Backend<F::Program>>,
        simulator: S,
        config: HarnessConfig,
    ) -> Self {
        let entropy = Entropy::from_seed(config.seed);
        Self {
            frontend,
            reference,
            candidate,
            simulator,
            entropy,
            config,
        }
    }

    /// Run every input program. One case's failure never aborts the rest;
    /// only unreadable or unparsable input does.
    pub fn run(&mut self, paths: &[PathBuf]) -> Result<RunSummary> {
        info!(seed = self.entropy.seed(), cases = paths.len(), "starting run");
        let mut summary = RunSummary::default();
        for path in paths {
            summary.cases.push(self.run_case(path)?);
        }
        Ok(summary)
    }

    /// Run a single case from a program file.
    pub fn run_case(&mut self, path: &Path) -> Result<CaseReport> {
        info!(path = %path.display(), "reading");
        let source = std::fs::read(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let (stage, status) = self.run_source(&source).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(CaseReport {
            path: path.to_path_buf(),
            stage: Some(stage),
            status,
        })
    }

    /// Run a single case from in-memory source. Returns the stage tag and
    /// the case-local status; the only error is a parse failure.
    pub fn run_source(
        &mut self,
        source: &[u8],
    ) -> std::result::Result<(Stage, CaseStatus), crate::toolchain::ParseError> {
        let parsed = self.frontend.parse(source)?;
        let program = self.frontend.lower(&parsed).unwrap_or(parsed);
        let stage = self.frontend.stage(&program);
        Ok((stage, self.run_compiled(&program)))
    }

    /// Run the compile/execute/compare pipeline on an already-parsed program.
    pub fn run_program(&mut self, program: &F::Program) -> CaseStatus {
        self.run_compiled(program)
    }

    fn run_compiled(&mut self, program: &F::Program) -> CaseStatus {
        let reference = match self.reference.compile(program) {
            Ok(v) => v,
            Err(error) => {
                return CaseStatus::CompileFailed {
                    backend: self.reference.name().to_string(),
                    error,
                };
            }
        };
        dump::variant_info(self.reference.name(), &reference);
        if self.config.disasm {
            dump::disassembly(self.reference.as_ref(), &reference);
        }

        let candidate = match self.candidate.compile(program) {
            Ok(v) => v,
            Err(error) => {
                return CaseStatus::CompileFailed {
                    backend: self.candidate.name().to_string(),
                    error,
                };
            }
        };
        dump::variant_info(self.candidate.name(), &candidate);
        if self.config.disasm {
            dump::disassembly(self.candidate.as_ref(), &candidate);
        }

        // Logical output order and count must agree between the two variants
        // of one program; comparison is meaningless otherwise.
        if reference.outputs.len() != candidate.outputs.len() {
            return CaseStatus::SlotCountMismatch {
                reference: reference.outputs.len(),
                candidate: candidate.outputs.len(),
            };
        }

        let mut mismatches = Vec::new();
        for iteration in 0..self.config.iterations.max(1) {
            let vector = self.entropy.test_vector();

            let ref_out = match driver::run_variant(
                &reference,
                &vector,
                &self.simulator,
                &mut self.entropy,
                self.config.budget,
            ) {
                Ok(out) => out,
                Err(error) => {
                    return CaseStatus::Rejected {
                        backend: self.reference.name().to_string(),
                        error,
                    };
                }
            };

            let cand_out = match driver::run_variant(
                &candidate,
                &vector,
                &self.simulator,
                &mut self.entropy,
                self.config.budget,
            ) {
                Ok(out) => out,
                Err(error) => {
                    return CaseStatus::Rejected {
                        backend: self.candidate.name().to_string(),
                        error,
                    };
                }
            };

            let Comparison {
                compared,
                mismatches: found,
                ..
            } = compare::compare(&ref_out, &cand_out, &reference.outputs, &candidate.outputs);

            info!(
                iteration,
                compared,
                mismatched = found.len(),
                "iteration compared"
            );
            for m in &found {
                error!(%m, "mismatch");
            }
            mismatches.extend(found);
        }

        if mismatches.is_empty() {
            CaseStatus::Passed
        } else {
            CaseStatus::Mismatched(mismatches)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InterpSimulator, MockFrontend, MockOp, MockProgram, mock_backends};
    use sceq_ir::CompMask;

    fn passthrough() -> MockProgram {
        MockProgram {
            stage: Stage::Fragment,
            inputs: vec![],
            ops: vec![MockOp::CopyInput {
                src: 0,
                mask: CompMask::ALL,
            }],
        }
    }

    #[test]
    fn passthrough_fragment_passes() {
        let (reference, candidate) = mock_backends();
        let mut harness = Harness::new(
            MockFrontend,
            Box::new(reference),
            Box::new(candidate),
            InterpSimulator,
            HarnessConfig {
                seed: 42,
                iterations: 4,
                ..HarnessConfig::default()
            },
        );
        let status = harness.run_program(&passthrough());
        assert!(status.passed(), "unexpected status: {status}");
    }

    #[test]
    fn slot_count_mismatch_aborts_before_comparison() {
        let (reference, candidate) = mock_backends();
        let candidate = candidate.with_dropped_output();
        let mut harness = Harness::new(
            MockFrontend,
            Box::new(reference),
            Box::new(candidate),
            InterpSimulator,
            HarnessConfig::default(),
        );
        let status = harness.run_program(&MockProgram {
            stage: Stage::Fragment,
            inputs: vec![],
            ops: vec![
                MockOp::LoadConst { index: 0 },
                MockOp::LoadConst { index: 1 },
            ],
        });
        assert!(matches!(
            status,
            CaseStatus::SlotCountMismatch {
                reference: 2,
                candidate: 1
            }
        ));
    }
}
