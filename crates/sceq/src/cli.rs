//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::Parser;

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "sceq")]
#[command(about = "Differential equivalence tester for shader compiler backends")]
#[command(version)]
pub struct Cli {
    /// Text-format shader programs to test
    #[arg(value_name = "PROGRAM")]
    pub programs: Vec<PathBuf>,

    /// Shared library providing the parser, compilers, and simulator
    #[arg(short, long, value_name = "LIB")]
    pub toolchain: PathBuf,

    /// Entropy seed; replay a printed seed to reproduce a run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Test vectors per program
    #[arg(long, default_value = "1")]
    pub iterations: usize,

    /// Simulator instruction budget per execution (0 = unbounded)
    #[arg(long, default_value = "1048576")]
    pub max_instrs: u64,

    /// Emit backend disassembly at debug level
    #[arg(long)]
    pub disasm: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub silent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_programs_is_a_valid_invocation() {
        let cli = Cli::try_parse_from(["sceq", "--toolchain", "libtc.so"]).unwrap();
        assert!(cli.programs.is_empty());
    }

    #[test]
    fn silent_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["sceq", "-t", "libtc.so", "-v", "-q"]).is_err());
    }
}
