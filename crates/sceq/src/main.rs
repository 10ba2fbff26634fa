//! sceq CLI - shader compiler equivalence tester.

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sceq::{CaseStatus, Harness, HarnessConfig, SharedToolchain};

use cli::{Cli, EXIT_FAILURE, EXIT_SUCCESS};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "sceq=debug"
    } else if cli.silent {
        "sceq=error"
    } else {
        "sceq=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(default_level.parse().unwrap()),
        )
        .with_target(false)
        .init();

    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let toolchain = match SharedToolchain::load(&cli.toolchain) {
        Ok(toolchain) => toolchain,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_FAILURE;
        }
    };

    let seed = cli.seed.unwrap_or_else(rand::random);
    println!("seed: {seed}");

    let config = HarnessConfig {
        seed,
        iterations: cli.iterations,
        budget: (cli.max_instrs > 0).then_some(cli.max_instrs),
        disasm: cli.disasm,
    };

    let mut harness = Harness::new(
        toolchain.frontend(),
        Box::new(toolchain.reference_backend()),
        Box::new(toolchain.candidate_backend()),
        toolchain.simulator(),
        config,
    );

    let summary = match harness.run(&cli.programs) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: {e}");
            return EXIT_FAILURE;
        }
    };

    for case in &summary.cases {
        let verdict = if case.passed() { "PASS" } else { "FAIL" };
        println!("{verdict} {}: {}", case.path.display(), case.status);
        if let CaseStatus::Mismatched(mismatches) = &case.status {
            for m in mismatches {
                println!("  {m}");
            }
        }
    }
    println!(
        "{} passed, {} failed",
        summary.passed_count(),
        summary.failed_count()
    );

    if summary.passed() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}
