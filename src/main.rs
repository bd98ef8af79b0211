//! emutest - golden-output test harness for headless emulator builds
//!
//! Runs each test binary through the emulator, compares what it prints with
//! the matching `.expected` file and reports the results.

use clap::Parser;
use emutest::cli::{self, Invocation};
use emutest::commands::Args;
use emutest::common::logging;

/// Exit code when at least one test did not pass
const EXIT_TESTS_FAILED: i32 = 1;
/// Exit code for harness errors (missing prerequisites, bad config, I/O)
const EXIT_HARNESS_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let invocation = match Invocation::from_args(args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_HARNESS_ERROR);
        }
    };

    logging::init_cli(invocation.verbose());

    match cli::dispatch(invocation).await {
        Ok(report) if report.all_passed() => {}
        Ok(_) => std::process::exit(EXIT_TESTS_FAILED),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(EXIT_HARNESS_ERROR);
        }
    }
}
