//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::common::config::SuiteSelection;

/// Harness flags, test ids and emulator pass-through flags
///
/// Everything after the first test id or unknown flag lands in `args`,
/// where `-v`, `--teamcity` and `--json` are still recognized.
#[derive(Parser, Debug)]
#[command(name = "emutest", about = "Run emulator test binaries against golden output")]
#[command(version, long_about = None)]
pub struct Args {
    /// Config file (default: ./emutest.toml, then the user config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emulator executable, overriding the configured candidates
    #[arg(long)]
    pub emulator: Option<PathBuf>,

    /// Root of the test tree
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Per-test timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Built-in list to run when no test ids are given
    #[arg(long, value_enum, default_value_t = SuiteSelection::Good)]
    pub suite: SuiteSelection,

    /// Dump full output on failure and enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit TeamCity service messages
    #[arg(long, conflicts_with = "json")]
    pub teamcity: bool,

    /// Emit one JSON event per line
    #[arg(long)]
    pub json: bool,

    /// Test ids (e.g. cpu/cpu/cpu) and flags passed to the emulator (e.g. -r)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
