//! CLI command handling
//!
//! Splits the command line into test ids and emulator flags, resolves the
//! run context and runs the suite.

use std::path::PathBuf;

use crate::commands::Args;
use crate::common::config::{Config, Overrides, RunContext, SuiteSelection};
use crate::common::{Error, Result};
use crate::report::{self, ReportFormat};
use crate::suite::{SuiteExecutor, SuiteReport};

/// Harness options that take a value and only count before the first test id
const VALUE_OPTIONS: &[&str] = &["--config", "--emulator", "--root", "--timeout", "--suite"];

/// A classified command line
#[derive(Debug)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub overrides: Overrides,
    pub suite: SuiteSelection,
    /// Explicit test ids; empty means use the built-in suite
    pub tests: Vec<String>,
    /// Flags passed verbatim to the emulator, in order
    pub passthrough: Vec<String>,
    /// Harness options found after a test id, passed through anyway
    pub misplaced: Vec<String>,
}

impl Invocation {
    /// Classify parsed arguments
    ///
    /// Values starting with `-` are emulator flags, except the harness's own
    /// `-v`/`--verbose`, `--teamcity` and `--json`. Everything else is a test id.
    pub fn from_args(args: Args) -> Result<Self> {
        let mut verbose = args.verbose;
        let mut teamcity = args.teamcity;
        let mut json = args.json;
        let mut tests = Vec::new();
        let mut passthrough = Vec::new();
        let mut misplaced = Vec::new();

        for arg in args.args {
            match arg.as_str() {
                "" => {}
                "-v" | "--verbose" => verbose = true,
                "--teamcity" => teamcity = true,
                "--json" => json = true,
                flag if flag.starts_with('-') => {
                    if let Some(option) = value_option(flag) {
                        misplaced.push(option.to_string());
                    }
                    passthrough.push(arg);
                }
                _ => tests.push(arg),
            }
        }

        let format = match (teamcity, json) {
            (true, true) => {
                return Err(Error::Config(
                    "--teamcity and --json cannot be used together".to_string(),
                ))
            }
            (true, false) => ReportFormat::TeamCity,
            (false, true) => ReportFormat::Json,
            (false, false) => ReportFormat::Human,
        };

        Ok(Self {
            config: args.config,
            overrides: Overrides {
                emulator: args.emulator,
                test_root: args.root,
                timeout_secs: args.timeout,
                verbose,
                format,
            },
            suite: args.suite,
            tests,
            passthrough,
            misplaced,
        })
    }

    pub fn verbose(&self) -> bool {
        self.overrides.verbose
    }
}

fn value_option(flag: &str) -> Option<&'static str> {
    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
    VALUE_OPTIONS.iter().copied().find(|option| *option == name)
}

/// Load config, check prerequisites and run the selected tests
///
/// Fails before any test runs if the emulator or test root is missing.
pub async fn dispatch(invocation: Invocation) -> Result<SuiteReport> {
    let Invocation {
        config,
        overrides,
        suite,
        tests,
        passthrough,
        misplaced,
    } = invocation;

    for option in &misplaced {
        tracing::warn!(option = %option, "Harness option after a test id is passed to the emulator");
    }

    let config = Config::load(config.as_deref())?;
    let ctx = RunContext::resolve(&config, overrides)?;

    let tests = if tests.is_empty() {
        config.suites.select(suite)
    } else {
        tests
    };

    tracing::info!(
        emulator = %ctx.emulator.display(),
        root = %ctx.test_root.display(),
        tests = tests.len(),
        timeout_secs = ctx.timeout.as_secs(),
        "Running suite"
    );

    let mut reporter = report::reporter_for(ctx.format, ctx.verbose, std::io::stdout());
    SuiteExecutor::new(&ctx)
        .run_suite(&tests, &passthrough, reporter.as_mut())
        .await
}
