//! emutest - golden-output test harness for headless emulator builds
//!
//! This library holds the test execution engine: a command runner with an
//! enforced timeout, the expectation loader, a line-by-line comparator, the
//! sequential suite executor and pluggable reporters.

pub mod cli;
pub mod commands;
pub mod common;
pub mod compare;
pub mod expectation;
pub mod report;
pub mod runner;
pub mod suite;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use compare::{compare, ComparisonVerdict};
pub use runner::{CommandRunner, ExecutionResult};
pub use suite::{Outcome, SuiteExecutor, SuiteReport};
