//! Test suite execution
//!
//! Runs a list of test ids strictly one after another. Every id ends in
//! exactly one outcome and a failing test never stops the suite.

mod case;
mod executor;
mod outcome;

pub use case::TestCase;
pub use executor::SuiteExecutor;
pub use outcome::{Outcome, OutcomeTag, SuiteReport, TestRecord};
