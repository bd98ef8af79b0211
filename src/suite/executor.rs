//! Suite executor implementation

use std::ffi::OsString;
use std::time::Instant;

use tracing::Instrument;

use super::{Outcome, SuiteReport, TestCase, TestRecord};
use crate::common::config::RunContext;
use crate::common::Result;
use crate::compare::{compare, ComparisonVerdict};
use crate::expectation;
use crate::report::{Event, Reporter};
use crate::runner::{CommandRunner, ExecutionResult};

/// Runs test cases against the configured emulator
pub struct SuiteExecutor<'a> {
    ctx: &'a RunContext,
    runner: CommandRunner,
}

impl<'a> SuiteExecutor<'a> {
    pub fn new(ctx: &'a RunContext) -> Self {
        let runner = CommandRunner::new(ctx.timeout)
            .with_capture(ctx.capture)
            .with_drain(ctx.capture_drain);
        Self { ctx, runner }
    }

    /// Run every test in order, streaming events to `reporter`
    ///
    /// Only a failure to write the report stream is returned as an error.
    pub async fn run_suite(
        &self,
        tests: &[String],
        extra_args: &[String],
        reporter: &mut dyn Reporter,
    ) -> Result<SuiteReport> {
        reporter.emit(&Event::SuiteStarted { total: tests.len() })?;

        let mut report = SuiteReport {
            records: Vec::with_capacity(tests.len()),
        };

        for id in tests {
            reporter.emit(&Event::TestStarted { test_id: id.as_str() })?;

            let started = Instant::now();
            let case = TestCase::resolve(&self.ctx.test_root, id, &self.ctx.artifact_extensions);
            let span = tracing::info_span!("test", test_id = %id);
            let outcome = self.run_test(&case, extra_args).instrument(span).await;

            tracing::info!(test_id = %id, outcome = outcome.tag().as_str(), "Test finished");

            let record = TestRecord {
                case,
                outcome,
                duration: started.elapsed(),
            };
            reporter.emit(&Event::TestFinished { record: &record })?;
            report.records.push(record);
        }

        reporter.emit(&Event::SuiteFinished {
            report: &report,
            emulator: &self.ctx.emulator,
        })?;

        Ok(report)
    }

    /// Take one test to its terminal state
    async fn run_test(&self, case: &TestCase, extra_args: &[String]) -> Outcome {
        let Some(artifact) = &case.artifact else {
            tracing::warn!(tried = ?case.candidates, "Test artifact missing");
            return Outcome::ArtifactMissing {
                tried: case.candidates.clone(),
            };
        };

        let expected = match expectation::load(&case.expectation) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::warn!(path = %case.expectation.display(), "Expects file missing");
                return Outcome::ExpectationMissing {
                    path: case.expectation.clone(),
                    reason: None,
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "Expects file unreadable");
                return Outcome::ExpectationMissing {
                    path: case.expectation.clone(),
                    reason: Some(e.to_string()),
                };
            }
        };

        let mut argv: Vec<OsString> = Vec::with_capacity(2 + extra_args.len());
        argv.push(self.ctx.emulator.clone().into_os_string());
        argv.push(artifact.clone().into_os_string());
        argv.extend(extra_args.iter().map(OsString::from));

        match self.runner.run(&argv).await {
            ExecutionResult::TimedOut { partial, after } => Outcome::TimedOut {
                after,
                partial: String::from_utf8_lossy(&partial).into_owned(),
            },
            ExecutionResult::ProcessError { message, output } => {
                tracing::warn!(message = %message, "Test run failed");
                Outcome::RunError {
                    message,
                    output: String::from_utf8_lossy(&output).into_owned(),
                }
            }
            ExecutionResult::Completed { output } => {
                let actual = String::from_utf8_lossy(&output).into_owned();
                match compare(&actual, &expected) {
                    ComparisonVerdict::Pass => Outcome::Passed,
                    ComparisonVerdict::Fail(mismatch) => Outcome::Failed {
                        mismatch,
                        actual,
                        expected,
                    },
                }
            }
        }
    }
}
