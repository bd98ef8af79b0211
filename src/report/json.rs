//! JSON lines event stream

use std::io::{self, Write};

use serde::Serialize;

use super::{Event, Reporter};
use crate::compare::Divergence;
use crate::suite::{Outcome, OutcomeTag};

/// Wire form of one event
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JsonEvent<'a> {
    Start {
        test_id: &'a str,
    },
    Pass {
        test_id: &'a str,
    },
    Fail {
        test_id: &'a str,
        outcome: OutcomeTag,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        divergences: Option<&'a [Divergence]>,
    },
    Timeout {
        test_id: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Finished {
        test_id: &'a str,
        outcome: OutcomeTag,
        duration_ms: u64,
    },
    Summary {
        passed: usize,
        failed: usize,
        failed_tests: Vec<&'a str>,
    },
}

/// Writes one JSON object per line
pub struct JsonReporter<W> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, event: &JsonEvent<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn emit(&mut self, event: &Event<'_>) -> io::Result<()> {
        match event {
            Event::SuiteStarted { .. } => return Ok(()),
            Event::TestStarted { test_id } => self.write(&JsonEvent::Start { test_id: *test_id })?,
            Event::TestFinished { record } => {
                let test_id = record.case.id.as_str();
                let verdict = match &record.outcome {
                    Outcome::Passed => JsonEvent::Pass { test_id },
                    Outcome::TimedOut { .. } => JsonEvent::Timeout {
                        test_id,
                        message: record.outcome.message(),
                    },
                    Outcome::Failed { mismatch, .. } => JsonEvent::Fail {
                        test_id,
                        outcome: OutcomeTag::Failed,
                        message: record.outcome.message(),
                        divergences: Some(mismatch.divergences.as_slice()),
                    },
                    other => JsonEvent::Fail {
                        test_id,
                        outcome: other.tag(),
                        message: other.message(),
                        divergences: None,
                    },
                };
                self.write(&verdict)?;
                self.write(&JsonEvent::Finished {
                    test_id,
                    outcome: record.outcome.tag(),
                    duration_ms: record.duration.as_millis() as u64,
                })?;
            }
            Event::SuiteFinished { report, .. } => self.write(&JsonEvent::Summary {
                passed: report.passed(),
                failed: report.failed(),
                failed_tests: report.failed_ids(),
            })?,
        }
        self.out.flush()
    }
}
