//! TeamCity service messages
//!
//! Line format consumed by TeamCity's build log parser. Names and messages
//! must stay byte-for-byte stable; existing CI configurations match on them.

use std::io::{self, Write};

use super::{Event, Reporter};
use crate::suite::{Outcome, TestRecord};

const SUITE_NAME: &str = "emutest";

pub struct TeamCityReporter<W> {
    out: W,
}

impl<W: Write> TeamCityReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn test_finished(&mut self, record: &TestRecord) -> io::Result<()> {
        let name = escape(&record.case.id);
        if let Some(message) = record.outcome.message() {
            match &record.outcome {
                Outcome::Failed {
                    actual, expected, ..
                } => writeln!(
                    self.out,
                    "##teamcity[testFailed name='{}' message='{}' type='comparisonFailure' actual='{}' expected='{}']",
                    name,
                    escape(&message),
                    escape(actual.trim_end()),
                    escape(expected.trim_end())
                )?,
                _ => writeln!(
                    self.out,
                    "##teamcity[testFailed name='{}' message='{}']",
                    name,
                    escape(&message)
                )?,
            }
        }
        writeln!(
            self.out,
            "##teamcity[testFinished name='{}' duration='{}']",
            name,
            record.duration.as_millis()
        )
    }
}

impl<W: Write + Send> Reporter for TeamCityReporter<W> {
    fn emit(&mut self, event: &Event<'_>) -> io::Result<()> {
        match event {
            Event::SuiteStarted { .. } => {
                writeln!(self.out, "##teamcity[testSuiteStarted name='{}']", SUITE_NAME)?
            }
            Event::TestStarted { test_id } => {
                writeln!(self.out, "##teamcity[testStarted name='{}']", escape(test_id))?
            }
            Event::TestFinished { record } => self.test_finished(record)?,
            Event::SuiteFinished { .. } => {
                writeln!(self.out, "##teamcity[testSuiteFinished name='{}']", SUITE_NAME)?
            }
        }
        self.out.flush()
    }
}

/// Escape a value for use inside a service message attribute
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '|' => escaped.push_str("||"),
            '\'' => escaped.push_str("|'"),
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            '[' => escaped.push_str("|["),
            ']' => escaped.push_str("|]"),
            c => escaped.push(c),
        }
    }
    escaped
}
