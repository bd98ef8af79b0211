//! Reporting
//!
//! The executor emits a typed event stream while the suite runs. Each
//! renderer turns those events into one output format, writing to any
//! `io::Write` so results stream to CI as they happen.

mod human;
mod json;
mod teamcity;

use std::io::{self, Write};
use std::path::Path;

use crate::suite::{SuiteReport, TestRecord};

pub use human::HumanReporter;
pub use json::JsonReporter;
pub use teamcity::TeamCityReporter;

/// Something that happened during a suite run
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    SuiteStarted { total: usize },
    /// Emitted before any file of the test is looked at
    TestStarted { test_id: &'a str },
    /// Emitted as soon as the test reaches its terminal state
    TestFinished { record: &'a TestRecord },
    SuiteFinished {
        report: &'a SuiteReport,
        emulator: &'a Path,
    },
}

/// Renders suite events
pub trait Reporter: Send {
    fn emit(&mut self, event: &Event<'_>) -> io::Result<()>;
}

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Human,
    /// TeamCity service messages
    TeamCity,
    /// One JSON object per line
    Json,
}

/// Build the reporter for `format` writing to `out`
pub fn reporter_for<W>(format: ReportFormat, verbose: bool, out: W) -> Box<dyn Reporter>
where
    W: Write + Send + 'static,
{
    match format {
        ReportFormat::Human => Box::new(HumanReporter::new(out, verbose)),
        ReportFormat::TeamCity => Box::new(TeamCityReporter::new(out)),
        ReportFormat::Json => Box::new(JsonReporter::new(out)),
    }
}

/// Discards every event
#[derive(Debug, Default)]
pub struct Silent;

impl Reporter for Silent {
    fn emit(&mut self, _event: &Event<'_>) -> io::Result<()> {
        Ok(())
    }
}
