//! Human-readable console output

use std::io::{self, Write};

use colored::Colorize;

use super::{Event, Reporter};
use crate::compare::Mismatch;
use crate::suite::{Outcome, SuiteReport, TestRecord};

/// Divergent lines shown per failed test in non-verbose mode
const MAX_DIVERGENCES_SHOWN: usize = 10;

const RULE: &str = "===============================";

/// Prints one line per test plus a summary
pub struct HumanReporter<W> {
    out: W,
    verbose: bool,
}

impl<W: Write> HumanReporter<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out, verbose }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn test_finished(&mut self, record: &TestRecord) -> io::Result<()> {
        let id = record.case.id.as_str();
        match &record.outcome {
            Outcome::Passed => {
                writeln!(self.out, "  {} - {}", id, "passed!".green())?;
            }
            Outcome::Failed {
                mismatch,
                actual,
                expected,
            } => {
                if self.verbose {
                    writeln!(self.out, "{} {} output:", id, "failed ==============".red())?;
                    writeln!(self.out, "{}", actual.trim_end())?;
                    writeln!(self.out, "============== expected output:")?;
                    writeln!(self.out, "{}", expected.trim_end())?;
                    writeln!(self.out, "{}", RULE)?;
                } else {
                    writeln!(self.out, "{} {}", id, "failed".red())?;
                    self.divergences(mismatch)?;
                }
            }
            Outcome::TimedOut { after, partial } => {
                writeln!(
                    self.out,
                    "{} {} after {:.1}s",
                    id,
                    "timed out".red(),
                    after.as_secs_f64()
                )?;
                if self.verbose && !partial.trim_end().is_empty() {
                    writeln!(self.out, "============== output before timeout:")?;
                    writeln!(self.out, "{}", partial.trim_end())?;
                    writeln!(self.out, "{}", RULE)?;
                }
            }
            Outcome::ArtifactMissing { .. } | Outcome::ExpectationMissing { .. } => {
                let message = record.outcome.message().unwrap_or_default();
                writeln!(
                    self.out,
                    "{} {}, failing test {}",
                    "WARNING:".yellow().bold(),
                    message,
                    id
                )?;
            }
            Outcome::RunError { message, output } => {
                writeln!(self.out, "{} {}: {}", "Failed to run test".red(), id, message)?;
                if self.verbose && !output.trim_end().is_empty() {
                    writeln!(self.out, "{}", output.trim_end())?;
                }
            }
        }
        Ok(())
    }

    fn divergences(&mut self, mismatch: &Mismatch) -> io::Result<()> {
        for d in mismatch.divergences.iter().take(MAX_DIVERGENCES_SHOWN) {
            writeln!(self.out, "  line {}:", d.line_index + 1)?;
            writeln!(self.out, "    {}   {}", "output:".dimmed(), d.actual)?;
            writeln!(self.out, "    {} {}", "expected:".dimmed(), d.expected)?;
        }
        if mismatch.divergences.len() > MAX_DIVERGENCES_SHOWN {
            writeln!(
                self.out,
                "  ... and {} more differing line(s)",
                mismatch.divergences.len() - MAX_DIVERGENCES_SHOWN
            )?;
        }
        if mismatch.length_mismatch {
            writeln!(
                self.out,
                "  output has {} line(s), expected {}",
                mismatch.actual_lines, mismatch.expected_lines
            )?;
        }
        Ok(())
    }

    fn summary(&mut self, report: &SuiteReport, emulator: &std::path::Path) -> io::Result<()> {
        writeln!(
            self.out,
            "{} tests passed, {} tests failed.",
            report.passed(),
            report.failed()
        )?;
        let failed = report.failed_ids();
        if !failed.is_empty() {
            writeln!(self.out, "Failed tests:")?;
            for id in failed {
                writeln!(self.out, "  {}", id)?;
            }
        }
        writeln!(self.out, "Ran {}", emulator.display())
    }
}

impl<W: Write + Send> Reporter for HumanReporter<W> {
    fn emit(&mut self, event: &Event<'_>) -> io::Result<()> {
        match event {
            Event::SuiteStarted { .. } | Event::TestStarted { .. } => return Ok(()),
            Event::TestFinished { record } => self.test_finished(record)?,
            Event::SuiteFinished { report, emulator } => self.summary(report, emulator)?,
        }
        self.out.flush()
    }
}
