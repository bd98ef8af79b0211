//! Per-test outcomes and the aggregated suite report

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::TestCase;
use crate::compare::Mismatch;

/// Terminal state of a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// Output differed from the expectation
    Failed {
        mismatch: Mismatch,
        actual: String,
        expected: String,
    },
    TimedOut {
        after: Duration,
        partial: String,
    },
    ArtifactMissing {
        tried: Vec<PathBuf>,
    },
    ExpectationMissing {
        path: PathBuf,
        /// Set when the file exists but could not be read
        reason: Option<String>,
    },
    /// Launch failure, I/O failure, or the emulator's sentinel error
    RunError {
        message: String,
        output: String,
    },
}

/// Outcome discriminant, as reported to CI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTag {
    Passed,
    Failed,
    TimedOut,
    ArtifactMissing,
    ExpectationMissing,
    RunError,
}

impl OutcomeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
            Self::ArtifactMissing => "artifact_missing",
            Self::ExpectationMissing => "expectation_missing",
            Self::RunError => "run_error",
        }
    }
}

impl Outcome {
    pub fn tag(&self) -> OutcomeTag {
        match self {
            Self::Passed => OutcomeTag::Passed,
            Self::Failed { .. } => OutcomeTag::Failed,
            Self::TimedOut { .. } => OutcomeTag::TimedOut,
            Self::ArtifactMissing { .. } => OutcomeTag::ArtifactMissing,
            Self::ExpectationMissing { .. } => OutcomeTag::ExpectationMissing,
            Self::RunError { .. } => OutcomeTag::RunError,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Short description of why the test did not pass
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Passed => None,
            Self::Failed { mismatch, .. } => Some(format!(
                "Output different from expected file: {}",
                mismatch.summary()
            )),
            Self::TimedOut { after, .. } => {
                Some(format!("Timed out after {:.1}s", after.as_secs_f64()))
            }
            Self::ArtifactMissing { tried } => {
                let tried: Vec<String> = tried.iter().map(|p| p.display().to_string()).collect();
                Some(format!("Test artifact missing, tried: {}", tried.join(", ")))
            }
            Self::ExpectationMissing { path, reason } => Some(match reason {
                Some(reason) => format!("Expects file unreadable: {}", reason),
                None => format!("Expects file missing: {}", path.display()),
            }),
            Self::RunError { message, .. } => Some(format!("Failed to run test: {}", message)),
        }
    }
}

/// A finished test
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub case: TestCase,
    pub outcome: Outcome,
    pub duration: Duration,
}

/// Results of a whole suite run, in input order
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub records: Vec<TestRecord>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_pass()).count()
    }

    /// Every non-passing test counts as failed
    pub fn failed(&self) -> usize {
        self.records.len() - self.passed()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| !r.outcome.is_pass())
            .map(|r| r.case.id.as_str())
            .collect()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}
