//! Output comparator
//!
//! Position-based. Line `i` of the actual output is compared with line `i`
//! of the expected output and nothing is realigned, so an inserted or
//! dropped line fails the test.

use serde::Serialize;

/// A line where actual and expected output differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    /// Zero-based line index
    pub line_index: usize,
    pub actual: String,
    pub expected: String,
}

/// Details of a failed comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    /// Every differing line within the common prefix, in order
    pub divergences: Vec<Divergence>,
    /// Whether the two outputs have different line counts
    pub length_mismatch: bool,
    pub actual_lines: usize,
    pub expected_lines: usize,
}

impl Mismatch {
    /// One-line human summary, used for CI messages
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(first) = self.divergences.first() {
            parts.push(format!(
                "{} differing line(s), first at line {}",
                self.divergences.len(),
                first.line_index + 1
            ));
        }
        if self.length_mismatch {
            parts.push(format!(
                "got {} line(s), expected {}",
                self.actual_lines, self.expected_lines
            ));
        }
        parts.join("; ")
    }
}

/// Result of comparing actual output with expected output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonVerdict {
    Pass,
    Fail(Mismatch),
}

impl ComparisonVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Compare actual output with expected output
///
/// Both texts have trailing whitespace trimmed once as a whole before being
/// split into lines.
pub fn compare(actual: &str, expected: &str) -> ComparisonVerdict {
    let actual_lines: Vec<&str> = actual.trim_end().lines().collect();
    let expected_lines: Vec<&str> = expected.trim_end().lines().collect();

    let divergences: Vec<Divergence> = actual_lines
        .iter()
        .zip(expected_lines.iter())
        .enumerate()
        .filter(|(_, (a, e))| a != e)
        .map(|(line_index, (a, e))| Divergence {
            line_index,
            actual: a.to_string(),
            expected: e.to_string(),
        })
        .collect();

    let length_mismatch = actual_lines.len() != expected_lines.len();

    if divergences.is_empty() && !length_mismatch {
        ComparisonVerdict::Pass
    } else {
        ComparisonVerdict::Fail(Mismatch {
            divergences,
            length_mismatch,
            actual_lines: actual_lines.len(),
            expected_lines: expected_lines.len(),
        })
    }
}
