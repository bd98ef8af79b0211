//! Test case resolution

use std::path::{Path, PathBuf};

use crate::expectation::EXPECTATION_EXTENSION;

/// One test to run, with its files resolved against the test root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Path-like identifier, e.g. `cpu/cpu/cpu`
    pub id: String,
    /// First candidate artifact that exists, if any
    pub artifact: Option<PathBuf>,
    /// Every artifact path that was tried, in order
    pub candidates: Vec<PathBuf>,
    /// Where the golden output should be
    pub expectation: PathBuf,
}

impl TestCase {
    /// Resolve `id` under `root`, trying each artifact extension in order
    pub fn resolve(root: &Path, id: &str, extensions: &[String]) -> Self {
        let candidates: Vec<PathBuf> = extensions
            .iter()
            .map(|ext| with_extension(root, id, ext))
            .collect();
        let artifact = candidates.iter().find(|path| path.is_file()).cloned();

        Self {
            id: id.to_string(),
            artifact,
            candidates,
            expectation: with_extension(root, id, EXPECTATION_EXTENSION),
        }
    }
}

/// `<root>/<id>.<ext>`, appending rather than replacing any dot in the id
fn with_extension(root: &Path, id: &str, ext: &str) -> PathBuf {
    root.join(format!("{}.{}", id, ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["prx".to_string(), "elf".to_string()]
    }

    #[test]
    fn test_first_existing_extension_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cpu/cpu")).unwrap();
        std::fs::write(dir.path().join("cpu/cpu/cpu.elf"), "").unwrap();
        std::fs::write(dir.path().join("cpu/cpu/cpu.prx"), "").unwrap();

        let case = TestCase::resolve(dir.path(), "cpu/cpu/cpu", &exts());
        assert_eq!(case.artifact, Some(dir.path().join("cpu/cpu/cpu.prx")));
        assert_eq!(case.expectation, dir.path().join("cpu/cpu/cpu.expected"));
    }

    #[test]
    fn test_falls_back_to_second_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rtc.elf"), "").unwrap();

        let case = TestCase::resolve(dir.path(), "rtc", &exts());
        assert_eq!(case.artifact, Some(dir.path().join("rtc.elf")));
    }

    #[test]
    fn test_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let case = TestCase::resolve(dir.path(), "video/pmf", &exts());
        assert!(case.artifact.is_none());
        assert_eq!(
            case.candidates,
            vec![dir.path().join("video/pmf.prx"), dir.path().join("video/pmf.elf")]
        );
    }

    #[test]
    fn test_dotted_id_keeps_its_dot() {
        let root = Path::new("/tests");
        assert_eq!(
            with_extension(root, "gpu/v1.2", "prx"),
            PathBuf::from("/tests/gpu/v1.2.prx")
        );
    }
}
