//! Expectation loader
//!
//! Reads golden output files. A missing file is an ordinary outcome, so it
//! comes back as `Ok(None)` rather than an error.

use std::io;
use std::path::Path;

use crate::common::{Error, Result};

/// Extension of golden output files
pub const EXPECTATION_EXTENSION: &str = "expected";

/// Load the expected output at `path`
///
/// Returns `Ok(None)` if the file does not exist. Invalid UTF-8 is replaced
/// rather than rejected so a stray byte shows up as a line mismatch.
pub fn load(path: &Path) -> Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::file_read(path, &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpu.expected");
        std::fs::write(&path, "1\n2\n3\n").unwrap();

        assert_eq!(load(&path).unwrap().as_deref(), Some("1\n2\n3\n"));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.expected")).unwrap().is_none());
    }

    #[test]
    fn test_directory_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.expected");
        std::fs::write(&path, b"ok\n\xff\n").unwrap();

        let text = load(&path).unwrap().unwrap();
        assert!(text.starts_with("ok\n"));
        assert!(text.contains('\u{FFFD}'));
    }
}
