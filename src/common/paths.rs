//! Configuration and executable lookup paths

use std::path::{Path, PathBuf};

/// Name used for the config directory and local config file
const APP_NAME: &str = "emutest";

/// Config file looked up in the working directory before the platform dir
pub const LOCAL_CONFIG_FILE: &str = "emutest.toml";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/emutest/`
/// - macOS: `~/Library/Application Support/emutest/`
/// - Windows: `%APPDATA%\emutest\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user-level configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Locate the emulator executable among the configured candidates
///
/// Candidates containing a path separator are checked as filesystem paths.
/// Bare names are looked up on `PATH`. The first hit wins.
pub fn find_executable<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.as_ref();
        if is_bare_name(candidate) {
            which::which(candidate).ok()
        } else if candidate.is_file() {
            Some(candidate.to_path_buf())
        } else {
            None
        }
    })
}

fn is_bare_name(path: &Path) -> bool {
    path.components().count() == 1 && !path.is_absolute()
}
