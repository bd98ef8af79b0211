//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::{self, config_path, LOCAL_CONFIG_FILE};
use super::{Error, Result};
use crate::report::ReportFormat;
use crate::runner::CaptureMode;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Where the emulator and the test fixtures live
    #[serde(default)]
    pub paths: PathsConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Output capture settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Curated test lists
    #[serde(default)]
    pub suites: Suites,
}

/// Filesystem layout of the emulator build and test tree
#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    /// Root of the test tree; ids resolve to `<test_root>/<id>.<ext>`
    #[serde(default = "default_test_root")]
    pub test_root: PathBuf,

    /// Emulator executables to try, first existing wins
    #[serde(default = "default_emulators")]
    pub emulators: Vec<PathBuf>,

    /// Artifact extensions to try, in order
    #[serde(default = "default_artifact_extensions")]
    pub artifact_extensions: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            test_root: default_test_root(),
            emulators: default_emulators(),
            artifact_extensions: default_artifact_extensions(),
        }
    }
}

fn default_test_root() -> PathBuf {
    PathBuf::from("pspautotests/tests")
}

fn default_emulators() -> Vec<PathBuf> {
    vec![
        PathBuf::from("Windows/Release/PPSSPPHeadless.exe"),
        PathBuf::from("SDL/build/ppsspp-headless"),
    ]
}

fn default_artifact_extensions() -> Vec<String> {
    vec!["prx".to_string(), "elf".to_string()]
}

/// Timeout settings
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Wall-clock limit for a single test run
    #[serde(default = "default_test_secs")]
    pub test_secs: u64,

    /// How long to keep draining pipes after the emulator exits or is killed
    #[serde(default = "default_capture_drain")]
    pub capture_drain_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            test_secs: default_test_secs(),
            capture_drain_ms: default_capture_drain(),
        }
    }
}

fn default_test_secs() -> u64 {
    5
}
fn default_capture_drain() -> u64 {
    500
}

/// Output capture configuration
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Which streams make up the compared output
    #[serde(default)]
    pub capture: CaptureMode,
}

/// Built-in test lists
#[derive(Debug, Deserialize)]
pub struct Suites {
    /// Regression tests that must keep passing
    #[serde(default = "default_good")]
    pub good: Vec<String>,

    /// Tests next up for fixing
    #[serde(default = "default_next")]
    pub next: Vec<String>,

    /// Tests that are never selected by `--suite`
    #[serde(default = "default_ignored")]
    pub ignored: Vec<String>,
}

impl Default for Suites {
    fn default() -> Self {
        Self {
            good: default_good(),
            next: default_next(),
            ignored: default_ignored(),
        }
    }
}

fn to_owned_list(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

fn default_good() -> Vec<String> {
    to_owned_list(&[
        "cpu/cpu/cpu",
        "cpu/icache/icache",
        "cpu/lsu/lsu",
        "cpu/fpu/fpu",
        "display/display",
        "dmac/dmactest",
        "intr/intr",
        "intr/vblank/vblank",
        "misc/testgp",
        "string/string",
        "gpu/callbacks/ge_callbacks",
        "threads/mbx/mbx",
        "rtc/rtc",
    ])
}

fn default_next() -> Vec<String> {
    to_owned_list(&[
        "cpu/vfpu/vfpu",
        "ctrl/ctrl",
        "gpu/simple/simple",
        "gpu/triangle/triangle",
        "hle/check_not_used_uids",
        "font/fonttest",
        "io/cwd/cwd",
        "io/directory/directory",
        "io/io/io",
        "io/iodrv/iodrv",
        "malloc/malloc",
        "mstick/mstick",
        "modules/loadexec/loader",
        "power/power",
        "sysmem/sysmem",
        "threads/events/events",
        "threads/fpl/fpl",
        "threads/msgpipe/msgpipe",
        "threads/mutex/mutex",
        "threads/scheduling/scheduling",
        "threads/semaphores/semaphores",
        "threads/threads/threads",
        "threads/vpl/vpl",
        "threads/vtimers/vtimers",
        "threads/wakeup/wakeup",
        "umd/callbacks/umd",
        "umd/io/umd_io",
        "umd/raw_access/raw_acess",
        "utility/systemparam",
        "video/pmf",
        "video/pmf_simple",
    ])
}

fn default_ignored() -> Vec<String> {
    to_owned_list(&["kirk/kirk", "me/me", "umd/umd"])
}

/// Which built-in list to run when no test ids are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SuiteSelection {
    #[default]
    Good,
    Next,
    All,
}

impl Suites {
    /// Test ids for a built-in selection, with ignored ids filtered out
    pub fn select(&self, selection: SuiteSelection) -> Vec<String> {
        let chosen: Vec<&String> = match selection {
            SuiteSelection::Good => self.good.iter().collect(),
            SuiteSelection::Next => self.next.iter().collect(),
            SuiteSelection::All => self.good.iter().chain(self.next.iter()).collect(),
        };
        chosen
            .into_iter()
            .filter(|id| !self.ignored.contains(id))
            .cloned()
            .collect()
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise `./emutest.toml` and then the
    /// platform config file are tried. Returns defaults if neither exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            return Self::load_from(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Parse a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }
}

/// Command-line overrides applied on top of the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub emulator: Option<PathBuf>,
    pub test_root: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub verbose: bool,
    pub format: ReportFormat,
}

/// Everything a suite run needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Located emulator executable
    pub emulator: PathBuf,
    /// Root of the test tree
    pub test_root: PathBuf,
    /// Artifact extensions to try, in order
    pub artifact_extensions: Vec<String>,
    /// Per-test timeout
    pub timeout: Duration,
    /// Pipe drain window after exit or kill
    pub capture_drain: Duration,
    /// Which streams are compared
    pub capture: CaptureMode,
    /// Dump full output on failure
    pub verbose: bool,
    /// Report renderer
    pub format: ReportFormat,
}

impl RunContext {
    /// Resolve the run context, checking prerequisites
    ///
    /// Fails if the test root does not exist or no emulator can be found.
    pub fn resolve(config: &Config, overrides: Overrides) -> Result<Self> {
        let test_root = overrides
            .test_root
            .unwrap_or_else(|| config.paths.test_root.clone());
        if !test_root.is_dir() {
            return Err(Error::prerequisite_missing(
                format!("Test root '{}'", test_root.display()),
                "Check out and build the test suite, or pass --root.",
            ));
        }

        let emulator = match overrides.emulator {
            Some(explicit) => paths::find_executable(&[explicit.clone()]).ok_or_else(|| {
                Error::prerequisite_missing(
                    format!("Emulator executable '{}'", explicit.display()),
                    "Check the --emulator path.",
                )
            })?,
            None => paths::find_executable(&config.paths.emulators).ok_or_else(|| {
                let searched: Vec<String> = config
                    .paths
                    .emulators
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                Error::prerequisite_missing(
                    "Emulator executable",
                    format!(
                        "Please build one. Searched: {}",
                        searched.join(", ")
                    ),
                )
            })?,
        };

        if config.paths.artifact_extensions.is_empty() {
            return Err(Error::Config(
                "paths.artifact_extensions must list at least one extension".to_string(),
            ));
        }

        let timeout_secs = overrides.timeout_secs.unwrap_or(config.timeouts.test_secs);
        if timeout_secs == 0 {
            return Err(Error::Config(
                "Test timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(Self {
            emulator,
            test_root,
            artifact_extensions: config.paths.artifact_extensions.clone(),
            timeout: Duration::from_secs(timeout_secs),
            capture_drain: Duration::from_millis(config.timeouts.capture_drain_ms),
            capture: config.output.capture,
            verbose: overrides.verbose,
            format: overrides.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeouts.test_secs, 5);
        assert_eq!(config.paths.artifact_extensions, vec!["prx", "elf"]);
        assert_eq!(config.output.capture, CaptureMode::Stdout);
        assert_eq!(config.suites.good.len(), 13);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [timeouts]
            test_secs = 30

            [output]
            capture = "combined"
            "#,
        )
        .unwrap();
        assert_eq!(config.timeouts.test_secs, 30);
        assert_eq!(config.timeouts.capture_drain_ms, 500);
        assert_eq!(config.output.capture, CaptureMode::Combined);
        assert_eq!(config.paths.test_root, PathBuf::from("pspautotests/tests"));
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "timeouts = 3").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_suite_selection_filters_ignored() {
        let suites = Suites {
            good: vec!["a".into(), "b".into()],
            next: vec!["c".into(), "b".into()],
            ignored: vec!["b".into()],
        };
        assert_eq!(suites.select(SuiteSelection::Good), vec!["a"]);
        assert_eq!(suites.select(SuiteSelection::Next), vec!["c"]);
        assert_eq!(suites.select(SuiteSelection::All), vec!["a", "c"]);
    }

    #[test]
    fn test_resolve_requires_test_root() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            test_root: Some(dir.path().join("missing")),
            ..Default::default()
        };
        let err = RunContext::resolve(&Config::default(), overrides).unwrap_err();
        assert!(matches!(err, Error::PrerequisiteMissing { .. }));
    }

    #[test]
    fn test_resolve_requires_emulator() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            test_root: Some(dir.path().to_path_buf()),
            emulator: Some(dir.path().join("no-such-emulator")),
            ..Default::default()
        };
        let err = RunContext::resolve(&Config::default(), overrides).unwrap_err();
        assert!(err.to_string().contains("no-such-emulator"));
    }

    #[test]
    fn test_resolve_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let emulator = dir.path().join("emu");
        std::fs::write(&emulator, "").unwrap();
        let mut config = Config::default();
        config.timeouts.test_secs = 0;
        let overrides = Overrides {
            test_root: Some(dir.path().to_path_buf()),
            emulator: Some(emulator),
            ..Default::default()
        };
        let err = RunContext::resolve(&config, overrides).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_resolve_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let emulator = dir.path().join("emu");
        std::fs::write(&emulator, "").unwrap();
        let overrides = Overrides {
            test_root: Some(dir.path().to_path_buf()),
            emulator: Some(emulator.clone()),
            timeout_secs: Some(12),
            verbose: true,
            format: ReportFormat::Json,
        };
        let ctx = RunContext::resolve(&Config::default(), overrides).unwrap();
        assert_eq!(ctx.emulator, emulator);
        assert_eq!(ctx.timeout, Duration::from_secs(12));
        assert_eq!(ctx.capture_drain, Duration::from_millis(500));
        assert!(ctx.verbose);
        assert_eq!(ctx.format, ReportFormat::Json);
    }
}
