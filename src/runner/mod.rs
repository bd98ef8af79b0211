//! Command runner
//!
//! Spawns one process per call with no shell in between, captures its
//! output and enforces a wall-clock timeout. A process that outlives the
//! timeout is killed and reaped before `run` returns. On Unix the child leads
//! its own process group, and the whole group is killed once the run is over,
//! so nothing the emulator started outlives the call.

mod capture;

use std::ffi::OsStr;
use std::io;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::process::Command;

use capture::SharedBuffer;

/// Output prefix the emulator uses to report a harness-level failure
pub const SENTINEL_ERROR: &[u8] = b"TESTERROR";

/// Default drain window after the child exits or is killed
const DEFAULT_DRAIN: Duration = Duration::from_millis(500);

/// Which child streams make up the captured output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Capture stdout only; stderr passes through to the harness
    #[default]
    Stdout,
    /// Capture stdout and stderr into one buffer, in arrival order
    Combined,
}

/// Outcome of a single process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The process exited within the timeout
    Completed { output: Vec<u8> },
    /// The process was killed after the timeout; `partial` is what it wrote first
    TimedOut { partial: Vec<u8>, after: Duration },
    /// The process could not be run, or reported a run failure itself
    ProcessError { message: String, output: Vec<u8> },
}

impl ExecutionResult {
    /// Captured output, whatever the outcome
    pub fn output(&self) -> &[u8] {
        match self {
            Self::Completed { output } | Self::ProcessError { output, .. } => output,
            Self::TimedOut { partial, .. } => partial,
        }
    }
}

/// Runs processes with a fixed timeout and capture mode
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
    capture: CaptureMode,
    drain: Duration,
}

impl CommandRunner {
    /// Create a runner capturing stdout with the given timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            capture: CaptureMode::default(),
            drain: DEFAULT_DRAIN,
        }
    }

    /// Set which streams are captured
    pub fn with_capture(mut self, capture: CaptureMode) -> Self {
        self.capture = capture;
        self
    }

    /// Set how long pipes are drained after the child is gone
    pub fn with_drain(mut self, drain: Duration) -> Self {
        self.drain = drain;
        self
    }

    /// Configured timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `argv[0]` with the remaining elements as arguments
    pub async fn run<S: AsRef<OsStr>>(&self, argv: &[S]) -> ExecutionResult {
        let Some((program, args)) = argv.split_first() else {
            return ExecutionResult::ProcessError {
                message: "Empty command line".to_string(),
                output: Vec::new(),
            };
        };
        let program_os = program.as_ref();
        let program = program_os.to_string_lossy();

        let mut cmd = Command::new(program_os);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(match self.capture {
                CaptureMode::Stdout => Stdio::inherit(),
                CaptureMode::Combined => Stdio::piped(),
            })
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!(program = %program, error = %e, "Failed to spawn process");
                return ExecutionResult::ProcessError {
                    message: launch_error_message(&program, &e),
                    output: Vec::new(),
                };
            }
        };

        let pid = child.id();
        tracing::debug!(
            program = %program,
            pid = pid,
            timeout_ms = self.timeout.as_millis() as u64,
            "Spawned process"
        );

        let buffer = SharedBuffer::default();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(buffer.spawn_reader(stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(buffer.spawn_reader(stderr));
        }

        let started = Instant::now();
        let waited = tokio::select! {
            status = child.wait() => Some(status),
            () = tokio::time::sleep(self.timeout) => None,
        };

        match waited {
            Some(Ok(status)) => {
                tracing::debug!(status = %status, elapsed_ms = started.elapsed().as_millis() as u64, "Process exited");
                // Background processes left behind by the emulator
                kill_process_group(pid);
                capture::drain(readers, self.drain).await;
                let output = buffer.take();
                if starts_with_sentinel(&output) {
                    ExecutionResult::ProcessError {
                        message: format!("'{}' reported a run failure", program),
                        output,
                    }
                } else {
                    ExecutionResult::Completed { output }
                }
            }
            Some(Err(e)) => {
                kill_process_group(pid);
                let _ = child.kill().await;
                capture::drain(readers, self.drain).await;
                ExecutionResult::ProcessError {
                    message: format!("Failed to wait for '{}': {}", program, e),
                    output: buffer.take(),
                }
            }
            None => {
                tracing::warn!(
                    program = %program,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Process timed out, killing"
                );
                kill_process_group(pid);
                // kill() also waits, so the child is reaped here
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "Failed to kill timed-out process");
                }
                capture::drain(readers, self.drain).await;
                ExecutionResult::TimedOut {
                    partial: buffer.take(),
                    after: started.elapsed(),
                }
            }
        }
    }
}

/// Run `argv` once with the default capture settings
pub async fn run<S: AsRef<OsStr>>(argv: &[S], timeout: Duration) -> ExecutionResult {
    CommandRunner::new(timeout).run(argv).await
}

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    // SAFETY: killpg only sends a signal; the group was created for this child
    let result = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if result != 0 {
        let error = io::Error::last_os_error();
        if error.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pgid = pgid, error = %error, "Failed to kill process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn starts_with_sentinel(output: &[u8]) -> bool {
    output.trim_ascii_start().starts_with(SENTINEL_ERROR)
}

fn launch_error_message(program: &str, error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::NotFound => format!("Executable '{}' not found", program),
        io::ErrorKind::PermissionDenied => format!("'{}' is not executable", program),
        _ => format!("Failed to launch '{}': {}", program, error),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let result = run(&sh("printf 'a\\nb\\n'"), Duration::from_secs(5)).await;
        assert_eq!(
            result,
            ExecutionResult::Completed {
                output: b"a\nb\n".to_vec()
            }
        );
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        let result = run(&sh("cat"), Duration::from_secs(5)).await;
        assert!(matches!(result, ExecutionResult::Completed { ref output } if output.is_empty()));
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_interpreted() {
        let argv = vec!["echo".to_string(), "$HOME; rm -rf /".to_string()];
        let result = run(&argv, Duration::from_secs(5)).await;
        assert_eq!(result.output(), b"$HOME; rm -rf /\n");
    }

    #[tokio::test]
    async fn test_stdout_mode_leaves_stderr_out() {
        let result = run(&sh("echo out; echo err >&2"), Duration::from_secs(5)).await;
        assert_eq!(result.output(), b"out\n");
    }

    #[tokio::test]
    async fn test_combined_mode_captures_both_streams() {
        let runner = CommandRunner::new(Duration::from_secs(5)).with_capture(CaptureMode::Combined);
        let result = runner.run(&sh("echo out; echo err >&2")).await;
        let text = String::from_utf8_lossy(result.output()).into_owned();
        assert!(matches!(result, ExecutionResult::Completed { .. }));
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
    }

    #[tokio::test]
    async fn test_missing_executable_is_process_error() {
        let argv = vec!["/nonexistent/emulator-binary".to_string()];
        match run(&argv, Duration::from_secs(5)).await {
            ExecutionResult::ProcessError { message, .. } => {
                assert!(message.contains("not found"), "unexpected message: {message}");
            }
            other => panic!("Expected ProcessError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_argv_is_process_error() {
        let result = run::<String>(&[], Duration::from_secs(5)).await;
        assert!(matches!(result, ExecutionResult::ProcessError { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_process_and_keeps_partial_output() {
        let started = Instant::now();
        let result = run(&sh("echo started; exec sleep 30"), Duration::from_millis(300)).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        match result {
            ExecutionResult::TimedOut { partial, after } => {
                assert_eq!(partial, b"started\n");
                assert!(after >= Duration::from_millis(300));
            }
            other => panic!("Expected TimedOut, got {other:?}"),
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timed_out_process_is_reaped() {
        let result = run(&sh("echo $$; exec sleep 30"), Duration::from_millis(300)).await;
        let pid = String::from_utf8_lossy(result.output()).trim().to_string();

        assert!(matches!(result, ExecutionResult::TimedOut { .. }));
        assert!(!pid.is_empty());
        assert!(!std::path::Path::new(&format!("/proc/{pid}")).exists());
    }

    /// Whether `pid` is a live (non-zombie) process
    #[cfg(target_os = "linux")]
    fn is_running(pid: &str) -> bool {
        let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
            return false;
        };
        // State is the first field after the parenthesised command name
        let state = stat.rsplit_once(')').and_then(|(_, rest)| rest.trim_start().chars().next());
        !matches!(state, Some('Z') | Some('X'))
    }

    /// Killed orphans are reparented before they disappear
    #[cfg(target_os = "linux")]
    async fn still_running_after_grace(pid: &str) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while is_running(pid) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        is_running(pid)
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_background_children() {
        let result = run(&sh("sleep 31 & echo $!; wait"), Duration::from_millis(300)).await;
        let pid = String::from_utf8_lossy(result.output()).trim().to_string();

        assert!(matches!(result, ExecutionResult::TimedOut { .. }));
        assert!(!pid.is_empty());
        assert!(!still_running_after_grace(&pid).await, "background child {pid} still running");
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_completed_run_kills_leftover_children() {
        let result = run(&sh("sleep 31 >/dev/null & echo $!"), Duration::from_secs(5)).await;
        let pid = String::from_utf8_lossy(result.output()).trim().to_string();

        assert!(matches!(result, ExecutionResult::Completed { .. }));
        assert!(!still_running_after_grace(&pid).await, "leftover child {pid} still running");
    }

    #[tokio::test]
    async fn test_sentinel_output_is_process_error() {
        let result = run(&sh("echo 'TESTERROR: could not load module'"), Duration::from_secs(5)).await;
        match result {
            ExecutionResult::ProcessError { output, .. } => {
                assert!(output.starts_with(b"TESTERROR"));
            }
            other => panic!("Expected ProcessError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sentinel_after_leading_whitespace() {
        let result = run(&sh("printf '\\n  TESTERROR\\n'"), Duration::from_secs(5)).await;
        assert!(matches!(result, ExecutionResult::ProcessError { .. }));
    }

    #[tokio::test]
    async fn test_sentinel_only_counts_as_prefix() {
        let result = run(&sh("echo 'saw TESTERROR later'"), Duration::from_secs(5)).await;
        assert!(matches!(result, ExecutionResult::Completed { .. }));
    }

    #[tokio::test]
    async fn test_exit_code_is_ignored() {
        let result = run(&sh("echo done; exit 3"), Duration::from_secs(5)).await;
        assert_eq!(
            result,
            ExecutionResult::Completed {
                output: b"done\n".to_vec()
            }
        );
    }
}
