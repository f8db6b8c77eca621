//! External command invocation.
//!
//! Both NVIDIA tools are driven as subprocesses. [`CommandRunner`] is the seam
//! that lets the drivers be exercised without the tools installed.

use async_trait::async_trait;
use log::{debug, error};
use tokio::process::Command;

use crate::error::{ControlError, Result};

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Logs the failure and every non-empty stderr line at error level.
    pub fn report_failure(&self, command: &str) {
        error!("Unable to run cmd: {command}");
        for line in self.stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
            error!("Caught process stderr: {line}");
        }
    }
}

/// Runs a program to completion and captures its output.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Spawns `program` with `args` and waits for it to exit.
    ///
    /// A non-zero exit is not an error here; only failing to start is.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let command = command_line(program, args);
        debug!("Running cmd: {command}");

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ControlError::Spawn { command, source })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Human-readable command line for logs and errors.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_line_joins_program_and_args() {
        assert_eq!(
            command_line("nvidia-settings", &args(&["--assign", "GPUFanControlState=0"])),
            "nvidia-settings --assign GPUFanControlState=0"
        );
        assert_eq!(command_line("nvidia-smi", &[]), "nvidia-smi");
    }

    #[test]
    fn output_helpers() {
        assert!(CommandOutput::ok("0, 40, 30 %, 0 %").success());
        let failed = CommandOutput::failed(6, "No devices were found");
        assert!(!failed.success());
        assert_eq!(failed.status, Some(6));
        assert!(!CommandOutput::default().success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_captures_stdout() {
        let output = SystemRunner
            .run("sh", &args(&["-c", "echo '0, 41, 30 %, 2 %'"]))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "0, 41, 30 %, 2 %");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_reports_non_zero_exit_with_stderr() {
        let output = SystemRunner
            .run("sh", &args(&["-c", "echo 'display not found' >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(output.status, Some(3));
        assert_eq!(output.stderr.trim(), "display not found");
    }

    #[tokio::test]
    async fn system_runner_fails_to_spawn_missing_program() {
        let err = SystemRunner
            .run("gpufand-no-such-tool", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ControlError::Spawn { .. }));
        assert!(err.to_string().contains("gpufand-no-such-tool"));
    }
}
