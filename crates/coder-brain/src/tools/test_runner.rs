//! Runs a project's test command and captures the outcome.

use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use tracing::{debug, info};

/// Outcome of one test command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub command: Vec<String>,
    /// `-1` when the process could not be spawned or was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    pub fn ok(&self) -> bool {
        self.exit_code == 0
    }

    pub fn format(&self) -> String {
        let status = if self.ok() { "PASSED" } else { "FAILED" };
        format!(
            "Command {} {status}\nstdout:\n{}\nstderr:\n{}",
            self.command.join(" "),
            self.stdout,
            self.stderr
        )
    }
}

/// Executes an argument vector. No timeout is applied.
pub trait TestRunner {
    fn run(&self, command: &[String]) -> RunResult;
}

/// Spawns the command directly (no shell).
#[derive(Debug, Clone, Default)]
pub struct ProcessTestRunner {
    workdir: Option<PathBuf>,
}

impl ProcessTestRunner {
    /// Run in the current process directory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(workdir.into()),
        }
    }
}

impl TestRunner for ProcessTestRunner {
    fn run(&self, command: &[String]) -> RunResult {
        let failed = |stderr: String| RunResult {
            command: command.to_vec(),
            exit_code: -1,
            stdout: String::new(),
            stderr,
        };

        let Some((program, args)) = command.split_first() else {
            return failed("empty test command".to_string());
        };

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                info!("Test command {program} could not start: {e}");
                return failed(format!("failed to run {program}: {e}"));
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(
            "Test command `{}` exited {exit_code} in {:.1}s",
            command.join(" "),
            start.elapsed().as_secs_f64()
        );
        RunResult {
            command: command.to_vec(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}
