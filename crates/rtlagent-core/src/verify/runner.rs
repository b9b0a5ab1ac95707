//! External process execution for verification checks.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::check::CommandSpec;

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code (0 = success). -1 when spawning failed or no code exists.
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn spawn_failure(command: &CommandSpec, error: &dyn std::fmt::Display) -> Self {
        Self {
            exit_status: -1,
            stdout: String::new(),
            stderr: format!("failed to run {}: {}", command.program, error),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Runs one command to completion.
///
/// Never fails: problems starting the command are reported as a non-zero
/// [`ProcessOutput`] so they flow into diagnostics like any other failure.
#[async_trait]
pub trait CheckExecutor: Send + Sync {
    async fn execute(&self, command: &CommandSpec, cwd: &Path) -> ProcessOutput;
}

/// Executor backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

#[async_trait]
impl CheckExecutor for ProcessExecutor {
    async fn execute(&self, command: &CommandSpec, cwd: &Path) -> ProcessOutput {
        tracing::debug!(command = %command, cwd = %cwd.display(), "spawning check command");

        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => return ProcessOutput::spawn_failure(command, &e),
        };

        // Drains both pipes before reaping the child.
        match child.wait_with_output().await {
            Ok(output) => ProcessOutput {
                exit_status: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            },
            Err(e) => ProcessOutput::spawn_failure(command, &e),
        }
    }
}
