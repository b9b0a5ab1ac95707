//! Ordered, fail-fast execution of a verification mode's checks.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;

use super::check::{plan_check, VerifierConfig};
use super::runner::{CheckExecutor, ProcessExecutor};
use crate::domain::{Check, VerificationMode, VerificationReport, VerificationStepResult};
use crate::obs;

/// Verification capability used by the refinement loop.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Where the DUT description is read from.
    fn dut_path(&self) -> PathBuf;

    /// Where the harness under test must be written before `verify`.
    fn harness_path(&self) -> PathBuf;

    /// Run the mode's checks in order, stopping at the first failure.
    async fn verify(&self, mode: VerificationMode) -> VerificationReport;
}

/// Runs Verilator checks against the configured layout.
pub struct VerificationDriver<E: CheckExecutor = ProcessExecutor> {
    config: VerifierConfig,
    executor: E,
}

impl VerificationDriver<ProcessExecutor> {
    pub fn new(config: VerifierConfig) -> Self {
        Self::with_executor(config, ProcessExecutor)
    }
}

impl<E: CheckExecutor> VerificationDriver<E> {
    pub fn with_executor(config: VerifierConfig, executor: E) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Input files the check needs, with the label used when one is missing.
    fn required_inputs(&self, check: Check) -> Vec<(&'static str, PathBuf)> {
        let dut = ("DUT file", self.config.dut_path());
        match check {
            Check::StructuralCompile | Check::Elaborate => vec![dut],
            Check::HarnessCompile | Check::Execute => {
                vec![dut, ("Testbench file", self.config.tb_path())]
            }
        }
    }

    /// Run a single check, including its precondition and log.
    pub async fn run_check(&self, check: Check) -> VerificationStepResult {
        for (label, path) in self.required_inputs(check) {
            if !path.exists() {
                let message = format!("{} not found: {}", label, path.display());
                tracing::warn!(check = %check, "{}", message);
                return VerificationStepResult::synthetic_failure(check, message);
            }
        }

        let start = Instant::now();
        let mut commands = Vec::new();
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_status = 0;

        for command in plan_check(check, &self.config) {
            commands.push(command.to_string());
            let output = self.executor.execute(&command, &self.config.root).await;
            stdout.push_str(&output.stdout);
            stderr.push_str(&output.stderr);
            exit_status = output.exit_status;
            if !output.success() {
                break;
            }
        }

        let mut result = VerificationStepResult {
            check,
            command: commands.join("\n"),
            exit_status,
            stdout,
            stderr,
            log_path: None,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let log_path = self.config.log_path(check);
        match write_check_log(&log_path, &result).await {
            Ok(()) => result.log_path = Some(log_path.display().to_string()),
            Err(e) => tracing::warn!(
                check = %check,
                path = %log_path.display(),
                error = %e,
                "failed to write check log"
            ),
        }

        obs::emit_verify_check(check.name(), result.exit_status, result.duration_ms);
        result
    }
}

#[async_trait]
impl<E: CheckExecutor> Verifier for VerificationDriver<E> {
    fn dut_path(&self) -> PathBuf {
        self.config.dut_path()
    }

    fn harness_path(&self) -> PathBuf {
        self.config.tb_path()
    }

    async fn verify(&self, mode: VerificationMode) -> VerificationReport {
        let mut report = VerificationReport::new(mode);

        for &check in mode.checks() {
            let result = self.run_check(check).await;
            let passed = result.passed();
            report.results.push(result);
            if !passed {
                break;
            }
        }

        report
    }
}

/// Persist the command, stdout and stderr of a check.
async fn write_check_log(path: &Path, result: &VerificationStepResult) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let commands: Vec<String> = result.command.lines().map(|c| format!("$ {}", c)).collect();
    let body = format!(
        "{}\n[exit status: {}]\n\n=== STDOUT ===\n{}\n\n=== STDERR ===\n{}\n",
        commands.join("\n"),
        result.exit_status,
        result.stdout,
        result.stderr
    );
    tokio::fs::write(path, body).await
}
