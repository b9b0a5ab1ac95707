//! Verification checks, modes and per-check results.

use serde::{Deserialize, Serialize};

use super::error::RtlAgentError;

/// One external verification invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// Lint the DUT on its own.
    StructuralCompile,
    /// Elaborate the DUT.
    Elaborate,
    /// Lint the harness together with the DUT.
    HarnessCompile,
    /// Build and run the simulation.
    Execute,
}

impl Check {
    /// Stable check name, also used as the log file stem.
    pub fn name(&self) -> &'static str {
        match self {
            Check::StructuralCompile => "compile_dut",
            Check::Elaborate => "elaborate_dut",
            Check::HarnessCompile => "compile_tb",
            Check::Execute => "run_simulation",
        }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Thoroughness of a verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    CompileOnly,
    #[default]
    CompileElaborate,
    Full,
}

impl VerificationMode {
    /// Checks run by this mode, in execution order.
    pub fn checks(&self) -> &'static [Check] {
        match self {
            VerificationMode::CompileOnly => &[Check::StructuralCompile, Check::HarnessCompile],
            VerificationMode::CompileElaborate => &[
                Check::StructuralCompile,
                Check::Elaborate,
                Check::HarnessCompile,
            ],
            VerificationMode::Full => &[
                Check::StructuralCompile,
                Check::Elaborate,
                Check::HarnessCompile,
                Check::Execute,
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMode::CompileOnly => "compile_only",
            VerificationMode::CompileElaborate => "compile_elaborate",
            VerificationMode::Full => "full",
        }
    }
}

impl std::fmt::Display for VerificationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationMode {
    type Err = RtlAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "compile_only" | "compile" => Ok(VerificationMode::CompileOnly),
            "compile_elaborate" | "elaborate" => Ok(VerificationMode::CompileElaborate),
            "full" | "full_sim" => Ok(VerificationMode::Full),
            other => Err(RtlAgentError::InvalidMode(other.to_string())),
        }
    }
}

/// Result of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationStepResult {
    pub check: Check,

    /// Command line(s) as run, or empty for a synthetic failure.
    pub command: String,

    /// Exit status (0 = pass). -1 when the process could not be spawned.
    pub exit_status: i32,

    pub stdout: String,

    pub stderr: String,

    /// Where the per-check log was written, if it was.
    pub log_path: Option<String>,

    pub duration_ms: u64,
}

impl VerificationStepResult {
    /// Failure produced without invoking the tool (e.g. a missing input file).
    pub fn synthetic_failure(check: Check, message: impl Into<String>) -> Self {
        Self {
            check,
            command: String::new(),
            exit_status: 1,
            stdout: String::new(),
            stderr: message.into(),
            log_path: None,
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_status == 0
    }
}

/// Outcome of running one mode's checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub mode: VerificationMode,

    /// Results of every check that ran, in order. Ends at the first failure.
    pub results: Vec<VerificationStepResult>,
}

impl VerificationReport {
    pub fn new(mode: VerificationMode) -> Self {
        Self {
            mode,
            results: Vec::new(),
        }
    }

    /// True when every check of the mode ran and passed.
    pub fn passed(&self) -> bool {
        self.results.len() == self.mode.checks().len() && self.results.iter().all(|r| r.passed())
    }

    /// The check that stopped the sequence, if any.
    pub fn failing_step(&self) -> Option<&VerificationStepResult> {
        self.results.iter().find(|r| !r.passed())
    }

    pub fn result_for(&self, check: Check) -> Option<&VerificationStepResult> {
        self.results.iter().find(|r| r.check == check)
    }
}
