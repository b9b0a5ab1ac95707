//! Refinement run and per-iteration audit records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::diagnostic::DiagnosticClassification;
use super::interface::InterfaceDescriptor;
use super::verification::{Check, VerificationMode, VerificationReport};
use crate::generation::GenerationParams;

/// How the prompt for an iteration was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStrategy {
    /// First attempt: base rules plus few-shot examples.
    FewShot,
    /// Retry: base rules plus targeted fixes for the previous failure.
    TargetedFeedback,
}

/// Exact prompt sent to the generator, with the slot values that filled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub strategy: PromptStrategy,
    pub system: String,
    pub user: String,
    pub slots: BTreeMap<String, String>,
}

/// Outcome of a single iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IterationOutcome {
    Passed,
    VerificationFailed { failing_step: Check },
    GenerationFailed { reason: String },
}

/// Everything that happened in one generate/verify cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 0-based iteration index.
    pub iteration: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,

    /// Interface the prompt was built from.
    pub interface: InterfaceDescriptor,
    pub prompt: PromptRecord,

    /// Raw generator output, when the call returned.
    pub raw_completion: Option<String>,
    /// Sanitized harness text written for verification.
    pub artifact: Option<String>,
    /// sha256 of `artifact`.
    pub artifact_digest: Option<String>,
    /// Pre-verification lint findings on the harness.
    pub harness_issues: Vec<String>,

    pub verification: Option<VerificationReport>,
    /// Short human-readable summary of the verification outcome.
    pub analysis: String,
    /// Condensed diagnostics fed to the next prompt.
    pub error_summary: Option<String>,
    pub classifications: Vec<DiagnosticClassification>,
    /// Correction instructions for the next attempt.
    pub feedback: Option<String>,

    pub outcome: IterationOutcome,
}

/// Terminal state of a refinement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunOutcome {
    Success {
        iterations_used: u32,
    },
    GenerationFailed {
        iterations_used: u32,
        reason: String,
    },
    MaxIterationsExceeded {
        iterations_used: u32,
        failing_step: Option<Check>,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    pub fn iterations_used(&self) -> u32 {
        match self {
            RunOutcome::Success { iterations_used }
            | RunOutcome::GenerationFailed {
                iterations_used, ..
            }
            | RunOutcome::MaxIterationsExceeded {
                iterations_used, ..
            } => *iterations_used,
        }
    }

    /// One-line summary for terminals and logs.
    pub fn summary(&self) -> String {
        match self {
            RunOutcome::Success { iterations_used } => {
                format!("verification passed after {} iteration(s)", iterations_used)
            }
            RunOutcome::GenerationFailed {
                iterations_used,
                reason,
            } => format!(
                "generation failed on iteration {}: {}",
                iterations_used, reason
            ),
            RunOutcome::MaxIterationsExceeded {
                iterations_used,
                failing_step,
            } => match failing_step {
                Some(step) => format!(
                    "max iterations ({}) reached; last failure at {}",
                    iterations_used, step
                ),
                None => format!("max iterations ({}) reached", iterations_used),
            },
        }
    }
}

/// A complete refinement run: the unit persisted for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementRun {
    pub run_id: Uuid,
    pub intent: String,
    pub mode: VerificationMode,
    pub max_iterations: u32,
    pub params: GenerationParams,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub iterations: Vec<IterationRecord>,
    pub final_outcome: Option<RunOutcome>,
}

impl RefinementRun {
    pub fn start(
        intent: impl Into<String>,
        mode: VerificationMode,
        max_iterations: u32,
        params: GenerationParams,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            intent: intent.into(),
            mode,
            max_iterations,
            params,
            started_at: Utc::now(),
            completed_at: None,
            iterations: Vec::new(),
            final_outcome: None,
        }
    }

    /// Append an iteration. Records are never edited once pushed.
    pub fn record(&mut self, iteration: IterationRecord) {
        self.iterations.push(iteration);
    }

    /// Set the terminal outcome and completion time.
    pub fn finalize(mut self, outcome: RunOutcome) -> Self {
        self.final_outcome = Some(outcome);
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn is_finalized(&self) -> bool {
        self.final_outcome.is_some()
    }

    pub fn succeeded(&self) -> bool {
        self.final_outcome
            .as_ref()
            .map(RunOutcome::is_success)
            .unwrap_or(false)
    }

    pub fn last_iteration(&self) -> Option<&IterationRecord> {
        self.iterations.last()
    }
}
