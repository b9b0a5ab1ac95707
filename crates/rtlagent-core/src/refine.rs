//! The generate → verify → diagnose → retry loop.
//!
//! One [`RefinementLoop::run`] call produces one finalized
//! [`RefinementRun`]. Iterations run strictly in sequence; the loop ends on
//! the first passing verification, on a generation failure, or when the
//! iteration budget is spent.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::Instrument;

use crate::codegen::validate_harness;
use crate::diagnostics::{analyze_report, classify_diagnostics, extract_error_summary};
use crate::domain::{
    Check, InterfaceDescriptor, IterationOutcome, IterationRecord, PromptRecord, RefinementRun,
    Result, RunOutcome, VerificationMode,
};
use crate::extract::extract_interface_from_path;
use crate::feedback::synthesize_feedback;
use crate::generation::{GenerationParams, GenerationRequest, Generator};
use crate::obs;
use crate::prompts::{build_first_prompt, build_refined_prompt, ExampleSelection};
use crate::sanitize::sanitize_artifact;
use crate::verify::Verifier;

pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Loop settings fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementConfig {
    pub mode: VerificationMode,
    pub max_iterations: u32,
    pub params: GenerationParams,
    /// Few-shot examples for the first attempt.
    #[serde(default)]
    pub examples: ExampleSelection,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            mode: VerificationMode::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            params: GenerationParams::default(),
            examples: ExampleSelection::default(),
        }
    }
}

/// Diagnosis carried from a failed iteration into the next prompt.
#[derive(Debug, Clone)]
struct PendingFeedback {
    failing_step: Check,
    error_summary: String,
    fixes: String,
}

/// Drives one generator and one verifier through a bounded refinement run.
pub struct RefinementLoop<G, V> {
    generator: G,
    verifier: V,
    config: RefinementConfig,
}

impl<G: Generator, V: Verifier> RefinementLoop<G, V> {
    pub fn new(generator: G, verifier: V, config: RefinementConfig) -> Self {
        Self {
            generator,
            verifier,
            config,
        }
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Run the loop for a natural-language test intent.
    ///
    /// Every failure (model, sanitizer, harness write, verifier) ends up in
    /// the returned run, so the caller can always persist it.
    pub async fn run(&self, intent: &str) -> RefinementRun {
        let run = RefinementRun::start(
            intent,
            self.config.mode,
            self.config.max_iterations,
            self.config.params.clone(),
        );
        let span = obs::run_span(&run.run_id.to_string());
        self.drive(run, intent).instrument(span).await
    }

    async fn drive(&self, mut run: RefinementRun, intent: &str) -> RefinementRun {
        let run_id = run.run_id.to_string();
        let mut pending: Option<PendingFeedback> = None;
        let mut last_failing: Option<Check> = None;

        for iteration in 0..self.config.max_iterations {
            // Re-read every iteration so edits to the DUT between attempts count.
            let iface = extract_interface_from_path(&self.verifier.dut_path());
            if iteration == 0 {
                obs::emit_refine_started(
                    &run_id,
                    &iface.name,
                    self.config.mode.as_str(),
                    self.config.max_iterations,
                );
            }

            let prompt = match &pending {
                None => build_first_prompt(&iface, intent, self.config.examples),
                Some(p) => build_refined_prompt(
                    &iface,
                    intent,
                    p.failing_step,
                    &p.error_summary,
                    &p.fixes,
                ),
            };
            let mut record = new_record(iteration, iface, prompt);

            let request = GenerationRequest::new(
                record.prompt.system.clone(),
                record.prompt.user.clone(),
                self.config.params.clone(),
            );

            let raw = match self.generator.complete(&request).await {
                Ok(raw) => raw,
                Err(e) => {
                    obs::emit_generation_error(&run_id, iteration, &e);
                    return self.abort(run, record, e.to_string());
                }
            };
            record.raw_completion = Some(raw.clone());

            let artifact = match sanitize_artifact(&raw) {
                Ok(artifact) => artifact,
                Err(e) => {
                    obs::emit_generation_error(&run_id, iteration, &e);
                    return self.abort(run, record, e.to_string());
                }
            };

            record.harness_issues = validate_harness(&artifact, &record.interface);
            for issue in &record.harness_issues {
                tracing::warn!(iteration, issue = %issue, "harness pre-check");
            }
            record.artifact_digest = Some(hex::encode(Sha256::digest(artifact.as_bytes())));
            let written = self.write_harness(&artifact).await;
            record.artifact = Some(artifact);
            if let Err(e) = written {
                let reason = format!(
                    "failed to write harness {}: {}",
                    self.verifier.harness_path().display(),
                    e
                );
                obs::emit_generation_error(&run_id, iteration, &reason);
                return self.abort(run, record, reason);
            }

            let report = self.verifier.verify(self.config.mode).await;
            record.analysis = analyze_report(&report);

            if report.passed() {
                record.verification = Some(report);
                record.outcome = IterationOutcome::Passed;
                record.completed_at = Utc::now();
                obs::emit_refine_iteration(&run_id, iteration, "passed", None);
                run.record(record);
                return finish(
                    run,
                    RunOutcome::Success {
                        iterations_used: iteration + 1,
                    },
                );
            }

            let (failing_step, stderr) = match report.failing_step() {
                Some(step) => (step.check, step.stderr.clone()),
                None => (
                    report
                        .results
                        .last()
                        .map(|r| r.check)
                        .unwrap_or(Check::StructuralCompile),
                    String::new(),
                ),
            };

            let error_summary = extract_error_summary(&stderr);
            let classifications = classify_diagnostics(&stderr);
            let fixes = synthesize_feedback(&classifications, &record.interface);

            record.verification = Some(report);
            record.error_summary = Some(error_summary.clone());
            record.classifications = classifications;
            record.feedback = Some(fixes.clone());
            record.outcome = IterationOutcome::VerificationFailed { failing_step };
            record.completed_at = Utc::now();
            obs::emit_refine_iteration(
                &run_id,
                iteration,
                "verification_failed",
                Some(failing_step.name()),
            );
            run.record(record);

            last_failing = Some(failing_step);
            pending = Some(PendingFeedback {
                failing_step,
                error_summary,
                fixes,
            });
        }

        let iterations_used = run.iterations.len() as u32;
        finish(
            run,
            RunOutcome::MaxIterationsExceeded {
                iterations_used,
                failing_step: last_failing,
            },
        )
    }

    async fn write_harness(&self, artifact: &str) -> Result<()> {
        let path = self.verifier.harness_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, artifact).await?;
        tracing::debug!(path = %path.display(), bytes = artifact.len(), "harness written");
        Ok(())
    }

    fn abort(
        &self,
        mut run: RefinementRun,
        mut record: IterationRecord,
        reason: String,
    ) -> RefinementRun {
        let iteration = record.iteration;
        record.analysis = format!("Generation failed: {}", reason);
        record.outcome = IterationOutcome::GenerationFailed {
            reason: reason.clone(),
        };
        record.completed_at = Utc::now();
        let run_id = run.run_id.to_string();
        obs::emit_refine_iteration(&run_id, iteration, "generation_failed", None);
        run.record(record);
        finish(
            run,
            RunOutcome::GenerationFailed {
                iterations_used: iteration + 1,
                reason,
            },
        )
    }
}

fn new_record(
    iteration: u32,
    interface: InterfaceDescriptor,
    prompt: PromptRecord,
) -> IterationRecord {
    let now = Utc::now();
    IterationRecord {
        iteration,
        started_at: now,
        completed_at: now,
        interface,
        prompt,
        raw_completion: None,
        artifact: None,
        artifact_digest: None,
        harness_issues: Vec::new(),
        verification: None,
        analysis: String::new(),
        error_summary: None,
        classifications: Vec::new(),
        feedback: None,
        outcome: IterationOutcome::GenerationFailed {
            reason: "iteration did not complete".to_string(),
        },
    }
}

fn finish(run: RefinementRun, outcome: RunOutcome) -> RefinementRun {
    let run = run.finalize(outcome);
    if let Some(outcome) = &run.final_outcome {
        obs::emit_refine_finished(
            &run.run_id.to_string(),
            outcome.is_success(),
            outcome.iterations_used(),
            &outcome.summary(),
        );
    }
    run
}
