//! Structured lifecycle events for refinement runs.
//!
//! Every event is an `info!` (or `warn!`) record carrying an `event` field,
//! so JSON output can be filtered by event name.

use tracing::info;

/// Span tagging every record of one refinement run with its `run_id`.
///
/// Attach it to the run future with `tracing::Instrument` rather than
/// entering it, since the run awaits across threads.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("rtlagent.run", run_id = %run_id)
}

pub fn emit_refine_started(run_id: &str, module: &str, mode: &str, max_iterations: u32) {
    info!(
        event = "refine.started",
        run_id = %run_id,
        module = %module,
        mode = %mode,
        max_iterations = max_iterations,
    );
}

/// One iteration finished; `status` is the iteration outcome tag.
pub fn emit_refine_iteration(
    run_id: &str,
    iteration: u32,
    status: &str,
    failing_step: Option<&str>,
) {
    info!(
        event = "refine.iteration",
        run_id = %run_id,
        iteration = iteration,
        status = %status,
        failing_step = failing_step.unwrap_or("-"),
    );
}

pub fn emit_verify_check(check: &str, exit_status: i32, duration_ms: u64) {
    info!(
        event = "verify.check",
        check = %check,
        exit_status = exit_status,
        passed = exit_status == 0,
        duration_ms = duration_ms,
    );
}

pub fn emit_refine_finished(run_id: &str, success: bool, iterations_used: u32, summary: &str) {
    info!(
        event = "refine.finished",
        run_id = %run_id,
        success = success,
        iterations_used = iterations_used,
        summary = %summary,
    );
}

pub fn emit_audit_saved(path: &str, total_runs: usize) {
    info!(event = "audit.saved", path = %path, total_runs = total_runs);
}

/// Generation call failed (warning level).
pub fn emit_generation_error(run_id: &str, iteration: u32, error: &dyn std::fmt::Display) {
    tracing::warn!(
        event = "refine.generation_error",
        run_id = %run_id,
        iteration = iteration,
        error = %error,
    );
}
