//! End-to-end behaviour of the refinement loop with scripted capabilities.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rtlagent_core::{
    Check, ExampleCategory, ExampleSelection, GenerationParams, GenerationRequest, Generator,
    IterationOutcome, PromptStrategy, RefinementConfig, RefinementLoop, Result, RtlAgentError,
    RunOutcome, VerificationMode, VerificationReport, VerificationStepResult, Verifier,
};

const DUT: &str = "\
module my_dut(
    input wire clk,
    input wire rst,
    input wire [7:0] data,
    output reg [7:0] out
);
endmodule
";

const GOOD_TB: &str = "```verilog\nmodule tb_top;\n    reg clk, rst;\n    reg [7:0] data;\n    wire [7:0] out;\n    my_dut dut(.clk(clk), .rst(rst), .data(data), .out(out));\n    initial $finish;\nendmodule\n```";

const PINMISSING: &str = "%Warning-PINMISSING: tb/generated_tb.sv:6:12: Cell has missing pin: 'rst'\n%Error: Exiting due to 1 warning(s)";

#[derive(Clone, Default)]
struct ScriptedGenerator {
    responses: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    fn repeating(response: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| Ok(response.to_string())).collect())
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RtlAgentError::Generation("script exhausted".to_string())))
    }
}

/// Returns scripted reports; repeats the last one when the script runs out.
struct ScriptedVerifier {
    dir: tempfile::TempDir,
    reports: Mutex<VecDeque<VerificationReport>>,
    calls: AtomicUsize,
    block_harness_after_verify: bool,
}

impl ScriptedVerifier {
    fn new(reports: Vec<VerificationReport>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("rtl")).unwrap();
        std::fs::write(dir.path().join("rtl/my_dut.v"), DUT).unwrap();
        Self {
            dir,
            reports: Mutex::new(reports.into()),
            calls: AtomicUsize::new(0),
            block_harness_after_verify: false,
        }
    }

    /// Replace the harness file with a directory once verified, so the next
    /// write fails.
    fn blocking_harness_after_verify(mut self) -> Self {
        self.block_harness_after_verify = true;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    fn dut_path(&self) -> PathBuf {
        self.dir.path().join("rtl/my_dut.v")
    }

    fn harness_path(&self) -> PathBuf {
        self.dir.path().join("tb/generated_tb.sv")
    }

    async fn verify(&self, _mode: VerificationMode) -> VerificationReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.block_harness_after_verify {
            let path = self.harness_path();
            std::fs::remove_file(&path).unwrap();
            std::fs::create_dir_all(&path).unwrap();
        }
        let mut reports = self.reports.lock().unwrap();
        if reports.len() > 1 {
            reports.pop_front().unwrap()
        } else {
            reports.front().cloned().unwrap()
        }
    }
}

fn step(check: Check, exit_status: i32, stderr: &str) -> VerificationStepResult {
    VerificationStepResult {
        check,
        command: format!("verilator {}", check),
        exit_status,
        stdout: String::new(),
        stderr: stderr.to_string(),
        log_path: None,
        duration_ms: 1,
    }
}

fn passing() -> VerificationReport {
    VerificationReport {
        mode: VerificationMode::CompileOnly,
        results: vec![
            step(Check::StructuralCompile, 0, ""),
            step(Check::HarnessCompile, 0, ""),
        ],
    }
}

fn failing(stderr: &str) -> VerificationReport {
    VerificationReport {
        mode: VerificationMode::CompileOnly,
        results: vec![
            step(Check::StructuralCompile, 0, ""),
            step(Check::HarnessCompile, 1, stderr),
        ],
    }
}

fn config(max_iterations: u32) -> RefinementConfig {
    RefinementConfig {
        mode: VerificationMode::CompileOnly,
        max_iterations,
        params: GenerationParams::default(),
        ..RefinementConfig::default()
    }
}

#[tokio::test]
async fn passes_on_first_attempt() {
    let generator = ScriptedGenerator::repeating(GOOD_TB, 1);
    let verifier = ScriptedVerifier::new(vec![passing()]);
    let refine = RefinementLoop::new(generator.clone(), verifier, config(3));

    let run = refine.run("reset then drive data").await;

    assert!(run.succeeded());
    assert_eq!(run.final_outcome, Some(RunOutcome::Success { iterations_used: 1 }));
    assert_eq!(run.iterations.len(), 1);

    let record = &run.iterations[0];
    assert_eq!(record.outcome, IterationOutcome::Passed);
    assert_eq!(record.prompt.strategy, PromptStrategy::FewShot);
    assert_eq!(record.interface.name, "my_dut");
    assert!(record.harness_issues.is_empty());
    assert_eq!(record.artifact_digest.as_ref().map(String::len), Some(64));
    assert_eq!(record.analysis, "All verification steps passed successfully.");

    let written = std::fs::read_to_string(refine.verifier().harness_path()).unwrap();
    assert_eq!(Some(written), record.artifact.clone());
    assert!(!record.artifact.as_ref().unwrap().contains("```"));

    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].system.contains("LEARN FROM THESE EXAMPLES"));
    assert_eq!(requests[0].params.model, "qwen2.5-coder:7b");
}

#[tokio::test]
async fn always_failing_exhausts_budget() {
    let generator = ScriptedGenerator::repeating(GOOD_TB, 10);
    let verifier = ScriptedVerifier::new(vec![failing(PINMISSING)]);
    let refine = RefinementLoop::new(generator.clone(), verifier, config(3));

    let run = refine.run("exercise reset").await;

    assert_eq!(generator.requests().len(), 3);
    assert_eq!(refine.verifier().calls(), 3);
    assert_eq!(
        run.final_outcome,
        Some(RunOutcome::MaxIterationsExceeded {
            iterations_used: 3,
            failing_step: Some(Check::HarnessCompile),
        })
    );
    let indices: Vec<u32> = run.iterations.iter().map(|r| r.iteration).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(run
        .iterations
        .iter()
        .all(|r| r.outcome
            == IterationOutcome::VerificationFailed {
                failing_step: Check::HarnessCompile,
            }));
}

#[tokio::test]
async fn retry_prompt_carries_targeted_feedback() {
    let generator = ScriptedGenerator::repeating(GOOD_TB, 2);
    let verifier = ScriptedVerifier::new(vec![failing(PINMISSING), passing()]);
    let refine = RefinementLoop::new(generator.clone(), verifier, config(3));

    let run = refine.run("exercise reset").await;

    assert_eq!(run.final_outcome, Some(RunOutcome::Success { iterations_used: 2 }));

    let first = &run.iterations[0];
    assert_eq!(first.classifications.len(), 1);
    let fixes = first.feedback.as_deref().unwrap();
    for name in ["clk", "rst", "data", "out"] {
        assert!(fixes.contains(&format!(".{0}({0})", name)));
    }
    assert!(first.analysis.starts_with("Failed at compile_tb:"));

    let second = &run.iterations[1];
    assert_eq!(second.prompt.strategy, PromptStrategy::TargetedFeedback);
    assert_eq!(second.prompt.slots["failing_step"], "compile_tb");
    assert!(second.prompt.user.contains("missing pin: 'rst'"));
    assert!(second.prompt.user.contains(fixes));

    let requests = generator.requests();
    assert!(!requests[1].system.contains("LEARN FROM THESE EXAMPLES"));
}

#[tokio::test]
async fn width_feedback_uses_declared_range() {
    let width = "%Warning-WIDTHTRUNC: tb.sv:9:5: Input port connection 'data' expects 3 bits on the pin connection, but pin connection's VARREF 'data' generates 16 bits.";
    let generator = ScriptedGenerator::repeating(GOOD_TB, 1);
    let verifier = ScriptedVerifier::new(vec![failing(width)]);
    let refine = RefinementLoop::new(generator, verifier, config(1));

    let run = refine.run("drive data").await;

    let feedback = run.iterations[0].feedback.as_deref().unwrap();
    assert!(feedback.contains("reg [7:0] data;"));
}

#[tokio::test]
async fn malformed_output_aborts_without_verifying() {
    let prose = "Sorry, I can only describe the testbench in words.";
    let generator = ScriptedGenerator::repeating(prose, 3);
    let verifier = ScriptedVerifier::new(vec![passing()]);
    let refine = RefinementLoop::new(generator.clone(), verifier, config(3));

    let run = refine.run("anything").await;

    assert_eq!(generator.requests().len(), 1);
    assert_eq!(refine.verifier().calls(), 0);
    assert_eq!(run.iterations.len(), 1);
    match run.final_outcome {
        Some(RunOutcome::GenerationFailed { iterations_used, ref reason }) => {
            assert_eq!(iterations_used, 1);
            assert!(reason.contains("no valid module"));
        }
        ref other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(run.iterations[0].raw_completion.is_some());
    assert!(run.iterations[0].artifact.is_none());
}

#[tokio::test]
async fn generator_error_on_retry_ends_run() {
    let generator = ScriptedGenerator::new(vec![
        Ok(GOOD_TB.to_string()),
        Err(RtlAgentError::Generation("connection refused".to_string())),
    ]);
    let verifier = ScriptedVerifier::new(vec![failing(PINMISSING)]);
    let refine = RefinementLoop::new(generator, verifier, config(3));

    let run = refine.run("exercise reset").await;

    assert_eq!(run.iterations.len(), 2);
    assert!(matches!(
        run.iterations[1].outcome,
        IterationOutcome::GenerationFailed { .. }
    ));
    assert!(run.iterations[1].raw_completion.is_none());
    assert!(run.final_outcome.unwrap().summary().contains("connection refused"));
}

#[tokio::test]
async fn harness_precheck_issues_are_recorded_not_gating() {
    let partial = "module tb_top;\n    my_dut dut(.clk(clk));\n    initial $finish;\nendmodule";
    let generator = ScriptedGenerator::repeating(partial, 1);
    let verifier = ScriptedVerifier::new(vec![passing()]);
    let refine = RefinementLoop::new(generator, verifier, config(1));

    let run = refine.run("smoke").await;

    assert!(run.succeeded());
    let issues = &run.iterations[0].harness_issues;
    assert_eq!(issues.len(), 3);
    assert_eq!(refine.verifier().calls(), 1);
}

#[tokio::test]
async fn harness_write_failure_keeps_earlier_iterations() {
    let generator = ScriptedGenerator::repeating(GOOD_TB, 3);
    let verifier = ScriptedVerifier::new(vec![failing(PINMISSING)]).blocking_harness_after_verify();
    let refine = RefinementLoop::new(generator.clone(), verifier, config(3));

    let run = refine.run("exercise reset").await;

    assert_eq!(generator.requests().len(), 2);
    assert_eq!(refine.verifier().calls(), 1);
    assert_eq!(run.iterations.len(), 2);
    assert_eq!(
        run.iterations[0].outcome,
        IterationOutcome::VerificationFailed {
            failing_step: Check::HarnessCompile,
        }
    );
    assert!(run.iterations[0].feedback.is_some());

    let second = &run.iterations[1];
    assert!(second.artifact.is_some());
    assert!(second.verification.is_none());
    match &second.outcome {
        IterationOutcome::GenerationFailed { reason } => {
            assert!(reason.contains("failed to write harness"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    match run.final_outcome {
        Some(RunOutcome::GenerationFailed {
            iterations_used, ..
        }) => assert_eq!(iterations_used, 2),
        ref other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn fixed_example_category_reaches_first_prompt() {
    let generator = ScriptedGenerator::repeating(GOOD_TB, 1);
    let fixed = RefinementConfig {
        examples: ExampleSelection::Category {
            category: ExampleCategory::Complex,
            max: 2,
        },
        ..config(1)
    };
    let verifier = ScriptedVerifier::new(vec![passing()]);
    let refine = RefinementLoop::new(generator.clone(), verifier, fixed);

    let run = refine.run("walk the fsm").await;

    assert!(run.succeeded());
    let system = &generator.requests()[0].system;
    assert_eq!(system.matches("EXAMPLE:").count(), 2);
    assert!(!system.contains("Clocked logic with reset"));
}
