//! RTL Agent CLI
//!
//! The `rtlagent` command drafts a SystemVerilog testbench for a Verilog DUT
//! and refines it against Verilator until it verifies.
//!
//! ## Commands
//!
//! - `run`: generate, verify and refine a testbench
//! - `ports`: show the interface and features extracted from a DUT
//! - `diagnose`: classify Verilator output and print the fixes it implies

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn, Level};

use rtlagent_core::generation::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use rtlagent_core::{
    append_run, classify_diagnostics, classify_features, extract_error_summary, extract_interface,
    synthesize_feedback, DiagnosticClassification, ExampleCategory, ExampleSelection,
    FeatureFlags, GenerationParams,
    InterfaceDescriptor, IterationOutcome, RefinementConfig, RefinementLoop, RefinementRun,
    VerificationDriver, VerificationMode, Verifier, VerifierConfig,
};
use rtlagent_llm::{OllamaClient, OllamaConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

const DEFAULT_AUDIT_LOG: &str = "logs/simulation_history.json";

#[derive(Parser)]
#[command(name = "rtlagent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "LLM-driven Verilog testbench generation with Verilator feedback",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON log lines, and JSON output where a command supports it
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a testbench and refine it until Verilator accepts it
    Run {
        /// Verilog file containing the DUT module
        #[arg(long)]
        dut: PathBuf,

        /// What the testbench should exercise
        #[arg(long)]
        intent: String,

        /// Verification depth: compile_only, compile_elaborate or full
        #[arg(long, default_value = "compile_elaborate")]
        mode: VerificationMode,

        /// Maximum generate/verify attempts
        #[arg(long, default_value_t = rtlagent_core::DEFAULT_MAX_ITERATIONS,
              value_parser = clap::value_parser!(u32).range(1..))]
        max_iterations: u32,

        /// Fixed few-shot category (combinational, sequential, complex, all)
        /// instead of one example matched to the DUT
        #[arg(long)]
        examples: Option<ExampleCategory>,

        /// Maximum examples taken from --examples
        #[arg(long, default_value_t = 2, requires = "examples")]
        max_examples: usize,

        /// Model name passed to the backend
        #[arg(long, env = "RTLAGENT_MODEL", default_value = DEFAULT_MODEL)]
        model: String,

        /// Sampling temperature
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,

        /// Maximum generated tokens
        #[arg(long, default_value_t = DEFAULT_MAX_TOKENS)]
        max_tokens: u32,

        /// Working directory holding rtl/, tb/ and logs/
        #[arg(long, default_value = ".")]
        workspace: PathBuf,

        /// Run history file (default: <workspace>/logs/simulation_history.json)
        #[arg(long)]
        audit_log: Option<PathBuf>,

        /// Verilator executable
        #[arg(long, env = "RTLAGENT_VERILATOR", default_value = "verilator")]
        verilator: String,

        /// Ollama server URL
        #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_BASE_URL)]
        ollama_host: String,

        /// HTTP timeout for a single generation call, in seconds
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        llm_timeout: u64,
    },

    /// Show the ports and features extracted from a DUT
    Ports {
        /// Verilog file containing the DUT module
        #[arg(long)]
        dut: PathBuf,
    },

    /// Classify Verilator output and print the synthesized fixes
    Diagnose {
        /// File with Verilator stderr (e.g. logs/compile_tb.log)
        #[arg(long)]
        log: PathBuf,

        /// DUT used to make fixes concrete
        #[arg(long)]
        dut: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    rtlagent_core::telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            dut,
            intent,
            mode,
            max_iterations,
            examples,
            max_examples,
            model,
            temperature,
            max_tokens,
            workspace,
            audit_log,
            verilator,
            ollama_host,
            llm_timeout,
        } => {
            let params = GenerationParams {
                model,
                temperature,
                max_tokens,
            };
            let examples = match examples {
                Some(category) => ExampleSelection::Category {
                    category,
                    max: max_examples,
                },
                None => ExampleSelection::Auto,
            };
            let refinement = RefinementConfig {
                mode,
                max_iterations,
                params,
                examples,
            };
            let ollama = OllamaConfig::new(&ollama_host).with_timeout(llm_timeout);
            cmd_run(
                &dut,
                &intent,
                refinement,
                &workspace,
                audit_log.as_deref(),
                &verilator,
                ollama,
            )
            .await
        }
        Commands::Ports { dut } => cmd_ports(&dut, cli.json),
        Commands::Diagnose { log, dut } => cmd_diagnose(&log, dut.as_deref(), cli.json),
    }
}

/// Copy the DUT into the workspace layout unless it already lives there.
fn stage_dut(dut: &Path, config: &VerifierConfig) -> Result<()> {
    let target = config.dut_path();
    let source = dut
        .canonicalize()
        .with_context(|| format!("DUT file not found: {}", dut.display()))?;

    if target.canonicalize().ok().as_deref() == Some(source.as_path()) {
        return Ok(());
    }

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::copy(&source, &target)
        .with_context(|| format!("Failed to copy DUT to {}", target.display()))?;
    info!(from = %source.display(), to = %target.display(), "staged DUT");
    Ok(())
}

async fn cmd_run(
    dut: &Path,
    intent: &str,
    refinement: RefinementConfig,
    workspace: &Path,
    audit_log: Option<&Path>,
    verilator: &str,
    ollama: OllamaConfig,
) -> Result<()> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("Failed to create workspace {}", workspace.display()))?;
    let root = workspace
        .canonicalize()
        .with_context(|| format!("Invalid workspace {}", workspace.display()))?;

    let verifier_config = VerifierConfig::new(&root).with_verilator(verilator);
    stage_dut(dut, &verifier_config)?;

    let iface = extract_interface(
        &std::fs::read_to_string(verifier_config.dut_path()).context("Failed to read staged DUT")?,
    );
    if iface.is_empty() {
        warn!(
            dut = %dut.display(),
            "no ports found in DUT; generation will have little to go on"
        );
    }

    let client = OllamaClient::new(ollama).context("Failed to create LLM client")?;
    if !client.is_available().await {
        warn!(
            url = %client.config().base_url,
            "LLM backend is not responding; first request may fail"
        );
    }

    println!(
        "DUT: {} ({} inputs, {} outputs)",
        iface.name,
        iface.inputs.len(),
        iface.outputs.len()
    );
    println!("Mode: {}", refinement.mode);
    println!("Model: {}", refinement.params.model);
    println!("Max iterations: {}", refinement.max_iterations);
    if let ExampleSelection::Category { category, max } = refinement.examples {
        println!("Examples: {} (up to {})", category, max);
    }
    println!();

    let audit_path = audit_log
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(DEFAULT_AUDIT_LOG));

    let refine = RefinementLoop::new(client, VerificationDriver::new(verifier_config), refinement);
    let run = refine.run(intent).await;

    print_run(&run);

    match append_run(&audit_path, &run).await {
        Ok(total) => println!("\nSaved to {} ({} runs)", audit_path.display(), total),
        Err(e) => warn!(path = %audit_path.display(), error = %e, "failed to save run history"),
    }

    if run.succeeded() {
        println!(
            "\n✓ Testbench verified: {}",
            refine.verifier().harness_path().display()
        );
        Ok(())
    } else {
        anyhow::bail!("Testbench did not verify")
    }
}

fn print_run(run: &RefinementRun) {
    println!("Run ID: {}", run.run_id);

    for record in &run.iterations {
        let (status, detail) = match &record.outcome {
            IterationOutcome::Passed => ("✓", "passed".to_string()),
            IterationOutcome::VerificationFailed { failing_step } => {
                ("✗", format!("failed at {}", failing_step))
            }
            IterationOutcome::GenerationFailed { reason } => {
                ("✗", format!("generation failed: {}", reason))
            }
        };
        println!("  {} iteration {}: {}", status, record.iteration + 1, detail);

        if let Some(report) = &record.verification {
            for step in &report.results {
                let mark = if step.passed() { "✓" } else { "✗" };
                println!(
                    "      {} {} ({}ms, exit code: {})",
                    mark, step.check, step.duration_ms, step.exit_status
                );
            }
        }
        for issue in &record.harness_issues {
            println!("      ! {}", issue);
        }
    }

    if let Some(outcome) = &run.final_outcome {
        println!();
        println!(
            "Status: {}",
            if outcome.is_success() { "✓ PASSED" } else { "✗ FAILED" }
        );
        println!("Summary: {}", outcome.summary());
    }
}

#[derive(Serialize)]
struct PortsReport {
    interface: InterfaceDescriptor,
    features: FeatureFlags,
}

fn cmd_ports(dut: &Path, json: bool) -> Result<()> {
    let source = std::fs::read_to_string(dut)
        .with_context(|| format!("Failed to read DUT {}", dut.display()))?;
    let interface = extract_interface(&source);
    let features = classify_features(&interface);

    if json {
        let report = PortsReport {
            interface,
            features,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", rtlagent_core::format_port_info(&interface));
    println!();
    println!("Features:");
    println!("  clock:     {}", features.has_clock);
    println!("  reset:     {}", features.has_reset);
    println!("  multibit:  {}", features.has_multibit);
    println!("  max width: {}", features.max_width);
    Ok(())
}

#[derive(Debug, Serialize)]
struct DiagnoseReport {
    error_summary: String,
    classifications: Vec<DiagnosticClassification>,
    feedback: String,
}

fn diagnose(text: &str, iface: &InterfaceDescriptor) -> DiagnoseReport {
    let classifications = classify_diagnostics(text);
    let feedback = synthesize_feedback(&classifications, iface);
    DiagnoseReport {
        error_summary: extract_error_summary(text),
        classifications,
        feedback,
    }
}

fn cmd_diagnose(log: &Path, dut: Option<&Path>, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(log)
        .with_context(|| format!("Failed to read log {}", log.display()))?;
    let iface = match dut {
        Some(path) => extract_interface(
            &std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read DUT {}", path.display()))?,
        ),
        None => InterfaceDescriptor::empty(),
    };

    let report = diagnose(&text, &iface);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Error summary:\n{}\n", report.error_summary);
    if report.classifications.is_empty() {
        println!("Classified: (nothing actionable)");
    } else {
        let kinds: Vec<&str> = report
            .classifications
            .iter()
            .map(|c| c.kind().label())
            .collect();
        println!("Classified: {}", kinds.join(", "));
    }
    println!("\n{}", report.feedback);
    Ok(())
}
