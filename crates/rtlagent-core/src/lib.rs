//! RTL Agent Core Library
//!
//! Generates Verilog testbenches with a text-generation backend, checks them
//! with Verilator, and feeds classified diagnostics back into the next
//! attempt until verification passes or the iteration budget runs out.

pub mod audit;
pub mod codegen;
pub mod diagnostics;
pub mod domain;
pub mod extract;
pub mod features;
pub mod feedback;
pub mod generation;
pub mod obs;
pub mod prompts;
pub mod refine;
pub mod sanitize;
pub mod telemetry;
pub mod verify;

pub use domain::{
    BitRange, Check, DiagnosticClassification, Direction, ErrorKind, InterfaceDescriptor,
    IterationOutcome, IterationRecord, Port, PromptRecord, PromptStrategy, RefinementRun, Result,
    RtlAgentError, RunOutcome, VerificationMode, VerificationReport, VerificationStepResult,
    WidthVariant, DEFAULT_MODULE_NAME,
};

pub use audit::{append_run, load_entries, AuditEntry};
pub use codegen::{
    format_port_info, generate_connections, generate_corrected_declarations,
    generate_signal_declarations, validate_harness, HARNESS_TOP,
};
pub use diagnostics::{analyze_report, classify_diagnostics, extract_error_summary};
pub use extract::{extract_interface, extract_interface_from_path};
pub use features::{classify_features, FeatureFlags};
pub use feedback::synthesize_feedback;
pub use generation::{GenerationParams, GenerationRequest, Generator};
pub use prompts::{build_first_prompt, build_refined_prompt, ExampleCategory, ExampleSelection};
pub use refine::{RefinementConfig, RefinementLoop, DEFAULT_MAX_ITERATIONS};
pub use sanitize::sanitize_artifact;
pub use verify::{
    CheckExecutor, CommandSpec, ProcessExecutor, ProcessOutput, VerificationDriver, Verifier,
    VerifierConfig,
};
