//! Domain models for RTL Agent.
//!
//! Canonical definitions for the core entities:
//! - `InterfaceDescriptor`: ports of the module under test
//! - `VerificationReport`: per-check results of one verification pass
//! - `DiagnosticClassification`: recognized verifier error signatures
//! - `RefinementRun`: the audited generate/verify/refine run

pub mod diagnostic;
pub mod error;
pub mod interface;
pub mod run;
pub mod verification;

pub use diagnostic::{DiagnosticClassification, ErrorKind, WidthVariant};
pub use error::{Result, RtlAgentError};
pub use interface::{BitRange, Direction, InterfaceDescriptor, Port, DEFAULT_MODULE_NAME};
pub use run::{
    IterationOutcome, IterationRecord, PromptRecord, PromptStrategy, RefinementRun, RunOutcome,
};
pub use verification::{Check, VerificationMode, VerificationReport, VerificationStepResult};
