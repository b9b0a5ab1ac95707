//! Verification driver: runs Verilator over the DUT and generated harness.

pub mod check;
pub mod driver;
pub mod runner;

pub use check::{plan_check, CommandSpec, VerifierConfig};
pub use driver::{VerificationDriver, Verifier};
pub use runner::{CheckExecutor, ProcessExecutor, ProcessOutput};
