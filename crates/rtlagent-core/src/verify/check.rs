//! Verifier layout and the Verilator command plan for each check.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen::HARNESS_TOP;
use crate::domain::Check;

pub const DEFAULT_DUT_FILE: &str = "rtl/my_dut.v";
pub const DEFAULT_TB_FILE: &str = "tb/generated_tb.sv";
pub const DEFAULT_LOGS_DIR: &str = "logs";
pub const DEFAULT_VERILATOR: &str = "verilator";

/// Where the DUT, harness and logs live, and which tool to run.
///
/// File paths are relative to `root`. Commands run with `root` as their
/// working directory but are given absolute paths, so `root` should be
/// absolute (the CLI canonicalizes it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub root: PathBuf,
    pub dut_file: PathBuf,
    pub tb_file: PathBuf,
    pub logs_dir: PathBuf,
    pub verilator_bin: String,
    pub top_module: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dut_file: PathBuf::from(DEFAULT_DUT_FILE),
            tb_file: PathBuf::from(DEFAULT_TB_FILE),
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
            verilator_bin: DEFAULT_VERILATOR.to_string(),
            top_module: HARNESS_TOP.to_string(),
        }
    }
}

impl VerifierConfig {
    /// Default layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_verilator(mut self, bin: impl Into<String>) -> Self {
        self.verilator_bin = bin.into();
        self
    }

    pub fn with_top_module(mut self, top: impl Into<String>) -> Self {
        self.top_module = top.into();
        self
    }

    pub fn dut_path(&self) -> PathBuf {
        self.root.join(&self.dut_file)
    }

    pub fn tb_path(&self) -> PathBuf {
        self.root.join(&self.tb_file)
    }

    pub fn logs_path(&self) -> PathBuf {
        self.root.join(&self.logs_dir)
    }

    /// Include directory for the harness compile (the DUT's directory).
    pub fn rtl_dir(&self) -> PathBuf {
        self.dut_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone())
    }

    /// Per-check log file, `<logs>/<check_name>.log`.
    pub fn log_path(&self, check: Check) -> PathBuf {
        self.logs_path().join(format!("{}.log", check.name()))
    }
}

/// One external command: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Commands for a check, run in order; the first non-zero exit ends it.
pub fn plan_check(check: Check, config: &VerifierConfig) -> Vec<CommandSpec> {
    let bin = config.verilator_bin.as_str();
    let dut = config.dut_path();
    let tb = config.tb_path();
    let include = format!("-I{}", config.rtl_dir().display());

    match check {
        Check::StructuralCompile => vec![CommandSpec::new(bin).arg("--lint-only").path_arg(&dut)],
        Check::Elaborate => vec![CommandSpec::new(bin)
            .arg("--cc")
            .arg("--Mdir")
            .path_arg(&config.logs_path().join("obj_elab"))
            .path_arg(&dut)],
        Check::HarnessCompile => vec![CommandSpec::new(bin)
            .arg("--lint-only")
            .arg("--timing")
            .arg(include)
            .path_arg(&dut)
            .path_arg(&tb)],
        Check::Execute => {
            let obj_dir = config.logs_path().join("obj_sim");
            let sim = obj_dir.join(format!("V{}", config.top_module));
            vec![
                CommandSpec::new(bin)
                    .arg("--binary")
                    .arg("--timing")
                    .arg("--top-module")
                    .arg(config.top_module.as_str())
                    .arg("--Mdir")
                    .path_arg(&obj_dir)
                    .arg(include)
                    .path_arg(&dut)
                    .path_arg(&tb),
                CommandSpec::new(sim.display().to_string()),
            ]
        }
    }
}
