//! Classified verifier diagnostics.

use serde::{Deserialize, Serialize};

/// Which side of a width mismatch was reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WidthVariant {
    /// Value wider than its destination (WIDTHTRUNC).
    Truncation,
    /// Value narrower than its destination (WIDTHEXPAND).
    Expansion,
}

/// Coarse error kind, independent of the extracted fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingConnection,
    WidthMismatch,
    UndeclaredSignal,
    TypeMismatch,
    ModuleNotFound,
    TimingConstructError,
    GenericSyntaxError,
}

impl ErrorKind {
    /// Short human label used in analysis text.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::MissingConnection => "missing port connections",
            ErrorKind::WidthMismatch => "bit width mismatch",
            ErrorKind::UndeclaredSignal => "undeclared signal",
            ErrorKind::TypeMismatch => "wire/reg type mismatch",
            ErrorKind::ModuleNotFound => "module not found",
            ErrorKind::TimingConstructError => "unsupported timing construct",
            ErrorKind::GenericSyntaxError => "syntax error",
        }
    }
}

/// One recognized error signature with the parameters pulled out of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticClassification {
    MissingConnection {
        ports: Vec<String>,
    },
    WidthMismatch {
        variant: WidthVariant,
        port: Option<String>,
        /// First bit count in the diagnostic phrase.
        expected_bits: Option<u32>,
        /// Second bit count in the diagnostic phrase.
        actual_bits: Option<u32>,
    },
    UndeclaredSignal {
        signal: Option<String>,
    },
    TypeMismatch {
        signal: Option<String>,
    },
    ModuleNotFound {
        module: Option<String>,
    },
    TimingConstructError,
    GenericSyntaxError,
}

impl DiagnosticClassification {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingConnection { .. } => ErrorKind::MissingConnection,
            Self::WidthMismatch { .. } => ErrorKind::WidthMismatch,
            Self::UndeclaredSignal { .. } => ErrorKind::UndeclaredSignal,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::ModuleNotFound { .. } => ErrorKind::ModuleNotFound,
            Self::TimingConstructError => ErrorKind::TimingConstructError,
            Self::GenericSyntaxError => ErrorKind::GenericSyntaxError,
        }
    }
}
