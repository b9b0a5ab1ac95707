//! Verilator diagnostic classification.
//!
//! Scans raw verifier output for known error signatures and pulls out the
//! parameters the feedback templates need. Every recognized kind present in
//! the text is reported, in a fixed order; text with no error marker at all
//! classifies as nothing actionable.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{DiagnosticClassification, ErrorKind, VerificationReport, WidthVariant};

const SUMMARY_MAX_LINES: usize = 10;
const SUMMARY_FALLBACK_CHARS: usize = 500;

const PINMISSING_MARKER: &str = "PINMISSING";
const WIDTHTRUNC_MARKER: &str = "WIDTHTRUNC";
const WIDTHEXPAND_MARKER: &str = "WIDTHEXPAND";
const UNDECLARED_MARKERS: &[&str] = &["Can't find definition of variable", "not declared"];
const TYPE_MISMATCH_MARKERS: &[&str] = &[
    "PROCASSWIRE",
    "Procedural assignment to wire",
    "Continuous assignment to reg",
];
const TIMING_MARKERS: &[&str] = &["NEEDTIMINGOPT", "NOTIMING", "Timing control"];

macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("valid diagnostic regex"))
        }
    };
}

cached_regex!(missing_pin_re, r"missing pin: '(\w+)'");
cached_regex!(width_port_re, r"port\s+(?:connection\s+)?'(\w+)'");
cached_regex!(width_bits_re, r"(\d+) bits.+?(\d+) bits");
cached_regex!(undeclared_re, r"(?:variable|signal|identifier):?\s+'(\w+)'");
cached_regex!(quoted_name_re, r"'(\w+)'");
cached_regex!(module_name_re, r"module:?\s+'(\w+)'");

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// Whether the text contains anything that looks like an error.
pub fn has_error_marker(text: &str) -> bool {
    text.contains("Error") || text.contains("error")
}

/// Classify verifier output into every recognized error kind.
pub fn classify_diagnostics(text: &str) -> Vec<DiagnosticClassification> {
    let mut found = Vec::new();

    if let Some(c) = classify_missing_connection(text) {
        found.push(c);
    }
    if let Some(c) = classify_width_mismatch(text) {
        found.push(c);
    }
    if let Some(c) = classify_undeclared(text) {
        found.push(c);
    }
    if let Some(c) = classify_type_mismatch(text) {
        found.push(c);
    }
    if let Some(c) = classify_module_not_found(text) {
        found.push(c);
    }
    if contains_any(text, TIMING_MARKERS) {
        found.push(DiagnosticClassification::TimingConstructError);
    }

    if found.is_empty() && has_error_marker(text) {
        found.push(DiagnosticClassification::GenericSyntaxError);
    }

    found
}

fn classify_missing_connection(text: &str) -> Option<DiagnosticClassification> {
    if !text.contains(PINMISSING_MARKER) {
        return None;
    }
    let ports: Vec<String> = missing_pin_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();
    if ports.is_empty() {
        return None;
    }
    Some(DiagnosticClassification::MissingConnection { ports })
}

fn classify_width_mismatch(text: &str) -> Option<DiagnosticClassification> {
    let variant = if text.contains(WIDTHTRUNC_MARKER) {
        WidthVariant::Truncation
    } else if text.contains(WIDTHEXPAND_MARKER) {
        WidthVariant::Expansion
    } else {
        return None;
    };

    // Prefer the first width-marked line so port and numbers come from the
    // same message; fall back to the whole blob.
    let scope = text
        .lines()
        .find(|l| l.contains(WIDTHTRUNC_MARKER) || l.contains(WIDTHEXPAND_MARKER))
        .filter(|l| width_bits_re().is_match(l))
        .unwrap_or(text);

    let port = width_port_re()
        .captures(scope)
        .or_else(|| width_port_re().captures(text))
        .map(|c| c[1].to_string());

    let (expected_bits, actual_bits) = match width_bits_re().captures(scope) {
        Some(c) => (c[1].parse().ok(), c[2].parse().ok()),
        None => (None, None),
    };

    Some(DiagnosticClassification::WidthMismatch {
        variant,
        port,
        expected_bits,
        actual_bits,
    })
}

fn classify_undeclared(text: &str) -> Option<DiagnosticClassification> {
    let line = text.lines().find(|l| contains_any(l, UNDECLARED_MARKERS))?;
    let signal = undeclared_re()
        .captures(line)
        .or_else(|| quoted_name_re().captures(line))
        .map(|c| c[1].to_string());
    Some(DiagnosticClassification::UndeclaredSignal { signal })
}

fn classify_type_mismatch(text: &str) -> Option<DiagnosticClassification> {
    let line = text.lines().find(|l| contains_any(l, TYPE_MISMATCH_MARKERS))?;
    let signal = quoted_name_re()
        .captures_iter(line)
        .last()
        .map(|c| c[1].to_string());
    Some(DiagnosticClassification::TypeMismatch { signal })
}

fn classify_module_not_found(text: &str) -> Option<DiagnosticClassification> {
    if !(text.contains("Cannot find") && text.to_lowercase().contains("module")) {
        return None;
    }
    let module = module_name_re().captures(text).map(|c| c[1].to_string());
    Some(DiagnosticClassification::ModuleNotFound { module })
}

/// Condense verifier stderr to the lines worth showing a model.
///
/// Keeps up to ten error/warning lines, skipping the lint banner; falls back
/// to the first 500 characters when nothing matches.
pub fn extract_error_summary(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .filter(|l| {
            ["Error", "Warning", PINMISSING_MARKER, "WIDTH"]
                .iter()
                .any(|k| l.contains(k))
        })
        .filter(|l| !l.to_lowercase().contains("verilator lint"))
        .map(str::trim)
        .take(SUMMARY_MAX_LINES)
        .collect();

    if lines.is_empty() {
        stderr.chars().take(SUMMARY_FALLBACK_CHARS).collect()
    } else {
        lines.join("\n")
    }
}

/// Short human-readable analysis of a verification report.
pub fn analyze_report(report: &VerificationReport) -> String {
    let Some(failing) = report.failing_step() else {
        return if report.passed() {
            "All verification steps passed successfully.".to_string()
        } else {
            "Verification completed.".to_string()
        };
    };

    let kinds: Vec<ErrorKind> = classify_diagnostics(&failing.stderr)
        .iter()
        .map(DiagnosticClassification::kind)
        .filter(|k| *k != ErrorKind::GenericSyntaxError)
        .collect();

    let categories = if kinds.is_empty() {
        vec![format!("- {} failed", failing.check)]
    } else {
        kinds.iter().map(|k| format!("- {}", k.label())).collect()
    };

    format!("Failed at {}:\n{}", failing.check, categories.join("\n"))
}
