//! Extraction of a module definition from raw generator output.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{Result, RtlAgentError};

const PREVIEW_CHARS: usize = 200;

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```[A-Za-z0-9_+\-]*\n?").expect("valid fence regex"))
}

fn module_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bmodule\b").expect("valid module regex"))
}

fn endmodule_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bendmodule\b").expect("valid endmodule regex"))
}

/// Return the text from the first `module` to the last `endmodule`
/// (inclusive), with code fences removed and a trailing newline.
///
/// Leading commentary and trailing remarks are dropped. Fails with
/// [`RtlAgentError::EmptyOrMalformedArtifact`] when no module body is found.
pub fn sanitize_artifact(raw: &str) -> Result<String> {
    let code = fence_re().replace_all(raw, "");

    let start = module_re().find(&code).map(|m| m.start());
    let end = endmodule_re().find_iter(&code).last().map(|m| m.end());

    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            let mut clean = code[start..end].to_string();
            clean.push('\n');
            Ok(clean)
        }
        _ => Err(RtlAgentError::EmptyOrMalformedArtifact {
            preview: raw.chars().take(PREVIEW_CHARS).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tagged_fence() {
        let out = sanitize_artifact("```verilog\nmodule x; endmodule\n```").unwrap();
        assert_eq!(out, "module x; endmodule\n");
    }

    #[test]
    fn test_plain_and_systemverilog_fences() {
        let out = sanitize_artifact("```\nmodule a; endmodule\n```").unwrap();
        assert_eq!(out, "module a; endmodule\n");

        let out = sanitize_artifact("```systemverilog\nmodule b; endmodule```").unwrap();
        assert_eq!(out, "module b; endmodule\n");
    }

    #[test]
    fn test_commentary_is_trimmed() {
        let raw = "Here is your testbench:\n\nmodule tb_top;\n  initial $finish;\nendmodule\n\nLet me know if you need changes.";
        let out = sanitize_artifact(raw).unwrap();
        assert!(out.starts_with("module tb_top;"));
        assert!(out.ends_with("endmodule\n"));
        assert!(!out.contains("Let me know"));
    }

    #[test]
    fn test_spans_first_module_to_last_endmodule() {
        let raw = "module a; endmodule\nmodule b; endmodule\ntrailing";
        let out = sanitize_artifact(raw).unwrap();
        assert_eq!(out, "module a; endmodule\nmodule b; endmodule\n");
    }

    #[test]
    fn test_clean_text_is_unchanged() {
        let clean = "module tb_top;\n    reg a;\nendmodule\n";
        let once = sanitize_artifact(clean).unwrap();
        assert_eq!(once, clean);
        assert_eq!(sanitize_artifact(&once).unwrap(), once);
    }

    #[test]
    fn test_no_module_tokens_fails_with_preview() {
        let raw = "I cannot help with that request.";
        match sanitize_artifact(raw) {
            Err(RtlAgentError::EmptyOrMalformedArtifact { preview }) => {
                assert_eq!(preview, raw);
            }
            other => panic!("expected EmptyOrMalformedArtifact, got {:?}", other),
        }
    }

    #[test]
    fn test_preview_is_truncated() {
        let raw = "x".repeat(500);
        match sanitize_artifact(&raw) {
            Err(RtlAgentError::EmptyOrMalformedArtifact { preview }) => {
                assert_eq!(preview.len(), 200);
            }
            other => panic!("expected EmptyOrMalformedArtifact, got {:?}", other),
        }
    }

    #[test]
    fn test_endmodule_alone_is_malformed() {
        assert!(sanitize_artifact("endmodule").is_err());
        assert!(sanitize_artifact("module tb_top; initial begin end").is_err());
    }
}
