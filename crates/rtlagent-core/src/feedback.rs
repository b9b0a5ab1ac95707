//! Correction instructions synthesized from classified diagnostics.
//!
//! Fix blocks are rendered from `{slot}` templates. The interface descriptor
//! is the authority for names and widths; numbers taken from the diagnostic
//! text are only shown for context.

use std::collections::BTreeMap;

use crate::codegen::{declaration_line, generate_connections, generate_corrected_declarations};
use crate::domain::{DiagnosticClassification, Direction, InterfaceDescriptor, Port, WidthVariant};

/// Returned when nothing specific could be synthesized.
pub const GENERIC_REVIEW: &str = "Review and fix the errors shown above.";

const MISSING_CONNECTION_TEMPLATE: &str = "\
==================================================================
 CRITICAL ERROR: Missing Port Connection
==================================================================

Port(s) not connected: {ports}

REQUIRED FIX:
Your DUT instance must connect EVERY port by name. Use exactly:

{module_name} dut (
{port_connections}
);

Every connection above must appear in the testbench.";

const WIDTH_TRUNCATION_TEMPLATE: &str = "\
==================================================================
 CRITICAL ERROR: Bit Width Mismatch
==================================================================

Port '{port}' is connected to a signal of the wrong width.

Port expects: {expected_width}
You provided: {actual_width}

REQUIRED FIX:
Declare the signal with the port's exact range:
    {correct_declaration}

Examples:
  Single bit:  reg signal;
  8-bit:       reg [7:0] signal;";

const WIDTH_EXPANSION_TEMPLATE: &str = "\
==================================================================
 CRITICAL ERROR: Bit Width Expansion
==================================================================

Signal driving port '{port}' is narrower than the port.

Port expects: {expected_width}
You provided: {actual_width}

REQUIRED FIX:
Declare the signal with the port's exact range:
    {correct_declaration}";

const UNDECLARED_SIGNAL_TEMPLATE: &str = "\
==================================================================
 CRITICAL ERROR: Undeclared Signal
==================================================================

Signal '{signal}' is used but never declared.

REQUIRED FIX:
Declare it before first use:
    {declaration}";

const TYPE_MISMATCH_TEMPLATE: &str = "\
==================================================================
 CRITICAL ERROR: Wire/Reg Type Mismatch
==================================================================

RULE:
  DUT inputs are driven by the testbench: declare them as 'reg'.
  DUT outputs are driven by the DUT: declare them as 'wire'.

USE THESE DECLARATIONS:
{corrected_declarations}";

const MODULE_NOT_FOUND_TEMPLATE: &str = "\
==================================================================
 CRITICAL ERROR: Module Not Found
==================================================================

Verilator cannot find module '{module}'.

REQUIRED FIX:
Instantiate the DUT with its exact module name: {correct_module_name}";

const TIMING_TEMPLATE: &str = "\
==================================================================
 ERROR: Timing Construct Not Supported
==================================================================

Delays are compiled with --timing already. Check the delay syntax:
  Correct:   #10 signal = 1;
  Incorrect: signal = #10 1;";

const SYNTAX_TEMPLATE: &str = "\
==================================================================
 ERROR: Verilog Syntax Error
==================================================================

COMMON ISSUES:
- Missing semicolon
- Unmatched begin/end
- Misspelled keyword

Check the code structure carefully.";

/// Fill `{slot}` placeholders.
///
/// If any placeholder has no value the template is returned unfilled.
pub fn render_template(template: &str, slots: &BTreeMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match slots.get(key) {
            Some(value) => out.push_str(value),
            None => {
                tracing::debug!(slot = key, "template slot unfilled; using raw template");
                return template.to_string();
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

fn bits_text(bits: Option<u32>, placeholder: &str) -> String {
    bits.map(|b| format!("{} bits", b))
        .unwrap_or_else(|| placeholder.to_string())
}

/// Declaration a named signal should have, per the interface.
///
/// Unknown names fall back to a plain one-bit `reg`.
fn authoritative_declaration(iface: &InterfaceDescriptor, name: &str) -> String {
    match iface.find_port(name) {
        Some((direction, port)) => declaration_line(direction, port),
        None => declaration_line(Direction::Input, &Port::new(name, None)),
    }
}

/// Render the fix block for one classification.
pub fn synthesize_block(
    classification: &DiagnosticClassification,
    iface: &InterfaceDescriptor,
) -> String {
    let mut slots: BTreeMap<&str, String> = BTreeMap::new();

    let template = match classification {
        DiagnosticClassification::MissingConnection { ports } => {
            slots.insert("ports", ports.join(", "));
            slots.insert("module_name", iface.name.clone());
            if !iface.is_empty() {
                slots.insert("port_connections", generate_connections(iface));
            }
            MISSING_CONNECTION_TEMPLATE
        }
        DiagnosticClassification::WidthMismatch {
            variant,
            port,
            expected_bits,
            actual_bits,
        } => {
            if let Some(port) = port {
                slots.insert("port", port.clone());
                slots.insert("correct_declaration", authoritative_declaration(iface, port));
            }
            slots.insert("expected_width", bits_text(*expected_bits, "N bits"));
            slots.insert("actual_width", bits_text(*actual_bits, "M bits"));
            match variant {
                WidthVariant::Truncation => WIDTH_TRUNCATION_TEMPLATE,
                WidthVariant::Expansion => WIDTH_EXPANSION_TEMPLATE,
            }
        }
        DiagnosticClassification::UndeclaredSignal { signal } => {
            if let Some(signal) = signal {
                slots.insert("signal", signal.clone());
                slots.insert("declaration", authoritative_declaration(iface, signal));
            }
            UNDECLARED_SIGNAL_TEMPLATE
        }
        DiagnosticClassification::TypeMismatch { .. } => {
            if !iface.is_empty() {
                slots.insert("corrected_declarations", generate_corrected_declarations(iface));
            }
            TYPE_MISMATCH_TEMPLATE
        }
        DiagnosticClassification::ModuleNotFound { module } => {
            slots.insert(
                "module",
                module.clone().unwrap_or_else(|| "<module>".to_string()),
            );
            slots.insert("correct_module_name", iface.name.clone());
            MODULE_NOT_FOUND_TEMPLATE
        }
        DiagnosticClassification::TimingConstructError => TIMING_TEMPLATE,
        DiagnosticClassification::GenericSyntaxError => SYNTAX_TEMPLATE,
    };

    render_template(template, &slots)
}

/// Concatenate fix blocks for every classification, in order.
pub fn synthesize_feedback(
    classifications: &[DiagnosticClassification],
    iface: &InterfaceDescriptor,
) -> String {
    if classifications.is_empty() {
        return GENERIC_REVIEW.to_string();
    }

    classifications
        .iter()
        .map(|c| synthesize_block(c, iface))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::classify_diagnostics;
    use crate::domain::BitRange;

    fn sample() -> InterfaceDescriptor {
        InterfaceDescriptor::new("my_dut")
            .with_input(Port::new("clk", None))
            .with_input(Port::new("rst", None))
            .with_input(Port::new("data", Some(BitRange::new(7, 0))))
            .with_output(Port::new("out", Some(BitRange::new(7, 0))))
    }

    #[test]
    fn test_render_template_fills_slots() {
        let mut slots = BTreeMap::new();
        slots.insert("a", "x".to_string());
        slots.insert("b", "y".to_string());
        assert_eq!(render_template("{a} and {b}", &slots), "x and y");
    }

    #[test]
    fn test_render_template_degrades_on_missing_slot() {
        let mut slots = BTreeMap::new();
        slots.insert("a", "x".to_string());
        assert_eq!(render_template("{a} and {b}", &slots), "{a} and {b}");
    }

    #[test]
    fn test_missing_connection_lists_every_port() {
        let c = DiagnosticClassification::MissingConnection {
            ports: vec!["rst".to_string()],
        };
        let text = synthesize_block(&c, &sample());
        assert!(text.contains("Port(s) not connected: rst"));
        assert!(text.contains("my_dut dut ("));
        for name in ["clk", "rst", "data", "out"] {
            assert!(text.contains(&format!(".{0}({0})", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_width_fix_uses_descriptor_range() {
        let diag = "%Warning-WIDTHTRUNC: tb.sv:12:15: Input port connection 'data' expects 3 bits on the pin connection, but pin connection's VARREF 'data' generates 16 bits.";
        let classes = classify_diagnostics(diag);
        let text = synthesize_feedback(&classes, &sample());
        assert!(text.contains("reg [7:0] data;"));
        assert!(!text.contains("[2:0]"));
        assert!(text.contains("Port expects: 3 bits"));
        assert!(text.contains("You provided: 16 bits"));
    }

    #[test]
    fn test_width_fix_keeps_parameterized_range() {
        let iface = crate::extract::extract_interface(
            "module m #(parameter W = 8) (input wire [W-1:0] data, output wire y); endmodule",
        );
        let c = DiagnosticClassification::WidthMismatch {
            variant: WidthVariant::Truncation,
            port: Some("data".to_string()),
            expected_bits: Some(8),
            actual_bits: Some(1),
        };
        let text = synthesize_block(&c, &iface);
        assert!(text.contains("reg [W-1:0] data;"));
        assert!(!text.contains("reg data;"));
    }

    #[test]
    fn test_width_fix_for_output_uses_wire() {
        let c = DiagnosticClassification::WidthMismatch {
            variant: WidthVariant::Expansion,
            port: Some("out".to_string()),
            expected_bits: None,
            actual_bits: None,
        };
        let text = synthesize_block(&c, &sample());
        assert!(text.contains("wire [7:0] out;"));
        assert!(text.contains("Port expects: N bits"));
        assert!(text.contains("You provided: M bits"));
    }

    #[test]
    fn test_width_without_port_emits_unfilled_template() {
        let c = DiagnosticClassification::WidthMismatch {
            variant: WidthVariant::Truncation,
            port: None,
            expected_bits: Some(8),
            actual_bits: Some(4),
        };
        let text = synthesize_block(&c, &sample());
        assert_eq!(text, WIDTH_TRUNCATION_TEMPLATE);
    }

    #[test]
    fn test_module_not_found_substitutes_descriptor_name() {
        let c = DiagnosticClassification::ModuleNotFound { module: None };
        let text = synthesize_block(&c, &sample());
        assert!(text.contains("module '<module>'"));
        assert!(text.contains("exact module name: my_dut"));
    }

    #[test]
    fn test_type_mismatch_includes_corrected_declarations() {
        let c = DiagnosticClassification::TypeMismatch {
            signal: Some("out".to_string()),
        };
        let text = synthesize_block(&c, &sample());
        assert!(text.contains("reg  [7:0]    data;"));
        assert!(text.contains("wire [7:0]    out;"));
    }

    #[test]
    fn test_blocks_are_joined_in_order() {
        let classes = vec![
            DiagnosticClassification::MissingConnection {
                ports: vec!["rst".to_string()],
            },
            DiagnosticClassification::GenericSyntaxError,
            DiagnosticClassification::GenericSyntaxError,
        ];
        let text = synthesize_feedback(&classes, &sample());
        let missing = text.find("Missing Port Connection").unwrap();
        let syntax = text.find("Verilog Syntax Error").unwrap();
        assert!(missing < syntax);
        assert_eq!(text.matches("Verilog Syntax Error").count(), 2);
    }

    #[test]
    fn test_no_classifications_gives_generic_review() {
        assert_eq!(synthesize_feedback(&[], &sample()), GENERIC_REVIEW);
    }

    #[test]
    fn test_empty_interface_degrades_gracefully() {
        let c = DiagnosticClassification::MissingConnection {
            ports: vec!["a".to_string()],
        };
        let text = synthesize_block(&c, &InterfaceDescriptor::empty());
        assert_eq!(text, MISSING_CONNECTION_TEMPLATE);
    }
}
