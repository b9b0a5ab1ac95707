//! Harness text fragments derived from a DUT interface.
//!
//! These are copied verbatim into prompts and fix instructions so the model
//! sees the exact declarations and instantiation it must produce.

use crate::domain::{Direction, InterfaceDescriptor, Port};

/// Name the generated harness module must use.
pub const HARNESS_TOP: &str = "tb_top";

/// Interface summary for prompts.
pub fn format_port_info(iface: &InterfaceDescriptor) -> String {
    let mut lines = vec![format!("Module Name: {}", iface.name), String::new()];

    if !iface.inputs.is_empty() {
        lines.push("Input Ports:".to_string());
        for port in &iface.inputs {
            lines.push(format!("  - input wire {:<8} {}", port.range_text(), port.name));
        }
    }

    if !iface.outputs.is_empty() {
        lines.push("\nOutput Ports:".to_string());
        for port in &iface.outputs {
            lines.push(format!("  - output {:<8} {}", port.range_text(), port.name));
        }
    }

    lines.join("\n")
}

fn aligned_declaration(storage: &str, port: &Port) -> String {
    format!("{:<4} {:<8} {};", storage, port.range_text(), port.name)
}

/// Harness-side declaration for one port, e.g. `reg [7:0] data;`.
///
/// Inputs are driven by the harness (`reg`); outputs are observed (`wire`).
pub fn declaration_line(direction: Direction, port: &Port) -> String {
    match &port.width {
        Some(range) => format!("{} {} {};", direction.harness_storage(), range, port.name),
        None => format!("{} {};", direction.harness_storage(), port.name),
    }
}

/// Indented signal declaration block for the harness body.
pub fn generate_signal_declarations(iface: &InterfaceDescriptor) -> String {
    let mut lines = Vec::new();

    if !iface.inputs.is_empty() {
        lines.push("    // DUT Inputs (use 'reg')".to_string());
    }
    for port in &iface.inputs {
        lines.push(format!("    {}", aligned_declaration("reg", port)));
    }

    if !iface.outputs.is_empty() {
        lines.push("    // DUT Outputs (use 'wire')".to_string());
    }
    for port in &iface.outputs {
        lines.push(format!("    {}", aligned_declaration("wire", port)));
    }

    lines.join("\n")
}

/// Named port connections for the DUT instance, one per line, inputs first.
pub fn generate_connections(iface: &InterfaceDescriptor) -> String {
    let names: Vec<&str> = iface.ports().map(|(_, p)| p.name.as_str()).collect();
    let last = names.len().saturating_sub(1);

    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let sep = if i < last { "," } else { "" };
            format!("        .{name}({name}){sep}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Unindented declaration block used by the wire/reg fix.
pub fn generate_corrected_declarations(iface: &InterfaceDescriptor) -> String {
    let mut lines = vec!["// DUT Inputs (use 'reg' type)".to_string()];
    for port in &iface.inputs {
        lines.push(aligned_declaration("reg", port));
    }

    lines.push("\n// DUT Outputs (use 'wire' type)".to_string());
    for port in &iface.outputs {
        lines.push(aligned_declaration("wire", port));
    }

    lines.join("\n")
}

/// Cheap structural checks on a harness before it reaches the verifier.
///
/// Returns human-readable issues; an empty list means nothing was spotted.
pub fn validate_harness(harness: &str, iface: &InterfaceDescriptor) -> Vec<String> {
    let mut issues = Vec::new();

    if !harness.contains(&format!("module {}", HARNESS_TOP)) {
        issues.push(format!("Module name is not '{}'", HARNESS_TOP));
    }

    for (_, port) in iface.ports() {
        let connection = format!(".{0}({0})", port.name);
        if !harness.contains(&connection) {
            issues.push(format!("Port '{}' not connected in instantiation", port.name));
        }
    }

    if !harness.contains("$finish") {
        issues.push("Missing $finish statement".to_string());
    }

    if !harness.contains("endmodule") {
        issues.push("Missing endmodule".to_string());
    }

    issues
}
