//! Prompt construction for harness generation.
//!
//! The first attempt gets the base rules plus one worked example chosen from
//! the DUT's features. Retries drop the example and carry targeted fixes for
//! the previous failure instead.

pub mod examples;

use std::collections::BTreeMap;

use crate::codegen::{format_port_info, generate_connections, generate_signal_declarations};
use crate::domain::{Check, InterfaceDescriptor, PromptRecord, PromptStrategy};
use crate::features::classify_features;
use crate::feedback::render_template;

pub use examples::{
    examples_for_category, select_example, ExampleCategory, ExampleSelection, FewShotExample,
};

/// Base rules for every generation call.
pub const SYSTEM_PROMPT: &str = "\
You are a Verilog testbench code generator. You ONLY output valid SystemVerilog code.

CRITICAL RULES (MUST FOLLOW):
1. Module name is ALWAYS: tb_top
2. For DUT inputs: use 'reg' type
3. For DUT outputs: use 'wire' type
4. CONNECT ALL PORTS: every single port must be connected
5. Match bit widths exactly as specified
6. No explanations and no markdown
7. Start with: module tb_top;
8. End with: endmodule

VERILATOR COMPLIANCE:
- Use `initial` blocks for test sequences
- Use `always` blocks only for clock generation
- Declare ALL signals before use
- Include $finish to end simulation";

const EXAMPLES_HEADER: &str = "\n\nLEARN FROM THESE EXAMPLES:\n";

const FIRST_TEMPLATE: &str = "\
DUT SPECIFICATION:
{port_info}

Required Signal Declarations (COPY THIS EXACTLY):
{signal_declarations}

Required Instantiation (COPY THIS EXACTLY):
{module_name} dut (
{port_connections}
);

Test Description:
{user_request}

INSTRUCTIONS:
1. Copy the signal declarations above exactly
2. Copy the instantiation above exactly
3. If there is a 'clk' port, generate a clock: initial clk=0; always #5 clk=~clk;
4. If there is a 'rst' port, pulse it first: initial begin rst=1; #20; rst=0; ... end
5. Add test logic for the description
6. End the test with $finish

Output ONLY the complete testbench code.";

const REFINED_TEMPLATE: &str = "\
PREVIOUS ATTEMPT FAILED at step: {failing_step}

ERROR DETAILS:
{error_summary}

SPECIFIC FIXES REQUIRED:
{targeted_fixes}

DUT SPECIFICATION (UNCHANGED):
{port_info}

CORRECT Signal Declarations (USE EXACTLY):
{signal_declarations}

CORRECT Instantiation (USE EXACTLY):
{module_name} dut (
{port_connections}
);

Test Description (same as before):
{user_request}

STEP-BY-STEP FIX:
1. Start with: module tb_top;
2. Copy the signal declarations above
3. Copy the DUT instantiation above without skipping any port
4. Add clock and reset handling if needed
5. Add test logic
6. Add $finish
7. End with: endmodule

Output ONLY the corrected testbench code.";

/// System prompt with an optional examples section appended.
pub fn system_prompt_with_examples(examples: &str) -> String {
    if examples.is_empty() {
        SYSTEM_PROMPT.to_string()
    } else {
        format!("{}{}{}", SYSTEM_PROMPT, EXAMPLES_HEADER, examples)
    }
}

fn interface_slots(iface: &InterfaceDescriptor, intent: &str) -> BTreeMap<&'static str, String> {
    let mut slots = BTreeMap::new();
    slots.insert("port_info", format_port_info(iface));
    slots.insert("signal_declarations", generate_signal_declarations(iface));
    slots.insert("module_name", iface.name.clone());
    slots.insert("port_connections", generate_connections(iface));
    slots.insert("user_request", intent.to_string());
    slots
}

fn into_record(
    strategy: PromptStrategy,
    system: String,
    template: &str,
    slots: BTreeMap<&str, String>,
) -> PromptRecord {
    let user = render_template(template, &slots);
    PromptRecord {
        strategy,
        system,
        user,
        slots: slots
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    }
}

/// Prompt for the first attempt: rules, few-shot examples, the interface.
pub fn build_first_prompt(
    iface: &InterfaceDescriptor,
    intent: &str,
    examples: ExampleSelection,
) -> PromptRecord {
    let system = system_prompt_with_examples(&examples.render(&classify_features(iface)));
    into_record(
        PromptStrategy::FewShot,
        system,
        FIRST_TEMPLATE,
        interface_slots(iface, intent),
    )
}

/// Prompt for a retry after a failed verification.
pub fn build_refined_prompt(
    iface: &InterfaceDescriptor,
    intent: &str,
    failing_step: Check,
    error_summary: &str,
    targeted_fixes: &str,
) -> PromptRecord {
    let mut slots = interface_slots(iface, intent);
    slots.insert("failing_step", failing_step.name().to_string());
    slots.insert("error_summary", error_summary.to_string());
    slots.insert("targeted_fixes", targeted_fixes.to_string());
    into_record(
        PromptStrategy::TargetedFeedback,
        SYSTEM_PROMPT.to_string(),
        REFINED_TEMPLATE,
        slots,
    )
}
