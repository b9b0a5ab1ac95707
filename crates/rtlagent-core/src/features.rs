//! Coarse semantic flags derived from a DUT interface.

use serde::{Deserialize, Serialize};

use crate::domain::InterfaceDescriptor;

const CLOCK_ALIASES: &[&str] = &["clk", "clock"];
const RESET_ALIASES: &[&str] = &["rst", "reset"];

/// Flags used to pick examples and shape prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub has_clock: bool,
    pub has_reset: bool,
    pub has_multibit: bool,
    /// Largest `|high - low| + 1` over ports with literal ranges; 0 when
    /// none. Symbolic ranges set `has_multibit` but add no width.
    pub max_width: u32,
    pub input_count: usize,
    pub output_count: usize,
}

impl FeatureFlags {
    /// Whether the DUT looks sequential (has a clock input).
    pub fn is_sequential(&self) -> bool {
        self.has_clock
    }
}

fn matches_alias(name: &str, aliases: &[&str]) -> bool {
    aliases.iter().any(|a| name.eq_ignore_ascii_case(a))
}

/// Derive feature flags. Clock and reset are only looked for among inputs.
pub fn classify_features(iface: &InterfaceDescriptor) -> FeatureFlags {
    let has_clock = iface
        .inputs
        .iter()
        .any(|p| matches_alias(&p.name, CLOCK_ALIASES));
    let has_reset = iface
        .inputs
        .iter()
        .any(|p| matches_alias(&p.name, RESET_ALIASES));

    let (has_multibit, max_width) = iface
        .ports()
        .filter_map(|(_, p)| p.width.as_ref())
        .fold((false, 0u32), |(_, max), w| {
            (true, max.max(w.bit_count().unwrap_or(0)))
        });

    FeatureFlags {
        has_clock,
        has_reset,
        has_multibit,
        max_width,
        input_count: iface.inputs.len(),
        output_count: iface.outputs.len(),
    }
}
