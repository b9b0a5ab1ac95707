//! Normalized DUT interface types.

use serde::{Deserialize, Serialize};

/// Module name used when the hardware description has no module header.
pub const DEFAULT_MODULE_NAME: &str = "my_dut";

/// Port direction as declared in the hardware description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    /// Storage class a testbench must use to drive or observe this port.
    pub fn harness_storage(&self) -> &'static str {
        match self {
            Direction::Input => "reg",
            Direction::Output => "wire",
        }
    }
}

/// Packed range of a port as declared.
///
/// Literal bounds are kept as numbers. Anything else (parameters,
/// expressions) is kept as the text between the brackets, so it can be
/// repeated verbatim in harness declarations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BitRange {
    Fixed { high: u32, low: u32 },
    Symbolic { text: String },
}

impl BitRange {
    pub fn new(high: u32, low: u32) -> Self {
        BitRange::Fixed { high, low }
    }

    /// Range with non-literal bounds, e.g. `W-1:0`.
    pub fn symbolic(text: impl Into<String>) -> Self {
        BitRange::Symbolic { text: text.into() }
    }

    /// Number of bits covered, `|high - low| + 1`; `None` when the bounds
    /// are symbolic.
    ///
    /// Ascending ranges such as `[0:7]` count the same as `[7:0]`.
    pub fn bit_count(&self) -> Option<u32> {
        match self {
            BitRange::Fixed { high, low } => Some(high.abs_diff(*low) + 1),
            BitRange::Symbolic { .. } => None,
        }
    }
}

impl std::fmt::Display for BitRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BitRange::Fixed { high, low } => write!(f, "[{}:{}]", high, low),
            BitRange::Symbolic { text } => write!(f, "[{}]", text),
        }
    }
}

/// A single DUT port. Absent width means one bit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub width: Option<BitRange>,
}

impl Port {
    pub fn new(name: impl Into<String>, width: Option<BitRange>) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }

    /// Bit count of the port: 1 for a scalar, `None` for a symbolic range.
    pub fn bit_count(&self) -> Option<u32> {
        match &self.width {
            Some(range) => range.bit_count(),
            None => Some(1),
        }
    }

    /// Range text as written in a declaration, or empty for a scalar.
    pub fn range_text(&self) -> String {
        self.width
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// Interface of the module under test.
///
/// Input and output order follows declaration order in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Descriptor for a missing or header-less description.
    pub fn empty() -> Self {
        Self::new(DEFAULT_MODULE_NAME)
    }

    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// True when no ports were found.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// All ports, inputs first, each tagged with its direction.
    pub fn ports(&self) -> impl Iterator<Item = (Direction, &Port)> {
        self.inputs
            .iter()
            .map(|p| (Direction::Input, p))
            .chain(self.outputs.iter().map(|p| (Direction::Output, p)))
    }

    /// Look up a port by name in either list.
    pub fn find_port(&self, name: &str) -> Option<(Direction, &Port)> {
        self.ports().find(|(_, p)| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_port(name).is_some()
    }
}

impl Default for InterfaceDescriptor {
    fn default() -> Self {
        Self::empty()
    }
}
