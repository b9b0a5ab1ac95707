//! Few-shot harness catalogue.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::RtlAgentError;
use crate::features::FeatureFlags;

/// One worked example: a DUT port list and a harness that verifies cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FewShotExample {
    pub title: &'static str,
    pub ports: &'static [&'static str],
    pub harness: &'static str,
}

impl FewShotExample {
    /// Text block appended to the system prompt.
    pub fn render(&self) -> String {
        let ports: Vec<String> = self.ports.iter().map(|p| format!("  {}", p)).collect();
        format!(
            "EXAMPLE: {}\nDUT Ports:\n{}\n\nCorrect Testbench:\n{}",
            self.title,
            ports.join("\n"),
            self.harness
        )
    }
}

pub const COMBINATIONAL_2INPUT: FewShotExample = FewShotExample {
    title: "Two-input combinational logic",
    ports: &["input wire a", "input wire b", "output wire y"],
    harness: "\
module tb_top;
    reg a, b;
    wire y;

    my_dut dut(.a(a), .b(b), .y(y));

    initial begin
        a=0; b=0; #10;
        a=0; b=1; #10;
        a=1; b=0; #10;
        a=1; b=1; #10;
        $finish;
    end
endmodule",
};

pub const MULTIBIT_COMBINATIONAL: FewShotExample = FewShotExample {
    title: "Multi-bit combinational logic",
    ports: &[
        "input wire [7:0] a",
        "input wire [7:0] b",
        "output wire [7:0] sum",
        "output wire carry",
    ],
    harness: "\
module tb_top;
    reg [7:0] a, b;
    wire [7:0] sum;
    wire carry;

    my_dut dut(.a(a), .b(b), .sum(sum), .carry(carry));

    initial begin
        a=8'd5;   b=8'd3;   #10;
        a=8'd255; b=8'd1;   #10;
        a=8'd128; b=8'd128; #10;
        $finish;
    end
endmodule",
};

pub const SIMPLE_SEQUENTIAL: FewShotExample = FewShotExample {
    title: "Clocked logic without reset",
    ports: &["input wire clk", "input wire d", "output reg q"],
    harness: "\
module tb_top;
    reg clk, d;
    wire q;

    my_dut dut(.clk(clk), .d(d), .q(q));

    initial clk = 0;
    always #5 clk = ~clk;

    initial begin
        d=0; #10;
        d=1; #10;
        d=0; #10;
        $finish;
    end
endmodule",
};

pub const WITH_RESET: FewShotExample = FewShotExample {
    title: "Clocked logic with reset",
    ports: &[
        "input wire clk",
        "input wire rst",
        "input wire [7:0] data",
        "output reg [7:0] out",
    ],
    harness: "\
module tb_top;
    reg clk, rst;
    reg [7:0] data;
    wire [7:0] out;

    my_dut dut(.clk(clk), .rst(rst), .data(data), .out(out));

    initial clk = 0;
    always #5 clk = ~clk;

    initial begin
        rst=1; data=0; #20;
        rst=0; data=8'hAA; #50;
        data=8'h55; #50;
        $finish;
    end
endmodule",
};

pub const COUNTER: FewShotExample = FewShotExample {
    title: "Counter with enable",
    ports: &[
        "input wire clk",
        "input wire rst",
        "input wire en",
        "output reg [3:0] count",
    ],
    harness: "\
module tb_top;
    reg clk, rst, en;
    wire [3:0] count;

    my_dut dut(.clk(clk), .rst(rst), .en(en), .count(count));

    initial clk = 0;
    always #5 clk = ~clk;

    initial begin
        rst=1; en=0; #20;
        rst=0; en=1; #100;
        en=0; #50;
        $finish;
    end
endmodule",
};

pub const SHIFT_REGISTER: FewShotExample = FewShotExample {
    title: "Serial-in shift register",
    ports: &[
        "input wire clk",
        "input wire rst",
        "input wire din",
        "output reg [7:0] dout",
    ],
    harness: "\
module tb_top;
    reg clk, rst, din;
    wire [7:0] dout;

    my_dut dut(.clk(clk), .rst(rst), .din(din), .dout(dout));

    initial clk = 0;
    always #5 clk = ~clk;

    initial begin
        rst=1; din=0; #20;
        rst=0;
        din=1; #10;
        din=0; #10;
        din=1; #10;
        #100;
        $finish;
    end
endmodule",
};

pub const FSM: FewShotExample = FewShotExample {
    title: "Start/busy/done state machine",
    ports: &[
        "input wire clk",
        "input wire rst",
        "input wire start",
        "output reg busy",
        "output reg done",
    ],
    harness: "\
module tb_top;
    reg clk, rst, start;
    wire busy, done;

    my_dut dut(.clk(clk), .rst(rst), .start(start), .busy(busy), .done(done));

    initial clk = 0;
    always #5 clk = ~clk;

    initial begin
        rst=1; start=0; #20;
        rst=0; #10;
        start=1; #10;
        start=0;
        wait(done);
        #20;
        $finish;
    end
endmodule",
};

/// Named groups of examples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleCategory {
    Combinational,
    Sequential,
    Complex,
    #[default]
    All,
}

impl ExampleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExampleCategory::Combinational => "combinational",
            ExampleCategory::Sequential => "sequential",
            ExampleCategory::Complex => "complex",
            ExampleCategory::All => "all",
        }
    }

    pub fn examples(&self) -> &'static [FewShotExample] {
        match self {
            ExampleCategory::Combinational => &[COMBINATIONAL_2INPUT, MULTIBIT_COMBINATIONAL],
            ExampleCategory::Sequential => &[SIMPLE_SEQUENTIAL, WITH_RESET, COUNTER],
            ExampleCategory::Complex => &[SHIFT_REGISTER, FSM],
            ExampleCategory::All => &[COMBINATIONAL_2INPUT, WITH_RESET],
        }
    }
}

impl FromStr for ExampleCategory {
    type Err = RtlAgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combinational" => Ok(ExampleCategory::Combinational),
            "sequential" => Ok(ExampleCategory::Sequential),
            "complex" => Ok(ExampleCategory::Complex),
            "all" => Ok(ExampleCategory::All),
            other => Err(RtlAgentError::InvalidCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for ExampleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which few-shot examples the first prompt carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExampleSelection {
    /// One example matched to the DUT's features.
    #[default]
    Auto,
    /// Up to `max` examples from a fixed category.
    Category { category: ExampleCategory, max: usize },
}

impl ExampleSelection {
    /// Rendered examples block for a DUT with these features.
    pub fn render(&self, features: &FeatureFlags) -> String {
        match self {
            ExampleSelection::Auto => select_example(features).render(),
            ExampleSelection::Category { category, max } => {
                examples_for_category(*category, *max)
            }
        }
    }
}

/// Up to `max` examples of a category, rendered and joined.
pub fn examples_for_category(category: ExampleCategory, max: usize) -> String {
    category
        .examples()
        .iter()
        .take(max)
        .map(FewShotExample::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The single most relevant example for a DUT's features.
pub fn select_example(features: &FeatureFlags) -> &'static FewShotExample {
    if features.has_clock && features.has_reset {
        &WITH_RESET
    } else if features.has_clock {
        &SIMPLE_SEQUENTIAL
    } else if features.has_multibit {
        &MULTIBIT_COMBINATIONAL
    } else {
        &COMBINATIONAL_2INPUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(has_clock: bool, has_reset: bool, has_multibit: bool) -> FeatureFlags {
        FeatureFlags {
            has_clock,
            has_reset,
            has_multibit,
            ..FeatureFlags::default()
        }
    }

    #[test]
    fn test_selection_by_features() {
        assert_eq!(*select_example(&flags(true, true, true)), WITH_RESET);
        assert_eq!(*select_example(&flags(true, false, true)), SIMPLE_SEQUENTIAL);
        assert_eq!(*select_example(&flags(false, false, true)), MULTIBIT_COMBINATIONAL);
        assert_eq!(*select_example(&flags(false, true, false)), COMBINATIONAL_2INPUT);
    }

    #[test]
    fn test_every_example_is_a_tb_top_harness() {
        for category in [
            ExampleCategory::Combinational,
            ExampleCategory::Sequential,
            ExampleCategory::Complex,
        ] {
            for example in category.examples() {
                assert!(example.harness.starts_with("module tb_top;"), "{}", example.title);
                assert!(example.harness.contains("$finish"), "{}", example.title);
                assert!(example.harness.ends_with("endmodule"), "{}", example.title);
            }
        }
    }

    #[test]
    fn test_category_limit_and_parse() {
        let text = examples_for_category(ExampleCategory::Sequential, 2);
        assert_eq!(text.matches("EXAMPLE:").count(), 2);
        assert_eq!("Complex".parse::<ExampleCategory>().unwrap(), ExampleCategory::Complex);
        assert!("bogus".parse::<ExampleCategory>().is_err());
    }

    #[test]
    fn test_selection_render() {
        let sequential = flags(true, false, false);
        assert_eq!(
            ExampleSelection::Auto.render(&sequential),
            SIMPLE_SEQUENTIAL.render()
        );

        let fixed = ExampleSelection::Category {
            category: ExampleCategory::Complex,
            max: 5,
        };
        let text = fixed.render(&sequential);
        assert_eq!(text.matches("EXAMPLE:").count(), 2);
        assert!(text.contains(FSM.title));
        assert!(!text.contains(SIMPLE_SEQUENTIAL.title));
    }

    #[test]
    fn test_render_lists_ports() {
        let text = WITH_RESET.render();
        assert!(text.starts_with("EXAMPLE: Clocked logic with reset"));
        assert!(text.contains("  input wire [7:0] data"));
        assert!(text.contains("Correct Testbench:\nmodule tb_top;"));
    }
}
