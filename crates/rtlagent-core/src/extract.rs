//! DUT interface extraction.
//!
//! A small tokenizer plus a declaration parser over the grammar
//!
//! ```text
//! decl  := direction type* range? ident ("," ident)*
//! type  := wire | reg | logic | tri | var | signed | unsigned
//! range := "[" number ":" number "]" | "[" expr "]"
//! ```
//!
//! `function` and `task` bodies are skipped; their `input`/`output` items are
//! arguments, not ports.
//!
//! Both ANSI headers (`module m(input wire a, ...)`) and body declarations
//! (`input [7:0] a;`) go through the same rule, so a ranged declaration can
//! never also be picked up as a scalar one. Only the first module in the text
//! is considered.

use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{BitRange, Direction, InterfaceDescriptor, Port, DEFAULT_MODULE_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Number(String),
    Punct(char),
}

impl Token {
    fn text(&self) -> String {
        match self {
            Token::Ident(s) | Token::Number(s) => s.clone(),
            Token::Punct(c) => c.to_string(),
        }
    }

    fn is_ident(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s == word)
    }

    fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct(p) if *p == c)
    }
}

const TYPE_WORDS: &[&str] = &["wire", "reg", "logic", "tri", "var", "signed", "unsigned"];

const KEYWORDS: &[&str] = &[
    "module",
    "endmodule",
    "input",
    "output",
    "inout",
    "wire",
    "reg",
    "logic",
    "tri",
    "var",
    "signed",
    "unsigned",
    "parameter",
    "localparam",
    "assign",
    "always",
    "initial",
    "begin",
    "end",
    "function",
    "endfunction",
    "task",
    "endtask",
];

/// Subroutine blocks whose declarations are arguments, not ports.
const SUBROUTINES: &[(&str, &str)] = &[("function", "endfunction"), ("task", "endtask")];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

fn tokenize(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && chars.get(i + 1) == Some(&'*') {
            i += 2;
            while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                i += 1;
            }
            i += 2;
        } else if c == '"' {
            i += 1;
            while i < chars.len() && chars[i] != '"' {
                if chars[i] == '\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
        } else if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
                i += 1;
            }
            let digits: String = chars[start..i].iter().filter(|c| **c != '_').collect();
            tokens.push(Token::Number(digits));
        } else {
            tokens.push(Token::Punct(c));
            i += 1;
        }
    }

    tokens
}

struct DeclParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    iface: InterfaceDescriptor,
}

impl<'a> DeclParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    fn run(mut self) -> InterfaceDescriptor {
        while let Some(tok) = self.peek() {
            self.pos += 1;
            match tok {
                Token::Ident(w) if w == "input" => self.declaration(Some(Direction::Input)),
                Token::Ident(w) if w == "output" => self.declaration(Some(Direction::Output)),
                Token::Ident(w) if w == "inout" => self.declaration(None),
                Token::Ident(w) => {
                    let block = SUBROUTINES.iter().find(|(start, _)| *start == w.as_str());
                    if let Some((_, end)) = block {
                        self.skip_until(end);
                    }
                }
                _ => {}
            }
        }
        self.iface
    }

    /// Parse one declaration after its direction keyword. `None` parses and
    /// drops the names (bidirectional ports are not tracked).
    fn declaration(&mut self, direction: Option<Direction>) {
        while matches!(self.peek(), Some(Token::Ident(w)) if TYPE_WORDS.contains(&w.as_str())) {
            self.pos += 1;
        }

        let width = if self.peek().is_some_and(|t| t.is_punct('[')) {
            self.range()
        } else {
            None
        };

        loop {
            let name = match self.peek() {
                Some(Token::Ident(name)) if !is_keyword(name) => name.clone(),
                _ => return,
            };
            self.pos += 1;

            // unpacked dimensions after the name
            while self.peek().is_some_and(|t| t.is_punct('[')) {
                self.skip_brackets();
            }

            if let Some(direction) = direction {
                self.add_port(direction, Port::new(name, width.clone()));
            }

            let continues = self.peek().is_some_and(|t| t.is_punct(','))
                && matches!(self.peek_at(1), Some(Token::Ident(next)) if !is_keyword(next));
            if !continues {
                return;
            }
            self.pos += 1;
        }
    }

    /// Parse `[high:low]`. Non-literal bounds are kept as text.
    fn range(&mut self) -> Option<BitRange> {
        let open = self.pos;
        self.skip_brackets();
        let close = if self.pos > open + 1 && self.tokens[self.pos - 1].is_punct(']') {
            self.pos - 1
        } else {
            self.pos
        };
        let inner = self.tokens.get(open + 1..close).unwrap_or(&[]);

        if let [Token::Number(high), Token::Punct(':'), Token::Number(low)] = inner {
            if let (Ok(h), Ok(l)) = (high.parse::<u32>(), low.parse::<u32>()) {
                return Some(BitRange::new(h, l));
            }
        }

        if inner.is_empty() {
            return None;
        }
        let text: String = inner.iter().map(Token::text).collect();
        debug!(range = %text, "non-literal bit range, keeping text");
        Some(BitRange::symbolic(text))
    }

    /// Advance past the next `end` keyword.
    fn skip_until(&mut self, end: &str) {
        while let Some(tok) = self.peek() {
            self.pos += 1;
            if tok.is_ident(end) {
                return;
            }
        }
    }

    fn skip_brackets(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            self.pos += 1;
            if tok.is_punct('[') {
                depth += 1;
            } else if tok.is_punct(']') {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    fn add_port(&mut self, direction: Direction, port: Port) {
        if let Some((existing, _)) = self.iface.find_port(&port.name) {
            if existing != direction {
                warn!(
                    port = %port.name,
                    "port declared as both input and output; keeping first declaration"
                );
            }
            return;
        }
        match direction {
            Direction::Input => self.iface.inputs.push(port),
            Direction::Output => self.iface.outputs.push(port),
        }
    }
}

/// Extract the interface of the first module in `source`.
///
/// Text without a module header yields [`InterfaceDescriptor::empty`].
pub fn extract_interface(source: &str) -> InterfaceDescriptor {
    let tokens = tokenize(source);

    let Some(start) = tokens.iter().position(|t| t.is_ident("module")) else {
        debug!("no module header found; using empty interface");
        return InterfaceDescriptor::empty();
    };

    let name = match tokens.get(start + 1) {
        Some(Token::Ident(name)) if !is_keyword(name) => name.clone(),
        _ => DEFAULT_MODULE_NAME.to_string(),
    };

    let end = tokens[start..]
        .iter()
        .position(|t| t.is_ident("endmodule"))
        .map(|offset| start + offset)
        .unwrap_or(tokens.len());

    let body = tokens.get(start + 2..end).unwrap_or(&[]);
    DeclParser {
        tokens: body,
        pos: 0,
        iface: InterfaceDescriptor::new(name),
    }
    .run()
}

/// Extract the interface from a file. A missing or unreadable file yields
/// the empty interface so callers can proceed before the DUT exists.
pub fn extract_interface_from_path(path: &Path) -> InterfaceDescriptor {
    match std::fs::read_to_string(path) {
        Ok(source) => extract_interface(&source),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "DUT not readable; using empty interface");
            InterfaceDescriptor::empty()
        }
    }
}
