//! The pattern-driven line parser.
//!
//! A [`Parser`] is a declarative node: an ordered regex list, a flag
//! word it contributes on match, and callback regions of sub-parsers
//! that consume the unmatched suffix. The top-level cascade is a
//! fixed ordered node list, compiled once.

use arch::flag::{self, Flags};
use arch::op;
use once_cell::sync::Lazy;
use regex::Regex;

/// One parsed statement: the accumulated flag word and the captured
/// tokens. On success the last element of `values` is the unparsed
/// suffix of the line until the caller strips it.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub flags: Flags,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Settings {
    /// Re-invoke the node on its own suffix and merge the captures.
    recursive: bool,
    /// On match, suppress the enclosing node's own flag contribution.
    overriding: bool,
}

#[derive(Debug)]
pub struct Parser {
    flags: Flags,
    regexes: Vec<Regex>,
    callbacks: Vec<Vec<Parser>>,
    settings: Settings,
}

impl Parser {
    fn new(flags: Flags, patterns: &[&str]) -> Self {
        let regexes = patterns
            .iter()
            .map(|pat| Regex::new(pat).expect("parser regex must compile"))
            .collect();
        Parser {
            flags,
            regexes,
            callbacks: Vec::new(),
            settings: Settings::default(),
        }
    }

    fn region(mut self, callbacks: Vec<Parser>) -> Self {
        self.callbacks.push(callbacks);
        self
    }

    fn recursive(mut self) -> Self {
        self.settings.recursive = true;
        self
    }

    fn overriding(mut self) -> Self {
        self.settings.overriding = true;
        self
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Tries the node's regexes in order against the start of `line`.
    /// The first match wins: capture groups become values, the rest of
    /// the line is appended as the trailing suffix, then the recursive
    /// setting and the callback regions are applied to that suffix.
    /// Without a match the result carries no flags and the whole line.
    pub fn parse(&self, line: &str) -> Parsed {
        for regex in &self.regexes {
            let caps = match regex.captures(line) {
                Some(caps) => caps,
                None => continue,
            };

            let mut values: Vec<String> = Vec::new();
            for idx in 1..caps.len() {
                values.push(caps.get(idx).map_or("", |m| m.as_str()).to_string());
            }
            let end = caps.get(0).map_or(0, |m| m.end());
            values.push(line[end..].to_string());

            let mut own = self.flags;
            let mut acc = flag::SUCCESS;

            if self.settings.recursive {
                let suffix = values.pop().unwrap_or_default();
                // A failed sub-parse returns the suffix untouched, so
                // merging is unconditional.
                values.extend(self.parse(&suffix).values);
            }

            for region in &self.callbacks {
                let suffix = values.pop().unwrap_or_default();
                let mut consumed = false;
                for callback in region {
                    let sub = callback.parse(&suffix);
                    if sub.flags & flag::SUCCESS != 0 {
                        if callback.settings.overriding {
                            own = 0;
                        }
                        acc |= sub.flags;
                        values.extend(sub.values);
                        consumed = true;
                        break;
                    }
                }
                if !consumed {
                    values.push(suffix);
                }
            }

            return Parsed {
                flags: own | acc,
                values,
            };
        }

        Parsed {
            flags: 0,
            values: vec![line.to_string()],
        }
    }
}

fn numchar_list() -> Parser {
    Parser::new(
        0,
        &[
            r"^\s*,?\s*(\d+)",
            r"^\s*,?\s*'(\\\w)'",
            r"^\s*,?\s*'(\w)'",
        ],
    )
    .recursive()
}

fn name_list() -> Parser {
    Parser::new(0, &[r"^\s*,?\s*(\w+)"]).recursive()
}

fn reduced_mark(n: usize) -> Vec<Parser> {
    vec![Parser::new(flag::reduced(n), &[r"(?i)^(l|h)"])]
}

/// Trailing `[disp]` rewrites the register mode, so ORing the plain
/// register flags on top would fabricate a third mode. Hence OVERRIDE.
fn displacement(n: usize) -> Vec<Parser> {
    vec![
        Parser::new(flag::regind16(n), &[r"^\s*\[(\d+)\]"]).overriding(),
        Parser::new(flag::regind16(n) | flag::symabs(n), &[r"^\s*\[(\w+)\]"]).overriding(),
    ]
}

fn operand(n: usize) -> Vec<Parser> {
    let regdir = Parser::new(
        flag::regdir(n),
        &[
            r"(?i)^\s*r([0-7])",
            r"(?i)^\s*(ax)",
            r"(?i)^\s*(sp)",
            r"(?i)^\s*(bp)",
            r"(?i)^\s*(pc)",
        ],
    )
    .region(reduced_mark(n))
    .region(displacement(n));

    let regind = Parser::new(
        flag::regind(n),
        &[
            r"(?i)^\s*\[\s*r([0-7])\s*\]",
            r"(?i)^\s*\[\s*(ax)\s*\]",
            r"(?i)^\s*\[\s*(sp)\s*\]",
            r"(?i)^\s*\[\s*(bp)\s*\]",
            r"(?i)^\s*\[\s*(pc)\s*\]",
        ],
    )
    .region(displacement(n));

    vec![
        regdir,
        regind,
        Parser::new(flag::mem(n), &[r"^\s*\*(\d+)"]),
        Parser::new(
            flag::immed(n),
            &[r"^\s*(\d+)", r"^\s*'(\\\w)'", r"^\s*'(\w)'"],
        ),
        Parser::new(flag::immed(n) | flag::symabs(n), &[r"^\s*(\w+)"]),
        Parser::new(flag::immed(n) | flag::symrel(n), &[r"^\s*\$(\w+)"]),
        Parser::new(flag::immed(n) | flag::symadr(n), &[r"^\s*&(\w+)"]),
    ]
}

fn instruction() -> Parser {
    let mnemonics = format!(r"(?i)^\s*({})", op::mnemonic_alternation());
    Parser::new(flag::INSTRUCTION, &[mnemonics.as_str()])
        // The `w` suffix deliberately captures nothing: operand tokens
        // keep their positions in `values`.
        .region(vec![Parser::new(flag::EXTENDED, &[r"(?i)^w"])])
        .region(operand(1))
        .region(vec![Parser::new(0, &[r"^\s*,"])])
        .region(operand(2))
}

static PARSERS: Lazy<Vec<Parser>> = Lazy::new(|| {
    vec![
        Parser::new(flag::LABEL, &[r"^\s*(\w+):"]),
        Parser::new(flag::ALLOC, &[r"^\s*\.(byte|word|dword)"]).region(vec![numchar_list()]),
        Parser::new(flag::ALIGN, &[r"^\s*\.align\s*(\d+)"])
            .region(vec![Parser::new(0, &[r"^\s*,\s*(\d+)"])]),
        Parser::new(flag::SKIP, &[r"^\s*\.skip\s*(\d+)"])
            .region(vec![Parser::new(0, &[r"^\s*,\s*(\d+)"])]),
        Parser::new(
            flag::SECTION,
            &[r#"^\s*\.section\s*"\.(\w+)""#, r"^\s*\.(data|text|bss)"],
        ),
        Parser::new(flag::RELOC, &[r"^\s*\.(global|globl|extern)"]).region(vec![name_list()]),
        Parser::new(flag::EQU, &[r"^\s*\.equ\s*(\w+),\s*(\d+)"]),
        instruction(),
        Parser::new(flag::END, &[r"^\s*\.end"]),
    ]
});

/// The top-level parser cascade, in match order.
pub fn parsers() -> &'static [Parser] {
    &PARSERS
}

/// The first cascade node advertising `kind`, for direct node tests.
pub fn parser_for(kind: Flags) -> Option<&'static Parser> {
    parsers().iter().find(|parser| parser.flags & kind != 0)
}
