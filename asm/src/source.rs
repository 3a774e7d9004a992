//! Line-by-line source walker. Each non-empty line is run through the
//! parser cascade and tagged with the section it falls in.

use crate::error::{AsmError, LineError};
use crate::parser::{self, Parsed};
use arch::flag;
use std::io::BufRead;

/// Section every line belongs to until a section directive appears.
pub const INITIAL_SECTION: &str = "UND";

#[derive(Debug, Clone)]
pub struct Context {
    pub section: String,
    pub data: Vec<Parsed>,
    pub line_num: usize,
    pub line: String,
}

pub struct SourceIterator<R: BufRead> {
    lines: std::io::Lines<R>,
    section: String,
    line_num: usize,
}

impl<R: BufRead> SourceIterator<R> {
    pub fn new(reader: R) -> Self {
        SourceIterator {
            lines: reader.lines(),
            section: INITIAL_SECTION.to_string(),
            line_num: 0,
        }
    }
}

impl<R: BufRead> Iterator for SourceIterator<R> {
    type Item = Result<Context, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(AsmError::Io(err).at(self.line_num + 1, ""))),
            };
            self.line_num += 1;

            let mut rest = line.clone();
            let mut data = Vec::new();
            for node in parser::parsers() {
                let mut parsed = node.parse(&rest);
                if parsed.flags & flag::SUCCESS == 0 {
                    continue;
                }
                // The trailing element is the unparsed suffix; the
                // cascade continues on it.
                rest = parsed.values.pop().unwrap_or_default();
                if parsed.flags & flag::SECTION != 0 {
                    self.section = parsed.values[0].clone();
                }
                let is_label = parsed.flags & flag::LABEL != 0;
                data.push(parsed);
                // A label may share its line with one more statement;
                // anything else ends the line.
                if !is_label {
                    break;
                }
            }

            if !rest.trim().is_empty() {
                let err = AsmError::Syntax(format!(
                    "complete line was not processed, leftover: `{}`",
                    rest.trim()
                ));
                return Some(Err(err.at(self.line_num, &line)));
            }
            if !data.is_empty() {
                return Some(Ok(Context {
                    section: self.section.clone(),
                    data,
                    line_num: self.line_num,
                    line,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn contexts(src: &str) -> Vec<Context> {
        SourceIterator::new(Cursor::new(src.to_string()))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn empty_and_blank_lines_are_skipped() {
        let got = contexts("\n   \n.text\n\nhalt\n");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].line_num, 3);
        assert_eq!(got[1].line_num, 5);
    }

    #[test]
    fn section_tags_following_lines() {
        let got = contexts(".text\nhalt\n.data\n.byte 1\n");
        assert_eq!(got[0].section, "text");
        assert_eq!(got[1].section, "text");
        assert_eq!(got[2].section, "data");
        assert_eq!(got[3].section, "data");
    }

    #[test]
    fn lines_before_any_section_are_und() {
        let got = contexts("start:\n");
        assert_eq!(got[0].section, INITIAL_SECTION);
    }

    #[test]
    fn label_shares_line_with_instruction() {
        let got = contexts("label1: mov ax, bp\n");
        assert_eq!(got.len(), 1);
        let data = &got[0].data;
        assert_eq!(data.len(), 2);
        assert!(data[0].flags & flag::LABEL != 0);
        assert_eq!(data[0].values[0], "label1");
        assert!(data[1].flags & flag::INSTRUCTION != 0);
        assert_eq!(data[1].values, ["mov", "ax", "bp"]);
    }

    #[test]
    fn residue_is_a_syntax_error() {
        let mut iter = SourceIterator::new(Cursor::new("mov ax, bp garbage ###\n".to_string()));
        assert!(iter.next().unwrap().is_err());
    }
}
