use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsmError {
    #[error("Invalid syntax: {0}")]
    Syntax(String),

    #[error("Symbol redeclaration not allowed: `{0}`")]
    SymbolRedeclaration(String),

    #[error("Instruction doesn't exist: `{0}`")]
    UnknownInstruction(String),

    #[error("Instruction `{0}` has a fixed operand size")]
    FixedSizeViolation(String),

    #[error("Align number must be a power of two, got {0}")]
    BadAlignment(i64),

    #[error("Invalid register: `{0}`")]
    BadRegister(String),

    #[error("Overflow: {value} is wider than the {width} byte stream")]
    StreamOverflow { value: i64, width: usize },

    #[error("Internal error: {0}")]
    Internal(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An assembly error pinned to the source line it came from.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct LineError {
    pub error: AsmError,
    pub line_num: usize,
    pub line: String,
}

impl AsmError {
    pub fn at(self, line_num: usize, line: &str) -> LineError {
        LineError {
            error: self,
            line_num,
            line: line.to_string(),
        }
    }
}
