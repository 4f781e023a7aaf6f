//! Errors raised while assembling CM2 source.
//!
//! Every error is fatal. Line numbers are 1-based source line numbers.
use thiserror::Error;

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum AsmError {
    #[error("malformed instruction on line {line}: expected an opcode and 0 to 3 operands, found {found} token(s)")]
    MalformedInstruction { line: usize, found: usize },

    #[error("unknown opcode on line {line}: `{mnemonic}`")]
    UnknownOpcode { line: usize, mnemonic: String },

    #[error("wrong number of operands on line {line}: instruction `{mnemonic}` expects {expected}, found {found}")]
    ArityMismatch {
        line: usize,
        mnemonic: String,
        expected: usize,
        found: usize,
    },

    #[error("unresolved label on line {line}: `{label}`")]
    UnresolvedLabel { line: usize, label: String },

    #[error("malformed operand on line {line}: `{operand}` is not a base-10 integer")]
    MalformedOperand { line: usize, operand: String },

    #[error("malformed label on line {line}: `{text}`")]
    MalformedLabel { line: usize, text: String },

    #[error("duplicate label on line {line}: `{label}` was already defined on line {first}")]
    DuplicateLabel {
        line: usize,
        label: String,
        first: usize,
    },
}

impl AsmError {
    /// The source line the error points at.
    pub fn line(&self) -> usize {
        use AsmError::*;
        match self {
            MalformedInstruction { line, .. }
            | UnknownOpcode { line, .. }
            | ArityMismatch { line, .. }
            | UnresolvedLabel { line, .. }
            | MalformedOperand { line, .. }
            | MalformedLabel { line, .. }
            | DuplicateLabel { line, .. } => *line,
        }
    }
}
