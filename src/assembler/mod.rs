//! The Assembler module is in charge of taking a
//! CM2 source file and producing a Vec<Instruction> from the
//! AST submodule.
//!
//! It does this in two passes over the source: the first
//! collects label addresses, the second encodes instructions
//! and resolves label operands, so forward references work.

pub mod ast;
pub mod error;
pub mod labels;
pub mod lexer;
pub mod parser;

use std::io::{self, Write};

use ast::Instruction;
use error::AsmError;
use labels::LabelTable;

/// The result of a successful assembly.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub labels: LabelTable,
}

/// Runs both passes over `source`.
pub fn assemble(source: &str) -> Result<Program, AsmError> {
    let labels = labels::build_label_table(source)?;
    info!("pass 1 found {} label(s)", labels.len());

    let instructions = parser::encode_instructions(source, &labels)?;
    info!("pass 2 encoded {} instruction(s)", instructions.len());

    Ok(Program { instructions, labels })
}

/// Writes the binary records for `instructions` to `sink`.
pub fn write_binary<W: Write + ?Sized>(sink: &mut W, instructions: &[Instruction]) -> io::Result<()> {
    for ins in instructions {
        sink.write_all(&ins.assemble())?;
    }
    sink.flush()
}
