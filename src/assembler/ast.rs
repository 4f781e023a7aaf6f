//! This AST describes an assembled CM2 program.
//!
//! Execution begins with the first instruction in the file.
//! Comments start with `#`, either as a whole line or trailing an instruction.
//! Labels are declared on their own line as `@name` and take the address of
//! the next instruction.
//!
//! Supported Instructions:
//!
//! ```text
//! li   rA VALUE     # rA <= VALUE
//! cp   rA rB        # rA <= rB
//! bge  rA rB @L     # jump to L if rA >= rB
//! add  rA rB rC     # rA <= rB + rC
//! sub  rA rB rC     # rA <= rB - rC
//! call rA rB @L     # call L
//! ret               # return from call
//! put  rA           # print rA
//! exit rA           # exit with status rA
//! ```
//!
//! Every instruction assembles to a 32 byte record: four little-endian
//! 64-bit words `op d0 d1 d2`, unused operands zero-filled.

use std::fmt;

/// Size of one encoded instruction record in bytes.
pub const RECORD_SIZE: usize = 32;

/// What an operand slot holds in the source text.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SlotKind {
    /// A base-10 integer, used for registers and immediate values alike.
    Literal,
    /// The name of a label, resolved to an instruction address.
    Label,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Opcode {
    Li,
    Cp,
    Bge,
    Add,
    Sub,
    Call,
    Ret,
    Put,
    Exit,
}

impl Opcode {
    pub const ALL: [Opcode; 9] = [
        Opcode::Li,
        Opcode::Cp,
        Opcode::Bge,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Call,
        Opcode::Ret,
        Opcode::Put,
        Opcode::Exit,
    ];

    /// Looks up an opcode by its mnemonic. Mnemonics are case-sensitive.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        Opcode::ALL.iter().copied().find(|op| op.mnemonic() == mnemonic)
    }

    pub fn mnemonic(&self) -> &'static str {
        use Opcode::*;
        match self {
            Li   => "li",
            Cp   => "cp",
            Bge  => "bge",
            Add  => "add",
            Sub  => "sub",
            Call => "call",
            Ret  => "ret",
            Put  => "put",
            Exit => "exit",
        }
    }

    /// Returns the numeric opcode written to the first word of a record.
    pub fn code(&self) -> u64 {
        use Opcode::*;
        match self {
            Li   => 0x0,
            Cp   => 0x1,
            Bge  => 0x2,
            Add  => 0x3,
            Sub  => 0x4,
            Call => 0x5,
            Ret  => 0x6,
            Put  => 0x7,
            Exit => 0x8,
        }
    }

    /// The kind of every operand slot, in order. Its length is the arity.
    pub fn slots(&self) -> &'static [SlotKind] {
        use Opcode::*;
        use SlotKind::*;
        match self {
            Ret                  => &[],
            Put | Exit           => &[Literal],
            Li  | Cp             => &[Literal, Literal],
            Add | Sub            => &[Literal, Literal, Literal],
            Bge | Call           => &[Literal, Literal, Label],
        }
    }

    pub fn arity(&self) -> usize {
        self.slots().len()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// A single CM2 bytecode instruction.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub op: u64,
    pub d0: u64,
    pub d1: u64,
    pub d2: u64,
}

impl Instruction {
    /// Builds an instruction from an opcode and its resolved operands.
    /// Slots past the end of `operands` are zero.
    pub fn new(opcode: Opcode, operands: &[u64]) -> Self {
        let d = |i: usize| operands.get(i).copied().unwrap_or(0);
        Instruction { op: opcode.code(), d0: d(0), d1: d(1), d2: d(2) }
    }

    /// Assembles the instruction to its 32 byte binary record.
    pub fn assemble(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.words().iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    fn words(&self) -> [u64; 4] {
        [self.op, self.d0, self.d1, self.d2]
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = Opcode::ALL
            .iter()
            .find(|op| op.code() == self.op)
            .map(|op| op.mnemonic())
            .unwrap_or("???");
        write!(f, "{} {} {} {}", name, self.d0, self.d1, self.d2)
    }
}
