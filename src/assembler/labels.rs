//! Pass 1: find every label and the address of the instruction that follows it.
use std::collections::HashMap;

use super::error::AsmError;
use super::lexer::{self, SourceLine};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
struct Definition {
    address: u64,
    line: usize,
}

/// Maps label names to instruction addresses. Read-only once built.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct LabelTable {
    labels: HashMap<String, Definition>,
}

impl LabelTable {
    pub fn get(&self, name: &str) -> Option<u64> {
        self.labels.get(name).map(|d| d.address)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels ordered by address, then by name.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut out: Vec<(&str, u64)> = self
            .labels
            .iter()
            .map(|(name, d)| (name.as_str(), d.address))
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        out
    }

    fn define(&mut self, name: &str, address: u64, line: usize) -> Result<(), AsmError> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(AsmError::MalformedLabel { line, text: name.to_string() });
        }
        if let Some(prev) = self.labels.get(name) {
            return Err(AsmError::DuplicateLabel {
                line,
                label: name.to_string(),
                first: prev.line,
            });
        }
        self.labels.insert(name.to_string(), Definition { address, line });
        Ok(())
    }
}

/// Scans the whole source once. Only instruction lines advance the address,
/// so a label at the end of the file gets the address one past the last
/// instruction.
pub fn build_label_table(source: &str) -> Result<LabelTable, AsmError> {
    let mut table = LabelTable::default();
    let mut address: u64 = 0;

    for (line, kind) in lexer::lines(source) {
        match kind {
            SourceLine::Blank | SourceLine::Comment => {}
            SourceLine::Label(name) => {
                table.define(name, address, line)?;
                debug!("label `{}` => 0x{:04X} (line {})", name, address, line);
            }
            SourceLine::Instruction(_) => address += 1,
        }
    }

    Ok(table)
}
