//! Pass 2: turns every instruction line into an `Instruction`, resolving
//! label operands through the table built by pass 1.
use std::sync::OnceLock;

use regex::Regex;

use super::ast::*;
use super::error::AsmError;
use super::labels::LabelTable;
use super::lexer::{self, SourceLine};

/// An opcode plus at most three operands.
const MAX_TOKENS: usize = 4;

/// Strips the optional register (`r`) and address (`@`) sigils.
fn operand_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^r?@?(?P<value>.*)$").expect("operand pattern compiles"))
}

/// Encodes every instruction line of `source`, in source order.
pub fn encode_instructions(source: &str, labels: &LabelTable) -> Result<Vec<Instruction>, AsmError> {
    let mut out = Vec::new();

    for (line, kind) in lexer::lines(source) {
        if let SourceLine::Instruction(text) = kind {
            let ins = instruction(text, line, labels)?;
            trace!("0x{:04X}: {} (line {})", out.len(), ins, line);
            out.push(ins);
        }
    }

    Ok(out)
}

/// Parses a single instruction line that already had its comment stripped.
fn instruction(text: &str, line: usize, labels: &LabelTable) -> Result<Instruction, AsmError> {
    let tokens = tokenize(text, line)?;
    let (mnemonic, operands) = (tokens[0], &tokens[1..]);
    let operands: Vec<&str> = operands.iter().map(|tok| normalize(tok)).collect();

    let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AsmError::UnknownOpcode {
        line,
        mnemonic: mnemonic.to_string(),
    })?;

    if operands.len() != opcode.arity() {
        return Err(AsmError::ArityMismatch {
            line,
            mnemonic: mnemonic.to_string(),
            expected: opcode.arity(),
            found: operands.len(),
        });
    }

    let values = opcode
        .slots()
        .iter()
        .zip(operands.iter())
        .map(|(kind, tok)| operand(*kind, tok, line, labels))
        .collect::<Result<Vec<u64>, AsmError>>()?;

    Ok(Instruction::new(opcode, &values))
}

/// Splits on single spaces. Repeated spaces produce empty operands.
fn tokenize(text: &str, line: usize) -> Result<Vec<&str>, AsmError> {
    let tokens: Vec<&str> = text.split(' ').collect();
    if tokens.is_empty() || tokens[0].is_empty() || tokens.len() > MAX_TOKENS {
        return Err(AsmError::MalformedInstruction { line, found: tokens.len() });
    }
    Ok(tokens)
}

fn normalize(token: &str) -> &str {
    match operand_pattern().captures(token).and_then(|c| c.name("value")) {
        Some(m) => m.as_str(),
        None => token,
    }
}

fn operand(kind: SlotKind, token: &str, line: usize, labels: &LabelTable) -> Result<u64, AsmError> {
    match kind {
        SlotKind::Label => labels.get(token).ok_or_else(|| AsmError::UnresolvedLabel {
            line,
            label: token.to_string(),
        }),
        SlotKind::Literal => literal(token).ok_or_else(|| AsmError::MalformedOperand {
            line,
            operand: token.to_string(),
        }),
    }
}

/// Base-10 integer. Negative values are stored as two's complement.
fn literal(token: &str) -> Option<u64> {
    token
        .parse::<u64>()
        .ok()
        .or_else(|| token.parse::<i64>().ok().map(|v| v as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::labels::build_label_table;

    fn assemble(source: &str) -> Result<Vec<Instruction>, AsmError> {
        let labels = build_label_table(source)?;
        encode_instructions(source, &labels)
    }

    fn ins(op: u64, d0: u64, d1: u64, d2: u64) -> Instruction {
        Instruction { op, d0, d1, d2 }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("3"), "3");
        assert_eq!(normalize("r3"), "3");
        assert_eq!(normalize("@3"), "3");
        assert_eq!(normalize("r@3"), "3");
        assert_eq!(normalize("@loop"), "loop");
        assert_eq!(normalize("@rloop"), "rloop");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_sigils_are_inert() {
        let labels = LabelTable::default();
        for text in ["put 3", "put r3", "put @3"].iter() {
            assert_eq!(instruction(text, 1, &labels), Ok(ins(7, 3, 0, 0)));
        }
    }

    #[test]
    fn test_literal() {
        assert_eq!(literal("0"), Some(0));
        assert_eq!(literal("18446744073709551615"), Some(u64::MAX));
        assert_eq!(literal("-1"), Some(u64::MAX));
        assert_eq!(literal("-2"), Some(u64::MAX - 1));
        assert_eq!(literal("0x10"), None);
        assert_eq!(literal("18446744073709551616"), None);
        assert_eq!(literal(""), None);
        assert_eq!(literal("five"), None);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("ret", 1), Ok(vec!["ret"]));
        assert_eq!(tokenize("add r0 r1 r2", 1), Ok(vec!["add", "r0", "r1", "r2"]));
        assert_eq!(tokenize("li  0 5", 1), Ok(vec!["li", "", "0", "5"]));
        assert_eq!(
            tokenize("add 0 1 2 3", 6),
            Err(AsmError::MalformedInstruction { line: 6, found: 5 })
        );
    }

    #[test]
    fn test_every_opcode() {
        let source = "\
li r0 5
cp r1 r0
@loop
bge r0 r1 @done
add r2 r0 r1
sub r2 r2 r1
call r3 r4 @loop
ret
@done
put r2
exit 0
";
        assert_eq!(assemble(source), Ok(vec![
            ins(0, 0, 5, 0),
            ins(1, 1, 0, 0),
            ins(2, 0, 1, 7),
            ins(3, 2, 0, 1),
            ins(4, 2, 2, 1),
            ins(5, 3, 4, 2),
            ins(6, 0, 0, 0),
            ins(7, 2, 0, 0),
            ins(8, 0, 0, 0),
        ]));
    }

    #[test]
    fn test_forward_reference() {
        let source = "call 0 1 @func\nexit 0\n# body\n@func\nput 1\nret";
        let v = assemble(source).unwrap();
        assert_eq!(v[0], ins(5, 0, 1, 2));
    }

    #[test]
    fn test_backward_reference() {
        let source = "li 0 0\n@top\nadd 0 0 1\nbge 1 0 top";
        let v = assemble(source).unwrap();
        assert_eq!(v[2], ins(2, 1, 0, 1));
    }

    #[test]
    fn test_arity_enforced() {
        let labels = build_label_table("@l").unwrap();
        for op in Opcode::ALL.iter() {
            let arity = op.arity();
            let mut counts = vec![arity + 1];
            if arity > 0 {
                counts.push(arity - 1);
            }
            for found in counts {
                let mut text = op.mnemonic().to_string();
                for _ in 0..found {
                    text.push_str(" @l");
                }
                if found > 3 {
                    // Five tokens never reach the opcode table.
                    assert_eq!(
                        instruction(&text, 3, &labels),
                        Err(AsmError::MalformedInstruction { line: 3, found: 5 })
                    );
                    continue;
                }
                assert_eq!(
                    instruction(&text, 3, &labels),
                    Err(AsmError::ArityMismatch {
                        line: 3,
                        mnemonic: op.mnemonic().to_string(),
                        expected: arity,
                        found,
                    }),
                    "{}", text
                );
            }
        }
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(
            assemble("# header\nfoo 1 2"),
            Err(AsmError::UnknownOpcode { line: 2, mnemonic: "foo".to_string() })
        );
        assert_eq!(
            assemble("LI 0 1"),
            Err(AsmError::UnknownOpcode { line: 1, mnemonic: "LI".to_string() })
        );
    }

    #[test]
    fn test_unresolved_label() {
        assert_eq!(
            assemble("li 0 1\n\nbge 0 1 @nowhere"),
            Err(AsmError::UnresolvedLabel { line: 3, label: "nowhere".to_string() })
        );
    }

    #[test]
    fn test_malformed_operand() {
        assert_eq!(
            assemble("li 0 x5"),
            Err(AsmError::MalformedOperand { line: 1, operand: "x5".to_string() })
        );
        assert_eq!(
            assemble("li  0 5"),
            Err(AsmError::ArityMismatch { line: 1, mnemonic: "li".to_string(), expected: 2, found: 3 })
        );
        assert_eq!(
            assemble("put  5"),
            Err(AsmError::ArityMismatch { line: 1, mnemonic: "put".to_string(), expected: 1, found: 2 })
        );
        assert_eq!(
            assemble("add 0  1"),
            Err(AsmError::MalformedOperand { line: 1, operand: "".to_string() })
        );
    }

    #[test]
    fn test_malformed_instruction() {
        assert_eq!(
            assemble("ret\nadd 1 2 3 4"),
            Err(AsmError::MalformedInstruction { line: 2, found: 5 })
        );
    }

    #[test]
    fn test_stops_at_first_error() {
        assert_eq!(
            assemble("li 0 a\nfoo"),
            Err(AsmError::MalformedOperand { line: 1, operand: "a".to_string() })
        );
    }
}
