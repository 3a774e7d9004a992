//! The optable. An instruction's opcode is its index here.

use crate::flag::{DWORD_SZ, WORD_SZ};
use once_cell::sync::Lazy;
use std::collections::HashMap;

// Condition flags an instruction affects, plus two behavior bits.
pub const Z: u16 = 1 << 0;
pub const O: u16 = 1 << 1;
pub const C: u16 = 1 << 2;
pub const N: u16 = 1 << 3;
/// Extensible: accepts the `w` suffix promoting operands to two bytes.
pub const E: u16 = 1 << 4;
/// Takes no operands.
pub const NOP: u16 = 1 << 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpDesc {
    pub mnemonic: &'static str,
    pub traits: u16,
}

const fn op(mnemonic: &'static str, traits: u16) -> OpDesc {
    OpDesc { mnemonic, traits }
}

pub const OPTABLE: [OpDesc; 25] = [
    op("halt", NOP),
    op("xchg", E),
    op("int", 0),
    op("mov", E | Z | N),
    op("add", E | Z | O | C | N),
    op("sub", E | Z | O | C | N),
    op("mul", E | Z | N),
    op("div", E | Z | N),
    op("cmp", E | Z | O | C | N),
    op("not", E | Z | N),
    op("and", E | Z | N),
    op("or", E | Z | N),
    op("xor", E | Z | N),
    op("test", E | Z | N),
    op("shl", E | Z | C | N),
    op("shr", E | Z | C | N),
    op("push", E),
    op("pop", E),
    op("jmp", 0),
    op("jeq", 0),
    op("jne", 0),
    op("jgt", 0),
    op("call", 0),
    op("ret", NOP),
    op("iret", NOP),
];

static INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    OPTABLE
        .iter()
        .enumerate()
        .map(|(idx, op)| (op.mnemonic, idx))
        .collect()
});

/// Case-insensitive mnemonic lookup.
pub fn lookup(mnemonic: &str) -> Option<(usize, &'static OpDesc)> {
    let idx = *INDEX.get(mnemonic.to_ascii_lowercase().as_str())?;
    Some((idx, &OPTABLE[idx]))
}

/// The mnemonics joined for the instruction regex, in opcode order.
pub fn mnemonic_alternation() -> String {
    OPTABLE
        .iter()
        .map(|op| op.mnemonic)
        .collect::<Vec<_>>()
        .join("|")
}

impl OpDesc {
    pub fn is_extensible(&self) -> bool {
        self.traits & E != 0
    }

    pub fn takes_no_operands(&self) -> bool {
        self.traits & NOP != 0
    }

    /// Operand payload width in bytes. Non-extensible instructions
    /// always carry two-byte operands; extensible ones default to one
    /// byte and the `w` suffix promotes them.
    pub fn op_sz(&self, extended: bool) -> usize {
        if self.takes_no_operands() {
            0
        } else if !self.is_extensible() || extended {
            DWORD_SZ
        } else {
            WORD_SZ
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_opcode {
        ($($name:ident: $mnemonic:expr => $index:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (idx, desc) = lookup($mnemonic).unwrap();
                    assert_eq!(idx, $index);
                    assert_eq!(desc.mnemonic, $mnemonic);
                }
            )*
        }
    }

    test_opcode! {
        test_halt: "halt" => 0,
        test_xchg: "xchg" => 1,
        test_int: "int" => 2,
        test_mov: "mov" => 3,
        test_add: "add" => 4,
        test_cmp: "cmp" => 8,
        test_push: "push" => 16,
        test_jmp: "jmp" => 18,
        test_call: "call" => 22,
        test_iret: "iret" => 24,
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("MOV").unwrap().0, lookup("mov").unwrap().0);
        assert_eq!(lookup("Jne").unwrap().0, 20);
        assert!(lookup("frobnicate").is_none());
    }

    #[test]
    fn op_sz_law() {
        let halt = lookup("halt").unwrap().1;
        assert_eq!(halt.op_sz(false), 0);
        let jmp = lookup("jmp").unwrap().1;
        assert_eq!(jmp.op_sz(false), DWORD_SZ);
        let mov = lookup("mov").unwrap().1;
        assert_eq!(mov.op_sz(false), WORD_SZ);
        assert_eq!(mov.op_sz(true), DWORD_SZ);
    }

    #[test]
    fn alternation_lists_every_mnemonic() {
        let alt = mnemonic_alternation();
        assert!(alt.starts_with("halt|"));
        assert!(alt.ends_with("|iret"));
        assert_eq!(alt.matches('|').count(), OPTABLE.len() - 1);
    }
}
