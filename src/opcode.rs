// opcode.rs - 16-bit tagged instruction-unit encoding
//
// Every cell of threaded code is one IU. The high bit separates built-in
// references (clear: the IU is the word's dictionary index) from everything
// else (set). A set high bit with a value below MAX_OP is a primitive
// opcode; at or above MAX_OP the low 15 bits are the parameter-field
// address of a colon word.
//
//   +-+---------------+
//   |1|   opcode      |   primitive, opcode < MAX_OP
//   +-+---------------+
//   |1|   pfa         |   colon word, IP = pfa
//   +-+---------------+
//   |0|  dict index   |   built-in, call dict[index].xt
//   +-+---------------+

use crate::config::{align16, IU};

pub const EXT_FLAG: IU = 0x8000;

/// Primitive opcodes handled directly by the inner interpreter.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exit = EXT_FLAG,
    Nop,
    Next,
    Loop,
    Lit,
    Var,
    Str,
    Dotq,
    Bran,
    Zbran,
    Vbran,
    Does,
    For,
    Do,
    Key,
}

/// One past the last primitive opcode.
pub const MAX_OP: IU = Op::Key as IU + 1;

/// Low PMEM region reserved for the per-session user cells (BASE, DFLT).
pub const USER_AREA: IU = align16(MAX_OP & !EXT_FLAG);

/// True when the IU is a primitive opcode (high bit set, below MAX_OP).
pub fn is_prim(w: IU) -> bool {
    (w & EXT_FLAG) != 0 && w < MAX_OP
}

impl Op {
    pub fn from_iu(ix: IU) -> Option<Op> {
        if !is_prim(ix) {
            return None;
        }
        Some(match ix & !EXT_FLAG {
            0 => Op::Exit,
            1 => Op::Nop,
            2 => Op::Next,
            3 => Op::Loop,
            4 => Op::Lit,
            5 => Op::Var,
            6 => Op::Str,
            7 => Op::Dotq,
            8 => Op::Bran,
            9 => Op::Zbran,
            10 => Op::Vbran,
            11 => Op::Does,
            12 => Op::For,
            13 => Op::Do,
            _ => Op::Key,
        })
    }

    /// Disassembly mnemonic, used by SEE.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Exit => ";",
            Op::Nop => "nop",
            Op::Next => "next",
            Op::Loop => "loop",
            Op::Lit => "lit",
            Op::Var => "var",
            Op::Str => "str",
            Op::Dotq => "dotq",
            Op::Bran => "bran",
            Op::Zbran => "0bran",
            Op::Vbran => "vbran",
            Op::Does => "does>",
            Op::For => "for",
            Op::Do => "do",
            Op::Key => "key",
        }
    }
}
