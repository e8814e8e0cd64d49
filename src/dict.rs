// dict.rs - the word dictionary
//
// A flat, ordered list of Code records. Built-ins carry a native function;
// colon words carry the PMEM offset of their threaded code. Entry 0 is the
// "nul " sentinel so a find() result of 0 always means "not found".

use crate::config::{str_sz, DICT_SZ, IU};
use crate::error::ForthError;
use crate::vm::Vm;
use log::debug;

type Result<T> = std::result::Result<T, ForthError>;

/// Native execution behavior of a built-in word.
pub type Xt = fn(&mut Vm) -> Result<()>;

/// User-defined (colon) word.
pub const UDF_ATTR: u8 = 0x1;
/// Immediate word: executed even while compiling.
pub const IMM_ATTR: u8 = 0x2;

pub struct Code {
    pub name: String,
    pub xt: Option<Xt>,
    pub attr: u8,
    /// Parameter-field address of a colon word's threaded code.
    pub pfa: IU,
}

impl Code {
    pub fn prim(name: &str, attr: u8, xt: Xt) -> Code {
        Code {
            name: name.to_string(),
            xt: Some(xt),
            attr,
            pfa: 0,
        }
    }

    pub fn udf(name: String, pfa: IU) -> Code {
        Code {
            name,
            xt: None,
            attr: UDF_ATTR,
            pfa,
        }
    }

    pub fn is_udf(&self) -> bool {
        self.attr & UDF_ATTR != 0
    }

    pub fn is_imm(&self) -> bool {
        self.attr & IMM_ATTR != 0
    }

    /// Name-field address: where the word's name sits in PMEM, just before
    /// its parameter field. Only meaningful for colon words.
    pub fn nfa(&self) -> IU {
        self.pfa - str_sz(&self.name)
    }
}

pub struct Dict {
    words: Vec<Code>,
}

impl Dict {
    pub fn new() -> Dict {
        Dict {
            words: Vec::with_capacity(DICT_SZ),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, i: IU) -> Option<&Code> {
        self.words.get(i as usize)
    }

    pub fn last(&self) -> &Code {
        &self.words[self.words.len() - 1]
    }

    pub fn last_mut(&mut self) -> &mut Code {
        let n = self.words.len() - 1;
        &mut self.words[n]
    }

    /// Used during dictionary assembly; capacity is statically sufficient.
    pub fn add(&mut self, c: Code) {
        self.words.push(c);
    }

    pub fn push(&mut self, c: Code) -> Result<()> {
        if self.words.len() >= DICT_SZ {
            return Err(ForthError::DictFull);
        }
        self.words.push(c);
        Ok(())
    }

    pub fn truncate(&mut self, n: IU) {
        self.words.truncate(n as usize);
    }

    pub fn get_mut(&mut self, i: IU) -> Option<&mut Code> {
        self.words.get_mut(i as usize)
    }

    /// Scan backward from the most recent entry; 0 means not found (entry 0
    /// is the sentinel and never matches).
    pub fn find(&self, name: &str, ucase: bool) -> IU {
        for i in (1..self.words.len()).rev() {
            let w = &self.words[i].name;
            let hit = if ucase {
                w.eq_ignore_ascii_case(name)
            } else {
                w == name
            };
            if hit {
                debug!("find {:?} -> {}", name, i);
                return i as IU;
            }
        }
        0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Code> {
        self.words.iter()
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}
