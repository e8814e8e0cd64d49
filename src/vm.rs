// vm.rs - the Forth virtual machine
//
// One value owns everything: dictionary, parameter memory, both stacks, the
// instruction pointer and the interpreter flags. Lifecycle is new() /
// forth_vm(line, hook) / drop.

use std::time::Instant;

use crate::config::{DU, IU, IU_SZ, RS_SZ, SS_SZ};
use crate::dict::Dict;
use crate::error::ForthError;
use crate::memory::Pmem;
use crate::opcode::USER_AREA;
use crate::stack::{DataStack, ReturnStack};

type Result<T> = std::result::Result<T, ForthError>;

/// Host-supplied script fetcher for INCLUDED.
pub type Loader = Box<dyn FnMut(&str) -> Option<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Stop,
    Hold,
    Query,
    Nest,
    Io,
}

pub struct Vm {
    pub(crate) dict: Dict,
    pub(crate) pmem: Pmem,
    pub(crate) ss: DataStack,
    pub(crate) rs: ReturnStack,
    pub(crate) ip: IU,
    pub(crate) state: VmState,
    pub(crate) compile: bool,
    pub(crate) ucase: bool,
    pub(crate) fin: String,
    pub(crate) fin_pos: usize,
    pub(crate) fout: String,
    pub(crate) bye: bool,
    pub(crate) loader: Option<Loader>,
    t0: Instant,
}

impl Vm {
    pub fn new() -> Vm {
        let mut vm = Vm {
            dict: Dict::new(),
            pmem: Pmem::new(),
            ss: DataStack::new(SS_SZ),
            rs: ReturnStack::new(RS_SZ),
            ip: 0,
            state: VmState::Query,
            compile: false,
            ucase: false,
            fin: String::new(),
            fin_pos: 0,
            fout: String::new(),
            bye: false,
            loader: None,
            t0: Instant::now(),
        };
        vm.user_area().expect("user area fits in fresh pmem");
        vm.dict_compile();
        vm
    }

    /// Lay out the user cells at the bottom of PMEM: BASE, DFLT, padding.
    fn user_area(&mut self) -> Result<()> {
        self.pmem.add_iu(10)?; // BASE
        self.pmem.add_iu(0)?; // DFLT (integer build)
        while self.pmem.here() < USER_AREA {
            self.pmem.add_iu(0xffff)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // stack shorthands
    // ------------------------------------------------------------------

    pub(crate) fn push(&mut self, v: DU) -> Result<()> {
        self.ss.push(v)
    }

    pub(crate) fn pop(&mut self) -> Result<DU> {
        self.ss.pop()
    }

    pub(crate) fn pop_iu(&mut self) -> Result<IU> {
        Ok(self.ss.pop()? as IU)
    }

    // ------------------------------------------------------------------
    // user cells and memory access
    // ------------------------------------------------------------------

    pub fn base(&self) -> u32 {
        match self.pmem.iget(0).unwrap_or(10) {
            b @ 2..=36 => b as u32,
            _ => 10,
        }
    }

    pub(crate) fn set_base(&mut self, b: IU) {
        let _ = self.pmem.iset(0, b);
    }

    pub fn dflt(&self) -> IU {
        self.pmem.iget(IU_SZ).unwrap_or(0)
    }

    /// Fetch discriminates on the user area: low addresses are IU cells.
    pub(crate) fn fetch(&self, a: IU) -> Result<DU> {
        if a < USER_AREA {
            Ok(self.pmem.iget(a)? as DU)
        } else {
            self.pmem.dget(a)
        }
    }

    pub(crate) fn store(&mut self, a: IU, v: DU) -> Result<()> {
        if a < USER_AREA {
            self.pmem.iset(a, v as IU)
        } else {
            self.pmem.dset(a, v)
        }
    }

    // ------------------------------------------------------------------
    // input scanning
    // ------------------------------------------------------------------

    pub(crate) fn set_line(&mut self, line: &str) {
        self.fin.clear();
        self.fin.push_str(line);
        self.fin_pos = 0;
    }

    /// Next whitespace-delimited idiom; empty when the line is exhausted.
    pub(crate) fn word(&mut self) -> String {
        let bytes = self.fin.as_bytes();
        let mut i = self.fin_pos;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        self.fin_pos = i;
        self.fin[start..i].to_string()
    }

    /// Read up to (and consume) the delimiter; the delimiter is dropped.
    pub(crate) fn scan(&mut self, delim: char) -> String {
        let rest = &self.fin[self.fin_pos..];
        match rest.find(delim) {
            Some(p) => {
                let s = rest[..p].to_string();
                self.fin_pos += p + delim.len_utf8();
                s
            }
            None => {
                let s = rest.to_string();
                self.fin_pos = self.fin.len();
                s
            }
        }
    }

    // ------------------------------------------------------------------
    // host interface
    // ------------------------------------------------------------------

    /// Install the script fetcher used by INCLUDED.
    pub fn set_loader(&mut self, f: impl FnMut(&str) -> Option<String> + 'static) {
        self.loader = Some(Box::new(f));
    }

    /// Supply the character a KEY yield asked for, ahead of re-entry.
    pub fn feed_key(&mut self, c: char) -> std::result::Result<(), ForthError> {
        self.push(c as DU)
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn compiling(&self) -> bool {
        self.compile
    }

    /// True once BYE has run; the host should exit.
    pub fn bye(&self) -> bool {
        self.bye
    }

    pub(crate) fn millis(&self) -> u32 {
        self.t0.elapsed().as_millis() as u32
    }

    // ------------------------------------------------------------------
    // embedding accessors
    // ------------------------------------------------------------------

    /// The parameter stack, bottom first.
    pub fn stack(&self) -> Vec<DU> {
        self.ss.contents()
    }

    pub fn depth(&self) -> usize {
        self.ss.depth()
    }

    pub fn here(&self) -> IU {
        self.pmem.here()
    }

    pub fn dict_len(&self) -> usize {
        self.dict.len()
    }

    pub fn word_name(&self, i: IU) -> Option<&str> {
        self.dict.get(i).map(|c| c.name.as_str())
    }

    pub fn pmem_slice(&self) -> &[u8] {
        self.pmem.as_slice()
    }

    /// Dictionary index of a word, 0 when absent.
    pub fn find(&self, name: &str) -> IU {
        self.dict.find(name, self.ucase)
    }

    /// Clear both stacks (ABORT semantics).
    pub(crate) fn abort_stacks(&mut self) {
        self.ss.clear();
        self.rs.clear();
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
