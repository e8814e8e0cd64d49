// compile.rs - colon-word compiler support
//
// The outer interpreter drives these while the compile flag is set; the
// immediate control-flow words in the dictionary lean on add_w/setjmp for
// branch back-patching.

use log::debug;

use crate::config::{DU, IU};
use crate::dict::Code;
use crate::error::ForthError;
use crate::opcode::{is_prim, Op, EXT_FLAG};
use crate::vm::{Vm, VmState};

type Result<T> = std::result::Result<T, ForthError>;

impl Vm {
    /// Create a colon-word header: name bytes into PMEM, Code record into
    /// the dictionary with the parameter field starting after the name.
    pub(crate) fn colon(&mut self, name: &str) -> Result<()> {
        self.pmem.add_str(name)?;
        let pfa = self.pmem.here();
        self.dict.push(Code::udf(name.to_string(), pfa))
    }

    /// Shared front half of every defining word. Reports a missing name or
    /// a redefinition; returns whether a header was created.
    pub(crate) fn def_word(&mut self, name: &str) -> Result<bool> {
        if name.is_empty() {
            self.fout.push_str(" name?\n");
            return Ok(false);
        }
        if self.dict.find(name, self.ucase) != 0 {
            debug!("redefining {:?}", name);
            self.fout.push_str(name);
            self.fout.push_str(" reDef? \n");
        }
        self.colon(name)?;
        Ok(true)
    }

    /// Compile a reference to dictionary index `w` (or a raw primitive
    /// opcode) into the current definition.
    pub(crate) fn add_w(&mut self, w: IU) -> Result<()> {
        let ip = if is_prim(w) {
            w
        } else {
            let c = self.dict.get(w).ok_or(ForthError::InvalidAddress(w))?;
            if c.is_udf() {
                c.pfa | EXT_FLAG
            } else {
                w // built-ins compile as their dictionary index
            }
        };
        debug!("add_w({w}) => {ip:#06x}");
        self.pmem.add_iu(ip)
    }

    /// Emit a variable/CREATE header: the opcode, a DOES> target slot for
    /// VBRAN, alignment padding, and a zeroed cell for VAR.
    pub(crate) fn add_var(&mut self, op: Op) -> Result<()> {
        self.add_w(op as IU)?;
        if op == Op::Vbran {
            self.pmem.add_iu(0)?;
        }
        self.pmem.dalign_here()?;
        if op == Op::Var {
            self.pmem.add_du(0)?;
        }
        Ok(())
    }

    /// s" and ." compile an inline string. In interpret mode ." prints
    /// immediately and s" parks the bytes in the transient region past
    /// HERE, pushing addr/len.
    pub(crate) fn s_quote(&mut self, op: Op) -> Result<()> {
        let raw = self.scan('"');
        let s = raw.strip_prefix(' ').unwrap_or(&raw).to_string();
        if self.compile {
            self.add_w(op as IU)?;
            self.pmem.add_str(&s)?;
        } else if op == Op::Dotq {
            self.fout.push_str(&s);
        } else {
            let h0 = self.pmem.here();
            let len = self.pmem.add_str(&s)?;
            self.push(h0 as DU)?;
            self.push(len as DU)?;
            self.pmem.rewind(h0);
        }
        Ok(())
    }

    /// INCLUDED: fetch a script through the host loader and run it with the
    /// input cursor saved around it. The cursor is restored on every exit
    /// path, errors included.
    pub(crate) fn load(&mut self, path: &str) -> Result<()> {
        let mut loader = self.loader.take();
        let text = loader.as_mut().and_then(|f| f(path));
        self.loader = loader;

        let Some(src) = text else {
            self.fout.push_str(path);
            self.fout.push_str(" load failed!\n");
            return Ok(());
        };
        debug!("include {:?} ({} bytes)", path, src.len());

        self.rs.push(self.ip as DU)?;
        let fin = std::mem::take(&mut self.fin);
        let pos = self.fin_pos;

        let result = self.run_script(&src);

        self.fin = fin;
        self.fin_pos = pos;
        if let Ok(ip) = self.rs.pop() {
            self.ip = ip as IU;
        }
        result
    }

    fn run_script(&mut self, src: &str) -> Result<()> {
        for line in src.lines() {
            self.set_line(line);
            loop {
                let idiom = self.word();
                if idiom.is_empty() {
                    break;
                }
                if !self.forth_core(&idiom)? {
                    break; // abandon the rest of this line
                }
                // a script cannot yield; spin any suspension straight through
                while self.state == VmState::Hold || self.state == VmState::Io {
                    self.nest()?;
                }
            }
        }
        Ok(())
    }
}
