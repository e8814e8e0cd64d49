// outer.rs - the outer interpreter (QUERY) and the driver entry point

use log::debug;

use crate::config::{DU, IU, TIME_SLICE_MS};
use crate::error::ForthError;
use crate::opcode::Op;
use crate::vm::{Vm, VmState};

type Result<T> = std::result::Result<T, ForthError>;

/// Parse an idiom as a number. A leading `%`, `&`/`#` or `$` overrides the
/// current base with 2, 10 or 16; anything unparsable (including overflow,
/// matching strtol's errno contract) is None.
pub(crate) fn parse_number(idiom: &str, base: u32) -> Option<DU> {
    let (digits, b) = match idiom.as_bytes().first()? {
        b'%' => (&idiom[1..], 2),
        b'&' | b'#' => (&idiom[1..], 10),
        b'$' => (&idiom[1..], 16),
        _ => (idiom, base),
    };
    DU::from_str_radix(digits, b).ok()
}

impl Vm {
    /// Process one idiom: dictionary word (compile or execute), else
    /// number, else report it and abandon the line (returns false).
    pub(crate) fn forth_core(&mut self, idiom: &str) -> Result<bool> {
        self.state = VmState::Query;
        let w = self.dict.find(idiom, self.ucase);
        if w != 0 {
            let imm = self.dict.get(w).map(|c| c.is_imm()).unwrap_or(false);
            if self.compile && !imm {
                self.add_w(w)?;
            } else {
                self.call(w)?;
            }
            return Ok(true);
        }
        match parse_number(idiom, self.base()) {
            Some(n) => {
                if self.compile {
                    self.add_w(Op::Lit as IU)?;
                    self.pmem.add_du(n)?;
                } else {
                    self.push(n)?;
                }
                Ok(true)
            }
            None => {
                self.fout.push_str(idiom);
                self.fout.push_str("? \n");
                self.compile = false;
                self.state = VmState::Stop;
                Ok(false)
            }
        }
    }

    fn token_loop(&mut self, mut resume: bool, deadline: u32) -> Result<()> {
        loop {
            if resume {
                self.nest()?;
            } else {
                let idiom = self.word();
                if idiom.is_empty() {
                    return Ok(());
                }
                if !self.forth_core(&idiom)? {
                    return Ok(()); // rest of the line abandoned
                }
            }
            if self.state == VmState::Io {
                return Ok(()); // suspend for key input
            }
            resume = self.state == VmState::Hold;
            if resume && self.millis() >= deadline {
                return Ok(()); // time slice spent
            }
        }
    }

    /// Feed one input line to the VM, or re-enter after a yield with
    /// `line = None`. Output accumulated during the call is flushed through
    /// `hook(channel, text)` before returning. Returns true when the VM
    /// yielded (KEY or time slice) and wants re-entry.
    pub fn forth_vm(&mut self, line: Option<&str>, hook: &mut dyn FnMut(i32, &str)) -> bool {
        let resume = self.state == VmState::Hold || self.state == VmState::Io;
        if resume {
            self.ip = self.rs.pop().unwrap_or(0) as IU;
        } else {
            match line {
                Some(l) => self.set_line(l),
                None => return false, // nothing to resume, nothing to parse
            }
        }
        let deadline = self.millis() + TIME_SLICE_MS;

        match self.token_loop(resume, deadline) {
            Ok(()) => {}
            Err(ForthError::Bye) => {
                self.bye = true;
                self.compile = false;
                self.state = VmState::Stop;
            }
            Err(e) => {
                self.fout.push_str(&format!("{e}? abort\n"));
                self.abort_stacks();
                self.compile = false;
                self.state = VmState::Stop;
            }
        }

        let yielded = self.state == VmState::Hold || self.state == VmState::Io;
        if yielded {
            debug!("yield ({:?}) at ip={:#06x}", self.state, self.ip);
            if self.rs.push(self.ip as DU).is_err() {
                // cannot park the context; give up on the suspended word
                self.abort_stacks();
                self.state = VmState::Stop;
            }
        } else if !self.compile && !self.bye {
            self.ss_dump();
        }

        if !self.fout.is_empty() {
            let out = std::mem::take(&mut self.fout);
            hook(0, &out);
        }
        yielded && self.state != VmState::Stop
    }
}
