// inner.rs - the inner interpreter (NEST)
//
// One iterative fetch-dispatch-advance loop over instruction units, with an
// explicit return stack instead of host-stack recursion. That choice is
// what makes yield/resume possible: suspending only needs IP snapshotted.

use crate::config::{DU, DU_SZ, IU, IU_SZ};
use crate::config::{dalign, str_sz};
use crate::error::ForthError;
use crate::opcode::{Op, EXT_FLAG};
use crate::vm::{Vm, VmState};

type Result<T> = std::result::Result<T, ForthError>;

impl Vm {
    /// Return from a colon word: restore IP from the return stack. Popping
    /// to the outermost sentinel stops the VM; popping to a live caller
    /// parks it in HOLD so the driver can check the time slice before
    /// continuing.
    pub(crate) fn unnest(&mut self) -> Result<()> {
        self.ip = self.rs.pop()? as IU;
        self.state = if self.ip != 0 {
            VmState::Hold
        } else {
            VmState::Stop
        };
        Ok(())
    }

    /// Execute threaded code starting at the current IP until the word
    /// returns, yields, or stops.
    pub(crate) fn nest(&mut self) -> Result<()> {
        self.state = VmState::Nest;
        while self.state == VmState::Nest && self.ip != 0 {
            let ix = self.pmem.iget(self.ip)?;
            self.ip += IU_SZ;
            match Op::from_iu(ix) {
                Some(Op::Exit) => self.unnest()?,
                Some(Op::Nop) => {}
                Some(Op::Next) => {
                    // count down the FOR frame; fall through when negative
                    let again = {
                        let i = self.rs.at_mut(-1)?;
                        *i -= 1;
                        *i > -1
                    };
                    if again {
                        self.ip = self.pmem.iget(self.ip)?;
                    } else {
                        self.rs.pop()?;
                        self.ip += IU_SZ;
                    }
                }
                Some(Op::Loop) => {
                    *self.rs.at_mut(-1)? += 1;
                    if self.rs.at(-2)? > self.rs.at(-1)? {
                        self.ip = self.pmem.iget(self.ip)?;
                    } else {
                        self.rs.pop()?;
                        self.rs.pop()?;
                        self.ip += IU_SZ;
                    }
                }
                Some(Op::Lit) => {
                    let v = self.pmem.dget(self.ip)?;
                    self.push(v)?;
                    self.ip += DU_SZ;
                }
                Some(Op::Var) => {
                    let a = dalign(self.ip);
                    self.push(a as DU)?;
                    self.unnest()?;
                }
                Some(Op::Str) => {
                    let s = self.pmem.str_at(self.ip)?;
                    let len = str_sz(&s);
                    self.push(self.ip as DU)?;
                    self.push(len as DU)?;
                    self.ip += len;
                }
                Some(Op::Dotq) => {
                    let s = self.pmem.str_at(self.ip)?;
                    self.fout.push_str(&s);
                    self.ip += str_sz(&s);
                }
                Some(Op::Bran) => self.ip = self.pmem.iget(self.ip)?,
                Some(Op::Zbran) => {
                    self.ip = if self.pop()? != 0 {
                        self.ip + IU_SZ
                    } else {
                        self.pmem.iget(self.ip)?
                    };
                }
                Some(Op::Vbran) => {
                    // data field address, then the DOES> body if one is set
                    let a = dalign(self.ip + IU_SZ);
                    self.push(a as DU)?;
                    self.ip = self.pmem.iget(self.ip)?;
                    if self.ip == 0 {
                        self.unnest()?;
                    }
                }
                Some(Op::Does) => {
                    // wire the current IP into the latest CREATE'd word
                    let pfa = self.dict.last().pfa;
                    self.pmem.iset(pfa + IU_SZ, self.ip)?;
                    self.unnest()?;
                }
                Some(Op::For) => {
                    let n = self.pop()?;
                    self.rs.push(n)?;
                }
                Some(Op::Do) => {
                    let limit = self.ss.raw_pop()?;
                    let index = self.pop()?;
                    self.rs.push(limit)?;
                    self.rs.push(index)?;
                }
                Some(Op::Key) => {
                    self.state = VmState::Io;
                }
                None => {
                    if ix & EXT_FLAG != 0 {
                        // nested colon call
                        self.rs.push(self.ip as DU)?;
                        self.ip = ix & !EXT_FLAG;
                    } else {
                        self.exec(ix)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Run the built-in whose dictionary index is carried by the IU.
    pub(crate) fn exec(&mut self, ix: IU) -> Result<()> {
        let xt = self
            .dict
            .get(ix)
            .and_then(|c| c.xt)
            .ok_or(ForthError::InvalidAddress(ix))?;
        xt(self)
    }

    /// Outer entry point for one dictionary word: colon words get a call
    /// frame with the outermost sentinel, built-ins run natively.
    pub(crate) fn call(&mut self, w: IU) -> Result<()> {
        let c = self.dict.get(w).ok_or(ForthError::InvalidAddress(w))?;
        if c.is_udf() {
            let pfa = c.pfa;
            self.rs.push(0)?;
            self.ip = pfa;
            self.nest()
        } else {
            self.exec(w)
        }
    }
}
