// primitives.rs - the built-in word set
//
// Assembled into the dictionary once at startup. Each entry is a native
// function; the IU compiled for a built-in is simply its dictionary index.
// Word bodies read and write the cached top of stack directly, eForth
// style; `raw_pop`/`raw_push` reach the cell just underneath it.

use std::thread;
use std::time::Duration;

use crate::config::{DU, DU2, DU_SZ, IU, IU_SZ};
use crate::dict::{Code, Xt, IMM_ATTR};
use crate::error::ForthError;
use crate::opcode::Op;
use crate::vm::{Vm, VmState};

type Result<T> = std::result::Result<T, ForthError>;

fn bool_du(f: bool) -> DU {
    if f {
        -1
    } else {
        0
    }
}

impl Vm {
    fn code(&mut self, name: &str, xt: Xt) {
        self.dict.add(Code::prim(name, 0, xt));
    }

    fn immd(&mut self, name: &str, xt: Xt) {
        self.dict.add(Code::prim(name, IMM_ATTR, xt));
    }

    fn here_marker(&mut self) -> Result<()> {
        let h = self.pmem.here();
        self.push(h as DU)
    }

    pub(crate) fn dict_compile(&mut self) {
        self.code("nul ", |_| Ok(())); // sentinel: find() == 0 means not found

        // ---- stack ops ------------------------------------------------
        self.code("DUP", |vm| {
            vm.ss.need(1)?;
            let t = vm.ss.top;
            vm.push(t)
        });
        self.code("DROP", |vm| {
            vm.pop()?;
            Ok(())
        });
        self.code("OVER", |vm| {
            let n = vm.ss.at(-1)?;
            vm.push(n)
        });
        self.code("SWAP", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.push(n)
        });
        self.code("ROT", |vm| {
            // a b c -- b c a
            let n = vm.ss.raw_pop()?;
            let m = vm.ss.raw_pop()?;
            vm.ss.raw_push(n)?;
            vm.push(m)
        });
        self.code("-ROT", |vm| {
            // a b c -- c a b
            let n = vm.ss.raw_pop()?;
            let m = vm.ss.raw_pop()?;
            vm.push(m)?;
            vm.push(n)
        });
        self.code("NIP", |vm| {
            vm.ss.raw_pop()?;
            Ok(())
        });
        self.code("PICK", |vm| {
            vm.ss.need(1)?;
            let i = vm.ss.top;
            if i < 1 {
                return Err(ForthError::StackUnderflow);
            }
            vm.ss.top = vm.ss.at(-i)?;
            Ok(())
        });
        self.code("2DUP", |vm| {
            let n = vm.ss.at(-1)?;
            vm.push(n)?;
            let n = vm.ss.at(-1)?;
            vm.push(n)
        });
        self.code("2DROP", |vm| {
            vm.pop()?;
            vm.pop()?;
            Ok(())
        });
        self.code("2OVER", |vm| {
            let n = vm.ss.at(-3)?;
            vm.push(n)?;
            let n = vm.ss.at(-3)?;
            vm.push(n)
        });
        self.code("2SWAP", |vm| {
            // a b c d -- c d a b
            let n = vm.ss.raw_pop()?;
            let m = vm.ss.raw_pop()?;
            let l = vm.ss.raw_pop()?;
            vm.ss.raw_push(n)?;
            vm.push(l)?;
            vm.push(m)
        });
        self.code("?DUP", |vm| {
            vm.ss.need(1)?;
            let t = vm.ss.top;
            if t != 0 {
                vm.push(t)?;
            }
            Ok(())
        });

        // ---- arithmetic -----------------------------------------------
        self.code("+", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = vm.ss.top.wrapping_add(n);
            Ok(())
        });
        self.code("*", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = vm.ss.top.wrapping_mul(n);
            Ok(())
        });
        self.code("-", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = n.wrapping_sub(vm.ss.top);
            Ok(())
        });
        self.code("/", |vm| {
            if vm.ss.top == 0 {
                return Err(ForthError::DivisionByZero);
            }
            let n = vm.ss.raw_pop()?;
            vm.ss.top = n.wrapping_div(vm.ss.top);
            Ok(())
        });
        self.code("MOD", |vm| {
            if vm.ss.top == 0 {
                return Err(ForthError::DivisionByZero);
            }
            let n = vm.ss.raw_pop()?;
            vm.ss.top = n.wrapping_rem(vm.ss.top);
            Ok(())
        });
        self.code("*/", |vm| {
            if vm.ss.top == 0 {
                return Err(ForthError::DivisionByZero);
            }
            let n = vm.ss.raw_pop()? as DU2;
            let m = vm.ss.raw_pop()? as DU2;
            vm.ss.top = (n * m / vm.ss.top as DU2) as DU;
            Ok(())
        });
        self.code("/MOD", |vm| {
            // n t -- rem quot
            if vm.ss.top == 0 {
                return Err(ForthError::DivisionByZero);
            }
            let t = vm.ss.top;
            let n = vm.ss.raw_pop()?;
            vm.ss.raw_push(n.wrapping_rem(t))?;
            vm.ss.top = n.wrapping_div(t);
            Ok(())
        });
        self.code("*/MOD", |vm| {
            if vm.ss.top == 0 {
                return Err(ForthError::DivisionByZero);
            }
            let n = vm.ss.raw_pop()? as DU2;
            let m = vm.ss.raw_pop()? as DU2;
            let t = vm.ss.top as DU2;
            let p = n * m;
            vm.ss.raw_push((p % t) as DU)?;
            vm.ss.top = (p / t) as DU;
            Ok(())
        });
        self.code("MAX", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = vm.ss.top.max(n);
            Ok(())
        });
        self.code("MIN", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = vm.ss.top.min(n);
            Ok(())
        });

        // ---- bitwise and unary ----------------------------------------
        self.code("AND", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top &= n;
            Ok(())
        });
        self.code("OR", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top |= n;
            Ok(())
        });
        self.code("XOR", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top ^= n;
            Ok(())
        });
        self.code("INVERT", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = !vm.ss.top;
            Ok(())
        });
        self.code("LSHIFT", |vm| {
            vm.ss.need(2)?;
            let sh = vm.ss.top as u32;
            let n = vm.ss.raw_pop()? as u32;
            vm.ss.top = n.wrapping_shl(sh) as DU;
            Ok(())
        });
        self.code("RSHIFT", |vm| {
            vm.ss.need(2)?;
            let sh = vm.ss.top as u32;
            let n = vm.ss.raw_pop()? as u32;
            vm.ss.top = n.wrapping_shr(sh) as DU;
            Ok(())
        });
        self.code("ABS", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_abs();
            Ok(())
        });
        self.code("NEGATE", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_neg();
            Ok(())
        });
        self.code("1+", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_add(1);
            Ok(())
        });
        self.code("1-", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_sub(1);
            Ok(())
        });
        self.code("2*", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_mul(2);
            Ok(())
        });
        self.code("2/", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_div(2);
            Ok(())
        });

        // ---- comparison -----------------------------------------------
        self.code("0=", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = bool_du(vm.ss.top == 0);
            Ok(())
        });
        self.code("0<", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = bool_du(vm.ss.top < 0);
            Ok(())
        });
        self.code("0>", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = bool_du(vm.ss.top > 0);
            Ok(())
        });
        self.code("=", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du(n == vm.ss.top);
            Ok(())
        });
        self.code(">", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du(n > vm.ss.top);
            Ok(())
        });
        self.code("<", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du(n < vm.ss.top);
            Ok(())
        });
        self.code("<>", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du(n != vm.ss.top);
            Ok(())
        });
        self.code(">=", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du(n >= vm.ss.top);
            Ok(())
        });
        self.code("<=", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du(n <= vm.ss.top);
            Ok(())
        });
        self.code("U<", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du((n as u32) < (vm.ss.top as u32));
            Ok(())
        });
        self.code("U>", |vm| {
            let n = vm.ss.raw_pop()?;
            vm.ss.top = bool_du((n as u32) > (vm.ss.top as u32));
            Ok(())
        });

        // ---- IO -------------------------------------------------------
        self.code("CASE!", |vm| {
            vm.ucase = vm.pop()? == 0;
            Ok(())
        });
        self.code("BASE", |vm| vm.push(0)); // address of the BASE user cell
        self.code("DECIMAL", |vm| {
            vm.set_base(10);
            Ok(())
        });
        self.code("HEX", |vm| {
            vm.set_base(16);
            Ok(())
        });
        self.code("BL", |vm| {
            vm.fout.push(' ');
            Ok(())
        });
        self.code("CR", |vm| {
            vm.fout.push('\n');
            Ok(())
        });
        self.code(".", |vm| {
            let v = vm.pop()?;
            let s = crate::debug::fmt_du(v, vm.base());
            vm.fout.push_str(&s);
            vm.fout.push(' ');
            Ok(())
        });
        self.code("U.", |vm| {
            let v = vm.pop()?;
            let s = crate::debug::fmt_unsigned(v, vm.base());
            vm.fout.push_str(&s);
            vm.fout.push(' ');
            Ok(())
        });
        self.code(".R", |vm| {
            let w = vm.pop()?.max(0) as usize;
            let v = vm.pop()?;
            let s = crate::debug::fmt_du(v, vm.base());
            vm.fout.push_str(&format!("{s:>w$}"));
            Ok(())
        });
        self.code("U.R", |vm| {
            let w = vm.pop()?.max(0) as usize;
            let v = vm.pop()?;
            let s = crate::debug::fmt_unsigned(v, vm.base());
            vm.fout.push_str(&format!("{s:>w$}"));
            Ok(())
        });
        self.code("TYPE", |vm| {
            vm.pop()?; // length; the stored string is NUL-terminated
            let a = vm.pop_iu()?;
            let s = vm.pmem.str_at(a)?;
            vm.fout.push_str(&s);
            Ok(())
        });
        self.immd("KEY", |vm| {
            if vm.compile {
                vm.add_w(Op::Key as IU)
            } else {
                vm.state = VmState::Io; // ask the host for one character
                Ok(())
            }
        });
        self.code("EMIT", |vm| {
            let b = (vm.pop()? & 0xff) as u8;
            vm.fout.push(b as char);
            Ok(())
        });
        self.code("SPACE", |vm| {
            vm.fout.push(' ');
            Ok(())
        });
        self.code("SPACES", |vm| {
            let n = vm.pop()?.max(0) as usize;
            for _ in 0..n {
                vm.fout.push(' ');
            }
            Ok(())
        });

        // ---- literals and comments ------------------------------------
        self.immd("[", |vm| {
            vm.compile = false;
            Ok(())
        });
        self.code("]", |vm| {
            vm.compile = true;
            Ok(())
        });
        self.immd("(", |vm| {
            vm.scan(')');
            Ok(())
        });
        self.immd(".(", |vm| {
            let s = vm.scan(')');
            vm.fout.push_str(&s);
            Ok(())
        });
        self.immd("\\", |vm| {
            vm.scan('\n');
            Ok(())
        });
        self.immd("s\"", |vm| vm.s_quote(Op::Str));
        self.immd(".\"", |vm| vm.s_quote(Op::Dotq));

        // ---- branching ------------------------------------------------
        self.immd("IF", |vm| {
            vm.add_w(Op::Zbran as IU)?;
            vm.here_marker()?;
            vm.pmem.add_iu(0)
        });
        self.immd("ELSE", |vm| {
            vm.add_w(Op::Bran as IU)?;
            let h = vm.pmem.here();
            vm.pmem.add_iu(0)?;
            let a = vm.pop_iu()?;
            vm.pmem.setjmp(a)?;
            vm.push(h as DU)
        });
        self.immd("THEN", |vm| {
            let a = vm.pop_iu()?;
            vm.pmem.setjmp(a)
        });

        // ---- loops ----------------------------------------------------
        self.immd("BEGIN", |vm| vm.here_marker());
        self.immd("AGAIN", |vm| {
            vm.add_w(Op::Bran as IU)?;
            let a = vm.pop_iu()?;
            vm.pmem.add_iu(a)
        });
        self.immd("UNTIL", |vm| {
            vm.add_w(Op::Zbran as IU)?;
            let a = vm.pop_iu()?;
            vm.pmem.add_iu(a)
        });
        self.immd("WHILE", |vm| {
            vm.add_w(Op::Zbran as IU)?;
            vm.here_marker()?;
            vm.pmem.add_iu(0)
        });
        self.immd("REPEAT", |vm| {
            vm.add_w(Op::Bran as IU)?;
            let t = vm.pop_iu()?;
            let b = vm.pop_iu()?;
            vm.pmem.add_iu(b)?;
            vm.pmem.setjmp(t)
        });
        self.immd("FOR", |vm| {
            vm.add_w(Op::For as IU)?;
            vm.here_marker()
        });
        self.immd("NEXT", |vm| {
            vm.add_w(Op::Next as IU)?;
            let a = vm.pop_iu()?;
            vm.pmem.add_iu(a)
        });
        self.immd("AFT", |vm| {
            // for ... aft ... then ... next: first pass branches over
            vm.pop()?;
            vm.add_w(Op::Bran as IU)?;
            let h = vm.pmem.here();
            vm.pmem.add_iu(0)?;
            vm.here_marker()?;
            vm.push(h as DU)
        });
        self.immd("DO", |vm| {
            vm.add_w(Op::Do as IU)?;
            vm.here_marker()
        });
        self.code("I", |vm| {
            let n = vm.rs.at(-1)?;
            vm.push(n)
        });
        self.code("LEAVE", |vm| {
            vm.rs.pop()?;
            vm.rs.pop()?;
            vm.unnest()
        });
        self.immd("LOOP", |vm| {
            vm.add_w(Op::Loop as IU)?;
            let a = vm.pop_iu()?;
            vm.pmem.add_iu(a)
        });

        // ---- return stack ---------------------------------------------
        self.code(">R", |vm| {
            let n = vm.pop()?;
            vm.rs.push(n)
        });
        self.code("R>", |vm| {
            let n = vm.rs.pop()?;
            vm.push(n)
        });
        self.code("R@", |vm| {
            let n = vm.rs.at(-1)?;
            vm.push(n)
        });

        // ---- compiler -------------------------------------------------
        self.code(":", |vm| {
            let name = vm.word();
            vm.compile = vm.def_word(&name)?;
            Ok(())
        });
        self.immd(";", |vm| {
            if vm.compile {
                vm.add_w(Op::Exit as IU)?;
                vm.compile = false;
            }
            Ok(())
        });
        self.code("EXIT", |vm| vm.unnest());
        self.code("VARIABLE", |vm| {
            let name = vm.word();
            if vm.def_word(&name)? {
                vm.add_var(Op::Var)?;
            }
            Ok(())
        });
        self.code("CONSTANT", |vm| {
            let name = vm.word();
            if vm.def_word(&name)? {
                vm.add_w(Op::Lit as IU)?;
                let v = vm.pop()?;
                vm.pmem.add_du(v)?;
                vm.add_w(Op::Exit as IU)?;
            }
            Ok(())
        });
        self.immd("IMMEDIATE", |vm| {
            vm.dict.last_mut().attr |= IMM_ATTR;
            Ok(())
        });

        // ---- metacompiler ---------------------------------------------
        self.code("EXEC", |vm| {
            let w = vm.pop_iu()?;
            vm.call(w)
        });
        self.code("CREATE", |vm| {
            let name = vm.word();
            if vm.def_word(&name)? {
                vm.add_var(Op::Vbran)?; // vbran + DOES> target slot
            }
            Ok(())
        });
        self.immd("DOES>", |vm| vm.add_w(Op::Does as IU));
        self.immd("TO", |vm| {
            // alter a constant: 3 TO X
            let w = if vm.state == VmState::Query {
                let name = vm.word();
                vm.find(&name)
            } else {
                vm.pop_iu()?
            };
            if w == 0 {
                return Ok(());
            }
            if vm.compile {
                vm.add_w(Op::Lit as IU)?;
                vm.pmem.add_du(w as DU)?;
                let to = vm.find("TO");
                vm.add_w(to)
            } else {
                let Some(c) = vm.dict.get(w) else {
                    return Ok(());
                };
                if !c.is_udf() {
                    return Ok(());
                }
                let a = c.pfa + IU_SZ; // the LIT payload
                let v = vm.pop()?;
                vm.pmem.dset(a, v)
            }
        });
        self.immd("IS", |vm| {
            // alias a word: ' Y IS X
            let w = if vm.state == VmState::Query {
                let name = vm.word();
                vm.find(&name)
            } else {
                vm.pop_iu()?
            };
            if w == 0 {
                return Ok(());
            }
            if vm.compile {
                vm.add_w(Op::Lit as IU)?;
                vm.pmem.add_du(w as DU)?;
                let is = vm.find("IS");
                vm.add_w(is)
            } else {
                let t = vm.pop_iu()?;
                let xt = vm.dict.get(w).and_then(|c| c.xt);
                if let Some(c) = vm.dict.get_mut(t) {
                    c.xt = xt;
                }
                Ok(())
            }
        });

        // ---- memory ---------------------------------------------------
        self.code("@", |vm| {
            let a = vm.pop_iu()?;
            let v = vm.fetch(a)?;
            vm.push(v)
        });
        self.code("!", |vm| {
            let a = vm.pop_iu()?;
            let v = vm.pop()?;
            vm.store(a, v)
        });
        self.code(",", |vm| {
            let v = vm.pop()?;
            vm.pmem.add_du(v)
        });
        self.code("N,", |vm| {
            let v = vm.pop_iu()?;
            vm.pmem.add_iu(v)
        });
        self.code("CELLS", |vm| {
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_mul(DU_SZ as DU);
            Ok(())
        });
        self.code("ALLOT", |vm| {
            let n = vm.pop()?.max(0) as usize;
            let mut i = 0;
            while i < n {
                vm.pmem.add_du(0)?;
                i += DU_SZ as usize;
            }
            Ok(())
        });
        self.code("TH", |vm| {
            // w i -- w' : index into a cell array
            let n = vm.pop()?;
            vm.ss.need(1)?;
            vm.ss.top = vm.ss.top.wrapping_add(n.wrapping_mul(DU_SZ as DU));
            Ok(())
        });
        self.code("+!", |vm| {
            let a = vm.pop_iu()?;
            let n = vm.pop()?;
            let v = vm.fetch(a)?.wrapping_add(n);
            vm.store(a, v)
        });
        self.code("?", |vm| {
            let a = vm.pop_iu()?;
            let v = vm.fetch(a)?;
            let s = crate::debug::fmt_du(v, vm.base());
            vm.fout.push_str(&s);
            vm.fout.push(' ');
            Ok(())
        });

        // ---- debug ----------------------------------------------------
        self.code("ABORT", |vm| {
            vm.abort_stacks();
            Ok(())
        });
        self.code("HERE", |vm| vm.here_marker());
        self.code("'", |vm| {
            let name = vm.word();
            let w = vm.find(&name);
            if w != 0 {
                vm.push(w as DU)?;
            }
            Ok(())
        });
        self.code(".S", |vm| {
            vm.ss_dump();
            Ok(())
        });
        self.code("DEPTH", |vm| {
            let d = vm.ss.depth() as DU;
            vm.push(d)
        });
        self.code("R", |vm| {
            let d = vm.rs.len() as DU;
            vm.push(d)
        });
        self.code("WORDS", |vm| {
            vm.words();
            Ok(())
        });
        self.code("SEE", |vm| {
            let name = vm.word();
            let w = vm.find(&name);
            if w == 0 {
                return Ok(());
            }
            vm.see_word(w)
        });
        self.code("DUMP", |vm| {
            let n = vm.pop_iu()?;
            let a = vm.pop_iu()?;
            vm.mem_dump(a, n);
            Ok(())
        });
        self.code("DICT", |vm| {
            vm.dict_dump();
            Ok(())
        });
        self.code("FORGET", |vm| {
            let name = vm.word();
            let w = vm.find(&name);
            if w == 0 {
                return Ok(());
            }
            let boot = vm.find("BOOT") + 1;
            if w > boot {
                let nfa = vm.dict.get(w).map(|c| c.nfa()).unwrap_or(0);
                vm.pmem.rewind(nfa);
                vm.dict.truncate(w);
            } else {
                vm.pmem.rewind(crate::opcode::USER_AREA);
                vm.dict.truncate(boot);
            }
            Ok(())
        });

        // ---- OS -------------------------------------------------------
        self.code("MSTAT", |vm| {
            vm.mem_stat();
            Ok(())
        });
        self.code("MS", |vm| {
            let t = vm.millis() as DU;
            vm.push(t)
        });
        self.code("RND", |vm| vm.push((rand::random::<u32>() >> 1) as DU));
        self.code("DELAY", |vm| {
            let ms = vm.pop()?.max(0) as u64;
            thread::sleep(Duration::from_millis(ms));
            Ok(())
        });
        self.code("INCLUDED", |vm| {
            // ( addr len -- ) load and run an external script
            vm.pop()?;
            let a = vm.pop_iu()?;
            let path = vm.pmem.str_at(a)?;
            vm.load(&path)
        });
        self.code("BYE", |_| Err(ForthError::Bye));
        self.code("BOOT", |vm| {
            let boot = vm.find("BOOT") + 1;
            vm.dict.truncate(boot);
            vm.pmem.rewind(crate::opcode::USER_AREA);
            Ok(())
        });
    }
}
