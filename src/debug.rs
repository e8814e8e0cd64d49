// debug.rs - introspection: stack display, WORDS, SEE, DUMP, DICT, MSTAT

use crate::config::{dalign, str_sz, DICT_SZ, DU, DU_SZ, IU, IU_SZ, PMEM_SZ, RS_SZ, SS_SZ};
use crate::error::ForthError;
use crate::opcode::{is_prim, Op, EXT_FLAG};
use crate::vm::Vm;

type Result<T> = std::result::Result<T, ForthError>;

const APP_VERSION: &str = concat!("bellows v", env!("CARGO_PKG_VERSION"));

/// Render a cell in the given radix: sign for negatives, digits 0-9 then
/// a-z. Radixes outside 2..=36 fall back to decimal.
pub(crate) fn fmt_du(v: DU, base: u32) -> String {
    let base = if (2..=36).contains(&base) { base } else { 10 };
    let mut n = (v as i64).unsigned_abs();
    let mut buf: Vec<u8> = Vec::new();
    loop {
        let d = (n % base as u64) as u8;
        buf.push(if d > 9 { d - 10 + b'a' } else { d + b'0' });
        n /= base as u64;
        if n == 0 {
            break;
        }
    }
    if v < 0 {
        buf.push(b'-');
    }
    buf.iter().rev().map(|&b| b as char).collect()
}

/// Render a cell reinterpreted as unsigned (U. and friends).
pub(crate) fn fmt_unsigned(v: DU, base: u32) -> String {
    let base = if (2..=36).contains(&base) { base } else { 10 };
    let mut n = v as u32 as u64;
    let mut buf: Vec<u8> = Vec::new();
    loop {
        let d = (n % base as u64) as u8;
        buf.push(if d > 9 { d - 10 + b'a' } else { d + b'0' });
        n /= base as u64;
        if n == 0 {
            break;
        }
    }
    buf.iter().rev().map(|&b| b as char).collect()
}

impl Vm {
    /// Stack display appended after each non-compiling line.
    pub(crate) fn ss_dump(&mut self) {
        let base = self.base();
        let mut line = String::new();
        for &v in self.ss.cells() {
            line.push_str(&fmt_du(v, base));
            line.push(' ');
        }
        if self.ss.depth() > 0 {
            line.push_str(&fmt_du(self.ss.top, base));
            line.push(' ');
        }
        line.push_str("-> ok\n");
        self.fout.push_str(&line);
    }

    pub(crate) fn words(&mut self) {
        const WIDTH: usize = 60;
        let names: Vec<String> = self
            .dict
            .iter()
            .map(|c| c.name.clone())
            .filter(|n| !n.ends_with(' ')) // hide the sentinel
            .collect();
        let mut sz = 0;
        for name in names {
            sz += name.len() + 2;
            self.fout.push_str("  ");
            self.fout.push_str(&name);
            if sz > WIDTH {
                sz = 0;
                self.fout.push('\n');
            }
        }
        self.fout.push('\n');
    }

    /// Reverse-lookup an IU to a dictionary index; primitives map to
    /// themselves, 0 means unknown.
    fn pfa2didx(&self, ix: IU) -> IU {
        if is_prim(ix) {
            return ix;
        }
        if ix & EXT_FLAG != 0 {
            let pfa = ix & !EXT_FLAG;
            for i in (1..self.dict.len()).rev() {
                if let Some(c) = self.dict.get(i as IU) {
                    if c.is_udf() && c.pfa == pfa {
                        return i as IU;
                    }
                }
            }
            0
        } else {
            match self.dict.get(ix) {
                Some(c) if !c.is_udf() => ix,
                _ => 0,
            }
        }
    }

    /// Byte count of the data field behind a VAR/VBRAN header, bounded by
    /// the next word's name field (or HERE for the latest word).
    fn pfa2nvar(&self, pfa: IU) -> usize {
        let Ok(w) = self.pmem.iget(pfa) else { return 0 };
        let slots = if w == Op::Var as IU {
            1
        } else if w == Op::Vbran as IU {
            2
        } else {
            return 0;
        };
        let i0 = self.pfa2didx(pfa | EXT_FLAG);
        if i0 == 0 {
            return 0;
        }
        let a = dalign(pfa + IU_SZ * slots);
        let p1 = match self.dict.get(i0 + 1) {
            Some(c) if c.is_udf() => c.nfa(),
            _ => self.pmem.here(),
        };
        p1.saturating_sub(a) as usize
    }

    /// Disassemble one instruction at `addr` (`w` is its resolved token).
    fn to_s(&mut self, w: IU, addr: IU) -> Result<()> {
        let base = self.base();
        let ip = addr + IU_SZ;
        if w == Op::Lit as IU {
            let v = self.pmem.dget(ip)?;
            self.fout.push_str(&fmt_du(v, base));
            self.fout.push_str(" ( lit )");
        } else if w == Op::Str as IU {
            let s = self.pmem.str_at(ip)?;
            self.fout.push_str(&format!("s\" {s}\""));
        } else if w == Op::Dotq as IU {
            let s = self.pmem.str_at(ip)?;
            self.fout.push_str(&format!(".\" {s}\""));
        } else {
            if w == Op::Var as IU || w == Op::Vbran as IU {
                let n = self.pfa2nvar(addr);
                let a0 = dalign(ip + if w == Op::Var as IU { 0 } else { IU_SZ });
                let mut i = 0;
                while i < n {
                    let v = self.pmem.dget(a0 + i as IU)?;
                    self.fout.push_str(&fmt_du(v, base));
                    self.fout.push(' ');
                    i += DU_SZ as usize;
                }
            }
            let name = if is_prim(w) {
                Op::from_iu(w).map(Op::mnemonic).unwrap_or("?").to_string()
            } else {
                self.dict
                    .get(w)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "?".to_string())
            };
            self.fout.push_str(&name);
        }
        // jump targets
        if w == Op::Next as IU
            || w == Op::Loop as IU
            || w == Op::Bran as IU
            || w == Op::Zbran as IU
            || w == Op::Vbran as IU
        {
            let t = self.pmem.iget(ip)?;
            self.fout.push_str(&format!(" {t:04x}"));
        }
        Ok(())
    }

    /// SEE: name header plus a recursive walk of the threaded code.
    pub(crate) fn see_word(&mut self, w: IU) -> Result<()> {
        let Some(c) = self.dict.get(w) else {
            return Ok(());
        };
        let (name, udf, pfa) = (c.name.clone(), c.is_udf(), c.pfa);
        self.fout.push_str(": ");
        self.fout.push_str(&name);
        if udf {
            self.see(pfa)?;
        } else {
            self.fout.push_str(" ( built-ins ) ;");
        }
        self.fout.push('\n');
        Ok(())
    }

    fn see(&mut self, pfa: IU) -> Result<()> {
        let mut ip = pfa;
        loop {
            let w = self.pfa2didx(self.pmem.iget(ip)?);
            if w == 0 {
                break;
            }
            self.fout.push_str("\n  ");
            self.to_s(w, ip)?;
            if w == Op::Exit as IU || w == Op::Var as IU {
                return Ok(());
            }
            ip += IU_SZ;
            if w == Op::Lit as IU {
                ip += DU_SZ;
            } else if w == Op::Str as IU || w == Op::Dotq as IU {
                let s = self.pmem.str_at(ip)?;
                ip += str_sz(&s);
            } else if w == Op::Bran as IU
                || w == Op::Zbran as IU
                || w == Op::Next as IU
                || w == Op::Loop as IU
            {
                ip += IU_SZ;
            } else if w == Op::Vbran as IU {
                let t = self.pmem.iget(ip)?;
                if t == 0 {
                    return Ok(()); // plain CREATE, no DOES> body to follow
                }
                ip = t;
            }
        }
        Ok(())
    }

    /// Hex-and-ASCII dump of a PMEM range, 16 bytes per row.
    pub(crate) fn mem_dump(&mut self, p0: IU, sz: IU) {
        let mut line = String::new();
        let start = ((p0 as u32 + 15) & !15).min(PMEM_SZ as u32 - 16);
        let end = ((p0 as u32 + sz as u32 + 15) & !15).min(PMEM_SZ as u32 - 16);
        let mut i = start;
        while i <= end {
            line.push_str(&format!("{i:04x}: "));
            for j in 0..16 {
                let c = self.pmem.byte((i + j) as IU);
                line.push_str(&format!("{c:02x}"));
                if j % 4 == 3 {
                    line.push(' ');
                }
            }
            for j in 0..16 {
                let c = self.pmem.byte((i + j) as IU) & 0x7f;
                line.push(if c == 0x7f || c < 0x20 { '_' } else { c as char });
            }
            line.push('\n');
            i += 16;
        }
        self.fout.push_str(&line);
    }

    /// One row per dictionary entry: index, attributes, pfa or xt marker.
    pub(crate) fn dict_dump(&mut self) {
        let rows: Vec<String> = self
            .dict
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let kind = if c.is_udf() {
                    format!("pfa={:04x}", c.pfa)
                } else {
                    "built-in".to_string()
                };
                format!("{i:3}> attr={} {kind:10} {}\n", c.attr & 0x3, c.name)
            })
            .collect();
        for r in rows {
            self.fout.push_str(&r);
        }
    }

    pub(crate) fn mem_stat(&mut self) {
        let stat = format!(
            "{APP_VERSION}\n  dict: {}/{}\n  ss  : {}/{}\n  rs  : {}/{}\n  mem : {}/{}\n",
            self.dict.len(),
            DICT_SZ,
            self.ss.depth(),
            SS_SZ,
            self.rs.len(),
            RS_SZ,
            self.pmem.here(),
            PMEM_SZ
        );
        self.fout.push_str(&stat);
    }
}
