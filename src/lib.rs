//! # bellows
//!
//! A self-hosting, eForth-style Forth virtual machine: threaded code packed
//! into a byte-addressable parameter memory, a dictionary of built-in and
//! colon words, an iterative inner interpreter, and a line-oriented outer
//! interpreter that cooperatively yields for key input and time slicing.
//!
//! ```
//! use bellows::Vm;
//!
//! let mut vm = Vm::new();
//! let mut out = String::new();
//! vm.forth_vm(Some(": SQ DUP * ; 7 SQ"), &mut |_, s| out.push_str(s));
//! assert_eq!(vm.stack(), vec![49]);
//! ```

pub mod compile;
pub mod config;
pub mod debug;
pub mod dict;
pub mod error;
pub mod inner;
pub mod memory;
pub mod opcode;
pub mod outer;
pub mod primitives;
pub mod stack;
pub mod vm;

pub use config::{DU, IU};
pub use error::ForthError;
pub use vm::{Vm, VmState};
