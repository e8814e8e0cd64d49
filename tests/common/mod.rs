// common/mod.rs - shared harness for the integration tests
#![allow(dead_code)]

use bellows::{Vm, VmState};

/// Run each line through a fresh VM and return it plus everything written
/// to the output hook.
pub fn forth(lines: &[&str]) -> (Vm, String) {
    let mut vm = Vm::new();
    let out = feed(&mut vm, lines);
    (vm, out)
}

/// Feed lines to an existing VM, resuming time-slice yields transparently.
pub fn feed(vm: &mut Vm, lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        let mut hook = |_: i32, s: &str| out.push_str(s);
        let mut yielded = vm.forth_vm(Some(line), &mut hook);
        while yielded && vm.state() == VmState::Hold {
            yielded = vm.forth_vm(None, &mut hook);
        }
        assert_ne!(vm.state(), VmState::Io, "unexpected KEY yield in {line:?}");
    }
    out
}
