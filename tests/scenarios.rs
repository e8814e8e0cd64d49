// scenarios.rs - end-to-end sessions and VM invariants

mod common;
use common::{feed, forth};

use bellows::config::{DICT_SZ, PMEM_SZ, SS_SZ};

#[test]
fn square_a_number() {
    let (_, out) = forth(&[": SQ DUP * ; 7 SQ"]);
    assert!(out.contains("49"));
}

#[test]
fn radix_session() {
    let (_, out) = forth(&["255 HEX . DECIMAL 255 ."]);
    assert!(out.contains("ff 255"));
}

#[test]
fn hello_session() {
    let (_, out) = forth(&[".\" hello\""]);
    assert!(out.contains("hello"));
}

#[test]
fn summing_loop() {
    let (vm, _) = forth(&[": COUNT 0 10 0 DO I + LOOP ;", "COUNT"]);
    assert_eq!(vm.stack().last(), Some(&45));
}

#[test]
fn variable_session() {
    let (vm, _) = forth(&["VARIABLE V 5 V ! V @ 3 + V !", "V @"]);
    assert_eq!(vm.stack(), vec![8]);
}

#[test]
fn failed_compile_resets() {
    let (vm, out) = forth(&[": BAD UNKNOWNWORD ;"]);
    assert!(out.contains("UNKNOWNWORD? "));
    assert!(!vm.compiling());
}

#[test]
fn sentinel_is_never_found() {
    let vm = bellows::Vm::new();
    assert_eq!(vm.find("nul "), 0);
}

#[test]
fn bounds_hold_after_a_session() {
    let mut vm = bellows::Vm::new();
    feed(
        &mut vm,
        &[
            ": FIB DUP 2 < IF EXIT THEN 1- DUP 1- ;",
            "VARIABLE A  CREATE B 4 CELLS ALLOT",
            ": LOOPY 0 100 0 DO I + LOOP ;",
            "LOOPY FIB",
        ],
    );
    assert!(vm.depth() <= SS_SZ);
    assert!((vm.here() as usize) <= PMEM_SZ);
    assert!(vm.dict_len() <= DICT_SZ);
}

#[test]
fn deep_nesting_round_trips() {
    let mut vm = bellows::Vm::new();
    feed(&mut vm, &[": A 1 + ;", ": B A A ;", ": C B B ;", ": D C C ;"]);
    feed(&mut vm, &["0 D"]);
    assert_eq!(vm.stack(), vec![8]);
}

#[test]
fn mixed_session_keeps_working_after_errors() {
    let mut vm = bellows::Vm::new();
    let out = feed(
        &mut vm,
        &["1 2 NOPE", "3 4 +", "DROP DROP DROP DROP", ": T 5 ;", "T"],
    );
    assert!(out.contains("NOPE? "));
    assert!(out.contains("Stack underflow"));
    assert_eq!(vm.stack(), vec![5]);
}
