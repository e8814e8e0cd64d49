// compiler_tests.rs - colon definitions, control flow and defining words

mod common;
use common::{feed, forth};

#[test]
fn compile_execute_equivalence() {
    let (a, _) = forth(&[": FOO 1 2 + ;", "FOO"]);
    let (b, _) = forth(&["1 2 +"]);
    assert_eq!(a.stack(), b.stack());
    assert_eq!(a.stack(), vec![3]);
}

#[test]
fn definition_and_call_on_one_line() {
    let (vm, out) = forth(&[": SQ DUP * ; 7 SQ"]);
    assert_eq!(vm.stack(), vec![49]);
    assert!(out.contains("49"));
}

#[test]
fn compile_flag_spans_definition_only() {
    let mut vm = bellows::Vm::new();
    feed(&mut vm, &[": HALF"]);
    assert!(vm.compiling());
    feed(&mut vm, &["2 / ;"]);
    assert!(!vm.compiling());
    feed(&mut vm, &["8 HALF"]);
    assert_eq!(vm.stack(), vec![4]);
}

#[test]
fn if_then_branches() {
    let (vm, _) = forth(&[": T 5 0 > IF 1 ELSE 2 THEN ;", "T"]);
    assert_eq!(vm.stack(), vec![1]);
    let (vm, _) = forth(&[": T 0 5 > IF 1 ELSE 2 THEN ;", "T"]);
    assert_eq!(vm.stack(), vec![2]);
}

#[test]
fn if_without_else() {
    let (vm, _) = forth(&[": T DUP 0< IF NEGATE THEN ;", "-7 T 7 T"]);
    assert_eq!(vm.stack(), vec![7, 7]);
}

#[test]
fn begin_until_counts_down() {
    let (vm, out) = forth(&[": CD 5 BEGIN DUP . 1- DUP 0= UNTIL DROP ;", "CD"]);
    assert!(out.contains("5 4 3 2 1"));
    assert!(vm.stack().is_empty());
}

#[test]
fn begin_while_repeat() {
    let (vm, out) = forth(&[": W 5 BEGIN DUP 0> WHILE DUP . 1- REPEAT DROP ;", "W"]);
    assert!(out.contains("5 4 3 2 1"));
    assert!(vm.stack().is_empty());
}

#[test]
fn for_next_counts_to_zero() {
    let (vm, _) = forth(&[": T 3 FOR I NEXT ;", "T"]);
    assert_eq!(vm.stack(), vec![3, 2, 1, 0]);
}

#[test]
fn for_aft_skips_first_pass() {
    let (vm, _) = forth(&[": T 3 FOR AFT I THEN NEXT ;", "T"]);
    assert_eq!(vm.stack(), vec![2, 1, 0]);
}

#[test]
fn do_loop_runs_index_to_limit() {
    let (vm, _) = forth(&[": T 5 0 DO I LOOP ;", "T"]);
    assert_eq!(vm.stack(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn do_loop_sums() {
    let (vm, _) = forth(&[": COUNT 0 10 0 DO I + LOOP ;", "COUNT"]);
    assert_eq!(vm.stack(), vec![45]);
}

#[test]
fn leave_exits_the_word() {
    let (vm, _) = forth(&[": T 10 0 DO I I 3 = IF LEAVE THEN LOOP 99 ;", "T"]);
    assert_eq!(vm.stack(), vec![0, 1, 2, 3]);
}

#[test]
fn long_loop_survives_time_slicing() {
    let (vm, _) = forth(&[": SUM 0 1000 FOR 1 + NEXT ;", "SUM"]);
    assert_eq!(vm.stack(), vec![1001]);
}

#[test]
fn nested_colon_calls() {
    let (vm, _) = forth(&[": A 1 ;", ": B A A + ;", ": C B B * ;", "C"]);
    assert_eq!(vm.stack(), vec![4]);
}

#[test]
fn early_exit_word() {
    let (vm, _) = forth(&[": T 1 EXIT 2 ;", "T"]);
    assert_eq!(vm.stack(), vec![1]);
}

#[test]
fn variable_store_fetch() {
    let (vm, _) = forth(&["VARIABLE X", "7 X !", "X @"]);
    assert_eq!(vm.stack(), vec![7]);
}

#[test]
fn variable_plus_store_and_question() {
    let (vm, out) = forth(&["VARIABLE X", "5 X !", "3 X +!", "X ?"]);
    assert!(out.contains("8 "));
    assert!(vm.stack().is_empty());
}

#[test]
fn constant_pushes_value() {
    let (vm, _) = forth(&["42 CONSTANT Y", "Y Y +"]);
    assert_eq!(vm.stack(), vec![84]);
}

#[test]
fn create_allot_builds_an_array() {
    let (vm, _) = forth(&[
        "CREATE BUF 2 CELLS ALLOT",
        "7 BUF !",
        "9 BUF 1 TH !",
        "BUF @ BUF 1 TH @",
    ]);
    assert_eq!(vm.stack(), vec![7, 9]);
}

#[test]
fn create_does_defines_defining_words() {
    let (vm, _) = forth(&[": CONST CREATE , DOES> @ ;", "99 CONST Z", "Z"]);
    assert_eq!(vm.stack(), vec![99]);
}

#[test]
fn to_rewrites_a_constant() {
    let (vm, _) = forth(&["42 CONSTANT Y", "7 TO Y", "Y"]);
    assert_eq!(vm.stack(), vec![7]);
}

#[test]
fn to_inside_a_definition() {
    let (vm, _) = forth(&["42 CONSTANT Y", ": SET 7 TO Y ;", "SET Y"]);
    assert_eq!(vm.stack(), vec![7]);
}

#[test]
fn is_aliases_a_built_in() {
    // the tick'd word takes on the behavior of the word after IS
    let (_, out) = forth(&["' DECIMAL IS HEX", "DECIMAL 255 ."]);
    assert!(out.contains("ff "));
}

#[test]
fn tick_and_exec() {
    let (vm, _) = forth(&[": DBL 2 * ;", "5 ' DBL EXEC"]);
    assert_eq!(vm.stack(), vec![10]);
}

#[test]
fn immediate_marks_last_word() {
    // an immediate word runs during compilation
    let (vm, _) = forth(&[": MARK 7 ; IMMEDIATE", ": T MARK ;", "T"]);
    assert_eq!(vm.stack(), vec![7]);
    // and was executed while T compiled, leaving nothing in T's body
}

#[test]
fn bracket_toggles_compile_mode() {
    let mut vm = bellows::Vm::new();
    feed(&mut vm, &["]"]);
    assert!(vm.compiling());
    feed(&mut vm, &["["]);
    assert!(!vm.compiling());
}

#[test]
fn redefinition_warns_and_shadows() {
    let (vm, out) = forth(&[": X 1 ;", ": X 2 ;", "X"]);
    assert!(out.contains("X reDef?"));
    assert_eq!(vm.stack(), vec![2]);
}

#[test]
fn missing_name_is_reported() {
    let (vm, out) = forth(&[":"]);
    assert!(out.contains("name?"));
    assert!(!vm.compiling());
}

#[test]
fn unknown_word_inside_definition_aborts_compile() {
    let (vm, out) = forth(&[": BAD UNKNOWNWORD ;"]);
    assert!(out.contains("UNKNOWNWORD? "));
    assert!(!vm.compiling());
}
