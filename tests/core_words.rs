// core_words.rs - stack, arithmetic, bitwise and comparison words

mod common;
use common::forth;

#[test]
fn dup_drop_is_identity() {
    let (vm, _) = forth(&["5 DUP DROP"]);
    assert_eq!(vm.stack(), vec![5]);
}

#[test]
fn swap_swap_is_identity() {
    let (vm, _) = forth(&["1 2 SWAP SWAP"]);
    assert_eq!(vm.stack(), vec![1, 2]);
}

#[test]
fn over_over_equals_2dup() {
    let (a, _) = forth(&["1 2 OVER OVER"]);
    let (b, _) = forth(&["1 2 2DUP"]);
    assert_eq!(a.stack(), b.stack());
    assert_eq!(a.stack(), vec![1, 2, 1, 2]);
}

#[test]
fn rot_cycles_three() {
    let (vm, _) = forth(&["1 2 3 ROT"]);
    assert_eq!(vm.stack(), vec![2, 3, 1]);
}

#[test]
fn minus_rot_cycles_back() {
    let (vm, _) = forth(&["1 2 3 -ROT"]);
    assert_eq!(vm.stack(), vec![3, 1, 2]);
}

#[test]
fn nip_drops_second() {
    let (vm, _) = forth(&["1 2 NIP"]);
    assert_eq!(vm.stack(), vec![2]);
}

#[test]
fn pick_copies_nth_below_count() {
    let (vm, _) = forth(&["10 20 30 2 PICK"]);
    assert_eq!(vm.stack(), vec![10, 20, 30, 20]);
}

#[test]
fn zero_pick_is_a_stack_error() {
    let (vm, out) = forth(&["1 0 PICK"]);
    assert!(out.contains("Stack underflow"));
    assert!(vm.stack().is_empty()); // diagnostics abort and clear
}

#[test]
fn double_cell_shufflers() {
    let (vm, _) = forth(&["1 2 3 4 2SWAP"]);
    assert_eq!(vm.stack(), vec![3, 4, 1, 2]);
    let (vm, _) = forth(&["1 2 3 4 2OVER"]);
    assert_eq!(vm.stack(), vec![1, 2, 3, 4, 1, 2]);
    let (vm, _) = forth(&["1 2 2DROP"]);
    assert!(vm.stack().is_empty());
}

#[test]
fn question_dup() {
    let (vm, _) = forth(&["5 ?DUP"]);
    assert_eq!(vm.stack(), vec![5, 5]);
    let (vm, _) = forth(&["0 ?DUP"]);
    assert_eq!(vm.stack(), vec![0]);
}

#[test]
fn addition_is_commutative() {
    let (a, _) = forth(&["3 4 +"]);
    let (b, _) = forth(&["4 3 +"]);
    assert_eq!(a.stack(), b.stack());
    assert_eq!(a.stack(), vec![7]);
}

#[test]
fn subtract_then_add_recovers() {
    // A B - then B + recovers A
    let (vm, _) = forth(&["17 5 - 5 +"]);
    assert_eq!(vm.stack(), vec![17]);
}

#[test]
fn division_and_modulo() {
    let (vm, _) = forth(&["17 5 /"]);
    assert_eq!(vm.stack(), vec![3]);
    let (vm, _) = forth(&["17 5 MOD"]);
    assert_eq!(vm.stack(), vec![2]);
    let (vm, _) = forth(&["17 5 /MOD"]);
    assert_eq!(vm.stack(), vec![2, 3]);
}

#[test]
fn scaled_arithmetic() {
    let (vm, _) = forth(&["10 20 7 */"]);
    assert_eq!(vm.stack(), vec![28]);
    let (vm, _) = forth(&["10 20 7 */MOD"]);
    assert_eq!(vm.stack(), vec![4, 28]);
}

#[test]
fn division_by_zero_reports() {
    let (vm, out) = forth(&["1 0 /"]);
    assert!(out.contains("Division by zero"));
    assert!(vm.stack().is_empty());
}

#[test]
fn max_and_min() {
    let (vm, _) = forth(&["3 7 MAX 3 7 MIN"]);
    assert_eq!(vm.stack(), vec![7, 3]);
}

#[test]
fn bitwise_ops() {
    let (vm, _) = forth(&["12 10 AND 12 10 OR 12 10 XOR"]);
    assert_eq!(vm.stack(), vec![8, 14, 6]);
    let (vm, _) = forth(&["0 INVERT"]);
    assert_eq!(vm.stack(), vec![-1]);
    let (vm, _) = forth(&["1 4 LSHIFT 16 2 RSHIFT"]);
    assert_eq!(vm.stack(), vec![16, 4]);
}

#[test]
fn unary_ops() {
    let (vm, _) = forth(&["-5 ABS 5 NEGATE 6 1+ 6 1- 6 2* 6 2/"]);
    assert_eq!(vm.stack(), vec![5, -5, 7, 5, 12, 3]);
}

#[test]
fn comparisons_produce_forth_booleans() {
    let (vm, _) = forth(&["0 0= 1 0= 1 0> -1 0<"]);
    assert_eq!(vm.stack(), vec![-1, 0, -1, -1]);
    let (vm, _) = forth(&["3 3 = 3 4 <> 3 4 < 4 3 > 3 3 >= 3 3 <="]);
    assert_eq!(vm.stack(), vec![-1, -1, -1, -1, -1, -1]);
}

#[test]
fn unsigned_comparisons() {
    // -1 reinterprets as the largest unsigned cell
    let (vm, _) = forth(&["-1 1 U< 1 -1 U< -1 1 U>"]);
    assert_eq!(vm.stack(), vec![0, -1, -1]);
}

#[test]
fn return_stack_round_trip() {
    let (vm, _) = forth(&["7 >R R>"]);
    assert_eq!(vm.stack(), vec![7]);
}

#[test]
fn stack_underflow_aborts() {
    let (vm, out) = forth(&["1 2 DROP DROP DROP"]);
    assert!(out.contains("Stack underflow"));
    assert!(vm.stack().is_empty());
    assert!(!vm.compiling());
}

#[test]
fn depth_reports_logical_depth() {
    let (vm, _) = forth(&["DEPTH"]);
    assert_eq!(vm.stack(), vec![0]);
    let (vm, _) = forth(&["1 2 DEPTH"]);
    assert_eq!(vm.stack(), vec![1, 2, 2]);
}
