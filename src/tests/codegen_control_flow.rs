//! Instruction sequences for if, while, for, and break.

use crate::tests::common::compile_ok;

#[test]
fn if_without_else_branches_on_jzr() {
    let asm = compile_ok("main() { if true then outnl(); }");
    assert!(asm.contains("JZR  3,"), "no JZR branch:\n{}", asm);
    assert!(asm.contains("Jump around the IF [backpatch]"), "got:\n{}", asm);
}

#[test]
fn if_with_else_uses_two_backpatched_jumps() {
    let asm = compile_ok("main() { if true then output(1); else output(2); }");
    assert!(asm.contains("Jump around the THEN if false [backpatch]"), "got:\n{}", asm);
    assert!(asm.contains("Jump around the ELSE [backpatch]"), "got:\n{}", asm);
}

#[test]
fn while_loop_tests_at_the_top_and_jumps_back() {
    let asm = compile_ok("int g;\nmain() { g = 0; while g < 3 do g++; }");
    assert!(asm.contains("JNZ  3,1(7)\tJump to while part"), "got:\n{}", asm);
    assert!(asm.contains("go to beginning of loop"), "got:\n{}", asm);
    assert!(asm.contains("Jump past loop [backpatch]"), "got:\n{}", asm);
}

#[test]
fn for_loop_materializes_start_stop_step() {
    // scenario: for i = 1 to 5 emits three stores, the SLT test, the body,
    // the increment, and the jump back
    let asm = compile_ok("int main() { for i = 1 to 5 do output(i); }");
    let start = asm.find("save starting value in index variable").expect("start store");
    let stop = asm.find("save stop value").expect("stop store");
    let step = asm.find("save step value").expect("step store");
    let test = asm.find("SLT  3,4,5").expect("range test");
    let body = asm.find("OUT  3,3,3").expect("loop body output");
    let incr = asm.find("\tincrement").expect("index increment");
    let back = asm.find("go to beginning of loop").expect("back jump");
    assert!(start < stop && stop < step && step < test, "setup order wrong:\n{}", asm);
    assert!(test < body && body < incr && incr < back, "loop order wrong:\n{}", asm);
    assert!(asm.contains("JNZ  3,1(7)\tJump into loop body"), "got:\n{}", asm);
    assert!(asm.contains("default increment of 1"), "got:\n{}", asm);
}

#[test]
fn for_loop_with_by_uses_the_given_step() {
    let asm = compile_ok("main() { for i = 10 to 2 by -2 do output(i); }");
    assert!(!asm.contains("default increment of 1"), "got:\n{}", asm);
    assert!(asm.contains("NEG  3,3,3"), "got:\n{}", asm);
}

#[test]
fn for_loop_slots_sit_below_the_index() {
    // index at -2, stop at -3, step at -4
    let asm = compile_ok("main() { for i = 1 to 5 do output(i); }");
    assert!(asm.contains("ST  3,-2(1)\tsave starting value in index variable"), "got:\n{}", asm);
    assert!(asm.contains("ST  3,-3(1)\tsave stop value"), "got:\n{}", asm);
    assert!(asm.contains("ST  3,-4(1)\tsave step value"), "got:\n{}", asm);
}

#[test]
fn break_jumps_to_the_loop_exit_slot() {
    let asm = compile_ok("main() { while true do { break; } }");
    assert!(asm.contains("* BREAK"), "got:\n{}", asm);
    assert!(asm.contains("\tbreak"), "got:\n{}", asm);
}

#[test]
fn nested_loops_restore_the_outer_break_target() {
    let asm = compile_ok(
        "main() { while true do { while true do { break; } break; } }",
    );
    // two loop exits, two back jumps
    assert_eq!(asm.matches("Jump past loop [backpatch]").count(), 2, "got:\n{}", asm);
    assert_eq!(asm.matches("go to beginning of loop").count(), 2, "got:\n{}", asm);
}

#[test]
fn return_copies_into_rt_before_the_epilogue() {
    let asm = compile_ok("int f() { return 42; }\nmain() { output(f()); }");
    let load = asm.find("LDC  3,42(6)").expect("constant load");
    let copy = asm.find("LDA  2,0(3)\tCopy result to return register").expect("rt copy");
    assert!(load < copy, "got:\n{}", asm);
}
