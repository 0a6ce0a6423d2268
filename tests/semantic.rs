//! End-to-end semantic scenarios.

mod common;
use common::{compile, diagnostics};

#[test]
fn clean_program_has_no_diagnostics() {
    let result = compile("int main() { output(21+21); return 0; }");
    assert_eq!(result.num_errors(), 0);
    assert_eq!(result.num_warnings(), 0);
    assert!(result.assembly.is_some());
}

#[test]
fn self_assignment_of_a_global_warns_once() {
    let result = compile("int x;\nvoid main() {\n  x = x;\n}");
    assert_eq!(result.num_errors(), 0);
    assert_eq!(result.num_warnings(), 1);
    let lines = result.diagnostics.render();
    assert_eq!(
        lines,
        vec!["SEMANTIC WARNING(3): Variable 'x' may be uninitialized when used here.".to_string()]
    );
}

#[test]
fn break_outside_loop() {
    let result = compile("int main() { break; return 0; }");
    assert_eq!(result.num_errors(), 1);
    assert!(result.assembly.is_none());
    assert_eq!(
        result.diagnostics.render()[0],
        "SEMANTIC ERROR(1): Cannot have a break statement outside of loop."
    );
}

#[test]
fn returning_an_array() {
    let lines = diagnostics("int f(int a[]) { return a; }\nint main() { return 0; }");
    assert!(
        lines.iter().any(|l| l == "SEMANTIC ERROR(1): Cannot return an array."),
        "got: {:?}",
        lines
    );
}

#[test]
fn program_without_main_is_a_linker_error() {
    let result = compile("int f() { return 1; }");
    assert!(result.num_errors() >= 1);
    assert!(result
        .diagnostics
        .render()
        .iter()
        .any(|l| l == "ERROR(LINKER): Procedure main is not defined."));
}

#[test]
fn errors_do_not_stop_the_walk() {
    // several independent mistakes, all reported in one run
    let lines = diagnostics(
        "int x;\nint x;\nmain() {\n  y = 1;\n  break;\n}",
    );
    assert!(lines.iter().any(|l| l.contains("already declared")), "got: {:?}", lines);
    assert!(lines.iter().any(|l| l.contains("is not declared")), "got: {:?}", lines);
    assert!(lines.iter().any(|l| l.contains("break statement")), "got: {:?}", lines);
}

#[test]
fn diagnostics_are_deterministic_across_runs() {
    let source = "int x;\nbool b;\nmain() {\n  x = b;\n  z = 1;\n  if x then outnl();\n}";
    let first = diagnostics(source);
    for _ in 0..3 {
        assert_eq!(diagnostics(source), first);
    }
    assert!(!first.is_empty());
}
