//! Used-before-assigned tracking.

use crate::tests::common::analyze;

fn warnings(source: &str) -> Vec<String> {
    let (_, _, diag) = analyze(source);
    assert_eq!(diag.num_errors(), 0, "errors: {:?}", diag.render());
    diag.render()
        .into_iter()
        .filter(|l| l.starts_with("SEMANTIC WARNING"))
        .collect()
}

#[test]
fn self_assignment_warns_exactly_once() {
    let lines = warnings("int x;\nvoid main() {\n  x = x;\n}");
    assert_eq!(
        lines,
        vec!["SEMANTIC WARNING(3): Variable 'x' may be uninitialized when used here.".to_string()]
    );
}

#[test]
fn warning_is_not_repeated_for_later_reads() {
    let lines = warnings("int x;\nmain() {\n  x = x;\n  x = x;\n}");
    assert_eq!(lines.len(), 1);
}

#[test]
fn plain_assignment_target_does_not_warn() {
    let lines = warnings("main() { int y; y = 5; output(y); }");
    assert!(lines.is_empty(), "unexpected warnings: {:?}", lines);
}

#[test]
fn reading_before_assigning_warns() {
    let lines = warnings("main() {\n  int a;\n  output(a);\n}");
    assert_eq!(
        lines,
        vec!["SEMANTIC WARNING(3): Variable 'a' may be uninitialized when used here.".to_string()]
    );
}

#[test]
fn compound_assignment_reads_its_target() {
    let lines = warnings("main() { int a; a += 1; output(a); }");
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Variable 'a' may be uninitialized"));
}

#[test]
fn initialized_declarations_do_not_warn() {
    let lines = warnings("int x : 3;\nmain() { int y : x + 1; output(y); }");
    assert!(lines.is_empty(), "unexpected warnings: {:?}", lines);
}

#[test]
fn parameters_never_warn() {
    let lines = warnings("int f(int a) { return a; }\nmain() { output(f(2)); }");
    assert!(lines.is_empty(), "unexpected warnings: {:?}", lines);
}

#[test]
fn arrays_never_warn() {
    let lines = warnings("int a[3];\nmain() { output(a[0]); }");
    assert!(lines.is_empty(), "unexpected warnings: {:?}", lines);
}

#[test]
fn for_loop_index_never_warns() {
    let lines = warnings("main() { for i = 1 to 3 do output(i); }");
    assert!(lines.is_empty(), "unexpected warnings: {:?}", lines);
}

#[test]
fn index_expression_reads_do_warn() {
    let lines = warnings("int a[3];\nmain() {\n  int i;\n  a[i] = 0;\n}");
    assert_eq!(
        lines,
        vec!["SEMANTIC WARNING(4): Variable 'i' may be uninitialized when used here.".to_string()]
    );
}
