//! Call resolution and parameter checking.

use crate::tests::common::{analyze, expect_clean, expect_diagnostic};

#[test]
fn calling_an_undeclared_name_is_reported_once() {
    let (_, _, diag) = analyze("main() { f(); }");
    let lines = diag.render();
    assert_eq!(diag.num_errors(), 1);
    assert_eq!(lines[0], "SEMANTIC ERROR(1): Symbol 'f' is not declared.");
}

#[test]
fn calling_a_variable_is_an_error() {
    expect_diagnostic(
        "int x; main() { x = 1; x(); }",
        "SEMANTIC ERROR(1): 'x' is a simple variable and cannot be called.",
    );
}

#[test]
fn using_a_function_as_a_variable_is_an_error() {
    expect_diagnostic(
        "int f() { return 1; }\nmain() { int x; x = f + 1; }",
        "SEMANTIC ERROR(2): Cannot use function 'f' as a variable.",
    );
}

#[test]
fn parameter_type_mismatch_names_the_declaration() {
    expect_diagnostic(
        "int f(int a) { return a; }\nmain() { output(f(true)); }",
        "SEMANTIC ERROR(2): Expecting type int in parameter 1 of call to 'f' declared on line 1 but got type bool.",
    );
}

#[test]
fn second_parameter_mismatch_is_position_2() {
    expect_diagnostic(
        "int f(int a; bool b) { return a; }\nmain() { output(f(1, 2)); }",
        "SEMANTIC ERROR(2): Expecting type bool in parameter 2 of call to 'f' declared on line 1 but got type int.",
    );
}

#[test]
fn array_parameter_needs_an_array_argument() {
    expect_diagnostic(
        "int f(int a[]) { return a[0]; }\nmain() { output(f(3)); }",
        "SEMANTIC ERROR(2): Expecting array in parameter 1 of call to 'f' declared on line 1.",
    );
    expect_diagnostic(
        "int f(int a) { return a; }\nint g[4];\nmain() { output(f(g)); }",
        "SEMANTIC ERROR(3): Not expecting array in parameter 1 of call to 'f' declared on line 1.",
    );
}

#[test]
fn arity_mismatches_are_reported() {
    expect_diagnostic(
        "int f(int a, b) { return a + b; }\nmain() { output(f(1)); }",
        "SEMANTIC ERROR(2): Too few parameters passed for function 'f' declared on line 1.",
    );
    expect_diagnostic(
        "int f(int a) { return a; }\nmain() { output(f(1, 2)); }",
        "SEMANTIC ERROR(2): Too many parameters passed for function 'f' declared on line 1.",
    );
}

#[test]
fn library_functions_check_their_parameter() {
    expect_diagnostic(
        "main() { output(true); }",
        "SEMANTIC ERROR(1): Expecting type int in parameter 1 of call to 'output' declared on line -1 but got type bool.",
    );
    expect_diagnostic(
        "main() { outputb(1); }",
        "SEMANTIC ERROR(1): Expecting type bool in parameter 1 of call to 'outputb' declared on line -1 but got type int.",
    );
}

#[test]
fn library_signatures_line_up() {
    expect_clean(
        "main() {\n  output(input());\n  outputb(inputb());\n  outputc(inputc());\n  outnl();\n}",
    );
}

#[test]
fn call_results_carry_the_return_type() {
    expect_clean("bool f() { return true; }\nmain() { if f() then outnl(); }");
    expect_diagnostic(
        "bool f() { return true; }\nmain() { output(f()); }",
        "SEMANTIC ERROR(2): Expecting type int in parameter 1 of call to 'output' declared on line -1 but got type bool.",
    );
}

#[test]
fn passing_whole_arrays_to_array_parameters_is_fine() {
    expect_clean("int sum(int a[]) { return a[0] + a[1]; }\nint g[5];\nmain() { output(sum(g)); }");
}

#[test]
fn recursion_resolves_through_the_function_scope() {
    expect_clean("int fact(int n) { if n < 2 then return 1; return n * fact(n - 1); }\nmain() { output(fact(5)); }");
}
