//! Shared helpers for end-to-end tests.

use bcc::driver::{CompileOptions, CompileResult, Compiler};

pub fn compile(source: &str) -> CompileResult {
    Compiler::new(CompileOptions::default()).compile(source, "test.bc")
}

pub fn compile_ok(source: &str) -> String {
    let result = compile(source);
    assert_eq!(
        result.num_errors(),
        0,
        "unexpected errors: {:?}",
        result.diagnostics.render()
    );
    result.assembly.expect("no assembly produced")
}

pub fn diagnostics(source: &str) -> Vec<String> {
    compile(source).diagnostics.render()
}
