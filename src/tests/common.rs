//! Shared helpers for the semantic and codegen test suites.

use crate::ast::{Ast, DeclKind, NodeKind, NodeRef};
use crate::diagnostic::DiagnosticEngine;
use crate::driver::{CompileOptions, CompileResult, Compiler};
use crate::lexer::Lexer;
use crate::parser::parse_program;
use crate::semantic::{semantic_analysis, Analysis};

/// Run scanner, parser, and semantic analysis over a source string.
/// Panics on syntax errors; semantic diagnostics are returned.
pub fn analyze(source: &str) -> (Ast, Analysis, DiagnosticEngine) {
    let mut diag = DiagnosticEngine::new();
    let tokens = Lexer::new(source).scan(&mut diag);
    let mut ast = Ast::new();
    let root = parse_program(&tokens, &mut ast, &mut diag);
    assert!(!diag.has_errors(), "syntax errors: {:?}", diag.render());
    let analysis = semantic_analysis(&mut ast, root, &mut diag);
    (ast, analysis, diag)
}

/// Run the whole pipeline.
pub fn compile(source: &str) -> CompileResult {
    Compiler::new(CompileOptions::default()).compile(source, "test.bc")
}

/// Run the whole pipeline and require a clean compile.
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

/// Assert that analysis produced a diagnostic line equal to `expected`.
pub fn expect_diagnostic(source: &str, expected: &str) {
    let (_, _, diag) = analyze(source);
    let lines = diag.render();
    assert!(
        lines.iter().any(|l| l == expected),
        "expected diagnostic {:?} not found in {:?}",
        expected,
        lines
    );
}

/// Assert that analysis finished with no errors and no warnings.
pub fn expect_clean(source: &str) {
    let (_, _, diag) = analyze(source);
    assert_eq!(diag.num_errors(), 0, "errors: {:?}", diag.render());
    assert_eq!(diag.num_warnings(), 0, "warnings: {:?}", diag.render());
}

/// Find the first declaration of the given kind with the given name.
pub fn find_decl_of(ast: &Ast, kind: DeclKind, name: &str) -> NodeRef {
    for i in 1..=ast.len() as u32 {
        let r = NodeRef::new(i).unwrap();
        let node = ast.node(r);
        if node.kind == NodeKind::Decl(kind) && node.name().as_str() == name {
            return r;
        }
    }
    panic!("no {:?} declaration named '{}'", kind, name);
}
