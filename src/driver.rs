//! Compilation pipeline orchestration.
//!
//! The [`Compiler`] runs lex → parse → semantic analysis → code generation
//! over a single source buffer, collecting diagnostics along the way. Code
//! generation only runs when the front half finished without errors.

use log::debug;
use thiserror::Error;

use crate::ast::Ast;
use crate::codegen::codegen;
use crate::diagnostic::DiagnosticEngine;
use crate::lexer::Lexer;
use crate::parser::parse_program;
use crate::semantic::semantic_analysis;

/// Driver-level failures.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Compilation failed due to errors")]
    CompilationFailed,
}

/// Pipeline switches, set from the CLI.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Print the syntax tree after parsing.
    pub print_ast: bool,
    /// Print the annotated tree after semantic analysis.
    pub print_annotated: bool,
    /// Annotate generated code with source line comments.
    pub linenum_flag: bool,
}

/// Everything a compilation run produced.
pub struct CompileResult {
    /// Generated TVM assembly; absent when errors stopped the pipeline.
    pub assembly: Option<String>,
    pub diagnostics: DiagnosticEngine,
}

impl CompileResult {
    pub fn num_errors(&self) -> u32 {
        self.diagnostics.num_errors()
    }

    pub fn num_warnings(&self) -> u32 {
        self.diagnostics.num_warnings()
    }
}

/// The compiler pipeline.
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler { options }
    }

    /// Compile one source buffer. `src_file` is used in generated-code
    /// headers only.
    pub fn compile(&self, source: &str, src_file: &str) -> CompileResult {
        let mut diag = DiagnosticEngine::new();

        let tokens = Lexer::new(source).scan(&mut diag);
        debug!("scanned {} tokens", tokens.len());

        let mut ast = Ast::new();
        let root = parse_program(&tokens, &mut ast, &mut diag);
        if diag.has_errors() {
            return CompileResult {
                assembly: None,
                diagnostics: diag,
            };
        }
        if self.options.print_ast {
            print!("{}", ast.print_tree(root, false));
        }

        let analysis = semantic_analysis(&mut ast, root, &mut diag);
        if self.options.print_annotated {
            print!("{}", ast.print_tree(analysis.root, true));
        }
        if diag.has_errors() {
            return CompileResult {
                assembly: None,
                diagnostics: diag,
            };
        }

        let assembly = codegen(
            &mut ast,
            analysis.root,
            &analysis.globals,
            analysis.global_offset,
            &mut diag,
            src_file,
            self.options.linenum_flag,
        );

        CompileResult {
            assembly: Some(assembly),
            diagnostics: diag,
        }
    }
}
