//! Diagnostic collection and reporting.
//!
//! All passes funnel their messages through a [`DiagnosticEngine`] so that a
//! compilation can keep going after an error and report everything it found,
//! in the order it found it. Rendering matches the compiler's one-line
//! output contract exactly.

use std::fmt;

/// Diagnostic severity and origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    SyntaxError,
    SemanticError,
    SemanticWarning,
    LinkerError,
}

/// A single rendered-to-be diagnostic line.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub lineno: i32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.level {
            DiagnosticLevel::SyntaxError => write!(f, "SYNTAX ERROR({}): {}", self.lineno, self.message),
            DiagnosticLevel::SemanticError => write!(f, "SEMANTIC ERROR({}): {}", self.lineno, self.message),
            DiagnosticLevel::SemanticWarning => {
                write!(f, "SEMANTIC WARNING({}): {}", self.lineno, self.message)
            }
            DiagnosticLevel::LinkerError => write!(f, "ERROR(LINKER): {}", self.message),
        }
    }
}

/// Ordered diagnostic sink shared by every pass.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Diagnostic>,
    num_errors: u32,
    num_warnings: u32,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn report(&mut self, level: DiagnosticLevel, lineno: i32, message: String) {
        match level {
            DiagnosticLevel::SemanticWarning => self.num_warnings += 1,
            _ => self.num_errors += 1,
        }
        self.diagnostics.push(Diagnostic { level, lineno, message });
    }

    pub fn syntax_error(&mut self, lineno: i32, message: String) {
        self.report(DiagnosticLevel::SyntaxError, lineno, message);
    }

    pub fn semantic_error(&mut self, lineno: i32, message: String) {
        self.report(DiagnosticLevel::SemanticError, lineno, message);
    }

    pub fn semantic_warning(&mut self, lineno: i32, message: String) {
        self.report(DiagnosticLevel::SemanticWarning, lineno, message);
    }

    pub fn linker_error(&mut self, message: String) {
        self.report(DiagnosticLevel::LinkerError, 0, message);
    }

    pub fn num_errors(&self) -> u32 {
        self.num_errors
    }

    pub fn num_warnings(&self) -> u32 {
        self.num_warnings
    }

    pub fn has_errors(&self) -> bool {
        self.num_errors > 0
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Render every collected diagnostic as its output line, in order.
    pub fn render(&self) -> Vec<String> {
        self.diagnostics.iter().map(|d| d.to_string()).collect()
    }

    /// Print all diagnostics to stdout in collection order.
    pub fn print_all(&self) {
        for diag in &self.diagnostics {
            println!("{}", diag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_exact_prefixes() {
        let mut diag = DiagnosticEngine::new();
        diag.semantic_error(4, "Symbol 'x' is not declared.".to_string());
        diag.semantic_warning(7, "Variable 'y' may be uninitialized when used here.".to_string());
        diag.syntax_error(1, "unexpected token ')'.".to_string());
        diag.linker_error("Procedure main is not defined.".to_string());

        let lines = diag.render();
        assert_eq!(lines[0], "SEMANTIC ERROR(4): Symbol 'x' is not declared.");
        assert_eq!(
            lines[1],
            "SEMANTIC WARNING(7): Variable 'y' may be uninitialized when used here."
        );
        assert_eq!(lines[2], "SYNTAX ERROR(1): unexpected token ')'.");
        assert_eq!(lines[3], "ERROR(LINKER): Procedure main is not defined.");
    }

    #[test]
    fn counts_errors_and_warnings_separately() {
        let mut diag = DiagnosticEngine::new();
        diag.semantic_error(1, "a".to_string());
        diag.semantic_error(2, "b".to_string());
        diag.semantic_warning(3, "c".to_string());
        assert_eq!(diag.num_errors(), 2);
        assert_eq!(diag.num_warnings(), 1);
        assert!(diag.has_errors());
    }
}
