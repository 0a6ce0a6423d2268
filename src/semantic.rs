//! Semantic analysis: name resolution, type checking, and storage layout.

pub mod analyzer;
pub mod symbol_table;

pub use analyzer::{semantic_analysis, Analysis};
pub use symbol_table::SymbolTable;
