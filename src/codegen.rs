//! TVM code generation: emitter primitives and the AST walk.

pub mod emitter;
pub mod generator;

pub use emitter::{Emitter, Opcode};
pub use generator::codegen;
