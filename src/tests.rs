pub mod common;

pub mod semantic_calls;
pub mod semantic_warnings;

pub mod codegen_control_flow;
