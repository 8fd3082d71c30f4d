//! Code generation: EARS requirements and the GAL net.

pub mod bindings;
pub mod ears;
pub mod facts;
pub mod gal;
pub mod lexeme;
pub mod render;
pub mod resolve;
