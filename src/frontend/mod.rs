//! Input documents produced by the pattern miner.
pub mod ast;
pub mod data;

pub use ast::{AnnotatedAst, AstNode, Span};
pub use data::{Match, Pattern};
