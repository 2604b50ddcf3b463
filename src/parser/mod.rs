//! Parser for the layer-stack expression language

pub mod analyser;
pub mod expr;
mod grammar;
pub mod lexer;
pub mod tree;

pub use analyser::analyse;
pub use expr::*;
pub use grammar::parse_expr;
pub use tree::{Node, NodeId, NodeKind, NodeValue, Tree};
