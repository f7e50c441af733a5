//! The UAST node model.
//!
//! A UAST is a language-independent syntax tree. Every parse mode and every
//! decoded value uses the same [`Node`] type, so the codec and the path
//! evaluator work uniformly on all of them.

pub mod errors;
pub mod node;

pub use errors::NodeError;
pub use node::{Node, Point, Position, PreOrder, MAX_SERIALIZE_DEPTH};
