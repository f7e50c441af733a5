//! Tree-sitter parsing backend.
//!
//! Implements the [`Parser`](crate::client::Parser) capability in-process:
//! the language is resolved from a hint or a shebang line, the source is
//! parsed with a pooled tree-sitter parser, and the concrete syntax tree is
//! converted into one of the three UAST shapes.

pub mod convert;
pub mod lang;
pub mod parser;
pub mod roles;
pub mod validator;

pub use convert::pascal_case;
pub use lang::Language;
pub use parser::TreeSitterParser;
pub use roles::roles_for;
pub use validator::{syntax_issues, SyntaxIssue};
