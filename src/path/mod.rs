//! Path queries over UAST trees.
//!
//! A query is a small XPath subset:
//!
//! ```text
//! //*[@roleIdentifier]
//! /Module/FunctionDefinition//Identifier[@token='sum']
//! //Call | //Identifier[starts-with(@token, 'pr') and @startLine > 2]
//! ```
//!
//! `/` selects children, `//` descendants, `.` the context node and `//.`
//! the context node with all its descendants. A leading `/` starts above
//! the root, so `/Module` selects a root of kind `Module`; a relative path
//! starts at the root itself.
//!
//! Predicates read `@token`, the position fields (`@startLine`,
//! `@startCol`, `@startOffset`, `@endLine`, `@endCol`, `@endOffset`), role
//! membership (`@roleName`) and any other name as a property.
//!
//! ```
//! use uast_query::path::PathQuery;
//! use uast_query::uast::Node;
//!
//! let tree = Node::new("Module")
//!     .unwrap()
//!     .with_child(Node::new("Identifier").unwrap().with_token("x"));
//! let query = PathQuery::compile("//Identifier[@token='x']").unwrap();
//! assert_eq!(query.evaluate(&tree).len(), 1);
//! ```

pub mod ast;
pub mod errors;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use errors::PathError;
pub use eval::PathQuery;
pub use parser::{MAX_NESTING, MAX_PREDICATE_TERMS, MAX_STEPS};
