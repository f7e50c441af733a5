//! uast-query: extract and filter universal syntax trees.
//!
//! Source code goes in, a language-neutral tree (UAST) comes out, and path
//! queries select subtrees from it. Trees travel between calls and
//! processes as compact encoded byte strings.
//!
//! # Architecture
//!
//! - [`uast`]: the [`Node`] model shared by everything else
//! - [`codec`]: exact binary encoding of trees
//! - [`client`]: the [`Parser`] capability and [`ParseMode`]
//! - [`ts`] and [`pool`]: an in-process parser over tree-sitter grammars
//! - [`path`]: compiled path queries ([`PathQuery`])
//! - [`function`]: the `uast` / `uast_xpath` functions a host engine calls
//! - [`config`]: backend settings loaded from TOML
//!
//! # Example
//!
//! ```
//! use uast_query::{codec, ParseMode, Parser, PathQuery, TreeSitterParser};
//!
//! let parser = TreeSitterParser::new();
//! let tree = parser
//!     .parse(b"def f(x):\n    return x\n", Some("python"), Some(ParseMode::Annotated))
//!     .unwrap();
//! assert_eq!(tree.kind(), "Module");
//!
//! let query = PathQuery::compile("//*[@roleIdentifier]").unwrap();
//! let names: Vec<_> = query.evaluate(&tree).iter().filter_map(|n| n.token()).collect();
//! assert_eq!(names, vec!["f", "x", "x"]);
//!
//! let bytes = codec::encode(&tree);
//! assert_eq!(codec::decode(&bytes).unwrap(), tree);
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod function;
pub mod path;
pub mod pool;
pub mod ts;
pub mod uast;

// Re-exports
pub use client::{ParseError, ParseMode, Parser};
pub use codec::{decode, encode, CodecError};
pub use config::{load_from_path, load_from_str, BackendConfig, ConfigError};
pub use function::{ErrorKind, Function, FunctionError, FunctionRegistry, Uast, UastXPath, Value};
pub use path::{PathError, PathQuery};
pub use ts::{Language, TreeSitterParser};
pub use uast::{Node, NodeError, Point, Position};
