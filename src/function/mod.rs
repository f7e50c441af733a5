//! Host-facing functions: `uast` and `uast_xpath`.
//!
//! The host engine hands each function already-typed [`Value`]s and gets a
//! `Value` back. A `Null` argument short-circuits to a `Null` result before
//! any parsing or decoding happens.
//!
//! ```
//! use std::sync::Arc;
//! use uast_query::function::{FunctionRegistry, Value};
//! use uast_query::ts::TreeSitterParser;
//!
//! let registry = FunctionRegistry::new(Arc::new(TreeSitterParser::new()));
//! let source = Value::from(&b"x = 1\n"[..]);
//! let result = registry
//!     .call("uast", &[source, "python".into(), "//Identifier".into()])
//!     .unwrap();
//! assert_eq!(result.as_array().map(|a| a.len()), Some(1));
//! ```

pub mod errors;
pub mod value;

pub use errors::{ErrorKind, FunctionError};
pub use value::Value;

use crate::client::{ParseMode, Parser};
use crate::codec;
use crate::path::PathQuery;
use crate::uast::Node;
use std::sync::Arc;
use tracing::debug;

pub const UAST: &str = "uast";
pub const UAST_XPATH: &str = "uast_xpath";

/// A function the host can evaluate against one row of arguments.
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;

    /// Number of arguments the call shape declares.
    fn arity(&self) -> usize;

    fn eval(&self, args: &[Value]) -> Result<Value, FunctionError>;
}

/// `uast(blob [, language [, path [, mode]]])`.
///
/// Parses the blob and returns the encoded tree, or with a path the
/// encoded matching subtrees as an array.
pub struct Uast {
    parser: Arc<dyn Parser>,
    arity: usize,
}

struct UastArgs<'a> {
    source: &'a [u8],
    language: Option<&'a str>,
    path: Option<&'a str>,
    mode: Option<ParseMode>,
}

impl Uast {
    pub const MIN_ARITY: usize = 1;
    pub const MAX_ARITY: usize = 4;

    pub fn new(parser: Arc<dyn Parser>, arity: usize) -> Result<Self, FunctionError> {
        if !(Self::MIN_ARITY..=Self::MAX_ARITY).contains(&arity) {
            return Err(FunctionError::invalid_argument(
                UAST,
                format!("expected 1 to 4 arguments, got {arity}"),
            ));
        }
        Ok(Self { parser, arity })
    }

    /// Bind arguments, or `None` when any of them is absent.
    fn bind<'a>(&self, args: &'a [Value]) -> Result<Option<UastArgs<'a>>, FunctionError> {
        check_arity(UAST, self.arity, args)?;
        if args.iter().any(Value::is_null) {
            return Ok(None);
        }

        let source = args[0]
            .as_blob()
            .ok_or_else(|| wrong_type(UAST, "source", "blob", &args[0]))?;
        let language = match args.get(1) {
            Some(value) => {
                let language = value
                    .as_text()
                    .ok_or_else(|| wrong_type(UAST, "language", "text", value))?;
                Some(language).filter(|l| !l.is_empty())
            }
            None => None,
        };
        let path = args
            .get(2)
            .map(|value| {
                value
                    .as_text()
                    .ok_or_else(|| wrong_type(UAST, "path", "text", value))
            })
            .transpose()?;
        let mode = args
            .get(3)
            .map(|value| {
                let text = value
                    .as_text()
                    .ok_or_else(|| wrong_type(UAST, "mode", "text", value))?;
                ParseMode::parse(text).ok_or_else(|| {
                    FunctionError::invalid_argument(
                        UAST,
                        format!(
                            "unknown parse mode '{text}', expected one of: annotated, semantic, native"
                        ),
                    )
                })
            })
            .transpose()?;

        Ok(Some(UastArgs {
            source,
            language,
            path,
            mode,
        }))
    }
}

impl Function for Uast {
    fn name(&self) -> &'static str {
        UAST
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn eval(&self, args: &[Value]) -> Result<Value, FunctionError> {
        let Some(args) = self.bind(args)? else {
            debug!(function = UAST, "absent argument, returning null");
            return Ok(Value::Null);
        };

        let tree = self.parser.parse(args.source, args.language, args.mode)?;
        debug!(
            function = UAST,
            language = args.language.unwrap_or("<inferred>"),
            nodes = tree.size(),
            "parsed source"
        );

        match args.path {
            Some(path) => {
                let query = PathQuery::compile(path)?;
                Ok(encode_all(query.evaluate(&tree)))
            }
            None => Ok(Value::Blob(codec::encode(&tree))),
        }
    }
}

/// `uast_xpath(trees, path)`.
///
/// `trees` is one encoded tree or an array of them; matches from every
/// tree are concatenated in argument order.
pub struct UastXPath;

impl UastXPath {
    pub const ARITY: usize = 2;

    fn bind<'a>(args: &'a [Value]) -> Result<Option<(Vec<&'a [u8]>, &'a str)>, FunctionError> {
        check_arity(UAST_XPATH, Self::ARITY, args)?;
        if args.iter().any(Value::is_null) {
            return Ok(None);
        }

        let blobs = match &args[0] {
            Value::Blob(bytes) => vec![bytes.as_slice()],
            Value::Array(values) => {
                let mut blobs = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Value::Blob(bytes) => blobs.push(bytes.as_slice()),
                        Value::Null => {}
                        other => {
                            return Err(wrong_type(UAST_XPATH, "trees element", "blob", other))
                        }
                    }
                }
                blobs
            }
            other => return Err(wrong_type(UAST_XPATH, "trees", "blob or array", other)),
        };
        let path = args[1]
            .as_text()
            .ok_or_else(|| wrong_type(UAST_XPATH, "path", "text", &args[1]))?;

        Ok(Some((blobs, path)))
    }
}

impl Function for UastXPath {
    fn name(&self) -> &'static str {
        UAST_XPATH
    }

    fn arity(&self) -> usize {
        Self::ARITY
    }

    fn eval(&self, args: &[Value]) -> Result<Value, FunctionError> {
        let Some((blobs, path)) = Self::bind(args)? else {
            debug!(function = UAST_XPATH, "absent argument, returning null");
            return Ok(Value::Null);
        };

        let trees = blobs
            .into_iter()
            .map(codec::decode)
            .collect::<Result<Vec<Node>, _>>()?;
        let query = PathQuery::compile(path)?;

        let matches: Vec<&Node> = trees.iter().flat_map(|tree| query.evaluate(tree)).collect();
        debug!(
            function = UAST_XPATH,
            trees = trees.len(),
            matches = matches.len(),
            "filtered trees"
        );
        Ok(encode_all(matches))
    }
}

/// Resolves host function calls by name and argument count.
#[derive(Clone)]
pub struct FunctionRegistry {
    parser: Arc<dyn Parser>,
}

impl FunctionRegistry {
    pub fn new(parser: Arc<dyn Parser>) -> Self {
        Self { parser }
    }

    pub fn names(&self) -> &'static [&'static str] {
        &[UAST, UAST_XPATH]
    }

    /// Look up the function `name` called with `arity` arguments.
    pub fn resolve(&self, name: &str, arity: usize) -> Result<Box<dyn Function>, FunctionError> {
        if name.eq_ignore_ascii_case(UAST) {
            Ok(Box::new(Uast::new(Arc::clone(&self.parser), arity)?))
        } else if name.eq_ignore_ascii_case(UAST_XPATH) {
            if arity != UastXPath::ARITY {
                return Err(FunctionError::invalid_argument(
                    UAST_XPATH,
                    format!("expected 2 arguments, got {arity}"),
                ));
            }
            Ok(Box::new(UastXPath))
        } else {
            Err(FunctionError::invalid_argument(
                name,
                "unknown function".to_string(),
            ))
        }
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, FunctionError> {
        self.resolve(name, args.len())?.eval(args)
    }
}

fn check_arity(function: &str, arity: usize, args: &[Value]) -> Result<(), FunctionError> {
    if args.len() != arity {
        return Err(FunctionError::invalid_argument(
            function,
            format!("expected {arity} arguments, got {}", args.len()),
        ));
    }
    Ok(())
}

fn wrong_type(function: &str, argument: &str, expected: &str, got: &Value) -> FunctionError {
    FunctionError::invalid_argument(
        function,
        format!(
            "{argument} must be {expected}, got {}",
            got.type_name()
        ),
    )
}

fn encode_all<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Value {
    Value::Array(
        nodes
            .into_iter()
            .map(|node| Value::Blob(codec::encode(node)))
            .collect(),
    )
}
