//! The parser capability the function library depends on.
//!
//! A [`Parser`] turns source bytes into a single UAST root. Implementations
//! may call out to a remote service or parse in-process; the rest of the
//! crate only sees this trait.

pub mod errors;

pub use errors::ParseError;

use crate::uast::Node;
use std::fmt;
use std::str::FromStr;

/// Which of the three tree shapes a parser should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParseMode {
    /// Full syntax tree annotated with semantic roles.
    #[default]
    Annotated,
    /// Reduced tree keeping only semantically relevant nodes.
    Semantic,
    /// The backend's raw, language-specific tree.
    Native,
}

impl ParseMode {
    pub const ALL: [ParseMode; 3] = [ParseMode::Annotated, ParseMode::Semantic, ParseMode::Native];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParseMode::Annotated => "annotated",
            ParseMode::Semantic => "semantic",
            ParseMode::Native => "native",
        }
    }

    /// Parse a mode name, ignoring ASCII case.
    pub fn parse(s: &str) -> Option<Self> {
        ParseMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParseMode::parse(s).ok_or_else(|| {
            format!("unknown parse mode '{s}', expected one of: annotated, semantic, native")
        })
    }
}

/// Source-to-UAST capability.
///
/// Implementations must be safe to share between threads; any connection or
/// parser pooling is their own business. A call may block for as long as the
/// backend needs; no timeout is applied here.
pub trait Parser: Send + Sync {
    /// Parse `source` into a tree of the requested shape.
    ///
    /// With no `language` the backend infers it from the source. With no
    /// `mode` the backend uses its default.
    fn parse(
        &self,
        source: &[u8],
        language: Option<&str>,
        mode: Option<ParseMode>,
    ) -> Result<Node, ParseError>;
}

impl<P: Parser + ?Sized> Parser for std::sync::Arc<P> {
    fn parse(
        &self,
        source: &[u8],
        language: Option<&str>,
        mode: Option<ParseMode>,
    ) -> Result<Node, ParseError> {
        (**self).parse(source, language, mode)
    }
}
