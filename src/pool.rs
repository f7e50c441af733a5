//! Thread-local parser pooling.
//!
//! A tree-sitter parser is not `Sync`, so instead of locking one shared
//! parser every thread keeps its own parser per language. The first parse of
//! a language on a thread creates it; later parses on that thread reuse it.

use crate::client::ParseError;
use crate::ts::Language;
use std::cell::RefCell;
use std::collections::HashMap;
use tree_sitter::Parser;

thread_local! {
    static PARSERS: RefCell<HashMap<Language, Parser>> = RefCell::new(HashMap::new());
}

/// Execute `f` with this thread's parser for `language`.
///
/// Fails with `ParseFailed` when the grammar cannot be loaded into a parser.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use uast_query::pool::with_parser;
/// use uast_query::ts::Language;
///
/// let tree = with_parser(Language::Python, |parser| parser.parse("x = 1\n", None))?;
/// assert!(tree.is_some());
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(language: Language, f: F) -> Result<R, ParseError>
where
    F: FnOnce(&mut Parser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(language) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let mut parser = Parser::new();
                parser.set_language(&language.grammar()).map_err(|err| {
                    ParseError::failed(
                        language.name(),
                        vec![format!("failed to load grammar: {err}")],
                    )
                })?;
                tracing::trace!(%language, "created pooled parser");
                entry.insert(parser)
            }
        };

        // A previous call may have stopped mid-parse.
        parser.reset();
        Ok(f(parser))
    })
}

/// Number of parsers pooled on the current thread.
pub fn pooled_parsers() -> usize {
    PARSERS.with(|cell| cell.borrow().len())
}
