use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,

    #[error("invalid path expression '{query}' at offset {offset}: {message}")]
    InvalidPathExpression {
        query: String,
        offset: usize,
        message: String,
    },
}
