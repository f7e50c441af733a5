use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    #[error("node kind must not be empty")]
    EmptyKind,

    #[error("tree is {depth} levels deep, serialization supports at most {limit}")]
    TooDeep { depth: usize, limit: usize },
}
