use crate::client::ParseError;
use crate::codec::CodecError;
use crate::path::PathError;
use std::fmt;
use thiserror::Error;

/// Coarse classification of a failed function call, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedLanguage,
    ParseFailed,
    InvalidPathExpression,
    MalformedEncoding,
    InvalidArgumentType,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedLanguage => "UnsupportedLanguage",
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::InvalidPathExpression => "InvalidPathExpression",
            ErrorKind::MalformedEncoding => "MalformedEncoding",
            ErrorKind::InvalidArgumentType => "InvalidArgumentType",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FunctionError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("malformed encoded tree: {0}")]
    MalformedEncoding(#[from] CodecError),

    #[error("{function}: {message}")]
    InvalidArgumentType {
        function: String,
        message: String,
    },
}

impl FunctionError {
    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        FunctionError::InvalidArgumentType {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FunctionError::Parse(ParseError::UnsupportedLanguage { .. }) => {
                ErrorKind::UnsupportedLanguage
            }
            FunctionError::Parse(ParseError::ParseFailed { .. }) => ErrorKind::ParseFailed,
            FunctionError::Path(_) => ErrorKind::InvalidPathExpression,
            FunctionError::MalformedEncoding(_) => ErrorKind::MalformedEncoding,
            FunctionError::InvalidArgumentType { .. } => ErrorKind::InvalidArgumentType,
        }
    }
}
