use thiserror::Error;

/// Reasons an encoded tree could not be decoded.
///
/// Every variant is a malformed-encoding failure; the variant only narrows
/// down what was wrong with the bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("encoded tree is truncated at offset {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    #[error("unrecognized tag 0x{tag:02x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("length {length} at offset {offset} runs past the end of the buffer")]
    LengthOutOfBounds { length: u64, offset: usize },

    #[error("missing UAST magic header")]
    BadMagic,

    #[error("unsupported encoding version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("checksum mismatch: stored {stored:016x}, computed {computed:016x}")]
    ChecksumMismatch { stored: u64, computed: u64 },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("varint at offset {offset} does not fit its field")]
    VarintOverflow { offset: usize },

    #[error("varint at offset {offset} has redundant trailing bytes")]
    OverlongVarint { offset: usize },

    #[error("{field} at offset {offset} are not in canonical order")]
    NonCanonical { field: &'static str, offset: usize },

    #[error("node at offset {offset} has an empty kind")]
    EmptyKind { offset: usize },

    #[error("{count} trailing bytes after the root node")]
    TrailingBytes { count: usize },
}
