pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    BackendConfig, ValidationError, ValidationIssue, DEFAULT_MAX_SOURCE_BYTES,
    SOURCE_BYTES_CEILING,
};
