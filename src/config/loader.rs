use crate::config::schema::{BackendConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Failure to load a backend config, tagged with the `--config` file it
/// came from once one is known.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// Attach the file name to an error raised while reading its contents.
    /// A path that is already set is kept.
    fn with_path(self, path: &Path) -> Self {
        match self {
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path.to_path_buf()),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// The config file involved, if the error came from one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read --config file {}: {source}", path.display())
            }
            ConfigError::Toml { path, source } => {
                match path {
                    Some(path) => write!(f, "--config file {} is not valid", path.display())?,
                    None => f.write_str("backend config is not valid")?,
                }
                // toml_edit messages span several lines and end with one.
                write!(f, " TOML: {}", source.to_string().trim_end())
            }
            ConfigError::Validation { path, source } => {
                match path {
                    Some(path) => write!(f, "invalid backend config in {}", path.display())?,
                    None => f.write_str("invalid backend config")?,
                }
                if let [issue] = source.issues.as_slice() {
                    return write!(f, ": {issue}");
                }
                write!(f, " ({} issues):", source.issues.len())?;
                for issue in &source.issues {
                    write!(f, "\n  - {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            // Every issue is already part of the message.
            ConfigError::Validation { .. } => None,
        }
    }
}

/// Parse and validate a backend config document.
pub fn load_from_str(input: &str) -> Result<BackendConfig, ConfigError> {
    let config: BackendConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

/// Load the file passed as `--config`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<BackendConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ParseMode;

    #[test]
    fn empty_document_uses_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config.mode(), ParseMode::Annotated);
        assert!(config.infer_language);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_from_str("colour = \"blue\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
        assert!(err.path().is_none());
        assert!(err.to_string().starts_with("backend config is not valid TOML: "));
    }

    #[test]
    fn single_issue_stays_on_one_line() {
        let err = load_from_str("default_mode = \"raw\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert_eq!(
            err.to_string(),
            "invalid backend config: unknown default_mode 'raw', expected annotated, semantic or native"
        );
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn several_issues_are_listed() {
        let err = load_from_str("default_mode = \"raw\"\nmax_source_bytes = 0\n").unwrap_err();
        let message = err.to_string();
        let lines: Vec<_> = message.lines().collect();
        assert_eq!(lines[0], "invalid backend config (2 issues):");
        assert!(lines[1].starts_with("  - unknown default_mode"));
        assert_eq!(lines[2], "  - 'max_source_bytes' must be greater than 0");
    }

    #[test]
    fn with_path_names_the_file_once() {
        let file = Path::new("backend.toml");
        let err = load_from_str("languages = \"python\"\n")
            .unwrap_err()
            .with_path(file);
        assert_eq!(err.path(), Some(file));
        assert!(err.to_string().starts_with("--config file backend.toml is not valid TOML: "));

        let err = err.with_path(Path::new("other.toml"));
        assert_eq!(err.path(), Some(file));

        let err = load_from_str("max_source_bytes = 0\n")
            .unwrap_err()
            .with_path(file);
        assert_eq!(
            err.to_string(),
            "invalid backend config in backend.toml: 'max_source_bytes' must be greater than 0"
        );
    }

    #[test]
    fn unreadable_file_points_at_the_flag() {
        let err = load_from_path("/nonexistent/uast-query.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(err.path(), Some(Path::new("/nonexistent/uast-query.toml")));
        assert!(err
            .to_string()
            .starts_with("cannot read --config file /nonexistent/uast-query.toml: "));
    }
}
