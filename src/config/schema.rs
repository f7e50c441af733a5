use crate::client::ParseMode;
use crate::ts::Language;
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_MAX_SOURCE_BYTES: usize = 4 * 1024 * 1024;

/// Node positions store byte offsets as `u32`.
pub const SOURCE_BYTES_CEILING: u64 = u32::MAX as u64;

/// Settings for the tree-sitter parsing backend.
///
/// ```toml
/// default_mode = "semantic"
/// languages = ["python", "go"]
/// infer_language = true
/// max_source_bytes = 1048576
/// ```
#[derive(Debug, Deserialize, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Mode used when a caller does not ask for one.
    pub default_mode: String,
    /// Enabled languages; empty enables every supported language.
    pub languages: Vec<String>,
    /// Whether to guess the language from a `#!` line when no hint is given.
    pub infer_language: bool,
    /// Larger sources are rejected without being parsed.
    pub max_source_bytes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_mode: ParseMode::default().as_str().to_string(),
            languages: Vec::new(),
            infer_language: true,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if ParseMode::parse(&self.default_mode).is_none() {
            issues.push(ValidationIssue::UnknownMode {
                value: self.default_mode.clone(),
            });
        }

        for name in &self.languages {
            if Language::from_name(name).is_none() {
                issues.push(ValidationIssue::UnknownLanguage {
                    value: name.clone(),
                    suggestion: Language::suggest(name, Language::ALL),
                });
            }
        }

        if self.max_source_bytes == 0 {
            issues.push(ValidationIssue::ZeroLimit {
                field: "max_source_bytes",
            });
        } else if u32::try_from(self.max_source_bytes).is_err() {
            issues.push(ValidationIssue::LimitTooLarge {
                field: "max_source_bytes",
                max: SOURCE_BYTES_CEILING,
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The configured default mode, falling back to annotated.
    pub fn mode(&self) -> ParseMode {
        ParseMode::parse(&self.default_mode).unwrap_or_default()
    }

    /// Languages the backend will accept, in canonical order.
    pub fn enabled_languages(&self) -> Vec<Language> {
        if self.languages.is_empty() {
            return Language::ALL.to_vec();
        }

        let mut enabled: Vec<Language> = self
            .languages
            .iter()
            .filter_map(|name| Language::from_name(name))
            .collect();
        enabled.sort();
        enabled.dedup();
        enabled
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    UnknownMode {
        value: String,
    },
    UnknownLanguage {
        value: String,
        suggestion: Option<Language>,
    },
    ZeroLimit {
        field: &'static str,
    },
    LimitTooLarge {
        field: &'static str,
        max: u64,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::UnknownMode { value } => write!(
                f,
                "unknown default_mode '{value}', expected annotated, semantic or native"
            ),
            ValidationIssue::UnknownLanguage { value, suggestion } => match suggestion {
                Some(lang) => write!(f, "unknown language '{value}' (did you mean '{lang}'?)"),
                None => write!(f, "unknown language '{value}'"),
            },
            ValidationIssue::ZeroLimit { field } => write!(f, "'{field}' must be greater than 0"),
            ValidationIssue::LimitTooLarge { field, max } => write!(
                f,
                "'{field}' must be at most {max}, larger sources overflow node offsets"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BackendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mode(), ParseMode::Annotated);
        assert_eq!(config.enabled_languages().len(), Language::ALL.len());
    }

    #[test]
    fn collects_every_issue() {
        let config = BackendConfig {
            default_mode: "raw".into(),
            languages: vec!["pyhton".into(), "go".into()],
            infer_language: true,
            max_source_bytes: 0,
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 3);

        let message = err.to_string();
        assert!(message.contains("unknown default_mode 'raw'"));
        assert!(message.contains("did you mean 'python'"));
        assert!(message.contains("max_source_bytes"));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn source_limit_must_fit_offsets() {
        let at_ceiling = BackendConfig {
            max_source_bytes: u32::MAX as usize,
            ..BackendConfig::default()
        };
        assert!(at_ceiling.validate().is_ok());

        let above = BackendConfig {
            max_source_bytes: u32::MAX as usize + 1,
            ..BackendConfig::default()
        };
        let err = above.validate().unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(matches!(
            err.issues[0],
            ValidationIssue::LimitTooLarge {
                field: "max_source_bytes",
                max: SOURCE_BYTES_CEILING,
            }
        ));
        assert!(err.to_string().contains("at most 4294967295"));
    }

    #[test]
    fn enabled_languages_are_deduplicated() {
        let config = BackendConfig {
            languages: vec!["py".into(), "Python".into(), "go".into()],
            ..BackendConfig::default()
        };
        assert_eq!(
            config.enabled_languages(),
            vec![Language::Go, Language::Python]
        );
    }
}
