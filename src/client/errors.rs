use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{}", unsupported_message(.language, .suggestion))]
    UnsupportedLanguage {
        /// The requested language, or `None` when inference failed.
        language: Option<String>,
        suggestion: Option<String>,
    },

    #[error("failed to parse {language} source: {}", .diagnostics.join("; "))]
    ParseFailed {
        language: String,
        diagnostics: Vec<String>,
    },
}

impl ParseError {
    pub fn unsupported(language: impl Into<String>) -> Self {
        ParseError::UnsupportedLanguage {
            language: Some(language.into()),
            suggestion: None,
        }
    }

    pub fn not_inferred() -> Self {
        ParseError::UnsupportedLanguage {
            language: None,
            suggestion: None,
        }
    }

    pub fn failed(language: impl Into<String>, diagnostics: Vec<String>) -> Self {
        ParseError::ParseFailed {
            language: language.into(),
            diagnostics,
        }
    }
}

fn unsupported_message(language: &Option<String>, suggestion: &Option<String>) -> String {
    match (language, suggestion) {
        (Some(language), Some(suggestion)) => {
            format!("unsupported language '{language}' (did you mean '{suggestion}'?)")
        }
        (Some(language), None) => format!("unsupported language '{language}'"),
        (None, _) => "could not infer the language of the source".to_string(),
    }
}
