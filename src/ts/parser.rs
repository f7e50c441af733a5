use crate::client::{ParseError, ParseMode, Parser};
use crate::config::{BackendConfig, ValidationError};
use crate::pool::with_parser;
use crate::ts::convert::convert;
use crate::ts::lang::Language;
use crate::ts::validator::syntax_issues;
use crate::uast::Node;
use std::collections::BTreeSet;
use tracing::debug;

/// In-process [`Parser`] backed by tree-sitter grammars.
///
/// Cheap to share: it only holds settings, the grammars themselves live in
/// a per-thread pool.
#[derive(Debug, Clone)]
pub struct TreeSitterParser {
    default_mode: ParseMode,
    languages: BTreeSet<Language>,
    infer_language: bool,
    max_source_bytes: usize,
}

impl TreeSitterParser {
    /// Create a parser with every supported language enabled.
    pub fn new() -> Self {
        Self {
            default_mode: ParseMode::default(),
            languages: Language::ALL.into_iter().collect(),
            infer_language: true,
            max_source_bytes: crate::config::DEFAULT_MAX_SOURCE_BYTES,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            default_mode: config.mode(),
            languages: config.enabled_languages().into_iter().collect(),
            infer_language: config.infer_language,
            max_source_bytes: config.max_source_bytes,
        })
    }

    pub fn default_mode(&self) -> ParseMode {
        self.default_mode
    }

    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.languages.iter().copied()
    }

    /// Pick the language for `source`, from the hint or from its shebang.
    ///
    /// An empty hint counts as no hint.
    pub fn resolve_language(
        &self,
        source: &[u8],
        hint: Option<&str>,
    ) -> Result<Language, ParseError> {
        match hint.map(str::trim).filter(|hint| !hint.is_empty()) {
            Some(hint) => Language::from_name(hint)
                .filter(|lang| self.languages.contains(lang))
                .ok_or_else(|| ParseError::UnsupportedLanguage {
                    language: Some(hint.to_string()),
                    suggestion: Language::suggest(hint, self.languages())
                        .map(|lang| lang.name().to_string()),
                }),
            None => {
                if !self.infer_language {
                    return Err(ParseError::not_inferred());
                }
                match Language::from_shebang(source) {
                    Some(lang) if self.languages.contains(&lang) => Ok(lang),
                    Some(lang) => Err(ParseError::unsupported(lang.name())),
                    None => Err(ParseError::not_inferred()),
                }
            }
        }
    }

    /// Parse `source` as `language`, bypassing language resolution.
    pub fn parse_language(
        &self,
        source: &[u8],
        language: Language,
        mode: ParseMode,
    ) -> Result<Node, ParseError> {
        if source.len() > self.max_source_bytes {
            return Err(ParseError::failed(
                language.name(),
                vec![format!(
                    "source is {} bytes, limit is {}",
                    source.len(),
                    self.max_source_bytes
                )],
            ));
        }

        debug!(%language, %mode, bytes = source.len(), "parsing source");

        let tree = with_parser(language, |parser| parser.parse(source, None))?
            .ok_or_else(|| {
                ParseError::failed(language.name(), vec!["parser produced no tree".into()])
            })?;

        let root = tree.root_node();
        let issues = syntax_issues(root);
        if !issues.is_empty() {
            debug!(%language, errors = issues.len(), "source has syntax errors");
            return Err(ParseError::failed(
                language.name(),
                issues.iter().map(|issue| issue.describe()).collect(),
            ));
        }

        convert(root, source, mode)
            .map_err(|err| ParseError::failed(language.name(), vec![err.to_string()]))
    }
}

impl Default for TreeSitterParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for TreeSitterParser {
    fn parse(
        &self,
        source: &[u8],
        language: Option<&str>,
        mode: Option<ParseMode>,
    ) -> Result<Node, ParseError> {
        let language = self.resolve_language(source, language)?;
        self.parse_language(source, language, mode.unwrap_or(self.default_mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_python() {
        let parser = TreeSitterParser::new();
        let root = parser.parse(b"x = 1\n", Some("python"), None).unwrap();
        assert_eq!(root.kind(), "Module");
    }

    #[test]
    fn parse_invalid_source_fails_with_diagnostics() {
        let parser = TreeSitterParser::new();
        let err = parser
            .parse(b"def f(:\n", Some("Python"), None)
            .unwrap_err();
        match err {
            ParseError::ParseFailed {
                language,
                diagnostics,
            } => {
                assert_eq!(language, "python");
                assert!(!diagnostics.is_empty());
            }
            other => panic!("expected ParseFailed, got {other:?}"),
        }
    }

    #[test]
    fn unknown_language_is_unsupported() {
        let parser = TreeSitterParser::new();
        let err = parser.parse(b"a: 1\n", Some("YAML"), None).unwrap_err();
        assert_eq!(err, ParseError::unsupported("YAML"));

        let err = parser.parse(b"x = 1\n", Some("pyton"), None).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedLanguage {
                language: Some("pyton".into()),
                suggestion: Some("python".into()),
            }
        );
    }

    #[test]
    fn language_is_inferred_from_shebang() {
        let parser = TreeSitterParser::new();
        let root = parser
            .parse(b"#!/usr/bin/env python\nx = 1\n", None, None)
            .unwrap();
        assert_eq!(root.kind(), "Module");

        assert_eq!(
            parser.parse(b"x = 1\n", None, None).unwrap_err(),
            ParseError::not_inferred()
        );
        assert_eq!(
            parser.parse(b"x = 1\n", Some("  "), None).unwrap_err(),
            ParseError::not_inferred()
        );
    }

    #[test]
    fn config_restricts_languages_and_size() {
        let config = BackendConfig {
            languages: vec!["go".into()],
            infer_language: false,
            max_source_bytes: 16,
            default_mode: "native".into(),
        };
        let parser = TreeSitterParser::from_config(&config).unwrap();
        assert_eq!(parser.default_mode(), ParseMode::Native);

        assert!(matches!(
            parser.parse(b"x = 1\n", Some("python"), None),
            Err(ParseError::UnsupportedLanguage { .. })
        ));
        assert_eq!(
            parser
                .parse(b"#!/usr/bin/env python\n", None, None)
                .unwrap_err(),
            ParseError::not_inferred()
        );
        assert!(matches!(
            parser.parse(b"package main\n\nfunc main() {}\n", Some("go"), None),
            Err(ParseError::ParseFailed { .. })
        ));

        let root = parser.parse(b"package main\n", Some("go"), None).unwrap();
        assert_eq!(root.kind(), "source_file");
    }

    #[test]
    fn parser_is_shareable_across_threads() {
        let parser = std::sync::Arc::new(TreeSitterParser::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let parser = parser.clone();
                std::thread::spawn(move || {
                    let source = format!("x{i} = {i}\n");
                    parser
                        .parse(source.as_bytes(), Some("python"), None)
                        .map(|root| root.size())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().unwrap() > 1);
        }
    }
}
