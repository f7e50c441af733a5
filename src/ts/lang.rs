//! Languages the tree-sitter backend can parse.
//!
//! Grammars come from ast-grep-language's `SupportLang`, but only the
//! languages listed here are exposed. Anything else, even if ast-grep has a
//! grammar for it, is reported as unsupported.

use ast_grep_language::{LanguageExt, SupportLang};
use std::fmt;
use std::path::Path;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Bash,
    C,
    Cpp,
    CSharp,
    Go,
    Java,
    JavaScript,
    Php,
    Python,
    Ruby,
    Rust,
    TypeScript,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::Bash,
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Go,
        Language::Java,
        Language::JavaScript,
        Language::Php,
        Language::Python,
        Language::Ruby,
        Language::Rust,
        Language::TypeScript,
    ];

    /// Canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Bash => "bash",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Php => "php",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Language::Bash => &["sh", "shell"],
            Language::C => &[],
            Language::Cpp => &["c++", "cxx"],
            Language::CSharp => &["c#", "cs"],
            Language::Go => &["golang"],
            Language::Java => &[],
            Language::JavaScript => &["js", "node"],
            Language::Php => &[],
            Language::Python => &["py"],
            Language::Ruby => &["rb"],
            Language::Rust => &["rs"],
            Language::TypeScript => &["ts"],
        }
    }

    /// Look up a language by name or alias, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Language::ALL.into_iter().find(|lang| {
            lang.name().eq_ignore_ascii_case(name)
                || lang
                    .aliases()
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(name))
        })
    }

    /// Closest supported language name for a misspelled one.
    pub fn suggest(name: &str, candidates: impl IntoIterator<Item = Language>) -> Option<Self> {
        let needle = name.trim().to_ascii_lowercase();
        candidates
            .into_iter()
            .map(|lang| (lang, strsim::jaro_winkler(&needle, lang.name())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(lang, _)| lang)
    }

    /// Infer the language from a `#!` interpreter line.
    pub fn from_shebang(source: &[u8]) -> Option<Self> {
        let first_line = source.split(|&b| b == b'\n').next()?;
        let line = std::str::from_utf8(first_line).ok()?.trim_start_matches('\u{feff}');
        let command = line.strip_prefix("#!")?;

        let mut words = command.split_whitespace();
        let mut interpreter = basename(words.next()?);
        if interpreter == "env" {
            interpreter = words.find(|word| !word.starts_with('-')).map(basename)?;
        }

        let interpreter = interpreter.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
        match interpreter {
            "python" | "pypy" => Some(Language::Python),
            "bash" | "sh" | "zsh" | "dash" | "ksh" => Some(Language::Bash),
            "node" | "nodejs" | "deno" | "bun" => Some(Language::JavaScript),
            "ts-node" | "tsx" => Some(Language::TypeScript),
            "ruby" => Some(Language::Ruby),
            "php" => Some(Language::Php),
            _ => None,
        }
    }

    /// Guess the language from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        let lang = match ext.as_str() {
            "sh" | "bash" | "zsh" => Language::Bash,
            "c" | "h" => Language::C,
            "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "go" => Language::Go,
            "java" => Language::Java,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "php" => Language::Php,
            "py" | "pyi" => Language::Python,
            "rb" => Language::Ruby,
            "rs" => Language::Rust,
            "ts" | "mts" | "cts" => Language::TypeScript,
            _ => return None,
        };
        Some(lang)
    }

    pub(crate) fn support_lang(&self) -> SupportLang {
        match self {
            Language::Bash => SupportLang::Bash,
            Language::C => SupportLang::C,
            Language::Cpp => SupportLang::Cpp,
            Language::CSharp => SupportLang::CSharp,
            Language::Go => SupportLang::Go,
            Language::Java => SupportLang::Java,
            Language::JavaScript => SupportLang::JavaScript,
            Language::Php => SupportLang::Php,
            Language::Python => SupportLang::Python,
            Language::Ruby => SupportLang::Ruby,
            Language::Rust => SupportLang::Rust,
            Language::TypeScript => SupportLang::TypeScript,
        }
    }

    pub(crate) fn grammar(&self) -> tree_sitter::Language {
        self.support_lang().get_ts_language()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
