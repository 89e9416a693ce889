#![warn(missing_docs)]
//! `editor-buffer-lang` - data-driven language configuration for `editor-buffer` lexers.
//!
//! This crate stays dependency-free. It describes *what* a language looks like at the lexical
//! level (comment tokens, string delimiters, keywords); lexers such as `editor-buffer-lexer` turn
//! that description into resumable tokenizers.

/// Comment tokens for a given language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `//`, `#`).
    pub line: Option<String>,
    /// Block comment start token (e.g. `/*`).
    pub block_start: Option<String>,
    /// Block comment end token (e.g. `*/`).
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }

    /// Only block comments.
    pub fn block(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            line: None,
            block_start: Some(start.into()),
            block_end: Some(end.into()),
        }
    }

    /// Both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_start: impl Into<String>,
        block_end: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line.into()),
            block_start: Some(block_start.into()),
            block_end: Some(block_end.into()),
        }
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Returns `true` if both block comment tokens are configured.
    pub fn has_block(&self) -> bool {
        self.block_start.as_deref().is_some_and(|s| !s.is_empty())
            && self.block_end.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// String literal rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringConfig {
    /// Characters that open and close a string (e.g. `"` and `'`).
    pub delimiters: Vec<char>,
    /// Escape character inside strings, if any.
    pub escape: Option<char>,
    /// Whether a string may run past the end of a line.
    pub multiline: bool,
}

impl Default for StringConfig {
    fn default() -> Self {
        Self {
            delimiters: vec!['"'],
            escape: Some('\\'),
            multiline: false,
        }
    }
}

impl StringConfig {
    /// Strings delimited by any of `delimiters`, with a backslash escape.
    pub fn new(delimiters: impl IntoIterator<Item = char>) -> Self {
        Self {
            delimiters: delimiters.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Set the escape character.
    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    /// Allow strings to span lines.
    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Returns `true` if `ch` opens a string.
    pub fn is_delimiter(&self, ch: char) -> bool {
        self.delimiters.contains(&ch)
    }
}

/// Lexical description of a language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LanguageConfig {
    /// Language identifier (e.g. `"rust"`).
    pub name: String,
    /// Comment tokens.
    pub comments: CommentConfig,
    /// String literal rules; `None` disables strings.
    pub strings: Option<StringConfig>,
    /// Reserved words, kept sorted.
    pub keywords: Vec<String>,
}

impl LanguageConfig {
    /// A language with no comments, strings or keywords.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the comment tokens.
    pub fn with_comments(mut self, comments: CommentConfig) -> Self {
        self.comments = comments;
        self
    }

    /// Set the string rules.
    pub fn with_strings(mut self, strings: StringConfig) -> Self {
        self.strings = Some(strings);
        self
    }

    /// Set the keyword list.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self.keywords.sort();
        self.keywords.dedup();
        self
    }

    /// Returns `true` if `word` is a keyword.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords
            .binary_search_by(|keyword| keyword.as_str().cmp(word))
            .is_ok()
    }

    /// Rust: `//` and `/* */` comments, multi-line `"` strings.
    pub fn rust() -> Self {
        Self::new("rust")
            .with_comments(CommentConfig::line_and_block("//", "/*", "*/"))
            .with_strings(StringConfig::new(['"']).with_multiline(true))
            .with_keywords([
                "as", "break", "const", "continue", "crate", "else", "enum", "false", "fn", "for",
                "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
                "return", "self", "Self", "static", "struct", "super", "trait", "true", "type",
                "unsafe", "use", "where", "while",
            ])
    }

    /// C: `//` and `/* */` comments, single-line `"` and `'` literals.
    pub fn c() -> Self {
        Self::new("c")
            .with_comments(CommentConfig::line_and_block("//", "/*", "*/"))
            .with_strings(StringConfig::new(['"', '\'']))
            .with_keywords([
                "break", "case", "char", "const", "continue", "default", "do", "double", "else",
                "enum", "extern", "float", "for", "if", "int", "long", "return", "short",
                "signed", "sizeof", "static", "struct", "switch", "typedef", "union",
                "unsigned", "void", "while",
            ])
    }

    /// JSON: no comments, `"` strings, literal keywords.
    pub fn json() -> Self {
        Self::new("json")
            .with_strings(StringConfig::new(['"']))
            .with_keywords(["false", "null", "true"])
    }

    /// Shell-like configuration files: `#` comments, `"` and `'` strings.
    pub fn shell() -> Self {
        Self::new("shell")
            .with_comments(CommentConfig::line("#"))
            .with_strings(StringConfig::new(['"', '\'']).with_multiline(true))
            .with_keywords([
                "case", "do", "done", "elif", "else", "esac", "fi", "for", "function", "if",
                "in", "then", "while",
            ])
    }
}
