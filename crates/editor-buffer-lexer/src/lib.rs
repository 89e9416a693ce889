#![warn(missing_docs)]
//! `editor-buffer-lexer` - a simple resumable lexer for `editor-buffer`.
//!
//! [`SimpleLexer`] tokenizes comments, strings, words, numbers and punctuation from a
//! [`LanguageConfig`]. Its state is small ([`LexState`]): outside of anything, inside a block
//! comment, or inside a multi-line string. Constructs spanning lines are reported as one token
//! piece per line, so the lexer never needs pre-scan context.
//!
//! Word classification goes through an ordered list of regex [`WordRule`]s after the keyword
//! check, which keeps number syntax and naming conventions configurable per language.

use editor_buffer::{Chunk, Lexer, LexerError, Resume, StateComparison, Token};
use editor_buffer_lang::LanguageConfig;
use regex::Regex;

/// Token classes produced by [`SimpleLexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Spaces and tabs.
    Whitespace,
    /// A `'\n'`.
    Newline,
    /// A word that is neither a keyword nor matched by a rule.
    Identifier,
    /// A configured keyword.
    Keyword,
    /// A numeric literal.
    Number,
    /// A word matched by a custom rule.
    Constant,
    /// A string literal (or the part of it on one line).
    String,
    /// A line comment.
    LineComment,
    /// A block comment (or the part of it on one line).
    BlockComment,
    /// Any other single character.
    Punctuation,
}

/// Scanner mode carried from one line to the next.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LexState {
    /// Outside of any multi-line construct.
    #[default]
    Normal,
    /// Inside a block comment.
    BlockComment,
    /// Inside a multi-line string opened by the given delimiter.
    String(char),
}

/// A regex classifying whole words.
#[derive(Debug, Clone)]
pub struct WordRule {
    regex: Regex,
    kind: TokenKind,
}

impl WordRule {
    /// Words fully matching `pattern` get `kind`.
    pub fn new(pattern: &str, kind: TokenKind) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&format!("^(?:{pattern})$"))?,
            kind,
        })
    }

    /// Token kind assigned on match.
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns `true` if `word` matches.
    pub fn matches(&self, word: &str) -> bool {
        self.regex.is_match(word)
    }
}

/// Pattern for decimal, hexadecimal and float literals with `_` separators.
pub const NUMBER_PATTERN: &str =
    r"0[xX][0-9a-fA-F_]+|0[bB][01_]+|[0-9][0-9_]*(?:\.[0-9_]+)?(?:[eE][+-]?[0-9_]+)?[a-zA-Z0-9]*";

/// Pattern for `SCREAMING_CASE` constants.
pub const CONSTANT_PATTERN: &str = r"[A-Z][A-Z0-9_]*[A-Z0-9]";

/// Resumable tokenizer driven by a [`LanguageConfig`].
#[derive(Debug, Clone)]
pub struct SimpleLexer {
    config: LanguageConfig,
    rules: Vec<WordRule>,
    line_comment: Vec<char>,
    block_start: Vec<char>,
    block_end: Vec<char>,
    state: LexState,
    pos: usize,
}

impl SimpleLexer {
    /// Lexer with the default word rules (numbers, constants).
    pub fn new(config: LanguageConfig) -> Result<Self, regex::Error> {
        Ok(Self::with_rules(
            config,
            vec![
                WordRule::new(NUMBER_PATTERN, TokenKind::Number)?,
                WordRule::new(CONSTANT_PATTERN, TokenKind::Constant)?,
            ],
        ))
    }

    /// Lexer with custom word rules, tried in order after the keyword check.
    pub fn with_rules(config: LanguageConfig, rules: Vec<WordRule>) -> Self {
        let chars = |token: &Option<String>| -> Vec<char> {
            token.as_deref().unwrap_or_default().chars().collect()
        };
        let (block_start, block_end) = if config.comments.has_block() {
            (
                chars(&config.comments.block_start),
                chars(&config.comments.block_end),
            )
        } else {
            (Vec::new(), Vec::new())
        };
        Self {
            line_comment: chars(&config.comments.line),
            block_start,
            block_end,
            config,
            rules,
            state: LexState::Normal,
            pos: 0,
        }
    }

    /// The language this lexer was built for.
    pub fn config(&self) -> &LanguageConfig {
        &self.config
    }

    /// Word rules, in classification order.
    pub fn rules(&self) -> &[WordRule] {
        &self.rules
    }

    fn at(&self, chunk: &Chunk<'_>, index: usize) -> Option<char> {
        if index < chunk.stop() {
            chunk.get(index)
        } else {
            None
        }
    }

    fn starts_with(&self, chunk: &Chunk<'_>, index: usize, pattern: &[char]) -> bool {
        !pattern.is_empty()
            && pattern
                .iter()
                .enumerate()
                .all(|(i, expected)| self.at(chunk, index + i) == Some(*expected))
    }

    fn scan_block_comment(&mut self, chunk: &Chunk<'_>) {
        loop {
            if self.starts_with(chunk, self.pos, &self.block_end) {
                self.pos += self.block_end.len();
                self.state = LexState::Normal;
                return;
            }
            if self.at(chunk, self.pos).is_none() {
                return;
            }
            self.pos += 1;
        }
    }

    fn scan_string(&mut self, chunk: &Chunk<'_>, delimiter: char) {
        let (escape, multiline) = self
            .config
            .strings
            .as_ref()
            .map_or((None, false), |strings| (strings.escape, strings.multiline));
        while let Some(ch) = self.at(chunk, self.pos) {
            if ch == '\n' && !multiline {
                self.state = LexState::Normal;
                return;
            }
            self.pos += 1;
            if Some(ch) == escape {
                if self.at(chunk, self.pos).is_some() {
                    self.pos += 1;
                }
            } else if ch == delimiter {
                self.state = LexState::Normal;
                return;
            }
        }
        self.state = if multiline {
            LexState::String(delimiter)
        } else {
            LexState::Normal
        };
    }

    fn scan_word(&mut self, chunk: &Chunk<'_>) -> TokenKind {
        let start = self.pos;
        let numeric = self.at(chunk, start).is_some_and(|ch| ch.is_ascii_digit());
        while let Some(ch) = self.at(chunk, self.pos) {
            let fraction = numeric
                && ch == '.'
                && self
                    .at(chunk, self.pos + 1)
                    .is_some_and(|next| next.is_ascii_digit());
            if ch.is_alphanumeric() || ch == '_' || fraction {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word: String = chunk.text[start..self.pos].iter().collect();
        if self.config.is_keyword(&word) {
            return TokenKind::Keyword;
        }
        self.rules
            .iter()
            .find(|rule| rule.matches(&word))
            .map_or(TokenKind::Identifier, WordRule::kind)
    }

    fn scan_normal(&mut self, chunk: &Chunk<'_>, ch: char) -> TokenKind {
        if ch == '\n' {
            self.pos += 1;
            return TokenKind::Newline;
        }
        if ch.is_whitespace() {
            while self
                .at(chunk, self.pos)
                .is_some_and(|ch| ch.is_whitespace() && ch != '\n')
            {
                self.pos += 1;
            }
            return TokenKind::Whitespace;
        }
        if self.starts_with(chunk, self.pos, &self.line_comment) {
            while self.at(chunk, self.pos).is_some_and(|ch| ch != '\n') {
                self.pos += 1;
            }
            return TokenKind::LineComment;
        }
        if self.starts_with(chunk, self.pos, &self.block_start) {
            self.pos += self.block_start.len();
            self.state = LexState::BlockComment;
            self.scan_block_comment(chunk);
            return TokenKind::BlockComment;
        }
        if self
            .config
            .strings
            .as_ref()
            .is_some_and(|strings| strings.is_delimiter(ch))
        {
            self.pos += 1;
            self.scan_string(chunk, ch);
            return TokenKind::String;
        }
        if ch.is_alphanumeric() || ch == '_' {
            return self.scan_word(chunk);
        }
        self.pos += 1;
        TokenKind::Punctuation
    }
}

impl Lexer for SimpleLexer {
    type State = LexState;
    type TokenKind = TokenKind;

    fn initial_state(&self) -> LexState {
        LexState::Normal
    }

    fn load(&mut self, resume: Option<Resume<'_, LexState>>, chunk: &Chunk<'_>) {
        match resume {
            Some(resume) => {
                self.state = resume.state.clone();
                self.pos = chunk.offset + resume.pre_scan;
            }
            None => {
                self.state = LexState::Normal;
                self.pos = chunk.offset;
            }
        }
        tracing::trace!(language = %self.config.name, state = ?self.state, "lexer loaded");
    }

    fn next_token(
        &mut self,
        chunk: &Chunk<'_>,
    ) -> Result<Option<Token<TokenKind>>, LexerError> {
        let start = self.pos;
        let Some(ch) = self.at(chunk, start) else {
            return Ok(None);
        };
        let kind = match self.state.clone() {
            LexState::BlockComment => {
                self.scan_block_comment(chunk);
                TokenKind::BlockComment
            }
            LexState::String(delimiter) => {
                self.scan_string(chunk, delimiter);
                TokenKind::String
            }
            LexState::Normal => self.scan_normal(chunk, ch),
        };
        if self.pos <= start {
            return Err(LexerError::new(start, format!("no progress on {ch:?}")));
        }
        Ok(Some(Token::new(kind, start, self.pos - start)))
    }

    fn relocate(&mut self, chunk: &Chunk<'_>) {
        self.pos = chunk.offset;
    }

    fn current_state(&self) -> LexState {
        self.state.clone()
    }

    fn compare_state(&self, other: &LexState) -> StateComparison {
        if self.state == *other {
            StateComparison::Equal
        } else {
            StateComparison::NotEqual
        }
    }

    fn pre_scan_length(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lex(lexer: &mut SimpleLexer, text: &str) -> Vec<(TokenKind, String)> {
        let chars: Vec<char> = text.chars().collect();
        let chunk = Chunk::new(&chars);
        lexer.load(None, &chunk);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token(&chunk).unwrap() {
            tokens.push((
                token.kind,
                chars[token.start..token.end()].iter().collect(),
            ));
        }
        tokens
    }

    fn kinds(tokens: &[(TokenKind, String)]) -> Vec<TokenKind> {
        tokens.iter().map(|(kind, _)| *kind).collect()
    }

    #[test]
    fn test_rust_line() {
        let mut lexer = SimpleLexer::new(LanguageConfig::rust()).unwrap();
        let tokens = lex(&mut lexer, "let x = 0x1F; // done\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Keyword,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Punctuation,
                TokenKind::Whitespace,
                TokenKind::Number,
                TokenKind::Punctuation,
                TokenKind::Whitespace,
                TokenKind::LineComment,
                TokenKind::Newline,
            ]
        );
        assert_eq!(tokens[9].1, "// done");
    }

    #[test]
    fn test_float_and_constant() {
        let mut lexer = SimpleLexer::new(LanguageConfig::rust()).unwrap();
        let tokens = lex(&mut lexer, "MAX_LEN 3.25 x.y");
        assert_eq!(tokens[0], (TokenKind::Constant, "MAX_LEN".to_string()));
        assert_eq!(tokens[2], (TokenKind::Number, "3.25".to_string()));
        assert_eq!(tokens[4], (TokenKind::Identifier, "x".to_string()));
        assert_eq!(tokens[5], (TokenKind::Punctuation, ".".to_string()));
    }

    #[test]
    fn test_block_comment_state_carries_over() {
        let mut lexer = SimpleLexer::new(LanguageConfig::c()).unwrap();
        let tokens = lex(&mut lexer, "a /* open\n");
        assert_eq!(tokens[2], (TokenKind::BlockComment, "/* open\n".to_string()));
        assert_eq!(lexer.current_state(), LexState::BlockComment);

        let chars: Vec<char> = "still */ b\n".chars().collect();
        let chunk = Chunk::new(&chars);
        lexer.relocate(&chunk);
        let token = lexer.next_token(&chunk).unwrap().unwrap();
        assert_eq!(token.kind, TokenKind::BlockComment);
        assert_eq!(token.len, 8);
        assert_eq!(lexer.current_state(), LexState::Normal);
    }

    #[test]
    fn test_single_line_string_ends_at_newline() {
        let mut lexer = SimpleLexer::new(LanguageConfig::c()).unwrap();
        let tokens = lex(&mut lexer, "\"abc\n");
        assert_eq!(tokens[0], (TokenKind::String, "\"abc".to_string()));
        assert_eq!(lexer.current_state(), LexState::Normal);
    }

    #[test]
    fn test_multiline_string_and_escape() {
        let mut lexer = SimpleLexer::new(LanguageConfig::rust()).unwrap();
        let tokens = lex(&mut lexer, "\"a\\\"b\n");
        assert_eq!(tokens.len(), 1);
        assert_eq!(lexer.current_state(), LexState::String('"'));
        assert_eq!(lexer.compare_state(&LexState::String('"')), StateComparison::Equal);
        assert_eq!(lexer.compare_state(&LexState::Normal), StateComparison::NotEqual);
    }

    #[test]
    fn test_custom_rule() {
        let rules = vec![WordRule::new(r"[A-Z][a-zA-Z]+", TokenKind::Constant).unwrap()];
        let mut lexer = SimpleLexer::with_rules(LanguageConfig::json(), rules);
        let tokens = lex(&mut lexer, "Type null 12");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Constant,
                TokenKind::Whitespace,
                TokenKind::Keyword,
                TokenKind::Whitespace,
                TokenKind::Identifier,
            ]
        );
    }
}
