//! The pluggable lexer contract.
//!
//! A lexer is a resumable tokenizer with an opaque, comparable state. The syntax cache feeds it
//! one line at a time as a [`Chunk`] copied out of the gap buffer, asks for the state at the end
//! of the line, and compares that state with what it had cached before an edit to decide whether
//! re-lexing can stop.
//!
//! # Chunk layout
//!
//! ```text
//!  chunk.offset         resume point            stop_offset
//!  |<--- pre_scan --->|<------- line text ------->|
//! ```
//!
//! `chunk.offset` is where the pre-scan region begins. When a lexer is resumed with
//! [`Resume`] (or relocated after it reported [`Lexer::pre_scan_length`]), the first
//! `pre_scan` characters are context it has already seen: typically the beginning of a token
//! that was still open when the previous line ended. Token offsets are chunk-relative, so a token
//! may start inside the pre-scan region.

use crate::error::LexerError;
use std::fmt::Debug;

/// A window of characters lent to a lexer for the duration of one call.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Backing characters.
    pub text: &'a [char],
    /// Start of the chunk inside `text` (beginning of the pre-scan region).
    pub offset: usize,
    /// Number of characters in the chunk.
    pub len: usize,
    /// `true` if nothing follows this chunk; pending tokens must be flushed.
    pub last_chunk: bool,
    /// Position inside `text` where the caller wants scanning to stop.
    pub stop_offset: usize,
}

impl<'a> Chunk<'a> {
    /// Chunk covering all of `text`, marked as the last one.
    pub fn new(text: &'a [char]) -> Self {
        Self {
            text,
            offset: 0,
            len: text.len(),
            last_chunk: true,
            stop_offset: text.len(),
        }
    }

    /// Set the `last_chunk` flag.
    pub fn with_last_chunk(mut self, last_chunk: bool) -> Self {
        self.last_chunk = last_chunk;
        self
    }

    /// Exclusive end of the chunk inside `text`.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Where scanning stops: `stop_offset`, capped to the chunk end.
    pub fn stop(&self) -> usize {
        self.stop_offset.min(self.end())
    }

    /// Character at `index` if it lies inside the chunk.
    pub fn get(&self, index: usize) -> Option<char> {
        if index >= self.offset && index < self.end() {
            self.text.get(index).copied()
        } else {
            None
        }
    }
}

/// Cached state a lexer resumes from.
#[derive(Debug, Clone, Copy)]
pub struct Resume<'s, S> {
    /// State at the start of the line.
    pub state: &'s S,
    /// Characters of context before the line start included in the chunk.
    pub pre_scan: usize,
}

/// A token produced by a lexer, in chunk-relative offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token<K> {
    /// Token classification.
    pub kind: K,
    /// Start inside the chunk's `text`.
    pub start: usize,
    /// Length in characters.
    pub len: usize,
}

impl<K> Token<K> {
    /// Create a token.
    pub fn new(kind: K, start: usize, len: usize) -> Self {
        Self { kind, start, len }
    }

    /// Exclusive end.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Result of [`Lexer::compare_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateComparison {
    /// Lexing from either state produces the same result.
    Equal,
    /// The states differ.
    NotEqual,
}

/// A stateful, resumable tokenizer.
///
/// `current_state` together with `pre_scan_length` must fully determine the states the lexer
/// reports for every following line; the syntax cache relies on it to stop re-lexing early.
pub trait Lexer {
    /// Opaque snapshot of the scanner mode (for example "inside a block comment").
    type State: Clone + Debug;
    /// Token classification.
    type TokenKind: Copy + Debug + PartialEq;

    /// State at offset 0 of a document.
    fn initial_state(&self) -> Self::State;

    /// Start tokenizing `chunk`, either fresh (`None`) or from a cached state.
    fn load(&mut self, resume: Option<Resume<'_, Self::State>>, chunk: &Chunk<'_>);

    /// Advance one token; `Ok(None)` once the chunk is exhausted.
    fn next_token(
        &mut self,
        chunk: &Chunk<'_>,
    ) -> Result<Option<Token<Self::TokenKind>>, LexerError>;

    /// Point the scanner at the next chunk, keeping the accumulated state.
    ///
    /// The chunk starts [`Lexer::pre_scan_length`] characters before the new scan position.
    fn relocate(&mut self, chunk: &Chunk<'_>);

    /// State at the position scanning stopped.
    fn current_state(&self) -> Self::State;

    /// Compare the current state with a previously captured one.
    fn compare_state(&self, other: &Self::State) -> StateComparison;

    /// Characters before the stop position needed to resume from [`Lexer::current_state`].
    fn pre_scan_length(&self) -> usize;
}

/// Token kind of [`PlainLexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlainToken {
    /// Uninterpreted text.
    Text,
}

/// Stateless lexer that reports each chunk as one text token.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLexer {
    pos: usize,
}

impl PlainLexer {
    /// Create a plain lexer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lexer for PlainLexer {
    type State = ();
    type TokenKind = PlainToken;

    fn initial_state(&self) -> Self::State {}

    fn load(&mut self, resume: Option<Resume<'_, Self::State>>, chunk: &Chunk<'_>) {
        self.pos = chunk.offset + resume.map_or(0, |resume| resume.pre_scan);
    }

    fn next_token(
        &mut self,
        chunk: &Chunk<'_>,
    ) -> Result<Option<Token<Self::TokenKind>>, LexerError> {
        let stop = chunk.stop();
        if self.pos >= stop {
            return Ok(None);
        }
        let token = Token::new(PlainToken::Text, self.pos, stop - self.pos);
        self.pos = stop;
        Ok(Some(token))
    }

    fn relocate(&mut self, chunk: &Chunk<'_>) {
        self.pos = chunk.offset;
    }

    fn current_state(&self) -> Self::State {}

    fn compare_state(&self, _other: &Self::State) -> StateComparison {
        StateComparison::Equal
    }

    fn pre_scan_length(&self) -> usize {
        0
    }
}
