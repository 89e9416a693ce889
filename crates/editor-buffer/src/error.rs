//! Error types shared by every layer of the buffer core.

use crate::marks::MarkHandle;
use thiserror::Error;

/// Coarse classification of a [`BufferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An offset, length or line index was outside the valid range.
    Bounds,
    /// A mark handle was disposed or never belonged to this document.
    InvalidHandle,
    /// An internal invariant was violated (programmer error).
    IllegalState,
    /// The pluggable lexer failed.
    Lexer,
}

/// Failure reported by a [`Lexer`](crate::lexer::Lexer) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("lexer failure at chunk offset {offset}: {message}")]
pub struct LexerError {
    /// Chunk-relative offset where scanning failed.
    pub offset: usize,
    /// Human readable reason.
    pub message: String,
}

impl LexerError {
    /// Create a lexer error at a chunk-relative offset.
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by the buffer, mark table, line index and syntax cache.
pub enum BufferError {
    #[error("invalid range: offset {offset} + length {length} exceeds {limit}")]
    /// `offset`/`length` violate `0 <= offset <= offset + length <= limit`.
    InvalidOffset {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        length: usize,
        /// Current logical length.
        limit: usize,
    },

    #[error("invalid line {line} (line count {line_count})")]
    /// A line index was not below the current line count.
    InvalidLine {
        /// Requested line index.
        line: usize,
        /// Current line count.
        line_count: usize,
    },

    #[error("invalid mark handle {0:?}")]
    /// Operation on a disposed or foreign mark.
    InvalidHandle(MarkHandle),

    #[error("illegal state: {0}")]
    /// Internal invariant violation; the operation was aborted.
    IllegalState(String),

    #[error(transparent)]
    /// The lexer failed while the syntax cache was being repaired.
    Lexer(#[from] LexerError),
}

impl BufferError {
    /// Map this error onto the coarse [`ErrorKind`] taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOffset { .. } | Self::InvalidLine { .. } => ErrorKind::Bounds,
            Self::InvalidHandle(_) => ErrorKind::InvalidHandle,
            Self::IllegalState(_) => ErrorKind::IllegalState,
            Self::Lexer(_) => ErrorKind::Lexer,
        }
    }

    pub(crate) fn illegal(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BufferError>;

/// Validate `0 <= offset <= offset + length <= limit`.
pub(crate) fn check_range(offset: usize, length: usize, limit: usize) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(BufferError::InvalidOffset {
            offset,
            length,
            limit,
        }),
    }
}
