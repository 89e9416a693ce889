#![warn(missing_docs)]
//! Editor Buffer - Text Storage Engine for Editable Documents
//!
//! # Overview
//!
//! `editor-buffer` is the mutable core underneath an editable document: a gap-buffer character
//! store, live positions ("marks") that survive edits, a line-boundary index, and an incremental
//! per-line lexer-state cache that avoids re-scanning the whole document after every edit.
//! Rendering, carets and key bindings are consumers of the offsets and text produced here.
//!
//! # Core Features
//!
//! - **Gap Buffer Storage**: amortized O(1) insertion/deletion near the edit point
//! - **Marks**: positions with forward/backward bias, restored exactly across undo
//! - **Line Index**: O(log n) offset/line lookup with a pending shift for local edits
//! - **Incremental Syntax States**: lazy re-lexing with early exit once states reconverge
//! - **Undo/Redo**: reversible edit transactions and a grouped undo history
//! - **Change Notifications**: one structured delta per write section
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document + UndoHistory                     │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  EditTransaction (undo unit)                │  ← Reversible edits
//! ├─────────────────────────────────────────────┤
//! │  SyntaxStateCache  ←  Lexer (pluggable)     │  ← Lexer states
//! ├─────────────────────────────────────────────┤
//! │  LineIndex                                  │  ← Line access
//! ├─────────────────────────────────────────────┤
//! │  MarkTable                                  │  ← Live positions
//! ├─────────────────────────────────────────────┤
//! │  GapBuffer                                  │  ← Text storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use editor_buffer::{Bias, PlainDocument, PlainLexer, UndoHistory};
//!
//! let mut doc = PlainDocument::new("fn main() {\n}\n", PlainLexer::new());
//! let mut history = UndoHistory::for_options(doc.options());
//!
//! let caret = doc.create_mark(12, Bias::Forward).unwrap();
//! history.push(doc.insert(12, "    body();\n").unwrap()).unwrap();
//! assert_eq!(doc.line_count(), 4);
//! assert_eq!(doc.mark_offset(caret).unwrap(), 24);
//!
//! history.undo(&mut doc).unwrap();
//! assert_eq!(doc.text(), "fn main() {\n}\n");
//! assert_eq!(doc.mark_offset(caret).unwrap(), 12);
//! ```
//!
//! # Module Description
//!
//! - [`storage`] - gap buffer
//! - [`marks`] - mark table and handles
//! - [`line_index`] - line records
//! - [`lexer`] - the lexer contract and a plain lexer
//! - [`syntax`] - lexer state cache
//! - [`transaction`] - undoable edits
//! - [`history`] - undo/redo stacks
//! - [`document`] - the façade tying everything together
//! - [`state`] - change notifications
//! - [`delta`] - structured text deltas
//! - [`line_ending`] - LF/CRLF handling

pub mod delta;
pub mod document;
pub mod error;
pub mod history;
pub mod lexer;
pub mod line_ending;
pub mod line_index;
pub mod marks;
pub mod options;
pub mod state;
pub mod storage;
pub mod syntax;
pub mod transaction;

pub use delta::{TextDelta, TextDeltaEdit};
pub use document::{Document, PlainDocument};
pub use error::{BufferError, ErrorKind, LexerError, Result};
pub use history::UndoHistory;
pub use lexer::{Chunk, Lexer, PlainLexer, PlainToken, Resume, StateComparison, Token};
pub use line_ending::LineEnding;
pub use line_index::{LineChange, LineIndex, LineRecord, Position};
pub use marks::{Bias, DisplacedMark, MarkHandle, MarkTable};
pub use options::DocumentOptions;
pub use state::{ChangeCallback, DocumentChange, ListenerId};
pub use storage::GapBuffer;
pub use syntax::SyntaxStateCache;
pub use transaction::{EditKind, EditTransaction, TransactionStatus};
