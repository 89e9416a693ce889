//! The document façade.
//!
//! [`Document`] owns one gap buffer, its marks, its line index and its syntax cache, and keeps
//! them in step. Every mutation runs through the same pipeline:
//!
//! ```text
//! GapBuffer ──> MarkTable ──> LineIndex ──> SyntaxStateCache ──> pending TextDelta
//! ```
//!
//! Undo runs the inverse edit through the same pipeline. Mutations happen inside a write
//! section; when the outermost section closes, listeners receive one [`DocumentChange`].

use crate::delta::{TextDelta, TextDeltaEdit};
use crate::error::{BufferError, Result, check_range};
use crate::lexer::{Lexer, PlainLexer, Token};
use crate::line_ending::LineEnding;
use crate::line_index::{LineChange, LineIndex, LineRecord, Position};
use crate::marks::{Bias, MarkHandle, MarkTable};
use crate::options::DocumentOptions;
use crate::state::{DocumentChange, ListenerId, Listeners};
use crate::storage::GapBuffer;
use crate::syntax::SyntaxStateCache;
use crate::transaction::{EditTransaction, Removal};
use std::ops::Range;
use std::sync::Arc;

/// A document without syntax awareness.
pub type PlainDocument = Document<PlainLexer>;

#[derive(Debug)]
struct PendingChange {
    before_char_count: usize,
    edits: Vec<TextDeltaEdit>,
    first_line: usize,
}

/// An editable text document.
///
/// All offsets are character offsets into [`Document::text`].
///
/// # Example
///
/// ```rust
/// use editor_buffer::{Bias, PlainDocument, PlainLexer};
///
/// let mut doc = PlainDocument::new("ab\ncd\n", PlainLexer::new());
/// let caret = doc.create_mark(2, Bias::Forward).unwrap();
///
/// let mut tx = doc.insert(1, "X\n").unwrap();
/// assert_eq!(doc.text(), "aX\nb\ncd\n");
/// assert_eq!(doc.line_count(), 4);
/// assert_eq!(doc.mark_offset(caret).unwrap(), 4);
///
/// tx.undo(&mut doc).unwrap();
/// assert_eq!(doc.text(), "ab\ncd\n");
/// ```
#[derive(Debug)]
pub struct Document<L: Lexer> {
    /// Content followed by the implied final break.
    storage: GapBuffer,
    marks: MarkTable,
    lines: LineIndex<L::State>,
    syntax: SyntaxStateCache<L>,
    options: DocumentOptions,
    line_ending: LineEnding,
    version: u64,
    /// Identity of the current edit state. Every applied edit moves to a fresh revision; undo
    /// and redo move back and forth between the revisions a transaction recorded.
    revision: u64,
    last_revision: u64,
    write_depth: usize,
    pending: Option<PendingChange>,
    listeners: Listeners,
}

impl<L: Lexer> Document<L> {
    /// Create a document with default options.
    pub fn new(text: &str, lexer: L) -> Self {
        Self::with_options(text, lexer, DocumentOptions::default())
    }

    /// Create a document.
    pub fn with_options(text: &str, lexer: L, options: DocumentOptions) -> Self {
        let mut content = String::with_capacity(text.len() + 1);
        content.push_str(text);
        content.push('\n');

        let storage = GapBuffer::with_gap(&content, options.initial_gap, options.min_capacity);
        let lines = LineIndex::from_text(text);
        tracing::debug!(
            chars = storage.len() - 1,
            lines = lines.line_count(),
            "document created"
        );
        Self {
            storage,
            marks: MarkTable::new(),
            lines,
            syntax: SyntaxStateCache::new(lexer, options.max_stale_segments),
            options,
            line_ending: LineEnding::Lf,
            version: 0,
            revision: 0,
            last_revision: 0,
            write_depth: 0,
            pending: None,
            listeners: Listeners::new(),
        }
    }

    /// Create a document from file contents, normalizing line endings to LF.
    ///
    /// The detected ending is kept for [`Document::text_for_saving`].
    pub fn from_file_text(text: &str, lexer: L, options: DocumentOptions) -> Self {
        let line_ending = LineEnding::detect_in_text(text);
        let mut doc = Self::with_options(&LineEnding::normalize(text), lexer, options);
        doc.line_ending = line_ending;
        doc
    }

    /// Options the document was created with.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Line ending used when saving.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Change the line ending used when saving.
    pub fn set_line_ending(&mut self, line_ending: LineEnding) {
        self.line_ending = line_ending;
    }

    /// Text with the preferred line ending applied.
    pub fn text_for_saving(&self) -> String {
        self.line_ending.apply_to_text(&self.text())
    }

    /// The lexer driving the syntax cache.
    pub fn lexer(&self) -> &L {
        self.syntax.lexer()
    }

    /// Read-only view of the syntax cache bookkeeping.
    pub fn syntax_cache(&self) -> &SyntaxStateCache<L> {
        &self.syntax
    }

    /// Modification counter, bumped once per write section that changed the text.
    pub fn version(&self) -> u64 {
        self.version
    }

    // ----- reads -----

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.storage.len() - 1
    }

    /// Returns `true` if the document holds no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Character at `offset`.
    pub fn char_at(&self, offset: usize) -> Result<char> {
        check_range(offset, 1, self.len())?;
        self.storage.char_at(offset)
    }

    /// Copy of `[offset, offset + length)`.
    pub fn read(&self, offset: usize, length: usize) -> Result<String> {
        check_range(offset, length, self.len())?;
        self.storage.read(offset, length)
    }

    /// Copy `[offset, offset + length)` into a caller-supplied scratch buffer.
    pub fn read_into(&self, offset: usize, length: usize, scratch: &mut Vec<char>) -> Result<()> {
        check_range(offset, length, self.len())?;
        self.storage.read_into(offset, length, scratch)
    }

    /// The whole text.
    pub fn text(&self) -> String {
        self.storage.chars().take(self.len()).collect()
    }

    /// Remove the gap and return the content as one contiguous slice.
    pub fn compact(&mut self) -> &[char] {
        let len = self.len();
        &self.storage.compact()[..len]
    }

    // ----- lines -----

    /// Number of lines (`1 + number of '\n'`).
    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// Line containing `offset` (`offset == len()` is on the last line).
    pub fn line_of(&self, offset: usize) -> Result<usize> {
        check_range(offset, 0, self.len())?;
        Ok(self.lines.line_of(offset))
    }

    /// Start offset of `line`.
    pub fn line_start(&self, line: usize) -> Result<usize> {
        self.lines.line_start(line)
    }

    /// `[start, end)` of `line`, including its `'\n'` when present.
    pub fn line_range(&self, line: usize) -> Result<Range<usize>> {
        self.lines.line_range(line)
    }

    /// Text of `line` without its `'\n'`.
    pub fn line_text(&self, line: usize) -> Result<String> {
        let content = self.line_content_range(line)?;
        self.storage.read(content.start, content.len())
    }

    fn line_content_range(&self, line: usize) -> Result<Range<usize>> {
        let range = self.lines.line_range(line)?;
        if line + 1 < self.lines.line_count() {
            Ok(range.start..range.end - 1)
        } else {
            Ok(range)
        }
    }

    /// Line record of `line`; the state is `None` until it has been verified.
    pub fn line_record(&self, line: usize) -> Result<LineRecord<L::State>> {
        let mut record = self.lines.record(line)?;
        if line == 0 {
            record.state = Some(self.syntax.lexer().initial_state());
        } else if !self.syntax.is_valid(line) {
            record.state = None;
        }
        Ok(record)
    }

    /// Line/column of `offset`.
    pub fn offset_to_position(&self, offset: usize) -> Result<Position> {
        check_range(offset, 0, self.len())?;
        Ok(self.lines.offset_to_position(offset))
    }

    /// Offset of a line/column position; the column may point at the line's end but not past it.
    pub fn position_to_offset(&self, position: Position) -> Result<usize> {
        let content = self.line_content_range(position.line)?;
        check_range(content.start, position.column, content.end)?;
        Ok(content.start + position.column)
    }

    // ----- syntax -----

    /// Lexer state at the start of `line`, re-lexing lazily from the last verified line.
    pub fn syntax_state_at(&mut self, line: usize) -> Result<L::State> {
        if line == 0 {
            return Ok(self.syntax.lexer().initial_state());
        }
        self.syntax.ensure_valid(line, &mut self.lines, &self.storage)?;
        self.lines.state(line).cloned().ok_or_else(|| {
            BufferError::illegal(format!("line {line} has no state after repair"))
        })
    }

    /// Tokens of `line` in document offsets, clipped to the line.
    pub fn line_tokens(&mut self, line: usize) -> Result<Vec<Token<L::TokenKind>>> {
        self.syntax.ensure_valid(line, &mut self.lines, &self.storage)?;
        let clip = self.lines.line_range(line)?;
        self.syntax.line_tokens(line, clip, &self.lines, &self.storage)
    }

    // ----- marks -----

    /// Create a mark at `offset`.
    pub fn create_mark(&mut self, offset: usize, bias: Bias) -> Result<MarkHandle> {
        check_range(offset, 0, self.len())?;
        self.marks.create(offset, bias)
    }

    /// Dispose a mark; later calls with `handle` fail.
    pub fn dispose_mark(&mut self, handle: MarkHandle) -> Result<()> {
        self.marks.dispose(handle)
    }

    /// Current offset of a mark.
    pub fn mark_offset(&self, handle: MarkHandle) -> Result<usize> {
        self.marks.offset(handle)
    }

    /// Bias of a mark.
    pub fn mark_bias(&self, handle: MarkHandle) -> Result<Bias> {
        self.marks.bias(handle)
    }

    /// All live marks.
    pub fn marks(&self) -> &MarkTable {
        &self.marks
    }

    // ----- edits -----

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<EditTransaction<L::State>> {
        let chars: Vec<char> = text.chars().collect();
        self.atomic(|doc| doc.insert_raw(offset, &chars, &mut None))?;
        let revisions = self.next_revision(chars.is_empty());
        Ok(EditTransaction::inserted(offset, chars, revisions))
    }

    /// Remove `[offset, offset + length)`.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<EditTransaction<L::State>> {
        let (text, removal) = self.atomic(|doc| doc.remove_raw(offset, length, None))?;
        let revisions = self.next_revision(text.is_empty());
        Ok(EditTransaction::removed(offset, text, removal, revisions))
    }

    /// Move to a fresh revision after an edit; returns `(before, after)`.
    fn next_revision(&mut self, unchanged: bool) -> (u64, u64) {
        let before = self.revision;
        if !unchanged {
            self.last_revision += 1;
            self.revision = self.last_revision;
        }
        (before, self.revision)
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Insert `chars` at `offset`, restoring the records of an earlier removal if given.
    pub(crate) fn insert_raw(
        &mut self,
        offset: usize,
        chars: &[char],
        restore: &mut Option<Removal<L::State>>,
    ) -> Result<()> {
        check_range(offset, 0, self.len())?;
        if let Some(removal) = restore.as_ref()
            && !removal.fits(offset, chars)
        {
            return Err(BufferError::illegal(format!(
                "line records of the removed text do not match a re-insertion at {offset}"
            )));
        }
        if chars.is_empty() {
            return Ok(());
        }

        let before = self.len();
        let len = chars.len();
        self.storage.insert_chars(offset, chars)?;
        self.marks.update_for_insert(offset, len);

        let line = self.lines.line_of(offset);
        match restore.take() {
            Some(removal) => {
                let count = self.lines.restore(offset, len, removal.records)?;
                self.marks.restore(offset..offset + len, &removal.marks);
                self.syntax.on_edit(line, 0, count, &removal.syntax_runs);
            }
            None => {
                let inserted = match self.lines.on_insert(offset, chars) {
                    LineChange::Inserted { count, .. } => count,
                    _ => 0,
                };
                self.syntax.on_edit(line, 0, inserted, &[]);
            }
        }

        self.record_edit(
            TextDeltaEdit::insertion(offset, chars.iter().collect::<String>()),
            line,
            before,
        );
        Ok(())
    }

    /// Remove `[offset, offset + length)`, optionally checking that it holds `expected`.
    pub(crate) fn remove_raw(
        &mut self,
        offset: usize,
        length: usize,
        expected: Option<&[char]>,
    ) -> Result<(Vec<char>, Removal<L::State>)> {
        check_range(offset, length, self.len())?;
        let mut text = Vec::with_capacity(length);
        self.storage.read_into(offset, length, &mut text)?;
        if let Some(expected) = expected
            && expected != text.as_slice()
        {
            return Err(BufferError::illegal(format!(
                "text at {offset} no longer matches the edit being reverted"
            )));
        }
        if length == 0 {
            return Ok((
                text,
                Removal {
                    records: Vec::new(),
                    syntax_runs: Vec::new(),
                    marks: Vec::new(),
                },
            ));
        }

        let before = self.len();
        self.storage.remove(offset, length)?;
        let marks = self.marks.update_for_remove(offset, length);

        let line = self.lines.line_of(offset);
        let records = match self.lines.on_remove(offset, length) {
            LineChange::Removed { records, .. } => records,
            _ => Vec::new(),
        };
        let syntax_runs = self.syntax.on_edit(line, records.len(), 0, &[]);

        self.record_edit(
            TextDeltaEdit::removal(offset, text.iter().collect::<String>()),
            line,
            before,
        );
        Ok((
            text,
            Removal {
                records,
                syntax_runs,
                marks,
            },
        ))
    }

    fn record_edit(&mut self, edit: TextDeltaEdit, line: usize, before: usize) {
        let pending = self.pending.get_or_insert_with(|| PendingChange {
            before_char_count: before,
            edits: Vec::new(),
            first_line: line,
        });
        pending.first_line = pending.first_line.min(line);
        pending.edits.push(edit);
    }

    // ----- write section -----

    /// Enter a write section. Sections nest; only the outermost exit notifies listeners.
    pub fn begin_write(&mut self) {
        self.write_depth += 1;
    }

    /// Leave a write section.
    pub fn end_write(&mut self) -> Result<()> {
        if self.write_depth == 0 {
            return Err(BufferError::illegal(
                "end_write without a matching begin_write",
            ));
        }
        self.write_depth -= 1;
        if self.write_depth == 0 {
            self.flush_changes();
        }
        Ok(())
    }

    /// Returns `true` while a write section is open.
    pub fn is_writing(&self) -> bool {
        self.write_depth > 0
    }

    /// Run `f` inside one write section.
    ///
    /// The section is closed even if `f` fails; edits made before the failure stay applied and
    /// are reported.
    pub fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.begin_write();
        let result = f(self);
        self.end_write()?;
        result
    }

    fn flush_changes(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.edits.is_empty() {
            return;
        }
        let old_version = self.version;
        self.version += 1;
        let change = DocumentChange {
            old_version,
            new_version: self.version,
            delta: Arc::new(TextDelta {
                before_char_count: pending.before_char_count,
                after_char_count: self.len(),
                edits: pending.edits,
            }),
            first_line: pending.first_line,
        };
        tracing::debug!(
            version = self.version,
            edits = change.delta.edits.len(),
            first_line = change.first_line,
            listeners = self.listeners.len(),
            "document changed"
        );
        self.listeners.notify(&change);
    }

    /// Register a change listener.
    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: FnMut(&DocumentChange) + Send + 'static,
    {
        self.listeners.subscribe(Box::new(callback))
    }

    /// Unregister a change listener; returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}
