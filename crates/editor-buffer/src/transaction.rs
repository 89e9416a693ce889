//! Reversible edits.
//!
//! Every [`Document::insert`] and [`Document::remove`] hands back an [`EditTransaction`] in the
//! `Applied` state. Undoing it performs the inverse edit through the same pipeline (buffer,
//! marks, line index, syntax cache). The inverse of a removal does not re-scan the text: the
//! removed line records, their cached syntax states and the displaced marks travel with the
//! transaction and are put back verbatim.

use crate::document::Document;
use crate::error::{BufferError, Result};
use crate::lexer::Lexer;
use crate::line_index::LineRecord;
use crate::marks::DisplacedMark;
use std::ops::Range;

/// Direction of an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Text was inserted.
    Insert,
    /// Text was removed.
    Remove,
}

/// State of an [`EditTransaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// The edit is in effect.
    Applied,
    /// The edit has been reverted.
    Undone,
}

/// Everything a removal took out of the document besides its text.
#[derive(Debug, Clone)]
pub(crate) struct Removal<S> {
    /// Removed line records, with their start offsets before the removal.
    pub(crate) records: Vec<LineRecord<S>>,
    /// Runs of `records` whose syntax states are mutually consistent.
    pub(crate) syntax_runs: Vec<Range<usize>>,
    /// Marks that sat in the removed range (or at its end).
    pub(crate) marks: Vec<DisplacedMark>,
}

impl<S> Removal<S> {
    /// Check that the records match `text` re-inserted at `offset`.
    pub(crate) fn fits(&self, offset: usize, text: &[char]) -> bool {
        let mut starts = text
            .iter()
            .enumerate()
            .filter(|(_, ch)| **ch == '\n')
            .map(|(i, _)| offset + i + 1);
        self.records
            .iter()
            .all(|record| starts.next() == Some(record.start))
            && starts.next().is_none()
    }
}

/// One undoable edit.
#[derive(Debug)]
pub struct EditTransaction<S> {
    kind: EditKind,
    offset: usize,
    text: Vec<char>,
    status: TransactionStatus,
    /// Document revisions without and with the edit in effect.
    revisions: (u64, u64),
    /// Captured by the most recent removal of `text`.
    removal: Option<Removal<S>>,
}

impl<S: Clone> EditTransaction<S> {
    pub(crate) fn inserted(offset: usize, text: Vec<char>, revisions: (u64, u64)) -> Self {
        Self {
            kind: EditKind::Insert,
            offset,
            text,
            status: TransactionStatus::Applied,
            revisions,
            removal: None,
        }
    }

    pub(crate) fn removed(
        offset: usize,
        text: Vec<char>,
        removal: Removal<S>,
        revisions: (u64, u64),
    ) -> Self {
        Self {
            kind: EditKind::Remove,
            offset,
            text,
            status: TransactionStatus::Applied,
            revisions,
            removal: Some(removal),
        }
    }

    /// Insert or remove.
    pub fn kind(&self) -> EditKind {
        self.kind
    }

    /// Offset the edit applies at.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of characters inserted or removed.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` for an edit of zero characters.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Signed length: positive for insertions, negative for removals.
    pub fn signed_len(&self) -> isize {
        match self.kind {
            EditKind::Insert => self.text.len() as isize,
            EditKind::Remove => -(self.text.len() as isize),
        }
    }

    /// The inserted or removed text.
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    /// Current state.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Returns `true` if the edit is in effect.
    pub fn is_applied(&self) -> bool {
        self.status == TransactionStatus::Applied
    }

    /// Returns `true` if `self` directly continues `previous` (typing or deleting a run).
    pub fn continues(&self, previous: &Self) -> bool {
        match (previous.kind, self.kind) {
            (EditKind::Insert, EditKind::Insert) => self.offset == previous.offset + previous.len(),
            (EditKind::Remove, EditKind::Remove) => {
                self.offset + self.len() == previous.offset || self.offset == previous.offset
            }
            _ => false,
        }
    }

    /// Revert the edit.
    ///
    /// Fails with [`BufferError::IllegalState`] if the transaction is not applied, or if the
    /// document no longer is in the state the edit left it in (a newer edit is still in effect).
    pub fn undo<L>(&mut self, doc: &mut Document<L>) -> Result<()>
    where
        L: Lexer<State = S>,
    {
        if self.status != TransactionStatus::Applied {
            return Err(BufferError::illegal("undo of a transaction that is not applied"));
        }
        self.check_revision(doc, self.revisions.1)?;
        self.reverse(doc, EditKind::Insert)?;
        self.move_to_revision(doc, self.revisions.0);
        self.status = TransactionStatus::Undone;
        tracing::debug!(kind = ?self.kind, offset = self.offset, len = self.text.len(), "edit undone");
        Ok(())
    }

    /// Re-apply an undone edit.
    ///
    /// Only valid in the state the undo left behind; see [`EditTransaction::undo`].
    pub fn redo<L>(&mut self, doc: &mut Document<L>) -> Result<()>
    where
        L: Lexer<State = S>,
    {
        if self.status != TransactionStatus::Undone {
            return Err(BufferError::illegal("redo of a transaction that is not undone"));
        }
        self.check_revision(doc, self.revisions.0)?;
        self.reverse(doc, EditKind::Remove)?;
        self.move_to_revision(doc, self.revisions.1);
        self.status = TransactionStatus::Applied;
        tracing::debug!(kind = ?self.kind, offset = self.offset, len = self.text.len(), "edit redone");
        Ok(())
    }

    /// An empty edit changes nothing and is valid in any state.
    fn check_revision<L: Lexer>(&self, doc: &Document<L>, expected: u64) -> Result<()> {
        if self.text.is_empty() || doc.revision() == expected {
            return Ok(());
        }
        Err(BufferError::illegal(format!(
            "document is at revision {}, the edit at {} expects {expected}",
            doc.revision(),
            self.offset
        )))
    }

    fn move_to_revision<L: Lexer>(&self, doc: &mut Document<L>, revision: u64) {
        if !self.text.is_empty() {
            doc.set_revision(revision);
        }
    }

    /// Remove the text if the edit currently in effect is `removing_kind`, otherwise put it back.
    fn reverse<L>(&mut self, doc: &mut Document<L>, removing_kind: EditKind) -> Result<()>
    where
        L: Lexer<State = S>,
    {
        doc.atomic(|doc| {
            if self.kind == removing_kind {
                let (_, removal) = doc.remove_raw(self.offset, self.text.len(), Some(&self.text))?;
                self.removal = Some(removal);
            } else {
                doc.insert_raw(self.offset, &self.text, &mut self.removal)?;
            }
            Ok(())
        })
    }
}
