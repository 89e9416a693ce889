//! Linear undo/redo history.
//!
//! [`UndoHistory`] stacks applied [`EditTransaction`]s into groups. A group is undone and redone
//! as a whole inside one write section, so listeners see a single notification per step of the
//! history. Consecutive typing can be coalesced into one group with
//! [`UndoHistory::push_coalescing`].

use crate::document::Document;
use crate::error::{BufferError, Result};
use crate::lexer::Lexer;
use crate::options::DocumentOptions;
use crate::transaction::{EditTransaction, TransactionStatus};

#[derive(Debug)]
struct UndoStep<S> {
    group_id: usize,
    tx: EditTransaction<S>,
}

/// Undo and redo stacks for one document.
#[derive(Debug)]
pub struct UndoHistory<S> {
    undo_stack: Vec<UndoStep<S>>,
    redo_stack: Vec<UndoStep<S>>,
    max_undo: usize,
    /// Clean point as an `undo_stack.len()`; may point into the redo area.
    clean_index: Option<usize>,
    next_group_id: usize,
    open_group_id: Option<usize>,
}

impl<S: Clone> UndoHistory<S> {
    /// Create a history keeping at most `max_undo` steps.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
            clean_index: Some(0),
            next_group_id: 0,
            open_group_id: None,
        }
    }

    /// Create a history with the depth cap from `options`.
    pub fn for_options(options: &DocumentOptions) -> Self {
        Self::new(options.undo_limit)
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable steps.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redoable steps.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Group new coalescing pushes would join, if any.
    pub fn current_group(&self) -> Option<usize> {
        self.open_group_id
    }

    /// Returns `true` at the clean point (e.g. right after saving).
    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    /// Make the current position the clean point and close the open group.
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
        self.end_group();
    }

    /// Close the open group; the next push starts a new one.
    pub fn end_group(&mut self) {
        self.open_group_id = None;
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.clean_index = None;
        self.open_group_id = None;
    }

    /// Push an applied transaction as its own group. Returns the group id.
    pub fn push(&mut self, tx: EditTransaction<S>) -> Result<usize> {
        self.push_step(tx, false)
    }

    /// Push an applied transaction, joining the open group when it continues the previous step.
    pub fn push_coalescing(&mut self, tx: EditTransaction<S>) -> Result<usize> {
        self.push_step(tx, true)
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }
        // A clean point in the redo area becomes unreachable.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }
        self.redo_stack.clear();
    }

    fn push_step(&mut self, tx: EditTransaction<S>, coalescing: bool) -> Result<usize> {
        if tx.status() != TransactionStatus::Applied {
            return Err(BufferError::illegal(
                "only applied transactions can enter the undo history",
            ));
        }
        self.clear_redo_and_adjust_clean();

        if self.undo_stack.len() >= self.max_undo && !self.undo_stack.is_empty() {
            self.undo_stack.remove(0);
            self.clean_index = match self.clean_index {
                Some(0) | None => None,
                Some(clean_index) => Some(clean_index - 1),
            };
        }

        let joins_open_group = coalescing
            && self.clean_index != Some(self.undo_stack.len())
            && match (self.open_group_id, self.undo_stack.last()) {
                (Some(open), Some(last)) => last.group_id == open && tx.continues(&last.tx),
                _ => false,
            };

        let group_id = match self.open_group_id {
            Some(open) if joins_open_group => open,
            _ => {
                let id = self.next_group_id;
                self.next_group_id = self.next_group_id.wrapping_add(1);
                id
            }
        };
        self.open_group_id = coalescing.then_some(group_id);

        if self.max_undo > 0 {
            self.undo_stack.push(UndoStep { group_id, tx });
        }
        Ok(group_id)
    }

    fn pop_group(stack: &mut Vec<UndoStep<S>>) -> Vec<UndoStep<S>> {
        let Some(group_id) = stack.last().map(|step| step.group_id) else {
            return Vec::new();
        };
        let mut steps = Vec::new();
        while stack.last().is_some_and(|step| step.group_id == group_id) {
            if let Some(step) = stack.pop() {
                steps.push(step);
            }
        }
        steps
    }

    /// Undo the newest group. Returns `Ok(false)` if there was nothing to undo.
    pub fn undo<L>(&mut self, doc: &mut Document<L>) -> Result<bool>
    where
        L: Lexer<State = S>,
    {
        self.end_group();
        let mut steps = Self::pop_group(&mut self.undo_stack);
        if steps.is_empty() {
            return Ok(false);
        }
        tracing::debug!(steps = steps.len(), "undo group");

        // Newest first.
        let result = doc.atomic(|doc| steps.iter_mut().try_for_each(|step| step.tx.undo(doc)));
        self.settle(steps, true);
        result.map(|()| true)
    }

    /// Redo the newest undone group. Returns `Ok(false)` if there was nothing to redo.
    pub fn redo<L>(&mut self, doc: &mut Document<L>) -> Result<bool>
    where
        L: Lexer<State = S>,
    {
        self.end_group();
        let mut steps = Self::pop_group(&mut self.redo_stack);
        if steps.is_empty() {
            return Ok(false);
        }
        tracing::debug!(steps = steps.len(), "redo group");

        // Oldest first.
        let result = doc.atomic(|doc| steps.iter_mut().try_for_each(|step| step.tx.redo(doc)));
        self.settle(steps, false);
        result.map(|()| true)
    }

    /// Put walked steps back on the stacks matching their state.
    ///
    /// An undo walks newest to oldest and a redo oldest to newest; a failure part-way leaves a
    /// prefix of the walk moved and the rest untouched.
    fn settle(&mut self, steps: Vec<UndoStep<S>>, after_undo: bool) {
        let (undone, applied): (Vec<_>, Vec<_>) = steps
            .into_iter()
            .partition(|step| step.tx.status() == TransactionStatus::Undone);
        if after_undo {
            self.redo_stack.extend(undone);
            self.undo_stack.extend(applied.into_iter().rev());
        } else {
            self.undo_stack.extend(applied);
            self.redo_stack.extend(undone.into_iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlainDocument, PlainLexer};

    fn setup() -> (PlainDocument, UndoHistory<()>) {
        (
            PlainDocument::new("", PlainLexer::new()),
            UndoHistory::new(100),
        )
    }

    #[test]
    fn test_coalesced_typing_undoes_as_one_group() {
        let (mut doc, mut history) = setup();
        for (i, ch) in ["a", "b", "c"].iter().enumerate() {
            let tx = doc.insert(i, ch).unwrap();
            history.push_coalescing(tx).unwrap();
        }
        assert_eq!(history.undo_depth(), 3);

        assert!(history.undo(&mut doc).unwrap());
        assert_eq!(doc.text(), "");
        assert_eq!(history.redo_depth(), 3);

        assert!(history.redo(&mut doc).unwrap());
        assert_eq!(doc.text(), "abc");
        assert!(!history.redo(&mut doc).unwrap());
    }

    #[test]
    fn test_non_adjacent_insert_starts_new_group() {
        let (mut doc, mut history) = setup();
        let a = history.push_coalescing(doc.insert(0, "ab").unwrap()).unwrap();
        let b = history.push_coalescing(doc.insert(0, "x").unwrap()).unwrap();
        assert_ne!(a, b);

        history.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "ab");
    }

    #[test]
    fn test_clean_point() {
        let (mut doc, mut history) = setup();
        history.push(doc.insert(0, "a").unwrap()).unwrap();
        history.mark_clean();
        assert!(history.is_clean());

        history.push(doc.insert(1, "b").unwrap()).unwrap();
        assert!(!history.is_clean());
        history.undo(&mut doc).unwrap();
        assert!(history.is_clean());

        // Leaving the clean point behind in the redo area makes it unreachable.
        history.undo(&mut doc).unwrap();
        history.push(doc.insert(0, "z").unwrap()).unwrap();
        assert!(!history.is_clean());
    }

    #[test]
    fn test_undo_limit_drops_oldest() {
        let mut doc = PlainDocument::new("", PlainLexer::new());
        let mut history = UndoHistory::new(2);
        for i in 0..3 {
            history.push(doc.insert(i, "x").unwrap()).unwrap();
        }
        assert_eq!(history.undo_depth(), 2);
        history.undo(&mut doc).unwrap();
        history.undo(&mut doc).unwrap();
        assert!(!history.undo(&mut doc).unwrap());
        assert_eq!(doc.text(), "x");
    }

    #[test]
    fn test_push_rejects_undone_transaction() {
        let (mut doc, mut history) = setup();
        let mut tx = doc.insert(0, "a").unwrap();
        tx.undo(&mut doc).unwrap();
        assert!(history.push(tx).is_err());
    }

    #[test]
    fn test_group_notifies_once() {
        let (mut doc, mut history) = setup();
        history.push_coalescing(doc.insert(0, "a").unwrap()).unwrap();
        history.push_coalescing(doc.insert(1, "b").unwrap()).unwrap();

        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let sink = std::sync::Arc::clone(&count);
        doc.subscribe(move |_| {
            sink.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        history.undo(&mut doc).unwrap();
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
