//! Structured text change deltas.
//!
//! Listeners of a [`Document`](crate::Document) receive the edits of one write section as a
//! [`TextDelta`], so incremental consumers (views, indexers, language servers) can follow along
//! without diffing old and new text. Everything is expressed in character offsets.

/// A single text edit expressed in character offsets.
///
/// `start` is an offset in the document at the time this edit is applied; edits inside a
/// [`TextDelta`] must be applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDeltaEdit {
    /// Start character offset of the edit.
    pub start: usize,
    /// Exact deleted text (may be empty).
    pub deleted_text: String,
    /// Exact inserted text (may be empty).
    pub inserted_text: String,
}

impl TextDeltaEdit {
    /// An insertion of `text` at `start`.
    pub fn insertion(start: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            deleted_text: String::new(),
            inserted_text: text.into(),
        }
    }

    /// A removal of `text` starting at `start`.
    pub fn removal(start: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            deleted_text: text.into(),
            inserted_text: String::new(),
        }
    }

    /// Length of `deleted_text` in characters.
    pub fn deleted_len(&self) -> usize {
        self.deleted_text.chars().count()
    }

    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }

    /// Exclusive end character offset in the pre-edit document.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.deleted_len())
    }
}

/// All edits made during one write section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDelta {
    /// Character count before applying `edits`.
    pub before_char_count: usize,
    /// Character count after applying `edits`.
    pub after_char_count: usize,
    /// Ordered edits transforming the "before" document into the "after" document.
    pub edits: Vec<TextDeltaEdit>,
}

impl TextDelta {
    /// Returns `true` if this delta contains no edits.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Replay the edits on a copy of the "before" text.
    ///
    /// Returns `None` if an edit does not fit the text it is applied to.
    pub fn apply_to(&self, before: &str) -> Option<String> {
        let mut chars: Vec<char> = before.chars().collect();
        for edit in &self.edits {
            let end = edit.end();
            if end > chars.len() {
                return None;
            }
            let deleted: String = chars[edit.start..end].iter().collect();
            if deleted != edit.deleted_text {
                return None;
            }
            chars.splice(edit.start..end, edit.inserted_text.chars());
        }
        Some(chars.into_iter().collect())
    }
}
