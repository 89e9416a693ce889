//! Logical line index.
//!
//! One record per line, keyed by start offset: a line begins at offset 0 and immediately after
//! every `'\n'`. Each record also carries the lexer state cached for the start of that line.
//!
//! Start offsets are not rewritten eagerly on every edit. Like the gap in [`GapBuffer`], the
//! index keeps one pending shift: records at or after `shift_from` store `start - shift`. Moving
//! the boundary only touches the records between the old and the new edit line, so typing in one
//! place costs O(1) amortized while lookups stay O(log n).
//!
//! [`GapBuffer`]: crate::storage::GapBuffer

use crate::error::{BufferError, Result};
use std::ops::Range;

/// A logical position: zero-based line and column, both counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line index.
    pub line: usize,
    /// Column within the line.
    pub column: usize,
}

impl Position {
    /// Create a position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A materialized line record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord<S> {
    /// Offset of the first character of the line.
    pub start: usize,
    /// Lexer state at `start`, `None` when not computed.
    pub state: Option<S>,
    /// Characters before `start` the lexer must re-read to resume from `state`.
    pub pre_scan: usize,
}

/// Structural effect of an edit on the line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange<S> {
    /// No line boundary was created or removed; later lines were only shifted.
    NoStructuralChange,
    /// `count` records were created starting at index `first`.
    Inserted {
        /// Index of the first new record.
        first: usize,
        /// Number of new records.
        count: usize,
    },
    /// Records starting at index `first` were spliced out, verbatim and with their cached state.
    Removed {
        /// Index the records occupied.
        first: usize,
        /// The removed records, in order, with their pre-removal start offsets.
        records: Vec<LineRecord<S>>,
    },
}

impl<S> LineChange<S> {
    /// Returns `true` if line boundaries changed.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::NoStructuralChange)
    }

    /// Net change in line count.
    pub fn line_delta(&self) -> isize {
        match self {
            Self::NoStructuralChange => 0,
            Self::Inserted { count, .. } => *count as isize,
            Self::Removed { records, .. } => -(records.len() as isize),
        }
    }
}

#[derive(Debug, Clone)]
struct LineSlot<S> {
    raw_start: isize,
    state: Option<S>,
    pre_scan: usize,
}

impl<S> LineSlot<S> {
    fn fresh(raw_start: isize) -> Self {
        Self {
            raw_start,
            state: None,
            pre_scan: 0,
        }
    }
}

/// Ordered line records for one document.
#[derive(Debug, Clone)]
pub struct LineIndex<S> {
    lines: Vec<LineSlot<S>>,
    /// Records at `index >= shift_from` store `start - shift`.
    shift_from: usize,
    shift: isize,
    /// Number of characters covered by the index.
    len: usize,
}

impl<S> LineIndex<S> {
    /// Index for an empty document: one line at offset 0.
    pub fn new() -> Self {
        Self {
            lines: vec![LineSlot::fresh(0)],
            shift_from: 1,
            shift: 0,
            len: 0,
        }
    }

    /// Build the index for `text`.
    pub fn from_text(text: &str) -> Self {
        let mut index = Self::new();
        let mut len = 0usize;
        for ch in text.chars() {
            len += 1;
            if ch == '\n' {
                index.lines.push(LineSlot::fresh(len as isize));
            }
        }
        index.len = len;
        index.shift_from = index.lines.len();
        index
    }

    /// Number of lines (`1 + number of '\n'`).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of characters covered by the index.
    pub fn char_count(&self) -> usize {
        self.len
    }

    fn start_at(&self, line: usize) -> usize {
        let raw = self.lines[line].raw_start;
        if line >= self.shift_from {
            (raw + self.shift) as usize
        } else {
            raw as usize
        }
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line < self.lines.len() {
            Ok(())
        } else {
            Err(BufferError::InvalidLine {
                line,
                line_count: self.lines.len(),
            })
        }
    }

    /// Start offset of `line`.
    pub fn line_start(&self, line: usize) -> Result<usize> {
        self.check_line(line)?;
        Ok(self.start_at(line))
    }

    /// End offset of `line` (start of the next line, or the end of the text).
    pub fn line_end(&self, line: usize) -> Result<usize> {
        self.check_line(line)?;
        if line + 1 < self.lines.len() {
            Ok(self.start_at(line + 1))
        } else {
            Ok(self.len)
        }
    }

    /// `[start, end)` of `line`, including its `'\n'` when present.
    pub fn line_range(&self, line: usize) -> Result<Range<usize>> {
        Ok(self.line_start(line)?..self.line_end(line)?)
    }

    /// Line containing `offset` (binary search over start offsets).
    ///
    /// Offsets past the end resolve to the last line.
    pub fn line_of(&self, offset: usize) -> usize {
        // Greatest index whose start <= offset; line 0 always starts at 0.
        let mut lo = 0usize;
        let mut hi = self.lines.len();
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.start_at(mid) <= offset {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Line and column of `offset`.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let line = self.line_of(offset);
        Position::new(line, offset - self.start_at(line))
    }

    /// Materialize the record of `line`.
    pub fn record(&self, line: usize) -> Result<LineRecord<S>>
    where
        S: Clone,
    {
        self.check_line(line)?;
        let slot = &self.lines[line];
        Ok(LineRecord {
            start: self.start_at(line),
            state: slot.state.clone(),
            pre_scan: slot.pre_scan,
        })
    }

    /// All start offsets, in order.
    pub fn line_starts(&self) -> Vec<usize> {
        (0..self.lines.len()).map(|line| self.start_at(line)).collect()
    }

    pub(crate) fn state(&self, line: usize) -> Option<&S> {
        self.lines.get(line).and_then(|slot| slot.state.as_ref())
    }

    pub(crate) fn pre_scan(&self, line: usize) -> usize {
        self.lines.get(line).map_or(0, |slot| slot.pre_scan)
    }

    pub(crate) fn set_state(&mut self, line: usize, state: Option<S>, pre_scan: usize) {
        if let Some(slot) = self.lines.get_mut(line) {
            slot.state = state;
            slot.pre_scan = pre_scan;
        }
    }

    fn move_shift_boundary(&mut self, index: usize) {
        let index = index.min(self.lines.len());
        if self.shift != 0 {
            if index < self.shift_from {
                let end = self.shift_from.min(self.lines.len());
                for slot in &mut self.lines[index..end] {
                    slot.raw_start -= self.shift;
                }
            } else {
                for slot in &mut self.lines[self.shift_from..index] {
                    slot.raw_start += self.shift;
                }
            }
        }
        self.shift_from = index;
    }

    fn normalize_shift(&mut self) {
        if self.shift_from >= self.lines.len() {
            self.shift_from = self.lines.len();
            self.shift = 0;
        }
    }

    /// Update for `chars` inserted at `offset`.
    ///
    /// Every `'\n'` in the inserted text starts a new record right after it; the line holding
    /// `offset` keeps its start, so text ending in `'\n'` at a line start never duplicates it.
    pub fn on_insert(&mut self, offset: usize, chars: &[char]) -> LineChange<S> {
        if chars.is_empty() {
            return LineChange::NoStructuralChange;
        }
        let line = self.line_of(offset);
        self.move_shift_boundary(line + 1);
        self.shift += chars.len() as isize;
        self.len += chars.len();

        let shift = self.shift;
        let new_slots: Vec<LineSlot<S>> = chars
            .iter()
            .enumerate()
            .filter(|(_, ch)| **ch == '\n')
            .map(|(i, _)| LineSlot::fresh((offset + i + 1) as isize - shift))
            .collect();
        let count = new_slots.len();
        self.lines.splice(line + 1..line + 1, new_slots);
        self.normalize_shift();

        if count == 0 {
            return LineChange::NoStructuralChange;
        }
        tracing::debug!(offset, first = line + 1, count, "line records inserted");
        LineChange::Inserted {
            first: line + 1,
            count,
        }
    }

    /// Update for `[offset, offset + length)` removed.
    ///
    /// A record is removed iff its start lies in `(offset, offset + length]`, i.e. the `'\n'`
    /// that created it was inside the removed range.
    pub fn on_remove(&mut self, offset: usize, length: usize) -> LineChange<S> {
        if length == 0 {
            return LineChange::NoStructuralChange;
        }
        let line = self.line_of(offset);
        let last = self.line_of(offset + length);
        self.move_shift_boundary(line + 1);

        let shift = self.shift;
        let records: Vec<LineRecord<S>> = self
            .lines
            .drain(line + 1..last + 1)
            .map(|slot| LineRecord {
                start: (slot.raw_start + shift) as usize,
                state: slot.state,
                pre_scan: slot.pre_scan,
            })
            .collect();
        self.shift -= length as isize;
        self.len -= length;
        self.normalize_shift();

        if records.is_empty() {
            return LineChange::NoStructuralChange;
        }
        tracing::debug!(offset, first = line + 1, count = records.len(), "line records removed");
        LineChange::Removed {
            first: line + 1,
            records,
        }
    }

    /// Re-insert records verbatim after `length` characters were restored at `offset`.
    ///
    /// This is the inverse of [`LineIndex::on_remove`]: no text is scanned and cached states
    /// survive.
    pub fn restore(&mut self, offset: usize, length: usize, records: Vec<LineRecord<S>>) -> Result<usize> {
        let line = self.line_of(offset);
        if let Some(first) = records.first()
            && (first.start <= offset || first.start > offset + length)
        {
            return Err(BufferError::illegal(format!(
                "restored line start {} outside ({}, {}]",
                first.start,
                offset,
                offset + length
            )));
        }

        self.move_shift_boundary(line + 1);
        self.shift += length as isize;
        self.len += length;

        let shift = self.shift;
        let count = records.len();
        self.lines.splice(
            line + 1..line + 1,
            records.into_iter().map(|record| LineSlot {
                raw_start: record.start as isize - shift,
                state: record.state,
                pre_scan: record.pre_scan,
            }),
        );
        self.normalize_shift();
        Ok(count)
    }
}

impl<S> Default for LineIndex<S> {
    fn default() -> Self {
        Self::new()
    }
}
