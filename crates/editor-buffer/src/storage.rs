//! Gap-buffer character storage.
//!
//! A single contiguous `char` array with one run of unused capacity (the gap). Logical index `i`
//! maps to raw index `i` before the gap and `i + gap_len` after it. Edits first relocate the gap to
//! the edit point, so repeated edits near the same offset are amortized O(1).
//!
//! Reads that straddle the gap go through an explicit copy into caller-owned scratch space; the
//! raw array is never handed out across the gap.

use crate::error::{BufferError, Result, check_range};

/// Default number of spare slots reserved when a buffer is created.
pub const DEFAULT_INITIAL_GAP: usize = 64;

/// Default floor of the growth formula.
pub const DEFAULT_MIN_CAPACITY: usize = 10;

const GAP_FILL: char = '\0';

/// Gap buffer over Unicode scalar values.
#[derive(Debug, Clone)]
pub struct GapBuffer {
    /// `[pre-gap content | gap | post-gap content]`
    data: Vec<char>,
    gap_start: usize,
    gap_len: usize,
    min_capacity: usize,
}

impl GapBuffer {
    /// Create an empty buffer with the default gap.
    pub fn new() -> Self {
        Self::with_gap("", DEFAULT_INITIAL_GAP, DEFAULT_MIN_CAPACITY)
    }

    /// Create a buffer holding `text`, with the gap after it.
    pub fn from_text(text: &str) -> Self {
        Self::with_gap(text, DEFAULT_INITIAL_GAP, DEFAULT_MIN_CAPACITY)
    }

    /// Create a buffer holding `text` with `initial_gap` spare slots.
    ///
    /// `min_capacity` is the floor used whenever the array has to grow.
    pub fn with_gap(text: &str, initial_gap: usize, min_capacity: usize) -> Self {
        let mut data: Vec<char> = text.chars().collect();
        let len = data.len();
        data.resize(len + initial_gap, GAP_FILL);
        Self {
            data,
            gap_start: len,
            gap_len: initial_gap,
            min_capacity,
        }
    }

    /// Logical length (excluding the gap).
    pub fn len(&self) -> usize {
        self.data.len() - self.gap_len
    }

    /// Returns `true` if the buffer holds no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the raw array (content + gap).
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Logical offset where the gap currently sits.
    pub fn gap_start(&self) -> usize {
        self.gap_start
    }

    /// Current gap size.
    pub fn gap_len(&self) -> usize {
        self.gap_len
    }

    fn gap_end(&self) -> usize {
        self.gap_start + self.gap_len
    }

    fn raw_index(&self, index: usize) -> usize {
        if index < self.gap_start {
            index
        } else {
            index + self.gap_len
        }
    }

    /// Move the gap so that it starts at logical `offset`.
    ///
    /// Only the span between the old and the new gap position is copied.
    fn move_gap_to(&mut self, offset: usize) {
        if offset < self.gap_start {
            let shift = self.gap_start - offset;
            let gap_end = self.gap_end();
            self.data
                .copy_within(offset..self.gap_start, gap_end - shift);
            self.gap_start = offset;
        } else if offset > self.gap_start {
            let shift = offset - self.gap_start;
            let gap_end = self.gap_end();
            self.data
                .copy_within(gap_end..gap_end + shift, self.gap_start);
            self.gap_start = offset;
        }
    }

    /// Grow the array so the gap holds at least `required` slots, keeping the gap in place.
    fn ensure_gap(&mut self, required: usize) {
        if self.gap_len >= required {
            return;
        }

        let old_capacity = self.data.len();
        let extra = required - self.gap_len;
        let new_capacity = self
            .min_capacity
            .max(old_capacity + old_capacity / 2 + extra);
        let growth = new_capacity - old_capacity;

        let old_gap_end = self.gap_end();
        let post_gap_len = old_capacity - old_gap_end;
        self.data.resize(new_capacity, GAP_FILL);
        if post_gap_len > 0 {
            self.data
                .copy_within(old_gap_end..old_capacity, new_capacity - post_gap_len);
        }
        self.gap_len += growth;

        tracing::debug!(
            old_capacity,
            new_capacity,
            gap_start = self.gap_start,
            "gap buffer grown"
        );
    }

    /// Insert `text` at `offset`, returning the number of characters inserted.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<usize> {
        let chars: Vec<char> = text.chars().collect();
        self.insert_chars(offset, &chars)?;
        Ok(chars.len())
    }

    /// Insert raw characters at `offset`.
    pub fn insert_chars(&mut self, offset: usize, chars: &[char]) -> Result<()> {
        check_range(offset, 0, self.len())?;
        if chars.is_empty() {
            return Ok(());
        }

        self.move_gap_to(offset);
        self.ensure_gap(chars.len());
        self.data[self.gap_start..self.gap_start + chars.len()].copy_from_slice(chars);
        self.gap_start += chars.len();
        self.gap_len -= chars.len();
        Ok(())
    }

    /// Remove `length` characters starting at `offset`.
    ///
    /// The gap is only relocated when the range is not already adjacent to it.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<()> {
        check_range(offset, length, self.len())?;
        if length == 0 {
            return Ok(());
        }

        if offset + length == self.gap_start {
            // Range ends where the gap begins: grow the gap backwards.
            self.gap_start = offset;
        } else if offset != self.gap_start {
            self.move_gap_to(offset);
        }
        self.gap_len += length;
        Ok(())
    }

    /// Character at logical `index`.
    pub fn char_at(&self, index: usize) -> Result<char> {
        if index >= self.len() {
            return Err(BufferError::InvalidOffset {
                offset: index,
                length: 1,
                limit: self.len(),
            });
        }
        Ok(self.data[self.raw_index(index)])
    }

    /// Borrow `[offset, offset + length)` directly if it does not straddle the gap.
    ///
    /// Returns `Ok(None)` when the range crosses the gap; use [`GapBuffer::read_into`] then.
    pub fn contiguous(&self, offset: usize, length: usize) -> Result<Option<&[char]>> {
        check_range(offset, length, self.len())?;
        let end = offset + length;
        if end <= self.gap_start {
            Ok(Some(&self.data[offset..end]))
        } else if offset >= self.gap_start {
            let raw = offset + self.gap_len;
            Ok(Some(&self.data[raw..raw + length]))
        } else {
            Ok(None)
        }
    }

    /// Copy `[offset, offset + length)` into `scratch` (cleared first).
    pub fn read_into(&self, offset: usize, length: usize, scratch: &mut Vec<char>) -> Result<()> {
        check_range(offset, length, self.len())?;
        scratch.clear();
        scratch.reserve(length);

        let end = offset + length;
        if offset < self.gap_start {
            let pre_end = end.min(self.gap_start);
            scratch.extend_from_slice(&self.data[offset..pre_end]);
        }
        if end > self.gap_start {
            let post_start = offset.max(self.gap_start) + self.gap_len;
            let post_end = end + self.gap_len;
            scratch.extend_from_slice(&self.data[post_start..post_end]);
        }
        Ok(())
    }

    /// Read `[offset, offset + length)` as a `String`.
    pub fn read(&self, offset: usize, length: usize) -> Result<String> {
        if let Some(slice) = self.contiguous(offset, length)? {
            return Ok(slice.iter().collect());
        }
        let mut scratch = Vec::new();
        self.read_into(offset, length, &mut scratch)?;
        Ok(scratch.into_iter().collect())
    }

    /// Iterate over all characters in logical order.
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.data[..self.gap_start]
            .iter()
            .chain(self.data[self.gap_end()..].iter())
            .copied()
    }

    /// Eliminate the gap and return the now contiguous content.
    ///
    /// Any previously borrowed raw slices are invalidated (enforced by the borrow).
    pub fn compact(&mut self) -> &[char] {
        let len = self.len();
        self.move_gap_to(len);
        self.data.truncate(len);
        self.data.shrink_to_fit();
        self.gap_len = 0;
        &self.data
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GapBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use std::fmt::Write;
        for ch in self.chars() {
            f.write_char(ch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buf = GapBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.gap_len(), DEFAULT_INITIAL_GAP);
        assert_eq!(buf.to_string(), "");
    }

    #[test]
    fn test_insert_and_read() {
        let mut buf = GapBuffer::from_text("Hello World");
        buf.insert(6, "Beautiful ").unwrap();
        assert_eq!(buf.to_string(), "Hello Beautiful World");
        assert_eq!(buf.len(), 21);
        assert_eq!(buf.char_at(6).unwrap(), 'B');
        assert_eq!(buf.read(6, 9).unwrap(), "Beautiful");
    }

    #[test]
    fn test_insert_grows_from_zero_gap() {
        let mut buf = GapBuffer::with_gap("abc", 0, DEFAULT_MIN_CAPACITY);
        assert_eq!(buf.gap_len(), 0);
        buf.insert(1, "XYZ").unwrap();
        assert_eq!(buf.to_string(), "aXYZbc");
        // max(10, 3 + 1 + 3) = 10
        assert_eq!(buf.capacity(), 10);
    }

    #[test]
    fn test_growth_formula() {
        let mut buf = GapBuffer::with_gap(&"x".repeat(100), 0, DEFAULT_MIN_CAPACITY);
        buf.insert(50, "yy").unwrap();
        // 100 + 50 + 2
        assert_eq!(buf.capacity(), 152);
        assert_eq!(buf.len(), 102);
        assert_eq!(buf.gap_start(), 52);
    }

    #[test]
    fn test_remove_adjacent_to_gap_does_not_move_it() {
        let mut buf = GapBuffer::from_text("abcdef");
        buf.insert(3, "XY").unwrap();
        assert_eq!(buf.gap_start(), 5);

        // Range ending at the gap.
        buf.remove(3, 2).unwrap();
        assert_eq!(buf.gap_start(), 3);
        assert_eq!(buf.to_string(), "abcdef");

        // Range starting at the gap.
        buf.remove(3, 1).unwrap();
        assert_eq!(buf.gap_start(), 3);
        assert_eq!(buf.to_string(), "abcef");
    }

    #[test]
    fn test_remove_far_from_gap() {
        let mut buf = GapBuffer::from_text("0123456789");
        buf.remove(2, 3).unwrap();
        assert_eq!(buf.to_string(), "0156789");
        assert_eq!(buf.gap_start(), 2);
    }

    #[test]
    fn test_reads_across_gap() {
        let mut buf = GapBuffer::from_text("0123456789");
        buf.insert(5, "-").unwrap();
        assert_eq!(buf.gap_start(), 6);

        assert!(buf.contiguous(3, 6).unwrap().is_none());
        assert_eq!(buf.contiguous(0, 6).unwrap().unwrap().len(), 6);
        assert_eq!(
            buf.contiguous(6, 5).unwrap().unwrap(),
            &['5', '6', '7', '8', '9']
        );

        let mut scratch = vec!['z'; 3];
        buf.read_into(3, 6, &mut scratch).unwrap();
        assert_eq!(scratch, vec!['3', '4', '-', '5', '6', '7']);
        assert_eq!(buf.read(3, 6).unwrap(), "34-567");
    }

    #[test]
    fn test_bounds_errors() {
        let mut buf = GapBuffer::from_text("abc");
        assert!(buf.insert(4, "x").is_err());
        assert!(buf.remove(2, 2).is_err());
        assert!(buf.char_at(3).is_err());
        assert!(buf.read(1, 3).is_err());
        assert_eq!(buf.to_string(), "abc");
    }

    #[test]
    fn test_compact() {
        let mut buf = GapBuffer::from_text("hello");
        buf.insert(2, "__").unwrap();
        let content = buf.compact();
        assert_eq!(content, &['h', 'e', '_', '_', 'l', 'l', 'o']);
        assert_eq!(buf.gap_len(), 0);
        assert_eq!(buf.capacity(), 7);

        buf.insert(7, "!").unwrap();
        assert_eq!(buf.to_string(), "he__llo!");
    }

    #[test]
    fn test_unicode() {
        let mut buf = GapBuffer::from_text("你好");
        buf.insert(1, "👋").unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.char_at(1).unwrap(), '👋');
        assert_eq!(buf.to_string(), "你👋好");
    }
}
