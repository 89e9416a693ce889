//! Live positions ("marks") that follow edits.
//!
//! Marks live in an arena of generation-checked slots, so a [`MarkHandle`] is a plain `Copy`
//! value that can be shared freely while only the owning document repositions it. A second
//! array keeps the live slots sorted by `(offset, bias, slot)`, which gives a deterministic
//! total order for binary search: the update after an edit starts at the first affected mark
//! instead of scanning from the front.

use crate::error::{BufferError, Result};
use std::ops::Range;

/// Tie-break rule for a mark sitting exactly at an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bias {
    /// Stays before text inserted at its offset.
    Backward,
    /// Moves past text inserted at its offset.
    Forward,
}

/// Stable handle to a mark owned by a [`MarkTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkHandle {
    index: u32,
    generation: u32,
}

/// A mark pushed aside by a removal, with the offset it had before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplacedMark {
    /// The displaced mark.
    pub handle: MarkHandle,
    /// Its offset before the removal.
    pub offset: usize,
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    offset: usize,
    bias: Bias,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    mark: Option<Mark>,
}

/// Ordered collection of marks for one buffer.
#[derive(Debug, Clone, Default)]
pub struct MarkTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Live slot indices sorted by `(offset, bias, slot)`.
    order: Vec<u32>,
}

impl MarkTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live marks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no marks are alive.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn mark(&self, slot: u32) -> Mark {
        // `order` only ever holds live slots.
        self.slots[slot as usize]
            .mark
            .unwrap_or(Mark {
                offset: 0,
                bias: Bias::Backward,
            })
    }

    fn key(&self, slot: u32) -> (usize, Bias, u32) {
        let mark = self.mark(slot);
        (mark.offset, mark.bias, slot)
    }

    fn live(&self, handle: MarkHandle) -> Result<Mark> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.mark)
            .ok_or(BufferError::InvalidHandle(handle))
    }

    /// Insert a new mark at its sorted position.
    ///
    /// The caller is responsible for `offset` lying inside the buffer. Fails once every `u32`
    /// slot index is in use.
    pub fn create(&mut self, offset: usize, bias: Bias) -> Result<MarkHandle> {
        let mark = Mark { offset, bias };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].mark = Some(mark);
                index
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| BufferError::illegal("mark table is full"))?;
                self.slots.push(Slot {
                    generation: 0,
                    mark: Some(mark),
                });
                index
            }
        };

        let key = (offset, bias, index);
        let pos = self.order.partition_point(|&slot| self.key(slot) < key);
        self.order.insert(pos, index);

        Ok(MarkHandle {
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    /// Remove a mark; the handle becomes invalid.
    pub fn dispose(&mut self, handle: MarkHandle) -> Result<()> {
        let mark = self.live(handle)?;
        let key = (mark.offset, mark.bias, handle.index);
        let pos = self.order.partition_point(|&slot| self.key(slot) < key);
        if self.order.get(pos) != Some(&handle.index) {
            return Err(BufferError::illegal("mark order out of sync with slots"));
        }
        self.order.remove(pos);

        let slot = &mut self.slots[handle.index as usize];
        slot.mark = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(())
    }

    /// Current offset of a mark.
    pub fn offset(&self, handle: MarkHandle) -> Result<usize> {
        self.live(handle).map(|mark| mark.offset)
    }

    /// Bias of a mark.
    pub fn bias(&self, handle: MarkHandle) -> Result<Bias> {
        self.live(handle).map(|mark| mark.bias)
    }

    /// Returns `true` if the handle refers to a live mark.
    pub fn contains(&self, handle: MarkHandle) -> bool {
        self.live(handle).is_ok()
    }

    /// Live marks in `(offset, bias)` order.
    pub fn iter(&self) -> impl Iterator<Item = (MarkHandle, usize, Bias)> + '_ {
        self.order.iter().map(|&index| {
            let slot = &self.slots[index as usize];
            let mark = self.mark(index);
            (
                MarkHandle {
                    index,
                    generation: slot.generation,
                },
                mark.offset,
                mark.bias,
            )
        })
    }

    fn set_offset(&mut self, index: u32, offset: usize) {
        if let Some(mark) = self.slots[index as usize].mark.as_mut() {
            mark.offset = offset;
        }
    }

    /// Shift marks for an insertion of `length` characters at `offset`.
    ///
    /// A `Backward` mark at `offset` stays put; a `Forward` one moves past the new text.
    pub fn update_for_insert(&mut self, offset: usize, length: usize) {
        if length == 0 {
            return;
        }
        let first = self.order.partition_point(|&slot| {
            let mark = self.mark(slot);
            mark.offset < offset || (mark.offset == offset && mark.bias == Bias::Backward)
        });
        for pos in first..self.order.len() {
            let index = self.order[pos];
            let shifted = self.mark(index).offset + length;
            self.set_offset(index, shifted);
        }
    }

    /// Shift and clamp marks for a removal of `[offset, offset + length)`.
    ///
    /// Marks inside the range (or at its end) collapse onto `offset`; marks after it move back.
    /// Every mark that sat in `[offset, offset + length]` is returned with its old offset so the
    /// removal can be inverted exactly.
    pub fn update_for_remove(&mut self, offset: usize, length: usize) -> Vec<DisplacedMark> {
        if length == 0 {
            return Vec::new();
        }
        let end = offset + length;
        let lo = self.order.partition_point(|&slot| self.mark(slot).offset < offset);
        let hi = self.order.partition_point(|&slot| self.mark(slot).offset <= end);

        let mut displaced = Vec::with_capacity(hi - lo);
        for pos in lo..hi {
            let index = self.order[pos];
            let old = self.mark(index).offset;
            displaced.push(DisplacedMark {
                handle: MarkHandle {
                    index,
                    generation: self.slots[index as usize].generation,
                },
                offset: old,
            });
            self.set_offset(index, offset);
        }
        for pos in hi..self.order.len() {
            let index = self.order[pos];
            let shifted = self.mark(index).offset - length;
            self.set_offset(index, shifted);
        }

        // Collapsed marks may now disagree on bias order.
        self.sort_range(lo, hi);
        displaced
    }

    /// Put displaced marks back after the removed text has been re-inserted at `range.start`.
    ///
    /// Marks disposed in the meantime are skipped, and so is any mark that no longer sits inside
    /// `range` or whose saved offset lies outside it.
    pub fn restore(&mut self, range: Range<usize>, displaced: &[DisplacedMark]) {
        if displaced.is_empty() {
            return;
        }
        let lo = self
            .order
            .partition_point(|&slot| self.mark(slot).offset < range.start);
        let hi = self
            .order
            .partition_point(|&slot| self.mark(slot).offset <= range.end);

        let within = |offset: usize| range.start <= offset && offset <= range.end;
        for entry in displaced {
            if let Ok(mark) = self.live(entry.handle)
                && within(mark.offset)
                && within(entry.offset)
            {
                self.set_offset(entry.handle.index, entry.offset);
            }
        }
        self.sort_range(lo, hi);
    }

    fn sort_range(&mut self, lo: usize, hi: usize) {
        if hi - lo < 2 {
            return;
        }
        let mut segment: Vec<u32> = self.order[lo..hi].to_vec();
        segment.sort_unstable_by_key(|&slot| self.key(slot));
        self.order[lo..hi].copy_from_slice(&segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(table: &MarkTable) -> Vec<(usize, Bias)> {
        table.iter().map(|(_, offset, bias)| (offset, bias)).collect()
    }

    #[test]
    fn test_create_keeps_order() {
        let mut table = MarkTable::new();
        table.create(5, Bias::Forward).unwrap();
        table.create(1, Bias::Forward).unwrap();
        table.create(5, Bias::Backward).unwrap();
        assert_eq!(
            offsets(&table),
            vec![(1, Bias::Forward), (5, Bias::Backward), (5, Bias::Forward)]
        );
    }

    #[test]
    fn test_insert_respects_bias() {
        let mut table = MarkTable::new();
        let back = table.create(1, Bias::Backward).unwrap();
        let fwd = table.create(1, Bias::Forward).unwrap();
        let after = table.create(2, Bias::Forward).unwrap();
        let before = table.create(0, Bias::Forward).unwrap();

        table.update_for_insert(1, 2);
        assert_eq!(table.offset(back).unwrap(), 1);
        assert_eq!(table.offset(fwd).unwrap(), 3);
        assert_eq!(table.offset(after).unwrap(), 4);
        assert_eq!(table.offset(before).unwrap(), 0);
    }

    #[test]
    fn test_remove_clamps_and_shifts() {
        let mut table = MarkTable::new();
        let inside = table.create(3, Bias::Forward).unwrap();
        let at_end = table.create(5, Bias::Backward).unwrap();
        let after = table.create(8, Bias::Forward).unwrap();
        let at_start = table.create(1, Bias::Forward).unwrap();

        let displaced = table.update_for_remove(1, 4);
        assert_eq!(table.offset(inside).unwrap(), 1);
        assert_eq!(table.offset(at_end).unwrap(), 1);
        assert_eq!(table.offset(after).unwrap(), 4);
        assert_eq!(table.offset(at_start).unwrap(), 1);
        assert_eq!(displaced.len(), 3);

        // Order is still by (offset, bias).
        let order = offsets(&table);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[test]
    fn test_restore_after_reinsert() {
        let mut table = MarkTable::new();
        let a = table.create(2, Bias::Backward).unwrap();
        let b = table.create(4, Bias::Forward).unwrap();
        let c = table.create(6, Bias::Backward).unwrap();

        let displaced = table.update_for_remove(2, 4);
        // Re-insert the 4 characters and put marks back.
        table.update_for_insert(2, 4);
        table.restore(2..6, &displaced);

        assert_eq!(table.offset(a).unwrap(), 2);
        assert_eq!(table.offset(b).unwrap(), 4);
        assert_eq!(table.offset(c).unwrap(), 6);
    }

    #[test]
    fn test_dispose_invalidates_handle() {
        let mut table = MarkTable::new();
        let a = table.create(3, Bias::Forward).unwrap();
        table.dispose(a).unwrap();
        assert_eq!(table.offset(a), Err(BufferError::InvalidHandle(a)));
        assert_eq!(table.dispose(a), Err(BufferError::InvalidHandle(a)));

        // Slot reuse must not resurrect the old handle.
        let b = table.create(7, Bias::Backward).unwrap();
        assert!(table.offset(a).is_err());
        assert_eq!(table.offset(b).unwrap(), 7);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_restore_skips_marks_outside_range() {
        let mut table = MarkTable::new();
        let a = table.create(5, Bias::Forward).unwrap();
        let b = table.create(9, Bias::Forward).unwrap();

        let displaced = table.update_for_remove(4, 2);
        assert_eq!(table.offset(a).unwrap(), 4);
        // `a` was moved elsewhere before the restore: it must not be put back.
        table.update_for_remove(0, 4);
        table.update_for_insert(5, 2);
        table.restore(5..7, &displaced);

        assert_eq!(table.offset(a).unwrap(), 0);
        assert_eq!(table.offset(b).unwrap(), 3);
        table.dispose(a).unwrap();
        table.dispose(b).unwrap();
        assert!(table.is_empty());
    }
}
