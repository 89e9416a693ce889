//! Change notifications.
//!
//! Consumers (views, gutters, indexers) register a callback and receive one [`DocumentChange`]
//! per outermost write section that modified the document. Registrations live in an explicit
//! table keyed by [`ListenerId`]; a consumer unregisters at teardown instead of relying on the
//! document noticing that it went away.

use crate::delta::TextDelta;
use std::sync::Arc;

/// Change record delivered to listeners.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    /// Version before the write section.
    pub old_version: u64,
    /// Version after the write section.
    pub new_version: u64,
    /// Edits made during the section, in application order.
    pub delta: Arc<TextDelta>,
    /// First line whose text or structure changed (in the new document).
    pub first_line: usize,
}

/// Change callback function type.
pub type ChangeCallback = Box<dyn FnMut(&DocumentChange) + Send>;

/// Handle of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId {
    index: usize,
    generation: u32,
}

struct ListenerSlot {
    generation: u32,
    callback: Option<ChangeCallback>,
}

/// Registration table for change callbacks.
#[derive(Default)]
pub struct Listeners {
    slots: Vec<ListenerSlot>,
    free: Vec<usize>,
    live: usize,
}

impl Listeners {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Register a callback.
    pub fn subscribe(&mut self, callback: ChangeCallback) -> ListenerId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.callback = Some(callback);
            return ListenerId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len();
        self.slots.push(ListenerSlot {
            generation: 0,
            callback: Some(callback),
        });
        ListenerId {
            index,
            generation: 0,
        }
    }

    /// Unregister a callback; returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index) else {
            return false;
        };
        if slot.generation != id.generation || slot.callback.is_none() {
            return false;
        }
        slot.callback = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        true
    }

    /// Call every registered callback, in registration-slot order.
    pub fn notify(&mut self, change: &DocumentChange) {
        for callback in self.slots.iter_mut().filter_map(|slot| slot.callback.as_mut()) {
            callback(change);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("live", &self.live).finish()
    }
}
