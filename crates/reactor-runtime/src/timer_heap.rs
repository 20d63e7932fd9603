//! Indexed timer min-heap.
//!
//! Each heap slot's position is mirrored back into the owning `Event`'s
//! `heap_index`, so `erase` locates its entry directly instead of
//! scanning — true O(log n) erase by identity, as opposed to the
//! lazy-cancellation approach (tombstone + periodic sweep) used
//! elsewhere in this codebase's ancestry.

use crate::arena::EventArena;
use reactor_core::{EventId, constants::NO_HEAP_INDEX};
use std::time::Duration;

/// Binary min-heap of events ordered by deadline, ties broken by index
/// for a deterministic total order.
pub struct TimerHeap {
    heap: Vec<EventId>,
}

impl TimerHeap {
    pub fn with_capacity(cap: usize) -> Self {
        TimerHeap {
            heap: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn deadline(arena: &EventArena, id: EventId) -> Duration {
        arena
            .get(id)
            .ok()
            .and_then(|e| e.deadline)
            .unwrap_or(Duration::MAX)
    }

    fn less(arena: &EventArena, a: EventId, b: EventId) -> bool {
        let (da, db) = (Self::deadline(arena, a), Self::deadline(arena, b));
        (da, a.index()) < (db, b.index())
    }

    fn set_index(&mut self, arena: &mut EventArena, pos: usize) {
        let id = self.heap[pos];
        if let Ok(event) = arena.get_mut(id) {
            event.heap_index = pos as u32;
        }
    }

    fn sift_up(&mut self, arena: &mut EventArena, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if Self::less(arena, self.heap[pos], self.heap[parent]) {
                self.heap.swap(pos, parent);
                self.set_index(arena, pos);
                self.set_index(arena, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, arena: &mut EventArena, mut pos: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut smallest = pos;
            if left < len && Self::less(arena, self.heap[left], self.heap[smallest]) {
                smallest = left;
            }
            if right < len && Self::less(arena, self.heap[right], self.heap[smallest]) {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.heap.swap(pos, smallest);
            self.set_index(arena, pos);
            self.set_index(arena, smallest);
            pos = smallest;
        }
    }

    /// Insert `id` (its `Event::deadline` must already be set). O(log n).
    pub fn push(&mut self, arena: &mut EventArena, id: EventId) {
        let pos = self.heap.len();
        self.heap.push(id);
        self.set_index(arena, pos);
        self.sift_up(arena, pos);
    }

    /// Remove `id` by identity using its stored `heap_index`. O(log n).
    /// No-op if `id` isn't currently in the heap.
    pub fn erase(&mut self, arena: &mut EventArena, id: EventId) {
        let pos = match arena.get(id) {
            Ok(event) if event.heap_index != NO_HEAP_INDEX => event.heap_index as usize,
            _ => return,
        };
        if pos >= self.heap.len() || self.heap[pos] != id {
            return;
        }

        if let Ok(event) = arena.get_mut(id) {
            event.heap_index = NO_HEAP_INDEX;
        }

        let last = self.heap.len() - 1;
        if pos != last {
            self.heap.swap(pos, last);
            self.heap.pop();
            self.set_index(arena, pos);
            // could need to move either direction after the swap
            self.sift_down(arena, pos);
            self.sift_up(arena, pos);
        } else {
            self.heap.pop();
        }
    }

    /// Earliest deadline in the heap, if any.
    pub fn next_deadline(&self, arena: &EventArena) -> Option<Duration> {
        self.heap.first().map(|&id| Self::deadline(arena, id))
    }

    /// Pop and return the earliest event if its deadline is `<= now`.
    pub fn pop_if_due(&mut self, arena: &mut EventArena, now: Duration) -> Option<EventId> {
        let top = *self.heap.first()?;
        if Self::deadline(arena, top) > now {
            return None;
        }
        self.erase(arena, top);
        Some(top)
    }

    /// Subtract `jump` (the magnitude of a detected backward wall-clock
    /// jump) from every pending deadline, preserving each event's
    /// relative time-to-fire instead of letting it drift into the future
    /// by the jump's size. Heap order is unaffected by a uniform shift,
    /// so no re-heapify is required.
    pub fn correct(&self, arena: &mut EventArena, jump: Duration) {
        for &id in &self.heap {
            if let Ok(event) = arena.get_mut(id) {
                if let Some(d) = event.deadline {
                    event.deadline = Some(d.saturating_sub(jump));
                }
            }
        }
    }
}
