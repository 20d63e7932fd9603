//! Priority activation queues.
//!
//! One FIFO per priority level. The loop driver drains exactly one
//! queue — the highest-priority non-empty one — per iteration, so a
//! flood of low-priority activity can never starve a single iteration's
//! service of high-priority events, but a continuous stream of
//! high-priority activations can still delay lower ones indefinitely
//! (strict priority, not fair — carried from the source design).

use reactor_core::EventId;
use std::collections::VecDeque;

pub struct ActivationQueues {
    queues: Vec<VecDeque<EventId>>,
}

impl ActivationQueues {
    pub fn new(levels: usize) -> Self {
        ActivationQueues {
            queues: (0..levels.max(1)).map(|_| VecDeque::new()).collect(),
        }
    }

    pub fn levels(&self) -> usize {
        self.queues.len()
    }

    /// Default priority for newly-created events: the middle level.
    pub fn default_priority(&self) -> usize {
        self.queues.len() / 2
    }

    pub fn push(&mut self, priority: usize, id: EventId) {
        self.queues[priority].push_back(id);
    }

    /// Highest-priority non-empty queue's index, if any.
    pub fn highest_nonempty(&self) -> Option<usize> {
        self.queues.iter().position(|q| !q.is_empty())
    }

    /// Drain every entry currently in `priority`'s queue, in FIFO order.
    /// Entries pushed into the same queue by a callback invoked during
    /// the drain are not included in this batch — they'll be seen on a
    /// later iteration, preserving single-queue-per-drain semantics.
    pub fn drain(&mut self, priority: usize) -> Vec<EventId> {
        Vec::from(std::mem::take(&mut self.queues[priority]))
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }

    /// Remove a specific event from whichever queue holds it, if any
    /// (used when `del` cancels an event that is already ACTIVE).
    pub fn remove(&mut self, priority: usize, id: EventId) {
        if let Some(queue) = self.queues.get_mut(priority) {
            queue.retain(|&e| e != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u32) -> EventId {
        EventId::new(i, 0)
    }

    #[test]
    fn default_priority_is_middle() {
        let q = ActivationQueues::new(3);
        assert_eq!(q.default_priority(), 1);
    }

    #[test]
    fn highest_nonempty_prefers_lower_index() {
        let mut q = ActivationQueues::new(3);
        q.push(2, id(1));
        assert_eq!(q.highest_nonempty(), Some(2));
        q.push(0, id(2));
        assert_eq!(q.highest_nonempty(), Some(0));
    }

    #[test]
    fn drain_is_fifo_and_empties_queue() {
        let mut q = ActivationQueues::new(2);
        q.push(0, id(1));
        q.push(0, id(2));
        q.push(0, id(3));
        let batch = q.drain(0);
        assert_eq!(batch, vec![id(1), id(2), id(3)]);
        assert!(q.is_empty());
    }

    #[test]
    fn remove_drops_only_matching_entry() {
        let mut q = ActivationQueues::new(1);
        q.push(0, id(1));
        q.push(0, id(2));
        q.remove(0, id(1));
        assert_eq!(q.drain(0), vec![id(2)]);
    }
}
