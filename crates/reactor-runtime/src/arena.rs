//! Event arena — stable, generation-checked storage for registered events.
//!
//! Single-threaded counterpart of a slab allocator: slots are reused LIFO
//! (cache-friendly, same as the teacher's `SlotAllocator`) but generation
//! bumping on release means a handle obtained before a `destroy` can never
//! silently alias a later, unrelated event in the same slot.

use reactor_core::{EventFlags, EventId, Interest, ReactorError, ReactorResult};
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Callback invoked when an event fires. Takes the reactor so it can
/// reentrantly `add`/`del`/`destroy` itself or other events, the firing
/// event's handle, and the interest bits that were satisfied.
pub type Callback = Box<dyn FnMut(&mut crate::reactor::Reactor, EventId, Interest)>;

pub struct Event {
    pub flags: EventFlags,
    pub registered: Interest,
    pub active: Interest,
    pub fd: Option<RawFd>,
    pub signal: Option<i32>,
    pub priority: usize,
    pub heap_index: u32,
    pub deadline: Option<Duration>,
    pub persist_timeout: Option<Duration>,
    pub callback: Option<Callback>,
}

impl Event {
    fn new(priority: usize) -> Self {
        Event {
            flags: EventFlags::INIT,
            registered: Interest::empty(),
            active: Interest::empty(),
            fd: None,
            signal: None,
            priority,
            heap_index: reactor_core::constants::NO_HEAP_INDEX,
            deadline: None,
            persist_timeout: None,
            callback: None,
        }
    }
}

struct Slot {
    generation: u32,
    event: Option<Event>,
}

/// Arena of registered events, indexed by [`EventId`].
pub struct EventArena {
    slots: Vec<Slot>,
    free_stack: Vec<u32>,
}

impl EventArena {
    pub fn with_capacity(cap: usize) -> Self {
        EventArena {
            slots: Vec::with_capacity(cap),
            free_stack: Vec::with_capacity(cap),
        }
    }

    /// Allocate a fresh, `INIT`-state event at the given priority.
    pub fn insert(&mut self, priority: usize) -> EventId {
        if let Some(index) = self.free_stack.pop() {
            let slot = &mut self.slots[index as usize];
            slot.event = Some(Event::new(priority));
            return EventId::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            event: Some(Event::new(priority)),
        });
        EventId::new(index, 0)
    }

    fn check(&self, id: EventId) -> ReactorResult<()> {
        let slot = self
            .slots
            .get(id.as_usize())
            .ok_or(ReactorError::EventNotFound)?;
        if slot.generation != id.generation() || slot.event.is_none() {
            return Err(ReactorError::StaleHandle);
        }
        Ok(())
    }

    pub fn get(&self, id: EventId) -> ReactorResult<&Event> {
        self.check(id)?;
        Ok(self.slots[id.as_usize()].event.as_ref().unwrap())
    }

    pub fn get_mut(&mut self, id: EventId) -> ReactorResult<&mut Event> {
        self.check(id)?;
        Ok(self.slots[id.as_usize()].event.as_mut().unwrap())
    }

    /// Whether `id` still names a live event (no error on a stale handle).
    pub fn contains(&self, id: EventId) -> bool {
        self.check(id).is_ok()
    }

    /// Release the slot back to the free list, bumping its generation.
    /// Caller must ensure the event is quiescent first.
    pub fn remove(&mut self, id: EventId) -> ReactorResult<Event> {
        self.check(id)?;
        let slot = &mut self.slots[id.as_usize()];
        let event = slot.event.take().unwrap();
        slot.generation = slot.generation.wrapping_add(1);
        self.free_stack.push(id.index());
        Ok(event)
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
