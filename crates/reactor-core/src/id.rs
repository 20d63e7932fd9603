//! Event handle type

use core::fmt;

/// Stable handle to an event registered with a reactor.
///
/// `EventId` indexes into the reactor's event arena. The `generation`
/// field distinguishes a handle from a stale one left over after the
/// slot it named was destroyed and reused — `Reactor` rejects any
/// operation on a handle whose generation doesn't match the slot's
/// current generation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId {
    index: u32,
    generation: u32,
}

impl EventId {
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        EventId { index, generation }
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({}#{})", self.index, self.generation)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.generation)
    }
}
