//! Event lifecycle flags.

use bitflags::bitflags;

bitflags! {
    /// Lifecycle state of a registered event.
    ///
    /// An event moves `INIT -> INSERTED -> ACTIVE -> INIT` (or back to
    /// `INSERTED` for persistent events) as it is added, fires, and is
    /// either torn down or re-armed. `TIMEOUT` and `INTERNAL` are
    /// orthogonal bits tracked alongside the insertion state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: u8 {
        /// Freshly initialized, not registered with any queue.
        const INIT     = 0x00;
        /// Registered with the backend and/or timer heap, awaiting readiness.
        const INSERTED = 0x01;
        /// Queued on an activation queue, awaiting dispatch this iteration.
        const ACTIVE   = 0x02;
        /// Registered in the timer heap (may coexist with INSERTED for I/O+timeout events).
        const TIMEOUT  = 0x04;
        /// Reserved for reactor-internal bookkeeping events (e.g. the signal bridge).
        const INTERNAL = 0x08;
    }
}

impl EventFlags {
    #[inline]
    pub const fn is_pending(self) -> bool {
        self.intersects(EventFlags::INSERTED.union(EventFlags::TIMEOUT))
    }

    #[inline]
    pub const fn is_active(self) -> bool {
        self.contains(EventFlags::ACTIVE)
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        EventFlags::INIT
    }
}
