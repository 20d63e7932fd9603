//! Interest mask — which conditions an event watches for.
//!
//! Bit values are a stable external contract (consumers may persist them)
//! and must not be renumbered.

use bitflags::bitflags;

bitflags! {
    /// Conditions an event can be registered to wait on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Interest: u8 {
        /// Fires once the associated timeout elapses.
        const TIMEOUT = 0x01;
        /// Fires when the fd is readable.
        const READ    = 0x02;
        /// Fires when the fd is writable.
        const WRITE   = 0x04;
        /// Fires when the watched signal is delivered.
        const SIGNAL  = 0x08;
        /// Re-arm automatically after each activation instead of
        /// reverting to the pending state.
        const PERSIST = 0x10;
    }
}

impl Interest {
    /// `true` if this interest names an I/O readiness condition (read or write).
    #[inline]
    pub const fn is_io(self) -> bool {
        self.intersects(Interest::READ.union(Interest::WRITE))
    }
}
