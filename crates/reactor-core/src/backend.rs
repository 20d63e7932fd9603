//! Pluggable I/O multiplexing backend.

use crate::error::BackendError;
use crate::mask::Interest;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// One fd transitioning to readiness, reported by `dispatch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub fd: RawFd,
    pub revents: Interest,
}

/// A concrete I/O multiplexing strategy (poll, epoll, kqueue, IOCP, ...).
///
/// A `Reactor` owns exactly one `Backend` and drives it once per loop
/// iteration. Implementations are not required to be thread-safe; the
/// reactor that owns a backend never calls into it from more than one
/// thread at a time.
pub trait Backend {
    /// Human-readable name, used for `EVENT_SHOW_METHOD` diagnostics.
    fn name(&self) -> &'static str;

    /// Begin (or re-begin, after `fork`) watching for I/O. Called once at
    /// construction and again from `Reactor::reinit`.
    fn init(&mut self) -> Result<(), BackendError>;

    /// Start or update watching `fd` for `interest`. `old` is the
    /// previously-registered interest for this fd (empty if this is a
    //// fresh registration), letting incremental backends (epoll) choose
    /// between ADD and MOD.
    fn add(&mut self, fd: RawFd, old: Interest, interest: Interest) -> Result<(), BackendError>;

    /// Stop watching `fd` for `interest`. `remaining` is what's left
    /// registered for this fd afterward (empty means fully removed).
    fn del(&mut self, fd: RawFd, interest: Interest, remaining: Interest) -> Result<(), BackendError>;

    /// Block for up to `timeout` (or indefinitely if `None`) and return
    /// the fds that became ready. An empty vec on timeout is not an error.
    fn dispatch(&mut self, timeout: Option<Duration>) -> Result<Vec<Readiness>, BackendError>;

    /// Release OS resources (e.g. close an epoll fd). Called when the
    /// owning `Reactor` is dropped.
    fn dealloc(&mut self);

    /// Whether this backend's internal fd table becomes invalid across a
    /// `fork()` and must be rebuilt via `init`/`add` rather than merely
    /// continuing to run (e.g. epoll/kqueue fds don't survive a fork the
    /// way a plain poll() fd-list does).
    fn needs_reinit(&self) -> bool {
        false
    }
}
