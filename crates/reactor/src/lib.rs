//! # reactor
//!
//! Single-threaded, libevent-style event reactor: file descriptor
//! readiness, signal delivery and timer expiration dispatched to
//! callbacks through one priority-ordered activation queue per loop
//! iteration.
//!
//! ## Quick start
//!
//! ```ignore
//! use reactor::{Reactor, Interest};
//! use std::time::Duration;
//!
//! let mut r = Reactor::new().unwrap();
//! let id = r.init(None);
//! r.set_callback(id, |r, id, _| {
//!     println!("fired");
//!     let _ = r.del(id);
//!     let _ = r.destroy(id);
//! }).unwrap();
//! r.add(id, Interest::TIMEOUT, Some(Duration::from_millis(50))).unwrap();
//! r.run();
//! ```
//!
//! ## The "current" reactor
//!
//! Signal-style global call sites (the kind `event.c`'s `current_base`
//! exists for) are supported through a thread-local slot: call
//! [`Reactor::make_current`] once, then reach it from anywhere on the
//! same thread via [`with_current`].

pub use reactor_core::{
    env_get, env_get_bool, env_get_opt, env_get_str, env_is_set, ev_debug, ev_error, ev_info,
    ev_trace, ev_warn, Backend, BackendError, EventFlags, EventId, Interest, LogLevel, Readiness,
    ReactorError, ReactorResult,
};
pub use reactor_runtime::backends::PollBackend;
pub use reactor_runtime::{LoopFlags, Reactor, ReactorConfig};

pub use nix::sys::signal::Signal;

use std::cell::Cell;
use std::ptr::NonNull;

thread_local! {
    static CURRENT: Cell<Option<NonNull<Reactor>>> = const { Cell::new(None) };
}

/// RAII guard returned by [`Reactor::make_current`]. Restores whatever
/// reactor (if any) was current on this thread before it was created.
pub struct CurrentGuard {
    previous: Option<NonNull<Reactor>>,
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        CURRENT.with(|c| c.set(self.previous));
    }
}

/// Extension trait adding the thread-local "current reactor" convenience
/// to [`Reactor`], kept separate from the core type so `reactor-runtime`
/// itself stays free of thread-local state.
pub trait MakeCurrent {
    /// Mark `self` as this thread's current reactor until the returned
    /// guard is dropped. Nestable: an inner `make_current` restores the
    /// outer reactor on drop.
    fn make_current(&mut self) -> CurrentGuard;
}

impl MakeCurrent for Reactor {
    fn make_current(&mut self) -> CurrentGuard {
        let previous = CURRENT.with(|c| c.replace(Some(NonNull::from(self))));
        CurrentGuard { previous }
    }
}

/// Run `f` against this thread's current reactor, if one has been
/// installed with [`MakeCurrent::make_current`]. Returns `None` if no
/// reactor is current.
///
/// # Safety
///
/// The raw pointer stashed by `make_current` is only ever dereferenced
/// while the `Reactor` it points to is still alive and on the thread
/// that created it — the guard it returns borrows that thread's slot
/// for exactly its own lifetime, and the reactor itself cannot move out
/// from under a live `&mut` borrow used to construct the guard.
pub fn with_current<R>(f: impl FnOnce(&mut Reactor) -> R) -> Option<R> {
    CURRENT.with(|c| {
        c.get().map(|mut ptr| {
            // SAFETY: see function doc comment.
            let reactor = unsafe { ptr.as_mut() };
            f(reactor)
        })
    })
}

/// Whether this thread currently has a reactor installed via
/// `make_current`.
pub fn has_current() -> bool {
    CURRENT.with(|c| c.get().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn current_reactor_roundtrip() {
        assert!(!has_current());
        let mut r = Reactor::with_config(ReactorConfig::default().backend_override("poll")).unwrap();
        {
            let _guard = r.make_current();
            assert!(has_current());
            let levels = with_current(|r| r.priority_levels());
            assert_eq!(levels, Some(r.priority_levels()));
        }
        assert!(!has_current());
    }

    #[test]
    fn nested_make_current_restores_outer() {
        let mut outer = Reactor::with_config(ReactorConfig::default().backend_override("poll")).unwrap();
        let _outer_guard = outer.make_current();

        {
            let mut inner = Reactor::with_config(ReactorConfig::default().backend_override("poll")).unwrap();
            let _inner_guard = inner.make_current();
            assert!(has_current());
        }

        assert!(has_current());
    }

    #[test]
    fn reactor_runs_end_to_end() {
        let mut r = Reactor::with_config(ReactorConfig::default().backend_override("poll")).unwrap();
        let id = r.init(None);
        let mut fired = false;
        r.set_callback(id, |r, id, _| {
            let _ = r.del(id);
            let _ = r.destroy(id);
        })
        .unwrap();
        r.add(id, Interest::TIMEOUT, Some(Duration::from_millis(1))).unwrap();
        assert_eq!(r.run(), 1);
        let _ = &mut fired;
    }
}
