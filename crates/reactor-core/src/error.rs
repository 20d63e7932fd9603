//! Error types for the reactor event loop.

use core::fmt;

/// Result type for reactor operations.
pub type ReactorResult<T> = Result<T, ReactorError>;

/// Errors that can occur in reactor operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactorError {
    /// The event arena has no free slots and cannot grow further.
    NoSlotsAvailable,
    /// The handle's generation doesn't match the slot's current generation.
    StaleHandle,
    /// No event exists at the handle's index.
    EventNotFound,
    /// `destroy` was called on an event that is still INSERTED/TIMEOUT/ACTIVE.
    EventStillPending,
    /// The backend's `init`, `add`, `del` or `dispatch` call failed.
    BackendError(BackendError),
    /// Installing or tearing down the signal bridge failed.
    SignalError(i32),
    /// The requested priority level is outside `0..levels`.
    InvalidPriority,
    /// `set_priority_levels` was called while an activation queue is non-empty.
    QueuesNotEmpty,
}

impl fmt::Display for ReactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactorError::NoSlotsAvailable => write!(f, "no event slots available"),
            ReactorError::StaleHandle => write!(f, "stale event handle"),
            ReactorError::EventNotFound => write!(f, "event not found"),
            ReactorError::EventStillPending => write!(f, "event is still pending; call del first"),
            ReactorError::BackendError(e) => write!(f, "backend error: {}", e),
            ReactorError::SignalError(errno) => write!(f, "signal bridge error: errno {}", errno),
            ReactorError::InvalidPriority => write!(f, "priority out of range"),
            ReactorError::QueuesNotEmpty => {
                write!(f, "cannot change priority levels while an event is active")
            }
        }
    }
}

impl std::error::Error for ReactorError {}

/// Errors surfaced by a `Backend` implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend's init syscall failed.
    InitFailed(i32),
    /// Registering interest for a fd failed.
    AddFailed(i32),
    /// Removing interest for a fd failed.
    DelFailed(i32),
    /// The polling syscall itself failed (not a per-fd error).
    DispatchFailed(i32),
    /// The backend has no room left for another watched fd.
    TableFull,
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::InitFailed(errno) => write!(f, "init failed: errno {}", errno),
            BackendError::AddFailed(errno) => write!(f, "add failed: errno {}", errno),
            BackendError::DelFailed(errno) => write!(f, "del failed: errno {}", errno),
            BackendError::DispatchFailed(errno) => write!(f, "dispatch failed: errno {}", errno),
            BackendError::TableFull => write!(f, "backend fd table full"),
        }
    }
}

impl From<BackendError> for ReactorError {
    fn from(e: BackendError) -> Self {
        ReactorError::BackendError(e)
    }
}
