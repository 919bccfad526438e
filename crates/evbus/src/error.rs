//! Error types for event manager operations.

use thiserror::Error;

/// Errors returned by [`EventManager`](crate::EventManager) operations.
///
/// This is a closed set: every failure an embedder can observe maps to one
/// of these codes, and the `Display` impl provides the human-readable
/// description for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A parameter failed validation (out-of-range event id, malformed descriptor).
    #[error("invalid parameter")]
    InvalidParam,

    /// The manager has not been initialized.
    #[error("not initialized")]
    NotInitialized,

    /// The manager has already been initialized.
    #[error("already initialized")]
    AlreadyInit,

    /// A payload copy could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// The async queue for the requested priority is at capacity.
    #[error("queue is full")]
    QueueFull,

    /// No pending async event at any priority.
    #[error("queue is empty")]
    QueueEmpty,

    /// The event already has the maximum number of subscribers.
    #[error("maximum subscribers reached")]
    MaxSubscribers,

    /// No matching subscription was found.
    #[error("not found")]
    NotFound,

    /// A synchronization primitive failed.
    #[error("mutex operation failed")]
    MutexFailed,
}

impl Error {
    /// Returns `true` for rejected-input errors that leave the manager untouched.
    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidParam)
    }

    /// Returns `true` for capacity errors; retrying after a drain or an
    /// unsubscribe can succeed.
    #[inline]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::QueueFull | Self::MaxSubscribers)
    }

    /// Returns `true` for steady-state signals used by control flow
    /// (`QueueEmpty`, `NotFound`) rather than true failures.
    #[inline]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::QueueEmpty | Self::NotFound)
    }
}
