//! Event descriptors: identifiers, priorities, payloads and delivery modes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Event type identifier.
///
/// Valid ids lie in `[0, config.max_event_types)`; every entry point rejects
/// ids outside that range with [`Error::InvalidParam`](crate::Error::InvalidParam).
pub type EventId = u32;

/// Service priority, for both subscribers of one event and async events
/// across the queue set.
///
/// Lower ordinal is served earlier: `High` before `Normal` before `Low`.
/// Strict, not weighted: a steady stream of `High` events will starve
/// `Low` ones. Producers needing fairness must self-regulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Served first.
    High = 0,
    /// Default.
    Normal = 1,
    /// Served last.
    Low = 2,
}

impl Priority {
    /// Number of priority levels.
    pub const COUNT: usize = 3;

    /// All priorities in service order (highest first).
    pub const ALL: [Priority; Priority::COUNT] = [Priority::High, Priority::Normal, Priority::Low];

    /// Index into the per-priority queue set.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// How a published event is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Callbacks run on the publisher's thread before publish returns.
    Sync,
    /// The event is queued and served later by the event loop or a manual drain.
    Async,
}

/// Opaque event payload.
///
/// Two non-empty forms with different ownership contracts:
///
/// - [`Payload::Shared`] passes a reference-counted handle through without
///   copying. The refcount keeps the pointee alive until delivery completes,
///   so the producer is free to drop its own handle immediately.
/// - [`Payload::Bytes`] is a kernel-owned copy of the producer's bytes,
///   taken at publish time (see
///   [`EventManager::publish_async_bytes`](crate::EventManager::publish_async_bytes)).
///   The producer may mutate or free its original as soon as publish
///   returns; the copy is released exactly once, after the delivery that
///   consumes it, on queue clear, or on manager drop.
#[derive(Clone)]
pub enum Payload {
    /// No payload.
    Empty,
    /// Producer-owned shared data, passed through without a byte copy.
    Shared(Arc<dyn Any + Send + Sync>),
    /// Kernel-owned byte copy, isolated from the producer.
    Bytes(Box<[u8]>),
}

impl Payload {
    /// Wraps a value in a shared pass-through payload.
    #[inline]
    pub fn shared<T: Any + Send + Sync>(value: T) -> Self {
        Payload::Shared(Arc::new(value))
    }

    /// Takes an owned copy of the given bytes.
    #[inline]
    pub fn copy_of(bytes: &[u8]) -> Self {
        Payload::Bytes(bytes.into())
    }

    /// Returns `true` if there is no payload.
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Downcasts a [`Payload::Shared`] payload to a concrete type.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Shared(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the bytes of a [`Payload::Bytes`] payload.
    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Empty
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Payload::Empty"),
            Payload::Shared(_) => f.write_str("Payload::Shared(..)"),
            Payload::Bytes(bytes) => write!(f, "Payload::Bytes({} bytes)", bytes.len()),
        }
    }
}

impl From<Arc<dyn Any + Send + Sync>> for Payload {
    fn from(any: Arc<dyn Any + Send + Sync>) -> Self {
        Payload::Shared(any)
    }
}

/// A publishable event descriptor, accepted by the generic
/// [`EventManager::publish`](crate::EventManager::publish) entry point.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event type identifier.
    pub id: EventId,
    /// Payload handed to every subscriber.
    pub payload: Payload,
    /// Queue priority; only meaningful for async delivery.
    pub priority: Priority,
    /// Delivery mode.
    pub mode: DeliveryMode,
}

impl Event {
    /// A synchronous event, dispatched on the publisher's thread.
    pub fn sync(id: EventId, payload: Payload) -> Self {
        Self {
            id,
            payload,
            priority: Priority::Normal,
            mode: DeliveryMode::Sync,
        }
    }

    /// An asynchronous event, queued at the given priority.
    pub fn asynchronous(id: EventId, payload: Payload, priority: Priority) -> Self {
        Self {
            id,
            payload,
            priority,
            mode: DeliveryMode::Async,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_service_order() {
        assert!(Priority::High < Priority::Normal);
        assert!(Priority::Normal < Priority::Low);
        assert_eq!(Priority::ALL[0], Priority::High);
        assert_eq!(Priority::Low.index(), 2);
    }

    #[test]
    fn test_payload_downcast() {
        let payload = Payload::shared(42u32);
        assert_eq!(payload.downcast_ref::<u32>(), Some(&42));
        assert_eq!(payload.downcast_ref::<i64>(), None);
        assert!(payload.as_bytes().is_none());
    }

    #[test]
    fn test_payload_copy_is_isolated() {
        let mut original = [1u8, 2, 3, 4];
        let payload = Payload::copy_of(&original);
        original[0] = 99;
        assert_eq!(payload.as_bytes(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_event_constructors() {
        let ev = Event::sync(3, Payload::Empty);
        assert_eq!(ev.mode, DeliveryMode::Sync);

        let ev = Event::asynchronous(3, Payload::Empty, Priority::High);
        assert_eq!(ev.mode, DeliveryMode::Async);
        assert_eq!(ev.priority, Priority::High);
    }
}
