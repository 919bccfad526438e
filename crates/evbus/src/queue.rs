//! Bounded per-priority FIFO rings for pending asynchronous events.

use crate::invariants::debug_assert_bounded_len;
use crate::{Error, Event, Priority};

/// Fixed-capacity FIFO ring.
///
/// Head and tail wrap modulo the capacity; `len` disambiguates full from
/// empty. Enqueue never overwrites: a full ring rejects the event, and the
/// rejected event (with any payload copy it owns) is dropped on return.
pub(crate) struct Ring {
    slots: Box<[Option<Event>]>,
    head: usize,
    tail: usize,
    len: usize,
}

impl Ring {
    pub(crate) fn new(capacity: usize) -> Self {
        let slots = std::iter::repeat_with(|| None).take(capacity).collect();
        Self {
            slots,
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn enqueue(&mut self, event: Event) -> Result<(), Error> {
        if self.len == self.capacity() {
            return Err(Error::QueueFull);
        }

        self.slots[self.tail] = Some(event);
        self.tail = (self.tail + 1) % self.capacity();
        self.len += 1;
        debug_assert_bounded_len!(self.len, self.capacity());
        Ok(())
    }

    pub(crate) fn dequeue(&mut self) -> Option<Event> {
        if self.len == 0 {
            return None;
        }

        let event = self.slots[self.head].take();
        debug_assert!(event.is_some(), "populated slot between head and tail was empty");
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        event
    }

    /// Drops every queued event, releasing any owned payload copies.
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// The three per-priority rings, serviced strictly highest-first.
pub(crate) struct QueueSet {
    rings: [Ring; Priority::COUNT],
}

impl QueueSet {
    pub(crate) fn new(capacity_per_priority: usize) -> Self {
        Self {
            rings: [
                Ring::new(capacity_per_priority),
                Ring::new(capacity_per_priority),
                Ring::new(capacity_per_priority),
            ],
        }
    }

    /// Enqueues at the event's own priority.
    #[inline]
    pub(crate) fn enqueue(&mut self, event: Event) -> Result<(), Error> {
        self.rings[event.priority.index()].enqueue(event)
    }

    /// Dequeues from the highest-priority non-empty ring.
    pub(crate) fn dequeue_highest(&mut self) -> Option<Event> {
        for priority in Priority::ALL {
            if let Some(event) = self.rings[priority.index()].dequeue() {
                return Some(event);
            }
        }
        None
    }

    #[inline]
    pub(crate) fn total_len(&self) -> usize {
        self.rings.iter().map(Ring::len).sum()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.rings.iter().all(|ring| ring.len() == 0)
    }

    pub(crate) fn clear(&mut self) {
        for ring in &mut self.rings {
            ring.clear();
        }
    }
}
