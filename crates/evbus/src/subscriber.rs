//! Per-event subscriber lists with deferred stable priority ordering.

use crate::invariants::{debug_assert_snapshot_sorted, debug_assert_subscribers_bounded};
use crate::{Error, EventId, Payload, Priority};
use std::sync::Arc;

/// Subscriber callback.
///
/// Invoked with the event id and the payload for every delivery. Capture
/// whatever context the callback needs in the closure; the kernel never
/// interprets it. The `Arc` allocation is the subscription identity:
/// subscribing the same handle twice is an idempotent no-op, and
/// [`EventManager::unsubscribe`](crate::EventManager::unsubscribe) removes
/// by that identity.
pub type Handler = Arc<dyn Fn(EventId, &Payload) + Send + Sync>;

/// Wraps a closure into a [`Handler`].
///
/// Keep the returned handle if you intend to unsubscribe later.
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(EventId, &Payload) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handler identity: the allocation address. The vtable half of the fat
/// pointer is deliberately ignored: it is not stable across codegen units.
#[inline]
fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// One registered subscription.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub(crate) handler: Handler,
    pub(crate) priority: Priority,
}

/// Subscribers of a single event id.
///
/// A dense vector bounded by `max_subscribers`. Ordering is deferred: the
/// list is appended to in subscription order and only sorted (stably, by
/// priority) when the next dispatch takes a snapshot. Removal preserves
/// order, so an already-sorted list stays sorted.
pub(crate) struct SubscriberList {
    entries: Vec<Subscriber>,
    sorted: bool,
}

impl SubscriberList {
    pub(crate) fn new(max_subscribers: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_subscribers),
            sorted: true,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Registers a handler. Duplicate registration of the same handle is a
    /// no-op success; a full list is rejected with `MaxSubscribers`.
    ///
    /// Returns `true` if a new entry was added.
    pub(crate) fn subscribe(
        &mut self,
        handler: Handler,
        priority: Priority,
        max_subscribers: usize,
    ) -> Result<bool, Error> {
        if self.entries.iter().any(|s| same_handler(&s.handler, &handler)) {
            return Ok(false);
        }
        if self.entries.len() >= max_subscribers {
            return Err(Error::MaxSubscribers);
        }

        self.entries.push(Subscriber { handler, priority });
        self.sorted = false;
        debug_assert_subscribers_bounded!(self.entries.len(), max_subscribers);
        Ok(true)
    }

    /// Removes the subscription for `handler`, preserving the order of the
    /// remaining entries.
    pub(crate) fn unsubscribe(&mut self, handler: &Handler) -> Result<(), Error> {
        match self.entries.iter().position(|s| same_handler(&s.handler, handler)) {
            Some(idx) => {
                self.entries.remove(idx);
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    /// Removes every subscription; returns how many were removed.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.sorted = true;
        removed
    }

    /// Sorts the list by priority if a subscribe invalidated the order.
    ///
    /// `sort_by_key` is stable, so subscribers of equal priority keep their
    /// subscription order.
    pub(crate) fn ensure_sorted(&mut self) {
        if !self.sorted && self.entries.len() > 1 {
            self.entries.sort_by_key(|s| s.priority);
        }
        self.sorted = true;
    }

    /// Copies the current subscribers for lock-free invocation.
    ///
    /// Callers must run `ensure_sorted` first; the snapshot is handed out in
    /// service order.
    pub(crate) fn snapshot(&self) -> Vec<Subscriber> {
        debug_assert!(self.sorted, "snapshot taken before deferred sort");
        let snapshot = self.entries.clone();
        debug_assert_snapshot_sorted!(snapshot);
        snapshot
    }
}

/// All subscriber lists, indexed by event id.
pub(crate) struct SubscriberTable {
    lists: Box<[SubscriberList]>,
}

impl SubscriberTable {
    pub(crate) fn new(max_event_types: usize, max_subscribers: usize) -> Self {
        let lists = (0..max_event_types)
            .map(|_| SubscriberList::new(max_subscribers))
            .collect();
        Self { lists }
    }

    /// The list for `event_id`. The caller validates the id at the API
    /// boundary.
    #[inline]
    pub(crate) fn list_mut(&mut self, event_id: EventId) -> &mut SubscriberList {
        &mut self.lists[event_id as usize]
    }

    #[inline]
    pub(crate) fn list(&self, event_id: EventId) -> &SubscriberList {
        &self.lists[event_id as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        handler(|_, _| {})
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut list = SubscriberList::new(4);
        let h = noop();

        assert_eq!(list.subscribe(Arc::clone(&h), Priority::Normal, 4), Ok(true));
        assert_eq!(list.len(), 1);

        assert_eq!(list.unsubscribe(&h), Ok(()));
        assert_eq!(list.len(), 0);
        assert_eq!(list.unsubscribe(&h), Err(Error::NotFound));
    }

    #[test]
    fn test_duplicate_subscribe_is_noop() {
        let mut list = SubscriberList::new(4);
        let h = noop();

        assert_eq!(list.subscribe(Arc::clone(&h), Priority::Normal, 4), Ok(true));
        // Same handle again: accepted, nothing added, priority untouched.
        assert_eq!(list.subscribe(Arc::clone(&h), Priority::High, 4), Ok(false));
        assert_eq!(list.len(), 1);

        list.ensure_sorted();
        assert_eq!(list.snapshot()[0].priority, Priority::Normal);
    }

    #[test]
    fn test_full_list_rejected() {
        let mut list = SubscriberList::new(2);
        assert!(list.subscribe(noop(), Priority::Normal, 2).is_ok());
        assert!(list.subscribe(noop(), Priority::Normal, 2).is_ok());
        assert_eq!(
            list.subscribe(noop(), Priority::Normal, 2),
            Err(Error::MaxSubscribers)
        );
    }

    #[test]
    fn test_sort_is_stable_within_priority() {
        let mut list = SubscriberList::new(8);
        let first = noop();
        let second = noop();
        let urgent = noop();

        list.subscribe(Arc::clone(&first), Priority::Normal, 8).unwrap();
        list.subscribe(Arc::clone(&second), Priority::Normal, 8).unwrap();
        list.subscribe(Arc::clone(&urgent), Priority::High, 8).unwrap();
        list.ensure_sorted();

        let snapshot = list.snapshot();
        assert!(same_handler(&snapshot[0].handler, &urgent));
        assert!(same_handler(&snapshot[1].handler, &first));
        assert!(same_handler(&snapshot[2].handler, &second));
    }

    #[test]
    fn test_removal_keeps_sorted_order() {
        let mut list = SubscriberList::new(8);
        let high = noop();
        let normal = noop();
        let low = noop();

        list.subscribe(Arc::clone(&low), Priority::Low, 8).unwrap();
        list.subscribe(Arc::clone(&high), Priority::High, 8).unwrap();
        list.subscribe(Arc::clone(&normal), Priority::Normal, 8).unwrap();
        list.ensure_sorted();

        list.unsubscribe(&normal).unwrap();
        list.ensure_sorted();

        let snapshot = list.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(same_handler(&snapshot[0].handler, &high));
        assert!(same_handler(&snapshot[1].handler, &low));
    }
}
