//! The event manager: subscription bookkeeping, publish entry points, the
//! dispatcher and the blocking event loop.
//!
//! # Locking protocol
//!
//! A single coarse mutex guards the subscriber table, the queue set and the
//! statistics. Every table or queue access happens under it; callback
//! invocation and payload release happen outside it. The dispatcher copies
//! the subscriber list under the lock and invokes the copy after releasing
//! it, so handlers may freely re-enter the manager (subscribe, unsubscribe,
//! publish either way) without deadlocking, and mutations they make never
//! invalidate the iteration in progress. Subscriptions added during a
//! dispatch do not see the event being dispatched.
//!
//! The wakeup condvar pairs with the mutex: `publish_async`, `stop_loop`
//! and the loop itself follow the classic test-under-lock / wait / re-test
//! protocol, with a bounded wait as a safety net against a missed signal.

use crate::invariants::debug_assert_gauge_consistent;
use crate::queue::QueueSet;
use crate::subscriber::SubscriberTable;
use crate::trace::debug_log;
use crate::{
    Config, DeliveryMode, Error, Event, EventId, Handler, Payload, Priority, Stats,
};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bounded wait for the event loop; a missed wakeup costs at most one poll.
const WAKEUP_POLL: Duration = Duration::from_millis(100);

/// Everything the manager lock protects.
struct State {
    table: SubscriberTable,
    queues: QueueSet,
    stats: Stats,
}

impl State {
    /// Re-derives the queue gauge and high-water mark from the rings.
    fn refresh_queue_gauge(&mut self) {
        let total = self.queues.total_len();
        self.stats.async_queue_current = total;
        if total > self.stats.async_queue_max {
            self.stats.async_queue_max = total;
        }
        debug_assert_gauge_consistent!(
            self.stats.async_queue_current,
            total,
            self.stats.async_queue_max
        );
    }
}

struct Inner {
    state: Mutex<State>,
    /// Wakes the event loop when work arrives or shutdown is requested.
    wakeup: Condvar,
    /// Loop liveness flag; cleared by `stop_loop`.
    running: AtomicBool,
    config: Config,
}

/// In-process publish/subscribe event manager.
///
/// Cheap to clone; all clones share one kernel. Producers publish from any
/// thread, a consumer drains with [`process_one`](Self::process_one) /
/// [`process_all`](Self::process_all) or blocks in
/// [`run_loop`](Self::run_loop). Dropping the last clone releases the
/// tables, the queues and every still-queued payload copy; a running loop
/// holds its own clone, so the kernel cannot disappear underneath it.
///
/// # Example
///
/// ```
/// use evbus::{Config, EventManager, Payload, Priority};
///
/// let bus = EventManager::new(Config::default());
/// bus.subscribe_fn(0, Priority::Normal, |id, _payload| {
///     println!("event {id} fired");
/// })
/// .unwrap();
///
/// bus.publish_sync(0, &Payload::Empty).unwrap();
///
/// bus.publish_async(0, Payload::shared(42u32), Priority::High).unwrap();
/// assert_eq!(bus.process_all(), 1);
/// ```
pub struct EventManager {
    inner: Arc<Inner>,
}

impl EventManager {
    /// Creates a manager with empty tables and queues.
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    table: SubscriberTable::new(config.max_event_types, config.max_subscribers),
                    queues: QueueSet::new(config.queue_capacity),
                    stats: Stats::default(),
                }),
                wakeup: Condvar::new(),
                running: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// The configuration the manager was built with.
    #[inline]
    pub fn config(&self) -> Config {
        self.inner.config
    }

    #[inline]
    fn check_event_id(&self, event_id: EventId) -> Result<(), Error> {
        if (event_id as usize) < self.inner.config.max_event_types {
            Ok(())
        } else {
            Err(Error::InvalidParam)
        }
    }

    // ---------------------------------------------------------------------
    // SUBSCRIPTION
    // ---------------------------------------------------------------------

    /// Registers `handler` for `event_id` at the given priority.
    ///
    /// Subscribing the same handle to the same event twice is an idempotent
    /// no-op: the call succeeds and neither priority nor capture state is
    /// altered. A full list returns [`Error::MaxSubscribers`].
    pub fn subscribe(
        &self,
        event_id: EventId,
        handler: Handler,
        priority: Priority,
    ) -> Result<(), Error> {
        self.check_event_id(event_id)?;

        let mut state = self.inner.state.lock();
        let added = state.table.list_mut(event_id).subscribe(
            handler,
            priority,
            self.inner.config.max_subscribers,
        )?;
        if added {
            state.stats.subscribers_total += 1;
            debug_log!("subscribed to event {} ({:?})", event_id, priority);
        }
        Ok(())
    }

    /// Convenience wrapper: subscribes a closure and returns the [`Handler`]
    /// handle needed to unsubscribe it later.
    pub fn subscribe_fn<F>(
        &self,
        event_id: EventId,
        priority: Priority,
        f: F,
    ) -> Result<Handler, Error>
    where
        F: Fn(EventId, &Payload) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(f);
        self.subscribe(event_id, Arc::clone(&handler), priority)?;
        Ok(handler)
    }

    /// Removes the subscription of `handler` for `event_id`.
    pub fn unsubscribe(&self, event_id: EventId, handler: &Handler) -> Result<(), Error> {
        self.check_event_id(event_id)?;

        let mut state = self.inner.state.lock();
        state.table.list_mut(event_id).unsubscribe(handler)?;
        state.stats.subscribers_total -= 1;
        debug_log!("unsubscribed from event {}", event_id);
        Ok(())
    }

    /// Removes every subscription for `event_id`.
    pub fn unsubscribe_all(&self, event_id: EventId) -> Result<(), Error> {
        self.check_event_id(event_id)?;

        let mut state = self.inner.state.lock();
        let removed = state.table.list_mut(event_id).clear();
        state.stats.subscribers_total -= removed;
        debug_log!("unsubscribed all from event {}", event_id);
        Ok(())
    }

    /// Number of subscribers currently registered for `event_id`.
    pub fn subscriber_count(&self, event_id: EventId) -> Result<usize, Error> {
        self.check_event_id(event_id)?;
        Ok(self.inner.state.lock().table.list(event_id).len())
    }

    /// Returns `true` if `event_id` has at least one subscriber.
    pub fn has_subscribers(&self, event_id: EventId) -> bool {
        self.subscriber_count(event_id).map_or(false, |count| count > 0)
    }

    // ---------------------------------------------------------------------
    // PUBLISHING
    // ---------------------------------------------------------------------

    /// Delivers an event to its subscribers on the calling thread, before
    /// returning.
    ///
    /// The payload is borrowed for the duration of the call; no copy is
    /// made. Publishing to an event with no subscribers succeeds and
    /// invokes nothing.
    pub fn publish_sync(&self, event_id: EventId, payload: &Payload) -> Result<(), Error> {
        self.check_event_id(event_id)?;

        self.inner.state.lock().stats.events_published += 1;
        self.dispatch(event_id, payload);
        debug_log!("published sync event {}", event_id);
        Ok(())
    }

    /// Queues an event for later delivery at the given priority.
    ///
    /// The payload is passed through as-is; use
    /// [`publish_async_bytes`](Self::publish_async_bytes) when the producer
    /// needs to reuse its buffer immediately. On [`Error::QueueFull`] the
    /// event (and any payload copy inside it) is dropped and the manager
    /// is left unchanged.
    pub fn publish_async(
        &self,
        event_id: EventId,
        payload: Payload,
        priority: Priority,
    ) -> Result<(), Error> {
        self.check_event_id(event_id)?;
        let event = Event::asynchronous(event_id, payload, priority);

        let mut state = self.inner.state.lock();
        state.queues.enqueue(event)?;
        state.stats.events_published += 1;
        state.refresh_queue_gauge();
        debug_log!("published async event {} ({:?})", event_id, priority);

        // Signalled with the lock held, so the loop cannot miss it between
        // its emptiness test and its wait.
        self.inner.wakeup.notify_one();
        Ok(())
    }

    /// Queues an event carrying an owned copy of `bytes`.
    ///
    /// The copy is taken before the lock, so the caller may mutate or free
    /// its buffer as soon as this returns. An empty slice queues
    /// [`Payload::Empty`].
    pub fn publish_async_bytes(
        &self,
        event_id: EventId,
        bytes: &[u8],
        priority: Priority,
    ) -> Result<(), Error> {
        self.check_event_id(event_id)?;

        let payload = if bytes.is_empty() {
            Payload::Empty
        } else {
            Payload::copy_of(bytes)
        };
        self.publish_async(event_id, payload, priority)
    }

    /// Generic entry point dispatching on the descriptor's mode.
    pub fn publish(&self, event: Event) -> Result<(), Error> {
        match event.mode {
            DeliveryMode::Sync => self.publish_sync(event.id, &event.payload),
            DeliveryMode::Async => self.publish_async(event.id, event.payload, event.priority),
        }
    }

    /// Delivers one event to the subscribers registered at this moment.
    fn dispatch(&self, event_id: EventId, payload: &Payload) {
        let snapshot = {
            let mut state = self.inner.state.lock();
            let list = state.table.list_mut(event_id);
            list.ensure_sorted();
            let snapshot = list.snapshot();
            state.stats.events_processed += 1;
            snapshot
        };

        // Outside the lock: handlers may re-enter the manager freely.
        for subscriber in &snapshot {
            (subscriber.handler)(event_id, payload);
        }
        debug_log!("dispatched event {} to {} subscribers", event_id, snapshot.len());
    }

    // ---------------------------------------------------------------------
    // DRAINING & EVENT LOOP
    // ---------------------------------------------------------------------

    /// Dequeues and delivers the highest-priority pending async event.
    ///
    /// Returns [`Error::QueueEmpty`] when all three rings are empty. Any
    /// owned payload copy attached to the event is released after its
    /// delivery completes.
    pub fn process_one(&self) -> Result<(), Error> {
        let event = {
            let mut state = self.inner.state.lock();
            match state.queues.dequeue_highest() {
                Some(event) => {
                    state.refresh_queue_gauge();
                    event
                }
                None => return Err(Error::QueueEmpty),
            }
        };

        self.dispatch(event.id, &event.payload);
        // `event` drops here, releasing its payload copy exactly once.
        Ok(())
    }

    /// Drains the queue set; returns how many events were delivered.
    pub fn process_all(&self) -> usize {
        let mut processed = 0;
        while self.process_one().is_ok() {
            processed += 1;
        }
        processed
    }

    /// Blocks the calling thread, serving async events until
    /// [`stop_loop`](Self::stop_loop).
    ///
    /// When the queues are empty the thread parks on the wakeup condvar
    /// with a bounded wait, re-testing `pending work or stop requested`
    /// around every park, so neither a lost nor a spurious wakeup can hang
    /// or wedge the loop.
    pub fn run_loop(&self) -> Result<(), Error> {
        self.inner.running.store(true, Ordering::Release);
        debug_log!("event loop started");

        loop {
            let mut state = self.inner.state.lock();
            if !self.inner.running.load(Ordering::Acquire) {
                break;
            }
            if state.queues.is_empty() {
                let _ = self.inner.wakeup.wait_for(&mut state, WAKEUP_POLL);
            }
            drop(state);

            self.process_all();
        }

        debug_log!("event loop stopped");
        Ok(())
    }

    /// Requests loop exit and wakes a parked loop thread.
    ///
    /// Only a loop that has already entered [`run_loop`](Self::run_loop)
    /// observes the request; a loop started afterwards runs until its own
    /// stop.
    pub fn stop_loop(&self) {
        self.inner.running.store(false, Ordering::Release);

        // Taking the lock orders the signal after any in-progress
        // emptiness test in the loop.
        let _state = self.inner.state.lock();
        self.inner.wakeup.notify_all();
        debug_log!("event loop stop requested");
    }

    /// Returns `true` while a loop is between `run_loop` entry and exit.
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    // ---------------------------------------------------------------------
    // QUEUE MAINTENANCE & STATS
    // ---------------------------------------------------------------------

    /// Pending async events across all priorities.
    pub fn queue_size(&self) -> usize {
        self.inner.state.lock().queues.total_len()
    }

    /// Discards every pending async event, releasing owned payload copies.
    pub fn clear_queue(&self) {
        let mut state = self.inner.state.lock();
        state.queues.clear();
        state.stats.async_queue_current = 0;
        debug_log!("async queues cleared");
    }

    /// Snapshot of the counters and gauges.
    pub fn stats(&self) -> Stats {
        self.inner.state.lock().stats
    }

    /// Zeros the counters; `subscribers_total` and `async_queue_current`
    /// are current-state gauges and are preserved.
    pub fn reset_stats(&self) {
        self.inner.state.lock().stats.reset_counters();
    }
}

impl Clone for EventManager {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Handler {
        let counter = Arc::clone(counter);
        Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_publish_sync_invokes_subscriber() {
        let bus = EventManager::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(0, counting_handler(&hits), Priority::Normal).unwrap();

        bus.publish_sync(0, &Payload::Empty).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_publish_sync_without_subscribers_is_ok() {
        let bus = EventManager::default();
        assert_eq!(bus.publish_sync(0, &Payload::Empty), Ok(()));
    }

    #[test]
    fn test_invalid_event_id_rejected_everywhere() {
        let bus = EventManager::new(Config::new(4, 4, 4));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = counting_handler(&hits);

        assert_eq!(
            bus.subscribe(4, Arc::clone(&h), Priority::Normal),
            Err(Error::InvalidParam)
        );
        assert_eq!(bus.unsubscribe(4, &h), Err(Error::InvalidParam));
        assert_eq!(bus.unsubscribe_all(4), Err(Error::InvalidParam));
        assert_eq!(bus.publish_sync(4, &Payload::Empty), Err(Error::InvalidParam));
        assert_eq!(
            bus.publish_async(4, Payload::Empty, Priority::Normal),
            Err(Error::InvalidParam)
        );
        assert_eq!(bus.subscriber_count(4), Err(Error::InvalidParam));
        assert!(!bus.has_subscribers(4));
    }

    #[test]
    fn test_async_is_deferred_until_processed() {
        let bus = EventManager::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(0, counting_handler(&hits), Priority::Normal).unwrap();

        bus.publish_async(0, Payload::Empty, Priority::Normal).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.queue_size(), 1);

        bus.process_one().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.queue_size(), 0);
        assert_eq!(bus.process_one(), Err(Error::QueueEmpty));
    }

    #[test]
    fn test_queue_full_leaves_state_unchanged() {
        let bus = EventManager::new(Config::new(4, 4, 2));

        bus.publish_async(0, Payload::Empty, Priority::Normal).unwrap();
        bus.publish_async(0, Payload::Empty, Priority::Normal).unwrap();
        assert_eq!(
            bus.publish_async(0, Payload::Empty, Priority::Normal),
            Err(Error::QueueFull)
        );

        let stats = bus.stats();
        assert_eq!(stats.events_published, 2);
        assert_eq!(stats.async_queue_current, 2);
        // Other priorities still have room.
        assert_eq!(bus.publish_async(0, Payload::Empty, Priority::High), Ok(()));
    }

    #[test]
    fn test_stats_after_sync_and_async_burst() {
        let bus = EventManager::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(0, counting_handler(&hits), Priority::Normal).unwrap();

        bus.publish_sync(0, &Payload::Empty).unwrap();
        bus.publish_sync(0, &Payload::Empty).unwrap();
        for _ in 0..3 {
            bus.publish_async(0, Payload::Empty, Priority::Normal).unwrap();
        }
        assert_eq!(bus.process_all(), 3);

        let stats = bus.stats();
        assert_eq!(stats.events_published, 5);
        assert_eq!(stats.events_processed, 5);
        assert_eq!(stats.subscribers_total, 1);
        assert_eq!(stats.async_queue_current, 0);
        assert_eq!(stats.async_queue_max, 3);
    }

    #[test]
    fn test_reset_stats_preserves_gauges() {
        let bus = EventManager::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(0, counting_handler(&hits), Priority::Normal).unwrap();
        bus.publish_async(0, Payload::Empty, Priority::Normal).unwrap();

        bus.reset_stats();
        let stats = bus.stats();
        assert_eq!(stats.events_published, 0);
        assert_eq!(stats.events_processed, 0);
        assert_eq!(stats.async_queue_max, 0);
        assert_eq!(stats.subscribers_total, 1);
        assert_eq!(stats.async_queue_current, 1);
    }

    #[test]
    fn test_generic_publish_dispatches_on_mode() {
        let bus = EventManager::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(0, counting_handler(&hits), Priority::Normal).unwrap();

        bus.publish(Event::sync(0, Payload::Empty)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        bus.publish(Event::asynchronous(0, Payload::Empty, Priority::Low)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.process_all(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reentrant_publish_from_handler() {
        let bus = EventManager::default();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe(1, counting_handler(&hits), Priority::Normal).unwrap();

        let reentrant = bus.clone();
        bus.subscribe_fn(0, Priority::Normal, move |_, _| {
            reentrant.publish_sync(1, &Payload::Empty).unwrap();
        })
        .unwrap();

        bus.publish_sync(0, &Payload::Empty).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.stats().events_processed, 2);
    }

    #[test]
    fn test_handler_unsubscribing_itself_during_dispatch() {
        let bus = EventManager::default();
        let hits = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<Handler>>> = Arc::new(Mutex::new(None));
        let bus_inside = bus.clone();
        let slot_inside = Arc::clone(&slot);
        let hits_inside = Arc::clone(&hits);
        let h: Handler = Arc::new(move |_, _| {
            hits_inside.fetch_add(1, Ordering::SeqCst);
            let handle = slot_inside.lock().take();
            if let Some(handle) = handle {
                bus_inside.unsubscribe(0, &handle).unwrap();
            }
        });
        *slot.lock() = Some(Arc::clone(&h));

        bus.subscribe(0, h, Priority::Normal).unwrap();
        bus.publish_sync(0, &Payload::Empty).unwrap();
        bus.publish_sync(0, &Payload::Empty).unwrap();

        // First dispatch delivered once and removed the subscription.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(0), Ok(0));
    }
}
