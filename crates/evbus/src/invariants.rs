//! Debug assertion macros for manager invariants.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so there is
//! zero overhead in release builds.
//!
//! Used by the ring queues, the subscriber table and the dispatcher.

// =============================================================================
// Bounded ring occupancy
// =============================================================================

/// Assert that a ring never holds more events than its capacity.
///
/// **Invariant**: `0 <= len <= capacity`
///
/// Used in: `Ring::enqueue()` / `Ring::dequeue()` after updating `len`
macro_rules! debug_assert_bounded_len {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            $len <= $capacity,
            "ring occupancy {} exceeds capacity {}",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// Queue gauge consistency
// =============================================================================

/// Assert that the `async_queue_current` gauge equals the sum of the three
/// ring lengths, and never exceeds the recorded high-water mark.
///
/// Used in: `State::refresh_queue_gauge()`
macro_rules! debug_assert_gauge_consistent {
    ($gauge:expr, $total:expr, $peak:expr) => {
        debug_assert!(
            $gauge == $total && $gauge <= $peak,
            "queue gauge {} out of step (ring total {}, peak {})",
            $gauge,
            $total,
            $peak
        )
    };
}

// =============================================================================
// Subscriber list occupancy
// =============================================================================

/// Assert that a subscriber list never exceeds its configured bound.
///
/// Used in: `SubscriberList::subscribe()` after insertion
macro_rules! debug_assert_subscribers_bounded {
    ($len:expr, $max:expr) => {
        debug_assert!(
            $len <= $max,
            "subscriber list holds {} entries, bound is {}",
            $len,
            $max
        )
    };
}

// =============================================================================
// Dispatch snapshot ordering
// =============================================================================

/// Assert that a dispatch snapshot is in non-decreasing priority order.
///
/// Used in: `SubscriberList::snapshot()` after the deferred sort ran
macro_rules! debug_assert_snapshot_sorted {
    ($snapshot:expr) => {
        debug_assert!(
            $snapshot.windows(2).all(|w| w[0].priority <= w[1].priority),
            "dispatch snapshot not in priority order"
        )
    };
}

// =============================================================================
// Re-exports for crate-internal use
// =============================================================================

pub(crate) use debug_assert_bounded_len;
pub(crate) use debug_assert_gauge_consistent;
pub(crate) use debug_assert_snapshot_sorted;
pub(crate) use debug_assert_subscribers_bounded;
