/// Configuration for an [`EventManager`](crate::EventManager).
///
/// All bounds are fixed at construction; the manager never reallocates its
/// tables or queues afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Upper bound on distinct event ids (default: 64)
    pub max_event_types: usize,
    /// Upper bound on subscribers per event id (default: 16)
    pub max_subscribers: usize,
    /// Async ring capacity *per priority*; total async capacity is 3x this (default: 32)
    pub queue_capacity: usize,
}

impl Config {
    /// Creates a new configuration with custom bounds.
    ///
    /// # Panics
    ///
    /// Panics if `max_event_types` is 0 or greater than 4096, if
    /// `max_subscribers` is 0 or greater than 1024, or if `queue_capacity`
    /// is 0 or greater than 65536. The caps keep a misconfigured manager
    /// from pinning large amounts of memory on small targets.
    pub const fn new(max_event_types: usize, max_subscribers: usize, queue_capacity: usize) -> Self {
        assert!(
            max_event_types > 0 && max_event_types <= 4096,
            "max_event_types must be between 1 and 4096"
        );
        assert!(
            max_subscribers > 0 && max_subscribers <= 1024,
            "max_subscribers must be between 1 and 1024"
        );
        assert!(
            queue_capacity > 0 && queue_capacity <= 65536,
            "queue_capacity must be between 1 and 65536"
        );

        Self {
            max_event_types,
            max_subscribers,
            queue_capacity,
        }
    }

    /// Returns the total async capacity across all three priorities.
    #[inline]
    pub const fn total_queue_capacity(&self) -> usize {
        self.queue_capacity * crate::Priority::COUNT
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_event_types: 64,
            max_subscribers: 16,
            queue_capacity: 32,
        }
    }
}

/// Compact configuration for small targets (16 event ids, 4 subscribers, 8-slot rings)
pub const COMPACT_CONFIG: Config = Config::new(16, 4, 8);

/// High fan-out configuration (256 event ids, 64 subscribers, 128-slot rings)
pub const HIGH_FANOUT_CONFIG: Config = Config::new(256, 64, 128);
