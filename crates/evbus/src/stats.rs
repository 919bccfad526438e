/// Snapshot of manager counters and gauges.
///
/// `events_published`, `events_processed` and `async_queue_max` are
/// monotone counters (between resets); `subscribers_total` and
/// `async_queue_current` are current-state gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Events accepted by a publish entry point (sync and async).
    pub events_published: u64,
    /// Events handed to the dispatcher.
    pub events_processed: u64,
    /// Pending async events across all three priority rings.
    pub async_queue_current: usize,
    /// High-water mark of `async_queue_current`.
    pub async_queue_max: usize,
    /// Currently registered subscribers across all event ids.
    pub subscribers_total: usize,
}

impl Stats {
    /// Zeros the counters while preserving the current-state gauges.
    pub(crate) fn reset_counters(&mut self) {
        self.events_published = 0;
        self.events_processed = 0;
        self.async_queue_max = 0;
    }
}
