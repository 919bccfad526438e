//! evbus - Embeddable Priority Event Manager
//!
//! An in-process publish/subscribe kernel for applications that need
//! decoupled communication between producers and consumers of typed events,
//! with predictable ordering, strict three-level priorities and safe
//! cross-thread delivery. Designed to be small enough for embedded use:
//! all bounds are fixed at construction and nothing reallocates afterwards.
//!
//! # Key Features
//!
//! - Synchronous delivery (handlers run before publish returns) and
//!   asynchronous delivery through bounded per-priority FIFO rings
//! - Strict `High < Normal < Low` service order for both subscribers of one
//!   event and queued events across the ring set
//! - Opt-in payload copying: pass a shared handle through zero-copy, or let
//!   the kernel take an owned byte copy so the producer can reuse its buffer
//! - Coarse-lock concurrency with snapshot dispatch: handlers run outside
//!   the lock and may re-enter the manager freely
//! - A blocking event loop with condvar wakeup and bounded-wait safety net
//!
//! # Example
//!
//! ```
//! use evbus::{Config, EventManager, Payload, Priority};
//! use std::thread;
//!
//! let bus = EventManager::new(Config::default());
//!
//! bus.subscribe_fn(0, Priority::High, |id, payload| {
//!     let value = payload.downcast_ref::<u32>().copied().unwrap_or(0);
//!     println!("event {id}: {value}");
//! })
//! .unwrap();
//!
//! // Serve events on a dedicated thread until stopped.
//! let looper = bus.clone();
//! let consumer = thread::spawn(move || looper.run_loop());
//!
//! bus.publish_async(0, Payload::shared(7u32), Priority::High).unwrap();
//!
//! // Wait for the delivery, then shut the loop down.
//! while bus.stats().events_processed == 0 {
//!     thread::yield_now();
//! }
//! bus.stop_loop();
//! consumer.join().unwrap().unwrap();
//! ```
//!
//! # Limits
//!
//! Priority service is strict, not weighted: a steady stream of high
//! priority events starves lower ones, and producers needing fairness must
//! self-regulate. Dispatch is single-serial per event: a handler that
//! blocks delays every delivery behind it.

mod config;
mod error;
mod event;
mod invariants;
mod manager;
mod queue;
mod stats;
mod subscriber;
mod trace;

pub use config::{Config, COMPACT_CONFIG, HIGH_FANOUT_CONFIG};
pub use error::Error;
pub use event::{DeliveryMode, Event, EventId, Payload, Priority};
pub use manager::EventManager;
pub use stats::Stats;
pub use subscriber::{handler, Handler};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version.
#[inline]
pub fn version() -> &'static str {
    VERSION
}
