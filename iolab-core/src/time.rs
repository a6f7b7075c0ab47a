//! Run timer for frame arrival
//!
//! Every frame is stamped with the elapsed milliseconds since the run
//! started. The packet timing tracker uses the latest stamp to estimate the
//! true sample rate when frame-count timing is disabled.
//!
//! The timer is passed explicitly into ingestion calls instead of living in a
//! global, so tests can drive it deterministically with [`FixedTime`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Milliseconds elapsed since the start of the run
pub type Timestamp = u64;

/// Source of elapsed run time
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the run started
    fn now(&self) -> Timestamp;
}

/// Wall-clock run timer backed by [`Instant`]
#[derive(Debug, Clone)]
pub struct RunTimer {
    started: Instant,
}

impl RunTimer {
    /// Start timing now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Restart from zero
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }
}

impl Default for RunTimer {
    fn default() -> Self {
        Self::start()
    }
}

impl TimeSource for RunTimer {
    fn now(&self) -> Timestamp {
        self.started.elapsed().as_millis() as Timestamp
    }
}

/// Manually driven time source for tests and replays
///
/// Interior mutability lets one instance be shared by several ingesting
/// threads while a driver advances it.
#[derive(Debug, Default)]
pub struct FixedTime {
    elapsed: AtomicU64,
}

impl FixedTime {
    /// Create a timer reading `elapsed` milliseconds
    pub fn new(elapsed: Timestamp) -> Self {
        Self {
            elapsed: AtomicU64::new(elapsed),
        }
    }

    /// Jump to an absolute reading
    pub fn set(&self, elapsed: Timestamp) {
        self.elapsed.store(elapsed, Ordering::Relaxed);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.elapsed.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clone for FixedTime {
    fn clone(&self) -> Self {
        Self::new(self.now())
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.elapsed.load(Ordering::Relaxed)
    }
}
