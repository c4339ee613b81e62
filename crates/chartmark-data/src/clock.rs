//! Clock seam
//!
//! "Today" decides which dates the daily-history engine may cache (past
//! days are immutable, today is always recomputed), so it must be
//! injectable for tests.

use chrono::NaiveDate;
use std::time::{Duration, Instant};

/// Source of the current calendar date
pub trait Clock: Send + Sync {
    /// Today's date
    fn today(&self) -> NaiveDate;
}

/// Elapsed-time source for budgeted batch work
///
/// The daily-history fill checks a wall-clock budget between iterations;
/// the timer is a seam so that budget exhaustion is deterministic in tests.
pub trait Timer: Send + Sync {
    /// Time elapsed since the timer started
    fn elapsed(&self) -> Duration;
}

/// Timer backed by a monotonic [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct WallTimer {
    started: Instant,
}

impl WallTimer {
    /// Start a timer now
    #[inline]
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Timer for WallTimer {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// System clock (local date)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a system clock
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}
