//! Time sources for frame timestamps
//!
//! The profiler reads its clock twice per call (push and pop), so readings
//! must be cheap and monotonic. [`MonotonicClock`] is the production source;
//! [`ManualClock`] lets a host replay recorded timestamps and lets tests pin
//! durations exactly.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::domain::{Duration, Timestamp};

/// Source of monotonic timestamps
pub trait Clock {
    /// Current reading; never smaller than an earlier reading
    fn now(&self) -> Timestamp;
}

/// Wall-clock monotonic time, in nanoseconds since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Timestamp {
        Timestamp(Duration::from(self.origin.elapsed()).as_nanos())
    }
}

/// Clock that only moves when told to
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the profiler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the reading forward by `nanos`
    pub fn advance(&self, nanos: u64) {
        self.now.set(self.now.get().saturating_add(nanos));
    }

    /// Jump to `at`; earlier values are ignored to keep the clock monotonic
    pub fn set(&self, at: Timestamp) {
        self.now.set(self.now.get().max(at.0));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}
