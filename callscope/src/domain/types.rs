//! Domain types providing compile-time safety and self-documentation
//!
//! Clock readings and elapsed times are both plain nanosecond counts; the
//! newtypes keep one from being passed where the other is expected.

// Display conversions intentionally lose precision
#![allow(clippy::cast_precision_loss)]

use std::fmt;

/// Monotonic clock reading in nanoseconds
///
/// Readings are relative to the origin of the clock that produced them, so
/// only readings from the same clock may be compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Elapsed time from `earlier` to `self`
    ///
    /// Saturates at zero, so a reading taken out of order never yields a
    /// negative or wrapped duration.
    #[must_use]
    pub fn saturating_duration_since(self, earlier: Timestamp) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

/// Duration in nanoseconds
///
/// The unit in which every [`ProfilerFrame`](crate::ProfilerFrame) reports its
/// elapsed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration(pub u64);

impl Duration {
    /// Zero-length duration
    pub const ZERO: Duration = Duration(0);

    /// Convert to nanoseconds (u64)
    #[must_use]
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Convert to microseconds (u64, truncating)
    #[must_use]
    pub fn as_micros(self) -> u64 {
        self.0 / 1_000
    }

    /// Convert to milliseconds (f64)
    #[must_use]
    pub fn as_millis(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Convert to seconds (f64)
    #[must_use]
    pub fn as_seconds(self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Duration(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.as_millis();
        if ms >= 1000.0 {
            write!(f, "{:.2}s", self.as_seconds())
        } else if self.0 >= 1_000_000 {
            write!(f, "{ms:.2}ms")
        } else {
            write!(f, "{}µs", self.as_micros())
        }
    }
}

/// Lifecycle state of a [`Profiler`](crate::Profiler)
///
/// A profiler only moves forward: `Idle` → `Running` → `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfilerState {
    /// Constructed, not yet started
    Idle,
    /// Listening to the host hook and recording calls
    Running,
    /// Finished; the completed calls are frozen
    Stopped,
}

impl fmt::Display for ProfilerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}

/// Lifecycle operation named in [`ProfilerError::IllegalState`](crate::domain::ProfilerError)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Stop,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_since_saturates() {
        let early = Timestamp(100);
        let late = Timestamp(250);
        assert_eq!(late.saturating_duration_since(early), Duration(150));
        assert_eq!(early.saturating_duration_since(late), Duration::ZERO);
    }

    #[test]
    fn test_duration_conversions() {
        let dur = Duration(5_000_000); // 5 milliseconds
        assert_eq!(dur.as_millis(), 5.0);
        assert_eq!(dur.as_seconds(), 0.005);
        assert_eq!(dur.as_micros(), 5_000);
        assert_eq!(dur.as_nanos(), 5_000_000);
    }

    #[test]
    fn test_duration_from_std_clamps() {
        assert_eq!(Duration::from(std::time::Duration::from_micros(3)), Duration(3_000));
        assert_eq!(Duration::from(std::time::Duration::MAX), Duration(u64::MAX));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ProfilerState::Running.to_string(), "running");
        assert_eq!(Operation::Stop.to_string(), "stop");
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(Duration(5_000_000).to_string(), "5.00ms");
        assert_eq!(Duration(1_500_000_000).to_string(), "1.50s");
        assert_eq!(Duration(42_000).to_string(), "42µs");
    }
}
