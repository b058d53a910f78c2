//! Nanosecond timestamps and trajectory support ranges.

use serde::{Deserialize, Serialize};

/// Signed 64-bit nanosecond timestamp
pub type TimestampNs = i64;

/// Inclusive time range `[min_ns, max_ns]` in which a trajectory can be interpolated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub min_ns: TimestampNs,
    pub max_ns: TimestampNs,
}

impl TimeRange {
    /// Create a range, swapping the bounds if given in reverse
    pub fn new(a: TimestampNs, b: TimestampNs) -> Self {
        Self {
            min_ns: a.min(b),
            max_ns: a.max(b),
        }
    }

    #[inline]
    pub fn contains(&self, timestamp_ns: TimestampNs) -> bool {
        timestamp_ns >= self.min_ns && timestamp_ns <= self.max_ns
    }

    /// Clamp a timestamp into the range
    #[inline]
    pub fn clamp(&self, timestamp_ns: TimestampNs) -> TimestampNs {
        timestamp_ns.clamp(self.min_ns, self.max_ns)
    }

    pub fn duration_ns(&self) -> i64 {
        self.max_ns - self.min_ns
    }
}
