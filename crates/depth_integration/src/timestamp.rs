//! Resource-to-body timestamp correction.
//!
//! A raw resource timestamp is shifted by a fixed global offset, spread over
//! the shutter lines and clamped into the trajectory support so every value
//! can be handed to the interpolator. Whether the resource itself is usable is
//! decided separately on the shifted, unclamped timestamp.

use contracts::{TimeRange, TimestampNs};

/// Applies the global shift and line offsets to raw resource timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampCorrector {
    shift_ns: i64,
    range: TimeRange,
}

impl TimestampCorrector {
    pub fn new(shift_ns: i64, range: TimeRange) -> Self {
        Self { shift_ns, range }
    }

    pub fn shift_ns(&self) -> i64 {
        self.shift_ns
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Raw timestamp with the global shift only (no line offset, no clamp)
    pub fn shifted(&self, raw_ns: TimestampNs) -> TimestampNs {
        raw_ns.saturating_add(self.shift_ns)
    }

    /// Whether a resource captured at `raw_ns` lies inside the trajectory support
    pub fn is_in_range(&self, raw_ns: TimestampNs) -> bool {
        self.range.contains(self.shifted(raw_ns))
    }

    /// One clamped timestamp per line offset
    pub fn correct(&self, raw_ns: TimestampNs, line_offsets: &[i64]) -> Vec<TimestampNs> {
        let mut out = Vec::with_capacity(line_offsets.len());
        self.correct_into(raw_ns, line_offsets, &mut out);
        out
    }

    /// Appends the corrected timestamps of one resource to `out`
    pub fn correct_into(&self, raw_ns: TimestampNs, line_offsets: &[i64], out: &mut Vec<TimestampNs>) {
        let shifted = self.shifted(raw_ns);
        out.extend(
            line_offsets
                .iter()
                .map(|offset| self.range.clamp(shifted.saturating_add(*offset))),
        );
    }
}

/// `clamp(raw + shift + offset, min, max)` for every offset
pub fn correct(
    raw_ns: TimestampNs,
    shift_ns: i64,
    line_offsets: &[i64],
    min_ns: TimestampNs,
    max_ns: TimestampNs,
) -> Vec<TimestampNs> {
    TimestampCorrector::new(shift_ns, TimeRange::new(min_ns, max_ns)).correct(raw_ns, line_offsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rolling_shutter::line_offsets;
    use rand::Rng;

    #[test]
    fn test_correct_inside_range() {
        assert_eq!(correct(500, 0, &[0, 100, 200], 0, 1000), vec![500, 600, 700]);
    }

    #[test]
    fn test_correct_applies_shift() {
        assert_eq!(correct(500, -200, &[0], 0, 1000), vec![300]);
    }

    #[test]
    fn test_correct_clamps_lines_past_the_end() {
        assert_eq!(correct(950, 0, &[0, 100, 200], 0, 1000), vec![950, 1000, 1000]);
        assert_eq!(correct(-50, 0, &[0, 100], 0, 1000), vec![0, 50]);
    }

    #[test]
    fn test_range_check_ignores_line_offsets() {
        let corrector = TimestampCorrector::new(0, TimeRange::new(0, 1000));
        // last line lands after max_ns, but the resource still counts as in range
        assert!(corrector.is_in_range(950));
        assert!(!corrector.is_in_range(2000));
        assert!(corrector.is_in_range(1000));
        assert!(!corrector.is_in_range(-1));
    }

    #[test]
    fn test_correct_always_within_range() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let min_ns = rng.random_range(-1_000_000..1_000_000i64);
            let max_ns = min_ns + rng.random_range(0..2_000_000i64);
            let raw = rng.random_range(-5_000_000..5_000_000i64);
            let shift = rng.random_range(-1_000_000..1_000_000i64);
            let offsets = line_offsets(rng.random_range(1..64), rng.random_range(0..50_000));

            let corrected = correct(raw, shift, &offsets, min_ns, max_ns);
            assert_eq!(corrected.len(), offsets.len());
            for ts in &corrected {
                assert!((min_ns..=max_ns).contains(ts));
            }
            // idempotent under re-clamping
            let again: Vec<_> = corrected.iter().map(|ts| (*ts).clamp(min_ns, max_ns)).collect();
            assert_eq!(again, corrected);
        }
    }
}
