//! IntegrationReport - integration driver output
//!
//! Counts of what was dispatched and what was skipped, and why.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::SensorId;

/// How an integration call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationOutcome {
    /// Every requested mission was walked to the end
    #[default]
    Completed,
    /// The cancellation source requested an abort; dispatches so far stand
    Aborted,
}

/// Reason a resource or mission was not dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// Frame-attached depth map not captured for this frame
    MissingResource,
    /// Shifted resource timestamp outside the trajectory support
    OutOfTimeRange,
    /// Mission has no camera rig (frame-attached path)
    NoRig,
    /// Mission has no trajectory support (free-running path)
    NoTrajectory,
    /// Mission has no resources of the requested type (free-running path)
    NoResources,
}

impl SkipReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingResource => "missing_resource",
            Self::OutOfTimeRange => "out_of_time_range",
            Self::NoRig => "no_rig",
            Self::NoTrajectory => "no_trajectory",
            Self::NoResources => "no_resources",
        }
    }
}

/// Per-sensor batch statistics of the free-running path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorBatchStats {
    pub resources: usize,
    pub lines_per_resource: usize,
    pub poses_interpolated: usize,
    pub interpolation_time: Duration,
    pub dispatched: usize,
    pub skipped_out_of_range: usize,
}

/// Aggregated result of one integration call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntegrationReport {
    pub outcome: IntegrationOutcome,
    pub missions_processed: usize,
    pub missions_skipped: BTreeMap<SkipReason, usize>,
    pub dispatched: usize,
    pub resources_skipped: BTreeMap<SkipReason, usize>,
    pub with_companion_image: usize,
    pub sensors: BTreeMap<SensorId, SensorBatchStats>,
}

impl IntegrationReport {
    pub fn is_aborted(&self) -> bool {
        self.outcome == IntegrationOutcome::Aborted
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.resources_skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn record_mission_skip(&mut self, reason: SkipReason) {
        *self.missions_skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.resources_skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn missions_skipped(&self, reason: SkipReason) -> usize {
        self.missions_skipped.get(&reason).copied().unwrap_or(0)
    }

    /// Fold a later report into this one (e.g. frame pass followed by sensor pass)
    pub fn merge(&mut self, other: IntegrationReport) {
        if other.is_aborted() {
            self.outcome = IntegrationOutcome::Aborted;
        }
        self.missions_processed += other.missions_processed;
        self.dispatched += other.dispatched;
        self.with_companion_image += other.with_companion_image;
        for (reason, count) in other.missions_skipped {
            *self.missions_skipped.entry(reason).or_insert(0) += count;
        }
        for (reason, count) in other.resources_skipped {
            *self.resources_skipped.entry(reason).or_insert(0) += count;
        }
        self.sensors.extend(other.sensors);
    }
}
