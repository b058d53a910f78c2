//! Batched pose resolution for free-running sensors.
//!
//! All corrected line timestamps of one sensor are gathered into a single
//! array and resolved with one interpolator call; the result is then sliced
//! back per resource, `lines_per_resource` poses each.

use std::time::{Duration, Instant};

use contracts::{ContractError, MissionId, PoseInterpolator, RigidTransform, TimestampNs};
use tracing::debug;

use crate::rolling_shutter::RollingShutterModel;
use crate::timestamp::TimestampCorrector;

/// Corrected timestamps of every line of every resource of one sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampBatch {
    timestamps: Vec<TimestampNs>,
    lines_per_resource: usize,
}

impl TimestampBatch {
    /// Build from raw resource timestamps in buffer order
    pub fn build(
        raw_timestamps: impl IntoIterator<Item = TimestampNs>,
        corrector: &TimestampCorrector,
        shutter: &RollingShutterModel,
    ) -> Self {
        let raw_timestamps = raw_timestamps.into_iter();
        let offsets = shutter.line_offsets();
        let mut timestamps = Vec::with_capacity(raw_timestamps.size_hint().0 * offsets.len());
        for raw_ns in raw_timestamps {
            corrector.correct_into(raw_ns, &offsets, &mut timestamps);
        }

        Self {
            timestamps,
            lines_per_resource: offsets.len(),
        }
    }

    pub fn timestamps(&self) -> &[TimestampNs] {
        &self.timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn lines_per_resource(&self) -> usize {
        self.lines_per_resource
    }

    pub fn resource_count(&self) -> usize {
        self.timestamps.len() / self.lines_per_resource.max(1)
    }

    /// Line timestamps of resource `idx`
    pub fn resource(&self, idx: usize) -> Option<&[TimestampNs]> {
        let start = idx.checked_mul(self.lines_per_resource)?;
        self.timestamps.get(start..start + self.lines_per_resource)
    }
}

/// Body poses of one batch, sliced per resource
#[derive(Debug, Clone)]
pub struct ResolvedPoses {
    poses_m_b: Vec<RigidTransform>,
    lines_per_resource: usize,
    elapsed: Duration,
}

impl ResolvedPoses {
    pub fn len(&self) -> usize {
        self.poses_m_b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses_m_b.is_empty()
    }

    /// Wall time spent in the interpolator
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Body poses (`T_M_B`) of resource `idx`, one per line
    pub fn resource(&self, idx: usize) -> Option<&[RigidTransform]> {
        let start = idx.checked_mul(self.lines_per_resource)?;
        self.poses_m_b.get(start..start + self.lines_per_resource)
    }

    pub fn iter(&self) -> std::slice::ChunksExact<'_, RigidTransform> {
        self.poses_m_b.chunks_exact(self.lines_per_resource.max(1))
    }
}

/// Single batched call to the trajectory interpolator
pub struct BatchPoseResolver<'a> {
    interpolator: &'a dyn PoseInterpolator,
}

impl<'a> BatchPoseResolver<'a> {
    pub fn new(interpolator: &'a dyn PoseInterpolator) -> Self {
        Self { interpolator }
    }

    /// Body poses for `timestamps`, same length and order.
    ///
    /// # Errors
    /// [`ContractError::InterpolationLengthMismatch`] if the interpolator breaks
    /// its one-pose-per-timestamp contract, or any interpolator error.
    pub fn resolve_batch(
        &self,
        mission: &MissionId,
        timestamps: &[TimestampNs],
    ) -> Result<Vec<RigidTransform>, ContractError> {
        let poses = self.interpolator.interpolate(mission, timestamps)?;
        if poses.len() != timestamps.len() {
            return Err(ContractError::InterpolationLengthMismatch {
                expected: timestamps.len(),
                actual: poses.len(),
            });
        }
        Ok(poses)
    }

    /// Timed resolution of a whole sensor batch
    pub fn resolve(
        &self,
        mission: &MissionId,
        batch: &TimestampBatch,
    ) -> Result<ResolvedPoses, ContractError> {
        debug!(mission = %mission, poses = batch.len(), "Interpolate all poses for this resource type");

        let start = Instant::now();
        let poses_m_b = self.resolve_batch(mission, batch.timestamps())?;
        let elapsed = start.elapsed();

        debug!(
            mission = %mission,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Interpolation done"
        );
        observability::metrics::record_interpolation_batch(batch.len(), elapsed);

        Ok(ResolvedPoses {
            poses_m_b,
            lines_per_resource: batch.lines_per_resource(),
            elapsed,
        })
    }
}
