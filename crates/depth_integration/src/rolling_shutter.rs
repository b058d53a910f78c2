//! Rolling-shutter line timing.

use contracts::CameraModel;

/// Per-line exposure timing of a depth sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingShutterModel {
    line_count: u32,
    line_delay_ns: i64,
}

impl RollingShutterModel {
    /// Single line, no per-line correction
    pub const fn global_shutter() -> Self {
        Self {
            line_count: 1,
            line_delay_ns: 0,
        }
    }

    pub fn new(line_count: u32, line_delay_ns: i64) -> Self {
        Self {
            line_count: line_count.max(1),
            line_delay_ns,
        }
    }

    /// Timing of `camera`, or global shutter when compensation is disabled
    pub fn from_camera(camera: &CameraModel, compensation_enabled: bool) -> Self {
        if compensation_enabled {
            Self::new(camera.line_count, camera.line_delay_ns)
        } else {
            Self::global_shutter()
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_count as usize
    }

    pub fn line_delay_ns(&self) -> i64 {
        self.line_delay_ns
    }

    pub fn is_rolling_shutter(&self) -> bool {
        self.line_count > 1
    }

    /// Offsets `0, d, 2d, ...`, one per line
    pub fn line_offsets(&self) -> Vec<i64> {
        line_offsets(self.line_count, self.line_delay_ns)
    }
}

impl Default for RollingShutterModel {
    fn default() -> Self {
        Self::global_shutter()
    }
}

/// Exposure offset of every line relative to the first one.
///
/// Returns exactly `line_count` values; `line_count == 1` yields `[0]`.
pub fn line_offsets(line_count: u32, line_delay_ns: i64) -> Vec<i64> {
    (0..i64::from(line_count))
        .map(|line_idx| line_idx.saturating_mul(line_delay_ns))
        .collect()
}
