//! Integration configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{CompanionImageType, MissionId, ResourceType, TimestampNs};

/// Options of one integration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    /// Shift added to every resource timestamp to express it in body (IMU) time
    pub timestamp_shift_ns: TimestampNs,

    /// Interpolate one pose per shutter line using the camera's line delay
    pub rolling_shutter_compensation: bool,

    /// Poll the cancellation source inside the integration loops
    pub enable_cancellation: bool,

    /// Progress is reported every N items
    pub progress_every: usize,

    /// Companion image lookup order on the frame-attached path
    pub frame_companion_preference: Vec<CompanionImageType>,

    /// Companion image lookup order on the free-running sensor path
    pub sensor_companion_preference: Vec<CompanionImageType>,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            timestamp_shift_ns: 0,
            rolling_shutter_compensation: true,
            enable_cancellation: true,
            progress_every: 20,
            frame_companion_preference: CompanionImageType::frame_preference(),
            sensor_companion_preference: CompanionImageType::sensor_preference(),
        }
    }
}

/// Which attachment model(s) to integrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMode {
    /// Depth maps attached to pose-graph vertex frames
    Frame,
    /// Depth maps of free-running sensors, posed by interpolation
    #[default]
    Sensor,
    /// Frame-attached first, then free-running
    Both,
}

/// Integration job description, loaded from a TOML/JSON job file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationJob {
    /// Map snapshot to integrate (relative to the job file)
    pub map: PathBuf,

    /// Depth map kind to integrate
    pub input_type: ResourceType,

    #[serde(default)]
    pub mode: IntegrationMode,

    /// Missions to integrate (empty = all missions of the map)
    #[serde(default)]
    pub missions: Vec<MissionId>,

    #[serde(default)]
    pub integration: IntegrationConfig,
}
