//! Layered error definitions
//!
//! Categorized by source: precondition / map consistency / interpolation / config.
//! Every variant is unrecoverable for the integration call that produced it;
//! benign outcomes (skips, user abort) are reported through [`crate::IntegrationReport`].

use thiserror::Error;

use crate::{MissionId, ResourceType, SensorId, TimestampNs, VertexId};

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Precondition Errors =====
    /// Integration was requested for a resource type that is not a depth map
    #[error("this depth type is not supported: {resource_type}")]
    UnsupportedInputType { resource_type: ResourceType },

    // ===== Map Consistency Errors =====
    /// Mission id not present in the pose graph
    #[error("mission not found: {mission}")]
    UnknownMission { mission: MissionId },

    /// Vertex id returned by the graph walk but not resolvable
    #[error("vertex not found: {vertex}")]
    UnknownVertex { vertex: VertexId },

    /// Sensor has no extrinsics registered
    #[error("sensor not found or has no extrinsics: {sensor}")]
    UnknownSensor { sensor: SensorId },

    /// Sensor producing depth maps is not a camera rig
    #[error("sensor '{sensor}' associated with depth map resources is not a camera")]
    NotACamera { sensor: SensorId },

    /// Free-running depth sensors must be single-camera rigs
    #[error("camera rig '{sensor}' has {count} cameras, expected exactly 1")]
    UnexpectedCameraCount { sensor: SensorId, count: usize },

    /// Frame index outside the rig
    #[error("frame index {frame_idx} out of bounds for rig '{rig}' with {num_cameras} cameras")]
    InvalidFrameIndex {
        rig: SensorId,
        frame_idx: usize,
        num_cameras: usize,
    },

    /// Resource buffer listed a timestamp the store cannot serve
    #[error("cannot retrieve depth map resource of sensor '{sensor}' in mission {mission} at timestamp {timestamp_ns}ns")]
    MissingDepthMap {
        mission: MissionId,
        sensor: SensorId,
        timestamp_ns: TimestampNs,
    },

    // ===== Interpolation Errors =====
    /// Interpolator returned a different number of poses than requested
    #[error("interpolation returned {actual} poses, expected {expected}")]
    InterpolationLengthMismatch { expected: usize, actual: usize },

    /// Interpolator was asked for a timestamp outside its support
    #[error("timestamp {timestamp_ns}ns outside trajectory range [{min_ns}ns, {max_ns}ns] of mission {mission}")]
    InterpolationOutOfRange {
        mission: MissionId,
        timestamp_ns: TimestampNs,
        min_ns: TimestampNs,
        max_ns: TimestampNs,
    },

    // ===== Integrator Errors =====
    /// Single-pose integrator received a pose list of the wrong size
    #[error("single-pose integrator expects exactly 1 pose, got {count}")]
    PoseCountMismatch { count: usize },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing depth map error
    pub fn missing_depth_map(
        mission: &MissionId,
        sensor: &SensorId,
        timestamp_ns: TimestampNs,
    ) -> Self {
        Self::MissingDepthMap {
            mission: mission.clone(),
            sensor: sensor.clone(),
            timestamp_ns,
        }
    }
}
