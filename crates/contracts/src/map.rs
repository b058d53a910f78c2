//! Map collaborator contracts: pose graph, trajectory interpolation,
//! sensor calibration and resource storage.
//!
//! All collaborators are synchronous and read-only for the duration of one
//! integration call.

use serde::{Deserialize, Serialize};

use crate::{
    CameraRig, ContractError, ImageBuffer, MissionId, ResourceBuffer, ResourceKey, ResourceType,
    RigidTransform, SensorId, TimeRange, TimestampNs, VertexId,
};

/// Recording session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,

    /// Mission frame expressed in the global reference frame
    #[serde(default)]
    pub t_g_m: RigidTransform,

    /// Camera rig whose frames are attached to the vertices (if any)
    #[serde(default)]
    pub rig: Option<SensorId>,
}

/// Pose-graph vertex with an exact, previously estimated body pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub mission: MissionId,
    pub timestamp_ns: TimestampNs,

    /// Body pose in the mission frame
    pub t_m_b: RigidTransform,

    /// Number of rig frames captured at this vertex
    #[serde(default)]
    pub num_frames: usize,
}

/// Pose graph store
pub trait PoseGraph {
    fn mission(&self, id: &MissionId) -> Option<&Mission>;

    /// Vertices of a mission in graph order
    fn vertices_along_graph(&self, mission: &MissionId) -> Vec<VertexId>;

    fn vertex(&self, id: &VertexId) -> Option<&Vertex>;
}

/// Batched trajectory interpolation
///
/// The algorithm itself is not part of this contract; implementors must
/// return exactly one body pose (`T_M_B`) per requested timestamp, in order.
pub trait PoseInterpolator {
    /// Support of the trajectory, `None` if the mission has nothing to interpolate
    fn valid_time_range(&self, mission: &MissionId) -> Option<TimeRange>;

    fn interpolate(
        &self,
        mission: &MissionId,
        timestamps_ns: &[TimestampNs],
    ) -> Result<Vec<RigidTransform>, ContractError>;
}

/// Calibration / sensor manager
pub trait SensorManager {
    /// Sensor extrinsics `T_B_S` (sensor frame into body frame)
    fn t_b_s(&self, sensor: &SensorId) -> Option<RigidTransform>;

    /// Camera rig registered under `sensor`, `None` if the sensor is not a camera
    fn camera_rig(&self, sensor: &SensorId) -> Option<&CameraRig>;
}

/// Resource store
pub trait ResourceStore {
    fn lookup(&self, key: &ResourceKey, resource_type: ResourceType) -> Option<ImageBuffer>;

    /// Sensors of a mission that have at least one resource of `resource_type`
    fn sensors_with_resources(
        &self,
        mission: &MissionId,
        resource_type: ResourceType,
    ) -> Vec<SensorId>;

    fn resource_buffer(
        &self,
        mission: &MissionId,
        sensor: &SensorId,
        resource_type: ResourceType,
    ) -> Option<&ResourceBuffer>;
}
