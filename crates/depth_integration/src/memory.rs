//! In-memory map collaborators.
//!
//! [`InMemoryMap`] serves the pose graph, a vertex-based trajectory
//! interpolator, sensor calibration and resources from plain collections. It
//! is built programmatically or from a serialized [`MapSnapshot`].
//! [`RecordingIntegrator`] captures every dispatch for inspection.

use std::collections::{BTreeMap, HashMap};

use contracts::{
    CameraModel, CameraRig, ContractError, DepthIntegrator, ImageBuffer, Mission, MissionId,
    PoseGraph, PoseInterpolator, ResourceBuffer, ResourceId, ResourceKey, ResourceStore,
    ResourceType, RigCamera, RigidTransform, SensorId, SensorManager, TimeRange, TimestampNs,
    Vertex, VertexId,
};
use serde::{Deserialize, Serialize};

/// Serialized map content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    #[serde(default)]
    pub missions: Vec<Mission>,

    /// Vertices in graph order per mission
    #[serde(default)]
    pub vertices: Vec<Vertex>,

    #[serde(default)]
    pub sensors: Vec<SensorSnapshot>,

    #[serde(default)]
    pub frame_resources: Vec<FrameResourceSnapshot>,

    #[serde(default)]
    pub sensor_resources: Vec<SensorResourceSnapshot>,
}

/// Sensor extrinsics and (for cameras) rig layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub id: SensorId,

    #[serde(default)]
    pub t_b_s: RigidTransform,

    /// Empty for sensors that are not cameras
    #[serde(default)]
    pub cameras: Vec<RigCamera>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResourceSnapshot {
    pub vertex: VertexId,
    pub frame_idx: usize,
    pub resource_type: ResourceType,
    pub image: ImageBuffer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorResourceSnapshot {
    pub mission: MissionId,
    pub sensor: SensorId,
    pub resource_type: ResourceType,
    pub timestamp_ns: TimestampNs,

    /// `None` lists the resource without a stored payload
    #[serde(default)]
    pub image: Option<ImageBuffer>,
}

type SensorTrackKey = (MissionId, SensorId, ResourceType);

/// Map collaborators backed by in-memory collections
#[derive(Debug, Default)]
pub struct InMemoryMap {
    missions: BTreeMap<MissionId, Mission>,
    graph: HashMap<MissionId, Vec<VertexId>>,
    vertices: HashMap<VertexId, Vertex>,
    /// Vertex poses sorted by timestamp
    trajectories: HashMap<MissionId, Vec<(TimestampNs, RigidTransform)>>,
    extrinsics: HashMap<SensorId, RigidTransform>,
    rigs: HashMap<SensorId, CameraRig>,
    frame_resources: HashMap<(VertexId, usize, ResourceType), ImageBuffer>,
    sensor_tracks: HashMap<SensorTrackKey, ResourceBuffer>,
    sensor_resources: HashMap<ResourceId, ImageBuffer>,
}

impl InMemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mission(&mut self, mission: Mission) {
        self.graph.entry(mission.id.clone()).or_default();
        self.missions.insert(mission.id.clone(), mission);
    }

    /// Append a vertex to its mission's graph walk.
    ///
    /// # Errors
    /// [`ContractError::UnknownMission`] if the mission was not added first.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), ContractError> {
        let graph = self
            .graph
            .get_mut(&vertex.mission)
            .ok_or_else(|| ContractError::UnknownMission {
                mission: vertex.mission.clone(),
            })?;
        graph.push(vertex.id.clone());

        let trajectory = self.trajectories.entry(vertex.mission.clone()).or_default();
        let idx = trajectory.partition_point(|(ts, _)| *ts <= vertex.timestamp_ns);
        trajectory.insert(idx, (vertex.timestamp_ns, vertex.t_m_b));

        self.vertices.insert(vertex.id.clone(), vertex);
        Ok(())
    }

    /// Register a sensor; `cameras` is empty for non-camera sensors
    pub fn add_sensor(&mut self, id: impl Into<SensorId>, t_b_s: RigidTransform, cameras: Vec<RigCamera>) {
        let id = id.into();
        self.extrinsics.insert(id.clone(), t_b_s);
        if !cameras.is_empty() {
            self.rigs.insert(id.clone(), CameraRig { id, cameras });
        }
    }

    /// Convenience for a single-camera rig with identity camera extrinsics
    pub fn add_camera(&mut self, t_b_s: RigidTransform, camera: CameraModel) {
        let id = camera.id.clone();
        self.add_sensor(
            id,
            t_b_s,
            vec![RigCamera {
                t_c_rig: RigidTransform::identity(),
                camera,
            }],
        );
    }

    pub fn add_frame_resource(
        &mut self,
        vertex: &VertexId,
        frame_idx: usize,
        resource_type: ResourceType,
        image: ImageBuffer,
    ) {
        self.frame_resources
            .insert((vertex.clone(), frame_idx, resource_type), image);
    }

    /// Store a free-running sensor resource, returning its id
    pub fn add_sensor_resource(
        &mut self,
        mission: &MissionId,
        sensor: &SensorId,
        resource_type: ResourceType,
        timestamp_ns: TimestampNs,
        image: ImageBuffer,
    ) -> ResourceId {
        let id = self.register_sensor_resource(mission, sensor, resource_type, timestamp_ns);
        self.sensor_resources.insert(id.clone(), image);
        id
    }

    /// List a resource in the sensor's buffer without storing a payload
    pub fn register_sensor_resource(
        &mut self,
        mission: &MissionId,
        sensor: &SensorId,
        resource_type: ResourceType,
        timestamp_ns: TimestampNs,
    ) -> ResourceId {
        let id = ResourceId::from(format!("{mission}/{sensor}/{resource_type}/{timestamp_ns}"));
        self.sensor_tracks
            .entry((mission.clone(), sensor.clone(), resource_type))
            .or_default()
            .insert(timestamp_ns, id.clone());
        id
    }

    /// Mission ids in ascending order
    pub fn mission_ids(&self) -> Vec<MissionId> {
        self.missions.keys().cloned().collect()
    }

    pub fn num_vertices(&self, mission: &MissionId) -> usize {
        self.graph.get(mission).map_or(0, Vec::len)
    }

    /// Resource types with sensor tracks in `mission`, with their buffer sizes per sensor
    pub fn sensor_tracks(&self, mission: &MissionId) -> Vec<(SensorId, ResourceType, usize)> {
        let mut tracks: Vec<_> = self
            .sensor_tracks
            .iter()
            .filter(|((m, _, _), _)| m == mission)
            .map(|((_, sensor, resource_type), buffer)| (sensor.clone(), *resource_type, buffer.len()))
            .collect();
        tracks.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
        tracks
    }

    /// Number of frame resources of `resource_type` attached to vertices of `mission`
    pub fn num_frame_resources(&self, mission: &MissionId, resource_type: ResourceType) -> usize {
        self.frame_resources
            .keys()
            .filter(|(vertex, _, rt)| {
                *rt == resource_type
                    && self
                        .vertices
                        .get(vertex)
                        .is_some_and(|v| &v.mission == mission)
            })
            .count()
    }

    fn trajectory(&self, mission: &MissionId) -> Option<&[(TimestampNs, RigidTransform)]> {
        self.trajectories
            .get(mission)
            .map(Vec::as_slice)
            .filter(|t| !t.is_empty())
    }
}

impl TryFrom<MapSnapshot> for InMemoryMap {
    type Error = ContractError;

    fn try_from(snapshot: MapSnapshot) -> Result<Self, Self::Error> {
        let mut map = InMemoryMap::new();

        for mission in snapshot.missions {
            map.add_mission(mission);
        }
        for vertex in snapshot.vertices {
            map.add_vertex(vertex)?;
        }
        for sensor in snapshot.sensors {
            map.add_sensor(sensor.id, sensor.t_b_s, sensor.cameras);
        }
        for resource in snapshot.frame_resources {
            if !map.vertices.contains_key(&resource.vertex) {
                return Err(ContractError::UnknownVertex {
                    vertex: resource.vertex,
                });
            }
            map.add_frame_resource(&resource.vertex, resource.frame_idx, resource.resource_type, resource.image);
        }
        for resource in snapshot.sensor_resources {
            if !map.missions.contains_key(&resource.mission) {
                return Err(ContractError::UnknownMission {
                    mission: resource.mission,
                });
            }
            match resource.image {
                Some(image) => map.add_sensor_resource(
                    &resource.mission,
                    &resource.sensor,
                    resource.resource_type,
                    resource.timestamp_ns,
                    image,
                ),
                None => map.register_sensor_resource(
                    &resource.mission,
                    &resource.sensor,
                    resource.resource_type,
                    resource.timestamp_ns,
                ),
            };
        }

        Ok(map)
    }
}

impl PoseGraph for InMemoryMap {
    fn mission(&self, id: &MissionId) -> Option<&Mission> {
        self.missions.get(id)
    }

    fn vertices_along_graph(&self, mission: &MissionId) -> Vec<VertexId> {
        self.graph.get(mission).cloned().unwrap_or_default()
    }

    fn vertex(&self, id: &VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }
}

impl PoseInterpolator for InMemoryMap {
    fn valid_time_range(&self, mission: &MissionId) -> Option<TimeRange> {
        let trajectory = self.trajectory(mission)?;
        let (first, _) = trajectory.first()?;
        let (last, _) = trajectory.last()?;
        Some(TimeRange::new(*first, *last))
    }

    /// Linear translation and spherical rotation blend between the bracketing vertices
    fn interpolate(
        &self,
        mission: &MissionId,
        timestamps_ns: &[TimestampNs],
    ) -> Result<Vec<RigidTransform>, ContractError> {
        let trajectory = self.trajectory(mission).ok_or_else(|| ContractError::UnknownMission {
            mission: mission.clone(),
        })?;
        let (min_ns, max_ns) = (trajectory[0].0, trajectory[trajectory.len() - 1].0);

        timestamps_ns
            .iter()
            .map(|&timestamp_ns| {
                if timestamp_ns < min_ns || timestamp_ns > max_ns {
                    return Err(ContractError::InterpolationOutOfRange {
                        mission: mission.clone(),
                        timestamp_ns,
                        min_ns,
                        max_ns,
                    });
                }
                let upper = trajectory.partition_point(|(ts, _)| *ts < timestamp_ns);
                let (t1, pose1) = &trajectory[upper];
                if *t1 == timestamp_ns || upper == 0 {
                    return Ok(*pose1);
                }
                let (t0, pose0) = &trajectory[upper - 1];
                let alpha = (timestamp_ns - t0) as f64 / (t1 - t0) as f64;
                Ok(pose0.interpolate(pose1, alpha))
            })
            .collect()
    }
}

impl SensorManager for InMemoryMap {
    fn t_b_s(&self, sensor: &SensorId) -> Option<RigidTransform> {
        self.extrinsics.get(sensor).copied()
    }

    fn camera_rig(&self, sensor: &SensorId) -> Option<&CameraRig> {
        self.rigs.get(sensor)
    }
}

impl ResourceStore for InMemoryMap {
    fn lookup(&self, key: &ResourceKey, resource_type: ResourceType) -> Option<ImageBuffer> {
        match key {
            ResourceKey::Frame { vertex, frame_idx } => self
                .frame_resources
                .get(&(vertex.clone(), *frame_idx, resource_type))
                .cloned(),
            ResourceKey::Sensor {
                mission,
                sensor,
                timestamp_ns,
            } => {
                let id = self.resource_buffer(mission, sensor, resource_type)?.get(*timestamp_ns)?;
                self.sensor_resources.get(id).cloned()
            }
        }
    }

    fn sensors_with_resources(&self, mission: &MissionId, resource_type: ResourceType) -> Vec<SensorId> {
        let mut sensors: Vec<_> = self
            .sensor_tracks
            .iter()
            .filter(|((m, _, rt), buffer)| m == mission && *rt == resource_type && !buffer.is_empty())
            .map(|((_, sensor, _), _)| sensor.clone())
            .collect();
        sensors.sort();
        sensors
    }

    fn resource_buffer(
        &self,
        mission: &MissionId,
        sensor: &SensorId,
        resource_type: ResourceType,
    ) -> Option<&ResourceBuffer> {
        self.sensor_tracks
            .get(&(mission.clone(), sensor.clone(), resource_type))
    }
}

/// One call received by [`RecordingIntegrator`]
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub poses: Vec<RigidTransform>,
    pub depth_map: ImageBuffer,
    pub image: Option<ImageBuffer>,
    pub camera: SensorId,
}

/// Integrator that records every dispatch
#[derive(Debug, Default)]
pub struct RecordingIntegrator {
    pub dispatches: Vec<Dispatch>,
}

impl RecordingIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dispatches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty()
    }
}

impl DepthIntegrator for RecordingIntegrator {
    fn integrate(
        &mut self,
        poses: &[RigidTransform],
        depth_map: &ImageBuffer,
        image: Option<&ImageBuffer>,
        camera: &CameraModel,
    ) -> Result<(), ContractError> {
        self.dispatches.push(Dispatch {
            poses: poses.to_vec(),
            depth_map: depth_map.clone(),
            image: image.cloned(),
            camera: camera.id.clone(),
        });
        Ok(())
    }
}
