//! Integration driver.
//!
//! Walks missions and hands posed depth maps to a [`DepthIntegrator`]:
//!
//! - frame-attached path: one exact pose per vertex frame, no interpolation
//! - free-running path: per-sensor batched interpolation, one pose per shutter line
//!
//! Benign conditions (missing frame resource, out-of-range resource, mission
//! without rig or trajectory) are skipped and counted in the
//! [`IntegrationReport`]. Contract violations unwind the whole call as
//! [`ContractError`]. A cancellation request ends the call with
//! [`IntegrationOutcome::Aborted`]; dispatches already issued stand.

use std::slice;

use contracts::{
    CameraRig, CancellationSource, ContractError, DepthIntegrator, DepthMapInputType,
    IntegrationConfig, IntegrationMode, IntegrationOutcome, IntegrationReport, Mission, MissionId,
    PoseGraph, PoseInterpolator, ResourceBuffer, ResourceKey, ResourceStore, ResourceType,
    SensorBatchStats, SensorId, SensorManager, SkipReason, TimeRange,
};
use observability::metrics as obs;
use tracing::{debug, info, instrument, trace, warn};

use crate::batch::{BatchPoseResolver, TimestampBatch};
use crate::cancel::CancellationGate;
use crate::companion::CompanionImageResolver;
use crate::compose::TransformComposer;
use crate::progress::ProgressReporter;
use crate::rolling_shutter::RollingShutterModel;
use crate::timestamp::TimestampCorrector;

const FRAME_PATH: &str = "frame";
const SENSOR_PATH: &str = "sensor";

/// Read-only map collaborators for one integration call
#[derive(Clone, Copy)]
pub struct IntegrationContext<'a> {
    pub pose_graph: &'a dyn PoseGraph,
    pub interpolator: &'a dyn PoseInterpolator,
    pub sensors: &'a dyn SensorManager,
    pub resources: &'a dyn ResourceStore,
}

impl<'a> IntegrationContext<'a> {
    /// All collaborators served by one map object
    pub fn from_map<M>(map: &'a M) -> Self
    where
        M: PoseGraph + PoseInterpolator + SensorManager + ResourceStore,
    {
        Self {
            pose_graph: map,
            interpolator: map,
            sensors: map,
            resources: map,
        }
    }
}

/// Per-mission state of the free-running path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissionState {
    AwaitingTrajectory,
    Streaming(TimeRange),
    Done,
    Aborted,
}

/// How a loop over items ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopEnd {
    Exhausted,
    Aborted,
}

/// Top-level control flow of depth map integration
pub struct IntegrationDriver<'a> {
    context: IntegrationContext<'a>,
    config: IntegrationConfig,
    cancellation: Option<&'a dyn CancellationSource>,
}

impl<'a> IntegrationDriver<'a> {
    pub fn new(context: IntegrationContext<'a>, config: IntegrationConfig) -> Self {
        Self {
            context,
            config,
            cancellation: None,
        }
    }

    /// Poll `source` inside the loops (if cancellation is enabled in the config)
    #[must_use]
    pub fn with_cancellation(mut self, source: &'a dyn CancellationSource) -> Self {
        self.cancellation = Some(source);
        self
    }

    pub fn config(&self) -> &IntegrationConfig {
        &self.config
    }

    fn gate(&self) -> CancellationGate<'a> {
        CancellationGate::new(self.cancellation, self.config.enable_cancellation)
    }

    /// Run the path(s) selected by `mode`; frame-attached first for [`IntegrationMode::Both`]
    pub fn run<I: DepthIntegrator>(
        &self,
        mode: IntegrationMode,
        missions: &[MissionId],
        input_type: ResourceType,
        mut integrator: I,
    ) -> Result<IntegrationReport, ContractError> {
        match mode {
            IntegrationMode::Frame => self.integrate_frame_depth_maps(missions, input_type, integrator),
            IntegrationMode::Sensor => self.integrate_sensor_depth_maps(missions, input_type, integrator),
            IntegrationMode::Both => {
                let mut report = self.integrate_frame_depth_maps(missions, input_type, &mut integrator)?;
                if !report.is_aborted() {
                    report.merge(self.integrate_sensor_depth_maps(missions, input_type, &mut integrator)?);
                }
                Ok(report)
            }
        }
    }

    /// Integrate depth maps attached to the rig frames of pose-graph vertices
    ///
    /// # Errors
    /// Unsupported `input_type` (before any resource is examined), unknown
    /// mission / vertex / sensor, invalid rig frame index or integrator failure.
    #[instrument(
        level = "info",
        name = "integrate_frame_depth_maps",
        skip_all,
        fields(missions = missions.len(), input_type = %input_type)
    )]
    pub fn integrate_frame_depth_maps<I: DepthIntegrator>(
        &self,
        missions: &[MissionId],
        input_type: ResourceType,
        mut integrator: I,
    ) -> Result<IntegrationReport, ContractError> {
        let input = DepthMapInputType::try_from(input_type)?;
        let gate = self.gate();
        let mut report = IntegrationReport::default();

        for mission_id in missions {
            let mission = self.mission(mission_id)?;
            let Some(rig_id) = &mission.rig else {
                info!(mission = %mission_id, "Mission has no camera rig, hence no such resources");
                report.record_mission_skip(SkipReason::NoRig);
                obs::record_mission_skipped(FRAME_PATH, SkipReason::NoRig);
                continue;
            };
            info!(mission = %mission_id, rig = %rig_id, "Integrating mission");

            let rig = self.camera_rig(rig_id)?;
            let t_b_rig = self.t_b_s(rig_id)?;

            let end = self.integrate_mission_frames(
                mission,
                rig,
                &t_b_rig,
                input,
                &gate,
                &mut integrator,
                &mut report,
            )?;
            if end == LoopEnd::Aborted {
                return Ok(abort(report, FRAME_PATH));
            }
            report.missions_processed += 1;
        }

        info!(dispatched = report.dispatched, "Frame depth map integration done");
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn integrate_mission_frames<I: DepthIntegrator>(
        &self,
        mission: &Mission,
        rig: &CameraRig,
        t_b_rig: &contracts::RigidTransform,
        input: DepthMapInputType,
        gate: &CancellationGate<'_>,
        integrator: &mut I,
        report: &mut IntegrationReport,
    ) -> Result<LoopEnd, ContractError> {
        let resources = self.context.resources;
        let companions = CompanionImageResolver::new(resources);
        let vertex_ids = self.context.pose_graph.vertices_along_graph(&mission.id);
        let mut progress = ProgressReporter::new("vertices", vertex_ids.len(), self.config.progress_every);

        for vertex_id in &vertex_ids {
            if let Some(p) = progress.update() {
                obs::record_progress("vertices", p.done, p.total);
            }
            if gate.should_abort() {
                return Ok(LoopEnd::Aborted);
            }

            let vertex = self
                .context
                .pose_graph
                .vertex(vertex_id)
                .ok_or_else(|| ContractError::UnknownVertex {
                    vertex: vertex_id.clone(),
                })?;

            for frame_idx in 0..vertex.num_frames {
                trace!(vertex = %vertex_id, frame_idx, "Processing frame");

                let composer = TransformComposer::new(mission.t_g_m, *t_b_rig, rig.t_rig_c(frame_idx)?);
                let t_g_c = composer.t_g_s(&vertex.t_m_b);

                let key = ResourceKey::Frame {
                    vertex: vertex_id.clone(),
                    frame_idx,
                };
                let Some(depth_map) = resources.lookup(&key, input.resource_type()) else {
                    trace!(key = %key, "Nothing to integrate");
                    report.record_skip(SkipReason::MissingResource);
                    obs::record_resource_skipped(FRAME_PATH, SkipReason::MissingResource);
                    continue;
                };
                let companion = companions.resolve(&key, &self.config.frame_companion_preference);
                let camera = rig.camera(frame_idx)?;

                integrator.integrate(
                    slice::from_ref(&t_g_c),
                    &depth_map,
                    companion.as_ref().map(|c| &c.image),
                    camera,
                )?;

                report.dispatched += 1;
                if companion.is_some() {
                    report.with_companion_image += 1;
                }
                obs::record_depth_map_dispatched(FRAME_PATH, companion.is_some());
            }
        }

        progress.finish();
        Ok(LoopEnd::Exhausted)
    }

    /// Integrate depth maps of free-running sensors, posed by batched interpolation
    ///
    /// # Errors
    /// Unsupported `input_type` (before any resource is examined), unknown
    /// mission or sensor, a depth sensor that is not a single-camera rig,
    /// interpolation failure or length mismatch, a depth map listed in the
    /// resource buffer but missing from the store, or integrator failure.
    #[instrument(
        level = "info",
        name = "integrate_sensor_depth_maps",
        skip_all,
        fields(missions = missions.len(), input_type = %input_type)
    )]
    pub fn integrate_sensor_depth_maps<I: DepthIntegrator>(
        &self,
        missions: &[MissionId],
        input_type: ResourceType,
        mut integrator: I,
    ) -> Result<IntegrationReport, ContractError> {
        let input = DepthMapInputType::try_from(input_type)?;
        let gate = self.gate();
        let mut report = IntegrationReport::default();

        for mission_id in missions {
            info!(mission = %mission_id, "Integrating mission");
            let mission = self.mission(mission_id)?;

            let mut state = MissionState::AwaitingTrajectory;
            loop {
                state = match state {
                    MissionState::AwaitingTrajectory => {
                        match self.context.interpolator.valid_time_range(mission_id) {
                            Some(range) => {
                                info!(
                                    mission = %mission_id,
                                    min_ns = range.min_ns,
                                    max_ns = range.max_ns,
                                    "All resources within this time range will be integrated"
                                );
                                MissionState::Streaming(range)
                            }
                            None => {
                                info!(
                                    mission = %mission_id,
                                    "No trajectory to interpolate optional sensor poses, skipping mission"
                                );
                                report.record_mission_skip(SkipReason::NoTrajectory);
                                obs::record_mission_skipped(SENSOR_PATH, SkipReason::NoTrajectory);
                                MissionState::Done
                            }
                        }
                    }
                    MissionState::Streaming(range) => {
                        match self.integrate_mission_sensors(
                            mission,
                            range,
                            input,
                            &gate,
                            &mut integrator,
                            &mut report,
                        )? {
                            LoopEnd::Exhausted => {
                                report.missions_processed += 1;
                                MissionState::Done
                            }
                            LoopEnd::Aborted => MissionState::Aborted,
                        }
                    }
                    MissionState::Done => break,
                    MissionState::Aborted => return Ok(abort(report, SENSOR_PATH)),
                };
            }
        }

        info!(dispatched = report.dispatched, "Sensor depth map integration done");
        Ok(report)
    }

    fn integrate_mission_sensors<I: DepthIntegrator>(
        &self,
        mission: &Mission,
        range: TimeRange,
        input: DepthMapInputType,
        gate: &CancellationGate<'_>,
        integrator: &mut I,
        report: &mut IntegrationReport,
    ) -> Result<LoopEnd, ContractError> {
        let resource_type = input.resource_type();
        let mut sensor_ids = self
            .context
            .resources
            .sensors_with_resources(&mission.id, resource_type);
        if sensor_ids.is_empty() {
            debug!(mission = %mission.id, "No sensor has resources of this depth type");
            report.record_mission_skip(SkipReason::NoResources);
            obs::record_mission_skipped(SENSOR_PATH, SkipReason::NoResources);
            return Ok(LoopEnd::Exhausted);
        }
        sensor_ids.sort();
        sensor_ids.dedup();
        debug!(
            mission = %mission.id,
            sensors = sensor_ids.len(),
            "Found sensors that have resources of this depth type"
        );

        for sensor_id in &sensor_ids {
            let Some(buffer) = self
                .context
                .resources
                .resource_buffer(&mission.id, sensor_id, resource_type)
            else {
                continue;
            };
            if self.integrate_sensor(mission, sensor_id, buffer, range, input, gate, integrator, report)?
                == LoopEnd::Aborted
            {
                return Ok(LoopEnd::Aborted);
            }
        }
        Ok(LoopEnd::Exhausted)
    }

    #[allow(clippy::too_many_arguments)]
    #[instrument(level = "debug", skip_all, fields(mission = %mission.id, sensor = %sensor_id))]
    fn integrate_sensor<I: DepthIntegrator>(
        &self,
        mission: &Mission,
        sensor_id: &SensorId,
        buffer: &ResourceBuffer,
        range: TimeRange,
        input: DepthMapInputType,
        gate: &CancellationGate<'_>,
        integrator: &mut I,
        report: &mut IntegrationReport,
    ) -> Result<LoopEnd, ContractError> {
        let resources = self.context.resources;
        let resource_type = input.resource_type();

        let t_b_rig = self.t_b_s(sensor_id)?;
        let rig = self
            .context
            .sensors
            .camera_rig(sensor_id)
            .ok_or_else(|| ContractError::NotACamera {
                sensor: sensor_id.clone(),
            })?;
        if rig.num_cameras() != 1 {
            return Err(ContractError::UnexpectedCameraCount {
                sensor: sensor_id.clone(),
                count: rig.num_cameras(),
            });
        }
        let camera = rig.camera(0)?;
        let composer = TransformComposer::new(mission.t_g_m, t_b_rig, rig.t_rig_c(0)?);
        let shutter = RollingShutterModel::from_camera(camera, self.config.rolling_shutter_compensation);

        debug!(
            resources = buffer.len(),
            rolling_shutter = if shutter.is_rolling_shutter() { "ON" } else { "OFF" },
            poses_per_resource = shutter.line_count(),
            "Sensor resources"
        );

        let corrector = TimestampCorrector::new(self.config.timestamp_shift_ns, range);
        let batch = TimestampBatch::build(buffer.iter().map(|(ts, _)| ts), &corrector, &shutter);
        let poses = BatchPoseResolver::new(self.context.interpolator).resolve(&mission.id, &batch)?;

        let mut stats = SensorBatchStats {
            resources: buffer.len(),
            lines_per_resource: shutter.line_count(),
            poses_interpolated: poses.len(),
            interpolation_time: poses.elapsed(),
            ..Default::default()
        };

        let companions = CompanionImageResolver::new(resources);
        let mut progress = ProgressReporter::new("resources", buffer.len(), self.config.progress_every);
        let mut end = LoopEnd::Exhausted;

        for ((timestamp_ns, _resource_id), poses_m_b) in buffer.iter().zip(poses.iter()) {
            if let Some(p) = progress.update() {
                obs::record_progress("resources", p.done, p.total);
            }
            if gate.should_abort() {
                end = LoopEnd::Aborted;
                break;
            }

            if !corrector.is_in_range(timestamp_ns) {
                warn!(
                    timestamp_ns,
                    corrected_ns = corrector.shifted(timestamp_ns),
                    "Depth resource is outside of the time range of the pose graph, skipping"
                );
                stats.skipped_out_of_range += 1;
                report.record_skip(SkipReason::OutOfTimeRange);
                obs::record_resource_skipped(SENSOR_PATH, SkipReason::OutOfTimeRange);
                continue;
            }

            let t_g_c = composer.compose_all(poses_m_b);

            let key = ResourceKey::Sensor {
                mission: mission.id.clone(),
                sensor: sensor_id.clone(),
                timestamp_ns,
            };
            let depth_map = resources
                .lookup(&key, resource_type)
                .ok_or_else(|| ContractError::missing_depth_map(&mission.id, sensor_id, timestamp_ns))?;
            let companion = companions.resolve(&key, &self.config.sensor_companion_preference);

            integrator.integrate(&t_g_c, &depth_map, companion.as_ref().map(|c| &c.image), camera)?;

            stats.dispatched += 1;
            report.dispatched += 1;
            if companion.is_some() {
                report.with_companion_image += 1;
            }
            obs::record_depth_map_dispatched(SENSOR_PATH, companion.is_some());
        }

        progress.finish();
        debug!(
            dispatched = stats.dispatched,
            skipped_out_of_range = stats.skipped_out_of_range,
            "Sensor done"
        );
        report.sensors.insert(sensor_id.clone(), stats);
        Ok(end)
    }

    fn mission(&self, id: &MissionId) -> Result<&'a Mission, ContractError> {
        self.context
            .pose_graph
            .mission(id)
            .ok_or_else(|| ContractError::UnknownMission { mission: id.clone() })
    }

    fn camera_rig(&self, id: &SensorId) -> Result<&'a CameraRig, ContractError> {
        self.context
            .sensors
            .camera_rig(id)
            .ok_or_else(|| ContractError::NotACamera { sensor: id.clone() })
    }

    fn t_b_s(&self, id: &SensorId) -> Result<contracts::RigidTransform, ContractError> {
        self.context
            .sensors
            .t_b_s(id)
            .ok_or_else(|| ContractError::UnknownSensor { sensor: id.clone() })
    }
}

fn abort(mut report: IntegrationReport, path: &'static str) -> IntegrationReport {
    warn!(dispatched = report.dispatched, "Depth integration has been aborted by the user");
    obs::record_integration_aborted(path);
    report.outcome = IntegrationOutcome::Aborted;
    report
}
