//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 自由运行传感器与帧附着路径的场景测试
//! - 随机化性质测试
//! - 作业文件 + 地图快照端到端测试

#[cfg(test)]
mod fixtures {
    use contracts::{
        CameraModel, ContractError, DepthIntegrator, ImageBuffer, Intrinsics, Mission, PixelFormat,
        ResourceType, RigidTransform, Vertex,
    };
    use depth_integration::memory::{InMemoryMap, RecordingIntegrator};
    use depth_integration::AbortFlag;

    pub const MISSION: &str = "m0";
    pub const SENSOR: &str = "tof";

    pub fn t_g_m() -> RigidTransform {
        RigidTransform::from_translation(100.0, 0.0, 0.0)
    }

    pub fn t_b_s() -> RigidTransform {
        RigidTransform::from_translation(0.0, 0.0, 1.0)
    }

    pub fn depth() -> ImageBuffer {
        ImageBuffer::zeroed(4, 4, PixelFormat::DepthF32)
    }

    pub fn camera(line_count: u32, line_delay_ns: i64) -> CameraModel {
        CameraModel::pinhole(
            SENSOR,
            4,
            4,
            Intrinsics {
                fx: 2.0,
                fy: 2.0,
                cx: 2.0,
                cy: 2.0,
            },
        )
        .with_rolling_shutter(line_count, line_delay_ns)
    }

    /// Trajectory over [0, 1000] ns with body x = t / 100
    pub fn map_with(camera: CameraModel, timestamps: &[i64]) -> InMemoryMap {
        let mut map = InMemoryMap::new();
        map.add_mission(Mission {
            id: MISSION.into(),
            t_g_m: t_g_m(),
            rig: None,
        });
        for (id, ts) in [("v0", 0), ("v1", 1000)] {
            map.add_vertex(Vertex {
                id: id.into(),
                mission: MISSION.into(),
                timestamp_ns: ts,
                t_m_b: RigidTransform::from_translation(ts as f64 / 100.0, 0.0, 0.0),
                num_frames: 0,
            })
            .unwrap();
        }
        map.add_camera(t_b_s(), camera);
        for &ts in timestamps {
            map.add_sensor_resource(
                &MISSION.into(),
                &SENSOR.into(),
                ResourceType::OptimizedDepthMap,
                ts,
                depth(),
            );
        }
        map
    }

    /// Records dispatches and raises the abort flag after the `after`-th one
    pub struct AbortAfter {
        pub recorder: RecordingIntegrator,
        pub flag: AbortFlag,
        pub after: usize,
    }

    impl DepthIntegrator for AbortAfter {
        fn integrate(
            &mut self,
            poses: &[RigidTransform],
            depth_map: &ImageBuffer,
            image: Option<&ImageBuffer>,
            camera: &CameraModel,
        ) -> Result<(), ContractError> {
            self.recorder.integrate(poses, depth_map, image, camera)?;
            if self.recorder.len() == self.after {
                self.flag.request_abort();
            }
            Ok(())
        }
    }

    pub fn x_of(poses: &[RigidTransform]) -> Vec<f64> {
        poses.iter().map(|p| p.translation().x).collect()
    }

    pub fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
        }
    }
}

#[cfg(test)]
mod scenario_tests {
    use contracts::{
        ContractError, ImageBuffer, IntegrationConfig, IntegrationMode, MissionId, PixelFormat,
        PoseInterpolator, ResourceType, RigidTransform, SkipReason,
    };
    use depth_integration::memory::{InMemoryMap, RecordingIntegrator};
    use depth_integration::{
        compose, AbortFlag, IntegrationContext, IntegrationDriver, SinglePoseIntegrator,
    };

    use super::fixtures::*;

    fn run(map: &InMemoryMap, config: IntegrationConfig) -> (contracts::IntegrationReport, RecordingIntegrator) {
        let mut recorder = RecordingIntegrator::new();
        let report = IntegrationDriver::new(IntegrationContext::from_map(map), config)
            .integrate_sensor_depth_maps(&[MISSION.into()], ResourceType::OptimizedDepthMap, &mut recorder)
            .unwrap();
        (report, recorder)
    }

    #[test]
    fn test_global_shutter_single_pose() {
        let map = map_with(camera(1, 0), &[500]);
        let (report, recorder) = run(&map, IntegrationConfig::default());

        assert_eq!(report.dispatched, 1);
        let poses = &recorder.dispatches[0].poses;
        assert_eq!(poses.len(), 1);

        let t_m_b = map.interpolate(&MISSION.into(), &[500]).unwrap()[0];
        let expected = compose(&t_g_m(), &t_m_b, &t_b_s(), &RigidTransform::identity());
        assert!(poses[0].approx_eq(&expected, 1e-9));
    }

    #[test]
    fn test_rolling_shutter_line_poses_in_order() {
        let map = map_with(camera(3, 100), &[500]);
        let (report, recorder) = run(&map, IntegrationConfig::default());

        assert_eq!(report.dispatched, 1);
        assert_eq!(report.sensors[SENSOR].poses_interpolated, 3);

        let body = map.interpolate(&MISSION.into(), &[500, 600, 700]).unwrap();
        let expected: Vec<_> = body
            .iter()
            .map(|t_m_b| compose(&t_g_m(), t_m_b, &t_b_s(), &RigidTransform::identity()))
            .collect();
        let poses = &recorder.dispatches[0].poses;
        for (pose, expected) in poses.iter().zip(&expected) {
            assert!(pose.approx_eq(expected, 1e-9));
        }
        assert_close(&x_of(poses), &[105.0, 106.0, 107.0]);
    }

    #[test]
    fn test_out_of_range_resource_is_skipped() {
        let map = map_with(camera(1, 0), &[2000]);
        let (report, recorder) = run(&map, IntegrationConfig::default());

        assert!(recorder.is_empty());
        assert_eq!(report.dispatched, 0);
        assert_eq!(report.skipped(SkipReason::OutOfTimeRange), 1);
        assert!(!report.is_aborted());
    }

    #[test]
    fn test_abort_after_third_resource() {
        let timestamps: Vec<i64> = (0..10).map(|i| i * 100).collect();
        let map = map_with(camera(1, 0), &timestamps);
        let flag = AbortFlag::new();
        let mut integrator = AbortAfter {
            recorder: RecordingIntegrator::new(),
            flag: flag.clone(),
            after: 3,
        };

        let report = IntegrationDriver::new(IntegrationContext::from_map(&map), IntegrationConfig::default())
            .with_cancellation(&flag)
            .integrate_sensor_depth_maps(&[MISSION.into()], ResourceType::OptimizedDepthMap, &mut integrator)
            .unwrap();

        assert!(report.is_aborted());
        assert_eq!(report.dispatched, 3);
        assert_eq!(integrator.recorder.len(), 3);
        let xs: Vec<f64> = integrator
            .recorder
            .dispatches
            .iter()
            .map(|d| d.poses[0].translation().x)
            .collect();
        assert_close(&xs, &[100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_abort_ignored_when_cancellation_disabled() {
        let map = map_with(camera(1, 0), &[100, 200, 300]);
        let flag = AbortFlag::new();
        flag.request_abort();
        let config = IntegrationConfig {
            enable_cancellation: false,
            ..Default::default()
        };

        let mut recorder = RecordingIntegrator::new();
        let report = IntegrationDriver::new(IntegrationContext::from_map(&map), config)
            .with_cancellation(&flag)
            .integrate_sensor_depth_maps(&[MISSION.into()], ResourceType::OptimizedDepthMap, &mut recorder)
            .unwrap();

        assert!(!report.is_aborted());
        assert_eq!(recorder.len(), 3);
    }

    #[test]
    fn test_missing_companion_dispatches_without_image() {
        let map = map_with(camera(1, 0), &[500]);
        let (report, recorder) = run(&map, IntegrationConfig::default());

        assert_eq!(recorder.dispatches[0].image, None);
        assert_eq!(report.with_companion_image, 0);
    }

    #[test]
    fn test_companion_follows_sensor_preference() {
        let mut map = map_with(camera(1, 0), &[500]);
        let color = ImageBuffer::zeroed(4, 4, PixelFormat::Rgb8);
        map.add_sensor_resource(
            &MISSION.into(),
            &SENSOR.into(),
            ResourceType::ColorImageForDepthMap,
            500,
            color.clone(),
        );
        // Raw images are not part of the free-running preference
        map.add_sensor_resource(
            &MISSION.into(),
            &SENSOR.into(),
            ResourceType::RawImage,
            500,
            ImageBuffer::zeroed(4, 4, PixelFormat::Mono8),
        );

        let (report, recorder) = run(&map, IntegrationConfig::default());
        assert_eq!(recorder.dispatches[0].image, Some(color));
        assert_eq!(report.with_companion_image, 1);
    }

    #[test]
    fn test_unsupported_input_type_rejected_first() {
        // Unknown mission would fail later; the type check must win
        let map = InMemoryMap::new();
        let mut recorder = RecordingIntegrator::new();
        let driver = IntegrationDriver::new(IntegrationContext::from_map(&map), IntegrationConfig::default());

        for mode in [IntegrationMode::Frame, IntegrationMode::Sensor, IntegrationMode::Both] {
            let result = driver.run(mode, &[MissionId::from("missing")], ResourceType::RawImage, &mut recorder);
            assert!(matches!(
                result,
                Err(ContractError::UnsupportedInputType {
                    resource_type: ResourceType::RawImage
                })
            ));
        }
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_clamped_lines_with_unclamped_range_check() {
        // Range check uses t + shift only, so 950 passes while its later lines clamp
        let map = map_with(camera(3, 100), &[950]);
        let (report, recorder) = run(&map, IntegrationConfig::default());

        assert_eq!(report.dispatched, 1);
        assert_eq!(report.skipped(SkipReason::OutOfTimeRange), 0);
        let poses = &recorder.dispatches[0].poses;
        assert_eq!(poses.len(), 3);
        assert_close(&x_of(poses), &[109.5, 110.0, 110.0]);
    }

    #[test]
    fn test_shift_moves_resource_out_of_range() {
        let map = map_with(camera(1, 0), &[50, 500]);
        let config = IntegrationConfig {
            timestamp_shift_ns: -100,
            ..Default::default()
        };
        let (report, recorder) = run(&map, config);

        // 50 - 100 < 0 is skipped although a clamped pose exists
        assert_eq!(report.skipped(SkipReason::OutOfTimeRange), 1);
        assert_eq!(recorder.len(), 1);
        assert_close(&x_of(&recorder.dispatches[0].poses), &[104.0]);
    }

    #[test]
    fn test_single_pose_adapter_through_driver() {
        let map = map_with(camera(1, 0), &[200, 400]);
        let mut xs = Vec::new();
        let integrator = SinglePoseIntegrator(
            |t_g_c: &RigidTransform, _: &ImageBuffer, _: Option<&ImageBuffer>, _: &contracts::CameraModel| {
                xs.push(t_g_c.translation().x);
                Ok::<(), ContractError>(())
            },
        );
        let driver = IntegrationDriver::new(IntegrationContext::from_map(&map), IntegrationConfig::default());
        let report = driver
            .integrate_sensor_depth_maps(&[MISSION.into()], ResourceType::OptimizedDepthMap, integrator)
            .unwrap();
        assert_eq!(report.dispatched, 2);
        assert_close(&xs, &[102.0, 104.0]);

        // Rolling-shutter input breaks the single-pose contract
        let map = map_with(camera(4, 10), &[200]);
        let integrator = SinglePoseIntegrator(
            |_: &RigidTransform, _: &ImageBuffer, _: Option<&ImageBuffer>, _: &contracts::CameraModel| {
                Ok::<(), ContractError>(())
            },
        );
        let result = IntegrationDriver::new(IntegrationContext::from_map(&map), IntegrationConfig::default())
            .integrate_sensor_depth_maps(&[MISSION.into()], ResourceType::OptimizedDepthMap, integrator);
        assert!(matches!(result, Err(ContractError::PoseCountMismatch { count: 4 })));
    }
}

#[cfg(test)]
mod property_tests {
    use contracts::{IntegrationConfig, MissionId, ResourceType, RigidTransform, SkipReason, TimeRange};
    use depth_integration::memory::RecordingIntegrator;
    use depth_integration::{
        compose, correct, line_offsets, BatchPoseResolver, IntegrationContext, IntegrationDriver,
    };
    use rand::Rng;

    use super::fixtures::*;

    #[test]
    fn test_line_offsets_random() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let count = rng.random_range(1..500u32);
            let delay = rng.random_range(0..100_000i64);
            let offsets = line_offsets(count, delay);

            assert_eq!(offsets.len(), count as usize);
            assert_eq!(offsets[0], 0);
            for pair in offsets.windows(2) {
                assert_eq!(pair[1] - pair[0], delay);
            }
        }
    }

    #[test]
    fn test_corrected_timestamps_within_range() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let min = rng.random_range(-1_000_000..1_000_000i64);
            let max = min + rng.random_range(0..1_000_000i64);
            let raw = rng.random_range(-5_000_000..5_000_000i64);
            let shift = rng.random_range(-1_000_000..1_000_000i64);
            let offsets = line_offsets(rng.random_range(1..64u32), rng.random_range(0..50_000i64));

            let corrected = correct(raw, shift, &offsets, min, max);
            assert_eq!(corrected.len(), offsets.len());
            assert!(corrected.iter().all(|&t| t >= min && t <= max));

            // Re-clamping changes nothing
            let range = TimeRange::new(min, max);
            assert!(corrected.iter().all(|&t| range.clamp(t) == t));
        }
    }

    #[test]
    fn test_batch_resolution_is_deterministic() {
        let map = map_with(camera(1, 0), &[]);
        let resolver = BatchPoseResolver::new(&map);
        let mission = MissionId::from(MISSION);
        let mut rng = rand::rng();

        for _ in 0..20 {
            let timestamps: Vec<i64> = (0..rng.random_range(1..64)).map(|_| rng.random_range(0..=1000i64)).collect();
            let first = resolver.resolve_batch(&mission, &timestamps).unwrap();
            let second = resolver.resolve_batch(&mission, &timestamps).unwrap();
            assert_eq!(first.len(), timestamps.len());
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_compose_associative_with_identity() {
        let mut rng = rand::rng();
        let mut random_transform = || {
            let translation = RigidTransform::from_translation(
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
            );
            let rotation = RigidTransform::from_euler(
                rng.random_range(-3.0..3.0),
                rng.random_range(-1.5..1.5),
                rng.random_range(-3.0..3.0),
            );
            translation * rotation
        };

        for _ in 0..50 {
            let (a, b, c, d) = (random_transform(), random_transform(), random_transform(), random_transform());
            let chained = compose(&a, &b, &c, &d);
            let grouped = &a * &(&b * &(&c * &d));
            assert!(chained.approx_eq(&grouped, 1e-9));

            let id = RigidTransform::identity();
            assert!(compose(&id, &b, &c, &d).approx_eq(&(&(&b * &c) * &d), 1e-9));
            assert!(compose(&a, &b, &id, &id).approx_eq(&(&a * &b), 1e-9));
        }
    }

    #[test]
    fn test_only_in_range_resources_dispatched_in_order() {
        let mut rng = rand::rng();
        for _ in 0..20 {
            let mut timestamps: Vec<i64> = (0..rng.random_range(1..40)).map(|_| rng.random_range(-500..1500i64)).collect();
            timestamps.sort_unstable();
            timestamps.dedup();
            let shift = rng.random_range(-200..200i64);
            let inside = timestamps.iter().filter(|&&t| (0..=1000).contains(&(t + shift))).count();

            let map = map_with(camera(rng.random_range(1..5u32), rng.random_range(0..50i64)), &timestamps);
            let config = IntegrationConfig {
                timestamp_shift_ns: shift,
                ..Default::default()
            };
            let mut recorder = RecordingIntegrator::new();
            let report = IntegrationDriver::new(IntegrationContext::from_map(&map), config)
                .integrate_sensor_depth_maps(&[MISSION.into()], ResourceType::OptimizedDepthMap, &mut recorder)
                .unwrap();

            assert_eq!(recorder.len(), inside);
            assert_eq!(report.skipped(SkipReason::OutOfTimeRange), timestamps.len() - inside);

            // Ascending capture time means non-decreasing first-line x
            let first_x: Vec<f64> = recorder.dispatches.iter().map(|d| d.poses[0].translation().x).collect();
            assert!(first_x.windows(2).all(|w| w[0] <= w[1] + 1e-9));
            for dispatch in &recorder.dispatches {
                assert_eq!(dispatch.poses.len(), report.sensors[SENSOR].lines_per_resource);
            }
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use config_loader::ConfigLoader;
    use contracts::{IntegrationOutcome, SkipReason};
    use depth_integration::memory::RecordingIntegrator;
    use depth_integration::{IntegrationContext, IntegrationDriver};
    use observability::IntegrationMetricsAggregator;

    const MAP_JSON: &str = r#"{
        "missions": [
            {"id": "m0", "t_g_m": {"translation": [100, 0, 0]}, "rig": "rig0"},
            {"id": "m1"}
        ],
        "vertices": [
            {"id": "v0", "mission": "m0", "timestamp_ns": 0, "t_m_b": {"translation": [0, 0, 0]}, "num_frames": 1},
            {"id": "v1", "mission": "m0", "timestamp_ns": 1000, "t_m_b": {"translation": [10, 0, 0]}, "num_frames": 1}
        ],
        "sensors": [
            {
                "id": "rig0",
                "cameras": [{
                    "t_c_rig": {"translation": [0, -2, 0]},
                    "camera": {"id": "cam0", "width": 4, "height": 4,
                               "intrinsics": {"fx": 2, "fy": 2, "cx": 2, "cy": 2}}
                }]
            },
            {
                "id": "tof",
                "t_b_s": {"translation": [0, 0, 1]},
                "cameras": [{
                    "t_c_rig": {"translation": [0, 0, 0]},
                    "camera": {"id": "tof", "width": 4, "height": 4,
                               "intrinsics": {"fx": 2, "fy": 2, "cx": 2, "cy": 2},
                               "line_count": 2, "line_delay_ns": 100}
                }]
            }
        ],
        "frame_resources": [
            {"vertex": "v0", "frame_idx": 0, "resource_type": "optimized_depth_map",
             "image": {"width": 4, "height": 4, "format": "depth_f32"}},
            {"vertex": "v1", "frame_idx": 0, "resource_type": "optimized_depth_map",
             "image": {"width": 4, "height": 4, "format": "depth_f32"}},
            {"vertex": "v1", "frame_idx": 0, "resource_type": "raw_image",
             "image": {"width": 4, "height": 4, "format": "mono8"}}
        ],
        "sensor_resources": [
            {"mission": "m0", "sensor": "tof", "resource_type": "optimized_depth_map", "timestamp_ns": 200,
             "image": {"width": 4, "height": 4, "format": "depth_f32"}},
            {"mission": "m0", "sensor": "tof", "resource_type": "optimized_depth_map", "timestamp_ns": 1500,
             "image": {"width": 4, "height": 4, "format": "depth_f32"}}
        ]
    }"#;

    const JOB_TOML: &str = r#"
map = "map.json"
input_type = "optimized_depth_map"
mode = "both"

[integration]
progress_every = 1
"#;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_job_and_map_from_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "map.json", MAP_JSON);
        let job_path = write(dir.path(), "job.toml", JOB_TOML);

        let job = ConfigLoader::load_job_from_path(&job_path).unwrap();
        let map = ConfigLoader::load_map_from_path(&job.map).unwrap();
        let missions = map.mission_ids();

        let mut recorder = RecordingIntegrator::new();
        let report = IntegrationDriver::new(IntegrationContext::from_map(&map), job.integration.clone())
            .run(job.mode, &missions, job.input_type, &mut recorder)
            .unwrap();

        assert_eq!(report.outcome, IntegrationOutcome::Completed);
        // 2 rig frames + 1 in-range tof resource
        assert_eq!(report.dispatched, 3);
        assert_eq!(report.with_companion_image, 1);
        assert_eq!(report.skipped(SkipReason::OutOfTimeRange), 1);
        // m1 has no rig on the frame path and no trajectory on the sensor path
        assert_eq!(report.missions_skipped(SkipReason::NoRig), 1);
        assert_eq!(report.missions_skipped(SkipReason::NoTrajectory), 1);

        // Frame path: T_G_M * T_M_B * T_rig_C with T_rig_C = (0, 2, 0)
        let first = recorder.dispatches[0].poses[0].translation();
        assert!((first.x - 100.0).abs() < 1e-9 && (first.y - 2.0).abs() < 1e-9);

        // Sensor path: two lines at 200 and 300
        let tof = recorder.dispatches.last().unwrap();
        assert_eq!(tof.camera.as_str(), "tof");
        let xs: Vec<f64> = tof.poses.iter().map(|p| p.translation().x).collect();
        assert!((xs[0] - 102.0).abs() < 1e-9 && (xs[1] - 103.0).abs() < 1e-9);
        assert!((tof.poses[0].translation().z - 1.0).abs() < 1e-9);

        let mut metrics = IntegrationMetricsAggregator::new();
        metrics.update(&report);
        let summary = metrics.summary();
        assert_eq!(summary.total_dispatched, 3);
        assert_eq!(summary.aborted_runs, 0);
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let map = write(
            dir.path(),
            "map.json",
            r#"{"missions": [{"id": "m0"}],
                "vertices": [{"id": "v0", "mission": "m9", "timestamp_ns": 0, "t_m_b": {"translation": [0, 0, 0]}}]}"#,
        );
        assert!(ConfigLoader::load_map_from_path(&map).is_err());
    }
}
