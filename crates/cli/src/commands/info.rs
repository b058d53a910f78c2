//! `info` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{PoseGraph, PoseInterpolator, ResourceType, TimeRange};
use depth_integration::memory::InMemoryMap;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::ensure_map_exists;

/// Map info for JSON output
#[derive(Serialize)]
struct MapInfo {
    missions: Vec<MissionInfo>,
}

#[derive(Serialize)]
struct MissionInfo {
    id: String,
    vertices: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    rig: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<TimeRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frame_depth_maps: Vec<TrackInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sensor_tracks: Vec<TrackInfo>,
}

#[derive(Serialize)]
struct TrackInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    sensor: Option<String>,
    resource_type: ResourceType,
    resources: usize,
}

const DEPTH_TYPES: [ResourceType; 2] = [ResourceType::RawDepthMap, ResourceType::OptimizedDepthMap];

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(map = %args.map.display(), "Loading map info");

    ensure_map_exists(&args.map)?;

    let map = ConfigLoader::load_map_from_path(&args.map)
        .with_context(|| format!("Failed to load map from {}", args.map.display()))?;
    let info = build_map_info(&map);

    if args.json {
        let json = serde_json::to_string_pretty(&info).context("Failed to serialize map info")?;
        println!("{}", json);
    } else {
        print_map_info(&info);
    }

    Ok(())
}

fn build_map_info(map: &InMemoryMap) -> MapInfo {
    let missions = map
        .mission_ids()
        .into_iter()
        .map(|id| {
            let frame_depth_maps = DEPTH_TYPES
                .iter()
                .map(|&resource_type| TrackInfo {
                    sensor: None,
                    resource_type,
                    resources: map.num_frame_resources(&id, resource_type),
                })
                .filter(|track| track.resources > 0)
                .collect();

            let sensor_tracks = map
                .sensor_tracks(&id)
                .into_iter()
                .map(|(sensor, resource_type, resources)| TrackInfo {
                    sensor: Some(sensor.to_string()),
                    resource_type,
                    resources,
                })
                .collect();

            MissionInfo {
                vertices: map.num_vertices(&id),
                rig: map
                    .mission(&id)
                    .and_then(|m| m.rig.as_ref())
                    .map(|rig| rig.to_string()),
                time_range: map.valid_time_range(&id),
                frame_depth_maps,
                sensor_tracks,
                id: id.to_string(),
            }
        })
        .collect();

    MapInfo { missions }
}

fn print_map_info(info: &MapInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                        Map Snapshot                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🗺  Missions ({})", info.missions.len());
    for (i, mission) in info.missions.iter().enumerate() {
        let is_last = i == info.missions.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!("   {} {} ({} vertices)", prefix, mission.id, mission.vertices);

        match mission.time_range {
            Some(range) => println!(
                "   {}  ├─ Trajectory: [{}ns, {}ns]",
                child_prefix, range.min_ns, range.max_ns
            ),
            None => println!("   {}  ├─ Trajectory: none", child_prefix),
        }

        println!(
            "   {}  ├─ Rig: {}",
            child_prefix,
            mission.rig.as_deref().unwrap_or("(none)")
        );

        for track in &mission.frame_depth_maps {
            println!(
                "   {}  ├─ Frame {}: {}",
                child_prefix, track.resource_type, track.resources
            );
        }

        if mission.sensor_tracks.is_empty() {
            println!("   {}  └─ Sensor tracks: none", child_prefix);
        } else {
            println!("   {}  └─ Sensor tracks ({}):", child_prefix, mission.sensor_tracks.len());
            for (j, track) in mission.sensor_tracks.iter().enumerate() {
                let track_prefix = if j == mission.sensor_tracks.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                println!(
                    "   {}     {} {} {}: {}",
                    child_prefix,
                    track_prefix,
                    track.sensor.as_deref().unwrap_or("-"),
                    track.resource_type,
                    track.resources
                );
            }
        }
    }

    println!();
}
