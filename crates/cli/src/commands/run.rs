//! `run` command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, IntegrationJob};
use contracts::{AbortFlag, ContractError, IntegrationReport, MissionId, PoseGraph};
use depth_integration::memory::InMemoryMap;
use depth_integration::{IntegrationContext, IntegrationDriver};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::{ensure_job_exists, ensure_map_exists, CliError};
use crate::integrator::LogIntegrator;
use crate::stats::RunStats;

/// Execute the `run` command
pub async fn run_integration(args: &RunArgs) -> Result<()> {
    info!(job = %args.job.display(), "Loading integration job");

    ensure_job_exists(&args.job)?;

    let mut job = ConfigLoader::load_job_from_path(&args.job)
        .with_context(|| format!("Failed to load job from {}", args.job.display()))?;
    apply_overrides(&mut job, args);

    ensure_map_exists(&job.map)?;
    let map = ConfigLoader::load_map_from_path(&job.map)
        .with_context(|| format!("Failed to load map from {}", job.map.display()))?;

    let missions = select_missions(&job, &map);

    info!(
        map = %job.map.display(),
        input_type = %job.input_type,
        mode = ?job.mode,
        missions = missions.len(),
        timestamp_shift_ns = job.integration.timestamp_shift_ns,
        rolling_shutter = job.integration.rolling_shutter_compensation,
        "Job loaded"
    );

    // Dry run - everything loaded, exit before integrating
    if args.dry_run {
        info!("Dry run mode - job and map are valid, exiting");
        for mission in &missions {
            println!("  - {} ({} vertices)", mission, map.num_vertices(mission));
        }
        return Ok(());
    }

    let abort = AbortFlag::new();
    let start = Instant::now();

    // The driver is synchronous; keep the runtime free for the signal handler
    let mut worker = {
        let abort = abort.clone();
        tokio::task::spawn_blocking(move || {
            let mut integrator = LogIntegrator::new();
            let report = integrate(&map, &job, &missions, &abort, &mut integrator);
            report.map(|report| (report, integrator))
        })
    };

    let joined = tokio::select! {
        joined = &mut worker => joined,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, requesting abort...");
            abort.request_abort();
            worker.await
        }
    };

    let (report, integrator) = joined
        .map_err(|e| CliError::worker(e.to_string()))?
        .context("Depth integration failed")?;

    let stats = RunStats::new(report, &integrator, start.elapsed());
    if stats.report.is_aborted() {
        warn!(
            dispatched = stats.report.dispatched,
            "Integration aborted by user"
        );
    } else {
        info!(
            dispatched = stats.report.dispatched,
            missions = stats.report.missions_processed,
            duration_secs = stats.duration.as_secs_f64(),
            "Integration completed successfully"
        );
    }
    stats.print_summary();

    info!("Depth Integrator finished");
    Ok(())
}

fn apply_overrides(job: &mut IntegrationJob, args: &RunArgs) {
    if let Some(shift) = args.timestamp_shift_ns {
        info!(timestamp_shift_ns = shift, "Overriding timestamp shift from CLI");
        job.integration.timestamp_shift_ns = shift;
    }
    if args.no_rolling_shutter {
        info!("Rolling shutter compensation disabled from CLI");
        job.integration.rolling_shutter_compensation = false;
    }
}

/// Job missions, or every mission of the map when the job lists none
fn select_missions(job: &IntegrationJob, map: &InMemoryMap) -> Vec<MissionId> {
    if job.missions.is_empty() {
        return map.mission_ids();
    }
    for mission in &job.missions {
        if map.mission(mission).is_none() {
            warn!(mission = %mission, "Mission listed in job is not part of the map");
        }
    }
    job.missions.clone()
}

fn integrate(
    map: &InMemoryMap,
    job: &IntegrationJob,
    missions: &[MissionId],
    abort: &AbortFlag,
    integrator: &mut LogIntegrator,
) -> Result<IntegrationReport, ContractError> {
    IntegrationDriver::new(IntegrationContext::from_map(map), job.integration.clone())
        .with_cancellation(abort)
        .run(job.mode, missions, job.input_type, integrator)
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{IntegrationConfig, IntegrationMode, Mission, ResourceType, RigidTransform};
    use std::path::PathBuf;

    fn job(missions: Vec<MissionId>) -> IntegrationJob {
        IntegrationJob {
            map: PathBuf::from("map.json"),
            input_type: ResourceType::OptimizedDepthMap,
            mode: IntegrationMode::Sensor,
            missions,
            integration: IntegrationConfig::default(),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let args = RunArgs {
            job: PathBuf::from("job.toml"),
            timestamp_shift_ns: Some(-40),
            no_rolling_shutter: true,
            dry_run: false,
            metrics_port: None,
        };
        let mut job = job(Vec::new());
        apply_overrides(&mut job, &args);
        assert_eq!(job.integration.timestamp_shift_ns, -40);
        assert!(!job.integration.rolling_shutter_compensation);
    }

    #[test]
    fn test_empty_mission_list_selects_all() {
        let mut map = InMemoryMap::new();
        for id in ["m1", "m0"] {
            map.add_mission(Mission {
                id: id.into(),
                t_g_m: RigidTransform::identity(),
                rig: None,
            });
        }

        let all = select_missions(&job(Vec::new()), &map);
        assert_eq!(all.len(), 2);

        let picked = select_missions(&job(vec!["m1".into()]), &map);
        assert_eq!(picked, vec![MissionId::from("m1")]);
    }

    #[test]
    fn test_abort_before_start_dispatches_nothing() {
        let map = InMemoryMap::new();
        let abort = AbortFlag::new();
        abort.request_abort();

        let mut integrator = LogIntegrator::new();
        let report = integrate(&map, &job(Vec::new()), &[], &abort, &mut integrator).unwrap();
        assert_eq!(report.dispatched, 0);
        assert_eq!(integrator.depth_maps, 0);
    }
}
