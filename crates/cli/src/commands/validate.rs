//! `validate` command implementation.

use anyhow::{Context, Result};
use config_loader::{ConfigLoader, IntegrationJob};
use contracts::{MissionId, PoseGraph};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    job_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<JobSummary>,
}

#[derive(Serialize)]
struct JobSummary {
    map: String,
    input_type: String,
    mode: String,
    missions: Vec<MissionId>,
    timestamp_shift_ns: i64,
    rolling_shutter_compensation: bool,
    enable_cancellation: bool,
}

impl From<&IntegrationJob> for JobSummary {
    fn from(job: &IntegrationJob) -> Self {
        Self {
            map: job.map.display().to_string(),
            input_type: job.input_type.to_string(),
            mode: format!("{:?}", job.mode).to_lowercase(),
            missions: job.missions.clone(),
            timestamp_shift_ns: job.integration.timestamp_shift_ns,
            rolling_shutter_compensation: job.integration.rolling_shutter_compensation,
            enable_cancellation: job.integration.enable_cancellation,
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(job = %args.job.display(), "Validating job");

    let result = validate_job(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Job validation failed")
    }
}

fn validate_job(args: &ValidateArgs) -> ValidationResult {
    let job_path = args.job.display().to_string();

    if !args.job.exists() {
        return ValidationResult {
            valid: false,
            job_path,
            error: Some(format!("File not found: {}", args.job.display())),
            warnings: None,
            summary: None,
        };
    }

    match ConfigLoader::load_job_from_path(&args.job) {
        Ok(job) => {
            let warnings = collect_warnings(&job);
            ValidationResult {
                valid: true,
                job_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(JobSummary::from(&job)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            job_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect job warnings (non-fatal issues)
fn collect_warnings(job: &IntegrationJob) -> Vec<String> {
    let mut warnings = Vec::new();

    if !job.integration.rolling_shutter_compensation {
        warnings.push(
            "rolling_shutter_compensation is disabled - rolling-shutter cameras get a single pose".to_string(),
        );
    }

    if !job.integration.enable_cancellation {
        warnings.push("enable_cancellation is false - Ctrl+C will not stop integration".to_string());
    }

    if !job.map.exists() {
        warnings.push(format!("Map snapshot not found: {}", job.map.display()));
        return warnings;
    }

    match ConfigLoader::load_map_from_path(&job.map) {
        Ok(map) => {
            for mission in &job.missions {
                if map.mission(mission).is_none() {
                    warnings.push(format!("Mission '{}' is not part of the map", mission));
                }
            }
        }
        Err(e) => warnings.push(format!("Map snapshot cannot be loaded: {}", e)),
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Job is valid: {}", result.job_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Map: {}", summary.map);
            println!("  Input type: {}", summary.input_type);
            println!("  Mode: {}", summary.mode);
            if summary.missions.is_empty() {
                println!("  Missions: all");
            } else {
                println!("  Missions: {}", summary.missions.len());
            }
            println!("  Timestamp shift: {}ns", summary.timestamp_shift_ns);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Job is invalid: {}", result.job_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
