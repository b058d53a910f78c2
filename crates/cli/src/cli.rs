//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Depth Integrator - posed depth map integration over a recorded map
#[derive(Parser, Debug)]
#[command(
    name = "depth-integrator",
    author,
    version,
    about = "Posed depth map integration over recorded missions",
    long_about = "Walks the missions of a recorded map, computes a global pose for every\n\
                  depth map (one per shutter line for rolling-shutter sensors) and hands\n\
                  the posed depth maps to an integrator."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DEPTH_INTEGRATOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DEPTH_INTEGRATOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Integrate the depth maps selected by a job file
    Run(RunArgs),

    /// Validate a job file without running
    Validate(ValidateArgs),

    /// Display map snapshot information
    Info(InfoArgs),
}

impl Commands {
    /// Prometheus port requested by the command, if any
    pub fn metrics_port(&self) -> Option<u16> {
        match self {
            Self::Run(args) => args.metrics_port,
            _ => None,
        }
    }
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to job file (TOML or JSON)
    #[arg(short, long, default_value = "job.toml", env = "DEPTH_INTEGRATOR_JOB")]
    pub job: PathBuf,

    /// Override the resource-to-body timestamp shift (ns)
    #[arg(long, allow_negative_numbers = true, env = "DEPTH_INTEGRATOR_TIMESTAMP_SHIFT_NS")]
    pub timestamp_shift_ns: Option<i64>,

    /// Use a single pose per depth map even for rolling-shutter cameras
    #[arg(long)]
    pub no_rolling_shutter: bool,

    /// Load and check job and map, then exit without integrating
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (disabled when omitted)
    #[arg(long, env = "DEPTH_INTEGRATOR_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to job file to validate
    #[arg(short, long, default_value = "job.toml")]
    pub job: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to map snapshot (JSON or TOML)
    #[arg(short, long, default_value = "map.json")]
    pub map: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "depth-integrator",
            "-v",
            "run",
            "--job",
            "jobs/tof.toml",
            "--timestamp-shift-ns",
            "-2500",
            "--no-rolling-shutter",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.command.metrics_port(), None);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.job, PathBuf::from("jobs/tof.toml"));
                assert_eq!(args.timestamp_shift_ns, Some(-2500));
                assert!(args.no_rolling_shutter);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["depth-integrator", "-q", "-v", "info"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_metrics_port_only_for_run() {
        let cli = Cli::try_parse_from(["depth-integrator", "run", "--metrics-port", "9100"]).unwrap();
        assert_eq!(cli.command.metrics_port(), Some(9100));
    }
}
