//! # Depth Integrator CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 作业文件加载与验证
//! - 深度图位姿集成
//! - Ctrl+C 协作式中止

mod cli;
mod commands;
mod error;
mod integrator;
mod stats;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_integration, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging (and metrics exporter for `run`)
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.command.metrics_port(),
        ..ObservabilityConfig::default()
    }
    .with_verbosity(cli.verbose, cli.quiet))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Depth Integrator CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_integration(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
