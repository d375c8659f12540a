//! Flood-map preparation launcher.
//!
//! Loads a JSON parameter file, prepares the flood map, runs the
//! thresholding processor and post-processes its outputs. The run report is
//! printed as JSON on stdout.
//!
//! Exit codes: 0 on success, 1 on failure, 2 when the flood map holds no
//! water and the processor was therefore not launched.

mod config;
mod services;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use flood_prep::{FloodPrepPipeline, PrepError, RunReport};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::LauncherArgs;

/// Exit code for a scene without water.
const NO_WATER_EXIT_CODE: u8 = 2;

/// Install the global subscriber; `RUST_LOG` takes precedence over `--log-level`.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}

async fn run(args: &LauncherArgs) -> Result<RunReport> {
    let config = args.load_config()?;

    let mut pipeline =
        FloodPrepPipeline::new(config, args.collaborators()?).with_data_dir(&args.data_dir);
    if let Some(work_dir) = &args.work_dir {
        pipeline = pipeline.with_work_dir(work_dir);
    }

    let report = pipeline.run().await?;

    let json = serde_json::to_string_pretty(&report)?;
    if let Some(payload) = &args.payload {
        std::fs::write(payload, &json)?;
        info!(path = %payload.display(), "Wrote run report");
    }
    println!("{}", json);

    Ok(report)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let args = LauncherArgs::parse();
    init_tracing(&args.log_level, args.log_json)?;

    info!(config = %args.config.display(), "Starting flood-map preparation");

    match run(&args).await {
        Ok(report) => {
            info!(
                case = report.case,
                water_depth = %report.water_depth.display(),
                simulated = report.simulated,
                "Run finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.downcast_ref::<PrepError>().is_some_and(PrepError::is_no_water) => {
            warn!("No water in the flood map; thresholding processor not launched");
            Ok(ExitCode::from(NO_WATER_EXIT_CODE))
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Run failed");
            Err(e)
        }
    }
}
