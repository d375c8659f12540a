//! Launcher command line and environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use flood_prep::{Collaborators, FloodPrepConfig};
use tracing::info;

use crate::services::{CommandProcessor, HttpDemService, HttpLandCoverService};

#[derive(Parser, Debug, Clone)]
#[command(name = "flood-launcher")]
#[command(about = "Prepare a flood map and run the thresholding processor on it")]
pub struct LauncherArgs {
    /// JSON parameter file (FLOODMAP, THREE_STATE, ...)
    #[arg(short, long, env = "FLOOD_PREP_CONFIG")]
    pub config: PathBuf,

    /// Directory that FLOODMAP, DEM and output names are relative to
    #[arg(long, env = "FLOOD_PREP_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Directory for run-scoped temporary files (default: data dir)
    #[arg(long, env = "FLOOD_PREP_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Prepare everything but do not run the thresholding processor
    #[arg(long)]
    pub simulate: bool,

    /// Land-cover classification service endpoint
    #[arg(long, env = "FLOOD_PREP_LANDCOVER_URL")]
    pub landcover_url: Option<String>,

    /// DEM generation service endpoint
    #[arg(long, env = "FLOOD_PREP_DEM_URL")]
    pub dem_url: Option<String>,

    /// Thresholding processor executable
    #[arg(long, env = "FLOOD_PREP_PROCESSOR_CMD")]
    pub processor_cmd: Option<String>,

    /// Write the run report JSON to this file
    #[arg(long)]
    pub payload: Option<PathBuf>,

    /// HTTP timeout for collaborator services, in seconds
    #[arg(long, env = "FLOOD_PREP_HTTP_TIMEOUT", default_value_t = 600)]
    pub http_timeout_secs: u64,

    /// Log level
    #[arg(long, env = "FLOOD_PREP_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,
}

impl LauncherArgs {
    /// Load the parameter file and apply command-line overrides.
    pub fn load_config(&self) -> Result<FloodPrepConfig> {
        let mut config = FloodPrepConfig::from_file(&self.config)
            .with_context(|| format!("loading {}", self.config.display()))?;

        if self.simulate {
            config.simulate_hydrothresholds = true;
        }

        info!(
            flood_map = %config.flood_map,
            three_state = config.three_state,
            remove_permanent_water = config.remove_permanent_water,
            simulate = config.simulate_hydrothresholds,
            "Loaded configuration"
        );

        Ok(config)
    }

    /// Build the collaborators from the configured endpoints.
    ///
    /// Missing endpoints are not an error here; a run only fails if it
    /// actually needs the missing collaborator.
    pub fn collaborators(&self) -> Result<Collaborators> {
        let timeout = Duration::from_secs(self.http_timeout_secs);

        Ok(Collaborators {
            land_cover: Arc::new(HttpLandCoverService::new(self.landcover_url.clone(), timeout)?),
            dem: Arc::new(HttpDemService::new(self.dem_url.clone(), timeout)?),
            processor: Arc::new(CommandProcessor::new(self.processor_cmd.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let args = LauncherArgs::try_parse_from(["flood-launcher", "--config", "params.json"]).unwrap();

        assert_eq!(args.config, PathBuf::from("params.json"));
        assert_eq!(args.data_dir, PathBuf::from("."));
        assert!(!args.simulate);
        assert_eq!(args.log_level, "info");
        assert_eq!(args.http_timeout_secs, 600);
    }

    #[test]
    fn test_simulate_flag_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"FLOODMAP": "scene_map.tif"}"#).unwrap();

        let args = LauncherArgs::try_parse_from([
            "flood-launcher",
            "--config",
            path.to_str().unwrap(),
            "--simulate",
        ])
        .unwrap();

        let config = args.load_config().unwrap();
        assert!(config.simulate_hydrothresholds);
        assert_eq!(config.flood_map, "scene_map.tif");
    }

    #[test]
    fn test_missing_config_file() {
        let args =
            LauncherArgs::try_parse_from(["flood-launcher", "--config", "/nonexistent/params.json"])
                .unwrap();
        assert!(args.load_config().is_err());
    }

    #[test]
    fn test_collaborators_without_endpoints() {
        let args = LauncherArgs::try_parse_from(["flood-launcher", "--config", "p.json"]).unwrap();
        assert!(args.collaborators().is_ok());
    }
}
