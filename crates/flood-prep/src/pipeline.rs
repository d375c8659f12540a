//! Preparation pipeline around the thresholding processor.
//!
//! ```text
//!  FLOODMAP ──► read ──► remap ──► validate ──► select strategy
//!                                                   │
//!                  ┌──────────────┬─────────────────┤
//!                  ▼              ▼                 ▼
//!               no mask     internal mask     external mask
//!                  └──────────────┴─────────────────┤
//!                                                   ▼
//!                    write converted + mask, resolve DEM
//!                                                   │
//!                                                   ▼
//!                                     ThresholdingProcessor::run
//!                                                   │
//!                                                   ▼
//!                        clip to water extent, remove permanent water
//! ```
//!
//! Temporary files are cleaned up at the end of every run, including
//! failed ones.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use raster_io::{GeoTiffCodec, MaskRaster, RasterCodec, RasterGrid};
use tracing::{error, info, instrument, warn};

use crate::clip::{finalize, ArtifactExtentMask};
use crate::collaborators::{
    DemRequest, DemService, LandCoverService, SimulatedProcessor, ThresholdingProcessor,
    ThresholdingRequest,
};
use crate::config::FloodPrepConfig;
use crate::error::{PrepError, Result};
use crate::mask::{build_internal_mask, ExternalMaskAdapter};
use crate::remap::remap;
use crate::report::RunReport;
use crate::strategy::{MaskStrategy, PrepCase};
use crate::validate::validate;
use crate::workspace::{RunWorkspace, TempKind};

/// External systems a pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub land_cover: Arc<dyn LandCoverService>,
    pub dem: Arc<dyn DemService>,
    pub processor: Arc<dyn ThresholdingProcessor>,
}

/// Orchestrates one preparation run per call to [`run`](Self::run).
pub struct FloodPrepPipeline {
    config: FloodPrepConfig,
    data_dir: PathBuf,
    work_dir: Option<PathBuf>,
    codec: Arc<dyn RasterCodec>,
    collaborators: Collaborators,
}

struct DemSelection {
    path: PathBuf,
    generated: bool,
}

impl FloodPrepPipeline {
    /// Create a pipeline; relative paths resolve against the current directory.
    ///
    /// With `SIMULATE_HYDROTHRESHOLDS` set, the processor is replaced by
    /// [`SimulatedProcessor`].
    pub fn new(config: FloodPrepConfig, mut collaborators: Collaborators) -> Self {
        if config.simulate_hydrothresholds {
            collaborators.processor = Arc::new(SimulatedProcessor);
        }

        Self {
            config,
            data_dir: PathBuf::from("."),
            work_dir: None,
            codec: Arc::new(GeoTiffCodec::new()),
            collaborators,
        }
    }

    /// Directory that FLOODMAP, DEM and output names are relative to.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Directory for run-scoped temporaries; defaults to the data directory.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    pub fn config(&self) -> &FloodPrepConfig {
        &self.config
    }

    fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Configured name, or `{base}_{suffix}.tif`, resolved against the data dir.
    fn output_path(
        &self,
        configured: Option<&str>,
        workspace: &RunWorkspace,
        suffix: &str,
    ) -> PathBuf {
        match configured {
            Some(name) => self.resolve(name),
            None => self.resolve(&format!("{}_{}.tif", workspace.base_name(), suffix)),
        }
    }

    /// Execute one run.
    #[instrument(skip(self), fields(flood_map = %self.config.flood_map))]
    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let started_at = Utc::now();

        let input = self.resolve(&self.config.flood_map);
        if !input.is_file() {
            return Err(PrepError::InputNotFound(input));
        }

        let work_dir = self.work_dir.clone().unwrap_or_else(|| self.data_dir.clone());
        let mut workspace = RunWorkspace::new(work_dir, &self.config.flood_map);

        let result = self.execute(&input, &mut workspace, started_at).await;

        let deleted = workspace.cleanup(self.config.delete_converted_file, self.config.dem_delete);
        info!(deleted = deleted.len(), "Cleaned up run workspace");

        match result {
            Ok(mut report) => {
                report.deleted_files = deleted;
                report.finished_at = Utc::now();
                info!(
                    case = report.case,
                    simulated = report.simulated,
                    duration_ms = report.duration_ms(),
                    "Flood map preparation complete"
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Flood map preparation failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        input: &Path,
        workspace: &mut RunWorkspace,
        started_at: DateTime<Utc>,
    ) -> Result<RunReport> {
        let encoding = self.config.encoding();
        let case = PrepCase::new(encoding, self.config.remove_permanent_water);
        let strategy = case.strategy();
        info!(
            case = %case,
            encoding = %encoding,
            strategy = %strategy,
            "{}: {} map, permanent water mask {}",
            case,
            encoding,
            strategy
        );

        let source = self.codec.read_u8(input)?;
        info!(
            width = source.width(),
            height = source.height(),
            "Read flood map"
        );

        let remapped = remap(&source, encoding, self.config.remove_permanent_water)?;
        let validation = validate(&remapped).require_water()?;
        let extent = ArtifactExtentMask::from_remapped(&remapped);

        let converted = workspace.converted_path();
        workspace.track(&converted, TempKind::Converted);
        self.codec.write_u8(&remapped, &converted)?;
        info!(path = %converted.display(), "Wrote converted flood map");

        let mask = match strategy {
            MaskStrategy::None => None,
            MaskStrategy::Internal => Some(build_internal_mask(&source)?),
            MaskStrategy::External => {
                let adapter = ExternalMaskAdapter::new(self.collaborators.land_cover.clone());
                Some(adapter.request_mask(&remapped.layout()).await?)
            }
        };
        let mask_file = match &mask {
            Some(mask) => Some(self.write_mask(mask, workspace)?),
            None => None,
        };

        let dem = self.select_dem(&remapped, workspace).await?;

        let water_depth = self.output_path(self.config.output_water_depth(), workspace, "WDM");
        let water_surface = if self.config.produce_wsem_output {
            Some(self.output_path(self.config.output_water_surface(), workspace, "WSEM"))
        } else {
            None
        };

        let params_file = workspace.params_path();
        workspace.track(&params_file, TempKind::Params);

        let request = ThresholdingRequest {
            flood_map: converted.clone(),
            permanent_water_mask: mask_file.clone(),
            dem: dem.as_ref().map(|d| d.path.clone()),
            params: self.config.thresholding_params(),
            output_water_depth: water_depth,
            output_water_surface: water_surface,
            params_file,
        };

        info!(
            dem = ?request.dem,
            mask = ?request.permanent_water_mask,
            "Launching thresholding processor"
        );
        let outputs = self
            .collaborators
            .processor
            .run(&request)
            .await
            .map_err(|e| PrepError::ProcessorInvocation(e.to_string()))?;

        if outputs.simulated {
            warn!("Thresholding was simulated; skipping post-processing");
        } else {
            let value = self.config.permanent_water_fill();
            self.post_process(&outputs.water_depth, &extent, mask.as_ref(), value)?;
            if let Some(surface) = &outputs.water_surface {
                self.post_process(surface, &extent, mask.as_ref(), value)?;
            }
        }

        Ok(RunReport {
            case: case.number(),
            encoding,
            strategy,
            validation,
            flood_map: input.to_path_buf(),
            converted_file: converted,
            mask_file,
            dem_generated: dem.as_ref().is_some_and(|d| d.generated),
            dem: dem.map(|d| d.path),
            water_depth: outputs.water_depth,
            water_surface: outputs.water_surface,
            simulated: outputs.simulated,
            deleted_files: Vec::new(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn write_mask(&self, mask: &MaskRaster, workspace: &mut RunWorkspace) -> Result<PathBuf> {
        let path = workspace.mask_path();
        workspace.track(&path, TempKind::Mask);
        self.codec.write_u8(&mask.to_u8(), &path)?;
        info!(
            path = %path.display(),
            permanent_water_pixels = mask.count_true(),
            "Wrote permanent-water mask"
        );
        Ok(path)
    }

    async fn select_dem(
        &self,
        remapped: &RasterGrid<u8>,
        workspace: &mut RunWorkspace,
    ) -> Result<Option<DemSelection>> {
        if let Some(dem) = self.config.dem() {
            let path = self.resolve(dem);
            info!(path = %path.display(), "Using provided DEM");
            return Ok(Some(DemSelection {
                path,
                generated: false,
            }));
        }

        if !self.config.generate_dem {
            info!("No DEM provided and generation disabled");
            return Ok(None);
        }

        let output = self.output_path(self.config.dem_output(), workspace, "DEM");
        let request = DemRequest {
            extent: remapped.bounds()?,
            epsg: remapped.georef().epsg(),
            resolution: self.config.dem_resolution,
            output: output.clone(),
        };

        info!(
            resolution = %request.resolution,
            output = %output.display(),
            "Generating DEM"
        );
        workspace.track(&output, TempKind::GeneratedDem);
        let path = self
            .collaborators
            .dem
            .generate(&request)
            .await
            .map_err(|e| PrepError::DemUnavailable(e.to_string()))?;
        workspace.track(&path, TempKind::GeneratedDem);

        Ok(Some(DemSelection {
            path,
            generated: true,
        }))
    }

    fn post_process(
        &self,
        path: &Path,
        extent: &ArtifactExtentMask,
        mask: Option<&MaskRaster>,
        value: Option<f32>,
    ) -> Result<()> {
        let output = self.codec.read_f32(path)?;
        let cleaned = finalize(&output, extent, mask, value)?;
        self.codec.write_f32(&cleaned, path)?;
        info!(path = %path.display(), "Post-processed output");
        Ok(())
    }
}
