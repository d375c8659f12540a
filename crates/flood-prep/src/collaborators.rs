//! Black-box collaborators of a preparation run.
//!
//! The pipeline talks to three external systems, each behind a trait so a
//! run can be driven with real services, local commands or test fakes:
//!
//! - [`LandCoverService`]: global land-cover classification for an extent
//! - [`DemService`]: digital elevation model generation for an extent
//! - [`ThresholdingProcessor`]: the flood depth estimation itself
//!
//! None of these retry. A failure is reported once and ends the run.

use std::path::PathBuf;

use async_trait::async_trait;
use flood_common::BoundingBox;
use raster_io::{RasterError, RasterGrid, Resolution};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{DemResolution, ThresholdingParams};

/// Failure reported by a collaborator.
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("process failed: {0}")]
    Process(String),

    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CollaboratorError {
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }
}

/// Area of interest sent to the land-cover service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandCoverRequest {
    /// Extent in the working grid's CRS.
    pub extent: BoundingBox,
    /// Pixel size of the working grid.
    pub resolution: Resolution,
    /// EPSG code of the working grid, when known.
    pub epsg: Option<u32>,
}

/// Global land-cover classification provider.
#[async_trait]
pub trait LandCoverService: Send + Sync {
    /// Fetch the classification raster covering `request.extent`.
    ///
    /// The returned grid may have any resolution and extent; the caller
    /// aligns it onto its own grid.
    async fn classification(
        &self,
        request: &LandCoverRequest,
    ) -> Result<RasterGrid<u8>, CollaboratorError>;
}

/// DEM generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct DemRequest {
    pub extent: BoundingBox,
    pub epsg: Option<u32>,
    pub resolution: DemResolution,
    /// Where the DEM must be written.
    pub output: PathBuf,
}

/// Digital elevation model provider.
#[async_trait]
pub trait DemService: Send + Sync {
    /// Produce a DEM for the request and return the path it was written to.
    async fn generate(&self, request: &DemRequest) -> Result<PathBuf, CollaboratorError>;
}

/// Inputs handed to the thresholding processor.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdingRequest {
    /// Flood map in processor encoding.
    pub flood_map: PathBuf,
    pub permanent_water_mask: Option<PathBuf>,
    pub dem: Option<PathBuf>,
    pub params: ThresholdingParams,
    pub output_water_depth: PathBuf,
    /// Requested only when the water surface output is enabled.
    pub output_water_surface: Option<PathBuf>,
    /// Run-scoped location for a processor parameter file, if one is needed.
    pub params_file: PathBuf,
}

/// Rasters produced by the thresholding processor.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdingOutputs {
    pub water_depth: PathBuf,
    pub water_surface: Option<PathBuf>,
    /// True when no processor actually ran.
    pub simulated: bool,
}

/// Flood depth estimation processor.
#[async_trait]
pub trait ThresholdingProcessor: Send + Sync {
    /// Run the processor to completion.
    ///
    /// This can take minutes; the call returns only once the outputs exist
    /// or the processor has failed.
    async fn run(
        &self,
        request: &ThresholdingRequest,
    ) -> Result<ThresholdingOutputs, CollaboratorError>;
}

/// Stand-in processor for dry runs.
///
/// Reports success with the requested output paths without producing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedProcessor;

#[async_trait]
impl ThresholdingProcessor for SimulatedProcessor {
    async fn run(
        &self,
        request: &ThresholdingRequest,
    ) -> Result<ThresholdingOutputs, CollaboratorError> {
        info!(
            flood_map = %request.flood_map.display(),
            "Simulating thresholding processor"
        );

        Ok(ThresholdingOutputs {
            water_depth: request.output_water_depth.clone(),
            water_surface: request.output_water_surface.clone(),
            simulated: true,
        })
    }
}
