//! Concrete collaborators used by the launcher.
//!
//! - [`HttpLandCoverService`]: POSTs the scene extent to a land-cover
//!   extraction endpoint and decodes the GeoTIFF it returns
//! - [`HttpDemService`]: POSTs the scene extent to a DEM extraction endpoint
//!   and stores the GeoTIFF it returns
//! - [`CommandProcessor`]: runs the thresholding processor as a local
//!   executable with a JSON parameter file

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use flood_common::CornerBox;
use flood_prep::{
    CollaboratorError, DemRequest, DemService, LandCoverRequest, LandCoverService,
    ThresholdingOutputs, ThresholdingParams, ThresholdingProcessor, ThresholdingRequest,
};
use raster_io::codec::read_geotiff_from_buffer;
use raster_io::RasterGrid;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument};

fn http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// POST `body` as JSON and return the response bytes.
async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    body: &B,
) -> Result<Bytes, CollaboratorError> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| CollaboratorError::request(format!("{}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CollaboratorError::request(format!(
            "{} returned {}",
            url, status
        )));
    }

    response
        .bytes()
        .await
        .map_err(|e| CollaboratorError::request(format!("{}: {}", url, e)))
}

#[derive(Debug, Serialize)]
struct LandCoverBody {
    #[serde(rename = "BBOX")]
    bbox: CornerBox,
    #[serde(rename = "RESOLUTION")]
    resolution: f64,
    #[serde(rename = "EPSG", skip_serializing_if = "Option::is_none")]
    epsg: Option<u32>,
}

/// Land-cover classification over HTTP.
pub struct HttpLandCoverService {
    client: Client,
    url: Option<String>,
}

impl HttpLandCoverService {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url,
        })
    }
}

#[async_trait]
impl LandCoverService for HttpLandCoverService {
    #[instrument(skip(self), fields(url = ?self.url))]
    async fn classification(
        &self,
        request: &LandCoverRequest,
    ) -> Result<RasterGrid<u8>, CollaboratorError> {
        let url = self.url.as_deref().ok_or_else(|| {
            CollaboratorError::NotConfigured("land-cover service (--landcover-url)".into())
        })?;

        let body = LandCoverBody {
            bbox: request.extent.to_corners(),
            resolution: request.resolution.x.abs(),
            epsg: request.epsg,
        };
        debug!(body = ?body, "Requesting land cover");

        let bytes = post_json(&self.client, url, &body).await?;
        let grid = read_geotiff_from_buffer::<u8>(&bytes)?;

        info!(
            size = bytes.len(),
            width = grid.width(),
            height = grid.height(),
            "Received land cover"
        );
        Ok(grid)
    }
}

#[derive(Debug, Serialize)]
struct DemBody {
    #[serde(rename = "BBOX")]
    bbox: CornerBox,
    #[serde(rename = "DEM_RES")]
    dem_res: &'static str,
    #[serde(rename = "EPSG", skip_serializing_if = "Option::is_none")]
    epsg: Option<u32>,
}

/// DEM extraction over HTTP.
pub struct HttpDemService {
    client: Client,
    url: Option<String>,
}

impl HttpDemService {
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url,
        })
    }
}

#[async_trait]
impl DemService for HttpDemService {
    #[instrument(skip(self), fields(url = ?self.url, output = %request.output.display()))]
    async fn generate(&self, request: &DemRequest) -> Result<PathBuf, CollaboratorError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| CollaboratorError::NotConfigured("DEM service (--dem-url)".into()))?;

        let body = DemBody {
            bbox: request.extent.to_corners(),
            dem_res: request.resolution.as_str(),
            epsg: request.epsg,
        };

        let bytes = post_json(&self.client, url, &body).await?;
        tokio::fs::write(&request.output, &bytes).await?;

        info!(size = bytes.len(), "Stored generated DEM");
        Ok(request.output.clone())
    }
}

/// Parameter file handed to the processor executable.
#[derive(Debug, Serialize)]
struct ProcessorParams<'a> {
    #[serde(rename = "FLOODMAP")]
    flood_map: &'a Path,
    #[serde(rename = "PERMANENT_WATER_MASK", skip_serializing_if = "Option::is_none")]
    permanent_water_mask: Option<&'a Path>,
    #[serde(rename = "DEM", skip_serializing_if = "Option::is_none")]
    dem: Option<&'a Path>,
    #[serde(rename = "OUTPUT_WATER_DEPTH")]
    output_water_depth: &'a Path,
    #[serde(rename = "OUTPUT_WATER_SURFACE", skip_serializing_if = "Option::is_none")]
    output_water_surface: Option<&'a Path>,
    #[serde(flatten)]
    params: ThresholdingParams,
}

impl<'a> From<&'a ThresholdingRequest> for ProcessorParams<'a> {
    fn from(request: &'a ThresholdingRequest) -> Self {
        Self {
            flood_map: &request.flood_map,
            permanent_water_mask: request.permanent_water_mask.as_deref(),
            dem: request.dem.as_deref(),
            output_water_depth: &request.output_water_depth,
            output_water_surface: request.output_water_surface.as_deref(),
            params: request.params,
        }
    }
}

/// Thresholding processor run as a local executable.
///
/// The executable receives the path of a JSON parameter file as its only
/// argument and must write the requested outputs before exiting with 0.
pub struct CommandProcessor {
    command: Option<String>,
}

impl CommandProcessor {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl ThresholdingProcessor for CommandProcessor {
    #[instrument(skip_all, fields(command = ?self.command))]
    async fn run(
        &self,
        request: &ThresholdingRequest,
    ) -> Result<ThresholdingOutputs, CollaboratorError> {
        let command = self.command.as_deref().ok_or_else(|| {
            CollaboratorError::NotConfigured("thresholding processor (--processor-cmd)".into())
        })?;

        let params = serde_json::to_vec_pretty(&ProcessorParams::from(request))
            .map_err(|e| CollaboratorError::process(format!("cannot encode parameters: {}", e)))?;
        tokio::fs::write(&request.params_file, params).await?;

        info!(params = %request.params_file.display(), "Running thresholding processor");
        let output = tokio::process::Command::new(command)
            .arg(&request.params_file)
            .output()
            .await
            .map_err(|e| CollaboratorError::process(format!("failed to run {}: {}", command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::process(if stderr.trim().is_empty() {
                format!("{} exited with {}", command, output.status)
            } else {
                stderr.into_owned()
            }));
        }

        let expected = std::iter::once(&request.output_water_depth)
            .chain(request.output_water_surface.as_ref());
        for path in expected {
            if !path.is_file() {
                return Err(CollaboratorError::process(format!(
                    "processor did not write {}",
                    path.display()
                )));
            }
        }

        Ok(ThresholdingOutputs {
            water_depth: request.output_water_depth.clone(),
            water_surface: request.output_water_surface.clone(),
            simulated: false,
        })
    }
}
