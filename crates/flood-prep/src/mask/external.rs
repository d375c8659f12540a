use std::sync::Arc;

use raster_io::{align_nearest, GridLayout, MaskRaster};
use tracing::{info, instrument};

use crate::collaborators::{LandCoverRequest, LandCoverService};
use crate::error::{PrepError, Result};

/// Permanent-water mask from an external land-cover classification.
pub struct ExternalMaskAdapter {
    service: Arc<dyn LandCoverService>,
    water_class: u8,
}

impl ExternalMaskAdapter {
    /// Land-cover class code for permanent water bodies.
    pub const WATER_CLASS: u8 = 80;

    pub fn new(service: Arc<dyn LandCoverService>) -> Self {
        Self {
            service,
            water_class: Self::WATER_CLASS,
        }
    }

    /// Use a different class code as permanent water.
    pub fn with_water_class(mut self, water_class: u8) -> Self {
        self.water_class = water_class;
        self
    }

    pub fn water_class(&self) -> u8 {
        self.water_class
    }

    /// Request the mask for `target` and align it onto that grid.
    ///
    /// Any failure, including a classification that does not overlap the
    /// target at all, is reported as `ExternalMaskUnavailable`. There is no
    /// fallback to running without a mask.
    #[instrument(skip_all, fields(grid = %target.describe()))]
    pub async fn request_mask(&self, target: &GridLayout) -> Result<MaskRaster> {
        let transform = target.georef.transform.ok_or_else(|| {
            PrepError::ExternalMaskUnavailable("working grid has no geotransform".into())
        })?;

        let request = LandCoverRequest {
            extent: transform.bounds(target.width, target.height),
            resolution: transform.resolution(),
            epsg: target.georef.epsg(),
        };

        let classification = self
            .service
            .classification(&request)
            .await
            .map_err(|e| PrepError::ExternalMaskUnavailable(e.to_string()))?;

        let covers_target = classification
            .bounds()
            .map(|coverage| coverage.intersects(&request.extent))
            .unwrap_or(true);
        if !covers_target {
            return Err(PrepError::ExternalMaskUnavailable(format!(
                "land cover does not cover extent {:?}",
                request.extent
            )));
        }

        let water = classification
            .map(|class| class == self.water_class)
            .with_nodata(None);

        let aligned = align_nearest(&water, target, false).map_err(|e| {
            PrepError::ExternalMaskUnavailable(format!("cannot align land cover: {}", e))
        })?;

        info!(
            permanent_water_pixels = aligned.count_true(),
            water_class = self.water_class,
            "Built external permanent-water mask"
        );

        Ok(aligned)
    }
}
