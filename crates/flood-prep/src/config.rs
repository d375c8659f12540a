//! Run configuration.
//!
//! A run is described by a flat JSON object whose keys match the parameter
//! names the launcher has always accepted:
//!
//! ```json
//! {
//!   "FLOODMAP": "20240915_floodmap.tif",
//!   "THREE_STATE": true,
//!   "REMOVE_PERMANENT_WATER": true,
//!   "DEM_RES": "DEM_30M",
//!   "ist": 0.1,
//!   "PATCH_SIZE": 512
//! }
//! ```
//!
//! Every key except `FLOODMAP` is optional and falls back to its default.

use std::fmt;
use std::path::Path;

use flood_common::MapEncoding;
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Immutable configuration of one preparation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodPrepConfig {
    /// Input flood map file name or path.
    #[serde(rename = "FLOODMAP", default)]
    pub flood_map: String,

    /// Input uses the three-state encoding (otherwise two-state).
    #[serde(rename = "THREE_STATE", default = "default_true")]
    pub three_state: bool,

    /// Delete the converted raster (and any permanent-water mask) after the run.
    #[serde(rename = "DELETE_CONVERTED_FILE", default = "default_true")]
    pub delete_converted_file: bool,

    /// Water depth output name; defaults to `{base}_WDM.tif`.
    #[serde(rename = "OUTPUT_WATER_DEPTH", default)]
    pub output_water_depth: Option<String>,

    /// Water surface elevation output name; defaults to `{base}_WSEM.tif`.
    #[serde(rename = "OUTPUT_WATER_SURFACE", default)]
    pub output_water_surface: Option<String>,

    /// Remove permanent water from the final outputs.
    #[serde(rename = "REMOVE_PERMANENT_WATER", default = "default_true")]
    pub remove_permanent_water: bool,

    /// Value written over permanent water; `null` falls back to the output NoData.
    #[serde(
        rename = "PERMANENT_WATER_AS_NO_DATA_VALUE",
        default = "default_permanent_water_nodata"
    )]
    pub permanent_water_nodata: Option<f32>,

    /// Request and post-process the water surface elevation raster.
    #[serde(rename = "PRODUCE_WSEM_OUTPUT", default)]
    pub produce_wsem_output: bool,

    /// Prepare everything but skip the thresholding processor.
    #[serde(rename = "SIMULATE_HYDROTHRESHOLDS", default)]
    pub simulate_hydrothresholds: bool,

    /// Existing DEM to hand to the processor.
    #[serde(rename = "DEM", default)]
    pub dem: Option<String>,

    /// Generate a DEM when none is given.
    #[serde(rename = "GENERATE_DEM", default = "default_true")]
    pub generate_dem: bool,

    /// Resolution of a generated DEM.
    #[serde(rename = "DEM_RES", default)]
    pub dem_resolution: DemResolution,

    /// Delete a generated DEM after the run.
    #[serde(rename = "DEM_DELETE", default = "default_true")]
    pub dem_delete: bool,

    /// File name for a generated DEM; defaults to `{base}_DEM.tif`.
    #[serde(rename = "DEM_OUTPUT", default)]
    pub dem_output: Option<String>,

    /// Threshold step.
    #[serde(rename = "ist", default = "default_ist")]
    pub ist: f64,

    /// Patch size in pixels.
    #[serde(rename = "PATCH_SIZE", default = "default_patch_size")]
    pub patch_size: u32,

    /// Patch overlap fraction in [0, 1).
    #[serde(rename = "OVERLAP", default)]
    pub overlap: f64,

    /// Smoothing window in pixels; 0 disables smoothing.
    #[serde(rename = "SMOOTHING_WINDOW", default = "default_smoothing_window")]
    pub smoothing_window: u32,
}

fn default_true() -> bool {
    true
}

fn default_permanent_water_nodata() -> Option<f32> {
    Some(-9999.0)
}

fn default_ist() -> f64 {
    0.1
}

fn default_patch_size() -> u32 {
    512
}

fn default_smoothing_window() -> u32 {
    256
}

/// Treat an empty string the same as an absent value.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl FloodPrepConfig {
    /// Configuration for `flood_map` with every other key at its default.
    pub fn for_flood_map(flood_map: impl Into<String>) -> Self {
        Self {
            flood_map: flood_map.into(),
            three_state: true,
            delete_converted_file: true,
            output_water_depth: None,
            output_water_surface: None,
            remove_permanent_water: true,
            permanent_water_nodata: default_permanent_water_nodata(),
            produce_wsem_output: false,
            simulate_hydrothresholds: false,
            dem: None,
            generate_dem: true,
            dem_resolution: DemResolution::default(),
            dem_delete: true,
            dem_output: None,
            ist: default_ist(),
            patch_size: default_patch_size(),
            overlap: 0.0,
            smoothing_window: default_smoothing_window(),
        }
    }

    /// Parse a JSON parameter object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON parameter file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PrepError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.flood_map.trim().is_empty() {
            return Err(PrepError::invalid_config("FLOODMAP parameter is required"));
        }

        if !(self.ist > 0.0) {
            return Err(PrepError::invalid_config("ist must be > 0"));
        }

        if self.patch_size == 0 {
            return Err(PrepError::invalid_config("PATCH_SIZE must be > 0"));
        }

        if !(0.0..1.0).contains(&self.overlap) {
            return Err(PrepError::invalid_config("OVERLAP must be in [0, 1)"));
        }

        Ok(())
    }

    pub fn encoding(&self) -> MapEncoding {
        MapEncoding::from_three_state_flag(self.three_state)
    }

    /// User supplied DEM, if any.
    pub fn dem(&self) -> Option<&str> {
        non_empty(&self.dem)
    }

    pub fn dem_output(&self) -> Option<&str> {
        non_empty(&self.dem_output)
    }

    pub fn output_water_depth(&self) -> Option<&str> {
        non_empty(&self.output_water_depth)
    }

    pub fn output_water_surface(&self) -> Option<&str> {
        non_empty(&self.output_water_surface)
    }

    /// Value forced onto permanent-water pixels, when removal is requested.
    pub fn permanent_water_fill(&self) -> Option<f32> {
        if self.remove_permanent_water {
            self.permanent_water_nodata
        } else {
            None
        }
    }

    /// Tuning parameters forwarded to the thresholding processor.
    pub fn thresholding_params(&self) -> ThresholdingParams {
        ThresholdingParams {
            ist: self.ist,
            patch_size: self.patch_size,
            overlap: self.overlap,
            smoothing_window: self.smoothing_window,
        }
    }
}

/// Resolution of a generated DEM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DemResolution {
    #[default]
    #[serde(rename = "DEM_30M")]
    Dem30m,
    #[serde(rename = "DEM_90M")]
    Dem90m,
}

impl DemResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dem30m => "DEM_30M",
            Self::Dem90m => "DEM_90M",
        }
    }
}

impl fmt::Display for DemResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric tuning parameters of the thresholding processor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdingParams {
    #[serde(rename = "ist")]
    pub ist: f64,
    #[serde(rename = "Patch Size")]
    pub patch_size: u32,
    #[serde(rename = "Overlap")]
    pub overlap: f64,
    #[serde(rename = "SMOOTHING_WINDOW")]
    pub smoothing_window: u32,
}
