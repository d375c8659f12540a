//! Error types for flood-map preparation.

use std::path::PathBuf;

use flood_common::MapEncoding;
use raster_io::RasterError;
use thiserror::Error;

/// Errors that terminate a preparation run.
///
/// None of these are retried: they describe missing data, malformed input or
/// an unreachable collaborator, not transient conditions.
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("pixel value {value} at ({col}, {row}) is not a valid {encoding} class")]
    UnsupportedValue {
        value: u8,
        col: usize,
        row: usize,
        encoding: MapEncoding,
    },

    #[error("no water found in the input flood map; thresholding not launched")]
    NoWaterFound,

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("external permanent-water mask unavailable: {0}")]
    ExternalMaskUnavailable(String),

    #[error("thresholding processor failed: {0}")]
    ProcessorInvocation(String),

    #[error("DEM unavailable: {0}")]
    DemUnavailable(String),

    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PrepError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for a valid scene that simply holds no water.
    pub fn is_no_water(&self) -> bool {
        matches!(self, Self::NoWaterFound)
    }
}

/// Result type for preparation operations.
pub type Result<T> = std::result::Result<T, PrepError>;
