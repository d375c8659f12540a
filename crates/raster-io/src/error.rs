//! Error types for raster I/O.

use thiserror::Error;

/// Errors that can occur while reading, writing or aligning rasters.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Failed to decode a raster file.
    #[error("failed to decode raster: {0}")]
    Decode(String),

    /// Failed to encode a raster file.
    #[error("failed to encode raster: {0}")]
    Encode(String),

    /// The file uses a sample layout this codec cannot represent.
    #[error("unsupported raster data type: {0}")]
    UnsupportedDataType(String),

    /// Pixel buffer does not match the declared dimensions.
    #[error("pixel buffer of length {len} does not match {width}x{height}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    /// Two grids declare different coordinate reference systems.
    #[error("CRS mismatch: EPSG:{source_epsg} cannot be aligned onto EPSG:{target_epsg}")]
    CrsMismatch { source_epsg: u32, target_epsg: u32 },

    /// An operation needed a geotransform the raster does not carry.
    #[error("raster has no georeferencing: {0}")]
    MissingGeoreference(String),

    /// Storage/IO error.
    #[error("raster I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    /// Create a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an Encode error.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
