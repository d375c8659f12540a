//! Raster grids and GeoTIFF I/O for flood-map preparation.
//!
//! This crate owns the pixel containers that every preparation step works
//! on, and the codec used to move them on and off disk:
//!
//! - **RasterGrid**: a row-major single-band grid with an optional NoData
//!   sentinel and the georeferencing it was read with
//! - **GeoTIFF codec**: native reader/writer (no GDAL) that carries the
//!   geotransform, GeoKey directory and GDAL NoData tag through untouched
//! - **Alignment**: nearest-neighbour resampling of one grid onto another
//!   grid's layout
//!
//! # Architecture
//!
//! ```text
//! flood map .tif
//!      │
//!      ▼
//! GeoTiffCodec::read_u8 ──► RasterGrid<u8> ──► preparation steps
//!                                                   │
//!                         RasterGrid<f32> ◄─────────┘
//!                              │
//!                              ▼
//!                  GeoTiffCodec::write_f32 ──► output .tif
//! ```
//!
//! # Example
//!
//! ```ignore
//! use raster_io::{GeoTiffCodec, RasterCodec};
//!
//! let codec = GeoTiffCodec::new();
//! let grid = codec.read_u8(Path::new("scene_floodmap.tif"))?;
//! let flooded = grid.count(|v| v == 3);
//! ```

pub mod align;
pub mod codec;
pub mod element;
pub mod error;
pub mod georef;
pub mod grid;

// Re-export commonly used types at crate root
pub use align::align_nearest;
pub use codec::{GeoTiffCodec, RasterCodec};
pub use element::RasterElement;
pub use error::{RasterError, Result};
pub use georef::{GeoKeys, GeoReference, GeoTransform, Resolution};
pub use grid::{GridLayout, MaskRaster, RasterGrid};
