//! Georeferencing carried alongside every raster grid.

use flood_common::BoundingBox;
use serde::{Deserialize, Serialize};

/// GeoKey id of ProjectedCSTypeGeoKey.
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
/// GeoKey id of GeographicTypeGeoKey.
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
/// GeoKey codes at or above this value are "user defined", not EPSG codes.
const USER_DEFINED: u16 = 32767;

/// Affine transform for a north-up raster (no rotation terms).
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Geographic coordinates of a pixel centre.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional pixel coordinates `(col, row)` of a geographic point.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Extent covered by a `width` x `height` grid.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let far_x = self.origin_x + width as f64 * self.pixel_width;
        let far_y = self.origin_y + height as f64 * self.pixel_height;
        BoundingBox::new(
            self.origin_x.min(far_x),
            self.origin_y.min(far_y),
            self.origin_x.max(far_x),
            self.origin_y.max(far_y),
        )
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            x: self.pixel_width.abs(),
            y: self.pixel_height.abs(),
        }
    }
}

/// Absolute cell size in CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub x: f64,
    pub y: f64,
}

/// Raw GeoTIFF key directory, kept verbatim so the CRS survives rewrites.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoKeys {
    /// GeoKeyDirectoryTag (34735)
    pub directory: Vec<u16>,
    /// GeoDoubleParamsTag (34736)
    pub double_params: Vec<f64>,
    /// GeoAsciiParamsTag (34737)
    pub ascii_params: Option<String>,
}

impl GeoKeys {
    /// EPSG code of the raster CRS, when the key directory names one directly.
    ///
    /// Projected CRS keys take precedence over geographic ones.
    pub fn epsg(&self) -> Option<u32> {
        let lookup = |wanted: u16| -> Option<u32> {
            // Header is 4 shorts, then 4 shorts per key:
            // KeyID, TIFFTagLocation, Count, Value_Offset
            self.directory
                .get(4..)?
                .chunks_exact(4)
                .find(|entry| entry[0] == wanted && entry[1] == 0)
                .map(|entry| entry[3])
                .filter(|code| *code != 0 && *code < USER_DEFINED)
                .map(u32::from)
        };

        lookup(PROJECTED_CS_TYPE_KEY).or_else(|| lookup(GEOGRAPHIC_TYPE_KEY))
    }

    /// Minimal key directory declaring a geographic WGS84 raster.
    pub fn wgs84() -> Self {
        Self {
            directory: vec![
                1, 1, 0, 3, // version 1.1.0, 3 keys
                1024, 0, 1, 2, // GTModelTypeGeoKey = Geographic
                1025, 0, 1, 1, // GTRasterTypeGeoKey = PixelIsArea
                2048, 0, 1, 4326, // GeographicTypeGeoKey = WGS84
            ],
            double_params: Vec::new(),
            ascii_params: None,
        }
    }
}

/// Georeferencing metadata of a raster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoReference {
    pub transform: Option<GeoTransform>,
    pub geokeys: Option<GeoKeys>,
}

impl GeoReference {
    pub fn new(transform: GeoTransform, geokeys: Option<GeoKeys>) -> Self {
        Self {
            transform: Some(transform),
            geokeys,
        }
    }

    pub fn epsg(&self) -> Option<u32> {
        self.geokeys.as_ref().and_then(GeoKeys::epsg)
    }
}
