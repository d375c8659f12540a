//! Water presence check on the remapped flood map.

use flood_common::ProcessorClass;
use raster_io::RasterGrid;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PrepError, Result};

/// Outcome of the water presence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub has_water: bool,
    pub water_pixel_count: usize,
}

impl ValidationResult {
    /// Fail with [`PrepError::NoWaterFound`] when the scene holds no water.
    pub fn require_water(self) -> Result<Self> {
        if self.has_water {
            Ok(self)
        } else {
            Err(PrepError::NoWaterFound)
        }
    }
}

/// Count water pixels of a raster in processor encoding.
///
/// Only the water code counts; NoData (255) and not-flooded (0) never do.
pub fn validate(remapped: &RasterGrid<u8>) -> ValidationResult {
    let water_pixel_count = remapped.count(|v| v == ProcessorClass::WATER);
    let result = ValidationResult {
        has_water: water_pixel_count > 0,
        water_pixel_count,
    };

    if result.has_water {
        info!(water_pixels = water_pixel_count, "Flood map contains water");
    } else {
        warn!("No water found in the flood map");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_io::GeoReference;

    fn grid(data: Vec<u8>) -> RasterGrid<u8> {
        let len = data.len();
        RasterGrid::new(data, len, 1, GeoReference::default()).unwrap()
    }

    #[test]
    fn test_counts_water_only() {
        let result = validate(&grid(vec![255, 0, 1, 1, 0]));
        assert!(result.has_water);
        assert_eq!(result.water_pixel_count, 2);
        assert!(result.require_water().is_ok());
    }

    #[test]
    fn test_nodata_only_has_no_water() {
        let result = validate(&grid(vec![255; 9]));
        assert!(!result.has_water);
        assert_eq!(result.water_pixel_count, 0);
        assert!(result.require_water().unwrap_err().is_no_water());
    }

    #[test]
    fn test_dry_scene() {
        let result = validate(&grid(vec![0, 0, 255, 0]));
        assert_eq!(
            result,
            ValidationResult {
                has_water: false,
                water_pixel_count: 0
            }
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(validate(&grid(vec![1]))).unwrap();
        assert_eq!(json["hasWater"], true);
        assert_eq!(json["waterPixelCount"], 1);
    }
}
