use flood_common::ThreeStateClass;
use raster_io::{MaskRaster, RasterGrid};
use tracing::debug;

use crate::error::{PrepError, Result};

/// Build the permanent-water mask from an unremapped three-state map.
///
/// A pixel is masked where the source holds class 2. The mask shares the
/// source's grid exactly, so no resampling is involved. A map without any
/// class 2 pixel yields an all-false mask.
///
/// # Errors
/// `ShapeMismatch` if the source holds a value outside the three-state
/// domain that is not its declared NoData value.
pub fn build_internal_mask(original: &RasterGrid<u8>) -> Result<MaskRaster> {
    let nodata = original.nodata();
    let permanent = ThreeStateClass::PermanentWater.value();

    let mask = original.try_map(|value, col, row| {
        if ThreeStateClass::from_value(value).is_some() || Some(value) == nodata {
            Ok(value == permanent)
        } else {
            Err(PrepError::shape_mismatch(format!(
                "internal mask needs a three-state map, found value {} at ({}, {})",
                value, col, row
            )))
        }
    })?;

    debug!(
        permanent_water_pixels = mask.count_true(),
        "Built internal permanent-water mask"
    );

    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_io::{GeoReference, GeoTransform};

    fn grid(data: Vec<u8>, width: usize, height: usize) -> RasterGrid<u8> {
        let georef = GeoReference::new(GeoTransform::new(0.0, 2.0, 1.0, -1.0), None);
        RasterGrid::new(data, width, height, georef).unwrap()
    }

    #[test]
    fn test_marks_class_two_only() {
        let source = grid(vec![0, 1, 2, 3], 2, 2);
        let mask = build_internal_mask(&source).unwrap();

        assert_eq!(mask.data(), &[false, false, true, false]);
        assert!(mask.same_grid(&source));
        assert_eq!(mask.georef(), source.georef());
    }

    #[test]
    fn test_no_permanent_water_is_all_false() {
        let mask = build_internal_mask(&grid(vec![0, 1, 3, 3, 1, 0], 3, 2)).unwrap();
        assert_eq!(mask.count_true(), 0);
    }

    #[test]
    fn test_rejects_non_three_state_values() {
        let err = build_internal_mask(&grid(vec![0, 1, 7, 3], 2, 2)).unwrap_err();
        assert!(matches!(err, PrepError::ShapeMismatch(_)));
    }

    #[test]
    fn test_declared_nodata_is_not_masked() {
        let source = grid(vec![255, 2, 1, 3], 2, 2).with_nodata(Some(255));
        let mask = build_internal_mask(&source).unwrap();
        assert_eq!(mask.data(), &[false, true, false, false]);
    }
}
