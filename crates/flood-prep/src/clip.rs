//! Post-processing of thresholding outputs.
//!
//! The thresholding processor tends to extrapolate depth beyond the water
//! it was given. Every output is clipped back to the water extent of the
//! remapped input, then permanent water is blanked when removal was
//! requested:
//!
//! ```text
//! processor output ──► clip(extent) ──► remove_permanent_water(mask) ──► final
//! ```

use flood_common::ProcessorClass;
use raster_io::{align_nearest, GridLayout, MaskRaster, RasterElement, RasterGrid};
use tracing::debug;

use crate::error::{PrepError, Result};

/// Water footprint of the remapped input.
///
/// `true` wherever the remapped flood map holds the water code, which
/// includes permanent water.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactExtentMask(MaskRaster);

impl ArtifactExtentMask {
    pub fn from_remapped(remapped: &RasterGrid<u8>) -> Self {
        Self(remapped.map(|v| v == ProcessorClass::WATER))
    }

    pub fn as_mask(&self) -> &MaskRaster {
        &self.0
    }

    pub fn water_pixel_count(&self) -> usize {
        self.0.count_true()
    }

    /// Resample onto another grid; cells outside the footprint are dry.
    pub fn aligned_to(&self, layout: &GridLayout) -> Result<Self> {
        Ok(Self(align_nearest(&self.0, layout, false)?))
    }
}

/// NoData value used when rewriting `output`.
fn fill_value(output: &RasterGrid<f32>) -> f32 {
    output.nodata().unwrap_or(f32::NAN)
}

/// Force every pixel outside `extent` to the output's NoData value.
///
/// Outputs without a declared NoData get NaN, which is then declared.
/// Clipping an already clipped raster changes nothing.
pub fn clip(output: &RasterGrid<f32>, extent: &ArtifactExtentMask) -> Result<RasterGrid<f32>> {
    clip_with(output, extent, fill_value(output))
}

/// Clip with an explicit fill, which becomes the declared NoData.
///
/// Pixels inside the extent that held the source NoData are moved to the
/// new fill so they stay NoData.
fn clip_with(
    output: &RasterGrid<f32>,
    extent: &ArtifactExtentMask,
    nodata: f32,
) -> Result<RasterGrid<f32>> {
    if !output.same_grid(extent.as_mask()) {
        return Err(PrepError::shape_mismatch(format!(
            "output {} vs water extent {}",
            output.layout().describe(),
            extent.as_mask().layout().describe()
        )));
    }

    let source_nodata = output.nodata();
    let mut clipped = output.clone().with_nodata(Some(nodata));
    let mut artifacts = 0usize;
    for (value, &inside) in clipped.data_mut().iter_mut().zip(extent.as_mask().data()) {
        if !inside {
            if !value.is_nodata(source_nodata) && *value != nodata {
                artifacts += 1;
            }
            *value = nodata;
        } else if value.is_nodata(source_nodata) {
            *value = nodata;
        }
    }

    debug!(artifact_pixels = artifacts, "Clipped output to water extent");
    Ok(clipped)
}

/// Overwrite permanent-water pixels with `value`, which becomes the NoData.
///
/// Without a value the output's own NoData is used.
pub fn remove_permanent_water(
    output: &RasterGrid<f32>,
    mask: &MaskRaster,
    value: Option<f32>,
) -> Result<RasterGrid<f32>> {
    if !output.same_grid(mask) {
        return Err(PrepError::shape_mismatch(format!(
            "output {} vs permanent-water mask {}",
            output.layout().describe(),
            mask.layout().describe()
        )));
    }

    let value = value.unwrap_or_else(|| fill_value(output));
    let mut cleaned = output.clone().with_nodata(Some(value));
    for (pixel, &permanent) in cleaned.data_mut().iter_mut().zip(mask.data()) {
        if permanent {
            *pixel = value;
        }
    }

    debug!(
        permanent_water_pixels = mask.count_true(),
        "Removed permanent water from output"
    );
    Ok(cleaned)
}

/// Clip `output` and, when a mask is given, remove permanent water.
///
/// Masks on a different grid than the output are aligned onto it first.
/// When permanent water is removed with its own `value`, that value is the
/// final NoData and clipped pixels are filled with it as well.
pub fn finalize(
    output: &RasterGrid<f32>,
    extent: &ArtifactExtentMask,
    permanent_water: Option<&MaskRaster>,
    value: Option<f32>,
) -> Result<RasterGrid<f32>> {
    let layout = output.layout();
    let nodata = match (permanent_water, value) {
        (Some(_), Some(value)) => value,
        _ => fill_value(output),
    };

    let clipped = if output.same_grid(extent.as_mask()) {
        clip_with(output, extent, nodata)?
    } else {
        clip_with(output, &extent.aligned_to(&layout)?, nodata)?
    };

    match permanent_water {
        Some(mask) if output.same_grid(mask) => {
            remove_permanent_water(&clipped, mask, Some(nodata))
        }
        Some(mask) => {
            let aligned = align_nearest(mask, &layout, false)?;
            remove_permanent_water(&clipped, &aligned, Some(nodata))
        }
        None => Ok(clipped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_io::{GeoReference, GeoTransform};
    use test_utils::assert_approx_eq;

    fn georef() -> GeoReference {
        GeoReference::new(GeoTransform::new(0.0, 2.0, 1.0, -1.0), None)
    }

    fn output(data: Vec<f32>) -> RasterGrid<f32> {
        RasterGrid::new(data, 2, 2, georef()).unwrap()
    }

    fn extent(remapped: Vec<u8>) -> ArtifactExtentMask {
        ArtifactExtentMask::from_remapped(&RasterGrid::new(remapped, 2, 2, georef()).unwrap())
    }

    fn bits(grid: &RasterGrid<f32>) -> Vec<u32> {
        grid.data().iter().map(|v| v.to_bits()).collect()
    }

    #[test]
    fn test_extent_from_remapped() {
        let extent = extent(vec![255, 0, 1, 1]);
        assert_eq!(extent.as_mask().data(), &[false, false, true, true]);
        assert_eq!(extent.water_pixel_count(), 2);
    }

    #[test]
    fn test_clip_outside_extent_to_nan() {
        let clipped = clip(&output(vec![0.5, 0.7, 1.2, 0.3]), &extent(vec![255, 0, 1, 1])).unwrap();

        assert!(clipped.data()[0].is_nan());
        assert!(clipped.data()[1].is_nan());
        assert_eq!(&clipped.data()[2..], &[1.2, 0.3]);
        assert!(clipped.nodata().is_some_and(f32::is_nan));
    }

    #[test]
    fn test_clip_uses_declared_nodata() {
        let out = output(vec![0.5, 0.7, 1.2, 0.3]).with_nodata(Some(-1.0));
        let clipped = clip(&out, &extent(vec![0, 1, 1, 0])).unwrap();
        assert_eq!(clipped.data(), &[-1.0, 0.7, 1.2, -1.0]);
        assert_eq!(clipped.nodata(), Some(-1.0));
    }

    #[test]
    fn test_clip_is_idempotent() {
        let extent = extent(vec![1, 0, 255, 1]);
        let once = clip(&output(vec![2.0, 3.0, 4.0, 5.0]), &extent).unwrap();
        let twice = clip(&once, &extent).unwrap();

        assert_eq!(bits(&once), bits(&twice));
        assert_eq!(once.georef(), twice.georef());
    }

    #[test]
    fn test_clip_shape_mismatch() {
        let wide = RasterGrid::new(vec![0.0f32; 6], 3, 2, georef()).unwrap();
        let err = clip(&wide, &extent(vec![1, 1, 1, 1])).unwrap_err();
        assert!(matches!(err, PrepError::ShapeMismatch(_)));
    }

    #[test]
    fn test_clip_keeps_depth_inside_extent() {
        let (ox, oy, pw, ph) = test_utils::fixtures::transform::UNIT;
        let georef = GeoReference::new(GeoTransform::new(ox, oy, pw, ph), None);
        let depth = RasterGrid::new(test_utils::indexed_depth(4, 4), 4, 4, georef.clone()).unwrap();
        let remapped = RasterGrid::new(
            test_utils::two_state_with_water(4, 4, &[(1, 0), (3, 1), (2, 3)]),
            4,
            4,
            georef,
        )
        .unwrap();

        let clipped = clip(&depth, &ArtifactExtentMask::from_remapped(&remapped)).unwrap();

        assert_eq!(clipped.count(|v| !v.is_nan()), 3);
        assert_approx_eq!(clipped.get(1, 0).unwrap(), 0.01, 1e-6);
        assert_approx_eq!(clipped.get(3, 1).unwrap(), 0.13, 1e-6);
        assert_approx_eq!(clipped.get(2, 3).unwrap(), 0.32, 1e-6);
    }

    #[test]
    fn test_remove_permanent_water_with_value() {
        let mask = RasterGrid::new(vec![false, true, false, false], 2, 2, georef()).unwrap();
        let cleaned = remove_permanent_water(&output(vec![1.0; 4]), &mask, Some(-9999.0)).unwrap();

        assert_eq!(cleaned.data(), &[1.0, -9999.0, 1.0, 1.0]);
        assert_eq!(cleaned.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_remove_permanent_water_without_value() {
        let mask = RasterGrid::new(vec![true, false, false, false], 2, 2, georef()).unwrap();
        let cleaned = remove_permanent_water(&output(vec![1.0; 4]), &mask, None).unwrap();
        assert!(cleaned.data()[0].is_nan());
        assert_eq!(&cleaned.data()[1..], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_finalize_aligns_coarser_extent() {
        // Output at 0.5-unit cells over the same 2x2 footprint
        let fine = RasterGrid::new(
            test_utils::uniform_depth(4, 4, 1.0),
            4,
            4,
            GeoReference::new(GeoTransform::new(0.0, 2.0, 0.5, -0.5), None),
        )
        .unwrap();

        let result = finalize(&fine, &extent(vec![1, 0, 0, 0]), None, None).unwrap();
        let kept = result.count(|v| !v.is_nan());
        assert_eq!(kept, 4);
        assert_eq!(result.get(0, 0), Some(1.0));
        assert!(result.get(3, 3).is_some_and(f32::is_nan));
    }

    #[test]
    fn test_finalize_clip_then_remove() {
        let mask = RasterGrid::new(vec![false, false, true, false], 2, 2, georef()).unwrap();
        let result = finalize(
            &output(vec![0.4, 0.6, 0.8, 1.0]),
            &extent(vec![255, 0, 1, 1]),
            Some(&mask),
            Some(-9999.0),
        )
        .unwrap();

        assert_eq!(result.data(), &[-9999.0, -9999.0, -9999.0, 1.0]);
        assert_eq!(result.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_finalize_rewrites_processor_nodata() {
        let out = output(vec![-1.0, 0.6, 0.8, 1.0]).with_nodata(Some(-1.0));
        let mask = RasterGrid::new(vec![false, false, true, false], 2, 2, georef()).unwrap();
        let result = finalize(&out, &extent(vec![255, 0, 1, 1]), Some(&mask), Some(-9999.0)).unwrap();

        assert_eq!(result.nodata(), Some(-9999.0));
        let extent_mask = extent(vec![255, 0, 1, 1]);
        for (value, &inside) in result.data().iter().zip(extent_mask.as_mask().data()) {
            if !inside {
                assert_eq!(*value, -9999.0);
            }
        }
        assert_eq!(result.data()[3], 1.0);
    }

    #[test]
    fn test_finalize_moves_nodata_inside_extent() {
        let out = output(vec![0.4, -1.0, 0.8, 1.0]).with_nodata(Some(-1.0));
        let mask = RasterGrid::new(vec![false; 4], 2, 2, georef()).unwrap();
        let result = finalize(&out, &extent(vec![1, 1, 1, 1]), Some(&mask), Some(-9999.0)).unwrap();
        assert_eq!(result.data(), &[0.4, -9999.0, 0.8, 1.0]);
    }

    #[test]
    fn test_finalize_zero_nodata_stays_nodata() {
        let out = output(vec![0.0, 0.0, 0.8, 1.0]).with_nodata(Some(0.0));
        let mask = RasterGrid::new(vec![false; 4], 2, 2, georef()).unwrap();
        let result = finalize(&out, &extent(vec![0, 0, 1, 1]), Some(&mask), Some(-9999.0)).unwrap();

        assert_eq!(result.data(), &[-9999.0, -9999.0, 0.8, 1.0]);
        assert_eq!(result.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_finalize_without_mask_keeps_output_nodata() {
        let out = output(vec![0.5, 0.7, 1.2, 0.3]).with_nodata(Some(-1.0));
        let result = finalize(&out, &extent(vec![0, 1, 1, 0]), None, Some(-9999.0)).unwrap();
        assert_eq!(result.data(), &[-1.0, 0.7, 1.2, -1.0]);
        assert_eq!(result.nodata(), Some(-1.0));
    }
}
