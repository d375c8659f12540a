//! Nearest-neighbour alignment of one grid onto another grid's layout.

use tracing::debug;

use crate::error::{RasterError, Result};
use crate::grid::{GridLayout, RasterGrid};

/// Resample `source` onto `target` using nearest-neighbour sampling.
///
/// Each target pixel centre is mapped into the source grid; the source pixel
/// containing it supplies the value. Target pixels falling outside the source
/// footprint receive `fill`.
///
/// # Errors
/// * `CrsMismatch` if both grids declare EPSG codes and they differ
/// * `MissingGeoreference` if the layouts differ and either lacks a transform
pub fn align_nearest<T: Copy>(
    source: &RasterGrid<T>,
    target: &GridLayout,
    fill: T,
) -> Result<RasterGrid<T>> {
    if let (Some(source_epsg), Some(target_epsg)) = (source.georef().epsg(), target.georef.epsg())
    {
        if source_epsg != target_epsg {
            return Err(RasterError::CrsMismatch {
                source_epsg,
                target_epsg,
            });
        }
    }

    if source.width() == target.width
        && source.height() == target.height
        && source.georef().transform == target.georef.transform
    {
        return RasterGrid::new(
            source.data().to_vec(),
            target.width,
            target.height,
            target.georef.clone(),
        )
        .map(|grid| grid.with_nodata(source.nodata()));
    }

    let src_tf = source
        .georef()
        .transform
        .ok_or_else(|| RasterError::MissingGeoreference("alignment source".into()))?;
    let dst_tf = target
        .georef
        .transform
        .ok_or_else(|| RasterError::MissingGeoreference("alignment target".into()))?;

    let src_width = source.width();
    let src_height = source.height();
    let src = source.data();

    let mut output = Vec::with_capacity(target.width * target.height);
    let mut outside = 0usize;

    for row in 0..target.height {
        for col in 0..target.width {
            let (x, y) = dst_tf.pixel_center(col, row);
            let (sx, sy) = src_tf.geo_to_pixel(x, y);

            if sx >= 0.0 && sy >= 0.0 && sx < src_width as f64 && sy < src_height as f64 {
                let sc = sx.floor() as usize;
                let sr = sy.floor() as usize;
                output.push(src[sr * src_width + sc]);
            } else {
                outside += 1;
                output.push(fill);
            }
        }
    }

    debug!(
        source = %source.layout().describe(),
        target = %target.describe(),
        outside_pixels = outside,
        "Aligned grid with nearest-neighbour sampling"
    );

    RasterGrid::new(output, target.width, target.height, target.georef.clone())
        .map(|grid| grid.with_nodata(source.nodata()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::georef::{GeoKeys, GeoReference, GeoTransform};

    #[test]
    fn test_identical_layout_is_copy() {
        let georef = GeoReference::new(GeoTransform::new(0.0, 2.0, 1.0, -1.0), None);
        let grid = RasterGrid::new(vec![1u8, 2, 3, 4], 2, 2, georef).unwrap();

        let aligned = align_nearest(&grid, &grid.layout(), 0).unwrap();
        assert_eq!(aligned, grid);
    }

    #[test]
    fn test_coarse_source_upsampled() {
        // 2x2 source at 2-unit cells covering (0,0)-(4,4)
        let src = RasterGrid::new(
            vec![1u8, 2, 3, 4],
            2,
            2,
            GeoReference::new(GeoTransform::new(0.0, 4.0, 2.0, -2.0), None),
        )
        .unwrap();

        // 4x4 target at 1-unit cells over the same extent
        let target = GridLayout {
            width: 4,
            height: 4,
            georef: GeoReference::new(GeoTransform::new(0.0, 4.0, 1.0, -1.0), None),
        };

        let aligned = align_nearest(&src, &target, 0).unwrap();
        assert_eq!(
            aligned.data(),
            &[
                1, 1, 2, 2, //
                1, 1, 2, 2, //
                3, 3, 4, 4, //
                3, 3, 4, 4,
            ]
        );
    }

    #[test]
    fn test_outside_footprint_gets_fill() {
        let src = RasterGrid::new(
            vec![true, true],
            2,
            1,
            GeoReference::new(GeoTransform::new(0.0, 1.0, 1.0, -1.0), None),
        )
        .unwrap();
        let target = GridLayout {
            width: 4,
            height: 1,
            georef: GeoReference::new(GeoTransform::new(0.0, 1.0, 1.0, -1.0), None),
        };

        let aligned = align_nearest(&src, &target, false).unwrap();
        assert_eq!(aligned.data(), &[true, true, false, false]);
    }

    #[test]
    fn test_crs_mismatch_rejected() {
        let mut utm = GeoKeys::default();
        utm.directory = vec![1, 1, 0, 1, 3072, 0, 1, 32633];

        let src = RasterGrid::filled(
            0u8,
            2,
            2,
            GeoReference::new(GeoTransform::new(0.0, 2.0, 1.0, -1.0), Some(GeoKeys::wgs84())),
        );
        let target = GridLayout {
            width: 2,
            height: 2,
            georef: GeoReference::new(GeoTransform::new(0.0, 2.0, 1.0, -1.0), Some(utm)),
        };

        assert!(matches!(
            align_nearest(&src, &target, 0),
            Err(RasterError::CrsMismatch {
                source_epsg: 4326,
                target_epsg: 32633
            })
        ));
    }
}
