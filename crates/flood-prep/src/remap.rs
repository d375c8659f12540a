//! Conversion of a source flood map into the processor encoding.
//!
//! | source        | value | processor |
//! |---------------|-------|-----------|
//! | three-state   | 0     | 255       |
//! | three-state   | 1     | 0         |
//! | three-state   | 2     | 1         |
//! | three-state   | 3     | 1         |
//! | two-state     | 0     | 0         |
//! | two-state     | 1     | 1         |
//!
//! Permanent water (three-state class 2) stays water here whether or not it
//! is going to be removed. Removal happens after thresholding through the
//! permanent-water mask, which reads class 2 from the untouched source.

use flood_common::{MapEncoding, ProcessorClass, ThreeStateClass, TwoStateClass};
use raster_io::RasterGrid;
use tracing::debug;

use crate::error::{PrepError, Result};

/// Map one source value to the processor encoding.
///
/// Returns `None` when the value is outside the encoding's domain.
pub fn remap_value(value: u8, encoding: MapEncoding) -> Option<u8> {
    match encoding {
        MapEncoding::ThreeState => ThreeStateClass::from_value(value).map(|class| match class {
            ThreeStateClass::NoData => ProcessorClass::NODATA,
            ThreeStateClass::NotFlooded => ProcessorClass::NotFlooded.value(),
            ThreeStateClass::PermanentWater | ThreeStateClass::Flooded => ProcessorClass::WATER,
        }),
        MapEncoding::TwoState => TwoStateClass::from_value(value).map(TwoStateClass::value),
    }
}

/// Remap `source` into the processor encoding.
///
/// A pixel equal to the source's declared NoData value that lies outside the
/// encoding domain becomes 255. Any other out-of-domain value fails with
/// [`PrepError::UnsupportedValue`]. `remove_permanent_water` does not change
/// the mapping and is only recorded in the log.
pub fn remap(
    source: &RasterGrid<u8>,
    encoding: MapEncoding,
    remove_permanent_water: bool,
) -> Result<RasterGrid<u8>> {
    let declared_nodata = source
        .nodata()
        .filter(|&nodata| !encoding.contains(nodata));

    let remapped = source.try_map(|value, col, row| match remap_value(value, encoding) {
        Some(mapped) => Ok(mapped),
        None if Some(value) == declared_nodata => Ok(ProcessorClass::NODATA),
        None => Err(PrepError::UnsupportedValue {
            value,
            col,
            row,
            encoding,
        }),
    })?;

    debug!(
        encoding = %encoding,
        remove_permanent_water,
        width = source.width(),
        height = source.height(),
        "Remapped flood map to processor encoding"
    );

    Ok(remapped.with_nodata(Some(ProcessorClass::NODATA)))
}
