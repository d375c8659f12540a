//! Pixel value trait for raster cells.

use num_traits::NumCast;
use std::fmt::Debug;

/// Types that can be stored in a GeoTIFF-backed raster cell.
pub trait RasterElement: Copy + Debug + PartialEq + NumCast + Send + Sync + 'static {
    /// Whether the type only holds whole numbers.
    const INTEGRAL: bool;

    /// Short type name used in error messages.
    fn type_name() -> &'static str;

    /// Whether this value represents NoData.
    ///
    /// Floating point NaN always counts as NoData.
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Parse a GDAL_NODATA tag value into this type.
    fn parse_nodata(text: &str) -> Option<Self> {
        let cleaned = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        let value: f64 = cleaned.parse().ok()?;
        num_traits::cast(value)
    }

    /// Render a NoData value for the GDAL_NODATA tag.
    fn nodata_text(self) -> String;
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            const INTEGRAL: bool = true;

            fn type_name() -> &'static str {
                stringify!($t)
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.map_or(false, |nd| *self == nd)
            }

            fn nodata_text(self) -> String {
                self.to_string()
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            const INTEGRAL: bool = false;

            fn type_name() -> &'static str {
                stringify!($t)
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                nodata.map_or(false, |nd| *self == nd)
            }

            fn nodata_text(self) -> String {
                if self.is_nan() {
                    "nan".to_string()
                } else {
                    self.to_string()
                }
            }
        }
    };
}

impl_raster_element_int!(u8);
impl_raster_element_int!(u16);
impl_raster_element_int!(i16);
impl_raster_element_int!(i32);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);
