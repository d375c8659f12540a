//! Native GeoTIFF reading/writing (no GDAL dependency).
//!
//! Uses the `tiff` crate for TIFF I/O and handles the GeoTIFF and GDAL tags
//! this workspace depends on:
//!
//! | Tag   | Name                     | Handling                          |
//! |-------|--------------------------|-----------------------------------|
//! | 33550 | ModelPixelScaleTag       | read/write (geotransform)         |
//! | 33922 | ModelTiepointTag         | read/write (geotransform)         |
//! | 34264 | ModelTransformationTag   | read only, north-up matrices      |
//! | 34735 | GeoKeyDirectoryTag       | carried verbatim                  |
//! | 34736 | GeoDoubleParamsTag       | carried verbatim                  |
//! | 34737 | GeoAsciiParamsTag        | carried verbatim                  |
//! | 42113 | GDAL_NODATA              | read/write                        |

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;

use num_traits::NumCast;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::debug;

use crate::element::RasterElement;
use crate::error::{RasterError, Result};
use crate::georef::{GeoKeys, GeoReference, GeoTransform};
use crate::grid::RasterGrid;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const MODEL_TRANSFORMATION_TAG: u16 = 34264;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
const GEO_ASCII_PARAMS_TAG: u16 = 34737;
const GDAL_NODATA_TAG: u16 = 42113;

/// Reads and writes single-band rasters.
///
/// Classification maps are handled as `u8`, depth and elevation rasters as
/// `f32`. Implementations must preserve georeferencing and NoData.
pub trait RasterCodec: Send + Sync {
    /// Read a classification raster.
    fn read_u8(&self, path: &Path) -> Result<RasterGrid<u8>>;

    /// Read a continuous-valued raster.
    fn read_f32(&self, path: &Path) -> Result<RasterGrid<f32>>;

    /// Write a classification raster.
    fn write_u8(&self, grid: &RasterGrid<u8>, path: &Path) -> Result<()>;

    /// Write a continuous-valued raster.
    fn write_f32(&self, grid: &RasterGrid<f32>, path: &Path) -> Result<()>;
}

/// GeoTIFF implementation of [`RasterCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffCodec;

impl GeoTiffCodec {
    pub fn new() -> Self {
        Self
    }
}

impl RasterCodec for GeoTiffCodec {
    fn read_u8(&self, path: &Path) -> Result<RasterGrid<u8>> {
        read_geotiff(path)
    }

    fn read_f32(&self, path: &Path) -> Result<RasterGrid<f32>> {
        read_geotiff(path)
    }

    fn write_u8(&self, grid: &RasterGrid<u8>, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        encode_geotiff::<colortype::Gray8, _, _>(grid, writer)?;
        debug!(path = %path.display(), width = grid.width(), height = grid.height(), "Wrote u8 GeoTIFF");
        Ok(())
    }

    fn write_f32(&self, grid: &RasterGrid<f32>, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        encode_geotiff::<colortype::Gray32Float, _, _>(grid, writer)?;
        debug!(path = %path.display(), width = grid.width(), height = grid.height(), "Wrote f32 GeoTIFF");
        Ok(())
    }
}

/// Read the first band of a GeoTIFF file.
pub fn read_geotiff<T, P>(path: P) -> Result<RasterGrid<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    let grid = decode_geotiff(BufReader::new(file))
        .map_err(|e| match e {
            RasterError::Decode(msg) => {
                RasterError::Decode(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
    debug!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        epsg = ?grid.georef().epsg(),
        "Read GeoTIFF"
    );
    Ok(grid)
}

/// Read a GeoTIFF held in memory (e.g. an HTTP response body).
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<RasterGrid<T>> {
    decode_geotiff(Cursor::new(data))
}

fn decode_geotiff<T, R>(reader: R) -> Result<RasterGrid<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| RasterError::decode(format!("TIFF decode error: {}", e)))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| RasterError::decode(format!("cannot read dimensions: {}", e)))?;
    let (width, height) = (width as usize, height as usize);

    let nodata = decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA_TAG))
        .ok()
        .and_then(|text| T::parse_nodata(&text));
    let georef = read_georeference(&mut decoder);

    let result = decoder
        .read_image()
        .map_err(|e| RasterError::decode(format!("cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::U8(buf) => cast_samples(buf, nodata)?,
        DecodingResult::U16(buf) => cast_samples(buf, nodata)?,
        DecodingResult::U32(buf) => cast_samples(buf, nodata)?,
        DecodingResult::U64(buf) => cast_samples(buf, nodata)?,
        DecodingResult::I8(buf) => cast_samples(buf, nodata)?,
        DecodingResult::I16(buf) => cast_samples(buf, nodata)?,
        DecodingResult::I32(buf) => cast_samples(buf, nodata)?,
        DecodingResult::I64(buf) => cast_samples(buf, nodata)?,
        DecodingResult::F32(buf) => cast_samples(buf, nodata)?,
        DecodingResult::F64(buf) => cast_samples(buf, nodata)?,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(RasterError::UnsupportedDataType(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    if data.len() != width * height {
        return Err(RasterError::UnsupportedDataType(format!(
            "expected a single band of {}x{} samples, got {}",
            width,
            height,
            data.len()
        )));
    }

    Ok(RasterGrid::new(data, width, height, georef)?.with_nodata(nodata))
}

/// Convert decoded samples into `T`.
///
/// Samples that do not fit `T` become the declared NoData value; without one
/// the read fails. Fractional samples never convert to an integral `T`.
fn cast_samples<S, T>(buf: Vec<S>, nodata: Option<T>) -> Result<Vec<T>>
where
    S: NumCast + Copy + std::fmt::Debug,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| {
            if T::INTEGRAL && is_fractional(v) {
                return Err(RasterError::UnsupportedDataType(format!(
                    "sample {:?} is not a whole number and cannot be read as {}",
                    v,
                    T::type_name()
                )));
            }
            cast_sample(v, nodata)
        })
        .collect()
}

fn is_fractional<S: NumCast>(sample: S) -> bool {
    num_traits::cast::<S, f64>(sample).is_some_and(|v| v.is_finite() && v.fract() != 0.0)
}

fn cast_sample<S, T>(v: S, nodata: Option<T>) -> Result<T>
where
    S: NumCast + Copy + std::fmt::Debug,
    T: RasterElement,
{
    match num_traits::cast::<S, T>(v) {
        Some(cast) => Ok(cast),
        None => nodata.ok_or_else(|| {
            RasterError::UnsupportedDataType(format!(
                "sample {:?} does not fit {}",
                v,
                T::type_name()
            ))
        }),
    }
}

fn read_georeference<R: Read + Seek>(decoder: &mut Decoder<R>) -> GeoReference {
    let transform = read_geotransform(decoder);

    let geokeys = decoder
        .get_tag_u32_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG))
        .ok()
        .map(|directory| GeoKeys {
            directory: directory.into_iter().map(|v| v as u16).collect(),
            double_params: decoder
                .get_tag_f64_vec(Tag::from_u16_exhaustive(GEO_DOUBLE_PARAMS_TAG))
                .unwrap_or_default(),
            ascii_params: decoder
                .get_tag_ascii_string(Tag::from_u16_exhaustive(GEO_ASCII_PARAMS_TAG))
                .ok()
                .map(|text| text.trim_end_matches('\0').to_string()),
        });

    GeoReference { transform, geokeys }
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG))
        .ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG)).ok();

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    // 4x4 row-major matrix; only north-up (no shear) matrices are accepted
    let matrix = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION_TAG))
        .ok()?;
    if matrix.len() >= 8 && matrix[1] == 0.0 && matrix[4] == 0.0 {
        return Some(GeoTransform::new(matrix[3], matrix[7], matrix[0], matrix[5]));
    }

    None
}

fn encode_geotiff<C, T, W>(grid: &RasterGrid<T>, writer: W) -> Result<()>
where
    C: ColorType<Inner = T>,
    [T]: TiffValue,
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| RasterError::encode(format!("TIFF encoder error: {}", e)))?;

    let mut image = encoder
        .new_image::<C>(grid.width() as u32, grid.height() as u32)
        .map_err(|e| RasterError::encode(format!("cannot create TIFF image: {}", e)))?;

    let georef = grid.georef();
    if let Some(tf) = georef.transform {
        let scale = [tf.pixel_width, tf.pixel_height.abs(), 0.0];
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG), &scale[..])
            .map_err(|e| RasterError::encode(format!("cannot write scale tag: {}", e)))?;

        let tiepoint = [0.0, 0.0, 0.0, tf.origin_x, tf.origin_y, 0.0];
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG), &tiepoint[..])
            .map_err(|e| RasterError::encode(format!("cannot write tiepoint tag: {}", e)))?;
    }

    match &georef.geokeys {
        Some(keys) => {
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG), &keys.directory[..])
                .map_err(|e| RasterError::encode(format!("cannot write geokey tag: {}", e)))?;
            if !keys.double_params.is_empty() {
                image
                    .encoder()
                    .write_tag(Tag::from_u16_exhaustive(GEO_DOUBLE_PARAMS_TAG), &keys.double_params[..])
                    .map_err(|e| {
                        RasterError::encode(format!("cannot write geo double params: {}", e))
                    })?;
            }
            if let Some(ascii) = &keys.ascii_params {
                image
                    .encoder()
                    .write_tag(Tag::from_u16_exhaustive(GEO_ASCII_PARAMS_TAG), ascii.as_str())
                    .map_err(|e| {
                        RasterError::encode(format!("cannot write geo ascii params: {}", e))
                    })?;
            }
        }
        None if georef.transform.is_some() => {
            // Minimal directory so GIS tools accept the file as a GeoTIFF:
            // GTRasterTypeGeoKey = RasterPixelIsArea
            let geokeys: [u16; 8] = [1, 1, 0, 1, 1025, 0, 1, 1];
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY_TAG), &geokeys[..])
                .map_err(|e| RasterError::encode(format!("cannot write geokey tag: {}", e)))?;
        }
        None => {}
    }

    if let Some(nodata) = grid.nodata() {
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(GDAL_NODATA_TAG), nodata.nodata_text().as_str())
            .map_err(|e| RasterError::encode(format!("cannot write nodata tag: {}", e)))?;
    }

    image
        .write_data(grid.data())
        .map_err(|e| RasterError::encode(format!("cannot write image data: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_geotiff_f32_to_buffer(grid: &RasterGrid<f32>) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        encode_geotiff::<colortype::Gray32Float, _, _>(grid, Cursor::new(&mut buf))?;
        Ok(buf)
    }

    #[test]
    fn test_buffer_roundtrip_keeps_nodata_and_transform() {
        let georef = GeoReference::new(
            GeoTransform::new(12.0, 42.0, 0.001, -0.001),
            Some(GeoKeys::wgs84()),
        );
        let grid = RasterGrid::new(vec![0.0f32, 1.5, -9999.0, 3.25], 2, 2, georef)
            .unwrap()
            .with_nodata(Some(-9999.0));

        let bytes = write_geotiff_f32_to_buffer(&grid).unwrap();
        let decoded: RasterGrid<f32> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(decoded, grid);
        assert_eq!(decoded.georef().epsg(), Some(4326));
    }

    #[test]
    fn test_float_samples_read_as_u8() {
        let grid = RasterGrid::new(
            vec![0.0f32, 1.0, 2.0, 3.0],
            2,
            2,
            GeoReference::default(),
        )
        .unwrap();
        let bytes = write_geotiff_f32_to_buffer(&grid).unwrap();

        let decoded: RasterGrid<u8> = read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(decoded.data(), &[0, 1, 2, 3]);
        assert_eq!(decoded.georef().transform, None);
    }

    #[test]
    fn test_unrepresentable_sample_without_nodata_fails() {
        let grid = RasterGrid::new(vec![0.0f32, -1.0], 2, 1, GeoReference::default()).unwrap();
        let bytes = write_geotiff_f32_to_buffer(&grid).unwrap();

        let result: Result<RasterGrid<u8>> = read_geotiff_from_buffer(&bytes);
        assert!(matches!(result, Err(RasterError::UnsupportedDataType(_))));
    }

    #[test]
    fn test_fractional_samples_rejected_as_u8() {
        let grid = RasterGrid::new(vec![1.0f32, 2.7, 3.0, 0.0], 2, 2, GeoReference::default())
            .unwrap()
            .with_nodata(Some(255.0));
        let bytes = write_geotiff_f32_to_buffer(&grid).unwrap();

        let result: Result<RasterGrid<u8>> = read_geotiff_from_buffer(&bytes);
        assert!(matches!(result, Err(RasterError::UnsupportedDataType(_))));

        let depth: RasterGrid<f32> = read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(depth.data()[1], 2.7);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let result: Result<RasterGrid<u8>> = read_geotiff_from_buffer(b"not a tiff");
        assert!(matches!(result, Err(RasterError::Decode(_))));
    }
}
