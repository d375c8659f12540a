//! Row-major single-band raster grid.

use flood_common::BoundingBox;

use crate::error::{RasterError, Result};
use crate::georef::GeoReference;

/// Shape and georeferencing of a grid, without its pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub width: usize,
    pub height: usize,
    pub georef: GeoReference,
}

impl GridLayout {
    pub fn describe(&self) -> String {
        match self.georef.transform {
            Some(tf) => format!(
                "{}x{} @ ({}, {}) step ({}, {})",
                self.width, self.height, tf.origin_x, tf.origin_y, tf.pixel_width, tf.pixel_height
            ),
            None => format!("{}x{} (no geotransform)", self.width, self.height),
        }
    }
}

/// A single-band raster.
///
/// Pixels are stored row-major, top row first. Every derived grid keeps the
/// georeferencing of the grid it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    nodata: Option<T>,
    georef: GeoReference,
}

/// Boolean raster aligned to a working grid.
pub type MaskRaster = RasterGrid<bool>;

impl<T: Copy> RasterGrid<T> {
    /// Create a grid from row-major pixel data.
    pub fn new(data: Vec<T>, width: usize, height: usize, georef: GeoReference) -> Result<Self> {
        if data.len() != width * height {
            return Err(RasterError::InvalidDimensions {
                width,
                height,
                len: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            nodata: None,
            georef,
        })
    }

    /// Create a grid where every pixel holds `value`.
    pub fn filled(value: T, width: usize, height: usize, georef: GeoReference) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
            nodata: None,
            georef,
        }
    }

    /// Set the NoData sentinel.
    pub fn with_nodata(mut self, nodata: Option<T>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn georef(&self) -> &GeoReference {
        &self.georef
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at a grid coordinate.
    pub fn get(&self, col: usize, row: usize) -> Option<T> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    pub fn layout(&self) -> GridLayout {
        GridLayout {
            width: self.width,
            height: self.height,
            georef: self.georef.clone(),
        }
    }

    /// Whether `other` has the same shape and geotransform.
    pub fn same_grid<U>(&self, other: &RasterGrid<U>) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.georef.transform == other.georef.transform
    }

    /// Number of pixels matching a predicate.
    pub fn count(&self, mut predicate: impl FnMut(T) -> bool) -> usize {
        self.data.iter().filter(|v| predicate(**v)).count()
    }

    /// Apply a per-pixel function, keeping shape and georeferencing.
    ///
    /// The result carries no NoData value; callers set one if needed.
    pub fn map<U: Copy>(&self, mut f: impl FnMut(T) -> U) -> RasterGrid<U> {
        RasterGrid {
            data: self.data.iter().map(|v| f(*v)).collect(),
            width: self.width,
            height: self.height,
            nodata: None,
            georef: self.georef.clone(),
        }
    }

    /// Fallible per-pixel mapping; the closure also receives `(col, row)`.
    pub fn try_map<U: Copy, E>(
        &self,
        mut f: impl FnMut(T, usize, usize) -> std::result::Result<U, E>,
    ) -> std::result::Result<RasterGrid<U>, E> {
        let width = self.width.max(1);
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| f(*v, i % width, i / width))
            .collect::<std::result::Result<Vec<U>, E>>()?;

        Ok(RasterGrid {
            data,
            width: self.width,
            height: self.height,
            nodata: None,
            georef: self.georef.clone(),
        })
    }

    /// Extent of the grid in CRS units.
    pub fn bounds(&self) -> Result<BoundingBox> {
        self.georef
            .transform
            .map(|tf| tf.bounds(self.width, self.height))
            .ok_or_else(|| RasterError::MissingGeoreference("cannot compute bounds".into()))
    }
}

impl MaskRaster {
    /// Number of `true` cells.
    pub fn count_true(&self) -> usize {
        self.count(|v| v)
    }

    /// Encode as 0/1 bytes for writing to disk.
    pub fn to_u8(&self) -> RasterGrid<u8> {
        self.map(u8::from)
    }
}
