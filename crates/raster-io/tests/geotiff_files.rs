//! File-based GeoTIFF tests through the `RasterCodec` trait.

use raster_io::{
    align_nearest, GeoKeys, GeoReference, GeoTiffCodec, GeoTransform, RasterCodec, RasterGrid,
};
use test_utils::{fixtures, scratch_dir, three_state_river};

fn utm_georef() -> GeoReference {
    let (ox, oy, pw, ph) = fixtures::transform::UTM33_10M;
    GeoReference::new(
        GeoTransform::new(ox, oy, pw, ph),
        Some(GeoKeys {
            directory: fixtures::geokeys::UTM33N.to_vec(),
            double_params: Vec::new(),
            ascii_params: Some("WGS 84 / UTM zone 33N|".to_string()),
        }),
    )
}

#[test]
fn test_classification_map_file_roundtrip() {
    let dir = scratch_dir();
    let path = dir.path().join("scene_floodmap.tif");
    let codec = GeoTiffCodec::new();

    let grid = RasterGrid::new(three_state_river(9, 6), 9, 6, utm_georef())
        .unwrap()
        .with_nodata(Some(255));
    codec.write_u8(&grid, &path).unwrap();

    let read = codec.read_u8(&path).unwrap();
    assert_eq!(read.data(), grid.data());
    assert_eq!(read.nodata(), Some(255));
    assert_eq!(read.georef(), grid.georef());
    assert_eq!(read.georef().epsg(), Some(32633));
}

#[test]
fn test_depth_raster_bounds_follow_transform() {
    let dir = scratch_dir();
    let path = dir.path().join("scene_WDM.tif");
    let codec = GeoTiffCodec::new();

    let grid = RasterGrid::filled(0.25f32, 20, 10, utm_georef()).with_nodata(Some(f32::NAN));
    codec.write_f32(&grid, &path).unwrap();

    let read = codec.read_f32(&path).unwrap();
    let bbox = read.bounds().unwrap();
    assert_eq!(bbox.min_x, 500_000.0);
    assert_eq!(bbox.max_x, 500_200.0);
    assert_eq!(bbox.min_y, 4_999_900.0);
    assert_eq!(bbox.max_y, 5_000_000.0);
    assert!(read.nodata().unwrap().is_nan());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = scratch_dir();
    let codec = GeoTiffCodec::new();
    let result = codec.read_u8(&dir.path().join("absent.tif"));
    assert!(matches!(result, Err(raster_io::RasterError::Io(_))));
}

#[test]
fn test_align_read_mask_onto_finer_grid() {
    let dir = scratch_dir();
    let path = dir.path().join("coarse.tif");
    let codec = GeoTiffCodec::new();

    // 2x2 cells of 20 m over the north-west corner of the UTM fixture
    let coarse = RasterGrid::new(
        vec![80u8, 10, 40, 80],
        2,
        2,
        GeoReference::new(
            GeoTransform::new(500_000.0, 5_000_000.0, 20.0, -20.0),
            Some(GeoKeys {
                directory: fixtures::geokeys::UTM33N.to_vec(),
                ..Default::default()
            }),
        ),
    )
    .unwrap();
    codec.write_u8(&coarse, &path).unwrap();

    let working = RasterGrid::filled(0u8, 4, 4, utm_georef());
    let aligned = align_nearest(&codec.read_u8(&path).unwrap(), &working.layout(), 0).unwrap();

    assert_eq!(aligned.width(), 4);
    assert_eq!(aligned.get(0, 0), Some(80));
    assert_eq!(aligned.get(3, 0), Some(10));
    assert_eq!(aligned.get(0, 3), Some(40));
    assert_eq!(aligned.get(3, 3), Some(80));
}
