//! Common scene fixtures for flood-map tests.

/// Geotransforms as `(origin_x, origin_y, pixel_width, pixel_height)`.
pub mod transform {
    /// ~10 m cells over the Po delta, WGS84 degrees.
    pub const PO_DELTA: (f64, f64, f64, f64) = (12.20, 45.05, 0.0001, -0.0001);

    /// 10 m cells in UTM zone 33N.
    pub const UTM33_10M: (f64, f64, f64, f64) = (500_000.0, 5_000_000.0, 10.0, -10.0);

    /// Unit cells with the origin at (0, height); handy for hand-checked tests.
    pub const UNIT: (f64, f64, f64, f64) = (0.0, 4.0, 1.0, -1.0);
}

/// Raw GeoKey directories.
pub mod geokeys {
    /// Geographic WGS84 (EPSG:4326).
    pub const WGS84: [u16; 16] = [
        1, 1, 0, 3, //
        1024, 0, 1, 2, //
        1025, 0, 1, 1, //
        2048, 0, 1, 4326,
    ];

    /// WGS84 / UTM zone 33N (EPSG:32633).
    pub const UTM33N: [u16; 16] = [
        1, 1, 0, 3, //
        1024, 0, 1, 1, //
        1025, 0, 1, 1, //
        3072, 0, 1, 32633,
    ];
}

/// Land-cover class codes used by the external land-cover service.
pub mod landcover {
    pub const TREE_COVER: u8 = 10;
    pub const CROPLAND: u8 = 40;
    pub const BUILT_UP: u8 = 50;
    pub const PERMANENT_WATER: u8 = 80;
}
