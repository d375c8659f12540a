//! Generators for synthetic flood-map rasters.
//!
//! All grids are returned as row-major `Vec`s (row 0 first).

/// Three-state flood map with a river of permanent water down the middle
/// column, flooded banks either side of it, dry land elsewhere and a NoData
/// border on the top row.
///
/// ```
/// use test_utils::three_state_river;
///
/// let map = three_state_river(5, 3);
/// assert_eq!(&map[0..5], &[0, 0, 0, 0, 0]);
/// assert_eq!(&map[5..10], &[1, 3, 2, 3, 1]);
/// ```
pub fn three_state_river(width: usize, height: usize) -> Vec<u8> {
    let centre = width / 2;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let value = if row == 0 {
                0
            } else if col == centre {
                2
            } else if col + 1 == centre || col == centre + 1 {
                3
            } else {
                1
            };
            data.push(value);
        }
    }
    data
}

/// Two-state map with water in the given `(col, row)` cells.
pub fn two_state_with_water(width: usize, height: usize, water: &[(usize, usize)]) -> Vec<u8> {
    let mut data = vec![0u8; width * height];
    for &(col, row) in water {
        data[row * width + col] = 1;
    }
    data
}

/// Depth raster as a thresholding processor would produce it: a constant
/// `depth` everywhere, including cells the input never marked as water.
pub fn uniform_depth(width: usize, height: usize, depth: f32) -> Vec<f32> {
    vec![depth; width * height]
}

/// Depth raster whose values encode their position: `row * 10 + col`,
/// scaled to centimetres.
pub fn indexed_depth(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((row * 10 + col) as f32 / 100.0);
        }
    }
    data
}
