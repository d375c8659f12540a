//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS, coordinates are in the CRS units (usually meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Corner representation used when talking to the DEM and land-cover
    /// services.
    pub fn to_corners(&self) -> CornerBox {
        CornerBox {
            north_east: LatLng {
                lat: self.max_y,
                lng: self.max_x,
            },
            south_west: LatLng {
                lat: self.min_y,
                lng: self.min_x,
            },
        }
    }
}

/// A single `{"lat": .., "lng": ..}` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Bounding box in `northEast` / `southWest` corner form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerBox {
    pub north_east: LatLng,
    pub south_west: LatLng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_json_shape() {
        let bbox = BoundingBox::new(12.0, 41.5, 12.5, 42.0);
        let json = serde_json::to_value(bbox.to_corners()).unwrap();

        assert_eq!(json["northEast"]["lat"], 42.0);
        assert_eq!(json["northEast"]["lng"], 12.5);
        assert_eq!(json["southWest"]["lat"], 41.5);
        assert_eq!(json["southWest"]["lng"], 12.0);
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
