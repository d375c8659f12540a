//! Common types shared across the flood-map preparation workspace.

pub mod bbox;
pub mod classes;

pub use bbox::{BoundingBox, CornerBox, LatLng};
pub use classes::{MapEncoding, ProcessorClass, ThreeStateClass, TwoStateClass};
