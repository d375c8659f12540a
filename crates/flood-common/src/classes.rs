//! Pixel class encodings for flood maps.
//!
//! A flood map arrives in one of two source encodings and is always handed
//! to the thresholding processor in the processor encoding:
//!
//! | Encoding        | Values                                                   |
//! |-----------------|----------------------------------------------------------|
//! | three-state     | 0 NoData, 1 NotFlooded, 2 PermanentWater, 3 Flooded       |
//! | two-state       | 0 Land, 1 Water                                          |
//! | processor       | 0 NotFlooded, 1 Water, 255 NoData                         |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classes of a three-state source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ThreeStateClass {
    NoData = 0,
    NotFlooded = 1,
    PermanentWater = 2,
    Flooded = 3,
}

impl ThreeStateClass {
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::NoData),
            1 => Some(Self::NotFlooded),
            2 => Some(Self::PermanentWater),
            3 => Some(Self::Flooded),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Classes of a two-state source map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TwoStateClass {
    Land = 0,
    Water = 1,
}

impl TwoStateClass {
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Land),
            1 => Some(Self::Water),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Classes of the raster handed to the thresholding processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProcessorClass {
    NotFlooded = 0,
    Water = 1,
    NoData = 255,
}

impl ProcessorClass {
    /// NoData sentinel of the processor encoding.
    pub const NODATA: u8 = ProcessorClass::NoData as u8;
    /// Water code of the processor encoding.
    pub const WATER: u8 = ProcessorClass::Water as u8;

    pub fn value(self) -> u8 {
        self as u8
    }
}

/// Cardinality of the source flood map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapEncoding {
    ThreeState,
    TwoState,
}

impl MapEncoding {
    /// Map the `THREE_STATE` flag onto an encoding.
    pub fn from_three_state_flag(three_state: bool) -> Self {
        if three_state {
            Self::ThreeState
        } else {
            Self::TwoState
        }
    }

    pub fn is_three_state(self) -> bool {
        matches!(self, Self::ThreeState)
    }

    /// Whether `value` belongs to this encoding's declared domain.
    pub fn contains(self, value: u8) -> bool {
        match self {
            Self::ThreeState => ThreeStateClass::from_value(value).is_some(),
            Self::TwoState => TwoStateClass::from_value(value).is_some(),
        }
    }
}

impl fmt::Display for MapEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThreeState => write!(f, "three-state"),
            Self::TwoState => write!(f, "two-state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_state_domain() {
        for value in 0..=3u8 {
            assert!(MapEncoding::ThreeState.contains(value));
        }
        assert!(!MapEncoding::ThreeState.contains(4));
        assert!(!MapEncoding::ThreeState.contains(255));
        assert_eq!(
            ThreeStateClass::from_value(2),
            Some(ThreeStateClass::PermanentWater)
        );
    }

    #[test]
    fn test_two_state_domain() {
        assert!(MapEncoding::TwoState.contains(0));
        assert!(MapEncoding::TwoState.contains(1));
        assert!(!MapEncoding::TwoState.contains(2));
        assert_eq!(TwoStateClass::Water.value(), 1);
    }

    #[test]
    fn test_processor_codes() {
        assert_eq!(ProcessorClass::NODATA, 255);
        assert_eq!(ProcessorClass::WATER, 1);
        assert_eq!(ProcessorClass::NotFlooded.value(), 0);
    }

    #[test]
    fn test_encoding_from_flag() {
        assert_eq!(MapEncoding::from_three_state_flag(true), MapEncoding::ThreeState);
        assert_eq!(MapEncoding::from_three_state_flag(false), MapEncoding::TwoState);
        assert_eq!(MapEncoding::ThreeState.to_string(), "three-state");
    }
}
