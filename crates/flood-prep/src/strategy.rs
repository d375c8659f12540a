//! Permanent-water masking strategy.
//!
//! | encoding    | remove permanent water | strategy | case |
//! |-------------|------------------------|----------|------|
//! | three-state | yes                    | Internal | 1    |
//! | three-state | no                     | None     | 2    |
//! | two-state   | yes                    | External | 3    |
//! | two-state   | no                     | None     | 4    |
//!
//! Three-state maps carry their own permanent-water class, so they never
//! need the land-cover service.

use std::fmt;

use flood_common::MapEncoding;
use serde::{Deserialize, Serialize};

/// How the permanent-water mask is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    /// No mask; permanent water is left in the outputs.
    None,
    /// Derived from class 2 of the three-state source.
    Internal,
    /// Derived from the land-cover service's water class.
    External,
}

impl MaskStrategy {
    /// Pick the strategy for an encoding and removal flag.
    pub fn select(encoding: MapEncoding, remove_permanent_water: bool) -> Self {
        match (encoding, remove_permanent_water) {
            (MapEncoding::ThreeState, true) => Self::Internal,
            (MapEncoding::ThreeState, false) => Self::None,
            (MapEncoding::TwoState, true) => Self::External,
            (MapEncoding::TwoState, false) => Self::None,
        }
    }

    pub fn builds_mask(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for MaskStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Internal => write!(f, "internal"),
            Self::External => write!(f, "external"),
        }
    }
}

/// One of the four combinations of encoding and removal flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrepCase {
    pub encoding: MapEncoding,
    pub remove_permanent_water: bool,
}

impl PrepCase {
    pub fn new(encoding: MapEncoding, remove_permanent_water: bool) -> Self {
        Self {
            encoding,
            remove_permanent_water,
        }
    }

    /// Case number used in logs and reports.
    pub fn number(self) -> u8 {
        match (self.encoding, self.remove_permanent_water) {
            (MapEncoding::ThreeState, true) => 1,
            (MapEncoding::ThreeState, false) => 2,
            (MapEncoding::TwoState, true) => 3,
            (MapEncoding::TwoState, false) => 4,
        }
    }

    pub fn strategy(self) -> MaskStrategy {
        MaskStrategy::select(self.encoding, self.remove_permanent_water)
    }
}

impl fmt::Display for PrepCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Case {}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_table_exhaustive() {
        let table = [
            (MapEncoding::ThreeState, true, MaskStrategy::Internal, 1),
            (MapEncoding::ThreeState, false, MaskStrategy::None, 2),
            (MapEncoding::TwoState, true, MaskStrategy::External, 3),
            (MapEncoding::TwoState, false, MaskStrategy::None, 4),
        ];

        for (encoding, remove, strategy, number) in table {
            assert_eq!(MaskStrategy::select(encoding, remove), strategy);

            let case = PrepCase::new(encoding, remove);
            assert_eq!(case.strategy(), strategy);
            assert_eq!(case.number(), number);
            assert_eq!(case.to_string(), format!("Case {number}"));
        }
    }

    #[test]
    fn test_builds_mask() {
        assert!(MaskStrategy::Internal.builds_mask());
        assert!(MaskStrategy::External.builds_mask());
        assert!(!MaskStrategy::None.builds_mask());
    }
}
