//! The snake-path oracle: a pure function answering which way a robot
//! should traverse racks within a given aisle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelDirection {
    Forward,
    Reverse,
}

/// The rack-axis order a robot should follow while inside one aisle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RackOrder {
    Ascending,
    Descending,
}

impl RackOrder {
    /// The step (`+1` or `-1`) a rack number advances by under this order.
    pub fn step(self) -> i64 {
        match self {
            RackOrder::Ascending => 1,
            RackOrder::Descending => -1,
        }
    }
}

/// Answers, for a given aisle and the robot's current travel direction,
/// which way horizontal (rack-axis) traversal within that aisle runs.
///
/// Odd aisles traverse ascending rack order, even aisles descending;
/// `TravelDirection::Reverse` inverts the answer. Purely functional.
pub struct SnakeOracle;

impl SnakeOracle {
    pub fn rack_order(aisle: u32, direction: TravelDirection) -> RackOrder {
        let base = if aisle % 2 == 1 {
            RackOrder::Ascending
        } else {
            RackOrder::Descending
        };
        match direction {
            TravelDirection::Forward => base,
            TravelDirection::Reverse => base.flip(),
        }
    }
}

impl RackOrder {
    fn flip(self) -> RackOrder {
        match self {
            RackOrder::Ascending => RackOrder::Descending,
            RackOrder::Descending => RackOrder::Ascending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odd_aisle_ascends_forward() {
        assert_eq!(
            SnakeOracle::rack_order(1, TravelDirection::Forward),
            RackOrder::Ascending
        );
        assert_eq!(
            SnakeOracle::rack_order(3, TravelDirection::Forward),
            RackOrder::Ascending
        );
    }

    #[test]
    fn test_even_aisle_descends_forward() {
        assert_eq!(
            SnakeOracle::rack_order(2, TravelDirection::Forward),
            RackOrder::Descending
        );
    }

    #[test]
    fn test_reverse_inverts_oracle() {
        assert_eq!(
            SnakeOracle::rack_order(1, TravelDirection::Reverse),
            RackOrder::Descending
        );
        assert_eq!(
            SnakeOracle::rack_order(2, TravelDirection::Reverse),
            RackOrder::Ascending
        );
    }
}
