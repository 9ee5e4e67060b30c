//! The warehouse grid's coordinate domain and bounds checking.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell in the `aisle x rack` warehouse grid. Aisle is the column axis,
/// rack is the row axis; `(1, 1)` is reserved as the packout zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub aisle: u32,
    pub rack: u32,
}

impl Coordinate {
    pub fn new(aisle: u32, rack: u32) -> Self {
        Self { aisle, rack }
    }

    pub fn manhattan_distance(&self, other: &Coordinate) -> u32 {
        self.aisle.abs_diff(other.aisle) + self.rack.abs_diff(other.rack)
    }

    pub fn is_packout(&self) -> bool {
        self.aisle == 1 && self.rack == 1
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(A{:02},R{:02})", self.aisle, self.rack)
    }
}

/// The fixed cell every robot starts and ends an order cycle at.
pub const PACKOUT: Coordinate = Coordinate { aisle: 1, rack: 1 };

/// `aisle x rack` grid dimensions and bounds checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub aisles: u32,
    pub racks: u32,
}

impl GridDimensions {
    pub fn new(aisles: u32, racks: u32) -> Self {
        Self { aisles, racks }
    }

    pub fn contains(&self, coord: &Coordinate) -> bool {
        (1..=self.aisles).contains(&coord.aisle) && (1..=self.racks).contains(&coord.rack)
    }

    /// All non-packout cells, in ascending aisle-then-rack order.
    pub fn item_cells(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (1..=self.aisles)
            .flat_map(move |aisle| (1..=self.racks).map(move |rack| Coordinate::new(aisle, rack)))
            .filter(|c| !c.is_packout())
    }

    pub fn cell_count(&self) -> usize {
        (self.aisles as usize) * (self.racks as usize) - 1
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self::new(25, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = Coordinate::new(1, 1);
        let b = Coordinate::new(4, 6);
        assert_eq!(a.manhattan_distance(&b), 3 + 5);
    }

    #[test]
    fn test_packout_is_one_one() {
        assert!(PACKOUT.is_packout());
        assert!(!Coordinate::new(1, 2).is_packout());
    }

    #[test]
    fn test_bounds_checking() {
        let grid = GridDimensions::new(25, 20);
        assert!(grid.contains(&Coordinate::new(1, 1)));
        assert!(grid.contains(&Coordinate::new(25, 20)));
        assert!(!grid.contains(&Coordinate::new(26, 1)));
        assert!(!grid.contains(&Coordinate::new(1, 0)));
    }

    #[test]
    fn test_item_cells_excludes_packout() {
        let grid = GridDimensions::new(2, 2);
        let cells: Vec<_> = grid.item_cells().collect();
        assert_eq!(cells.len(), 3);
        assert!(!cells.contains(&PACKOUT));
    }

    #[test]
    fn test_cell_count() {
        let grid = GridDimensions::new(25, 20);
        assert_eq!(grid.cell_count(), 25 * 20 - 1);
    }
}
