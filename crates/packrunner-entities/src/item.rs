//! Items and the warehouse's item pool.

use packrunner_core::{ItemId, SimRng};
use packrunner_grid::{Coordinate, GridDimensions};
use serde::{Deserialize, Serialize};

/// A single pickable item at a fixed grid location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub location: Coordinate,
}

/// The Cartesian product of the grid minus the packout cell. Locations are
/// immutable once minted; the pool itself is just the enumeration of them.
pub struct ItemPool {
    items: Vec<Item>,
}

impl ItemPool {
    pub fn for_grid(grid: &GridDimensions) -> Self {
        let items = grid
            .item_cells()
            .map(|loc| Item {
                id: ItemId::for_location(loc.aisle, loc.rack),
                location: loc,
            })
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn all(&self) -> &[Item] {
        &self.items
    }

    /// Draw `n` distinct items without replacement, uniformly at random.
    /// Returns fewer than `n` if the pool doesn't have that many.
    pub fn draw(&self, rng: &mut SimRng, n: usize) -> Vec<Item> {
        if self.items.is_empty() {
            return Vec::new();
        }
        let n = n.min(self.items.len());
        rng.sample_indices(self.items.len(), n)
            .into_iter()
            .map(|idx| self.items[idx].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_excludes_packout() {
        let pool = ItemPool::for_grid(&GridDimensions::new(25, 20));
        assert_eq!(pool.len(), 25 * 20 - 1);
        assert!(!pool.all().iter().any(|i| i.location.is_packout()));
    }

    #[test]
    fn test_item_ids_are_unique() {
        let pool = ItemPool::for_grid(&GridDimensions::new(5, 5));
        let mut ids: Vec<_> = pool.all().iter().map(|i| i.id.as_str().to_string()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_draw_without_replacement() {
        let pool = ItemPool::for_grid(&GridDimensions::new(5, 5));
        let mut rng = SimRng::new(1);
        let drawn = pool.draw(&mut rng, 4);
        assert_eq!(drawn.len(), 4);
        let mut ids: Vec<_> = drawn.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_draw_from_empty_pool_returns_empty() {
        let pool = ItemPool { items: Vec::new() };
        let mut rng = SimRng::new(1);
        assert!(pool.draw(&mut rng, 3).is_empty());
    }

    #[test]
    fn test_draw_capped_at_pool_size() {
        let pool = ItemPool::for_grid(&GridDimensions::new(1, 2)); // 1 item
        let mut rng = SimRng::new(1);
        assert_eq!(pool.draw(&mut rng, 10).len(), 1);
    }
}
