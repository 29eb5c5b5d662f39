use rand::Rng;
use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::components::{Entity, FoodId, FoodUnit, Position};
use crate::grid::Grid;

const PILE_RADIUS: i32 = 2;
/// Cells in a pile share its food in this many parts.
const PILE_SPREAD: usize = 20;
const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Every food unit still lying on the grid.
#[derive(Debug, Clone, Default)]
pub struct FoodStore {
    units: SlotMap<FoodId, FoodUnit>,
    total_placed: usize,
}

impl FoodStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, grid: &mut Grid, pos: Position) -> FoodId {
        let pos = grid.wrap(pos.x, pos.y);
        let id = self.units.insert(FoodUnit { position: pos });
        grid.place(Entity::Food(id), pos);
        self.total_placed += 1;
        id
    }

    /// Scatters `piles` circular piles away from the nest.
    pub fn place_piles<R: Rng>(
        &mut self,
        grid: &mut Grid,
        rng: &mut R,
        nest: Position,
        piles: usize,
        pile_size: usize,
    ) {
        let min_dist = f64::from(grid.width().max(grid.height()) / 8);
        let per_cell = pile_size / PILE_SPREAD;

        for _ in 0..piles {
            let mut center = nest;
            let mut found = false;
            for _ in 0..MAX_PLACEMENT_ATTEMPTS {
                center = Position::new(rng.gen_range(0..grid.width()), rng.gen_range(0..grid.height()));
                if center.distance(nest) > min_dist {
                    found = true;
                    break;
                }
            }
            if !found {
                warn!(?center, min_dist, "no pile site far enough from the nest, using last candidate");
            }

            for dx in -PILE_RADIUS..=PILE_RADIUS {
                for dy in -PILE_RADIUS..=PILE_RADIUS {
                    if dx * dx + dy * dy > PILE_RADIUS * PILE_RADIUS {
                        continue;
                    }
                    let cell = Position::new(
                        (center.x + dx).clamp(0, grid.width() - 1),
                        (center.y + dy).clamp(0, grid.height() - 1),
                    );
                    for _ in 0..per_cell {
                        self.place(grid, cell);
                    }
                }
            }
            debug!(?center, per_cell, "placed food pile");
        }
    }

    /// Removes one unit lying at `pos`, if any.
    pub fn take_at(&mut self, grid: &mut Grid, pos: Position) -> Option<FoodId> {
        let id = grid.contents_at(pos).iter().find_map(|e| match e {
            Entity::Food(id) => Some(*id),
            _ => None,
        })?;
        self.units.remove(id);
        grid.remove(Entity::Food(id));
        Some(id)
    }

    pub fn has_food_at(&self, grid: &Grid, pos: Position) -> bool {
        grid.contents_at(pos)
            .iter()
            .any(|e| matches!(e, Entity::Food(_)))
    }

    pub fn contains(&self, id: FoodId) -> bool {
        self.units.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FoodId, &FoodUnit)> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn total_placed(&self) -> usize {
        self.total_placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn piles_have_thirteen_cells() {
        let mut grid = Grid::new(100, 100);
        let mut food = FoodStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let nest = grid.center();
        food.place_piles(&mut grid, &mut rng, nest, 1, 100);
        assert_eq!(food.len(), 13 * 5);
        assert_eq!(food.total_placed(), 65);
        assert!(food.iter().all(|(_, f)| f.position.distance(Position::new(50, 50)) > 10.0));
    }

    #[test]
    fn small_piles_round_down_to_nothing() {
        let mut grid = Grid::new(50, 50);
        let mut food = FoodStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let nest = grid.center();
        food.place_piles(&mut grid, &mut rng, nest, 3, 19);
        assert!(food.is_empty());
    }

    #[test]
    fn take_removes_one_unit() {
        let mut grid = Grid::new(10, 10);
        let mut food = FoodStore::new();
        let pos = Position::new(4, 4);
        let first = food.place(&mut grid, pos);
        food.place(&mut grid, pos);

        assert_eq!(food.take_at(&mut grid, pos), Some(first));
        assert!(!food.contains(first));
        assert!(food.has_food_at(&grid, pos));
        assert_eq!(food.len(), 1);
        assert!(food.take_at(&mut grid, pos).is_some());
        assert_eq!(food.take_at(&mut grid, pos), None);
        assert_eq!(food.total_placed(), 2);
    }

    #[test]
    fn tiny_grid_still_places_piles() {
        let mut grid = Grid::new(1, 1);
        let mut food = FoodStore::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let nest = grid.center();
        food.place_piles(&mut grid, &mut rng, nest, 1, 20);
        assert_eq!(food.len(), 13);
    }
}
