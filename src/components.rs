use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct AntId;
    pub struct FoodId;
    pub struct PheromoneId;
}

/// A cell coordinate, always wrapped into the grid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Straight-line distance on raw coordinates (no wrap-around).
    pub fn distance(self, other: Position) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn chebyshev(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// A step or displacement between cells.
pub type Offset = (i32, i32);

/// Handle to anything that occupies a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Ant(AntId),
    Food(FoodId),
    Pheromone(PheromoneId),
    Nest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PheromoneKind {
    /// Laid by ants carrying food home
    ToNest,
    /// Laid by ants heading back to a food site they remember
    ToFood,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pheromone {
    pub position: Position,
    pub kind: PheromoneKind,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodUnit {
    pub position: Position,
}

/// Per-ant memory. The ant's location is mirrored in the grid index.
#[derive(Debug, Clone, PartialEq)]
pub struct Ant {
    pub position: Position,
    pub carrying_food: bool,
    pub last_food_position: Option<Position>,
    pub returning_to_food: bool,
    pub last_direction: Option<Offset>,
    /// Forced outward steps remaining after a delivery.
    pub post_delivery_cooldown: u32,
    pub just_delivered: bool,
    /// Whether the most recent move followed a pheromone trail.
    pub following_trail: bool,
}

impl Ant {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            carrying_food: false,
            last_food_position: None,
            returning_to_food: false,
            last_direction: None,
            post_delivery_cooldown: 0,
            just_delivered: false,
            following_trail: false,
        }
    }
}
