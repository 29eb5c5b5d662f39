use std::collections::HashMap;

use crate::components::{Entity, Offset, Position};

/// Toroidal multi-occupancy index: which entities sit in which cell.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Vec<Entity>>,
    locations: HashMap<Entity, Position>,
}

impl Grid {
    /// Dimensions are validated by `SimConfig` before a grid is built.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1) as i32;
        let height = height.max(1) as i32;
        Self {
            width,
            height,
            cells: vec![Vec::new(); (width * height) as usize],
            locations: HashMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.width / 2, self.height / 2)
    }

    pub fn wrap(&self, x: i32, y: i32) -> Position {
        Position::new(x.rem_euclid(self.width), y.rem_euclid(self.height))
    }

    /// Shortest displacement from `from` to `to` across the wrapped edges.
    pub fn offset(&self, from: Position, to: Position) -> Offset {
        (
            shortest(to.x - from.x, self.width),
            shortest(to.y - from.y, self.height),
        )
    }

    pub fn step(&self, from: Position, (dx, dy): Offset) -> Position {
        self.wrap(from.x + dx, from.y + dy)
    }

    /// Moore neighbourhood in x-major order. On grids smaller than the
    /// window, cells reached twice through the wrap are listed once.
    pub fn neighborhood(&self, pos: Position, radius: i32, include_center: bool) -> Vec<Position> {
        let radius = radius.clamp(1, self.width.max(self.height));
        let side = (2 * radius + 1) as usize;
        let mut out = Vec::with_capacity(side * side);
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx == 0 && dy == 0 && !include_center {
                    continue;
                }
                let cell = self.step(pos, (dx, dy));
                if cell == pos && !include_center {
                    continue;
                }
                if !out.contains(&cell) {
                    out.push(cell);
                }
            }
        }
        out
    }

    pub fn contents_at(&self, pos: Position) -> &[Entity] {
        let pos = self.wrap(pos.x, pos.y);
        &self.cells[self.index(pos)]
    }

    pub fn position_of(&self, entity: Entity) -> Option<Position> {
        self.locations.get(&entity).copied()
    }

    /// Places `entity`; an entity already on the grid is moved instead.
    pub fn place(&mut self, entity: Entity, pos: Position) -> Position {
        if self.locations.contains_key(&entity) {
            return self.move_entity(entity, pos);
        }
        let pos = self.wrap(pos.x, pos.y);
        let idx = self.index(pos);
        self.cells[idx].push(entity);
        self.locations.insert(entity, pos);
        pos
    }

    pub fn remove(&mut self, entity: Entity) -> Option<Position> {
        let pos = self.locations.remove(&entity)?;
        let idx = self.index(pos);
        self.cells[idx].retain(|e| *e != entity);
        Some(pos)
    }

    pub fn move_entity(&mut self, entity: Entity, new_pos: Position) -> Position {
        self.remove(entity);
        self.place(entity, new_pos)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }
}

fn shortest(delta: i32, extent: i32) -> i32 {
    let d = delta.rem_euclid(extent);
    if d > extent / 2 {
        d - extent
    } else {
        d
    }
}
