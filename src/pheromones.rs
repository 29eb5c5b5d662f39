use std::collections::HashMap;

use rayon::prelude::*;
use slotmap::SlotMap;
use tracing::info;

use crate::components::{Entity, Offset, Pheromone, PheromoneId, PheromoneKind, Position};
use crate::config::TICKS_PER_SECOND;
use crate::grid::Grid;

pub const MAX_STRENGTH: f64 = 3.0;
/// Pheromones weaker than this are removed after decay.
pub const REMOVAL_THRESHOLD: f64 = 0.05;
/// Smallest deposit that may create a new pheromone.
pub const CREATION_THRESHOLD: f64 = 0.2;
const REINFORCE_GAIN: f64 = 0.5;
const NEIGHBOR_SHARE: f64 = 0.3;
const NEST_EXCLUSION_RADIUS: f64 = 3.0;
const NEST_FALLOFF_RADIUS: f64 = 10.0;
const DETECTION_WEIGHT: f64 = 1.5;
const DETECTION_FLOOR: f64 = 0.1;

/// Per-tick multiplicative decay for `lifespan_seconds` of simulated time.
///
/// The factor brings a pheromone to 5% of its strength after the lifespan
/// has elapsed at the given speed multiplier.
pub fn evaporation_factor(lifespan_seconds: f64, ticks_per_second: f64, speed: u32) -> f64 {
    let total_ticks = lifespan_seconds * ticks_per_second / f64::from(speed.max(1));
    if total_ticks <= 0.0 {
        return 0.0;
    }
    REMOVAL_THRESHOLD.powf(1.0 / total_ticks).clamp(0.01, 0.999)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaporation {
    pub to_nest: f64,
    pub to_food: f64,
}

impl Evaporation {
    pub fn from_lifespans(to_nest_lifespan: f64, to_food_lifespan: f64, speed: u32) -> Self {
        Self {
            to_nest: evaporation_factor(to_nest_lifespan, TICKS_PER_SECOND, speed),
            to_food: evaporation_factor(to_food_lifespan, TICKS_PER_SECOND, speed),
        }
    }

    pub fn factor(&self, kind: PheromoneKind) -> f64 {
        match kind {
            PheromoneKind::ToNest => self.to_nest,
            PheromoneKind::ToFood => self.to_food,
        }
    }
}

/// How long a freshly created pheromone of strength 1.0 survives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeProfile {
    pub factor: f64,
    pub ticks_to_fade: u64,
    pub seconds: f64,
}

impl FadeProfile {
    pub fn new(factor: f64, speed: u32) -> Self {
        let ticks_to_fade = if factor > 0.0 && factor < 1.0 {
            (REMOVAL_THRESHOLD.ln() / factor.ln()) as u64
        } else {
            0
        };
        Self {
            factor,
            ticks_to_fade,
            seconds: ticks_to_fade as f64 / (TICKS_PER_SECOND * f64::from(speed.max(1))),
        }
    }
}

pub fn log_evaporation(evaporation: &Evaporation, speed: u32) {
    let to_nest = FadeProfile::new(evaporation.to_nest, speed);
    let to_food = FadeProfile::new(evaporation.to_food, speed);
    info!(
        speed,
        to_nest_factor = to_nest.factor,
        to_nest_ticks = to_nest.ticks_to_fade,
        to_nest_seconds = to_nest.seconds,
        to_food_factor = to_food.factor,
        to_food_ticks = to_food.ticks_to_fade,
        to_food_seconds = to_food.seconds,
        "pheromone evaporation"
    );
}

/// Owner of every live pheromone. At most one pheromone exists per
/// (cell, kind); deposits on an occupied key reinforce it.
#[derive(Debug, Clone)]
pub struct PheromoneField {
    nest: Position,
    pheromones: SlotMap<PheromoneId, Pheromone>,
    index: HashMap<(Position, PheromoneKind), PheromoneId>,
    evaporation: Evaporation,
}

impl PheromoneField {
    pub fn new(nest: Position, evaporation: Evaporation) -> Self {
        Self {
            nest,
            pheromones: SlotMap::with_key(),
            index: HashMap::new(),
            evaporation,
        }
    }

    pub fn evaporation(&self) -> Evaporation {
        self.evaporation
    }

    pub fn set_evaporation(&mut self, evaporation: Evaporation) {
        self.evaporation = evaporation;
    }

    pub fn recompute_evaporation(&mut self, to_nest_lifespan: f64, to_food_lifespan: f64, speed: u32) {
        self.evaporation = Evaporation::from_lifespans(to_nest_lifespan, to_food_lifespan, speed);
    }

    /// Lays a trail at `pos` and, at 30% strength, on its eight neighbours.
    /// Nothing is laid within 3 cells of the nest and deposits fade
    /// linearly inside 10 cells.
    pub fn deposit(&mut self, grid: &mut Grid, pos: Position, kind: PheromoneKind, strength: f64) {
        let dist = pos.distance(self.nest);
        if dist < NEST_EXCLUSION_RADIUS {
            return;
        }
        let strength = if dist < NEST_FALLOFF_RADIUS {
            strength * dist / NEST_FALLOFF_RADIUS
        } else {
            strength
        };

        self.apply(grid, pos, kind, strength);
        for neighbor in grid.neighborhood(pos, 1, false) {
            self.apply(grid, neighbor, kind, strength * NEIGHBOR_SHARE);
        }
    }

    fn apply(&mut self, grid: &mut Grid, pos: Position, kind: PheromoneKind, value: f64) {
        if let Some(existing) = self
            .index
            .get(&(pos, kind))
            .and_then(|id| self.pheromones.get_mut(*id))
        {
            existing.strength = (existing.strength + value * REINFORCE_GAIN).min(MAX_STRENGTH);
            return;
        }
        if value < CREATION_THRESHOLD {
            return;
        }
        let id = self.pheromones.insert(Pheromone {
            position: pos,
            kind,
            strength: value.min(MAX_STRENGTH),
        });
        self.index.insert((pos, kind), id);
        grid.place(Entity::Pheromone(id), pos);
    }

    /// Applies one tick of evaporation and drops pheromones that fell
    /// below the removal threshold. Returns how many were removed.
    pub fn decay_all(&mut self, grid: &mut Grid) -> usize {
        let evaporation = self.evaporation;
        let mut live: Vec<&mut Pheromone> = self.pheromones.values_mut().collect();
        live.par_iter_mut()
            .for_each(|p| p.strength *= evaporation.factor(p.kind));

        let expired: Vec<PheromoneId> = self
            .pheromones
            .iter()
            .filter(|(_, p)| p.strength < REMOVAL_THRESHOLD)
            .map(|(id, _)| id)
            .collect();
        for id in &expired {
            self.remove(grid, *id);
        }
        expired.len()
    }

    pub fn remove(&mut self, grid: &mut Grid, id: PheromoneId) -> Option<Pheromone> {
        let pheromone = self.pheromones.remove(id)?;
        self.index.remove(&(pheromone.position, pheromone.kind));
        grid.remove(Entity::Pheromone(id));
        Some(pheromone)
    }

    /// Weighted trail scores around `pos`, keyed by the offset of each
    /// cell, in neighbourhood order.
    pub fn strength_near(
        &self,
        grid: &Grid,
        pos: Position,
        kind: PheromoneKind,
        radius: i32,
    ) -> Vec<(Offset, f64)> {
        let mut scores: Vec<(Offset, f64)> = Vec::new();
        for cell in grid.neighborhood(pos, radius, false) {
            let weighted = self.strength_at(cell, kind).unwrap_or(0.0) * DETECTION_WEIGHT;
            if weighted <= DETECTION_FLOOR {
                continue;
            }
            let offset = grid.offset(pos, cell);
            match scores.iter_mut().find(|(o, _)| *o == offset) {
                Some((_, score)) => *score += weighted,
                None => scores.push((offset, weighted)),
            }
        }
        scores
    }

    pub fn strength_at(&self, pos: Position, kind: PheromoneKind) -> Option<f64> {
        self.index
            .get(&(pos, kind))
            .and_then(|id| self.pheromones.get(*id))
            .map(|p| p.strength)
    }

    pub fn get(&self, id: PheromoneId) -> Option<&Pheromone> {
        self.pheromones.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PheromoneId, &Pheromone)> {
        self.pheromones.iter()
    }

    pub fn count(&self, kind: PheromoneKind) -> usize {
        self.pheromones.values().filter(|p| p.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.pheromones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pheromones.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEST: Position = Position::new(50, 50);

    fn field() -> (Grid, PheromoneField) {
        let grid = Grid::new(100, 100);
        let field = PheromoneField::new(NEST, Evaporation::from_lifespans(10.0, 6.0, 1));
        (grid, field)
    }

    #[test]
    fn factor_reaches_five_percent_after_lifespan() {
        let factor = evaporation_factor(10.0, 10.0, 1);
        assert!((factor.powi(100) - 0.05).abs() < 1e-9);
    }

    #[test]
    fn factor_is_clamped_and_zero_for_non_positive_lifespan() {
        assert_eq!(evaporation_factor(0.0, 10.0, 1), 0.0);
        assert_eq!(evaporation_factor(-3.0, 10.0, 1), 0.0);
        assert_eq!(evaporation_factor(0.01, 10.0, 10), 0.01);
        assert_eq!(evaporation_factor(1.0e6, 10.0, 1), 0.999);
    }

    #[test]
    fn factor_monotonicity() {
        let mut previous = 0.0;
        for lifespan in [0.5, 1.0, 2.0, 6.0, 10.0, 60.0, 600.0] {
            let f = evaporation_factor(lifespan, 10.0, 1);
            assert!(f >= previous);
            assert!((0.01..=0.999).contains(&f));
            previous = f;
        }
        let mut previous = 1.0;
        for speed in 1..=10 {
            let f = evaporation_factor(10.0, 10.0, speed);
            assert!(f <= previous);
            previous = f;
        }
    }

    #[test]
    fn deposit_far_from_nest_spreads_to_neighbours() {
        let (mut grid, mut field) = field();
        let pos = Position::new(10, 10);
        field.deposit(&mut grid, pos, PheromoneKind::ToNest, 1.5);

        assert_eq!(field.strength_at(pos, PheromoneKind::ToNest), Some(1.5));
        for n in grid.neighborhood(pos, 1, false) {
            let s = field.strength_at(n, PheromoneKind::ToNest).unwrap();
            assert!((s - 0.45).abs() < 1e-12);
        }
        assert_eq!(field.len(), 9);
        assert_eq!(field.count(PheromoneKind::ToFood), 0);
        assert_eq!(grid.len(), 9);
    }

    #[test]
    fn deposit_next_to_nest_is_ignored() {
        let (mut grid, mut field) = field();
        field.deposit(&mut grid, Position::new(52, 51), PheromoneKind::ToFood, 1.0);
        field.deposit(&mut grid, NEST, PheromoneKind::ToNest, 1.5);
        assert!(field.is_empty());
        assert!(grid.is_empty());

        // both sit outside the exclusion radius and border the cells deposited on below
        field.deposit(&mut grid, Position::new(50, 54), PheromoneKind::ToFood, 1.0);
        field.deposit(&mut grid, Position::new(51, 53), PheromoneKind::ToNest, 1.0);
        let before: Vec<_> = field.iter().map(|(id, p)| (id, p.clone())).collect();
        let cells = grid.len();
        assert_eq!(field.len(), 2);
        assert!(field.strength_at(Position::new(51, 53), PheromoneKind::ToNest).is_some());

        field.deposit(&mut grid, Position::new(51, 52), PheromoneKind::ToNest, 1.5);
        field.deposit(&mut grid, Position::new(50, 52), PheromoneKind::ToFood, 1.0);
        let after: Vec<_> = field.iter().map(|(id, p)| (id, p.clone())).collect();
        assert_eq!(field.len(), before.len());
        assert_eq!(grid.len(), cells);
        assert_eq!(before, after);
    }

    #[test]
    fn deposit_near_nest_is_scaled_and_weak_neighbours_discarded() {
        let (mut grid, mut field) = field();
        let pos = Position::new(50, 55);
        field.deposit(&mut grid, pos, PheromoneKind::ToFood, 1.0);
        // 1.0 * 5/10 = 0.5 at the centre; neighbours get 0.15, below creation threshold
        assert_eq!(field.strength_at(pos, PheromoneKind::ToFood), Some(0.5));
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn reinforcement_is_capped() {
        let (mut grid, mut field) = field();
        let pos = Position::new(10, 80);
        for _ in 0..20 {
            field.deposit(&mut grid, pos, PheromoneKind::ToNest, 1.5);
        }
        assert_eq!(field.strength_at(pos, PheromoneKind::ToNest), Some(MAX_STRENGTH));
        assert_eq!(field.len(), 9);
        assert!(field.iter().all(|(_, p)| p.strength <= MAX_STRENGTH));
    }

    #[test]
    fn kinds_are_independent_keys() {
        let (mut grid, mut field) = field();
        let pos = Position::new(10, 10);
        field.deposit(&mut grid, pos, PheromoneKind::ToNest, 1.5);
        field.deposit(&mut grid, pos, PheromoneKind::ToFood, 1.0);
        assert_eq!(field.count(PheromoneKind::ToNest), 9);
        assert_eq!(field.count(PheromoneKind::ToFood), 9);
        assert_eq!(grid.contents_at(pos).len(), 2);
    }

    #[test]
    fn decay_multiplies_and_removes_weak_trails() {
        let (mut grid, mut field) = field();
        field.set_evaporation(Evaporation {
            to_nest: 0.5,
            to_food: 0.5,
        });
        let pos = Position::new(10, 10);
        field.deposit(&mut grid, pos, PheromoneKind::ToNest, 1.0);
        let before: Vec<(Position, f64)> =
            field.iter().map(|(_, p)| (p.position, p.strength)).collect();

        let removed = field.decay_all(&mut grid);
        for (position, strength) in before {
            let after = strength * 0.5;
            match field.strength_at(position, PheromoneKind::ToNest) {
                Some(s) => {
                    assert_eq!(s, after);
                    assert!(s >= REMOVAL_THRESHOLD);
                }
                None => assert!(after < REMOVAL_THRESHOLD),
            }
        }
        assert_eq!(removed, 0);

        // 0.3 -> 0.15 -> 0.075 -> 0.0375: neighbours vanish on the third decay
        field.decay_all(&mut grid);
        let removed = field.decay_all(&mut grid);
        assert_eq!(removed, 8);
        assert_eq!(field.len(), 1);
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn zero_factor_clears_everything() {
        let (mut grid, mut field) = field();
        field.set_evaporation(Evaporation {
            to_nest: 0.0,
            to_food: 0.0,
        });
        field.deposit(&mut grid, Position::new(10, 10), PheromoneKind::ToFood, 1.0);
        assert_eq!(field.decay_all(&mut grid), 9);
        assert!(field.is_empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn strength_near_scores_by_offset() {
        let (mut grid, mut field) = field();
        let ant = Position::new(20, 20);
        field.deposit(&mut grid, Position::new(22, 20), PheromoneKind::ToFood, 1.0);
        field.deposit(&mut grid, Position::new(30, 30), PheromoneKind::ToNest, 1.0);

        let scores = field.strength_near(&grid, ant, PheromoneKind::ToFood, 2);
        let best = scores
            .iter()
            .fold(None::<(Offset, f64)>, |best, &(o, s)| match best {
                Some((_, b)) if b >= s => best,
                _ => Some((o, s)),
            })
            .unwrap();
        assert_eq!(best.0, (2, 0));
        assert!((best.1 - 1.5).abs() < 1e-12);
        // the x=23 column of the trail is outside the ant's radius
        assert_eq!(scores.len(), 6);
    }

    #[test]
    fn fade_profile_matches_lifespan() {
        let profile = FadeProfile::new(evaporation_factor(10.0, 10.0, 1), 1);
        assert!((99..=100).contains(&profile.ticks_to_fade));
        assert!((profile.seconds - 10.0).abs() <= 0.1);
        assert_eq!(FadeProfile::new(0.0, 1).ticks_to_fade, 0);
    }
}
