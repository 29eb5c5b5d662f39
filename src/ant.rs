//! Per-ant decision policy.
//!
//! Each tick an ant tries to pick up food, makes exactly one move chosen by
//! the first matching behaviour below, then tries to unload at the nest:
//!
//! 1. post-delivery escape away from the nest
//! 2. carrying food home
//! 3. heading back to a remembered food site
//! 4. foraging: visible food, nest anti-clustering, trail following, random walk

use std::f64::consts::TAU;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Ant, AntId, Entity, Offset, PheromoneKind, Position};
use crate::food::FoodStore;
use crate::grid::Grid;
use crate::pheromones::PheromoneField;

pub const POST_DELIVERY_COOLDOWN: u32 = 5;
pub const TO_NEST_TRAIL: f64 = 1.5;
pub const TO_FOOD_TRAIL: f64 = 1.0;
/// Ants inside this distance of the nest count as crowding it.
pub const NEST_CROWD_RADIUS: f64 = 5.0;
const NEST_TRAIL_MIN_DISTANCE: f64 = 3.0;
const FOOD_SCAN_RADIUS: i32 = 2;
const DETECTION_RADIUS: i32 = 2;
const CROWD_ESCAPE_CHANCE: f64 = 0.8;
const MOMENTUM_CHANCE: f64 = 0.3;
const FOLLOW_BASE: f64 = 0.6;
const FOLLOW_GAIN: f64 = 0.3;
const FOLLOW_CAP: f64 = 0.95;

/// Everything an ant may read or write besides its own memory.
pub struct Surroundings<'a, R: Rng> {
    pub grid: &'a mut Grid,
    pub pheromones: &'a mut PheromoneField,
    pub food: &'a mut FoodStore,
    pub rng: &'a mut R,
    pub nest: Position,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub picked_up: bool,
    pub delivered: bool,
}

/// Runs one full tick for `ant`: pickup, move, drop.
pub fn step<R: Rng>(id: AntId, ant: &mut Ant, env: &mut Surroundings<'_, R>) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    if !ant.carrying_food {
        outcome.picked_up = pick_up_food(ant, env.grid, env.food);
    }

    let from = ant.position;
    let to = choose_move(ant, env);
    ant.last_direction = Some(env.grid.offset(from, to));
    ant.position = env.grid.move_entity(Entity::Ant(id), to);

    if ant.carrying_food {
        outcome.delivered = drop_food_at_nest(ant, env.nest);
    }
    outcome
}

pub fn pick_up_food(ant: &mut Ant, grid: &mut Grid, food: &mut FoodStore) -> bool {
    if ant.carrying_food || food.take_at(grid, ant.position).is_none() {
        return false;
    }
    ant.carrying_food = true;
    ant.last_food_position = Some(ant.position);
    true
}

/// Unloads when within one cell of the nest (diagonals included).
pub fn drop_food_at_nest(ant: &mut Ant, nest: Position) -> bool {
    if !ant.carrying_food || ant.position.chebyshev(nest) > 1 {
        return false;
    }
    ant.carrying_food = false;
    ant.just_delivered = true;
    ant.returning_to_food = true;
    ant.post_delivery_cooldown = POST_DELIVERY_COOLDOWN;
    true
}

/// Picks the next cell and lays whatever trail the current behaviour calls for.
pub fn choose_move<R: Rng>(ant: &mut Ant, env: &mut Surroundings<'_, R>) -> Position {
    let pos = ant.position;
    let steps = reachable_steps(env.grid, pos);
    ant.following_trail = false;

    if ant.just_delivered || ant.post_delivery_cooldown > 0 {
        let next = move_away_from_nest(pos, &steps, env.nest, env.rng);
        ant.just_delivered = false;
        ant.post_delivery_cooldown = ant.post_delivery_cooldown.saturating_sub(1);
        if ant.returning_to_food && ant.last_food_position.is_some() {
            env.pheromones
                .deposit(env.grid, pos, PheromoneKind::ToFood, TO_FOOD_TRAIL);
        }
        return next;
    }

    if ant.carrying_food {
        let next = move_towards(pos, &steps, env.nest);
        if pos.distance(env.nest) > NEST_TRAIL_MIN_DISTANCE {
            env.pheromones
                .deposit(env.grid, pos, PheromoneKind::ToNest, TO_NEST_TRAIL);
        }
        return next;
    }

    if ant.returning_to_food {
        if let Some(site) = ant.last_food_position {
            if pos == site {
                ant.returning_to_food = false;
                return random_step(pos, &steps, env.rng);
            }
            let next = move_towards(pos, &steps, site);
            env.pheromones
                .deposit(env.grid, pos, PheromoneKind::ToFood, TO_FOOD_TRAIL);
            return next;
        }
    }

    forage(ant, &steps, env)
}

fn forage<R: Rng>(ant: &mut Ant, steps: &[Position], env: &mut Surroundings<'_, R>) -> Position {
    let pos = ant.position;
    let visible: Vec<Position> = {
        let (grid, food) = (&*env.grid, &*env.food);
        grid.neighborhood(pos, FOOD_SCAN_RADIUS, false)
            .into_iter()
            .filter(|cell| food.has_food_at(grid, *cell))
            .collect()
    };

    let reachable: Vec<Position> = visible
        .iter()
        .copied()
        .filter(|cell| steps.contains(cell))
        .collect();
    if !reachable.is_empty() {
        return random_step(pos, &reachable, env.rng);
    }

    if let Some(target) = nearest(env.grid, pos, &visible) {
        let toward: Vec<Position> = steps
            .iter()
            .copied()
            .filter(|s| dot(env.grid.offset(pos, *s), target) >= 0)
            .collect();
        return random_step(pos, &toward, env.rng);
    }

    if pos.distance(env.nest) < NEST_CROWD_RADIUS && env.rng.gen::<f64>() < CROWD_ESCAPE_CHANCE {
        return move_away_from_nest(pos, steps, env.nest, env.rng);
    }

    follow_trail_or_explore(ant, steps, env)
}

fn follow_trail_or_explore<R: Rng>(
    ant: &mut Ant,
    steps: &[Position],
    env: &mut Surroundings<'_, R>,
) -> Position {
    let pos = ant.position;
    let scores = env
        .pheromones
        .strength_near(env.grid, pos, PheromoneKind::ToFood, DETECTION_RADIUS);

    if let Some((direction, score)) = strongest(&scores) {
        let follow_chance = (FOLLOW_BASE + score * FOLLOW_GAIN).min(FOLLOW_CAP);
        if env.rng.gen::<f64>() < follow_chance {
            let direction = (direction.0.signum(), direction.1.signum());
            let target = env.grid.step(pos, direction);
            ant.following_trail = true;
            if steps.contains(&target) {
                return target;
            }
            return snap_to_step(env.grid, pos, steps, direction);
        }
    }

    random_walk(ant, steps, env.grid, env.rng)
}

/// Keeps the previous heading 30% of the time, otherwise a uniform step.
fn random_walk<R: Rng>(ant: &Ant, steps: &[Position], grid: &Grid, rng: &mut R) -> Position {
    if let Some(direction) = ant.last_direction {
        if rng.gen::<f64>() < MOMENTUM_CHANCE {
            let preferred = grid.step(ant.position, direction);
            if steps.contains(&preferred) {
                return preferred;
            }
        }
    }
    random_step(ant.position, steps, rng)
}

/// The step farthest from the nest, or a random one when no step gains distance.
pub fn move_away_from_nest<R: Rng>(
    pos: Position,
    steps: &[Position],
    nest: Position,
    rng: &mut R,
) -> Position {
    let current = pos.distance(nest);
    let mut best: Option<(Position, f64)> = None;
    for &s in steps {
        let d = s.distance(nest);
        if best.map_or(true, |(_, b)| d > b) {
            best = Some((s, d));
        }
    }
    match best {
        Some((s, d)) if d > current => s,
        _ => random_step(pos, steps, rng),
    }
}

/// Greedy step minimising straight-line distance to `target`.
pub fn move_towards(pos: Position, steps: &[Position], target: Position) -> Position {
    let mut best: Option<(Position, f64)> = None;
    for &s in steps {
        let d = s.distance(target);
        if best.map_or(true, |(_, b)| d < b) {
            best = Some((s, d));
        }
    }
    best.map_or(pos, |(s, _)| s)
}

/// The reachable step whose heading deviates least from `direction`.
pub fn snap_to_step(grid: &Grid, pos: Position, steps: &[Position], direction: Offset) -> Position {
    let target_angle = f64::from(direction.1).atan2(f64::from(direction.0));
    let mut best: Option<(Position, f64)> = None;
    for &s in steps {
        let (dx, dy) = grid.offset(pos, s);
        let diff = (f64::from(dy).atan2(f64::from(dx)) - target_angle).abs();
        let diff = diff.min(TAU - diff);
        if best.map_or(true, |(_, b)| diff < b) {
            best = Some((s, diff));
        }
    }
    best.map_or(pos, |(s, _)| s)
}

/// Highest accumulated score; the first of equal scores wins.
pub fn strongest(scores: &[(Offset, f64)]) -> Option<(Offset, f64)> {
    let mut best: Option<(Offset, f64)> = None;
    for &(offset, score) in scores {
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((offset, score));
        }
    }
    best
}

fn nearest(grid: &Grid, pos: Position, cells: &[Position]) -> Option<Offset> {
    cells
        .iter()
        .map(|c| grid.offset(pos, *c))
        .min_by_key(|(dx, dy)| dx * dx + dy * dy)
}

fn dot(a: Offset, b: Offset) -> i32 {
    a.0 * b.0 + a.1 * b.1
}

/// The Moore neighbourhood, or the cell itself on a 1x1 grid.
fn reachable_steps(grid: &Grid, pos: Position) -> Vec<Position> {
    let steps = grid.neighborhood(pos, 1, false);
    if steps.is_empty() {
        vec![pos]
    } else {
        steps
    }
}

fn random_step<R: Rng>(pos: Position, steps: &[Position], rng: &mut R) -> Position {
    steps.choose(rng).copied().unwrap_or(pos)
}
