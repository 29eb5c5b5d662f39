use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, info};

use crate::ant::{self, Surroundings, NEST_CROWD_RADIUS};
use crate::components::{Ant, AntId, Entity, FoodId, PheromoneKind, Position};
use crate::config::{validate_speed, SimConfig};
use crate::error::ConfigError;
use crate::food::FoodStore;
use crate::grid::Grid;
use crate::pheromones::{log_evaporation, Evaporation, PheromoneField};

/// Half-width of the square ants are scattered over around the nest.
const SPAWN_JITTER: i32 = 5;

/// Aggregate counters published after every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    pub ticks: u64,
    pub steps: u64,
    pub food_delivered: u64,
    pub total_food: usize,
    pub food_remaining: usize,
    pub active_pheromones: usize,
    pub to_nest_pheromones: usize,
    pub to_food_pheromones: usize,
    pub ants_carrying_food: usize,
    pub ants_near_nest: usize,
    pub ants_following_trail: usize,
    pub ants_random_walking: usize,
    pub food_efficiency: f64,
}

/// Read-only view of one live entity for renderers and loggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub position: Position,
    pub kind: EntityKindView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKindView {
    Ant { carrying_food: bool },
    Nest,
    Food,
    Pheromone { kind: PheromoneKind, strength: f64 },
}

/// The whole state of one run. Created once, advanced only through [`Simulation::tick`].
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    grid: Grid,
    nest: Position,
    ants: SlotMap<AntId, Ant>,
    order: Vec<AntId>,
    pheromones: PheromoneField,
    food: FoodStore,
    rng: ChaCha8Rng,
    food_delivered: u64,
    ticks: u64,
    steps: u64,
    stats: TickStats,
}

impl Simulation {
    /// Builds the world: nest at the centre, ants clustered around it and
    /// food piles scattered away from it.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        let mut sim = Self::empty(config)?;

        for _ in 0..sim.config.ants {
            let dx = sim.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
            let dy = sim.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
            let pos = sim.grid.wrap(sim.nest.x + dx, sim.nest.y + dy);
            sim.spawn_ant(pos);
        }
        sim.food.place_piles(
            &mut sim.grid,
            &mut sim.rng,
            sim.nest,
            sim.config.food_piles,
            sim.config.food_per_pile,
        );

        info!(
            width = sim.config.width,
            height = sim.config.height,
            ants = sim.ants.len(),
            food = sim.food.total_placed(),
            seed = sim.config.seed,
            "simulation created"
        );
        log_evaporation(&sim.pheromones.evaporation(), sim.config.speed);
        sim.refresh_stats();
        Ok(sim)
    }

    /// A world holding only the nest; populate it with [`Simulation::spawn_ant`]
    /// and [`Simulation::place_food`].
    pub fn empty(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut grid = Grid::new(config.width, config.height);
        let nest = grid.center();
        grid.place(Entity::Nest, nest);
        let evaporation = Evaporation::from_lifespans(
            config.to_nest_lifespan,
            config.to_food_lifespan,
            config.speed,
        );
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut sim = Self {
            config,
            grid,
            nest,
            ants: SlotMap::with_key(),
            order: Vec::new(),
            pheromones: PheromoneField::new(nest, evaporation),
            food: FoodStore::new(),
            rng,
            food_delivered: 0,
            ticks: 0,
            steps: 0,
            stats: TickStats::default(),
        };
        sim.refresh_stats();
        Ok(sim)
    }

    pub fn spawn_ant(&mut self, pos: Position) -> AntId {
        let pos = self.grid.wrap(pos.x, pos.y);
        let id = self.ants.insert(Ant::new(pos));
        self.grid.place(Entity::Ant(id), pos);
        self.order.push(id);
        id
    }

    pub fn place_food(&mut self, pos: Position) -> FoodId {
        self.food.place(&mut self.grid, pos)
    }

    /// Changes the number of sub-steps per tick. Evaporation factors follow
    /// on the next tick, before anything decays.
    pub fn set_speed(&mut self, speed: u32) -> Result<(), ConfigError> {
        validate_speed(speed)?;
        if speed != self.config.speed {
            self.config.speed = speed;
            log_evaporation(
                &Evaporation::from_lifespans(
                    self.config.to_nest_lifespan,
                    self.config.to_food_lifespan,
                    speed,
                ),
                speed,
            );
        }
        Ok(())
    }

    /// Advances one external tick of `speed` sub-steps.
    pub fn tick(&mut self) {
        self.pheromones.recompute_evaporation(
            self.config.to_nest_lifespan,
            self.config.to_food_lifespan,
            self.config.speed,
        );
        for _ in 0..self.config.speed {
            self.sub_step();
        }
        self.ticks += 1;
        self.refresh_stats();
    }

    fn sub_step(&mut self) {
        self.order.shuffle(&mut self.rng);

        let mut env = Surroundings {
            grid: &mut self.grid,
            pheromones: &mut self.pheromones,
            food: &mut self.food,
            rng: &mut self.rng,
            nest: self.nest,
        };
        for &id in &self.order {
            let Some(ant) = self.ants.get_mut(id) else {
                continue;
            };
            let outcome = ant::step(id, ant, &mut env);
            if outcome.delivered {
                self.food_delivered += 1;
                debug!(?id, total = self.food_delivered, "food delivered");
            }
        }

        let expired = self.pheromones.decay_all(&mut self.grid);
        if expired > 0 {
            debug!(expired, remaining = self.pheromones.len(), "pheromones evaporated");
        }
        self.steps += 1;
    }

    fn refresh_stats(&mut self) {
        let mut stats = TickStats {
            ticks: self.ticks,
            steps: self.steps,
            food_delivered: self.food_delivered,
            total_food: self.food.total_placed(),
            food_remaining: self.food.len(),
            active_pheromones: self.pheromones.len(),
            to_nest_pheromones: self.pheromones.count(PheromoneKind::ToNest),
            to_food_pheromones: self.pheromones.count(PheromoneKind::ToFood),
            food_efficiency: if self.steps > 0 {
                self.food_delivered as f64 / (self.steps + 1) as f64
            } else {
                0.0
            },
            ..TickStats::default()
        };
        for ant in self.ants.values() {
            if ant.carrying_food {
                stats.ants_carrying_food += 1;
            }
            if ant.position.distance(self.nest) < NEST_CROWD_RADIUS {
                stats.ants_near_nest += 1;
            }
            if ant.following_trail {
                stats.ants_following_trail += 1;
            } else {
                stats.ants_random_walking += 1;
            }
        }
        self.stats = stats;
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Every live entity with what a renderer needs to draw it.
    pub fn snapshot(&self) -> Vec<EntityView> {
        let mut views = Vec::with_capacity(
            1 + self.ants.len() + self.food.len() + self.pheromones.len(),
        );
        views.push(EntityView {
            position: self.nest,
            kind: EntityKindView::Nest,
        });
        views.extend(self.pheromones.iter().map(|(_, p)| EntityView {
            position: p.position,
            kind: EntityKindView::Pheromone {
                kind: p.kind,
                strength: p.strength,
            },
        }));
        views.extend(self.food.iter().map(|(_, f)| EntityView {
            position: f.position,
            kind: EntityKindView::Food,
        }));
        views.extend(self.ants.values().map(|a| EntityView {
            position: a.position,
            kind: EntityKindView::Ant {
                carrying_food: a.carrying_food,
            },
        }));
        views
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn nest(&self) -> Position {
        self.nest
    }

    pub fn ant(&self, id: AntId) -> Option<&Ant> {
        self.ants.get(id)
    }

    pub fn ants(&self) -> impl Iterator<Item = (AntId, &Ant)> {
        self.ants.iter()
    }

    pub fn pheromones(&self) -> &PheromoneField {
        &self.pheromones
    }

    pub fn food(&self) -> &FoodStore {
        &self.food
    }

    pub fn food_delivered(&self) -> u64 {
        self.food_delivered
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}
