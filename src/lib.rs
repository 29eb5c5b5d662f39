//! Stigmergic ant foraging on a toroidal grid.
//!
//! Ants leave the nest, find food and carry it home, coordinating only
//! through two evaporating pheromone fields. [`Simulation`] owns the whole
//! state and is advanced with [`Simulation::tick`]; renderers and loggers
//! read [`Simulation::stats`] and [`Simulation::snapshot`].

pub mod ant;
pub mod components;
pub mod config;
pub mod error;
pub mod food;
pub mod grid;
pub mod pheromones;
pub mod simulation;
pub mod telemetry;

pub use components::{Ant, AntId, Entity, FoodId, PheromoneId, PheromoneKind, Position};
pub use config::SimConfig;
pub use error::{ConfigError, TelemetryError};
pub use simulation::{EntityKindView, EntityView, Simulation, TickStats};
pub use telemetry::TelemetryWriter;
