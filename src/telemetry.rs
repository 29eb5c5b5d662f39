use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::error::TelemetryError;
use crate::simulation::TickStats;

const HEADER: &str = "Step,Food_Delivered,Active_Pheromones,To_Nest_Pheromones,To_Food_Pheromones,\
Ants_With_Food,Ants_At_Nest,Ants_Following_Pheromones,Ants_Random_Walking,Food_Efficiency";

/// Appends periodic CSV rows of [`TickStats`] to a timestamped file.
pub struct TelemetryWriter {
    path: PathBuf,
    out: BufWriter<File>,
    interval: u64,
}

impl TelemetryWriter {
    /// Creates `ant_colony_data_<timestamp>.csv` in `dir` and writes the header.
    pub fn create(dir: impl AsRef<Path>, interval: u64) -> Result<Self, TelemetryError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.as_ref().join(format!("ant_colony_data_{stamp}.csv"));
        Self::with_path(path, interval)
    }

    pub fn with_path(path: impl Into<PathBuf>, interval: u64) -> Result<Self, TelemetryError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{HEADER}")?;
        out.flush()?;
        info!(path = %path.display(), interval, "telemetry enabled");
        Ok(Self {
            path,
            out,
            interval: interval.max(1),
        })
    }

    /// Writes a row when the step count lands on the sampling interval.
    /// Returns whether a row was written.
    pub fn record(&mut self, stats: &TickStats) -> Result<bool, TelemetryError> {
        if stats.steps % self.interval != 0 {
            return Ok(false);
        }
        writeln!(
            self.out,
            "{},{},{},{},{},{},{},{},{},{}",
            stats.steps,
            stats.food_delivered,
            stats.active_pheromones,
            stats.to_nest_pheromones,
            stats.to_food_pheromones,
            stats.ants_carrying_food,
            stats.ants_near_nest,
            stats.ants_following_trail,
            stats.ants_random_walking,
            stats.food_efficiency,
        )?;
        self.out.flush()?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
