use std::path::PathBuf;

use anyhow::{Context, Result};
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use antsim::{SimConfig, Simulation, TelemetryWriter};

mod colors;
mod systems;

use colors::*;
use systems::*;

#[derive(Parser)]
#[command(name = "antsim")]
#[command(version, about = "Ant colony foraging with dual pheromone trails", long_about = None)]
struct Cli {
    /// JSON configuration file; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the speed multiplier (sub-steps per tick)
    #[arg(long)]
    speed: Option<u32>,

    /// Run this many ticks without a window, then exit
    #[arg(long)]
    headless: Option<u64>,

    /// Write CSV statistics into this directory
    #[arg(long)]
    telemetry: Option<PathBuf>,

    /// Steps between telemetry rows
    #[arg(long, default_value = "10")]
    telemetry_interval: u64,

    /// Ticks between progress lines in headless mode
    #[arg(long, default_value = "100")]
    report_every: u64,
}

const LOG_FILTER: &str = "wgpu=error,bevy_render=warn,bevy_ecs=info,antsim=info";

/// Headless runs have no Bevy app, so they install their own subscriber.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.headless.is_some() {
        setup_logging();
    }

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(speed) = cli.speed {
        config.speed = speed;
    }

    let sim = Simulation::new(config).context("building simulation")?;
    let telemetry = match &cli.telemetry {
        Some(dir) => Some(TelemetryWriter::create(dir, cli.telemetry_interval)?),
        None => None,
    };

    match cli.headless {
        Some(ticks) => run_headless(sim, telemetry, ticks, cli.report_every),
        None => {
            run_viewer(sim, telemetry);
            Ok(())
        }
    }
}

fn run_headless(
    mut sim: Simulation,
    mut telemetry: Option<TelemetryWriter>,
    ticks: u64,
    report_every: u64,
) -> Result<()> {
    let report_every = report_every.max(1);
    for _ in 0..ticks {
        sim.tick();
        if let Some(writer) = telemetry.as_mut() {
            writer.record(sim.stats())?;
        }
        let stats = sim.stats();
        if stats.ticks % report_every == 0 {
            info!(
                tick = stats.ticks,
                delivered = stats.food_delivered,
                remaining = stats.food_remaining,
                pheromones = stats.active_pheromones,
                carrying = stats.ants_carrying_food,
                following = stats.ants_following_trail,
                "progress"
            );
        }
    }

    let stats = sim.stats();
    info!(
        ticks = stats.ticks,
        steps = stats.steps,
        delivered = stats.food_delivered,
        total = stats.total_food,
        efficiency = stats.food_efficiency,
        "run finished"
    );
    Ok(())
}

fn run_viewer(sim: Simulation, telemetry: Option<TelemetryWriter>) {
    let color_config = ColorConfig::default();

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Ant Colony".into(),
                        present_mode: bevy::window::PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: LOG_FILTER.into(),
                    level: bevy::log::Level::INFO,
                    ..default()
                }),
        )
        .insert_resource(ClearColor(color_config.background))
        .insert_resource(color_config)
        .insert_resource(Colony::new(sim))
        .insert_resource(Telemetry(telemetry))
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                keyboard_system,
                restart_system,
                simulation_tick_system,
                cell_visual_system,
                ant_visual_system,
                stats_text_system,
                camera_control_system,
            )
                .chain(),
        )
        .run();
}
