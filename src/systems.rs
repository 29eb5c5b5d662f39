use antsim::config::{MAX_SPEED, TICKS_PER_SECOND};
use antsim::{AntId, Simulation, TelemetryWriter};
use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;

use crate::colors::*;

pub const CELL_SIZE: f32 = 6.0;

#[derive(Resource)]
pub struct Colony {
    pub sim: Simulation,
    pub paused: bool,
    pub timer: Timer,
    /// Set when the ant arena was rebuilt and sprites must follow.
    pub restarted: bool,
}

impl Colony {
    pub fn new(sim: Simulation) -> Self {
        Self {
            sim,
            paused: false,
            timer: Timer::from_seconds((1.0 / TICKS_PER_SECOND) as f32, TimerMode::Repeating),
            restarted: false,
        }
    }

    fn world_position(&self, x: i32, y: i32) -> Vec2 {
        let grid = self.sim.grid();
        Vec2::new(
            (x as f32 - grid.width() as f32 / 2.0) * CELL_SIZE,
            (y as f32 - grid.height() as f32 / 2.0) * CELL_SIZE,
        )
    }
}

#[derive(Resource, Default)]
pub struct Telemetry(pub Option<TelemetryWriter>);

#[derive(Component)]
pub struct CellSprite {
    pub index: usize,
}

#[derive(Component)]
pub struct AntSprite(pub AntId);

#[derive(Component)]
pub struct StatsText;

pub fn setup(mut commands: Commands, colony: Res<Colony>, color_config: Res<ColorConfig>) {
    commands.spawn(Camera2dBundle::default());

    commands.spawn(TextBundle::from_section(
        "Ant Colony\nUp/Down: Speed  Space: Pause  R: Restart\nWASD: Move  Wheel: Zoom  ESC: Exit",
        TextStyle {
            font_size: 18.0,
            color: color_config.text,
            ..default()
        },
    ).with_style(Style {
        position_type: PositionType::Absolute,
        top: Val::Px(10.0),
        left: Val::Px(10.0),
        ..default()
    }));

    commands.spawn((
        TextBundle::from_section(
            "",
            TextStyle {
                font_size: 16.0,
                color: Color::srgb(0.0, 1.0, 0.0),
                ..default()
            },
        ).with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            right: Val::Px(10.0),
            max_width: Val::Px(320.0),
            ..default()
        }),
        StatsText,
    ));

    let grid = colony.sim.grid();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = colony.world_position(x, y);
            commands.spawn((
                SpriteBundle {
                    sprite: Sprite {
                        color: Color::NONE,
                        custom_size: Some(Vec2::splat(CELL_SIZE)),
                        ..default()
                    },
                    transform: Transform::from_xyz(pos.x, pos.y, -10.0),
                    ..default()
                },
                CellSprite {
                    index: (y * grid.width() + x) as usize,
                },
            ));
        }
    }

    let nest = colony.sim.nest();
    let pos = colony.world_position(nest.x, nest.y);
    commands.spawn(SpriteBundle {
        sprite: Sprite {
            color: color_config.nest,
            custom_size: Some(Vec2::splat(CELL_SIZE * 3.0)),
            ..default()
        },
        transform: Transform::from_xyz(pos.x, pos.y, 5.0),
        ..default()
    });

    spawn_ant_sprites(&mut commands, &colony, &color_config);
}

fn spawn_ant_sprites(commands: &mut Commands, colony: &Colony, color_config: &ColorConfig) {
    for (id, ant) in colony.sim.ants() {
        let pos = colony.world_position(ant.position.x, ant.position.y);
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: color_config.ant_searching,
                    custom_size: Some(Vec2::splat(CELL_SIZE * 0.8)),
                    ..default()
                },
                transform: Transform::from_xyz(pos.x, pos.y, 6.0),
                ..default()
            },
            AntSprite(id),
        ));
    }
}

pub fn simulation_tick_system(
    time: Res<Time>,
    mut colony: ResMut<Colony>,
    mut telemetry: ResMut<Telemetry>,
) {
    if colony.paused {
        return;
    }
    colony.timer.tick(time.delta());
    if !colony.timer.just_finished() {
        return;
    }
    colony.sim.tick();

    if let Some(writer) = telemetry.0.as_mut() {
        if let Err(e) = writer.record(colony.sim.stats()) {
            error!("disabling telemetry: {e}");
            telemetry.0 = None;
        }
    }
}

pub fn keyboard_system(
    input: Res<ButtonInput<KeyCode>>,
    mut colony: ResMut<Colony>,
    mut exit: EventWriter<AppExit>,
) {
    if input.just_pressed(KeyCode::Escape) {
        exit.send(AppExit::Success);
    }
    if input.just_pressed(KeyCode::Space) {
        colony.paused = !colony.paused;
        info!(paused = colony.paused, "toggled pause");
    }

    let speed = colony.sim.config().speed;
    let requested = if input.just_pressed(KeyCode::ArrowUp) {
        (speed + 1).min(MAX_SPEED)
    } else if input.just_pressed(KeyCode::ArrowDown) {
        speed.saturating_sub(1).max(1)
    } else {
        speed
    };
    if requested != speed {
        if let Err(e) = colony.sim.set_speed(requested) {
            warn!("speed change rejected: {e}");
        }
    }

    if input.just_pressed(KeyCode::KeyR) {
        let config = colony.sim.config().clone();
        match Simulation::new(config) {
            Ok(sim) => {
                colony.sim = sim;
                colony.restarted = true;
                info!("simulation restarted");
            }
            Err(e) => error!("restart failed: {e}"),
        }
    }
}

pub fn restart_system(
    mut commands: Commands,
    mut colony: ResMut<Colony>,
    ant_sprites: Query<Entity, With<AntSprite>>,
    color_config: Res<ColorConfig>,
) {
    if !colony.restarted {
        return;
    }
    for entity in ant_sprites.iter() {
        commands.entity(entity).despawn();
    }
    spawn_ant_sprites(&mut commands, &colony, &color_config);
    colony.restarted = false;
}

pub fn cell_visual_system(
    mut cells: Query<(&CellSprite, &mut Sprite)>,
    colony: Res<Colony>,
    color_config: Res<ColorConfig>,
) {
    let grid = colony.sim.grid();
    let size = (grid.width() * grid.height()) as usize;
    let mut shades = vec![Color::NONE; size];
    let mut strongest = vec![0.0_f64; size];

    for (_, pheromone) in colony.sim.pheromones().iter() {
        let idx = (pheromone.position.y * grid.width() + pheromone.position.x) as usize;
        if pheromone.strength > strongest[idx] {
            strongest[idx] = pheromone.strength;
            shades[idx] = color_config.pheromone_shade(pheromone.kind, pheromone.strength);
        }
    }
    for (_, unit) in colony.sim.food().iter() {
        let idx = (unit.position.y * grid.width() + unit.position.x) as usize;
        shades[idx] = color_config.food;
    }

    for (cell, mut sprite) in cells.iter_mut() {
        if let Some(color) = shades.get(cell.index) {
            sprite.color = *color;
        }
    }
}

pub fn ant_visual_system(
    mut ants: Query<(&AntSprite, &mut Transform, &mut Sprite)>,
    colony: Res<Colony>,
    color_config: Res<ColorConfig>,
) {
    for (AntSprite(id), mut transform, mut sprite) in ants.iter_mut() {
        let Some(ant) = colony.sim.ant(*id) else {
            continue;
        };
        let pos = colony.world_position(ant.position.x, ant.position.y);
        transform.translation.x = pos.x;
        transform.translation.y = pos.y;
        sprite.color = if ant.carrying_food {
            color_config.ant_carrying_food
        } else {
            color_config.ant_searching
        };
    }
}

pub fn stats_text_system(colony: Res<Colony>, mut text_query: Query<&mut Text, With<StatsText>>) {
    let Ok(mut text) = text_query.get_single_mut() else {
        return;
    };
    let stats = colony.sim.stats();
    text.sections[0].value = format!(
        "Speed: {}x{}\nTick: {}  Steps: {}\nFood delivered: {} / {}\nFood remaining: {}\nPheromones: {} (nest {}, food {})\nCarrying food: {}\nNear nest: {}\nFollowing trail: {}  Random: {}\nEfficiency: {:.3}",
        colony.sim.config().speed,
        if colony.paused { " (paused)" } else { "" },
        stats.ticks,
        stats.steps,
        stats.food_delivered,
        stats.total_food,
        stats.food_remaining,
        stats.active_pheromones,
        stats.to_nest_pheromones,
        stats.to_food_pheromones,
        stats.ants_carrying_food,
        stats.ants_near_nest,
        stats.ants_following_trail,
        stats.ants_random_walking,
        stats.food_efficiency,
    );
}

pub fn camera_control_system(
    mut camera_query: Query<&mut Transform, With<Camera>>,
    input: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut scroll_events: EventReader<MouseWheel>,
) {
    let Ok(mut camera_transform) = camera_query.get_single_mut() else {
        return;
    };
    let mut camera_move = Vec3::ZERO;
    let camera_speed = 200.0;

    if input.pressed(KeyCode::KeyW) {
        camera_move.y += camera_speed;
    }
    if input.pressed(KeyCode::KeyS) {
        camera_move.y -= camera_speed;
    }
    if input.pressed(KeyCode::KeyA) {
        camera_move.x -= camera_speed;
    }
    if input.pressed(KeyCode::KeyD) {
        camera_move.x += camera_speed;
    }

    camera_transform.translation += camera_move * time.delta_seconds();

    for event in scroll_events.read() {
        let zoom_factor = if event.y > 0.0 { 0.9 } else { 1.1 };
        camera_transform.scale *= zoom_factor;
        camera_transform.scale = camera_transform.scale.clamp(Vec3::splat(0.1), Vec3::splat(5.0));
    }
}
