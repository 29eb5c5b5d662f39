use antsim::PheromoneKind;
use bevy::prelude::*;

/// Palette shared by every viewer system
#[derive(Resource, Clone)]
pub struct ColorConfig {
    // Pheromone colors
    pub to_nest_pheromone: Color,
    pub to_food_pheromone: Color,

    // Entity colors
    pub nest: Color,
    pub food: Color,
    pub ant_searching: Color,
    pub ant_carrying_food: Color,

    // UI colors
    pub background: Color,
    pub text: Color,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            to_nest_pheromone: Color::srgb(0.0, 0.0, 1.0), // Blue
            to_food_pheromone: Color::srgb(1.0, 0.65, 0.0), // Orange

            nest: Color::srgb(0.55, 0.27, 0.07), // Brown
            food: Color::srgb(0.0, 0.8, 0.0),    // Green
            ant_searching: Color::srgb(0.9, 0.9, 0.9),
            ant_carrying_food: Color::srgb(1.0, 0.0, 0.0), // Red

            background: Color::srgb(0.08, 0.08, 0.08),
            text: Color::WHITE,
        }
    }
}

impl ColorConfig {
    pub fn pheromone(&self, kind: PheromoneKind) -> Color {
        match kind {
            PheromoneKind::ToNest => self.to_nest_pheromone,
            PheromoneKind::ToFood => self.to_food_pheromone,
        }
    }

    /// Pheromone tint whose opacity follows trail strength.
    pub fn pheromone_shade(&self, kind: PheromoneKind, strength: f64) -> Color {
        let base = self.pheromone(kind).to_srgba();
        let alpha = (strength * 0.4).min(0.8) as f32;
        Color::srgba(base.red, base.green, base.blue, alpha)
    }
}
