//! Aerocity - arcade flight over a procedurally generated city.
//!
//! A Bevy app in which the player flies a physics-driven airplane over a
//! grid city with looping traffic, synchronized traffic lights, and rain.

use bevy::prelude::*;

pub mod camera;
pub mod error;
pub mod game_state;
pub mod physics;
pub mod procgen;
pub mod render;
pub mod settings;
pub mod simulation;
pub mod ui;

pub use error::{ConfigError, PhysicsError};
pub use settings::Settings;

/// Sky colour, also used as the clear colour.
pub const SKY_COLOR: Color = Color::srgb(0.529, 0.808, 0.922);

/// Every gameplay plugin. Expects `DefaultPlugins` (or equivalent) to be
/// present already.
pub struct AerocityPlugin;

impl Plugin for AerocityPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(SKY_COLOR))
            // Game state management
            .add_plugins(game_state::GameStatePlugin)
            // Frame ordering, flight, traffic
            .add_plugins(simulation::SimulationPlugin)
            .add_plugins(physics::PhysicsPlugin)
            // Scene
            .add_plugins(procgen::ProcgenPlugin)
            .add_plugins(render::RenderPlugin)
            .add_plugins(camera::CameraPlugin)
            // HUD
            .add_plugins(ui::UiPlugin);
    }
}
