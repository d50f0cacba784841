//! Rendering: lights, rain, and the physics overlay.

use bevy::prelude::*;

pub mod lighting;
pub mod physics_debug;
pub mod weather;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(lighting::LightingPlugin)
            .add_plugins(weather::WeatherPlugin)
            .add_plugins(physics_debug::PhysicsDebugPlugin);
    }
}
