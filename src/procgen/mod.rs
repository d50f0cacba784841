//! Procedural scene generation.
//!
//! - Ground plane and grid city
//! - Ring course

use bevy::prelude::*;

pub mod city;
pub mod rings;

pub struct ProcgenPlugin;

impl Plugin for ProcgenPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(city::CityPlugin)
            .add_plugins(rings::RingsPlugin);
    }
}
