//! Per-frame simulation: flight controls, traffic, and traffic lights.
//!
//! One frame runs the [`FrameSet`]s in order: input is read, flight forces
//! are applied, the physics world is stepped, body poses are copied into
//! transforms, and then the independent subsystems (camera, traffic, lights,
//! weather) update. Everything after input is skipped while paused.

use bevy::prelude::*;

use crate::game_state::GameState;

pub mod flight;
pub mod traffic;
pub mod traffic_lights;

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                FrameSet::Input,
                FrameSet::Forces,
                FrameSet::Physics,
                FrameSet::Sync,
                FrameSet::Subsystems,
            )
                .chain(),
        )
        .configure_sets(
            Update,
            (
                FrameSet::Forces,
                FrameSet::Physics,
                FrameSet::Sync,
                FrameSet::Subsystems,
            )
                .run_if(in_state(GameState::Flying)),
        )
        .add_plugins(flight::FlightPlugin)
        .add_plugins(traffic_lights::TrafficLightsPlugin)
        .add_plugins(traffic::TrafficPlugin);
    }
}

/// Ordered stages of one simulation frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    /// Translate device input into simulation input.
    Input,
    /// Accumulate forces and torques on bodies.
    Forces,
    /// Advance the physics world.
    Physics,
    /// Copy physics poses into visual transforms.
    Sync,
    /// Camera, traffic, lights, and weather; unordered among themselves.
    Subsystems,
}
