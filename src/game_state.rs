//! Session state: flying or paused.
//!
//! Pausing also pauses virtual time, so the traffic-light clock and every
//! delta-scaled subsystem freeze together with the physics world.

use bevy::prelude::*;

pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<SessionBindings>()
            .add_systems(Update, toggle_pause)
            .add_systems(OnEnter(GameState::Paused), pause_virtual_time)
            .add_systems(OnExit(GameState::Paused), resume_virtual_time);
    }
}

/// High-level session state controlling which systems run.
#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum GameState {
    /// Simulation running.
    #[default]
    Flying,
    /// Simulation frozen; rendering and input continue.
    Paused,
}

/// Keys for session-level actions.
#[derive(Resource, Clone, Debug)]
pub struct SessionBindings {
    pub pause: KeyCode,
}

impl Default for SessionBindings {
    fn default() -> Self {
        Self { pause: KeyCode::KeyP }
    }
}

fn toggle_pause(
    keyboard: Res<ButtonInput<KeyCode>>,
    bindings: Res<SessionBindings>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if !keyboard.just_pressed(bindings.pause) {
        return;
    }

    match state.get() {
        GameState::Flying => {
            next_state.set(GameState::Paused);
            info!("Simulation PAUSED");
        }
        GameState::Paused => {
            next_state.set(GameState::Flying);
            info!("Simulation RESUMED");
        }
    }
}

fn pause_virtual_time(mut time: ResMut<Time<Virtual>>) {
    time.pause();
}

fn resume_virtual_time(mut time: ResMut<Time<Virtual>>) {
    time.unpause();
}
