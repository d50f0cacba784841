//! Flight HUD and debug toggles.

use bevy::{
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

use crate::camera::CameraMode;
use crate::game_state::GameState;
use crate::physics::{BodyHandle, PhysicsWorld};
use crate::simulation::flight::Airplane;
use crate::simulation::traffic_lights::{LightState, TrafficLight};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(FrameTimeDiagnosticsPlugin::default())
            .init_resource::<DebugConfig>()
            .add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (
                    update_fps_counter,
                    update_flight_readout,
                    update_status_line,
                    toggle_debug_views,
                ),
            );
    }
}

/// Configuration for debug visualization.
#[derive(Resource)]
pub struct DebugConfig {
    /// Frame rate line on the HUD.
    pub show_fps: bool,
    /// Wireframes of every physics body.
    pub show_bodies: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            show_bodies: false,
        }
    }
}

#[derive(Component)]
struct FpsText;

#[derive(Component)]
struct FlightText;

#[derive(Component)]
struct StatusText;

/// Airspeed and altitude line shown on the HUD.
pub fn flight_readout(speed: f32, altitude: f32) -> String {
    format!("SPD {:>5.1} m/s | ALT {:>6.1} m", speed, altitude)
}

/// Camera, per-street signal and session summary line.
///
/// `lights` pairs each street label with its light's state, in display order.
pub fn status_line(mode: CameraMode, lights: &[(&str, LightState)], paused: bool) -> String {
    let mut line = format!("CAM: {}", mode.label());
    if lights.is_empty() {
        line.push_str(" | SIGNAL: --");
    }
    for (street, state) in lights {
        let state = match state {
            LightState::Red => "RED",
            LightState::Green => "GREEN",
        };
        line.push_str(&format!(" | {street}: {state}"));
    }
    if paused {
        line.push_str(" [PAUSED]");
    }
    line
}

fn setup_hud(mut commands: Commands) {
    let panel_bg = Color::srgba(0.04, 0.05, 0.06, 0.8);
    let border = Color::srgb(0.0, 0.75, 0.35);
    let retro_green = Color::srgb(0.4, 0.95, 0.6);
    let retro_orange = Color::srgb(1.0, 0.6, 0.2);

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                right: Val::Px(10.0),
                padding: UiRect::axes(Val::Px(12.0), Val::Px(10.0)),
                border: UiRect::all(Val::Px(1.0)),
                row_gap: Val::Px(6.0),
                flex_direction: FlexDirection::Column,
                ..default()
            },
            BackgroundColor(panel_bg),
            BorderColor(border),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("AEROCITY // FLIGHT DATA"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(retro_orange),
            ));

            parent.spawn((
                Text::new("FPS: --"),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(retro_green),
                FpsText,
            ));

            parent.spawn((
                Text::new(flight_readout(0.0, 0.0)),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(retro_green),
                FlightText,
            ));

            parent.spawn((
                Text::new("CAM: -- | SIGNAL: --"),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextColor(Color::srgb(0.75, 0.95, 0.8)),
                StatusText,
            ));
        });

    commands.spawn((
        Text::new(
            "W: Thrust | Up/Down: Pitch | Left/Right: Roll | A/D: Yaw | C: Camera | P: Pause | F2: FPS | F3: Bodies",
        ),
        TextFont {
            font_size: 14.0,
            ..default()
        },
        TextColor(Color::srgb(0.65, 0.85, 0.7)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
    ));
}

fn update_fps_counter(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<(&mut Text, &mut Visibility), With<FpsText>>,
    config: Res<DebugConfig>,
) {
    for (mut text, mut visibility) in &mut query {
        let wanted = if config.show_fps {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        visibility.set_if_neq(wanted);
        if !config.show_fps {
            continue;
        }

        if let Some(fps) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
            if let Some(value) = fps.smoothed() {
                **text = format!("FPS: {:.0}", value);
            }
        }
    }
}

fn update_flight_readout(
    world: Res<PhysicsWorld>,
    airplanes: Query<&BodyHandle, With<Airplane>>,
    mut query: Query<&mut Text, With<FlightText>>,
) {
    let Some(body) = airplanes
        .get_single()
        .ok()
        .and_then(|handle| world.body(*handle))
    else {
        return;
    };

    for mut text in &mut query {
        **text = flight_readout(body.speed(), body.position().y);
    }
}

fn update_status_line(
    mode: Res<CameraMode>,
    state: Res<State<GameState>>,
    lights: Query<&TrafficLight>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    let mut signals: Vec<(&str, LightState)> =
        lights.iter().map(|light| (light.street, light.state)).collect();
    signals.sort_by_key(|(street, _)| *street);
    let line = status_line(*mode, &signals, *state.get() == GameState::Paused);

    for mut text in &mut query {
        if **text != line {
            **text = line.clone();
        }
    }
}

/// Toggle debug visualization modes with keyboard.
fn toggle_debug_views(keys: Res<ButtonInput<KeyCode>>, mut config: ResMut<DebugConfig>) {
    if keys.just_pressed(KeyCode::F2) {
        config.show_fps = !config.show_fps;
        info!("FPS counter: {}", if config.show_fps { "ON" } else { "OFF" });
    }

    if keys.just_pressed(KeyCode::F3) {
        config.show_bodies = !config.show_bodies;
        info!(
            "Physics bodies: {}",
            if config.show_bodies { "ON" } else { "OFF" }
        );
    }
}
