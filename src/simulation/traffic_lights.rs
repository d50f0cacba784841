//! Traffic lights sharing a single red/green cycle.
//!
//! Every light flips on the same frame; there are no per-light phase offsets.

use bevy::prelude::*;

use crate::simulation::FrameSet;

pub struct TrafficLightsPlugin;

impl Plugin for TrafficLightsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrafficLightConfig>()
            .init_resource::<TrafficLightTimer>()
            .add_systems(Startup, spawn_traffic_lights)
            .add_systems(Update, cycle_traffic_lights.in_set(FrameSet::Subsystems));
    }
}

/// Traffic light state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightState {
    #[default]
    Red,
    Green,
}

impl LightState {
    pub fn toggled(self) -> Self {
        match self {
            LightState::Red => LightState::Green,
            LightState::Green => LightState::Red,
        }
    }
}

/// Where a light stands and what it shows at startup.
#[derive(Clone, Copy, Debug)]
pub struct LightPlacement {
    /// Short name of the street the light controls, shown on the HUD.
    pub street: &'static str,
    pub position: Vec3,
    pub initial_state: LightState,
}

#[derive(Resource, Clone, Debug)]
pub struct TrafficLightConfig {
    /// Seconds between flips.
    pub period: f32,
    pub placements: Vec<LightPlacement>,
    /// Size of the signal box.
    pub size: Vec3,
}

impl Default for TrafficLightConfig {
    fn default() -> Self {
        Self {
            period: 5.0,
            // One light on the kerb of each street, so a car is only ever
            // held by the signal on its own street.
            placements: vec![
                LightPlacement {
                    street: "X-ST",
                    position: Vec3::new(60.0, 1.5, 2.0),
                    initial_state: LightState::Red,
                },
                LightPlacement {
                    street: "Z-ST",
                    position: Vec3::new(-2.0, 1.5, -60.0),
                    initial_state: LightState::Green,
                },
            ],
            size: Vec3::new(1.0, 3.0, 1.0),
        }
    }
}

/// A signal with its current state and the two materials it alternates between.
#[derive(Component)]
pub struct TrafficLight {
    pub street: &'static str,
    pub state: LightState,
    pub red_material: Handle<StandardMaterial>,
    pub green_material: Handle<StandardMaterial>,
}

impl TrafficLight {
    pub fn material(&self) -> Handle<StandardMaterial> {
        match self.state {
            LightState::Red => self.red_material.clone(),
            LightState::Green => self.green_material.clone(),
        }
    }
}

/// Shared clock for the light cycle.
#[derive(Resource, Clone, Debug)]
pub struct TrafficLightTimer {
    /// Elapsed time (seconds) at the last flip.
    pub last_change: f64,
    /// Number of flips so far.
    pub cycles: u64,
}

impl Default for TrafficLightTimer {
    fn default() -> Self {
        Self {
            last_change: 0.0,
            cycles: 0,
        }
    }
}

impl TrafficLightTimer {
    /// Returns true, and restarts the interval, once more than `period`
    /// seconds have elapsed since the previous flip.
    pub fn should_flip(&mut self, now: f64, period: f32) -> bool {
        if now - self.last_change > f64::from(period) {
            self.last_change = now;
            self.cycles += 1;
            true
        } else {
            false
        }
    }
}

fn spawn_traffic_lights(
    mut commands: Commands,
    config: Res<TrafficLightConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let red_material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.0, 0.0),
        emissive: LinearRgba::new(1.0, 0.1, 0.1, 1.0),
        ..default()
    });
    let green_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.0, 1.0, 0.0),
        emissive: LinearRgba::new(0.1, 1.0, 0.2, 1.0),
        ..default()
    });
    let light_mesh = meshes.add(Cuboid::from_size(config.size));

    for placement in &config.placements {
        let light = TrafficLight {
            street: placement.street,
            state: placement.initial_state,
            red_material: red_material.clone(),
            green_material: green_material.clone(),
        };
        commands.spawn((
            Mesh3d(light_mesh.clone()),
            MeshMaterial3d(light.material()),
            Transform::from_translation(placement.position),
            light,
        ));
    }

    info!("Spawned {} traffic lights", config.placements.len());
}

/// Flip every light at once when the shared period has elapsed.
fn cycle_traffic_lights(
    time: Res<Time>,
    config: Res<TrafficLightConfig>,
    mut timer: ResMut<TrafficLightTimer>,
    mut lights: Query<(&mut TrafficLight, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    if !timer.should_flip(time.elapsed_secs_f64(), config.period) {
        return;
    }

    for (mut light, mut material) in lights.iter_mut() {
        light.state = light.state.toggled();
        material.0 = light.material();
    }

    debug!("Traffic lights flipped (cycle {})", timer.cycles);
}
