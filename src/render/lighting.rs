//! Scene lighting: flat white ambient plus one sun.

use bevy::{pbr::CascadeShadowConfigBuilder, prelude::*};

pub struct LightingPlugin;

impl Plugin for LightingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LightingConfig>()
            .add_systems(Startup, setup_lighting);
    }
}

#[derive(Resource, Clone, Debug)]
pub struct LightingConfig {
    pub ambient_brightness: f32,
    pub sun_illuminance: f32,
    /// Point the sun shines from; it always aims at the origin.
    pub sun_position: Vec3,
    pub shadows: bool,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_brightness: 500.0,
            sun_illuminance: 10_000.0,
            sun_position: Vec3::new(1.0, 1.0, 1.0),
            shadows: true,
        }
    }
}

/// Marker for the main directional light.
#[derive(Component)]
pub struct Sun;

/// Orientation of a directional light shining from `position` towards the origin.
pub fn sun_transform(position: Vec3) -> Transform {
    Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y)
}

fn setup_lighting(mut commands: Commands, config: Res<LightingConfig>) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: config.ambient_brightness,
    });

    commands.spawn((
        DirectionalLight {
            illuminance: config.sun_illuminance,
            shadows_enabled: config.shadows,
            shadow_depth_bias: 0.3,
            shadow_normal_bias: 1.8,
            ..default()
        },
        sun_transform(config.sun_position),
        // City spans ~500 units.
        CascadeShadowConfigBuilder {
            num_cascades: 3,
            minimum_distance: 0.1,
            maximum_distance: 600.0,
            first_cascade_far_bound: 60.0,
            overlap_proportion: 0.3,
        }
        .build(),
        Sun,
    ));
}
