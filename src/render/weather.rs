//! Rain rendered as a falling point cloud.
//!
//! A fixed set of particles falls at constant speed; each one that drops
//! below the ground re-enters at the top of the volume with its x/z kept.
//! Particles live only in the mesh's position attribute, which is moved in
//! place every frame, so the cloud never allocates after startup.

use bevy::{
    log::warn_once,
    prelude::*,
    render::{
        mesh::{PrimitiveTopology, VertexAttributeValues},
        render_asset::RenderAssetUsages,
        view::NoFrustumCulling,
    },
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::simulation::FrameSet;

pub struct WeatherPlugin;

impl Plugin for WeatherPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WeatherConfig>()
            .add_systems(Startup, spawn_rain)
            .add_systems(Update, update_rain.in_set(FrameSet::Subsystems));
    }
}

/// Configuration for the rain volume.
#[derive(Resource, Clone, Debug)]
pub struct WeatherConfig {
    pub particle_count: usize,
    /// Width of the volume along x and z, centred on the origin.
    pub extent: f32,
    /// Height of the volume; particles live in [0, ceiling).
    pub ceiling: f32,
    /// Fall speed in world units per second.
    pub fall_speed: f32,
    pub color: Color,
    pub seed: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            extent: 500.0,
            ceiling: 500.0,
            fall_speed: 120.0, // 2 units per frame at 60 Hz
            color: Color::srgba(0.667, 0.667, 0.667, 0.8),
            seed: 1234,
        }
    }
}

/// Marker for the rain point mesh. Its position attribute is the only copy
/// of the particle state.
#[derive(Component)]
pub struct RainCloud;

/// Scatter `config.particle_count` particles uniformly through the volume.
pub fn scatter_rain(config: &WeatherConfig, rng: &mut impl Rng) -> Vec<[f32; 3]> {
    let half = config.extent * 0.5;
    (0..config.particle_count)
        .map(|_| {
            [
                rng.gen_range(-half..half),
                rng.gen_range(0.0..config.ceiling),
                rng.gen_range(-half..half),
            ]
        })
        .collect()
}

/// Drop every particle by `distance`, wrapping into [0, ceiling).
pub fn fall(positions: &mut [[f32; 3]], distance: f32, ceiling: f32) {
    for position in positions.iter_mut() {
        position[1] = wrap_height(position[1] - distance, ceiling);
    }
}

/// Wrap a height into [0, ceiling), carrying any overshoot below the ground
/// to just under the ceiling.
fn wrap_height(y: f32, ceiling: f32) -> f32 {
    let wrapped = y.rem_euclid(ceiling);
    // rem_euclid may round up to exactly `ceiling` for tiny negative inputs.
    if wrapped >= ceiling {
        0.0
    } else {
        wrapped
    }
}

pub fn rain_mesh(positions: Vec<[f32; 3]>) -> Mesh {
    Mesh::new(PrimitiveTopology::PointList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
}

/// Advance the rain stored in `mesh` in place. Returns false when the mesh
/// has no `Float32x3` positions to move.
pub fn advance_rain_mesh(mesh: &mut Mesh, distance: f32, ceiling: f32) -> bool {
    match mesh.attribute_mut(Mesh::ATTRIBUTE_POSITION) {
        Some(VertexAttributeValues::Float32x3(positions)) => {
            fall(positions, distance, ceiling);
            true
        }
        _ => false,
    }
}

fn spawn_rain(
    mut commands: Commands,
    config: Res<WeatherConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mesh = meshes.add(rain_mesh(scatter_rain(&config, &mut rng)));
    let material = materials.add(StandardMaterial {
        base_color: config.color,
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    commands.spawn((
        Mesh3d(mesh),
        MeshMaterial3d(material),
        Transform::default(),
        // Points move every frame; the startup bounds would go stale.
        NoFrustumCulling,
        RainCloud,
    ));

    info!("Spawned rain with {} particles", config.particle_count);
}

fn update_rain(
    time: Res<Time>,
    config: Res<WeatherConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    clouds: Query<&Mesh3d, With<RainCloud>>,
) {
    let distance = config.fall_speed * time.delta_secs();

    for mesh in clouds.iter() {
        let Some(mesh) = meshes.get_mut(&mesh.0) else {
            continue;
        };
        if !advance_rain_mesh(mesh, distance, config.ceiling) {
            warn_once!("Rain mesh has no point positions");
        }
    }
}
