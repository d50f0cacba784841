//! City grid generation: the ground plane and a square grid of box buildings.
//!
//! Buildings sit on a regular pitch with the grid offset by half a pitch, so
//! the two streets the traffic drives along (x = 0 and z = 0) stay clear.
//! Heights mix a Perlin skyline with per-building jitter.

use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::physics::{BodyDesc, BodyShape, PhysicsWorld};

pub struct CityPlugin;

impl Plugin for CityPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CityConfig>()
            .add_systems(Startup, (spawn_ground, spawn_city));
    }
}

#[derive(Resource, Clone, Debug)]
pub struct CityConfig {
    pub seed: u64,
    /// Buildings per side of each axis; the grid is `2n × 2n`.
    pub blocks_per_side: i32,
    pub building_width: f32,
    pub street_width: f32,
    pub min_height: f32,
    /// Heights fall in `[min_height, min_height + height_variation)`.
    pub height_variation: f32,
    /// Frequency of the skyline noise, per world unit.
    pub skyline_scale: f64,
    /// Side length of the square ground plane.
    pub ground_size: f32,
    pub ground_color: Color,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            blocks_per_side: 10,
            building_width: 20.0,
            street_width: 5.0,
            min_height: 10.0,
            height_variation: 50.0,
            skyline_scale: 0.008,
            ground_size: 500.0,
            ground_color: Color::srgb_u8(0x8B, 0x45, 0x13),
        }
    }
}

impl CityConfig {
    /// Distance between neighbouring building centres.
    pub fn pitch(&self) -> f32 {
        self.building_width + self.street_width
    }
}

/// Marker for the ground plane.
#[derive(Component)]
pub struct Ground;

#[derive(Component)]
pub struct Building {
    pub height: f32,
}

/// One building the generator decided to place.
#[derive(Clone, Debug)]
pub struct BuildingPlan {
    pub center: Vec3,
    pub size: Vec3,
    pub color: Color,
}

/// Lay out the full grid. Deterministic for a given seed.
pub fn plan_city(config: &CityConfig) -> Vec<BuildingPlan> {
    let perlin = Perlin::new(config.seed as u32);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let pitch = config.pitch();
    let n = config.blocks_per_side;
    let mut plans = Vec::with_capacity((4 * n * n).max(0) as usize);

    for i in -n..n {
        for j in -n..n {
            let x = (i as f32 + 0.5) * pitch;
            let z = (j as f32 + 0.5) * pitch;

            let skyline = (perlin.get([x as f64 * config.skyline_scale, z as f64 * config.skyline_scale])
                + 1.0)
                * 0.5;
            let skyline = skyline.clamp(0.0, 1.0) as f32;
            let jitter: f32 = rng.gen();
            let height = config.min_height + config.height_variation * (0.5 * skyline + 0.5 * jitter);

            let color = Color::hsl(
                rng.gen_range(0.0..360.0),
                rng.gen_range(0.2..0.6),
                rng.gen_range(0.35..0.75),
            );

            plans.push(BuildingPlan {
                center: Vec3::new(x, height * 0.5, z),
                size: Vec3::new(config.building_width, height, config.building_width),
                color,
            });
        }
    }

    plans
}

fn spawn_ground(
    mut commands: Commands,
    config: Res<CityConfig>,
    mut world: ResMut<PhysicsWorld>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let handle = match world.add_body(BodyDesc::fixed(BodyShape::Plane)) {
        Ok(handle) => handle,
        Err(err) => {
            error!("Ground body rejected: {err}");
            return;
        }
    };

    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(config.ground_size, config.ground_size))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: config.ground_color,
            perceptual_roughness: 0.95,
            ..default()
        })),
        Transform::default(),
        Ground,
        handle,
    ));
}

fn spawn_city(
    mut commands: Commands,
    config: Res<CityConfig>,
    mut world: ResMut<PhysicsWorld>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let plans = plan_city(&config);
    // Unit cube scaled per building.
    let cube = meshes.add(Cuboid::from_length(1.0));

    for plan in &plans {
        let body = BodyDesc::fixed(BodyShape::Cuboid {
            half_extents: plan.size * 0.5,
        })
        .with_position(plan.center);
        let handle = match world.add_body(body) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Skipping building at {:?}: {err}", plan.center);
                continue;
            }
        };

        commands.spawn((
            Mesh3d(cube.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: plan.color,
                perceptual_roughness: 0.8,
                ..default()
            })),
            Transform::from_translation(plan.center).with_scale(plan.size),
            Building {
                height: plan.size.y,
            },
            handle,
        ));
    }

    info!("Spawned {} buildings", plans.len());
}
