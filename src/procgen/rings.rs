//! Floating rings along the initial flight line.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use bevy::prelude::*;

use crate::physics::{BodyDesc, BodyShape, PhysicsWorld};

pub struct RingsPlugin;

impl Plugin for RingsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RingConfig>()
            .add_systems(Startup, spawn_rings);
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RingPlacement {
    pub position: Vec3,
    /// Rotation about the world X axis, in radians. Zero faces the ring
    /// along the Z axis.
    pub tilt: f32,
}

#[derive(Resource, Clone, Debug)]
pub struct RingConfig {
    /// Distance from the ring centre to the middle of the tube.
    pub radius: f32,
    /// Tube radius.
    pub tube: f32,
    pub color: Color,
    pub placements: Vec<RingPlacement>,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            radius: 10.0,
            tube: 1.0,
            color: Color::srgb(1.0, 1.0, 0.0),
            placements: vec![
                RingPlacement {
                    position: Vec3::new(0.0, 100.0, -100.0),
                    tilt: 0.0,
                },
                RingPlacement {
                    position: Vec3::new(50.0, 120.0, -200.0),
                    tilt: FRAC_PI_4,
                },
                RingPlacement {
                    position: Vec3::new(-50.0, 140.0, -300.0),
                    tilt: -FRAC_PI_4,
                },
            ],
        }
    }
}

#[derive(Component)]
pub struct Ring;

/// Orientation of a ring tilted by `tilt` radians about X.
///
/// Torus meshes are built lying flat, threaded along +Y; a quarter turn
/// stands them up so an untilted ring is flown through along Z.
pub fn ring_orientation(tilt: f32) -> Quat {
    Quat::from_rotation_x(tilt + FRAC_PI_2)
}

fn spawn_rings(
    mut commands: Commands,
    config: Res<RingConfig>,
    mut world: ResMut<PhysicsWorld>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mesh = meshes.add(Torus {
        minor_radius: config.tube,
        major_radius: config.radius,
    });
    let material = materials.add(StandardMaterial {
        base_color: config.color,
        emissive: LinearRgba::new(0.4, 0.4, 0.0, 1.0),
        ..default()
    });

    for placement in &config.placements {
        let orientation = ring_orientation(placement.tilt);
        let body = BodyDesc::fixed(BodyShape::Torus {
            radius: config.radius,
            tube: config.tube,
        })
        .with_position(placement.position)
        .with_orientation(orientation);

        let mut ring = commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(placement.position).with_rotation(orientation),
            Ring,
        ));
        match world.add_body(body) {
            Ok(handle) => {
                ring.insert(handle);
            }
            Err(err) => warn!("Ring at {:?} has no collider: {err}", placement.position),
        }
    }

    debug!("Spawned {} rings", config.placements.len());
}
