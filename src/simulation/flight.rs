//! Player airplane: spawning, control input, and flight forces.
//!
//! The flight model is arcade-grade: constant thrust along the
//! nose, lift quadratic in airspeed along the body's up axis regardless of
//! angle of attack, and fixed control torques applied in the body frame.

use bevy::prelude::*;

use crate::physics::{BodyDesc, BodyHandle, BodyMut, BodyShape, PhysicsWorld};
use crate::simulation::FrameSet;

pub struct FlightPlugin;

impl Plugin for FlightPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FlightModel>()
            .init_resource::<FlightBindings>()
            .init_resource::<FlightInput>()
            .add_systems(Startup, spawn_airplane)
            .add_systems(Update, read_flight_input.in_set(FrameSet::Input))
            .add_systems(Update, apply_flight_forces.in_set(FrameSet::Forces));
    }
}

/// Airframe and control constants.
#[derive(Resource, Clone, Debug)]
pub struct FlightModel {
    /// Thrust force while the throttle key is held (N).
    pub thrust: f32,
    /// Lift = speed² × coefficient.
    pub lift_coefficient: f32,
    pub pitch_torque: f32,
    pub roll_torque: f32,
    pub yaw_torque: f32,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Half extents of the collision box.
    pub half_extents: Vec3,
    pub spawn_position: Vec3,
}

impl Default for FlightModel {
    fn default() -> Self {
        Self {
            thrust: 1000.0,
            lift_coefficient: 1.0,
            pitch_torque: 50.0,
            roll_torque: 30.0,
            yaw_torque: 20.0,
            mass: 50.0,
            linear_damping: 0.4,
            angular_damping: 0.6,
            half_extents: Vec3::new(2.5, 0.5, 1.5),
            spawn_position: Vec3::new(0.0, 100.0, 0.0),
        }
    }
}

/// Key assignments for the flight controls.
#[derive(Resource, Clone, Debug)]
pub struct FlightBindings {
    pub thrust: KeyCode,
    pub nose_down: KeyCode,
    pub nose_up: KeyCode,
    pub roll_left: KeyCode,
    pub roll_right: KeyCode,
    pub yaw_left: KeyCode,
    pub yaw_right: KeyCode,
}

impl Default for FlightBindings {
    fn default() -> Self {
        Self {
            thrust: KeyCode::KeyW,
            nose_down: KeyCode::ArrowUp,
            nose_up: KeyCode::ArrowDown,
            roll_left: KeyCode::ArrowLeft,
            roll_right: KeyCode::ArrowRight,
            yaw_left: KeyCode::KeyA,
            yaw_right: KeyCode::KeyD,
        }
    }
}

/// Held state of every flight control for the current frame.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlightInput {
    pub thrust: bool,
    pub nose_down: bool,
    pub nose_up: bool,
    pub roll_left: bool,
    pub roll_right: bool,
    pub yaw_left: bool,
    pub yaw_right: bool,
}

/// Marker for the player airplane root entity.
#[derive(Component)]
pub struct Airplane;

/// Body-frame torque requested by the held controls.
pub fn control_torque(input: &FlightInput, model: &FlightModel) -> Vec3 {
    let mut torque = Vec3::ZERO;

    if input.nose_down {
        torque.x -= model.pitch_torque;
    }
    if input.nose_up {
        torque.x += model.pitch_torque;
    }
    if input.roll_left {
        torque.z += model.roll_torque;
    }
    if input.roll_right {
        torque.z -= model.roll_torque;
    }
    if input.yaw_left {
        torque.y += model.yaw_torque;
    }
    if input.yaw_right {
        torque.y -= model.yaw_torque;
    }

    torque
}

/// Accumulate thrust, lift, and control torque on the airplane body.
///
/// Must run before the physics step that is meant to consume them.
pub fn apply_flight_controls(input: &FlightInput, model: &FlightModel, body: &mut BodyMut) {
    if input.thrust {
        let forward = body.local_to_world_direction(Vec3::NEG_Z);
        body.apply_force(forward * model.thrust);
    }

    // Lift is always on, even with the throttle closed.
    let speed = body.speed();
    let up = body.local_to_world_direction(Vec3::Y);
    body.apply_force(up * speed * speed * model.lift_coefficient);

    let torque = control_torque(input, model);
    if torque != Vec3::ZERO {
        body.apply_local_torque(torque);
    }
}

/// Dynamic box body for the airframe at its spawn point.
pub fn airframe(model: &FlightModel) -> BodyDesc {
    BodyDesc::new(
        model.mass,
        BodyShape::Cuboid {
            half_extents: model.half_extents,
        },
    )
    .with_position(model.spawn_position)
    .with_damping(model.linear_damping, model.angular_damping)
}

fn spawn_airplane(
    mut commands: Commands,
    model: Res<FlightModel>,
    mut world: ResMut<PhysicsWorld>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let handle = match world.add_body(airframe(&model)) {
        Ok(handle) => handle,
        Err(err) => {
            error!("Airplane body rejected: {err}");
            return;
        }
    };

    let body_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.0, 0.0, 1.0),
        perceptual_roughness: 0.5,
        ..default()
    });
    let wing_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.87, 0.87, 0.87),
        perceptual_roughness: 0.6,
        ..default()
    });

    // Fuselage axis runs along Z with the wide end at the nose (-Z).
    let fuselage_mesh = meshes.add(ConicalFrustum {
        radius_top: 0.5,
        radius_bottom: 0.2,
        height: 3.0,
    });
    let wing_mesh = meshes.add(Cuboid::new(5.0, 0.2, 1.0));
    let tail_mesh = meshes.add(Cuboid::new(3.0, 0.2, 0.5));

    commands
        .spawn((
            Transform::from_translation(model.spawn_position),
            Visibility::default(),
            Airplane,
            handle,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(fuselage_mesh),
                MeshMaterial3d(body_material),
                Transform::from_rotation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
            ));
            parent.spawn((
                Mesh3d(wing_mesh),
                MeshMaterial3d(wing_material.clone()),
                Transform::from_xyz(0.0, 0.2, 0.0),
            ));
            parent.spawn((
                Mesh3d(tail_mesh),
                MeshMaterial3d(wing_material),
                Transform::from_xyz(0.0, 0.2, 1.5),
            ));
        });

    info!("Spawned airplane at {:?}", model.spawn_position);
}

fn read_flight_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    bindings: Res<FlightBindings>,
    mut input: ResMut<FlightInput>,
) {
    *input = FlightInput {
        thrust: keyboard.pressed(bindings.thrust),
        nose_down: keyboard.pressed(bindings.nose_down),
        nose_up: keyboard.pressed(bindings.nose_up),
        roll_left: keyboard.pressed(bindings.roll_left),
        roll_right: keyboard.pressed(bindings.roll_right),
        yaw_left: keyboard.pressed(bindings.yaw_left),
        yaw_right: keyboard.pressed(bindings.yaw_right),
    };
}

fn apply_flight_forces(
    input: Res<FlightInput>,
    model: Res<FlightModel>,
    mut world: ResMut<PhysicsWorld>,
    airplanes: Query<&BodyHandle, With<Airplane>>,
) {
    for handle in airplanes.iter() {
        if let Some(mut body) = world.body_mut(*handle) {
            apply_flight_controls(&input, &model, &mut body);
        }
    }
}
