//! Rigid-body world advanced on a fixed timestep.
//!
//! Bodies and contacts are solved by rapier; this module wraps its sets and
//! pipeline in one resource. Entities refer to their body through a
//! [`BodyHandle`]. Each frame the accumulated wall time is consumed in
//! fixed-size internal steps (capped per frame), then the authoritative body
//! poses are copied into the visual `Transform`s.

use bevy::{prelude::*, utils::HashMap};
use rapier3d::prelude::{
    BroadPhaseBvh, CCDSolver, ColliderSet, ImpulseJointSet, IntegrationParameters, IslandManager,
    MultibodyJointSet, NarrowPhase, PhysicsPipeline, RigidBodyHandle, RigidBodySet,
};

pub mod body;

pub use body::{BodyDesc, BodyMut, BodyRef, BodyShape};

use crate::error::PhysicsError;
use crate::simulation::FrameSet;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsConfig>()
            .init_resource::<PhysicsWorld>()
            .add_systems(Update, step_physics.in_set(FrameSet::Physics))
            .add_systems(Update, sync_body_transforms.in_set(FrameSet::Sync));
    }
}

/// Configuration for the physics world.
#[derive(Resource, Clone, Debug)]
pub struct PhysicsConfig {
    /// Gravitational acceleration (m/s²).
    pub gravity: Vec3,
    /// Length of one internal integration step in seconds.
    pub fixed_timestep: f32,
    /// Maximum internal steps per frame.
    pub max_substeps: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 3,
        }
    }
}

/// A body inside the [`PhysicsWorld`].
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

#[derive(Resource)]
pub struct PhysicsWorld {
    pub gravity: Vec3,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    shapes: HashMap<RigidBodyHandle, BodyShape>,
    dynamic: Vec<RigidBodyHandle>,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    accumulator: f32,
    /// Total internal steps run since creation.
    pub steps: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default().gravity)
    }
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            shapes: HashMap::default(),
            dynamic: Vec::new(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            accumulator: 0.0,
            steps: 0,
        }
    }

    /// Insert a body with its collider.
    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        let collider = desc.collider()?;
        let handle = self.bodies.insert(desc.rigid_body());
        self.colliders.insert_with_parent(collider, handle, &mut self.bodies);
        self.shapes.insert(handle, desc.shape);
        if !desc.is_static() {
            self.dynamic.push(handle);
        }
        Ok(BodyHandle(handle))
    }

    pub fn body(&self, handle: BodyHandle) -> Option<BodyRef<'_>> {
        let body = self.bodies.get(handle.0)?;
        let shape = *self.shapes.get(&handle.0)?;
        Some(BodyRef { body, shape })
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<BodyMut<'_>> {
        let shape = *self.shapes.get(&handle.0)?;
        let body = self.bodies.get_mut(handle.0)?;
        Some(BodyMut { body, shape })
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, BodyRef<'_>)> {
        self.bodies.iter().filter_map(|(handle, body)| {
            let shape = *self.shapes.get(&handle)?;
            Some((BodyHandle(handle), BodyRef { body, shape }))
        })
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Advance the world by `real_dt` seconds of wall time using internal
    /// steps of `fixed_dt`, running at most `max_substeps` of them.
    ///
    /// Time that could not be simulated within the cap is dropped, keeping
    /// less than one step in the accumulator. Returns the number of internal
    /// steps run.
    pub fn step(&mut self, fixed_dt: f32, real_dt: f32, max_substeps: u32) -> u32 {
        self.accumulator += real_dt.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= fixed_dt && substeps < max_substeps {
            self.internal_step(fixed_dt);
            self.accumulator -= fixed_dt;
            substeps += 1;
        }

        self.accumulator %= fixed_dt;
        substeps
    }

    fn internal_step(&mut self, dt: f32) {
        let params = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };
        self.pipeline.step(
            &body::to_vector(self.gravity),
            &params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        // Applied forces last for exactly one internal step.
        for handle in &self.dynamic {
            if let Some(body) = self.bodies.get_mut(*handle) {
                body.reset_forces(false);
                body.reset_torques(false);
            }
        }

        self.steps += 1;
    }
}

fn step_physics(config: Res<PhysicsConfig>, time: Res<Time>, mut world: ResMut<PhysicsWorld>) {
    let substeps = world.step(config.fixed_timestep, time.delta_secs(), config.max_substeps);
    if substeps == config.max_substeps {
        debug!(
            "Physics ran the maximum {} substeps this frame (frame time {:.3}s)",
            substeps,
            time.delta_secs()
        );
    }
}

/// Copy authoritative body poses into the visual transforms.
fn sync_body_transforms(world: Res<PhysicsWorld>, mut query: Query<(&BodyHandle, &mut Transform)>) {
    for (handle, mut transform) in query.iter_mut() {
        let Some(body) = world.body(*handle) else {
            continue;
        };
        if body.is_static() {
            continue;
        }
        transform.translation = body.position();
        transform.rotation = body.orientation();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;
    use std::time::Duration;

    const DT: f32 = 1.0 / 60.0;

    fn falling_box() -> BodyDesc {
        BodyDesc::new(
            1.0,
            BodyShape::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
        )
        .with_position(Vec3::new(0.0, 10.0, 0.0))
    }

    fn airframe() -> BodyDesc {
        BodyDesc::new(
            50.0,
            BodyShape::Cuboid {
                half_extents: Vec3::new(2.5, 0.5, 1.5),
            },
        )
        .with_damping(0.0, 0.0)
    }

    /// A 40 m tall, 20 m wide building centred on the origin.
    fn tower() -> BodyDesc {
        BodyDesc::fixed(BodyShape::Cuboid {
            half_extents: Vec3::new(10.0, 20.0, 10.0),
        })
        .with_position(Vec3::new(0.0, 20.0, 0.0))
    }

    #[test]
    fn step_is_capped_by_max_substeps() {
        let mut world = PhysicsWorld::default();
        world.add_body(falling_box()).unwrap();

        assert_eq!(world.step(DT, 1.0, 3), 3);
        assert_eq!(world.steps, 3);
        // Excess time is dropped, not carried into the next frame.
        assert_eq!(world.step(DT, 0.0, 3), 0);
    }

    #[test]
    fn partial_frames_accumulate() {
        let mut world = PhysicsWorld::default();
        world.add_body(falling_box()).unwrap();

        assert_eq!(world.step(DT, DT * 0.6, 3), 0);
        assert_eq!(world.step(DT, DT * 0.6, 3), 1);
    }

    #[test]
    fn static_bodies_stay_put_and_ignore_forces() {
        let mut world = PhysicsWorld::default();
        let ground = world.add_body(BodyDesc::fixed(BodyShape::Plane)).unwrap();
        let building = world.add_body(tower()).unwrap();

        {
            let mut body = world.body_mut(ground).unwrap();
            body.apply_force(Vec3::Y * 100.0);
            body.apply_local_torque(Vec3::X * 100.0);
        }
        assert_eq!(world.body(ground).unwrap().force(), Vec3::ZERO);

        for _ in 0..120 {
            world.step(DT, DT, 3);
        }

        assert_eq!(world.body(ground).unwrap().position(), Vec3::ZERO);
        assert_eq!(
            world.body(building).unwrap().position(),
            Vec3::new(0.0, 20.0, 0.0)
        );
    }

    #[test]
    fn forces_are_consumed_by_one_internal_step() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let handle = world.add_body(airframe()).unwrap();

        world
            .body_mut(handle)
            .unwrap()
            .apply_force(Vec3::new(0.0, 0.0, -500.0));
        world.step(DT, DT, 3);
        world.step(DT, DT, 3);

        let body = world.body(handle).unwrap();
        // a = 10 m/s² for one step only.
        assert!((body.linear_velocity().z + 10.0 * DT).abs() < 1e-3);
        assert_eq!(body.force(), Vec3::ZERO);
    }

    #[test]
    fn local_torque_is_rotated_into_world_frame() {
        let mut world = PhysicsWorld::default();
        let handle = world
            .add_body(airframe().with_orientation(Quat::from_rotation_y(FRAC_PI_2)))
            .unwrap();

        world
            .body_mut(handle)
            .unwrap()
            .apply_local_torque(Vec3::new(10.0, 0.0, 0.0));

        // Local +X of a body yawed 90° left points along world -Z.
        let torque = world.body(handle).unwrap().torque();
        assert!((torque - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
    }

    #[test]
    fn damping_decays_velocity() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let handle = world
            .add_body(
                airframe()
                    .with_damping(0.4, 0.6)
                    .with_linear_velocity(Vec3::new(10.0, 0.0, 0.0)),
            )
            .unwrap();

        for _ in 0..60 {
            world.step(DT, DT, 3);
        }

        let velocity = world.body(handle).unwrap().linear_velocity();
        assert!((velocity.x - 6.0).abs() < 0.05);
    }

    #[test]
    fn positive_pitch_torque_raises_the_nose() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let handle = world.add_body(airframe()).unwrap();

        for _ in 0..30 {
            world
                .body_mut(handle)
                .unwrap()
                .apply_local_torque(Vec3::new(50.0, 0.0, 0.0));
            world.step(DT, DT, 3);
        }

        let nose = world
            .body(handle)
            .unwrap()
            .local_to_world_direction(Vec3::NEG_Z);
        assert!(nose.y > 0.0);
    }

    #[test]
    fn box_comes_to_rest_on_the_ground() {
        let mut world = PhysicsWorld::default();
        world.add_body(BodyDesc::fixed(BodyShape::Plane)).unwrap();
        let handle = world.add_body(falling_box()).unwrap();

        for _ in 0..600 {
            world.step(DT, DT, 3);
        }

        let body = world.body(handle).unwrap();
        assert!((body.position().y - 0.5).abs() < 0.05);
    }

    #[test]
    fn airframe_clears_a_roof_it_is_not_touching() {
        let mut world = PhysicsWorld::default();
        world.add_body(tower()).unwrap();
        // Box bottom 1 m above the roof, descending in a shallow glide.
        let handle = world
            .add_body(
                airframe()
                    .with_position(Vec3::new(0.0, 41.5, 0.0))
                    .with_linear_velocity(Vec3::new(0.0, -3.0, -30.0)),
            )
            .unwrap();

        world.step(DT, DT, 3);

        let body = world.body(handle).unwrap();
        assert!(body.linear_velocity().y < -3.0);
        assert!((body.linear_velocity().z + 30.0).abs() < 1e-3);
        assert!(body.position().y < 41.5);
    }

    #[test]
    fn airframe_settles_on_the_roof_surface() {
        let mut world = PhysicsWorld::default();
        world.add_body(tower()).unwrap();
        let handle = world
            .add_body(airframe().with_position(Vec3::new(0.0, 45.0, 0.0)))
            .unwrap();

        for _ in 0..300 {
            world.step(DT, DT, 3);
        }

        let body = world.body(handle).unwrap();
        assert!((body.position().y - 40.5).abs() < 0.05);
    }

    #[test]
    fn ring_tube_blocks_but_its_hole_lets_through() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        // Stand the ring up so it is threaded along Z.
        world
            .add_body(
                BodyDesc::fixed(BodyShape::Torus {
                    radius: 10.0,
                    tube: 1.0,
                })
                .with_position(Vec3::new(0.0, 20.0, 0.0))
                .with_orientation(Quat::from_rotation_x(FRAC_PI_2)),
            )
            .unwrap();
        let small_box = |x: f32| {
            BodyDesc::new(
                1.0,
                BodyShape::Cuboid {
                    half_extents: Vec3::splat(0.5),
                },
            )
            .with_damping(0.0, 0.0)
            .with_position(Vec3::new(x, 20.0, 5.0))
            .with_linear_velocity(Vec3::new(0.0, 0.0, -20.0))
        };
        let through_hole = world.add_body(small_box(0.0)).unwrap();
        let into_tube = world.add_body(small_box(10.0)).unwrap();

        for _ in 0..60 {
            world.step(DT, DT, 3);
        }

        assert!(world.body(through_hole).unwrap().position().z < -10.0);
        assert!(world.body(into_tube).unwrap().position().z > 0.0);
    }

    #[test]
    fn sync_copies_body_pose_into_transform() {
        let mut app = App::new();
        let mut world = PhysicsWorld::default();
        let handle = world.add_body(falling_box()).unwrap();
        app.insert_resource(world)
            .insert_resource(PhysicsConfig::default())
            .init_resource::<Time>()
            .add_systems(Update, (step_physics, sync_body_transforms).chain());

        let entity = app.world_mut().spawn((handle, Transform::default())).id();

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(20));
        app.update();

        let body_position = app
            .world()
            .resource::<PhysicsWorld>()
            .body(handle)
            .unwrap()
            .position();
        let transform = app.world().get::<Transform>(entity).unwrap();
        assert!(body_position.y < 10.0);
        assert_eq!(transform.translation, body_position);
    }
}
