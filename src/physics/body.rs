//! Body descriptions and the conversion into rapier bodies and colliders.
//!
//! Gameplay code describes bodies in Bevy math types; the world turns each
//! description into one rapier rigid body carrying a single collider.

use std::f32::consts::TAU;

use bevy::prelude::*;
use nalgebra::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::{
    Collider, ColliderBuilder, Isometry, Point, Real, RigidBody as RapierBody, RigidBodyBuilder,
    Vector,
};

use crate::error::PhysicsError;

/// Segments around the ring of a torus collider.
const TORUS_RING_SEGMENTS: u32 = 48;
/// Segments around the tube of a torus collider.
const TORUS_TUBE_SEGMENTS: u32 = 12;

/// Collision shape of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyShape {
    /// Box described by its half extents along the local axes.
    Cuboid { half_extents: Vec3 },
    /// Half-space below the body's local XZ plane; the normal is local +Y.
    Plane,
    /// Ring lying in the local XZ plane, threaded along local Y.
    Torus { radius: f32, tube: f32 },
}

/// Everything needed to insert a body into [`super::PhysicsWorld`].
///
/// A body with `mass == 0.0` is fixed: it never moves and ignores applied
/// forces, but dynamic bodies still collide with it.
#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub mass: f32,
    pub shape: BodyShape,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    /// Fraction of linear velocity lost per second, in [0, 1).
    pub linear_damping: f32,
    /// Fraction of angular velocity lost per second, in [0, 1).
    pub angular_damping: f32,
}

impl BodyDesc {
    pub fn new(mass: f32, shape: BodyShape) -> Self {
        Self {
            mass,
            shape,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            linear_damping: 0.01,
            angular_damping: 0.01,
        }
    }

    /// Immovable body (ground, buildings, rings).
    pub fn fixed(shape: BodyShape) -> Self {
        Self::new(0.0, shape)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn is_static(&self) -> bool {
        self.mass <= 0.0
    }

    pub(super) fn rigid_body(&self) -> RapierBody {
        let pose = Isometry::from_parts(
            Translation3::from(to_vector(self.position)),
            to_rotation(self.orientation),
        );

        if self.is_static() {
            return RigidBodyBuilder::fixed().pose(pose).build();
        }

        RigidBodyBuilder::dynamic()
            .pose(pose)
            .linvel(to_vector(self.linear_velocity))
            .linear_damping(damping_coefficient(self.linear_damping))
            .angular_damping(damping_coefficient(self.angular_damping))
            .can_sleep(false)
            .ccd_enabled(true)
            .build()
    }

    /// Collider attached at the body origin. Dynamic bodies take their mass
    /// from it.
    pub(super) fn collider(&self) -> Result<Collider, PhysicsError> {
        let builder = match self.shape {
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            BodyShape::Plane => ColliderBuilder::halfspace(Vector::y_axis()),
            BodyShape::Torus { radius, tube } => {
                let (vertices, indices) =
                    torus_trimesh(radius, tube, TORUS_RING_SEGMENTS, TORUS_TUBE_SEGMENTS);
                let points = vertices
                    .into_iter()
                    .map(|v| Point::new(v.x, v.y, v.z))
                    .collect();
                ColliderBuilder::trimesh(points, indices).map_err(|err| {
                    PhysicsError::InvalidMesh {
                        shape: "torus",
                        reason: format!("{err:?}"),
                    }
                })?
            }
        };

        if self.is_static() {
            Ok(builder.build())
        } else {
            Ok(builder.mass(self.mass).build())
        }
    }
}

/// Rapier damping coefficient that retains `1 - fraction` of the velocity
/// over one second.
pub fn damping_coefficient(fraction: f32) -> f32 {
    -(1.0 - fraction).ln()
}

/// Triangulated torus in the XZ plane around the Y axis.
pub fn torus_trimesh(
    radius: f32,
    tube: f32,
    ring_segments: u32,
    tube_segments: u32,
) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let mut vertices = Vec::with_capacity((ring_segments * tube_segments) as usize);
    for i in 0..ring_segments {
        let theta = TAU * i as f32 / ring_segments as f32;
        for j in 0..tube_segments {
            let phi = TAU * j as f32 / tube_segments as f32;
            let reach = radius + tube * phi.cos();
            vertices.push(Vec3::new(
                reach * theta.cos(),
                tube * phi.sin(),
                reach * theta.sin(),
            ));
        }
    }

    let index = |i: u32, j: u32| (i % ring_segments) * tube_segments + j % tube_segments;
    let mut indices = Vec::with_capacity(vertices.len() * 2);
    for i in 0..ring_segments {
        for j in 0..tube_segments {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i + 1, j + 1);
            let d = index(i, j + 1);
            indices.push([a, b, c]);
            indices.push([a, c, d]);
        }
    }

    (vertices, indices)
}

pub(super) fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

pub(super) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(super) fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub(super) fn from_rotation(q: &UnitQuaternion<Real>) -> Quat {
    let q = q.quaternion();
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// Read access to one body of the world.
#[derive(Clone, Copy)]
pub struct BodyRef<'a> {
    pub(super) body: &'a RapierBody,
    pub(super) shape: BodyShape,
}

impl BodyRef<'_> {
    pub fn shape(&self) -> BodyShape {
        self.shape
    }

    pub fn is_static(&self) -> bool {
        !self.body.is_dynamic()
    }

    pub fn position(&self) -> Vec3 {
        from_vector(self.body.translation())
    }

    pub fn orientation(&self) -> Quat {
        from_rotation(self.body.rotation())
    }

    pub fn linear_velocity(&self) -> Vec3 {
        from_vector(self.body.linvel())
    }

    pub fn angular_velocity(&self) -> Vec3 {
        from_vector(self.body.angvel())
    }

    pub fn speed(&self) -> f32 {
        self.linear_velocity().length()
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).with_rotation(self.orientation())
    }

    /// Rotate a body-frame vector into world space.
    pub fn local_to_world_direction(&self, local: Vec3) -> Vec3 {
        self.orientation() * local
    }

    /// World-space force waiting for the next internal step.
    pub fn force(&self) -> Vec3 {
        from_vector(&self.body.user_force())
    }

    /// World-space torque waiting for the next internal step.
    pub fn torque(&self) -> Vec3 {
        from_vector(&self.body.user_torque())
    }
}

/// Write access to one body of the world.
pub struct BodyMut<'a> {
    pub(super) body: &'a mut RapierBody,
    pub(super) shape: BodyShape,
}

impl BodyMut<'_> {
    pub fn view(&self) -> BodyRef<'_> {
        BodyRef {
            body: &*self.body,
            shape: self.shape,
        }
    }

    pub fn speed(&self) -> f32 {
        self.view().speed()
    }

    pub fn local_to_world_direction(&self, local: Vec3) -> Vec3 {
        self.view().local_to_world_direction(local)
    }

    /// Add a world-space force acting at the centre of mass until the next
    /// internal step.
    pub fn apply_force(&mut self, force: Vec3) {
        if self.view().is_static() {
            return;
        }
        self.body.add_force(to_vector(force), true);
    }

    /// Add a torque expressed in the body's own frame until the next
    /// internal step.
    pub fn apply_local_torque(&mut self, local_torque: Vec3) {
        if self.view().is_static() {
            return;
        }
        let torque = self.local_to_world_direction(local_torque);
        self.body.add_torque(to_vector(torque), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn damping_keeps_the_per_second_retention() {
        assert_eq!(damping_coefficient(0.0), 0.0);
        // 1/(1 + c·dt) per step over a second tends to e^-c = 1 - fraction.
        for fraction in [0.4, 0.6] {
            let c = damping_coefficient(fraction);
            assert!(((-c).exp() - (1.0 - fraction)).abs() < 1e-5);
        }
    }

    #[test]
    fn rotation_survives_the_nalgebra_boundary() {
        let q = Quat::from_rotation_y(FRAC_PI_2) * Quat::from_rotation_z(0.3);
        let back = from_rotation(&to_rotation(q));
        assert!(back.dot(q).abs() > 1.0 - 1e-6);

        let v = Vec3::new(1.0, -2.0, 3.5);
        assert_eq!(from_vector(&to_vector(v)), v);
    }

    #[test]
    fn torus_mesh_wraps_a_closed_tube() {
        let (vertices, indices) = torus_trimesh(10.0, 1.0, 48, 12);

        assert_eq!(vertices.len(), 48 * 12);
        assert_eq!(indices.len(), 2 * 48 * 12);
        assert!(indices.iter().flatten().all(|&i| (i as usize) < vertices.len()));
        for v in &vertices {
            // Every vertex sits one tube radius off the centre circle.
            let off_circle = Vec2::new(Vec2::new(v.x, v.z).length() - 10.0, v.y).length();
            assert!((off_circle - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn fixed_and_dynamic_descriptions() {
        let building = BodyDesc::fixed(BodyShape::Cuboid {
            half_extents: Vec3::splat(10.0),
        })
        .with_position(Vec3::new(0.0, 10.0, 0.0));
        assert!(building.is_static());
        assert!(building.rigid_body().is_fixed());

        let airframe = BodyDesc::new(
            50.0,
            BodyShape::Cuboid {
                half_extents: Vec3::new(2.5, 0.5, 1.5),
            },
        );
        assert!(!airframe.is_static());
        assert!(airframe.rigid_body().is_dynamic());
        assert!(airframe.collider().is_ok());
    }

    #[test]
    fn ring_collider_builds_from_the_torus_mesh() {
        let ring = BodyDesc::fixed(BodyShape::Torus {
            radius: 10.0,
            tube: 1.0,
        });
        assert!(ring.collider().is_ok());
    }
}
