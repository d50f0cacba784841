//! Wireframe overlay of every physics body, drawn with gizmos.

use bevy::{color::palettes::css, math::Isometry3d, prelude::*};

use crate::physics::{BodyRef, BodyShape, PhysicsWorld};
use crate::ui::DebugConfig;

pub struct PhysicsDebugPlugin;

impl Plugin for PhysicsDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, render_physics_bodies);
    }
}

/// Half size of the square drawn for an (infinite) plane.
const PLANE_DRAW_EXTENT: f32 = 250.0;

fn body_color(body: &BodyRef) -> Color {
    if body.is_static() {
        css::LIME.into()
    } else {
        css::ORANGE_RED.into()
    }
}

fn render_physics_bodies(world: Res<PhysicsWorld>, config: Res<DebugConfig>, mut gizmos: Gizmos) {
    if !config.show_bodies {
        return;
    }

    for (_, body) in world.bodies() {
        let color = body_color(&body);
        match body.shape() {
            BodyShape::Cuboid { half_extents } => {
                gizmos.cuboid(body.transform().with_scale(half_extents * 2.0), color);
            }
            BodyShape::Plane => {
                let corners = [
                    Vec3::new(-PLANE_DRAW_EXTENT, 0.0, -PLANE_DRAW_EXTENT),
                    Vec3::new(PLANE_DRAW_EXTENT, 0.0, -PLANE_DRAW_EXTENT),
                    Vec3::new(PLANE_DRAW_EXTENT, 0.0, PLANE_DRAW_EXTENT),
                    Vec3::new(-PLANE_DRAW_EXTENT, 0.0, PLANE_DRAW_EXTENT),
                ]
                .map(|corner| body.position() + body.orientation() * corner);
                gizmos.linestrip(corners.into_iter().chain([corners[0]]), color);
            }
            BodyShape::Torus { radius, tube } => {
                gizmos.primitive_3d(
                    &Torus::new(radius - tube, radius + tube),
                    Isometry3d::new(body.position(), body.orientation()),
                    color,
                );
            }
        }
    }
}
