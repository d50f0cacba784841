//! Cars that loop over fixed waypoint paths and hold at nearby red lights.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::error::ConfigError;
use crate::simulation::traffic_lights::{LightState, TrafficLight};
use crate::simulation::FrameSet;

pub struct TrafficPlugin;

impl Plugin for TrafficPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TrafficConfig>()
            .add_systems(Startup, spawn_traffic)
            .add_systems(Update, drive_traffic.in_set(FrameSet::Subsystems));
    }
}

/// Configuration for traffic.
#[derive(Resource, Clone, Debug)]
pub struct TrafficConfig {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// A waypoint counts as reached inside this distance.
    pub arrival_threshold: f32,
    /// Any red light closer than this holds the car.
    pub stop_radius: f32,
    /// Car body size (length along Z).
    pub car_size: Vec3,
    /// One cyclic waypoint path per car.
    pub routes: Vec<Vec<Vec3>>,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        // Streets along both axes, spanning the whole city.
        let half = 250.0;
        Self {
            speed: 30.0, // 0.5 units per frame at 60 Hz
            arrival_threshold: 1.0,
            stop_radius: 10.0,
            car_size: Vec3::new(2.0, 2.0, 4.0),
            routes: vec![
                vec![Vec3::new(-half, 1.0, 0.0), Vec3::new(half, 1.0, 0.0)],
                vec![Vec3::new(0.0, 1.0, -half), Vec3::new(0.0, 1.0, half)],
            ],
        }
    }
}

/// Waypoint follower state for one car.
#[derive(Component, Clone, Debug)]
pub struct TrafficAgent {
    path: SmallVec<[Vec3; 4]>,
    target: usize,
}

impl TrafficAgent {
    pub fn new(path: impl IntoIterator<Item = Vec3>) -> Result<Self, ConfigError> {
        let path: SmallVec<[Vec3; 4]> = path.into_iter().collect();
        if path.is_empty() {
            return Err(ConfigError::EmptyRoute);
        }
        Ok(Self { path, target: 0 })
    }

    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    /// Index of the waypoint currently driven towards; always `< path().len()`.
    pub fn target(&self) -> usize {
        self.target
    }

    pub fn target_position(&self) -> Vec3 {
        self.path[self.target]
    }

    fn advance(&mut self) {
        self.target = (self.target + 1) % self.path.len();
    }
}

/// Outcome of one traffic update for a single car.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentStep {
    /// Held by a nearby red light.
    Blocked,
    /// Reached the target waypoint and switched to the next one.
    Arrived,
    /// Drove towards the target waypoint.
    Moved,
}

/// Advance one car by `dt` seconds.
///
/// A car within `stop_radius` of any red light neither moves nor switches
/// waypoints. The distance covered is capped at the remaining distance so a
/// long frame cannot carry the car past its waypoint.
pub fn step_agent(
    agent: &mut TrafficAgent,
    transform: &mut Transform,
    red_lights: &[Vec3],
    config: &TrafficConfig,
    dt: f32,
) -> AgentStep {
    let position = transform.translation;
    if red_lights
        .iter()
        .any(|light| position.distance(*light) < config.stop_radius)
    {
        return AgentStep::Blocked;
    }

    let target = agent.target_position();
    let distance = position.distance(target);
    if distance < config.arrival_threshold {
        agent.advance();
        return AgentStep::Arrived;
    }

    let direction = (target - position) / distance;
    let step = (config.speed * dt).min(distance);
    transform.translation += direction * step;
    transform.look_to(direction, Vec3::Y);

    AgentStep::Moved
}

const CAR_COLORS: &[(f32, f32, f32)] = &[
    (1.0, 0.0, 0.0),
    (0.9, 0.9, 0.92),
    (0.1, 0.2, 0.4),
    (0.95, 0.75, 0.1),
];

fn spawn_traffic(
    mut commands: Commands,
    config: Res<TrafficConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let car_mesh = meshes.add(Cuboid::from_size(config.car_size));
    let mut spawned = 0;

    for (index, route) in config.routes.iter().enumerate() {
        let agent = match TrafficAgent::new(route.iter().copied()) {
            Ok(agent) => agent,
            Err(err) => {
                warn!("Skipping traffic route {}: {}", index, err);
                continue;
            }
        };

        let (r, g, b) = CAR_COLORS[index % CAR_COLORS.len()];
        let material = materials.add(StandardMaterial {
            base_color: Color::srgb(r, g, b),
            perceptual_roughness: 0.4,
            metallic: 0.6,
            ..default()
        });

        commands.spawn((
            Mesh3d(car_mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(agent.path()[0]),
            agent,
        ));
        spawned += 1;
    }

    info!("Spawned {} cars", spawned);
}

fn drive_traffic(
    time: Res<Time>,
    config: Res<TrafficConfig>,
    lights: Query<(&TrafficLight, &Transform), Without<TrafficAgent>>,
    mut agents: Query<(&mut TrafficAgent, &mut Transform)>,
) {
    let red_lights: SmallVec<[Vec3; 8]> = lights
        .iter()
        .filter(|(light, _)| light.state == LightState::Red)
        .map(|(_, transform)| transform.translation)
        .collect();

    let dt = time.delta_secs();
    for (mut agent, mut transform) in agents.iter_mut() {
        if step_agent(&mut agent, &mut transform, &red_lights, &config, dt) == AgentStep::Arrived {
            debug!("Car reached waypoint, heading to {}", agent.target());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const DT: f32 = 1.0 / 60.0;
    const EPS: f32 = 1e-4;

    fn straight_route() -> TrafficAgent {
        TrafficAgent::new([Vec3::new(0.0, 1.0, 0.0), Vec3::new(100.0, 1.0, 0.0)]).unwrap()
    }

    fn car_at(position: Vec3) -> Transform {
        Transform::from_translation(position)
    }

    #[test]
    fn empty_route_is_rejected() {
        assert!(TrafficAgent::new(std::iter::empty()).is_err());
    }

    #[test]
    fn nearby_red_light_holds_the_car() {
        let config = TrafficConfig::default();
        let mut agent = straight_route();
        agent.advance();
        let mut transform = car_at(Vec3::new(50.0, 1.0, 0.0));
        let red = [Vec3::new(55.0, 1.5, 5.0)];

        let outcome = step_agent(&mut agent, &mut transform, &red, &config, DT);

        assert_eq!(outcome, AgentStep::Blocked);
        assert_eq!(transform.translation, Vec3::new(50.0, 1.0, 0.0));
        assert_eq!(agent.target(), 1);
    }

    #[test]
    fn red_light_also_blocks_waypoint_switch() {
        let config = TrafficConfig::default();
        let mut agent = straight_route();
        let mut transform = car_at(Vec3::new(0.0, 1.0, 0.0));

        let outcome = step_agent(&mut agent, &mut transform, &[Vec3::ZERO], &config, DT);

        assert_eq!(outcome, AgentStep::Blocked);
        assert_eq!(agent.target(), 0);
    }

    #[test]
    fn green_light_car_moves_one_step_towards_target() {
        let config = TrafficConfig::default();
        let mut agent = straight_route();
        agent.advance();
        let start = Vec3::new(50.0, 1.0, 0.0);
        let mut transform = car_at(start);

        // The same light, now green, is simply absent from the red list.
        let outcome = step_agent(&mut agent, &mut transform, &[], &config, DT);

        assert_eq!(outcome, AgentStep::Moved);
        let moved = transform.translation - start;
        assert!((moved.length() - 0.5).abs() < EPS);
        assert!((moved.normalize() - Vec3::X).length() < EPS);
        assert!((transform.forward().as_vec3() - Vec3::X).length() < EPS);
    }

    #[test]
    fn distant_red_light_is_ignored() {
        let config = TrafficConfig::default();
        let mut agent = straight_route();
        agent.advance();
        let mut transform = car_at(Vec3::new(50.0, 1.0, 0.0));

        let outcome = step_agent(&mut agent, &mut transform, &[Vec3::new(50.0, 1.5, 20.0)], &config, DT);

        assert_eq!(outcome, AgentStep::Moved);
    }

    #[test]
    fn long_frame_does_not_overshoot() {
        let config = TrafficConfig::default();
        let mut agent = straight_route();
        agent.advance();
        let mut transform = car_at(Vec3::new(95.0, 1.0, 0.0));

        step_agent(&mut agent, &mut transform, &[], &config, 2.0);

        assert!((transform.translation - Vec3::new(100.0, 1.0, 0.0)).length() < EPS);
    }

    #[test]
    fn target_index_stays_in_range_over_many_ticks() {
        let config = TrafficConfig::default();
        let mut agent = TrafficAgent::new([
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(20.0, 1.0, 0.0),
            Vec3::new(20.0, 1.0, 20.0),
        ])
        .unwrap();
        let mut transform = car_at(Vec3::new(0.0, 1.0, 0.0));
        let mut arrivals = 0;

        for _ in 0..5000 {
            if step_agent(&mut agent, &mut transform, &[], &config, DT) == AgentStep::Arrived {
                arrivals += 1;
            }
            assert!(agent.target() < agent.path().len());
        }
        assert!(arrivals > agent.path().len());
    }

    #[test]
    fn single_waypoint_route_parks_in_place() {
        let config = TrafficConfig::default();
        let mut agent = TrafficAgent::new([Vec3::ONE]).unwrap();
        let mut transform = car_at(Vec3::ONE);

        for _ in 0..10 {
            assert_eq!(
                step_agent(&mut agent, &mut transform, &[], &config, DT),
                AgentStep::Arrived
            );
            assert_eq!(agent.target(), 0);
        }
    }

    #[test]
    fn system_gates_on_red_lights_only() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<TrafficConfig>()
            .add_systems(Update, drive_traffic);

        let material = Handle::<StandardMaterial>::default();
        let light = app
            .world_mut()
            .spawn((
                TrafficLight {
                    street: "X-ST",
                    state: LightState::Red,
                    red_material: material.clone(),
                    green_material: material.clone(),
                },
                Transform::from_xyz(5.0, 1.5, 5.0),
            ))
            .id();

        let mut agent = TrafficAgent::new([Vec3::new(-50.0, 1.0, 0.0), Vec3::new(50.0, 1.0, 0.0)]).unwrap();
        agent.advance();
        let car = app
            .world_mut()
            .spawn((agent, Transform::from_xyz(0.0, 1.0, 0.0)))
            .id();

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(100));
        app.update();
        assert_eq!(
            app.world().get::<Transform>(car).unwrap().translation,
            Vec3::new(0.0, 1.0, 0.0)
        );

        app.world_mut()
            .get_mut::<TrafficLight>(light)
            .unwrap()
            .state = LightState::Green;
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_millis(100));
        app.update();
        let x = app.world().get::<Transform>(car).unwrap().translation.x;
        assert!((x - 3.0).abs() < 1e-3);
    }
}
