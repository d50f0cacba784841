//! All tunables in one place, validated before the app starts.
//!
//! Each plugin falls back to its own defaults through `init_resource`, so
//! inserting a [`Settings`] before the plugins are added overrides them.

use bevy::prelude::*;

use crate::camera::CameraRigConfig;
use crate::error::{damping, non_negative, positive, ConfigError};
use crate::physics::{PhysicsConfig, PhysicsWorld};
use crate::procgen::city::CityConfig;
use crate::procgen::rings::RingConfig;
use crate::render::weather::WeatherConfig;
use crate::simulation::flight::FlightModel;
use crate::simulation::traffic::{TrafficAgent, TrafficConfig};
use crate::simulation::traffic_lights::TrafficLightConfig;

#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub physics: PhysicsConfig,
    pub flight: FlightModel,
    pub traffic: TrafficConfig,
    pub lights: TrafficLightConfig,
    pub weather: WeatherConfig,
    pub camera: CameraRigConfig,
    pub city: CityConfig,
    pub rings: RingConfig,
}

impl Settings {
    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let physics = &self.physics;
        if !(physics.fixed_timestep.is_finite() && physics.fixed_timestep > 0.0) {
            return Err(ConfigError::InvalidTimestep(physics.fixed_timestep));
        }
        if physics.max_substeps == 0 {
            return Err(ConfigError::NoSubsteps);
        }

        let flight = &self.flight;
        if !(flight.mass.is_finite() && flight.mass > 0.0) {
            return Err(ConfigError::NonPositiveMass(flight.mass));
        }
        damping("linear", flight.linear_damping)?;
        damping("angular", flight.angular_damping)?;
        non_negative("thrust", flight.thrust)?;
        non_negative("lift coefficient", flight.lift_coefficient)?;
        positive("airframe width", flight.half_extents.x)?;
        positive("airframe height", flight.half_extents.y)?;
        positive("airframe length", flight.half_extents.z)?;

        positive("traffic speed", self.traffic.speed)?;
        positive("waypoint arrival threshold", self.traffic.arrival_threshold)?;
        non_negative("red light stop radius", self.traffic.stop_radius)?;
        for route in &self.traffic.routes {
            TrafficAgent::new(route.iter().copied())?;
        }

        positive("traffic light period", self.lights.period)?;

        positive("rain volume extent", self.weather.extent)?;
        positive("rain ceiling", self.weather.ceiling)?;
        non_negative("rain fall speed", self.weather.fall_speed)?;

        let camera = &self.camera;
        if !(camera.follow_smoothing > 0.0 && camera.follow_smoothing <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "camera follow smoothing",
                requirement: "in (0, 1]",
                value: camera.follow_smoothing,
            });
        }
        positive("camera reference rate", camera.reference_rate)?;
        positive("camera near plane", camera.near)?;
        if camera.far <= camera.near {
            return Err(ConfigError::OutOfRange {
                name: "camera far plane",
                requirement: "beyond the near plane",
                value: camera.far,
            });
        }

        positive("building width", self.city.building_width)?;
        non_negative("street width", self.city.street_width)?;
        positive("minimum building height", self.city.min_height)?;
        non_negative("building height variation", self.city.height_variation)?;

        if self.rings.tube >= self.rings.radius {
            return Err(ConfigError::OutOfRange {
                name: "ring tube radius",
                requirement: "smaller than the ring radius",
                value: self.rings.tube,
            });
        }
        positive("ring tube radius", self.rings.tube)?;

        Ok(())
    }

    /// Insert every config resource, plus a physics world using the
    /// configured gravity.
    pub fn insert_into(self, app: &mut App) {
        app.insert_resource(PhysicsWorld::new(self.physics.gravity))
            .insert_resource(self.physics)
            .insert_resource(self.flight)
            .insert_resource(self.traffic)
            .insert_resource(self.lights)
            .insert_resource(self.weather)
            .insert_resource(self.camera)
            .insert_resource(self.city)
            .insert_resource(self.rings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Settings::default().validate(), Ok(()));
    }

    #[test]
    fn zero_timestep_is_rejected() {
        let mut settings = Settings::default();
        settings.physics.fixed_timestep = 0.0;
        assert_eq!(settings.validate(), Err(ConfigError::InvalidTimestep(0.0)));

        settings.physics.fixed_timestep = 1.0 / 60.0;
        settings.physics.max_substeps = 0;
        assert_eq!(settings.validate(), Err(ConfigError::NoSubsteps));
    }

    #[test]
    fn massless_airplane_is_rejected() {
        let mut settings = Settings::default();
        settings.flight.mass = 0.0;
        assert_eq!(settings.validate(), Err(ConfigError::NonPositiveMass(0.0)));
    }

    #[test]
    fn empty_route_is_rejected() {
        let mut settings = Settings::default();
        settings.traffic.routes.push(Vec::new());
        assert_eq!(settings.validate(), Err(ConfigError::EmptyRoute));
    }

    #[test]
    fn out_of_range_values_name_the_field() {
        let mut settings = Settings::default();
        settings.lights.period = 0.0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().starts_with("traffic light period"));

        let mut settings = Settings::default();
        settings.camera.follow_smoothing = 1.5;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OutOfRange {
                name: "camera follow smoothing",
                ..
            })
        ));
    }

    #[test]
    fn inserted_settings_override_plugin_defaults() {
        let mut settings = Settings::default();
        settings.physics.gravity = Vec3::new(0.0, -1.62, 0.0);
        settings.lights.period = 2.0;

        let mut app = App::new();
        settings.insert_into(&mut app);
        app.init_resource::<TrafficLightConfig>();

        assert_eq!(app.world().resource::<TrafficLightConfig>().period, 2.0);
        assert_eq!(
            app.world().resource::<PhysicsWorld>().gravity,
            Vec3::new(0.0, -1.62, 0.0)
        );
    }
}
