//! Startup configuration and physics setup errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("physics timestep must be positive and finite, got {0}")]
    InvalidTimestep(f32),

    #[error("physics needs at least one substep per frame")]
    NoSubsteps,

    #[error("airplane mass must be positive, got {0}")]
    NonPositiveMass(f32),

    #[error("{name} damping must be in [0, 1), got {value}")]
    InvalidDamping { name: &'static str, value: f32 },

    #[error("traffic route has no waypoints")]
    EmptyRoute,

    #[error("{name} must be {requirement}, got {value}")]
    OutOfRange {
        name: &'static str,
        requirement: &'static str,
        value: f32,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("collider mesh for {shape} is invalid: {reason}")]
    InvalidMesh { shape: &'static str, reason: String },
}

/// Require `value > 0` (and finite).
pub(crate) fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            requirement: "positive",
            value,
        })
    }
}

/// Require `value >= 0` (and finite).
pub(crate) fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            requirement: "non-negative",
            value,
        })
    }
}

pub(crate) fn damping(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidDamping { name, value })
    }
}
