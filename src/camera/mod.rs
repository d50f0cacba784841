//! Chase and cockpit cameras following the player airplane.
//!
//! First-person is rigidly attached to the airframe. Third-person eases
//! towards a point behind and above the airplane and always looks at it.

use bevy::{
    pbr::{DistanceFog, FogFalloff},
    prelude::*,
};

use crate::simulation::flight::Airplane;
use crate::simulation::FrameSet;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraRigConfig>()
            .init_resource::<CameraMode>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, toggle_camera_mode.in_set(FrameSet::Input))
            .add_systems(Update, follow_airplane.in_set(FrameSet::Subsystems));
    }
}

/// Which view the player is using.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CameraMode::FirstPerson => "COCKPIT",
            CameraMode::ThirdPerson => "CHASE",
        }
    }
}

#[derive(Resource, Clone, Debug)]
pub struct CameraRigConfig {
    /// Cockpit eye point in airplane coordinates.
    pub first_person_offset: Vec3,
    /// Chase point in airplane coordinates.
    pub third_person_offset: Vec3,
    /// Fraction of the remaining distance closed per frame at `reference_rate`.
    pub follow_smoothing: f32,
    /// Frame rate (Hz) at which `follow_smoothing` applies verbatim.
    pub reference_rate: f32,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub toggle_key: KeyCode,
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            first_person_offset: Vec3::new(0.0, 0.5, -1.0),
            third_person_offset: Vec3::new(0.0, 5.0, 15.0),
            follow_smoothing: 0.1,
            reference_rate: 60.0,
            fov_degrees: 75.0,
            near: 0.1,
            far: 2000.0,
            toggle_key: KeyCode::KeyC,
        }
    }
}

/// Marker for the camera driven by the rig.
#[derive(Component)]
pub struct FlightCamera;

/// Per-frame interpolation factor equivalent to `per_frame` applied at
/// `reference_rate` Hz, for a frame lasting `dt` seconds.
pub fn smoothing_factor(per_frame: f32, dt: f32, reference_rate: f32) -> f32 {
    1.0 - (1.0 - per_frame).powf(dt * reference_rate)
}

/// Cockpit view: offset point on the airframe, airframe orientation.
pub fn first_person_transform(airplane: &Transform, config: &CameraRigConfig) -> Transform {
    Transform::from_translation(airplane.transform_point(config.first_person_offset))
        .with_rotation(airplane.rotation)
}

/// Chase view: ease towards the chase point, then aim at the airplane.
pub fn third_person_transform(
    camera: &Transform,
    airplane: &Transform,
    config: &CameraRigConfig,
    dt: f32,
) -> Transform {
    let target = airplane.transform_point(config.third_person_offset);
    let t = smoothing_factor(config.follow_smoothing, dt, config.reference_rate);
    let position = camera.translation.lerp(target, t);
    Transform::from_translation(position).looking_at(airplane.translation, Vec3::Y)
}

fn setup_camera(mut commands: Commands, config: Res<CameraRigConfig>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            ..default()
        }),
        Transform::from_xyz(0.0, 100.0, 20.0).looking_at(Vec3::new(0.0, 100.0, 0.0), Vec3::Y),
        // Haze towards the far plane, tinted like the sky.
        DistanceFog {
            color: Color::srgba(0.53, 0.81, 0.92, 1.0),
            falloff: FogFalloff::Linear {
                start: config.far * 0.4,
                end: config.far,
            },
            ..default()
        },
        FlightCamera,
    ));
}

fn toggle_camera_mode(
    keyboard: Res<ButtonInput<KeyCode>>,
    config: Res<CameraRigConfig>,
    mut mode: ResMut<CameraMode>,
) {
    if keyboard.just_pressed(config.toggle_key) {
        *mode = mode.toggled();
        info!("Camera mode: {:?}", *mode);
    }
}

fn follow_airplane(
    time: Res<Time>,
    mode: Res<CameraMode>,
    config: Res<CameraRigConfig>,
    airplanes: Query<&Transform, (With<Airplane>, Without<FlightCamera>)>,
    mut cameras: Query<&mut Transform, With<FlightCamera>>,
) {
    let Ok(airplane) = airplanes.get_single() else {
        return;
    };

    for mut camera in cameras.iter_mut() {
        let next = match *mode {
            CameraMode::FirstPerson => first_person_transform(airplane, &config),
            CameraMode::ThirdPerson => {
                third_person_transform(&camera, airplane, &config, time.delta_secs())
            }
        };
        *camera = next;
    }
}
