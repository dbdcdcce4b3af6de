use std::f32::consts::{PI, TAU};

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::coordinate_system::{CAMERA_LOOK_AT, UP_AXIS, from_spherical, to_spherical};

use crate::engine::core::settings::ViewerSettings;

/// Keeps the polar angle off the poles, where `looking_at` degenerates.
const MIN_POLAR_ANGLE: f32 = 1e-3;

/// Pixel-unit scroll deltas per line notch.
const PIXELS_PER_SCROLL_LINE: f32 = 100.0;

/// Middle-drag pixels per zoom notch.
const PIXELS_PER_ZOOM_STEP: f32 = 20.0;

const SETTLED_EPSILON: f32 = 1e-5;

#[derive(Component)]
pub struct ViewerCamera;

/// Damped orbit/pan/zoom around a target with +Z up.
///
/// Input accumulates as pending motion. Every frame [`OrbitController::update`]
/// applies `damping_factor` of what is pending and keeps the rest, so motion
/// eases out over subsequent frames.
#[derive(Component, Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    pub radius: f32,
    /// Azimuth in the X-Y plane, from +X.
    pub theta: f32,
    /// Polar angle from +Z.
    pub phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_pan: Vec3,
    /// Natural log of the pending radius scale.
    pending_zoom: f32,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitController {
    pub fn new(position: Vec3, target: Vec3, settings: &ViewerSettings) -> Self {
        let (radius, theta, phi) = to_spherical(position - target);
        Self {
            target,
            radius: radius.clamp(settings.min_distance, settings.max_distance),
            theta,
            phi: phi.clamp(MIN_POLAR_ANGLE, PI - MIN_POLAR_ANGLE),
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            pending_zoom: 0.0,
            damping_factor: settings.damping_factor,
            rotate_speed: settings.rotate_speed,
            pan_speed: settings.pan_speed,
            zoom_speed: settings.zoom_speed,
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.target + from_spherical(self.radius, self.theta, self.phi)
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, UP_AXIS)
    }

    /// A full viewport-height drag turns a full circle.
    pub fn rotate(&mut self, delta_px: Vec2, viewport_height: f32) {
        let scale = TAU * self.rotate_speed / viewport_height.max(1.0);
        self.pending_theta -= delta_px.x * scale;
        self.pending_phi -= delta_px.y * scale;
    }

    /// Screen-space pan, scaled so the target plane tracks the cursor.
    pub fn pan(&mut self, delta_px: Vec2, viewport_height: f32, fov: f32) {
        let world_per_px =
            2.0 * self.radius * (fov * 0.5).tan() / viewport_height.max(1.0) * self.pan_speed;
        let rotation = self.transform().rotation;
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        self.pending_pan += (-right * delta_px.x + up * delta_px.y) * world_per_px;
    }

    /// Positive steps move towards the target.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_zoom += steps * 0.95f32.powf(self.zoom_speed).ln();
    }

    pub fn update(&mut self) {
        let factor = self.damping_factor;

        self.theta += self.pending_theta * factor;
        self.phi = (self.phi + self.pending_phi * factor).clamp(MIN_POLAR_ANGLE, PI - MIN_POLAR_ANGLE);
        self.target += self.pending_pan * factor;
        self.radius = (self.radius * (self.pending_zoom * factor).exp())
            .clamp(self.min_distance, self.max_distance);

        let decay = 1.0 - factor;
        self.pending_theta *= decay;
        self.pending_phi *= decay;
        self.pending_pan *= decay;
        self.pending_zoom *= decay;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_theta.abs() < SETTLED_EPSILON
            && self.pending_phi.abs() < SETTLED_EPSILON
            && self.pending_pan.length() < SETTLED_EPSILON
            && self.pending_zoom.abs() < SETTLED_EPSILON
    }
}

/// Width over height, or `None` for a surface without area.
pub fn aspect_ratio(surface: UVec2) -> Option<f32> {
    (surface.x > 0 && surface.y > 0).then(|| surface.x as f32 / surface.y as f32)
}

/// Spawn the perspective camera at the configured start position, looking at
/// the origin.
pub fn spawn_viewer_camera(
    commands: &mut Commands,
    settings: &ViewerSettings,
    surface: UVec2,
) -> Entity {
    let controller = OrbitController::new(settings.camera_start(), CAMERA_LOOK_AT, settings);

    commands
        .spawn((
            Camera3d::default(),
            Camera {
                clear_color: ClearColorConfig::Custom(settings.background_colour()),
                ..default()
            },
            Projection::Perspective(PerspectiveProjection {
                fov: settings.fov_degrees.to_radians(),
                near: settings.near,
                far: settings.far,
                aspect_ratio: aspect_ratio(surface).unwrap_or(1.0),
            }),
            Msaa::Off,
            Tonemapping::None,
            controller.transform(),
            controller,
            ViewerCamera,
        ))
        .id()
}

/// Map mouse input onto the controller: left drag orbits, right or
/// shift-left drag pans, middle drag and the wheel zoom.
pub fn orbit_input(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut mouse_wheel: EventReader<MouseWheel>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut controllers: Query<(&mut OrbitController, &Projection)>,
) {
    let motion: Vec2 = mouse_motion.read().map(|event| event.delta).sum();
    let scroll: f32 = mouse_wheel
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / PIXELS_PER_SCROLL_LINE,
        })
        .sum();

    let viewport_height = windows
        .single()
        .map(|window| window.height())
        .unwrap_or(1.0);
    let shift = keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);

    for (mut controller, projection) in &mut controllers {
        if motion != Vec2::ZERO {
            let left = mouse_buttons.pressed(MouseButton::Left);
            if mouse_buttons.pressed(MouseButton::Right) || (left && shift) {
                let fov = match projection {
                    Projection::Perspective(perspective) => perspective.fov,
                    _ => std::f32::consts::FRAC_PI_3,
                };
                controller.pan(motion, viewport_height, fov);
            } else if left {
                controller.rotate(motion, viewport_height);
            } else if mouse_buttons.pressed(MouseButton::Middle) {
                controller.zoom(-motion.y / PIXELS_PER_ZOOM_STEP);
            }
        }

        if scroll != 0.0 {
            controller.zoom(scroll);
        }
    }
}

/// Advance damping and move the camera.
pub fn advance_orbit_controller(mut cameras: Query<(&mut OrbitController, &mut Transform)>) {
    for (mut controller, mut transform) in &mut cameras {
        controller.update();
        *transform = controller.transform();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> OrbitController {
        OrbitController::new(Vec3::new(-5.0, 0.0, 3.0), Vec3::ZERO, &ViewerSettings::default())
    }

    #[test]
    fn starts_at_configured_position_looking_at_target() {
        let controller = controller();
        assert!(controller.position().distance(Vec3::new(-5.0, 0.0, 3.0)) < 1e-4);

        let transform = controller.transform();
        let forward = transform.forward();
        let expected = (Vec3::ZERO - controller.position()).normalize();
        assert!(forward.dot(expected) > 0.9999);
        // Camera up leans towards +Z.
        assert!((transform.rotation * Vec3::Y).z > 0.0);
    }

    #[test]
    fn rotation_is_damped_and_converges() {
        let mut controller = controller();
        let start_theta = controller.theta;
        controller.rotate(Vec2::new(-100.0, 0.0), 600.0);
        let total = TAU * 100.0 / 600.0;

        controller.update();
        let first_step = controller.theta - start_theta;
        assert!((first_step - total * 0.05).abs() < 1e-5);

        for _ in 0..600 {
            controller.update();
        }
        assert!(controller.is_settled());
        assert!((controller.theta - start_theta - total).abs() < 1e-3);
        // Orbiting keeps the distance.
        assert!((controller.radius - 34.0f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn polar_angle_stays_off_the_poles() {
        let mut controller = controller();
        controller.damping_factor = 1.0;
        controller.rotate(Vec2::new(0.0, 10_000.0), 100.0);
        controller.update();
        assert!(controller.phi >= MIN_POLAR_ANGLE);
        let transform = controller.transform();
        assert!(transform.translation.is_finite());
        assert!(transform.rotation.is_finite());
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut controller = controller();
        controller.damping_factor = 1.0;

        controller.zoom(1.0);
        controller.update();
        assert!(controller.radius < 34.0f32.sqrt());

        controller.zoom(10_000.0);
        controller.update();
        assert_eq!(controller.radius, controller.min_distance);

        controller.zoom(-100_000.0);
        controller.update();
        assert_eq!(controller.radius, controller.max_distance);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut controller = controller();
        controller.damping_factor = 1.0;
        let offset = controller.position() - controller.target;

        controller.pan(Vec2::new(50.0, 0.0), 600.0, 60f32.to_radians());
        controller.update();

        assert!(controller.target.length() > 0.0);
        // Horizontal drag stays in the ground plane.
        assert!(controller.target.z.abs() < 1e-5);
        assert!((controller.position() - controller.target - offset).length() < 1e-4);
    }

    #[test]
    fn aspect_ratio_needs_area() {
        assert_eq!(aspect_ratio(UVec2::new(800, 600)), Some(800.0 / 600.0));
        assert_eq!(aspect_ratio(UVec2::new(800, 0)), None);
        assert_eq!(aspect_ratio(UVec2::ZERO), None);
    }
}
