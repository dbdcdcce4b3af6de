use bevy::math::Vec3;

/// World axis treated as vertical. Sensor data arrives Z-up, so the ground
/// plane spans X and Y.
pub const UP_AXIS: Vec3 = Vec3::Z;

/// Initial camera position: behind the origin along -X, slightly above ground.
pub const CAMERA_START_POSITION: Vec3 = Vec3::new(-5.0, 0.0, 3.0);

/// Initial orbit target
pub const CAMERA_LOOK_AT: Vec3 = Vec3::ZERO;

pub const CAMERA_FOV_DEGREES: f32 = 60.0;
pub const CAMERA_NEAR: f32 = 0.01;
pub const CAMERA_FAR: f32 = 1000.0;

/// Azimuth/polar decomposition of an offset around a Z-up target.
/// Returns `(radius, theta, phi)` with theta measured in the X-Y plane from +X
/// and phi measured from +Z.
pub fn to_spherical(offset: Vec3) -> (f32, f32, f32) {
    let radius = offset.length();
    if radius == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let theta = offset.y.atan2(offset.x);
    let phi = (offset.z / radius).clamp(-1.0, 1.0).acos();
    (radius, theta, phi)
}

/// Inverse of [`to_spherical`].
pub fn from_spherical(radius: f32, theta: f32, phi: f32) -> Vec3 {
    let sin_phi = phi.sin();
    Vec3::new(
        radius * sin_phi * theta.cos(),
        radius * sin_phi * theta.sin(),
        radius * phi.cos(),
    )
}
