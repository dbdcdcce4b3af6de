//! Viewport camera for point cloud scene navigation.
//!
//! Provides a perspective camera with +Z up and damped orbit, pan and zoom
//! controls driven by mouse input.

/// Orbit controller component, camera spawning and input systems.
pub mod viewport_camera;
