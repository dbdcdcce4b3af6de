//! Shared constants for the point cloud viewer.
//!
//! Source resolution, render settings and world coordinate conventions used as
//! defaults by the viewer's runtime settings.

/// World axis conventions and initial camera placement.
pub mod coordinate_system;

/// Point sprite, scene helper and camera interaction defaults.
pub mod render_settings;

/// Sensor frame resolution and point texture limits.
pub mod texture;
