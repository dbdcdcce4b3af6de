//! Core application setup and viewer lifecycle.
//!
//! Handles the mount/unmount state machine, the render loop handle, resize
//! subscriptions, runtime settings and plugin initialisation for both native
//! and WASM targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the app with the point sprite material, diagnostics, settings and
/// RPC layers, and wires the viewer systems into the schedule.
pub mod app_setup;

/// Viewer states, lifecycle commands, warnings and the activity flag.
pub mod app_state;

/// Outstanding frame request driving the per-frame cycle.
pub mod frame_loop;

/// Mount, deferred surface retry and idempotent teardown.
pub mod lifecycle;

/// Resize listener registry and camera aspect updates.
pub mod resize;

/// Viewer settings with constant defaults and a JSON override file.
pub mod settings;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
