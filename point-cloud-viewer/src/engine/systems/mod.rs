//! Runtime reporting systems.
//!
//! Pushes viewer status, warnings and frame rate to the host over RPC.

/// Status snapshots plus status, warning and FPS notifications.
pub mod status_tracking;
