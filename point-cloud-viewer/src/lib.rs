//! Real-time point cloud viewer.
//!
//! Streams flat xyz snapshots into a grow-only point buffer and renders them
//! as bordered, additively blended sprites under a damped Z-up orbit camera.

pub mod engine;
pub mod rpc;
