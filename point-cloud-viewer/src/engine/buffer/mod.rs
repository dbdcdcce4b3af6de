//! Point storage and its hand-off to the GPU.
//!
//! Producers submit snapshots through the feed, the render loop copies them
//! into the point buffer and the sync step mirrors pending changes into the
//! point texture and index mesh.

/// Grow-only position and size storage with a draw range.
pub mod point_buffer;

/// Last-write-wins slot between external producers and the render loop.
pub mod point_feed;

/// Point texture layout, texel packing and GPU asset synchronisation.
pub mod gpu_sync;
