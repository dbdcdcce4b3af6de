//! Mesh generation for point cloud rendering primitives.
//!
//! Provides vertex buffers whose vertices carry only their own index; the
//! point sprite vertex shader expands each group of six into a screen-aligned
//! quad.

/// Point cloud index mesh generation for GPU-side vertex expansion.
///
/// Creates triangle-based geometry where each point expands to a quad via vertex shader.
pub mod point_index_mesh;
