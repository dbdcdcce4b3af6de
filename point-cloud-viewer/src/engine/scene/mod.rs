//! Static visual aids drawn alongside the point cloud.
//!
//! A ground grid in the X-Y plane and an RGB axis indicator at the origin,
//! both unlit line meshes with per-vertex colours.

use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;

/// RGB axis indicator at the world origin.
pub mod gizmos;

/// Ground grid in the X-Y plane.
pub mod grid;

/// Entity and assets of one spawned helper, released on teardown.
#[derive(Debug, Clone)]
pub struct SceneHelper {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

/// Spawn an unlit vertex-coloured line mesh with no frustum culling.
pub fn spawn_line_helper(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    line_mesh: Mesh,
    marker: impl Bundle,
) -> SceneHelper {
    let mesh = meshes.add(line_mesh);
    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..default()
    });

    let entity = commands
        .spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material.clone()),
            Visibility::Visible,
            NoFrustumCulling,
            Transform::IDENTITY,
            marker,
        ))
        .id();

    SceneHelper {
        entity,
        mesh,
        material,
    }
}

/// Convert an sRGB triple to linear RGBA for vertex colours.
pub(crate) fn linear_vertex_colour([r, g, b]: [f32; 3]) -> [f32; 4] {
    Color::srgb(r, g, b).to_linear().to_f32_array()
}
