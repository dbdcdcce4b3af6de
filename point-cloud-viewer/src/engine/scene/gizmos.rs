use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;

use super::{SceneHelper, spawn_line_helper};

#[derive(Component)]
pub struct AxesIndicator;

/// Axis segments from the origin, each fading from its primary colour
/// towards a lighter tint: X red, Y green, Z blue.
pub fn axes_line_vertices(length: f32) -> [([f32; 3], [f32; 4]); 6] {
    [
        ([0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 1.0]),
        ([length, 0.0, 0.0], [1.0, 0.6, 0.0, 1.0]),
        ([0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 1.0]),
        ([0.0, length, 0.0], [0.6, 1.0, 0.0, 1.0]),
        ([0.0, 0.0, 0.0], [0.0, 0.0, 1.0, 1.0]),
        ([0.0, 0.0, length], [0.0, 0.6, 1.0, 1.0]),
    ]
}

/// Spawn the axis indicator at the origin.
pub fn create_axes_indicator(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    length: f32,
) -> SceneHelper {
    let (positions, colours): (Vec<[f32; 3]>, Vec<[f32; 4]>) =
        axes_line_vertices(length).into_iter().unzip();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colours);

    spawn_line_helper(commands, meshes, materials, mesh, AxesIndicator)
}
