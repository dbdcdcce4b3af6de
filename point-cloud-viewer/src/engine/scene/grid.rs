use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use constants::render_settings::{GRID_CENTRE_LINE_COLOUR, GRID_LINE_COLOUR};

use super::{SceneHelper, linear_vertex_colour, spawn_line_helper};

#[derive(Component)]
pub struct GroundGrid;

/// Line endpoints of a square grid centred on the origin in the X-Y plane.
///
/// `divisions + 1` lines run along each axis. The middle line of each set is
/// flagged so it can take the centre colour.
pub fn grid_line_vertices(size: f32, divisions: u32) -> Vec<([f32; 3], bool)> {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;
    let centre = divisions / 2;

    let mut vertices = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let offset = -half + i as f32 * step;
        let is_centre = i == centre;

        // Parallel to X
        vertices.push(([-half, offset, 0.0], is_centre));
        vertices.push(([half, offset, 0.0], is_centre));
        // Parallel to Y
        vertices.push(([offset, -half, 0.0], is_centre));
        vertices.push(([offset, half, 0.0], is_centre));
    }
    vertices
}

pub fn create_grid_mesh(size: f32, divisions: u32) -> Mesh {
    let centre_colour = linear_vertex_colour(GRID_CENTRE_LINE_COLOUR);
    let line_colour = linear_vertex_colour(GRID_LINE_COLOUR);

    let (positions, colours): (Vec<[f32; 3]>, Vec<[f32; 4]>) = grid_line_vertices(size, divisions)
        .into_iter()
        .map(|(position, is_centre)| {
            let colour = if is_centre { centre_colour } else { line_colour };
            (position, colour)
        })
        .unzip();

    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colours);
    mesh
}

/// Spawn the ground grid lying in the X-Y plane.
pub fn create_ground_grid(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    size: f32,
    divisions: u32,
) -> SceneHelper {
    spawn_line_helper(
        commands,
        meshes,
        materials,
        create_grid_mesh(size, divisions),
        GroundGrid,
    )
}
