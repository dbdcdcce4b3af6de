use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{MeshVertexAttribute, PrimitiveTopology, VertexAttributeValues};
use bevy::render::render_resource::VertexFormat;

/// Vertices emitted per point: two triangles forming one sprite quad.
pub const VERTICES_PER_POINT: usize = 6;

/// Integer vertex index read by the point sprite vertex stage at location 0.
pub const ATTRIBUTE_POINT_VERTEX_INDEX: MeshVertexAttribute =
    MeshVertexAttribute::new("PointCloud_VertexIndex", 946_315_207, VertexFormat::Uint32);

#[derive(Component)]
pub struct PointCloud;

/// Create point index mesh for GPU-side vertex expansion.
///
/// Each vertex carries only its own index as a `u32`; the vertex shader
/// derives the point index (`index / 6`) and quad corner (`index % 6`) from it.
/// Bevy's mesh allocator may offset `vertex_index`, so the index travels as
/// vertex data instead.
pub fn create_point_index_mesh(point_count: usize) -> Mesh {
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );

    let vertex_count = u32::try_from(point_count * VERTICES_PER_POINT).unwrap_or(u32::MAX);
    mesh.insert_attribute(
        ATTRIBUTE_POINT_VERTEX_INDEX,
        VertexAttributeValues::Uint32((0..vertex_count).collect()),
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_indices(mesh: &Mesh) -> &[u32] {
        match mesh.attribute(ATTRIBUTE_POINT_VERTEX_INDEX) {
            Some(VertexAttributeValues::Uint32(indices)) => indices,
            _ => panic!("vertex index attribute missing"),
        }
    }

    #[test]
    fn emits_six_indexed_vertices_per_point() {
        let mesh = create_point_index_mesh(3);

        assert_eq!(mesh.count_vertices(), 18);
        assert!(mesh.attribute(Mesh::ATTRIBUTE_POSITION).is_none());
        let indices = vertex_indices(&mesh);
        assert_eq!(indices[0], 0);
        assert_eq!(indices[17], 17);
    }

    #[test]
    fn indices_stay_exact_past_float_precision() {
        // 2^24 / 6 points is where an f32 index starts losing integers.
        let point_count = 2_900_000;
        let mesh = create_point_index_mesh(point_count);
        let indices = vertex_indices(&mesh);

        assert_eq!(indices.len(), point_count * VERTICES_PER_POINT);
        assert!(
            indices
                .iter()
                .enumerate()
                .all(|(vertex, &index)| index as usize == vertex)
        );
        assert_eq!(indices[16_777_217], 16_777_217);
    }
}
