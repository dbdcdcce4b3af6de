/// Point sprite material: circular, bordered, additively blended dots.
use bevy::render::render_resource::ShaderType;
use bevy::{
    pbr::{MaterialPipeline, MaterialPipelineKey},
    prelude::*,
    reflect::TypePath,
    render::{
        mesh::MeshVertexBufferLayoutRef,
        render_resource::{
            AsBindGroup, BlendComponent, BlendFactor, BlendOperation, BlendState,
            RenderPipelineDescriptor, ShaderRef, SpecializedMeshPipelineError,
        },
    },
};
use constants::render_settings::{
    POINT_BORDER_COLOUR, POINT_FILL_COLOUR, SPRITE_BORDER_END, SPRITE_BORDER_START, SPRITE_RADIUS,
};

use crate::engine::mesh::point_index_mesh::ATTRIBUTE_POINT_VERTEX_INDEX;

pub const POINT_SPRITE_SHADER_PATH: &str = "shaders/point_sprite.wgsl";

/// GL point sizes never drop below one pixel; the sprite expansion matches that.
pub const MIN_POINT_SIZE_PX: f32 = 1.0;

/// Per-draw parameters. Layout must match `PointSpriteParams` in the WGSL.
///
/// The sprite palette and ring thresholds travel here too, so the shader has
/// no colour or distance literals of its own.
#[derive(Debug, Clone, Copy, PartialEq, ShaderType)]
pub struct PointSpriteParams {
    /// Points at or past this index are collapsed outside the clip volume.
    pub draw_count: u32,
    /// Row length of the point texture, in texels.
    pub texture_width: u32,
    pub size_scale: f32,
    pub min_size_px: f32,
    pub fill_colour: Vec3,
    /// Distance from the sprite centre where the border ring starts.
    pub border_start: f32,
    pub border_colour: Vec3,
    /// Distance where the ring is fully border coloured and the edge fade begins.
    pub border_end: f32,
    /// Footprint radius; fragments past it are discarded.
    pub radius: f32,
}

impl PointSpriteParams {
    pub fn new(draw_count: u32, texture_width: u32, size_scale: f32) -> Self {
        Self {
            draw_count,
            texture_width,
            size_scale,
            min_size_px: MIN_POINT_SIZE_PX,
            fill_colour: Vec3::from(POINT_FILL_COLOUR),
            border_start: SPRITE_BORDER_START,
            border_colour: Vec3::from(POINT_BORDER_COLOUR),
            border_end: SPRITE_BORDER_END,
            radius: SPRITE_RADIUS,
        }
    }

    /// CPU mirror of the fragment stage.
    ///
    /// `distance` is the fragment's distance from the sprite centre in
    /// footprint units (the quad spans `[0, 1]`). Returns `None` where the
    /// fragment is discarded, otherwise straight (non-premultiplied) RGBA.
    pub fn shade(&self, distance: f32) -> Option<[f32; 4]> {
        if distance > self.radius {
            return None;
        }

        let t = smoothstep(self.border_start, self.border_end, distance);
        let colour = self.fill_colour.lerp(self.border_colour, t);
        let alpha = 1.0 - smoothstep(self.border_end, self.radius, distance);

        Some([colour.x, colour.y, colour.z, alpha])
    }

    /// CPU mirror of the vertex stage sizing: on-screen diameter in pixels of
    /// a point with `base_size` whose view-space z is `view_z` (negative in
    /// front of the camera).
    pub fn projected_size(&self, base_size: f32, view_z: f32) -> f32 {
        (base_size * (self.size_scale / -view_z)).max(self.min_size_px)
    }
}

/// Material bound to the point cloud entity. The texture holds one texel per
/// point: `xyz` position and `w` base size.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct PointSpriteMaterial {
    #[texture(0, sample_type = "float", filterable = false)]
    pub point_texture: Handle<Image>,

    #[uniform(1)]
    pub params: PointSpriteParams,
}

impl Material for PointSpriteMaterial {
    fn vertex_shader() -> ShaderRef {
        POINT_SPRITE_SHADER_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        POINT_SPRITE_SHADER_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Add
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        // Only the vertex index travels in the mesh; everything else is fetched.
        let vertex_layout = layout
            .0
            .get_layout(&[ATTRIBUTE_POINT_VERTEX_INDEX.at_shader_location(0)])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode = None;

        if let Some(depth_stencil) = descriptor.depth_stencil.as_mut() {
            depth_stencil.depth_write_enabled = false;
        }

        // Overlapping points brighten instead of occluding.
        if let Some(fragment) = descriptor.fragment.as_mut() {
            for target in fragment.targets.iter_mut().flatten() {
                target.blend = Some(BlendState {
                    color: BlendComponent {
                        src_factor: BlendFactor::SrcAlpha,
                        dst_factor: BlendFactor::One,
                        operation: BlendOperation::Add,
                    },
                    alpha: BlendComponent::OVER,
                });
            }
        }

        Ok(())
    }
}

/// Hermite interpolation matching WGSL `smoothstep`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
