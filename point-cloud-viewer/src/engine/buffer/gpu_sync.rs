use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::extract_resource::{ExtractResource, ExtractResourcePlugin};
use bevy::render::render_asset::RenderAssets;
use bevy::render::render_resource::{
    Extent3d, Origin3d, TexelCopyBufferLayout, TexelCopyTextureInfo, TextureAspect,
    TextureDimension, TextureFormat,
};
use bevy::render::renderer::RenderQueue;
use bevy::render::texture::GpuImage;
use bevy::render::{Render, RenderApp, RenderSet};
use constants::texture::{MAX_POINT_CAPACITY, MAX_TEXTURE_DIMENSION};

use super::point_buffer::{PendingSync, PointBuffer};
use crate::engine::core::lifecycle::RenderContext;
use crate::engine::mesh::point_index_mesh::{PointCloud, create_point_index_mesh};
use crate::engine::shaders::PointSpriteMaterial;

/// Bytes per `Rgba32Float` texel.
pub const TEXEL_SIZE: usize = 16;

/// Dimensions of the point texture for a given capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLayout {
    pub width: u32,
    pub height: u32,
}

impl TextureLayout {
    /// Rows follow the source frame width. Widens to the texture limit if the
    /// row count would otherwise exceed it. Capacities past
    /// `MAX_POINT_CAPACITY` are clamped; the point buffer never grows past it.
    pub fn for_capacity(capacity: usize, source_width: u32) -> Self {
        let capacity = capacity.clamp(1, MAX_POINT_CAPACITY) as u32;
        let mut width = source_width.clamp(1, MAX_TEXTURE_DIMENSION);
        if capacity.div_ceil(width) > MAX_TEXTURE_DIMENSION {
            width = MAX_TEXTURE_DIMENSION;
        }

        Self {
            width,
            height: capacity.div_ceil(width),
        }
    }

    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Write the first `count` points as `[x, y, z, size]` texels.
pub fn write_point_texels(data: &mut [u8], buffer: &PointBuffer, count: usize) {
    let points = buffer.positions().chunks_exact(3).zip(buffer.sizes());
    for (bytes, (position, size)) in data.chunks_exact_mut(TEXEL_SIZE).zip(points).take(count) {
        let texel = [position[0], position[1], position[2], *size];
        bytes.copy_from_slice(bytemuck::bytes_of(&texel));
    }
}

/// Build the point texture holding the whole buffer. Texels past capacity
/// stay zeroed.
pub fn create_point_texture(buffer: &PointBuffer, layout: TextureLayout) -> Image {
    let mut data = vec![0u8; layout.texel_count() * TEXEL_SIZE];
    write_point_texels(&mut data, buffer, buffer.capacity());

    Image::new(
        Extent3d {
            width: layout.width,
            height: layout.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba32Float,
        // The main-world copy is only refreshed on reallocation; partial
        // updates go straight to the GPU texture.
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    )
}

/// Leading texture rows covering the draw range, ready for a direct write.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRowsUpload {
    pub texture: AssetId<Image>,
    pub width: u32,
    pub rows: u32,
    pub data: Vec<u8>,
}

impl TextureRowsUpload {
    /// Pack the draw range into whole rows from row 0. `None` when nothing is
    /// drawn.
    pub fn for_draw_range(
        texture: AssetId<Image>,
        buffer: &PointBuffer,
        layout: TextureLayout,
    ) -> Option<Self> {
        let draw_count = buffer.draw_count();
        if draw_count == 0 {
            return None;
        }

        let rows = (draw_count as u32).div_ceil(layout.width).min(layout.height);
        let mut data = vec![0u8; rows as usize * layout.width as usize * TEXEL_SIZE];
        write_point_texels(&mut data, buffer, draw_count);

        Some(Self {
            texture,
            width: layout.width,
            rows,
            data,
        })
    }
}

/// Rows owed to the GPU point texture since the last render-world write.
#[derive(Resource, Debug, Clone, Default, ExtractResource)]
pub struct PendingTextureRows {
    pub upload: Option<TextureRowsUpload>,
}

/// Registers the render-world half of partial texture updates.
pub struct PointTextureSyncPlugin;

impl Plugin for PointTextureSyncPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingTextureRows>()
            .add_plugins(ExtractResourcePlugin::<PendingTextureRows>::default());

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };
        render_app.add_systems(
            Render,
            write_point_texture_rows.in_set(RenderSet::PrepareResources),
        );
    }
}

/// Copy pending draw-range rows into the prepared GPU texture. Kept for the
/// next frame if the texture is not on the GPU yet.
fn write_point_texture_rows(
    mut pending: ResMut<PendingTextureRows>,
    gpu_images: Res<RenderAssets<GpuImage>>,
    render_queue: Res<RenderQueue>,
) {
    let Some(upload) = pending.upload.take() else {
        return;
    };
    let Some(gpu_image) = gpu_images.get(upload.texture) else {
        pending.upload = Some(upload);
        return;
    };

    render_queue.write_texture(
        TexelCopyTextureInfo {
            texture: &gpu_image.texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        &upload.data,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(upload.width * TEXEL_SIZE as u32),
            rows_per_image: Some(upload.rows),
        },
        Extent3d {
            width: upload.width,
            height: upload.rows,
            depth_or_array_layers: 1,
        },
    );
}

/// Push pending point buffer changes to the GPU-side assets.
///
/// A partial update queues the draw-range rows for a direct texture write,
/// leaving the image asset untouched so it is not re-uploaded whole. A
/// reallocation replaces the texture and swaps in an index mesh sized for the
/// new capacity. The draw count uniform is refreshed either way.
pub fn sync_point_buffer(
    buffer: Option<ResMut<PointBuffer>>,
    context: Option<ResMut<RenderContext>>,
    mut pending_rows: ResMut<PendingTextureRows>,
    mut images: ResMut<Assets<Image>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<PointSpriteMaterial>>,
    mut point_clouds: Query<&mut Mesh3d, With<PointCloud>>,
) {
    let (Some(mut buffer), Some(mut context)) = (buffer, context) else {
        return;
    };
    let Some(sync) = buffer.take_pending_sync() else {
        return;
    };

    match sync {
        PendingSync::Partial => {
            pending_rows.upload = TextureRowsUpload::for_draw_range(
                context.point_texture.id(),
                &buffer,
                context.texture_layout,
            );
        }
        PendingSync::Reallocated => {
            let layout = TextureLayout::for_capacity(buffer.capacity(), context.source_width);
            if let Some(image) = images.get_mut(&context.point_texture) {
                *image = create_point_texture(&buffer, layout);
            }
            context.texture_layout = layout;
            // The rebuilt texture already holds everything.
            pending_rows.upload = None;

            let replacement = meshes.add(create_point_index_mesh(buffer.capacity()));
            let previous = std::mem::replace(&mut context.point_mesh, replacement.clone());
            if let Ok(mut mesh) = point_clouds.get_mut(context.point_cloud) {
                mesh.0 = replacement;
            }
            meshes.remove(&previous);

            info!(
                "Point texture rebuilt at {}x{} for {} points",
                layout.width,
                layout.height,
                buffer.capacity()
            );
        }
    }

    if let Some(material) = materials.get_mut(&context.point_material) {
        material.params.draw_count = u32::try_from(buffer.draw_count()).unwrap_or(u32::MAX);
        material.params.texture_width = context.texture_layout.width;
    }
}
