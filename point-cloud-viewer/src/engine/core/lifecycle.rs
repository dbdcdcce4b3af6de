use std::collections::VecDeque;
use std::time::Duration;

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use bevy::window::PrimaryWindow;

use crate::engine::buffer::gpu_sync::{TextureLayout, create_point_texture};
use crate::engine::buffer::point_buffer::PointBuffer;
use crate::engine::camera::viewport_camera::spawn_viewer_camera;
use crate::engine::core::app_state::{ViewerLifecycleEvent, ViewerState, ViewerWarning};
use crate::engine::core::frame_loop::FrameLoop;
use crate::engine::core::resize::{
    ResizeListenerRegistry, ResizeSubscription, primary_surface_size,
};
use crate::engine::core::settings::ViewerSettings;
use crate::engine::mesh::point_index_mesh::{PointCloud, create_point_index_mesh};
use crate::engine::scene::{SceneHelper, gizmos::create_axes_indicator, grid::create_ground_grid};
use crate::engine::shaders::{PointSpriteMaterial, PointSpriteParams};

/// One-shot latch for the deferred surface check. At most one retry can be
/// pending at a time.
#[derive(Resource, Debug, Default)]
pub enum SurfaceRetry {
    #[default]
    Idle,
    Pending(Timer),
}

impl SurfaceRetry {
    /// Arm the retry. Does nothing and returns false if one is already pending.
    pub fn arm(&mut self, delay: Duration) -> bool {
        match self {
            Self::Idle => {
                *self = Self::Pending(Timer::new(delay, TimerMode::Once));
                true
            }
            Self::Pending(_) => false,
        }
    }

    /// Returns true if a pending retry was dropped.
    pub fn cancel(&mut self) -> bool {
        matches!(std::mem::take(self), Self::Pending(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// Advance the timer. Returns true exactly once, when the retry fires,
    /// and falls back to idle.
    pub fn tick(&mut self, delta: Duration) -> bool {
        let Self::Pending(timer) = self else {
            return false;
        };
        if timer.tick(delta).finished() {
            *self = Self::Idle;
            true
        } else {
            false
        }
    }
}

/// Everything created on mount, released together on unmount.
#[derive(Resource, Debug)]
pub struct RenderContext {
    pub camera: Entity,
    pub point_cloud: Entity,
    pub helpers: Vec<SceneHelper>,
    pub point_mesh: Handle<Mesh>,
    pub point_texture: Handle<Image>,
    pub point_material: Handle<PointSpriteMaterial>,
    pub texture_layout: TextureLayout,
    /// Row width the point texture prefers.
    pub source_width: u32,
    /// Physical pixels of the host surface at the last accepted size.
    pub surface_size: UVec2,
}

impl RenderContext {
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        [self.camera, self.point_cloud]
            .into_iter()
            .chain(self.helpers.iter().map(|helper| helper.entity))
    }
}

fn has_area(surface: UVec2) -> bool {
    surface.x > 0 && surface.y > 0
}

/// Apply mount and unmount commands.
///
/// Mount starts the viewer when the host surface has area, otherwise it arms
/// a single deferred retry and waits. Unmount stops from any live state.
/// At most one transition is queued per frame; commands behind it wait until
/// the state has changed, so an unmount followed by a mount still tears down
/// before setting up again.
pub fn handle_lifecycle_events(
    mut events: EventReader<ViewerLifecycleEvent>,
    mut backlog: Local<VecDeque<ViewerLifecycleEvent>>,
    state: Res<State<ViewerState>>,
    mut next_state: ResMut<NextState<ViewerState>>,
    mut retry: ResMut<SurfaceRetry>,
    settings: Res<ViewerSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    backlog.extend(events.read().copied());
    let current = *state.get();

    while let Some(event) = backlog.pop_front() {
        let target = match (event, current) {
            (ViewerLifecycleEvent::Mount, ViewerState::Running) => {
                debug!("Mount ignored, viewer already running");
                continue;
            }
            (ViewerLifecycleEvent::Mount, ViewerState::WaitingForSurface) if retry.is_pending() => {
                debug!("Mount ignored, surface retry already pending");
                continue;
            }
            (ViewerLifecycleEvent::Mount, _) => {
                let surface = primary_surface_size(&windows);
                if has_area(surface) {
                    ViewerState::Running
                } else {
                    retry.arm(settings.surface_retry_delay());
                    info!(
                        "Host surface is {}x{}, retrying in {:?}",
                        surface.x,
                        surface.y,
                        settings.surface_retry_delay()
                    );
                    ViewerState::WaitingForSurface
                }
            }
            (
                ViewerLifecycleEvent::Unmount,
                ViewerState::Running | ViewerState::WaitingForSurface,
            ) => {
                retry.cancel();
                ViewerState::Stopped
            }
            (ViewerLifecycleEvent::Unmount, _) => continue,
        };

        if target != current {
            next_state.set(target);
            if !backlog.is_empty() {
                debug!("{} lifecycle command(s) deferred to next frame", backlog.len());
            }
            break;
        }
    }
}

/// Fire the deferred surface check. Still no area: stay idle until the next
/// mount command.
pub fn poll_surface_retry(
    time: Res<Time>,
    mut retry: ResMut<SurfaceRetry>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut next_state: ResMut<NextState<ViewerState>>,
    mut warnings: EventWriter<ViewerWarning>,
) {
    if !retry.tick(time.delta()) {
        return;
    }

    let surface = primary_surface_size(&windows);
    if has_area(surface) {
        info!("Host surface ready at {}x{}", surface.x, surface.y);
        next_state.set(ViewerState::Running);
    } else {
        warnings.write(ViewerWarning::new(
            "Host surface still has no area; waiting for the next mount",
        ));
    }
}

/// Create camera, helpers, point storage and GPU resources, subscribe to
/// resizes and request the first frame.
pub fn setup_viewer(
    mut commands: Commands,
    existing: Option<Res<RenderContext>>,
    settings: Res<ViewerSettings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut images: ResMut<Assets<Image>>,
    mut point_materials: ResMut<Assets<PointSpriteMaterial>>,
    mut helper_materials: ResMut<Assets<StandardMaterial>>,
    mut resize_listeners: ResMut<ResizeListenerRegistry>,
    mut frame_loop: ResMut<FrameLoop>,
) {
    if existing.is_some() {
        warn!("Viewer already initialised, skipping setup");
        return;
    }

    let surface = primary_surface_size(&windows);
    let camera = spawn_viewer_camera(&mut commands, &settings, surface);

    let helpers = vec![
        create_ground_grid(
            &mut commands,
            &mut meshes,
            &mut helper_materials,
            settings.grid_size,
            settings.grid_divisions,
        ),
        create_axes_indicator(
            &mut commands,
            &mut meshes,
            &mut helper_materials,
            settings.axes_length,
        ),
    ];

    let mut buffer = PointBuffer::allocate(settings.max_points(), settings.point_size)
        .with_capacity_limit(settings.max_point_capacity);
    let texture_layout = TextureLayout::for_capacity(buffer.capacity(), settings.source_width);
    let point_texture = images.add(create_point_texture(&buffer, texture_layout));
    // The texture above already holds the freshly allocated buffer.
    buffer.take_pending_sync();

    let point_material = point_materials.add(PointSpriteMaterial {
        point_texture: point_texture.clone(),
        params: PointSpriteParams::new(0, texture_layout.width, settings.point_size_scale),
    });
    let point_mesh = meshes.add(create_point_index_mesh(buffer.capacity()));

    let point_cloud = commands
        .spawn((
            Mesh3d(point_mesh.clone()),
            MeshMaterial3d(point_material.clone()),
            Transform::IDENTITY,
            Visibility::Visible,
            NoFrustumCulling,
            NotShadowCaster,
            PointCloud,
        ))
        .id();

    info!(
        "Viewer initialised: {} point capacity, surface {}x{}",
        buffer.capacity(),
        surface.x,
        surface.y
    );

    commands.insert_resource(RenderContext {
        camera,
        point_cloud,
        helpers,
        point_mesh,
        point_texture,
        point_material,
        texture_layout,
        source_width: settings.source_width,
        surface_size: surface,
    });
    commands.insert_resource(buffer);
    commands.insert_resource(resize_listeners.subscribe());
    frame_loop.request();
}

/// Release everything the viewer created. Safe to run any number of times.
pub fn teardown_viewer(world: &mut World) {
    if let Some(mut frame_loop) = world.get_resource_mut::<FrameLoop>() {
        frame_loop.cancel();
    }
    if let Some(mut retry) = world.get_resource_mut::<SurfaceRetry>() {
        retry.cancel();
    }
    if let Some(subscription) = world.remove_resource::<ResizeSubscription>() {
        if let Some(mut registry) = world.get_resource_mut::<ResizeListenerRegistry>() {
            registry.unsubscribe(&subscription);
        }
    }
    world.remove_resource::<PointBuffer>();

    let Some(context) = world.remove_resource::<RenderContext>() else {
        debug!("Teardown found nothing to release");
        return;
    };

    for entity in context.entities() {
        if let Ok(entity) = world.get_entity_mut(entity) {
            entity.despawn();
        }
    }

    if let Some(mut meshes) = world.get_resource_mut::<Assets<Mesh>>() {
        meshes.remove(&context.point_mesh);
        for helper in &context.helpers {
            meshes.remove(&helper.mesh);
        }
    }
    if let Some(mut materials) = world.get_resource_mut::<Assets<StandardMaterial>>() {
        for helper in &context.helpers {
            materials.remove(&helper.material);
        }
    }
    if let Some(mut materials) = world.get_resource_mut::<Assets<PointSpriteMaterial>>() {
        materials.remove(&context.point_material);
    }
    if let Some(mut images) = world.get_resource_mut::<Assets<Image>>() {
        images.remove(&context.point_texture);
    }

    info!("Viewer resources released");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_latch_arms_once_and_fires_once() {
        let mut retry = SurfaceRetry::default();
        assert!(retry.arm(Duration::from_millis(100)));
        assert!(!retry.arm(Duration::from_millis(100)));
        assert!(retry.is_pending());

        assert!(!retry.tick(Duration::from_millis(60)));
        assert!(retry.tick(Duration::from_millis(60)));
        assert!(!retry.is_pending());
        assert!(!retry.tick(Duration::from_millis(500)));
    }

    #[test]
    fn cancelled_retry_never_fires() {
        let mut retry = SurfaceRetry::default();
        retry.arm(Duration::from_millis(100));

        assert!(retry.cancel());
        assert!(!retry.cancel());
        assert!(!retry.tick(Duration::from_secs(1)));
    }
}
