use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
// Crate engine modules
use crate::engine::buffer::gpu_sync::{PointTextureSyncPlugin, sync_point_buffer};
use crate::engine::buffer::point_feed::{PointFeed, apply_point_updates};
use crate::engine::camera::viewport_camera::{advance_orbit_controller, orbit_input};
use crate::engine::core::app_state::{
    ViewerActive, ViewerLifecycleEvent, ViewerSet, ViewerState, ViewerWarning,
    log_state_transitions, log_viewer_warnings,
};
use crate::engine::core::frame_loop::{FrameLoop, end_frame, frame_scheduled};
use crate::engine::core::lifecycle::{
    SurfaceRetry, handle_lifecycle_events, poll_surface_retry, setup_viewer, teardown_viewer,
};
use crate::engine::core::resize::{ResizeListenerRegistry, ResizeSubscription, handle_window_resize};
use crate::engine::core::settings::{SettingsPlugin, ViewerSettings, settings_resolved};
use crate::engine::core::window_config::create_window_config;
#[cfg(target_arch = "wasm32")]
use crate::engine::core::window_config::cap_pixel_ratio;
use crate::engine::shaders::PointSpriteMaterial;
use crate::engine::systems::status_tracking::StatusReportingPlugin;
// Web RPC modules
use crate::rpc::web_rpc::{RpcSet, WebRpcPlugin};

/// Quiet the GPU stack, keep viewer lifecycle logs.
const LOG_FILTER: &str = "wgpu=error,naga=warn,point_cloud_viewer=info";

/// Lifecycle state machine, render loop and per-frame viewer systems.
///
/// Rendering itself is left to the host app's plugins, so this also runs in
/// headless apps.
pub struct PointCloudViewerPlugin;

impl Plugin for PointCloudViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<ViewerState>()
            .init_resource::<ViewerSettings>()
            .init_resource::<ViewerActive>()
            .init_resource::<PointFeed>()
            .init_resource::<FrameLoop>()
            .init_resource::<SurfaceRetry>()
            .init_resource::<ResizeListenerRegistry>()
            .add_event::<ViewerLifecycleEvent>()
            .add_event::<ViewerWarning>()
            .configure_sets(
                Update,
                (
                    RpcSet::Receive,
                    ViewerSet::Lifecycle,
                    ViewerSet::Frame,
                    ViewerSet::Report,
                    RpcSet::Send,
                )
                    .chain(),
            )
            .add_plugins(PointTextureSyncPlugin);

        app.add_systems(OnEnter(ViewerState::Running), setup_viewer)
            .add_systems(OnEnter(ViewerState::Stopped), teardown_viewer);

        app.add_systems(
            Update,
            (
                handle_lifecycle_events,
                poll_surface_retry.run_if(in_state(ViewerState::WaitingForSurface)),
            )
                .chain()
                .in_set(ViewerSet::Lifecycle),
        );

        // One pass of the render loop. Bevy draws after Update; end_frame
        // re-arms the next pass.
        app.add_systems(
            Update,
            (
                apply_point_updates,
                sync_point_buffer,
                handle_window_resize.run_if(resource_exists::<ResizeSubscription>),
                orbit_input,
                advance_orbit_controller,
            )
                .chain()
                .in_set(ViewerSet::Frame)
                .run_if(in_state(ViewerState::Running))
                .run_if(frame_scheduled),
        )
        .add_systems(
            PostUpdate,
            end_frame.run_if(in_state(ViewerState::Running)),
        );

        app.add_systems(Update, (log_viewer_warnings, log_state_transitions));
    }
}

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        // The point mesh carries no positions, so it cannot feed depth-only passes.
        .add_plugins(MaterialPlugin::<PointSpriteMaterial> {
            prepass_enabled: false,
            shadows_enabled: false,
            ..default()
        })
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(SettingsPlugin)
        .add_plugins(PointCloudViewerPlugin)
        .add_plugins(WebRpcPlugin)
        .add_plugins(StatusReportingPlugin);

    // Mount once the settings file has been applied or given up on.
    app.add_systems(
        Update,
        request_initial_mount
            .run_if(settings_resolved)
            .before(ViewerSet::Lifecycle),
    );

    // Native windows would shrink under an override; only the canvas is capped.
    #[cfg(target_arch = "wasm32")]
    app.add_systems(PreUpdate, cap_pixel_ratio);

    app
}

fn request_initial_mount(
    mut mounted: Local<bool>,
    mut lifecycle: EventWriter<ViewerLifecycleEvent>,
) {
    if !*mounted {
        *mounted = true;
        lifecycle.write(ViewerLifecycleEvent::Mount);
    }
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: LOG_FILTER.to_string(),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
