#![allow(dead_code)]

use std::time::Duration;

use bevy::diagnostic::DiagnosticsStore;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use bevy::window::{PrimaryWindow, WindowResized, WindowResolution};

use point_cloud_viewer::engine::core::app_setup::PointCloudViewerPlugin;
use point_cloud_viewer::engine::core::app_state::{ViewerLifecycleEvent, ViewerState};
use point_cloud_viewer::engine::core::settings::ViewerSettings;
use point_cloud_viewer::engine::shaders::PointSpriteMaterial;
use point_cloud_viewer::engine::systems::status_tracking::StatusReportingPlugin;
use point_cloud_viewer::rpc::web_rpc::WebRpcPlugin;

pub const SOURCE_WIDTH: u32 = 8;
pub const SOURCE_HEIGHT: u32 = 4;
pub const CAPACITY: usize = (SOURCE_WIDTH * SOURCE_HEIGHT) as usize;

/// Headless viewer: no renderer, a primary window of the given physical size
/// and 50 ms per update.
pub fn viewer_app(width: u32, height: u32) -> App {
    viewer_app_with(
        width,
        height,
        ViewerSettings {
            source_width: SOURCE_WIDTH,
            source_height: SOURCE_HEIGHT,
            ..default()
        },
    )
}

pub fn viewer_app_with(width: u32, height: u32, settings: ViewerSettings) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, AssetPlugin::default()))
        .init_asset::<Mesh>()
        .init_asset::<Image>()
        .init_asset::<StandardMaterial>()
        .init_asset::<PointSpriteMaterial>()
        .add_event::<MouseMotion>()
        .add_event::<MouseWheel>()
        .add_event::<WindowResized>()
        .init_resource::<ButtonInput<MouseButton>>()
        .init_resource::<ButtonInput<KeyCode>>()
        .init_resource::<DiagnosticsStore>()
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(50)))
        .insert_resource(settings)
        .add_plugins((PointCloudViewerPlugin, WebRpcPlugin, StatusReportingPlugin));

    app.world_mut().spawn((
        Window {
            resolution: WindowResolution::new(width as f32, height as f32),
            ..default()
        },
        PrimaryWindow,
    ));

    app
}

pub fn update_n(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

pub fn state(app: &App) -> ViewerState {
    *app.world().resource::<State<ViewerState>>().get()
}

pub fn send(app: &mut App, event: ViewerLifecycleEvent) {
    app.world_mut().send_event(event);
}

/// Mount and run until the viewer is up.
pub fn mounted_app(width: u32, height: u32) -> App {
    let mut app = viewer_app(width, height);
    send(&mut app, ViewerLifecycleEvent::Mount);
    update_n(&mut app, 3);
    assert_eq!(state(&app), ViewerState::Running);
    app
}

/// Change the primary window's physical size and announce it.
pub fn resize_window(app: &mut App, width: u32, height: u32) {
    let world = app.world_mut();
    let mut windows = world.query_filtered::<(Entity, &mut Window), With<PrimaryWindow>>();
    let Ok((entity, mut window)) = windows.single_mut(world) else {
        panic!("primary window missing");
    };
    window.resolution.set_physical_resolution(width, height);
    world.send_event(WindowResized {
        window: entity,
        width: width as f32,
        height: height as f32,
    });
}
