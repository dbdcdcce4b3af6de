use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use serde::Serialize;

use crate::engine::buffer::point_buffer::PointBuffer;
use crate::engine::core::app_state::{ViewerActive, ViewerSet, ViewerState, ViewerWarning};
use crate::engine::core::frame_loop::FrameLoop;
use crate::rpc::web_rpc::WebRpcInterface;

/// Seconds between fps notifications.
const FPS_NOTIFY_INTERVAL: f32 = 0.5;

/// Snapshot of the viewer reported to the host.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ViewerStatus {
    pub is_active: bool,
    pub state: ViewerState,
    pub draw_count: usize,
    pub capacity: usize,
    pub frames_rendered: u64,
    pub fps: Option<f64>,
}

impl ViewerStatus {
    pub fn collect(
        state: ViewerState,
        active: ViewerActive,
        buffer: Option<&PointBuffer>,
        frame_loop: &FrameLoop,
        diagnostics: &DiagnosticsStore,
    ) -> Self {
        Self {
            is_active: active.0,
            state,
            draw_count: buffer.map_or(0, PointBuffer::draw_count),
            capacity: buffer.map_or(0, PointBuffer::capacity),
            frames_rendered: frame_loop.frames_rendered(),
            fps: smoothed_fps(diagnostics),
        }
    }
}

pub fn smoothed_fps(diagnostics: &DiagnosticsStore) -> Option<f64> {
    diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
}

/// Push `viewer_status` whenever the lifecycle state or activity flag changes.
pub fn status_notification_system(
    state: Res<State<ViewerState>>,
    active: Res<ViewerActive>,
    buffer: Option<Res<PointBuffer>>,
    frame_loop: Res<FrameLoop>,
    diagnostics: Res<DiagnosticsStore>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut last_reported: Local<Option<(ViewerState, bool)>>,
) {
    let current = (*state.get(), active.0);
    if *last_reported == Some(current) {
        return;
    }
    *last_reported = Some(current);

    let status = ViewerStatus::collect(
        current.0,
        *active,
        buffer.as_deref(),
        &frame_loop,
        &diagnostics,
    );
    match serde_json::to_value(&status) {
        Ok(params) => rpc_interface.send_notification("viewer_status", params),
        Err(error) => error!("Failed to serialise viewer status: {}", error),
    }
}

/// Forward viewer warnings to the host.
pub fn warning_notification_system(
    mut warnings: EventReader<ViewerWarning>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for warning in warnings.read() {
        rpc_interface.send_notification(
            "viewer_warning",
            serde_json::json!({
                "message": warning.message
            }),
        );
    }
}

pub fn fps_notification_system(
    mut rpc_interface: ResMut<WebRpcInterface>,
    diagnostics: Res<DiagnosticsStore>,
    mut last_send_time: Local<f32>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();

    if current_time - *last_send_time >= FPS_NOTIFY_INTERVAL {
        if let Some(value) = smoothed_fps(&diagnostics) {
            rpc_interface.send_notification(
                "fps_update",
                serde_json::json!({
                    "fps": value as f32
                }),
            );
            *last_send_time = current_time;
        }
    }
}

/// Registers the host notifications.
pub struct StatusReportingPlugin;

impl Plugin for StatusReportingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                warning_notification_system,
                status_notification_system,
                fps_notification_system.run_if(in_state(ViewerState::Running)),
            )
                .in_set(ViewerSet::Report),
        );
    }
}
