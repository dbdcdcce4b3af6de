use bevy::prelude::*;
use serde::Serialize;

/// Viewer lifecycle. Mount moves out of `Uninitialized`/`Stopped`, unmount
/// always lands in `Stopped`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerState {
    #[default]
    Uninitialized,
    /// Host surface had zero width or height at mount; a single retry may be pending.
    WaitingForSurface,
    Running,
    Stopped,
}

/// Per-frame ordering of viewer work in `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    /// Mount/unmount handling and the surface retry.
    Lifecycle,
    /// Point upload, resize and camera, only while a frame is scheduled.
    Frame,
    /// Status, warning and fps notifications.
    Report,
}

/// Host-driven lifecycle commands.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerLifecycleEvent {
    Mount,
    Unmount,
}

/// Non-fatal problem surfaced to the log and to the host.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ViewerWarning {
    pub message: String,
}

impl ViewerWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Host-supplied activity flag. Reported in status only, never gates rendering.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerActive(pub bool);

/// Log every warning once, whether or not a host is listening.
pub fn log_viewer_warnings(mut warnings: EventReader<ViewerWarning>) {
    for warning in warnings.read() {
        warn!("{}", warning.message);
    }
}

pub fn log_state_transitions(mut transitions: EventReader<StateTransitionEvent<ViewerState>>) {
    for transition in transitions.read() {
        if let (Some(from), Some(to)) = (transition.exited, transition.entered) {
            if from != to {
                info!("→ Viewer {:?} → {:?}", from, to);
            }
        }
    }
}
