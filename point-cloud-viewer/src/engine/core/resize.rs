use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::engine::camera::viewport_camera::aspect_ratio;
use crate::engine::core::lifecycle::RenderContext;

/// Proof of a live resize listener. Held as a resource while the viewer runs;
/// handing it back to the registry releases the listener.
#[derive(Resource, Debug, PartialEq, Eq)]
pub struct ResizeSubscription {
    id: u64,
}

impl ResizeSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Book-keeping of active resize listeners.
#[derive(Resource, Debug, Default)]
pub struct ResizeListenerRegistry {
    active: Vec<u64>,
    next_id: u64,
}

impl ResizeListenerRegistry {
    pub fn subscribe(&mut self) -> ResizeSubscription {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(id);
        ResizeSubscription { id }
    }

    /// Returns false if the subscription was already released.
    pub fn unsubscribe(&mut self, subscription: &ResizeSubscription) -> bool {
        let before = self.active.len();
        self.active.retain(|&id| id != subscription.id);
        self.active.len() != before
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Physical pixel size of the primary window, zero if there is none.
pub fn primary_surface_size(windows: &Query<&Window, With<PrimaryWindow>>) -> UVec2 {
    windows
        .single()
        .map(|window| window.physical_size())
        .unwrap_or(UVec2::ZERO)
}

/// Keep the camera aspect in step with the host surface. Zero-height
/// surfaces are skipped; the point buffer is never touched.
pub fn handle_window_resize(
    mut resize_events: EventReader<WindowResized>,
    windows: Query<&Window, With<PrimaryWindow>>,
    context: Option<ResMut<RenderContext>>,
    mut projections: Query<&mut Projection>,
) {
    if resize_events.read().last().is_none() {
        return;
    }
    let Some(mut context) = context else {
        return;
    };

    let surface = primary_surface_size(&windows);
    let Some(aspect) = aspect_ratio(surface) else {
        debug!("Ignoring resize to {}x{}", surface.x, surface.y);
        return;
    };

    context.surface_size = surface;
    if let Ok(mut projection) = projections.get_mut(context.camera) {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.aspect_ratio = aspect;
        }
    }
}
