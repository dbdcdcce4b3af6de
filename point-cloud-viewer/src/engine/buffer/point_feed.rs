use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use super::point_buffer::{PointBuffer, PointUpdate};
use crate::engine::core::app_state::ViewerWarning;

/// Single-slot hand-off between an external point producer and the render loop.
///
/// Producers may call [`PointFeed::submit`] from any thread. Only the most
/// recent snapshot is kept: a snapshot that has not been consumed by the next
/// frame is replaced (last write wins). The render loop copies the snapshot
/// into the [`PointBuffer`], so producers never hold a reference into it.
#[derive(Resource, Clone, Default)]
pub struct PointFeed(Arc<Mutex<Option<Vec<f32>>>>);

impl PointFeed {
    /// Offer a new snapshot of flat xyz triples. Empty snapshots mean "no
    /// update this cycle" and are ignored, so they never displace real data.
    pub fn submit(&self, points: Vec<f32>) {
        if points.is_empty() {
            return;
        }
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(points);
        }
    }

    /// Take the pending snapshot, leaving the slot empty.
    pub fn take(&self) -> Option<Vec<f32>> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }

    pub fn has_pending(&self) -> bool {
        self.0.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

/// Copy the latest producer snapshot into the point buffer.
pub fn apply_point_updates(
    feed: Res<PointFeed>,
    buffer: Option<ResMut<PointBuffer>>,
    mut warnings: EventWriter<ViewerWarning>,
) {
    let Some(mut buffer) = buffer else {
        return;
    };
    let Some(points) = feed.take() else {
        return;
    };

    match buffer.update(&points) {
        Ok(PointUpdate::Reallocated { capacity }) => {
            info!("Point buffer grown to {} points", capacity);
        }
        Ok(PointUpdate::Copied { draw_count }) => {
            debug!("Point buffer updated, drawing {} points", draw_count);
        }
        Ok(PointUpdate::Unchanged) => {}
        Err(error) => {
            warnings.write(ViewerWarning::new(format!("Point update rejected: {error}")));
        }
    }
}
