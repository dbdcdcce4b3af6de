use std::ops::Range;

use bevy::prelude::*;
use constants::texture::MAX_POINT_CAPACITY;
use thiserror::Error;

/// Rejected point snapshot. The buffer is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointUpdateError {
    #[error("point snapshot has {len} floats, expected a multiple of 3")]
    Misaligned { len: usize },
    #[error("point snapshot has {points} points, more than the {limit} the GPU can address")]
    ExceedsLimit { points: usize, limit: usize },
}

/// What an accepted update did to the storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointUpdate {
    /// Empty snapshot: previous data and draw range persist.
    Unchanged,
    /// Copied into existing storage from offset 0.
    Copied { draw_count: usize },
    /// Storage grew to exactly fit the snapshot.
    Reallocated { capacity: usize },
}

/// GPU work owed after one or more updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingSync {
    /// Same-sized storage, texel data needs re-uploading.
    Partial,
    /// Storage was replaced; GPU bindings must be rebuilt.
    Reallocated,
}

/// Grow-only point storage backing the point cloud drawable.
///
/// Positions are packed as xyz triples, sizes as one float per point. Only the
/// leading `draw_count` points are rendered; anything past the draw range stays
/// in memory but is never drawn.
///
/// Updates are expected to be serialised by the caller (the render loop applies
/// at most one snapshot per frame); no internal locking is done.
#[derive(Resource, Debug, Clone)]
pub struct PointBuffer {
    positions: Vec<f32>,
    sizes: Vec<f32>,
    draw_count: usize,
    default_size: f32,
    capacity_limit: usize,
    pending_sync: Option<PendingSync>,
}

impl PointBuffer {
    /// Reserve storage for `capacity` points at the origin with the default size.
    pub fn allocate(capacity: usize, default_size: f32) -> Self {
        Self {
            positions: vec![0.0; capacity * 3],
            sizes: vec![default_size; capacity],
            draw_count: 0,
            default_size,
            capacity_limit: MAX_POINT_CAPACITY,
            // First upload after allocation.
            pending_sync: Some(PendingSync::Reallocated),
        }
    }

    /// Lower the growth ceiling below the texture limit.
    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity_limit = limit.min(MAX_POINT_CAPACITY);
        self
    }

    pub fn capacity_limit(&self) -> usize {
        self.capacity_limit
    }

    pub fn capacity(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    pub fn draw_range(&self) -> Range<usize> {
        0..self.draw_count
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn default_size(&self) -> f32 {
        self.default_size
    }

    /// Apply a snapshot of flat xyz triples.
    ///
    /// The draw range always becomes `points.len() / 3`. If the snapshot holds
    /// more points than the current capacity, both position and size storage
    /// are reallocated to exactly fit it; new sizes take the default value.
    /// Snapshots past the capacity limit are refused.
    pub fn update(&mut self, points: &[f32]) -> Result<PointUpdate, PointUpdateError> {
        if points.is_empty() {
            return Ok(PointUpdate::Unchanged);
        }
        if points.len() % 3 != 0 {
            return Err(PointUpdateError::Misaligned { len: points.len() });
        }

        let required = points.len() / 3;
        if required > self.capacity_limit {
            return Err(PointUpdateError::ExceedsLimit {
                points: required,
                limit: self.capacity_limit,
            });
        }

        let outcome = if required > self.capacity() {
            self.positions = points.to_vec();
            self.sizes.resize(required, self.default_size);
            self.pending_sync = Some(PendingSync::Reallocated);
            PointUpdate::Reallocated { capacity: required }
        } else {
            self.positions[..points.len()].copy_from_slice(points);
            // A pending reallocation already covers the new data.
            self.pending_sync.get_or_insert(PendingSync::Partial);
            PointUpdate::Copied {
                draw_count: required,
            }
        };

        self.draw_count = required;
        Ok(outcome)
    }

    pub fn needs_sync(&self) -> bool {
        self.pending_sync.is_some()
    }

    pub fn pending_sync(&self) -> Option<PendingSync> {
        self.pending_sync
    }

    /// Hand the owed GPU work to the uploader, clearing it.
    pub fn take_pending_sync(&mut self) -> Option<PendingSync> {
        self.pending_sync.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSOR_POINTS: usize = 1280 * 720;

    #[test]
    fn allocate_zeroes_positions_and_sets_default_sizes() {
        let buffer = PointBuffer::allocate(4, 1.5);

        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.draw_count(), 0);
        assert!(buffer.positions().iter().all(|&v| v == 0.0));
        assert_eq!(buffer.sizes(), &[1.5; 4]);
        assert_eq!(buffer.pending_sync(), Some(PendingSync::Reallocated));
    }

    #[test]
    fn update_within_capacity_copies_from_offset_zero() {
        let mut buffer = PointBuffer::allocate(SENSOR_POINTS, 1.5);
        buffer.take_pending_sync();

        let first = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert_eq!(
            buffer.update(&first),
            Ok(PointUpdate::Copied { draw_count: 3 })
        );
        assert_eq!(buffer.draw_range(), 0..3);
        assert_eq!(&buffer.positions()[..9], &first);
        assert_eq!(buffer.capacity(), SENSOR_POINTS);
        assert!(buffer.positions()[9..].iter().all(|&v| v == 0.0));
        assert_eq!(buffer.take_pending_sync(), Some(PendingSync::Partial));

        let second = [2.0, 2.0, 2.0, 3.0, 3.0, 3.0];
        buffer.update(&second).unwrap();
        assert_eq!(buffer.draw_count(), 2);
        assert_eq!(&buffer.positions()[..6], &second);
        // Third point survives in storage, outside the draw range.
        assert_eq!(&buffer.positions()[6..9], &[0.0, 1.0, 0.0]);
        assert!(!buffer.draw_range().contains(&2));
    }

    #[test]
    fn update_beyond_capacity_grows_both_arrays_exactly() {
        let mut buffer = PointBuffer::allocate(2, 1.5);
        buffer.take_pending_sync();

        let points: Vec<f32> = (0..15).map(|v| v as f32).collect();
        assert_eq!(
            buffer.update(&points),
            Ok(PointUpdate::Reallocated { capacity: 5 })
        );
        assert_eq!(buffer.capacity(), 5);
        assert_eq!(buffer.sizes().len(), 5);
        assert_eq!(buffer.sizes()[4], 1.5);
        assert_eq!(buffer.draw_count(), 5);
        assert_eq!(buffer.positions(), points.as_slice());
        assert_eq!(buffer.take_pending_sync(), Some(PendingSync::Reallocated));
    }

    #[test]
    fn empty_update_leaves_state_untouched() {
        let mut buffer = PointBuffer::allocate(3, 1.5);
        buffer.update(&[1.0, 2.0, 3.0]).unwrap();
        buffer.take_pending_sync();
        let before = buffer.positions().to_vec();

        assert_eq!(buffer.update(&[]), Ok(PointUpdate::Unchanged));
        assert_eq!(buffer.draw_count(), 1);
        assert_eq!(buffer.positions(), before.as_slice());
        assert!(!buffer.needs_sync());
    }

    #[test]
    fn misaligned_update_is_rejected_without_mutation() {
        let mut buffer = PointBuffer::allocate(3, 1.5);
        buffer.update(&[1.0, 2.0, 3.0]).unwrap();
        buffer.take_pending_sync();

        assert_eq!(
            buffer.update(&[9.0, 9.0, 9.0, 9.0]),
            Err(PointUpdateError::Misaligned { len: 4 })
        );
        assert_eq!(buffer.draw_count(), 1);
        assert_eq!(&buffer.positions()[..3], &[1.0, 2.0, 3.0]);
        assert!(!buffer.needs_sync());
    }

    #[test]
    fn reallocation_is_not_downgraded_by_a_later_copy() {
        let mut buffer = PointBuffer::allocate(1, 1.5);
        buffer.take_pending_sync();

        buffer.update(&[0.0; 6]).unwrap();
        buffer.update(&[1.0; 3]).unwrap();
        assert_eq!(buffer.take_pending_sync(), Some(PendingSync::Reallocated));
        assert_eq!(buffer.take_pending_sync(), None);
    }

    #[test]
    fn growth_stops_at_capacity_limit() {
        let mut buffer = PointBuffer::allocate(2, 1.5).with_capacity_limit(4);
        buffer.update(&[1.0; 6]).unwrap();
        buffer.take_pending_sync();

        assert_eq!(
            buffer.update(&[0.0; 12]),
            Ok(PointUpdate::Reallocated { capacity: 4 })
        );
        buffer.take_pending_sync();

        assert_eq!(
            buffer.update(&[5.0; 15]),
            Err(PointUpdateError::ExceedsLimit { points: 5, limit: 4 })
        );
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.draw_count(), 4);
        assert!(!buffer.needs_sync());
    }

    #[test]
    fn limit_never_exceeds_texture_addressing() {
        let buffer = PointBuffer::allocate(1, 1.5).with_capacity_limit(usize::MAX);
        assert_eq!(buffer.capacity_limit(), MAX_POINT_CAPACITY);
    }
}
