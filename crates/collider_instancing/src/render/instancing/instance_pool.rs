//! Instance Pool
//!
//! Fixed-capacity, densely packed storage for the instances of one
//! (shape kind, palette bucket) pair.
//!
//! # Architecture
//!
//! ```text
//! slot:      0    1    2   ...  active_count-1 | unused ... capacity-1
//! owners:    h1   h2   h5  ...                 |
//! instances: M1   M2   M5  ...                 |
//! ```
//!
//! Slots `[0, active_count)` are always live. Freeing a slot moves the last
//! live instance into the hole (swap-remove) and reports the move, so the
//! registry can repoint the moved collider's descriptor.
//!
//! # Performance Characteristics
//!
//! - **Allocation**: O(1), never reallocates after construction
//! - **Free**: O(1) swap-remove
//! - **Upload**: the live prefix is one contiguous byte slice

use super::data_structures::{InstanceData, PoolKey};
use super::error::{InstancingError, InstancingResult};
use crate::foundation::math::Transform;
use crate::physics::ColliderHandle;

/// Instance moved by a swap-remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovedInstance {
    /// Collider whose instance moved
    pub handle: ColliderHandle,
    /// Slot it occupied (the old last active slot)
    pub from: usize,
    /// Slot it occupies now (the freed slot)
    pub to: usize,
}

/// Outcome of [`InstancePool::free`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRelocation {
    /// Collider that owned the freed slot
    pub freed: ColliderHandle,
    /// Instance relocated into the freed slot, if any
    pub moved: Option<MovedInstance>,
}

/// Statistics for one pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total slots allocated since creation
    pub total_allocated: u64,
    /// Total slots freed since creation
    pub total_freed: u64,
    /// Peak active count
    pub peak_active: usize,
    /// Allocation attempts rejected because the pool was full
    pub exhaustions: u64,
}

/// Fixed-capacity pool of instances for one pool key
#[derive(Debug)]
pub struct InstancePool {
    key: PoolKey,
    capacity: usize,
    /// Owner of each active slot
    owners: Vec<ColliderHandle>,
    /// CPU-side transform of each active slot
    transforms: Vec<Transform>,
    /// GPU instance data of each active slot
    instances: Vec<InstanceData>,
    dirty: bool,
    stats: PoolStats,
}

impl InstancePool {
    /// Create an empty pool; storage for `capacity` slots is reserved up front
    pub fn new(key: PoolKey, capacity: usize) -> Self {
        log::info!("Creating instance pool {} with capacity {}", key, capacity);

        Self {
            key,
            capacity,
            owners: Vec::with_capacity(capacity),
            transforms: Vec::with_capacity(capacity),
            instances: Vec::with_capacity(capacity),
            dirty: false,
            stats: PoolStats::default(),
        }
    }

    /// Claim the next slot for `owner`
    ///
    /// The new slot is always `active_count - 1` after the call.
    pub fn allocate(&mut self, owner: ColliderHandle, transform: Transform) -> InstancingResult<usize> {
        if self.is_full() {
            self.stats.exhaustions += 1;
            return Err(InstancingError::PoolExhausted {
                key: self.key,
                capacity: self.capacity,
            });
        }

        let slot = self.owners.len();
        self.owners.push(owner);
        self.transforms.push(transform);
        self.instances.push(InstanceData::from_transform(&transform));
        self.dirty = true;

        self.stats.total_allocated += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.active_count());

        log::trace!("Pool {} allocated slot {} for {}", self.key, slot, owner);
        Ok(slot)
    }

    /// Release a slot, keeping the active range dense
    ///
    /// The instance in the last active slot is moved into `slot` unless `slot`
    /// already is the last one. The returned relocation names the moved
    /// collider so the caller can update its recorded slot.
    pub fn free(&mut self, slot: usize) -> InstancingResult<SlotRelocation> {
        let active_count = self.active_count();
        if slot >= active_count {
            return Err(InstancingError::InvalidSlot { slot, active_count });
        }

        let last = active_count - 1;
        let freed = self.owners.swap_remove(slot);
        self.transforms.swap_remove(slot);
        self.instances.swap_remove(slot);
        self.dirty = true;
        self.stats.total_freed += 1;

        let moved = (slot != last).then(|| MovedInstance {
            handle: self.owners[slot],
            from: last,
            to: slot,
        });

        log::trace!("Pool {} freed slot {} (owner {}), moved {:?}", self.key, slot, freed, moved);
        Ok(SlotRelocation { freed, moved })
    }

    /// Overwrite the transform of an active slot in place
    pub fn write_transform(&mut self, slot: usize, transform: Transform) -> InstancingResult<()> {
        let active_count = self.active_count();
        if slot >= active_count {
            return Err(InstancingError::InvalidSlot { slot, active_count });
        }

        self.transforms[slot] = transform;
        self.instances[slot] = InstanceData::from_transform(&transform);
        self.dirty = true;
        Ok(())
    }

    /// Drop every instance; capacity and identity are kept
    pub fn clear(&mut self) {
        if !self.owners.is_empty() {
            self.dirty = true;
        }
        self.owners.clear();
        self.transforms.clear();
        self.instances.clear();
    }

    /// Key this pool serves
    pub fn key(&self) -> PoolKey {
        self.key
    }

    /// Fixed capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live slots
    pub fn active_count(&self) -> usize {
        self.owners.len()
    }

    /// Number of free slots
    pub fn available_count(&self) -> usize {
        self.capacity - self.active_count()
    }

    /// No live slots
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// No free slots
    pub fn is_full(&self) -> bool {
        self.active_count() >= self.capacity
    }

    /// Owner of an active slot
    pub fn owner(&self, slot: usize) -> Option<ColliderHandle> {
        self.owners.get(slot).copied()
    }

    /// Owners of the active slots, in slot order
    pub fn owners(&self) -> &[ColliderHandle] {
        &self.owners
    }

    /// Transform of an active slot
    pub fn transform(&self, slot: usize) -> Option<&Transform> {
        self.transforms.get(slot)
    }

    /// Instance data of the active slots
    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    /// Active instance data as raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Contents changed since the last [`mark_clean`](Self::mark_clean)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called after the renderer uploaded this pool
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Vec3};
    use crate::render::instancing::palette::{BodyCategory, PaletteBucket};
    use crate::render::instancing::shape_kind::ShapeKind;

    fn test_key() -> PoolKey {
        PoolKey::new(ShapeKind::Box, PaletteBucket::new(BodyCategory::Dynamic, 0))
    }

    fn at(x: f32) -> Transform {
        Transform::from_position_rotation(Vec3::new(x, 0.0, 0.0), Quat::identity())
    }

    fn h(raw: u32) -> ColliderHandle {
        ColliderHandle::from_raw(raw)
    }

    #[test]
    fn test_allocation_is_dense() {
        let mut pool = InstancePool::new(test_key(), 4);

        assert_eq!(pool.allocate(h(10), at(0.0)), Ok(0));
        assert_eq!(pool.allocate(h(11), at(1.0)), Ok(1));
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.available_count(), 2);
        assert_eq!(pool.owners(), &[h(10), h(11)]);
        assert!(pool.is_dirty());
    }

    #[test]
    fn test_swap_remove_middle() {
        let mut pool = InstancePool::new(test_key(), 4);
        pool.allocate(h(1), at(1.0)).expect("Should allocate A");
        pool.allocate(h(2), at(2.0)).expect("Should allocate B");
        pool.allocate(h(3), at(3.0)).expect("Should allocate C");

        let relocation = pool.free(1).expect("Should free B");
        assert_eq!(relocation.freed, h(2));
        assert_eq!(relocation.moved, Some(MovedInstance { handle: h(3), from: 2, to: 1 }));

        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.owners(), &[h(1), h(3)]);
        assert_eq!(pool.instances()[0].translation(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(pool.instances()[1].translation(), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_free_last_moves_nothing() {
        let mut pool = InstancePool::new(test_key(), 4);
        pool.allocate(h(1), at(1.0)).expect("Should allocate");
        pool.allocate(h(2), at(2.0)).expect("Should allocate");

        let relocation = pool.free(1).expect("Should free");
        assert_eq!(relocation.moved, None);
        assert_eq!(pool.owners(), &[h(1)]);
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = InstancePool::new(test_key(), 2);
        pool.allocate(h(1), at(0.0)).expect("Should allocate 1");
        pool.allocate(h(2), at(0.0)).expect("Should allocate 2");

        let result = pool.allocate(h(3), at(0.0));
        assert!(matches!(result, Err(InstancingError::PoolExhausted { capacity: 2, .. })));
        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.stats().exhaustions, 1);
    }

    #[test]
    fn test_invalid_slot() {
        let mut pool = InstancePool::new(test_key(), 2);
        pool.allocate(h(1), at(0.0)).expect("Should allocate");

        assert_eq!(pool.free(1), Err(InstancingError::InvalidSlot { slot: 1, active_count: 1 }));
        assert_eq!(
            pool.write_transform(5, at(0.0)),
            Err(InstancingError::InvalidSlot { slot: 5, active_count: 1 })
        );
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut pool = InstancePool::new(test_key(), 3);
        pool.allocate(h(1), at(0.0)).expect("Should allocate");
        pool.mark_clean();

        pool.clear();
        assert_eq!(pool.active_count(), 0);
        assert_eq!(pool.capacity(), 3);
        assert!(pool.is_dirty());
        assert_eq!(pool.as_bytes().len(), 0);
    }

    #[test]
    fn test_write_transform_marks_dirty() {
        let mut pool = InstancePool::new(test_key(), 2);
        pool.allocate(h(1), at(0.0)).expect("Should allocate");
        pool.mark_clean();
        assert!(!pool.is_dirty());

        pool.write_transform(0, at(5.0)).expect("Should write");
        assert!(pool.is_dirty());
        assert_eq!(pool.instances()[0].translation(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(pool.as_bytes().len(), 64);
    }
}
