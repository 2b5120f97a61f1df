//! Instance Registry
//!
//! Maps collider handles to the pool and slot holding their instance.
//!
//! # Architecture
//!
//! ```text
//! ColliderHandle ──► InstanceDescriptor { pool: PoolId, slot }
//!                              │
//!                              ▼
//!     SlotMap<PoolId, InstancePool>  ◄── HashMap<PoolKey, PoolId>
//! ```
//!
//! - Pools are created lazily per (shape kind, palette bucket) and are never
//!   destroyed; a reset only clears their occupancy.
//! - Complex shapes go to the [`FallbackStore`] owned by the registry.
//! - Colliders deliberately left unrendered (full pool, unsupported shape) are
//!   remembered as *dropped* so frame sync can tell them apart from missed
//!   registrations.
//! - One highlight pool of capacity 1 exists per shape kind; at most one of
//!   them is occupied at any time.
//!
//! Callers only ever hold collider handles. Slot indices move on removal and
//! are fixed up here.

use super::data_structures::{InstanceDescriptor, PoolId, PoolKey};
use super::error::{InstancingError, InstancingResult};
use super::fallback::FallbackStore;
use super::frame_data::{FrameData, HighlightInstance, InstanceBatch};
use super::instance_pool::InstancePool;
use super::palette::{BodyCategory, Palette, PaletteBucket};
use super::shape_kind::{classify, instance_scale, ShapeKind};
use crate::config::InstancingConfig;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::{ColliderHandle, ColliderShape, ColliderView};
use rand::Rng;
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};

/// Capacity of each per-shape highlight pool
const HIGHLIGHT_CAPACITY: usize = 1;

/// Where a collider's renderable lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    /// In an instance pool
    Instanced,
    /// In the fallback store
    Fallback,
    /// Registered but deliberately not rendered
    Dropped,
    /// Not registered at all
    Untracked,
}

/// Statistics for the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Colliders registered since creation (instanced and fallback)
    pub total_added: u64,
    /// Colliders removed since creation
    pub total_removed: u64,
    /// Registrations rejected by a full pool
    pub pool_exhaustions: u64,
    /// Colliders currently registered but not rendered
    pub dropped: usize,
    /// Peak number of rendered colliders
    pub peak_live: usize,
    /// Pools created so far, highlight pools included
    pub pools: usize,
}

/// Top-level map from collider handle to renderable
#[derive(Debug)]
pub struct InstanceRegistry {
    pool_capacity: usize,
    palette: Palette,
    pools: SlotMap<PoolId, InstancePool>,
    pool_index: HashMap<PoolKey, PoolId>,
    descriptors: HashMap<ColliderHandle, InstanceDescriptor>,
    fallback: FallbackStore,
    dropped: HashSet<ColliderHandle>,
    highlighted: Option<ColliderHandle>,
    stats: RegistryStats,
}

impl InstanceRegistry {
    /// Create an empty registry
    pub fn new(pool_capacity: usize, palette: Palette) -> Self {
        log::info!("Creating InstanceRegistry with pool capacity {}", pool_capacity);

        Self {
            pool_capacity,
            palette,
            pools: SlotMap::with_key(),
            pool_index: HashMap::new(),
            descriptors: HashMap::new(),
            fallback: FallbackStore::new(),
            dropped: HashSet::new(),
            highlighted: None,
            stats: RegistryStats::default(),
        }
    }

    /// Create a registry from configuration
    pub fn from_config(config: &InstancingConfig) -> Self {
        Self::new(config.pool_capacity, Palette::new(config.palette.clone()))
    }

    /// Register a live collider, routing it to a pool or the fallback store
    ///
    /// Unsupported shapes and full pools leave the collider dropped: the error
    /// is returned for reporting, but the handle counts as registered.
    pub fn register<R: Rng>(&mut self, view: &ColliderView<'_>, rng: &mut R) -> InstancingResult<()> {
        let handle = view.handle;
        self.ensure_unregistered(handle)?;

        let shape_type = view.shape.shape_type();
        let shape_kind = match classify(shape_type) {
            Ok(kind) => kind,
            Err(shape_type) => {
                log::warn!("Skipping {}: shape {} has no renderable form", handle, shape_type);
                self.drop_collider(handle);
                return Err(InstancingError::UnsupportedShape { handle, shape_type });
            }
        };

        let category = BodyCategory::of(view);
        if shape_kind.is_instanced() {
            let scale = instance_scale(view.shape).unwrap_or_else(|| Vec3::repeat(1.0));
            self.add_collider(handle, shape_kind, category, Transform::new(view.position, view.rotation, scale), rng)
        } else {
            self.add_complex(handle, view.shape, category, view.position, view.rotation, rng)
        }
    }

    /// Allocate an instance for a collider drawn from a shape template
    ///
    /// `initial.scale` is the template scale, fixed for the collider's
    /// lifetime.
    pub fn add_collider<R: Rng>(
        &mut self,
        handle: ColliderHandle,
        shape_kind: ShapeKind,
        category: BodyCategory,
        initial: Transform,
        rng: &mut R,
    ) -> InstancingResult<()> {
        self.ensure_unregistered(handle)?;
        if !shape_kind.is_instanced() {
            return Err(InstancingError::InvalidRegistration {
                handle,
                reason: "complex shapes go through add_complex",
            });
        }
        if category == BodyCategory::Highlighted {
            return Err(InstancingError::InvalidRegistration {
                handle,
                reason: "the highlighted category is an overlay, not a registration category",
            });
        }

        let bucket = self.palette.bucket_for(category, rng);
        let key = PoolKey::new(shape_kind, bucket);
        let pool_id = self.pool_for(key, self.pool_capacity);
        let pool = &mut self.pools[pool_id];

        let slot = match pool.allocate(handle, initial) {
            Ok(slot) => slot,
            Err(err) => {
                log::warn!("Dropping {} from rendering: {}", handle, err);
                self.stats.pool_exhaustions += 1;
                self.drop_collider(handle);
                return Err(err);
            }
        };

        self.descriptors.insert(
            handle,
            InstanceDescriptor {
                shape_kind,
                bucket,
                pool: pool_id,
                slot,
                scale: initial.scale,
                highlighted: false,
            },
        );
        self.record_added();

        log::trace!("Registered {} in pool {} slot {}", handle, key, slot);
        Ok(())
    }

    /// Build a dedicated renderable for a complex collider
    pub fn add_complex<R: Rng>(
        &mut self,
        handle: ColliderHandle,
        shape: &ColliderShape,
        category: BodyCategory,
        position: Vec3,
        rotation: Quat,
        rng: &mut R,
    ) -> InstancingResult<()> {
        self.ensure_unregistered(handle)?;

        let bucket = self.palette.bucket_for(category, rng);
        let color = self.palette.color(bucket);
        let transform = Transform::from_position_rotation(position, rotation);

        match self.fallback.add_complex(handle, shape, bucket, color, transform) {
            Ok(()) => {
                self.record_added();
                Ok(())
            }
            Err(err) => {
                log::warn!("Dropping {} from rendering: {}", handle, err);
                self.drop_collider(handle);
                Err(err)
            }
        }
    }

    /// Forget a collider and release its slot or renderable
    ///
    /// The last instance of the owning pool moves into the freed slot and its
    /// descriptor is repointed, so no other collider changes appearance.
    pub fn remove_collider(&mut self, handle: ColliderHandle) -> InstancingResult<()> {
        if self.highlighted == Some(handle) {
            self.clear_highlight();
        }

        if let Some(descriptor) = self.descriptors.get(&handle).copied() {
            let pool = self
                .pools
                .get_mut(descriptor.pool)
                .ok_or(InstancingError::UnknownHandle(handle))?;
            let relocation = pool.free(descriptor.slot)?;
            self.descriptors.remove(&handle);

            if let Some(moved) = relocation.moved {
                match self.descriptors.get_mut(&moved.handle) {
                    Some(moved_descriptor) if moved_descriptor.pool == descriptor.pool => {
                        moved_descriptor.slot = moved.to;
                    }
                    _ => log::error!(
                        "Pool {} moved {} from slot {} to {} but it has no matching descriptor",
                        descriptor.pool_key(),
                        moved.handle,
                        moved.from,
                        moved.to
                    ),
                }
            }

            self.stats.total_removed += 1;
            log::trace!("Removed {} from pool {}", handle, descriptor.pool_key());
            return Ok(());
        }

        if self.fallback.remove(handle).is_ok() {
            self.stats.total_removed += 1;
            return Ok(());
        }

        if self.dropped.remove(&handle) {
            self.stats.dropped = self.dropped.len();
            return Ok(());
        }

        log::warn!("Cannot remove {}: not registered", handle);
        Err(InstancingError::UnknownHandle(handle))
    }

    /// Write a collider's current pose into its slot or renderable
    ///
    /// Dropped colliders accept the update and ignore it.
    pub fn update_transform(&mut self, handle: ColliderHandle, position: Vec3, rotation: Quat) -> InstancingResult<()> {
        if let Some(descriptor) = self.descriptors.get(&handle) {
            let transform = Transform::new(position, rotation, descriptor.scale);
            self.pools
                .get_mut(descriptor.pool)
                .ok_or(InstancingError::UnknownHandle(handle))?
                .write_transform(descriptor.slot, transform)?;

            if descriptor.highlighted {
                let key = PoolKey::new(descriptor.shape_kind, PaletteBucket::highlighted());
                if let Some(pool) = self.pool_index.get(&key).and_then(|&id| self.pools.get_mut(id)) {
                    pool.write_transform(0, transform)?;
                }
            }
            return Ok(());
        }

        if self.fallback.contains(handle) {
            return self.fallback.update_transform(handle, position, rotation);
        }

        if self.dropped.contains(&handle) {
            return Ok(());
        }

        log::warn!("Ignoring transform update for unregistered {}", handle);
        Err(InstancingError::UnknownHandle(handle))
    }

    /// Move the highlight overlay to a collider, or clear it with `None`
    ///
    /// Fixed and kinematic colliders are never highlighted; requesting one
    /// only clears the previous highlight.
    pub fn set_highlighted(&mut self, handle: Option<ColliderHandle>) -> InstancingResult<()> {
        self.clear_highlight();

        let Some(handle) = handle else {
            return Ok(());
        };

        if let Some(descriptor) = self.descriptors.get(&handle).copied() {
            if !descriptor.bucket.category.is_highlightable() {
                log::debug!("Not highlighting {}: {} geometry", handle, descriptor.bucket.category);
                return Ok(());
            }

            let transform = self
                .transform_of(handle)
                .copied()
                .ok_or(InstancingError::UnknownHandle(handle))?;

            let key = PoolKey::new(descriptor.shape_kind, PaletteBucket::highlighted());
            let pool_id = self.pool_for(key, HIGHLIGHT_CAPACITY);
            self.pools[pool_id].allocate(handle, transform)?;

            if let Some(descriptor) = self.descriptors.get_mut(&handle) {
                descriptor.highlighted = true;
            }
            self.highlighted = Some(handle);
            return Ok(());
        }

        if let Some(renderable) = self.fallback.get(handle) {
            if !renderable.bucket.category.is_highlightable() {
                log::debug!("Not highlighting {}: {} geometry", handle, renderable.bucket.category);
                return Ok(());
            }
            self.fallback.set_highlighted(handle, true)?;
            self.highlighted = Some(handle);
            return Ok(());
        }

        if self.dropped.contains(&handle) {
            return Ok(());
        }

        Err(InstancingError::UnknownHandle(handle))
    }

    /// Clear all occupancy for a simulation restart
    ///
    /// Pools keep their identity and capacity; only their contents go.
    pub fn reset(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.descriptors.clear();
        self.fallback.clear();
        self.dropped.clear();
        self.highlighted = None;
        self.stats.dropped = 0;

        log::debug!("InstanceRegistry reset ({} pools retained)", self.pools.len());
    }

    /// Renderer view of every pool, the fallback renderables and the highlight
    pub fn frame_data(&self) -> FrameData<'_> {
        let mut batches: Vec<InstanceBatch<'_>> = self
            .pools
            .values()
            .filter(|pool| pool.key().bucket.category != BodyCategory::Highlighted)
            .map(|pool| InstanceBatch {
                key: pool.key(),
                color: self.palette.color(pool.key().bucket),
                capacity: pool.capacity(),
                active_count: pool.active_count(),
                instances: pool.instances(),
                dirty: pool.is_dirty(),
            })
            .collect();
        batches.sort_by_key(|batch| batch.key);

        let mut fallbacks: Vec<_> = self.fallback.iter().collect();
        fallbacks.sort_by_key(|renderable| renderable.handle);

        let highlight = self
            .pools
            .values()
            .filter(|pool| pool.key().bucket.category == BodyCategory::Highlighted)
            .find_map(|pool| {
                pool.instances().first().map(|instance| HighlightInstance {
                    shape_kind: pool.key().shape_kind,
                    color: self.palette.color(pool.key().bucket),
                    instance: *instance,
                })
            });

        FrameData {
            batches,
            fallbacks,
            highlight,
        }
    }

    /// Clear every pool's dirty flag after the renderer uploaded them
    pub fn mark_uploaded(&mut self) {
        for pool in self.pools.values_mut() {
            pool.mark_clean();
        }
    }

    /// Where a collider's renderable lives
    pub fn tracking(&self, handle: ColliderHandle) -> Tracking {
        if self.descriptors.contains_key(&handle) {
            Tracking::Instanced
        } else if self.fallback.contains(handle) {
            Tracking::Fallback
        } else if self.dropped.contains(&handle) {
            Tracking::Dropped
        } else {
            Tracking::Untracked
        }
    }

    /// Descriptor of an instanced collider
    pub fn descriptor(&self, handle: ColliderHandle) -> Option<&InstanceDescriptor> {
        self.descriptors.get(&handle)
    }

    /// Current slot of an instanced collider
    pub fn slot_of(&self, handle: ColliderHandle) -> Option<usize> {
        self.descriptors.get(&handle).map(|descriptor| descriptor.slot)
    }

    /// Transform currently stored for an instanced collider
    pub fn transform_of(&self, handle: ColliderHandle) -> Option<&Transform> {
        let descriptor = self.descriptors.get(&handle)?;
        self.pools.get(descriptor.pool)?.transform(descriptor.slot)
    }

    /// Currently highlighted collider
    pub fn highlighted(&self) -> Option<ColliderHandle> {
        self.highlighted
    }

    /// Transform in the occupied highlight slot
    pub fn highlight_transform(&self) -> Option<&Transform> {
        self.pools
            .values()
            .filter(|pool| pool.key().bucket.category == BodyCategory::Highlighted)
            .find_map(|pool| pool.transform(0))
    }

    /// Pool serving a key, if it has been created
    pub fn pool(&self, key: PoolKey) -> Option<&InstancePool> {
        self.pool_index.get(&key).and_then(|&id| self.pools.get(id))
    }

    /// Identity of the pool serving a key
    pub fn pool_id(&self, key: PoolKey) -> Option<PoolId> {
        self.pool_index.get(&key).copied()
    }

    /// Every pool with its identity, highlight pools included
    pub fn pools(&self) -> impl Iterator<Item = (PoolId, &InstancePool)> {
        self.pools.iter()
    }

    /// The fallback store
    pub fn fallback(&self) -> &FallbackStore {
        &self.fallback
    }

    /// The palette used for bucket assignment
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Number of rendered colliders (instanced plus fallback)
    pub fn live_count(&self) -> usize {
        self.descriptors.len() + self.fallback.len()
    }

    /// Registry statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            pools: self.pools.len(),
            dropped: self.dropped.len(),
            ..self.stats.clone()
        }
    }

    fn ensure_unregistered(&self, handle: ColliderHandle) -> InstancingResult<()> {
        if self.tracking(handle) == Tracking::Untracked {
            Ok(())
        } else {
            Err(InstancingError::DuplicateHandle(handle))
        }
    }

    fn pool_for(&mut self, key: PoolKey, capacity: usize) -> PoolId {
        if let Some(&id) = self.pool_index.get(&key) {
            return id;
        }
        let id = self.pools.insert(InstancePool::new(key, capacity));
        self.pool_index.insert(key, id);
        id
    }

    fn clear_highlight(&mut self) {
        let Some(previous) = self.highlighted.take() else {
            return;
        };

        if let Some(descriptor) = self.descriptors.get_mut(&previous) {
            descriptor.highlighted = false;
            let key = PoolKey::new(descriptor.shape_kind, PaletteBucket::highlighted());
            if let Some(pool) = self.pool_index.get(&key).and_then(|&id| self.pools.get_mut(id)) {
                pool.clear();
            }
        } else if self.fallback.set_highlighted(previous, false).is_err() {
            log::debug!("Previously highlighted {} is gone", previous);
        }
    }

    fn drop_collider(&mut self, handle: ColliderHandle) {
        self.dropped.insert(handle);
        self.stats.dropped = self.dropped.len();
    }

    fn record_added(&mut self) {
        self.stats.total_added += 1;
        self.stats.peak_live = self.stats.peak_live.max(self.live_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn h(raw: u32) -> ColliderHandle {
        ColliderHandle::from_raw(raw)
    }

    fn at(x: f32) -> Transform {
        Transform::from_position_rotation(Vec3::new(x, 0.0, 0.0), Quat::identity())
    }

    fn registry(capacity: usize) -> (InstanceRegistry, StdRng) {
        (InstanceRegistry::new(capacity, Palette::default()), StdRng::seed_from_u64(0))
    }

    #[test]
    fn test_add_creates_pool_lazily() {
        let (mut registry, mut rng) = registry(8);
        assert_eq!(registry.stats().pools, 0);

        registry
            .add_collider(h(1), ShapeKind::Sphere, BodyCategory::Fixed, at(0.0), &mut rng)
            .expect("Should add");

        let key = PoolKey::new(ShapeKind::Sphere, PaletteBucket::new(BodyCategory::Fixed, 0));
        assert_eq!(registry.pool(key).map(InstancePool::active_count), Some(1));
        assert_eq!(registry.slot_of(h(1)), Some(0));
        assert_eq!(registry.tracking(h(1)), Tracking::Instanced);
        assert_eq!(registry.stats().pools, 1);
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let (mut registry, mut rng) = registry(8);
        registry
            .add_collider(h(1), ShapeKind::Box, BodyCategory::Fixed, at(0.0), &mut rng)
            .expect("Should add");

        let result = registry.add_collider(h(1), ShapeKind::Box, BodyCategory::Fixed, at(0.0), &mut rng);
        assert_eq!(result, Err(InstancingError::DuplicateHandle(h(1))));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_complex_kind_through_add_collider_is_rejected() {
        let (mut registry, mut rng) = registry(8);
        let result = registry.add_collider(h(1), ShapeKind::Complex, BodyCategory::Fixed, at(0.0), &mut rng);
        assert!(matches!(result, Err(InstancingError::InvalidRegistration { .. })));

        let result = registry.add_collider(h(1), ShapeKind::Box, BodyCategory::Highlighted, at(0.0), &mut rng);
        assert!(matches!(result, Err(InstancingError::InvalidRegistration { .. })));
        assert_eq!(registry.tracking(h(1)), Tracking::Untracked);
    }

    #[test]
    fn test_update_keeps_template_scale() {
        let (mut registry, mut rng) = registry(8);
        let initial = Transform::new(Vec3::zeros(), Quat::identity(), Vec3::new(2.0, 3.0, 4.0));
        registry
            .add_collider(h(1), ShapeKind::Box, BodyCategory::Fixed, initial, &mut rng)
            .expect("Should add");

        registry
            .update_transform(h(1), Vec3::new(1.0, 1.0, 1.0), Quat::identity())
            .expect("Should update");

        let transform = registry.transform_of(h(1)).expect("Should have a transform");
        assert_eq!(transform.position, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(transform.scale, Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn test_update_unknown_handle() {
        let (mut registry, _) = registry(8);
        assert_eq!(
            registry.update_transform(h(9), Vec3::zeros(), Quat::identity()),
            Err(InstancingError::UnknownHandle(h(9)))
        );
    }

    #[test]
    fn test_exhausted_collider_is_dropped_not_lost() {
        let (mut registry, mut rng) = registry(1);
        registry
            .add_collider(h(1), ShapeKind::Box, BodyCategory::Fixed, at(0.0), &mut rng)
            .expect("Should add");

        let result = registry.add_collider(h(2), ShapeKind::Box, BodyCategory::Fixed, at(0.0), &mut rng);
        assert!(matches!(result, Err(InstancingError::PoolExhausted { capacity: 1, .. })));
        assert_eq!(registry.tracking(h(2)), Tracking::Dropped);
        assert_eq!(registry.stats().pool_exhaustions, 1);

        // Dropped colliders are silently accepted by updates and removals
        assert_eq!(registry.update_transform(h(2), Vec3::zeros(), Quat::identity()), Ok(()));
        assert_eq!(registry.remove_collider(h(2)), Ok(()));
        assert_eq!(registry.tracking(h(2)), Tracking::Untracked);
    }

    #[test]
    fn test_complex_collider_goes_to_fallback() {
        let (mut registry, mut rng) = registry(8);
        let shape = ColliderShape::ConvexPolyhedron {
            vertices: vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            indices: vec![[0, 1, 2]],
        };
        registry
            .add_complex(h(4), &shape, BodyCategory::Dynamic, Vec3::zeros(), Quat::identity(), &mut rng)
            .expect("Should add complex");

        assert_eq!(registry.tracking(h(4)), Tracking::Fallback);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.stats().pools, 0);

        registry
            .update_transform(h(4), Vec3::new(0.0, 2.0, 0.0), Quat::identity())
            .expect("Should update");
        let renderable = registry.fallback().get(h(4)).expect("Should exist");
        assert_eq!(renderable.transform.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(renderable.color, registry.palette().color(renderable.bucket));

        registry.remove_collider(h(4)).expect("Should remove");
        assert!(registry.fallback().is_empty());
    }

    #[test]
    fn test_static_geometry_is_never_highlighted() {
        let (mut registry, mut rng) = registry(8);
        registry
            .add_collider(h(1), ShapeKind::Box, BodyCategory::Fixed, at(0.0), &mut rng)
            .expect("Should add fixed");
        registry
            .add_collider(h(2), ShapeKind::Box, BodyCategory::Kinematic, at(0.0), &mut rng)
            .expect("Should add kinematic");

        registry.set_highlighted(Some(h(1))).expect("Should accept request");
        registry.set_highlighted(Some(h(2))).expect("Should accept request");
        assert_eq!(registry.highlighted(), None);
        assert!(registry.highlight_transform().is_none());
    }

    #[test]
    fn test_removing_highlighted_clears_slot() {
        let (mut registry, mut rng) = registry(8);
        registry
            .add_collider(h(1), ShapeKind::Capsule, BodyCategory::Dynamic, at(3.0), &mut rng)
            .expect("Should add");
        registry.set_highlighted(Some(h(1))).expect("Should highlight");
        assert_eq!(registry.highlighted(), Some(h(1)));

        registry.remove_collider(h(1)).expect("Should remove");
        assert_eq!(registry.highlighted(), None);
        assert!(registry.highlight_transform().is_none());
        assert!(registry.frame_data().highlight.is_none());
    }

    #[test]
    fn test_highlight_follows_updates() {
        let (mut registry, mut rng) = registry(8);
        registry
            .add_collider(h(1), ShapeKind::Sphere, BodyCategory::Dynamic, at(0.0), &mut rng)
            .expect("Should add");
        registry.set_highlighted(Some(h(1))).expect("Should highlight");

        registry
            .update_transform(h(1), Vec3::new(7.0, 0.0, 0.0), Quat::identity())
            .expect("Should update");
        let highlight = registry.highlight_transform().expect("Should be occupied");
        assert_eq!(highlight.position, Vec3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn test_highlight_unknown_handle() {
        let (mut registry, _) = registry(8);
        assert_eq!(registry.set_highlighted(Some(h(5))), Err(InstancingError::UnknownHandle(h(5))));
        assert_eq!(registry.set_highlighted(None), Ok(()));
    }

    #[test]
    fn test_frame_data_batches_exclude_highlight_pools() {
        let (mut registry, mut rng) = registry(8);
        registry
            .add_collider(h(1), ShapeKind::Cone, BodyCategory::Sensor, at(1.0), &mut rng)
            .expect("Should add");
        registry.set_highlighted(Some(h(1))).expect("Should highlight");

        let frame = registry.frame_data();
        assert_eq!(frame.batches.len(), 1);
        assert_eq!(frame.batches[0].active_count, 1);
        assert_eq!(frame.batches[0].color, registry.palette().color(frame.batches[0].key.bucket));
        let highlight = frame.highlight.expect("Should carry the highlight");
        assert_eq!(highlight.shape_kind, ShapeKind::Cone);
        assert_eq!(highlight.instance.translation(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_failed_free_keeps_descriptor() {
        let (mut registry, mut rng) = registry(8);
        registry
            .add_collider(h(1), ShapeKind::Box, BodyCategory::Fixed, at(0.0), &mut rng)
            .expect("Should add");
        let pool_id = registry.descriptor(h(1)).expect("Should be tracked").pool;

        // Desynchronize the pool behind the registry's back
        registry.pools[pool_id].clear();

        assert_eq!(
            registry.remove_collider(h(1)),
            Err(InstancingError::InvalidSlot { slot: 0, active_count: 0 })
        );
        assert_eq!(registry.tracking(h(1)), Tracking::Instanced);
        assert_eq!(registry.stats().total_removed, 0);
    }

    #[test]
    fn test_mark_uploaded_clears_dirty() {
        let (mut registry, mut rng) = registry(8);
        registry
            .add_collider(h(1), ShapeKind::Box, BodyCategory::Fixed, at(0.0), &mut rng)
            .expect("Should add");
        assert!(registry.frame_data().batches.iter().all(|batch| batch.dirty));

        registry.mark_uploaded();
        assert!(registry.frame_data().batches.iter().all(|batch| !batch.dirty));
    }
}
