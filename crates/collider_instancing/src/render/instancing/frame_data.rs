//! Per-frame renderer view
//!
//! Borrowed snapshot of everything the renderer draws: one batch per regular
//! pool, one renderable per complex collider and the optional highlight.

use super::data_structures::{InstanceData, PoolKey};
use super::fallback::FallbackRenderable;
use super::palette::Color;
use super::shape_kind::ShapeKind;

/// One instanced draw: a template mesh in one color
#[derive(Debug, Clone, Copy)]
pub struct InstanceBatch<'a> {
    /// Pool this batch draws
    pub key: PoolKey,
    /// Uniform color of every instance
    pub color: Color,
    /// Fixed pool capacity (instance buffer size in elements)
    pub capacity: usize,
    /// Number of instances to draw
    pub active_count: usize,
    /// Live instance data, `active_count` entries
    pub instances: &'a [InstanceData],
    /// Contents changed since the last upload
    pub dirty: bool,
}

impl InstanceBatch<'_> {
    /// Live instance data as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.instances)
    }

    /// Nothing to draw
    pub fn is_empty(&self) -> bool {
        self.active_count == 0
    }
}

/// The single highlight overlay instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightInstance {
    /// Template mesh of the highlighted collider
    pub shape_kind: ShapeKind,
    /// Highlight color
    pub color: Color,
    /// Model matrix of the highlighted collider
    pub instance: InstanceData,
}

/// Everything to draw this frame
#[derive(Debug, Clone, Default)]
pub struct FrameData<'a> {
    /// Regular pools ordered by key; highlight pools are excluded
    pub batches: Vec<InstanceBatch<'a>>,
    /// Complex-shape renderables ordered by handle
    pub fallbacks: Vec<&'a FallbackRenderable>,
    /// Occupied highlight slot, if any
    pub highlight: Option<HighlightInstance>,
}

impl<'a> FrameData<'a> {
    /// Instances drawn through pools
    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.active_count).sum()
    }

    /// Batches whose contents must be re-uploaded
    pub fn dirty_batches(&self) -> impl Iterator<Item = &InstanceBatch<'a>> + '_ {
        self.batches.iter().filter(|batch| batch.dirty)
    }

    /// Instanced draw calls issued this frame (empty pools are skipped)
    pub fn draw_call_count(&self) -> usize {
        self.batches.iter().filter(|batch| !batch.is_empty()).count()
            + self.fallbacks.len()
            + usize::from(self.highlight.is_some())
    }
}
