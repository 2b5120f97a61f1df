//! Read-only view of a physics world
//!
//! The core calls into the world synchronously once per step and never calls
//! back into it.

use super::{ColliderHandle, ColliderShape};
use crate::foundation::math::{Quat, Vec3};

/// Motion type of a rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyMotion {
    /// Immovable
    Fixed,
    /// Driven by setting its next position
    KinematicPositionBased,
    /// Driven by setting its velocity
    KinematicVelocityBased,
    /// Moved by the solver
    Dynamic {
        /// Continuous collision detection enabled
        ccd: bool,
    },
}

/// Snapshot of one live collider
#[derive(Debug, Clone, Copy)]
pub struct ColliderView<'a> {
    /// Collider identity
    pub handle: ColliderHandle,
    /// Shape and dimensions
    pub shape: &'a ColliderShape,
    /// World-space translation
    pub position: Vec3,
    /// World-space rotation
    pub rotation: Quat,
    /// Motion type of the owning body, `None` for a collider without a body
    pub body: Option<BodyMotion>,
    /// Sensor colliders only report intersections
    pub is_sensor: bool,
}

/// Upstream physics world as seen by the instancing core
pub trait PhysicsWorld {
    /// Iterate over every live collider
    fn colliders(&self) -> Box<dyn Iterator<Item = ColliderView<'_>> + '_>;

    /// Look a collider up by handle
    fn collider(&self, handle: ColliderHandle) -> Option<ColliderView<'_>>;

    /// Number of live colliders
    fn collider_count(&self) -> usize {
        self.colliders().count()
    }
}
