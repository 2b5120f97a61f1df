//! Physics world surface
//!
//! The instancing core never steps physics itself. It consumes a
//! [`PhysicsWorld`] that can enumerate live colliders, report their shape,
//! pose and owning body's motion type, and look individual colliders up by
//! handle.

pub mod shape;
pub mod world;
pub mod scene_world;

pub use shape::{ColliderShape, ShapeType};
pub use world::{BodyMotion, ColliderView, PhysicsWorld};
pub use scene_world::{SceneWorld, ColliderDesc};

use std::fmt;

/// Opaque collider identity issued by the physics world
///
/// Stable while the collider is alive. The world may hand the same value out
/// again after the collider is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColliderHandle(u32);

impl ColliderHandle {
    /// Wrap a raw identity
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw identity value
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ColliderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collider#{}", self.0)
    }
}
