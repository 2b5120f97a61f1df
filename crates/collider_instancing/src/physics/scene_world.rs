//! In-memory physics world
//!
//! A deliberately small world: colliders with one owning body each, gravity
//! and a ground plane at `y = 0`. It exists to drive the viewer in the demo
//! application and in tests, not to be a solver.

use super::{BodyMotion, ColliderHandle, ColliderShape, ColliderView, PhysicsWorld};
use crate::foundation::math::{Quat, Vec3};
use std::collections::BTreeMap;

/// Bounce factor applied when a dynamic body hits the ground
const GROUND_RESTITUTION: f32 = 0.3;

/// Description of a collider to insert
#[derive(Debug, Clone)]
pub struct ColliderDesc {
    /// Shape and dimensions
    pub shape: ColliderShape,
    /// Initial translation
    pub position: Vec3,
    /// Initial rotation
    pub rotation: Quat,
    /// Owning body motion, `None` for a free-standing collider
    pub body: Option<BodyMotion>,
    /// Sensor flag
    pub is_sensor: bool,
    /// Initial linear velocity
    pub linear_velocity: Vec3,
    /// Initial angular velocity (scaled axis, radians per second)
    pub angular_velocity: Vec3,
}

impl ColliderDesc {
    /// A collider on a dynamic body at the origin
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            body: Some(BodyMotion::Dynamic { ccd: false }),
            is_sensor: false,
            linear_velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
        }
    }

    /// Set the initial translation
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the initial rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the owning body's motion type
    pub fn with_body(mut self, body: Option<BodyMotion>) -> Self {
        self.body = body;
        self
    }

    /// Mark as sensor
    pub fn sensor(mut self, is_sensor: bool) -> Self {
        self.is_sensor = is_sensor;
        self
    }

    /// Set the initial linear velocity
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    /// Set the initial angular velocity
    pub fn with_angular_velocity(mut self, velocity: Vec3) -> Self {
        self.angular_velocity = velocity;
        self
    }
}

/// Collider set with handle recycling and a toy integrator
#[derive(Debug)]
pub struct SceneWorld {
    colliders: BTreeMap<ColliderHandle, ColliderDesc>,
    /// Raw handles released by `remove`, reused before new ones are minted
    free_handles: Vec<u32>,
    next_handle: u32,
    gravity: Vec3,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneWorld {
    /// Empty world with standard gravity
    pub fn new() -> Self {
        Self {
            colliders: BTreeMap::new(),
            free_handles: Vec::new(),
            next_handle: 0,
            gravity: Vec3::new(0.0, -9.81, 0.0),
        }
    }

    /// Replace the gravity vector
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Insert a collider and return its handle
    pub fn insert(&mut self, desc: ColliderDesc) -> ColliderHandle {
        let raw = self.free_handles.pop().unwrap_or_else(|| {
            let raw = self.next_handle;
            self.next_handle += 1;
            raw
        });
        let handle = ColliderHandle::from_raw(raw);
        self.colliders.insert(handle, desc);
        handle
    }

    /// Remove a collider, returning its description if it was alive
    pub fn remove(&mut self, handle: ColliderHandle) -> Option<ColliderDesc> {
        let removed = self.colliders.remove(&handle)?;
        self.free_handles.push(handle.raw());
        Some(removed)
    }

    /// Remove every collider and forget recycled handles
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.free_handles.clear();
        self.next_handle = 0;
    }

    /// Teleport a collider; returns `false` for an unknown handle
    pub fn set_pose(&mut self, handle: ColliderHandle, position: Vec3, rotation: Quat) -> bool {
        match self.colliders.get_mut(&handle) {
            Some(desc) => {
                desc.position = position;
                desc.rotation = rotation;
                true
            }
            None => false,
        }
    }

    /// Handles of every live collider in ascending order
    pub fn handles(&self) -> Vec<ColliderHandle> {
        self.colliders.keys().copied().collect()
    }

    /// Advance dynamic and velocity-driven kinematic bodies by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        for desc in self.colliders.values_mut() {
            match desc.body {
                Some(BodyMotion::Dynamic { .. }) => {
                    desc.linear_velocity += self.gravity * dt;
                    integrate(desc, dt);
                    if desc.position.y < 0.0 {
                        desc.position.y = 0.0;
                        desc.linear_velocity.y = -desc.linear_velocity.y * GROUND_RESTITUTION;
                    }
                }
                Some(BodyMotion::KinematicVelocityBased) => integrate(desc, dt),
                Some(BodyMotion::Fixed | BodyMotion::KinematicPositionBased) | None => {}
            }
        }
    }
}

fn integrate(desc: &mut ColliderDesc, dt: f32) {
    desc.position += desc.linear_velocity * dt;
    let spin = Quat::from_scaled_axis(desc.angular_velocity * dt);
    desc.rotation = spin * desc.rotation;
}

fn view(handle: ColliderHandle, desc: &ColliderDesc) -> ColliderView<'_> {
    ColliderView {
        handle,
        shape: &desc.shape,
        position: desc.position,
        rotation: desc.rotation,
        body: desc.body,
        is_sensor: desc.is_sensor,
    }
}

impl PhysicsWorld for SceneWorld {
    fn colliders(&self) -> Box<dyn Iterator<Item = ColliderView<'_>> + '_> {
        Box::new(self.colliders.iter().map(|(&handle, desc)| view(handle, desc)))
    }

    fn collider(&self, handle: ColliderHandle) -> Option<ColliderView<'_>> {
        self.colliders.get(&handle).map(|desc| view(handle, desc))
    }

    fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_handles_are_recycled_after_removal() {
        let mut world = SceneWorld::new();
        let a = world.insert(ColliderDesc::new(ColliderShape::ball(0.5)));
        let b = world.insert(ColliderDesc::new(ColliderShape::ball(0.5)));
        assert_ne!(a, b);

        assert!(world.remove(a).is_some());
        assert!(world.remove(a).is_none());

        let c = world.insert(ColliderDesc::new(ColliderShape::ball(0.5)));
        assert_eq!(c, a);
        assert_eq!(world.collider_count(), 2);
    }

    #[test]
    fn test_dynamic_body_falls_and_stops_at_ground() {
        let mut world = SceneWorld::new();
        let handle = world.insert(
            ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5)).with_position(Vec3::new(0.0, 1.0, 0.0)),
        );

        world.step(0.1);
        let y = world.collider(handle).map_or(f32::NAN, |c| c.position.y);
        assert!(y < 1.0);

        for _ in 0..100 {
            world.step(0.1);
        }
        let y = world.collider(handle).map_or(-1.0, |c| c.position.y);
        assert!(y >= 0.0);
    }

    #[test]
    fn test_fixed_body_does_not_move() {
        let mut world = SceneWorld::new();
        let handle = world.insert(
            ColliderDesc::new(ColliderShape::cuboid(10.0, 0.1, 10.0))
                .with_position(Vec3::new(0.0, 2.0, 0.0))
                .with_body(Some(BodyMotion::Fixed)),
        );

        world.step(1.0);
        let y = world.collider(handle).map_or(f32::NAN, |c| c.position.y);
        assert_relative_eq!(y, 2.0);
    }
}
