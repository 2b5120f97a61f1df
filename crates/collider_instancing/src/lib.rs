//! # Collider Instancing
//!
//! Keeps a bounded set of GPU-instanced draw batches synchronized with a
//! dynamically changing population of physics colliders.
//!
//! ## Features
//!
//! - **Fixed-capacity pools**: one dense instance buffer per shape template and color
//! - **Handle indirection**: callers use collider handles, never slot indices
//! - **Deterministic colors**: palette draws come from a caller-owned seeded RNG
//! - **Fallback renderables**: triangle meshes, hulls, height fields and polylines
//! - **Highlight overlay**: one picked collider drawn on top in the highlight color
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use collider_instancing::prelude::*;
//!
//! fn main() -> Result<(), ViewerError> {
//!     collider_instancing::foundation::logging::init();
//!
//!     let mut world = SceneWorld::new();
//!     world.insert(ColliderDesc::new(ColliderShape::ball(0.5)).with_position(Vec3::new(0.0, 4.0, 0.0)));
//!
//!     let mut viewer = ColliderViewer::new(InstancingConfig::default())?;
//!     viewer.build(&world)?;
//!
//!     world.step(1.0 / 60.0);
//!     viewer.step(&world)?;
//!     for batch in viewer.frame_data().dirty_batches() {
//!         // upload batch.as_bytes() and draw batch.active_count instances
//!         let _ = batch.as_bytes();
//!     }
//!     viewer.mark_uploaded();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod physics;
pub mod render;

mod viewer;

pub use viewer::{ColliderViewer, ViewerError};

/// Common imports for users of the crate
pub mod prelude {
    pub use crate::{
        ColliderViewer, ViewerError,
        config::{Config, ConfigError, InstancingConfig, PaletteConfig},
        foundation::math::{Quat, Transform, Vec3},
        physics::{
            BodyMotion, ColliderDesc, ColliderHandle, ColliderShape, ColliderView, PhysicsWorld, SceneWorld,
            ShapeType,
        },
        render::instancing::{
            BodyCategory, Color, FrameData, InstanceBatch, InstanceData, InstanceRegistry, InstancingError,
            Palette, PaletteBucket, PoolKey, ShapeKind, SyncError, SyncReport,
        },
    };
}
