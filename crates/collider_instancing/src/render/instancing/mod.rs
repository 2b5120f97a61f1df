//! Collider instancing
//!
//! Keeps a bounded set of GPU-instanced draw batches in sync with a changing
//! population of physics colliders. Primitive shapes share fixed-capacity
//! pools keyed by shape template and color bucket; complex shapes get a
//! dedicated renderable; one collider at a time may be highlighted.

pub mod shape_kind;
pub mod palette;
pub mod data_structures;
pub mod error;
pub mod instance_pool;
pub mod fallback;
pub mod registry;
pub mod frame_data;
pub mod frame_sync;

pub use shape_kind::*;
pub use palette::*;
pub use data_structures::*;
pub use error::*;
pub use instance_pool::*;
pub use fallback::*;
pub use registry::*;
pub use frame_data::*;
pub use frame_sync::*;
