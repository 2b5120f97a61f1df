//! Instancing errors

use super::data_structures::PoolKey;
use crate::physics::{ColliderHandle, ShapeType};
use thiserror::Error;

/// Errors returned by pools, the fallback store and the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstancingError {
    /// Every slot of the pool is occupied
    #[error("Pool {key} exhausted: all {capacity} slots in use")]
    PoolExhausted {
        /// Pool that ran out of slots
        key: PoolKey,
        /// Its fixed capacity
        capacity: usize,
    },

    /// The handle is already registered
    #[error("Duplicate handle: {0} is already registered")]
    DuplicateHandle(ColliderHandle),

    /// The handle is not registered
    #[error("Unknown handle: {0} is not registered")]
    UnknownHandle(ColliderHandle),

    /// The shape has no renderable representation
    #[error("Unsupported shape {shape_type} on {handle}")]
    UnsupportedShape {
        /// Offending collider
        handle: ColliderHandle,
        /// Its shape type
        shape_type: ShapeType,
    },

    /// The registration request itself is malformed
    #[error("Invalid registration of {handle}: {reason}")]
    InvalidRegistration {
        /// Offending collider
        handle: ColliderHandle,
        /// What was wrong with the request
        reason: &'static str,
    },

    /// Slot index outside the active range
    #[error("Invalid slot {slot}: only {active_count} slots are active")]
    InvalidSlot {
        /// Requested slot
        slot: usize,
        /// Active slots in the pool
        active_count: usize,
    },
}

impl InstancingError {
    /// Bookkeeping bugs, as opposed to capacity or shape limits
    pub fn is_bookkeeping_error(&self) -> bool {
        !matches!(self, Self::PoolExhausted { .. } | Self::UnsupportedShape { .. })
    }
}

/// Result alias for instancing operations
pub type InstancingResult<T> = Result<T, InstancingError>;
