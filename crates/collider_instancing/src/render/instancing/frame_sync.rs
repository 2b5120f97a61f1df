//! Frame Sync
//!
//! Once per simulation step, copies the pose of every live collider into its
//! instance slot or fallback renderable.
//!
//! Failures are aggregated over the whole pass: at most one summary warning
//! per failure class is logged, and colliders missing from the registry are
//! returned together after every tracked collider has been written.

use super::error::InstancingError;
use super::registry::{InstanceRegistry, Tracking};
use crate::physics::{ColliderHandle, PhysicsWorld};
use thiserror::Error;

/// Counts from one sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Colliders written into instance slots
    pub instanced: usize,
    /// Colliders written into fallback renderables
    pub fallback: usize,
    /// Colliders skipped because they are deliberately unrendered
    pub dropped: usize,
    /// Tracked colliders whose write failed
    pub failed: Vec<ColliderHandle>,
}

impl SyncReport {
    /// Colliders visited, failures included
    pub fn total(&self) -> usize {
        self.instanced + self.fallback + self.dropped + self.failed.len()
    }
}

/// Fatal sync outcomes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Live colliders the registry has never seen; they would be invisible
    #[error("{} live colliders have no renderable registration (first: {})", .handles.len(), first_handle(.handles))]
    MissingRegistration {
        /// Unregistered colliders, in world iteration order
        handles: Vec<ColliderHandle>,
        /// Counts for the colliders that were synced
        report: SyncReport,
    },
}

fn first_handle(handles: &[ColliderHandle]) -> String {
    handles.first().map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Write every live collider's pose into the registry
pub fn sync_frame<W: PhysicsWorld + ?Sized>(
    world: &W,
    registry: &mut InstanceRegistry,
) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();
    let mut missing = Vec::new();
    let mut first_failure: Option<InstancingError> = None;

    for view in world.colliders() {
        let tracking = registry.tracking(view.handle);
        match tracking {
            Tracking::Untracked => {
                missing.push(view.handle);
                continue;
            }
            Tracking::Dropped => {
                report.dropped += 1;
                continue;
            }
            Tracking::Instanced | Tracking::Fallback => {}
        }

        match registry.update_transform(view.handle, view.position, view.rotation) {
            Ok(()) if tracking == Tracking::Instanced => report.instanced += 1,
            Ok(()) => report.fallback += 1,
            Err(err) => {
                report.failed.push(view.handle);
                first_failure.get_or_insert(err);
            }
        }
    }

    if let Some(err) = first_failure {
        log::warn!("Frame sync: {} transform writes failed (first: {})", report.failed.len(), err);
    }

    if missing.is_empty() {
        log::trace!(
            "Frame sync: {} instanced, {} fallback, {} dropped",
            report.instanced,
            report.fallback,
            report.dropped
        );
        Ok(report)
    } else {
        log::error!(
            "Frame sync: {} live colliders are not registered (first: {})",
            missing.len(),
            missing[0]
        );
        Err(SyncError::MissingRegistration {
            handles: missing,
            report,
        })
    }
}
