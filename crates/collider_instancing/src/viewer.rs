//! Viewer lifecycle hooks
//!
//! [`ColliderViewer`] owns the instance registry for one simulation and
//! translates physics-world and user-input events into registry calls. It is
//! also where the dev/prod error policy lives: the registry always reports
//! the exact failure, the viewer decides whether the host sees it.

use crate::config::{Config, ConfigError, InstancingConfig};
use crate::physics::{ColliderHandle, PhysicsWorld};
use crate::render::instancing::{
    sync_frame, FrameData, InstanceRegistry, InstancingError, InstancingResult, RegistryStats, SyncError, SyncReport,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

/// Errors surfaced to the host application
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Registry bookkeeping failure, only surfaced in strict mode
    #[error("Instancing error: {0}")]
    Instancing(#[from] InstancingError),

    /// Live colliders without a renderable
    #[error("Frame sync error: {0}")]
    Sync(#[from] SyncError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Registry owner driven by simulation lifecycle events
#[derive(Debug)]
pub struct ColliderViewer {
    config: InstancingConfig,
    registry: InstanceRegistry,
    rng: StdRng,
}

impl ColliderViewer {
    /// Create a viewer with an empty registry
    pub fn new(config: InstancingConfig) -> Result<Self, ViewerError> {
        config.validate()?;

        log::info!(
            "Creating ColliderViewer (pool capacity {}, strict {}, palette seed {})",
            config.pool_capacity,
            config.strict,
            config.palette_seed
        );

        Ok(Self {
            registry: InstanceRegistry::from_config(&config),
            rng: StdRng::seed_from_u64(config.palette_seed),
            config,
        })
    }

    /// Register every collider of a freshly built world, in ascending handle order
    pub fn build<W: PhysicsWorld + ?Sized>(&mut self, world: &W) -> Result<(), ViewerError> {
        let mut views: Vec<_> = world.colliders().collect();
        views.sort_by_key(|view| view.handle);

        for view in &views {
            let result = self.registry.register(view, &mut self.rng);
            self.apply_policy(result)?;
        }

        log::info!(
            "Built renderables for {} colliders ({} pools)",
            self.registry.live_count(),
            self.registry.stats().pools
        );
        Ok(())
    }

    /// A collider was added to the world
    pub fn on_collider_added<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &W,
        handle: ColliderHandle,
    ) -> Result<(), ViewerError> {
        let result = match world.collider(handle) {
            Some(view) => self.registry.register(&view, &mut self.rng),
            None => Err(InstancingError::UnknownHandle(handle)),
        };
        self.apply_policy(result)
    }

    /// A collider was removed from the world
    pub fn on_collider_removed(&mut self, handle: ColliderHandle) -> Result<(), ViewerError> {
        let result = self.registry.remove_collider(handle);
        self.apply_policy(result)
    }

    /// The simulation restarted; every registration is forgotten
    ///
    /// The palette RNG is reseeded so a replayed world gets the same colors.
    pub fn on_world_reset(&mut self) {
        self.registry.reset();
        self.rng = StdRng::seed_from_u64(self.config.palette_seed);
    }

    /// The user picked a collider, or cleared the pick
    pub fn on_highlight_request(&mut self, handle: Option<ColliderHandle>) -> Result<(), ViewerError> {
        let result = self.registry.set_highlighted(handle);
        self.apply_policy(result)
    }

    /// Copy every live collider's pose into the renderables
    ///
    /// Missing registrations are always returned, regardless of strictness.
    pub fn step<W: PhysicsWorld + ?Sized>(&mut self, world: &W) -> Result<SyncReport, ViewerError> {
        Ok(sync_frame(world, &mut self.registry)?)
    }

    /// Everything to draw this frame
    pub fn frame_data(&self) -> FrameData<'_> {
        self.registry.frame_data()
    }

    /// Called by the renderer after it uploaded the dirty batches
    pub fn mark_uploaded(&mut self) {
        self.registry.mark_uploaded();
    }

    /// Registry statistics
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// The owned registry
    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &InstancingConfig {
        &self.config
    }

    fn apply_policy(&self, result: InstancingResult<()>) -> Result<(), ViewerError> {
        match result {
            Err(err) if err.is_bookkeeping_error() => {
                log::error!("Assertion failed: {}", err);
                if self.config.strict {
                    Err(err.into())
                } else {
                    Ok(())
                }
            }
            // Rendering capacity and shape support are soft limits
            Ok(()) | Err(_) => Ok(()),
        }
    }
}
