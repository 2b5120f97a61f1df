//! Headless collider viewer
//!
//! Drives a [`SceneWorld`] through a [`ColliderViewer`] without a window:
//! bodies rain down, get despawned, picked and highlighted, and the world is
//! restarted every few hundred steps. Pool statistics are logged as it goes.
//!
//! Usage: `viewer_headless [config.toml|config.ron] [steps]`

use collider_instancing::config::Config;
use collider_instancing::foundation::math::Point3;
use collider_instancing::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

const DEFAULT_STEPS: usize = 2_000;
const STEP_DT: f32 = 1.0 / 60.0;
const RESTART_INTERVAL: usize = 600;
const STATS_INTERVAL: usize = 120;
const MAX_BODIES: usize = 400;

#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid step count '{0}'")]
    InvalidSteps(String),
}

struct HeadlessApp {
    world: SceneWorld,
    viewer: ColliderViewer,
    spawner: StdRng,
    steps: usize,
}

impl HeadlessApp {
    fn new(config: InstancingConfig, steps: usize) -> Result<Self, AppError> {
        let spawner = StdRng::seed_from_u64(config.palette_seed.wrapping_add(1));
        Ok(Self {
            world: SceneWorld::new(),
            viewer: ColliderViewer::new(config)?,
            spawner,
            steps,
        })
    }

    fn run(&mut self) -> Result<(), AppError> {
        self.populate_static_scene();
        self.viewer.build(&self.world)?;

        for step in 1..=self.steps {
            if step % RESTART_INTERVAL == 0 {
                self.restart()?;
            }

            self.spawn_or_despawn()?;
            if self.spawner.gen_bool(0.02) {
                self.pick()?;
            }

            self.world.step(STEP_DT);
            let report = self.viewer.step(&self.world)?;
            self.upload();

            if step % STATS_INTERVAL == 0 {
                let stats = self.viewer.stats();
                log::info!(
                    "step {}: {} instanced, {} fallback, {} dropped | {} pools, peak {}, {} exhaustions",
                    step,
                    report.instanced,
                    report.fallback,
                    report.dropped,
                    stats.pools,
                    stats.peak_live,
                    stats.pool_exhaustions
                );
            }
        }

        Ok(())
    }

    fn populate_static_scene(&mut self) {
        self.world.insert(
            ColliderDesc::new(ColliderShape::cuboid(25.0, 0.1, 25.0))
                .with_position(Vec3::new(0.0, -0.1, 0.0))
                .with_body(Some(BodyMotion::Fixed)),
        );
        self.world.insert(
            ColliderDesc::new(ColliderShape::HeightField {
                heights: vec![0.0, 0.4, 0.2, 0.6, 1.0, 0.3, 0.1, 0.5, 0.0],
                nrows: 3,
                ncols: 3,
                scale: Vec3::new(8.0, 1.0, 8.0),
            })
            .with_position(Vec3::new(12.0, 0.0, 12.0))
            .with_body(Some(BodyMotion::Fixed)),
        );
        self.world.insert(
            ColliderDesc::new(ColliderShape::Cylinder {
                half_height: 1.0,
                radius: 0.5,
            })
            .with_position(Vec3::new(-6.0, 1.0, 0.0))
            .with_body(Some(BodyMotion::KinematicVelocityBased))
            .with_angular_velocity(Vec3::new(0.0, 1.0, 0.0)),
        );
        self.world.insert(
            ColliderDesc::new(ColliderShape::ball(3.0))
                .with_position(Vec3::new(6.0, 1.0, -6.0))
                .with_body(Some(BodyMotion::Fixed))
                .sensor(true),
        );
    }

    fn random_shape(&mut self) -> ColliderShape {
        let size = self.spawner.gen_range(0.2..0.8);
        match self.spawner.gen_range(0..7) {
            0 => ColliderShape::ball(size),
            1 => ColliderShape::cuboid(size, size * 0.5, size),
            2 => ColliderShape::Capsule {
                half_height: size,
                radius: size * 0.5,
            },
            3 => ColliderShape::Cone {
                half_height: size,
                radius: size,
            },
            4 => ColliderShape::RoundCuboid {
                half_extents: Vec3::new(size, size, size),
                border_radius: 0.05,
            },
            5 => ColliderShape::ConvexPolyhedron {
                vertices: vec![
                    Point3::new(0.0, size, 0.0),
                    Point3::new(-size, 0.0, -size),
                    Point3::new(size, 0.0, -size),
                    Point3::new(0.0, 0.0, size),
                ],
                indices: vec![[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]],
            },
            _ => ColliderShape::Segment {
                a: Point3::origin(),
                b: Point3::new(size, 0.0, 0.0),
            },
        }
    }

    fn spawn_or_despawn(&mut self) -> Result<(), AppError> {
        if self.world.collider_count() < MAX_BODIES && self.spawner.gen_bool(0.5) {
            let shape = self.random_shape();
            let position = Vec3::new(
                self.spawner.gen_range(-10.0..10.0),
                self.spawner.gen_range(5.0..20.0),
                self.spawner.gen_range(-10.0..10.0),
            );
            let ccd = self.spawner.gen_bool(0.1);
            let handle = self.world.insert(
                ColliderDesc::new(shape)
                    .with_position(position)
                    .with_body(Some(BodyMotion::Dynamic { ccd })),
            );
            self.viewer.on_collider_added(&self.world, handle)?;
        }

        if self.spawner.gen_bool(0.2) {
            let handles = self.world.handles();
            // Keep the static scene, despawn only falling bodies
            let candidates: Vec<_> = handles
                .into_iter()
                .filter(|&handle| {
                    self.world
                        .collider(handle)
                        .is_some_and(|view| matches!(view.body, Some(BodyMotion::Dynamic { .. })))
                })
                .collect();
            if !candidates.is_empty() {
                let victim = candidates[self.spawner.gen_range(0..candidates.len())];
                self.world.remove(victim);
                self.viewer.on_collider_removed(victim)?;
            }
        }

        Ok(())
    }

    fn pick(&mut self) -> Result<(), AppError> {
        let handles = self.world.handles();
        let picked = if handles.is_empty() || self.spawner.gen_bool(0.2) {
            None
        } else {
            Some(handles[self.spawner.gen_range(0..handles.len())])
        };
        log::debug!("Highlight request: {:?}", picked);
        self.viewer.on_highlight_request(picked)?;
        Ok(())
    }

    fn restart(&mut self) -> Result<(), AppError> {
        log::info!("Restarting simulation");
        self.world.clear();
        self.viewer.on_world_reset();
        self.populate_static_scene();
        self.viewer.build(&self.world)?;
        Ok(())
    }

    fn upload(&mut self) {
        let frame = self.viewer.frame_data();
        let bytes: usize = frame.dirty_batches().map(|batch| batch.as_bytes().len()).sum();
        log::trace!(
            "Frame: {} draw calls, {} instances, {} bytes uploaded",
            frame.draw_call_count(),
            frame.instance_count(),
            bytes
        );
        self.viewer.mark_uploaded();
    }
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            InstancingConfig::load_from_file(&path)?
        }
        None => InstancingConfig::default(),
    };
    let steps = match args.next() {
        Some(raw) => raw.parse().map_err(|_| AppError::InvalidSteps(raw))?,
        None => DEFAULT_STEPS,
    };

    log::info!("Starting headless collider viewer for {} steps", steps);
    let mut app = HeadlessApp::new(config, steps)?;

    match app.run() {
        Ok(()) => {
            log::info!("Headless viewer completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Headless viewer failed: {:?}", e);
            Err(e)
        }
    }
}
