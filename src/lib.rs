#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streaming
//!
//! A streaming, dynamically meshed voxel world: a 3D grid of typed blocks cut
//! into fixed-size chunks that are generated, edited and turned into render
//! and collision geometry as an observer moves through the world.
//!
//! ## Key Modules
//!
//! * `config` - World configuration, loadable from JSON
//! * `core` - Shared-state primitives
//! * `engine_state` - The [`VoxelWorld`] facade plus blocks, chunks, the
//!   streamer, the raycaster, the greedy mesher and the build pipeline
//! * `error` - [`VoxelError`]
//!
//! ## Architecture
//!
//! * The primary thread owns every chunk and runs [`VoxelWorld::tick`]
//! * A fixed pool of worker threads runs the greedy mesher over chunk copies
//! * Build results are versioned and applied on the primary thread; outdated
//!   ones are discarded
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     if let Err(err) = voxel_streaming::run() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use cgmath::{Point3, Vector3};
use log::info;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::WorldConfig;
pub use engine_state::{
    voxels::block::{registry::BlockRegistry, BlockId, AIR},
    TickReport, VoxelWorld, WorldStats,
};
pub use error::VoxelError;

/// Ticks simulated by the headless demo.
const DEMO_TICKS: usize = 600;
/// Observer speed of the headless demo, in voxels per tick.
const DEMO_SPEED: f32 = 0.5;

/// Runs a headless streaming session.
///
/// Reads a JSON [`WorldConfig`] from the path given as first argument, or uses
/// the defaults. The observer then walks along +X for a fixed number of ticks,
/// digs the block below it and logs streaming statistics. Set `RUST_LOG` to
/// see the output.
pub fn run() -> Result<(), VoxelError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            WorldConfig::load(path)?
        }
        None => WorldConfig::default(),
    };
    let registry = BlockRegistry::with_default_palette(config.atlas_grid)?;
    let mut world = VoxelWorld::new(config, registry)?;
    let height = world.config().chunk_dimensions.y as f32;

    let mut observer = Point3::new(0.5, height, 0.5);
    for step in 0..DEMO_TICKS {
        observer.x = 0.5 + step as f32 * DEMO_SPEED;
        world.set_observer_position(observer);
        let report = world.tick()?;
        if step % 100 == 0 {
            info!("Tick {}: {:?}", step, report);
            info!("Stats: {:?}", world.stats());
        }
    }

    match world.settle(DEMO_TICKS, std::time::Duration::from_secs(10))? {
        Some(ticks) => info!("Streaming settled after {} extra ticks", ticks),
        None => info!("Streaming did not settle"),
    }

    if let Some(hit) = world.cast(observer, Vector3::new(0.0, -1.0, 0.0), height * 2.0) {
        let dug = world.registry().type_of(hit.block).name().to_string();
        world.set_block_at_world(hit.break_target, AIR);
        info!(
            "Dug {} at {:?} in chunk ({}, {})",
            dug, hit.break_target, hit.hit_chunk.x, hit.hit_chunk.z
        );
        world.wait_for_builds(std::time::Duration::from_secs(10));
    }

    info!("Final stats: {:?}", world.stats());
    Ok(())
}
