//! # Verdant
//!
//! Headless driver for the Verdant world. Loads `verdant.toml` (or the path
//! given as the first argument), spawns an observer, walks it across a few
//! chunks while digging, and logs what it mined.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod session;

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use verdant_world::{WorldConfig, CONFIG_FILE};

use crate::session::Session;

/// Chunks walked in each direction.
const TOUR_CHUNKS: i64 = 3;

/// Config file named by the first argument, or `verdant.toml`.
fn config_path(mut args: impl Iterator<Item = OsString>) -> PathBuf {
    args.next()
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from)
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("verdant=info".parse()?))
        .init();

    info!("Verdant starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = config_path(std::env::args_os().skip(1));
    let mut config = WorldConfig::load_from(&path);
    config.validate();
    info!(
        "World seed {} ({:?}), chunks {}x{}, radius {}, {:?}",
        config.seed,
        config.biome,
        config.chunk_width,
        config.chunk_height,
        config.load_radius,
        config.reload_strategy
    );

    let mut session = Session::start(&config)?;
    let home = session.observer_tile();
    session.dig_down(6)?;

    let stride = TOUR_CHUNKS * i64::from(config.chunk_width);
    for target in [home.x + stride, home.x - stride, home.x] {
        session.walk_to(target)?;
        session.dig_down(4)?;
    }

    let stats = session.streamer().cache().stats();
    info!(
        "Cache: {} chunks, {} hits, {} misses, {} evicted",
        session.streamer().cache().len(),
        stats.hits,
        stats.misses,
        stats.evictions
    );
    info!("Collision rebuilds: {}", session.collision_rebuilds());
    info!("Mined {} resources", session.ledger().total());
    for (resource, count) in session.ledger().iter() {
        info!("Mined {:?}: {}", resource, count);
    }

    info!("Verdant shutdown complete");
    Ok(())
}
