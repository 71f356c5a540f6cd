//! Standalone road traffic engine
//!
//! This module contains all the core traffic simulation logic: the lane and
//! car model, the per-tick movement pass, traffic-light stop/start control
//! and the multi-lane crash solver. It can be driven and tested from the
//! console without booting up a full game.

mod car;
mod config;
mod crash;
mod lane;
mod occupancy;
mod road_network;
mod spawn;
mod types;

// Re-export public types for external use
#[allow(unused_imports)]
pub use car::Car;
#[allow(unused_imports)]
pub use config::{RoadConfig, VariantWeight};
#[allow(unused_imports)]
pub use lane::Lane;
#[allow(unused_imports)]
pub use occupancy::{Obstacle, Solid, TileOccupancy};
#[allow(unused_imports)]
pub use spawn::SpawnModel;
#[allow(unused_imports)]
pub use types::{CarId, Direction, LaneId, Mode, TilePos, TileRect, VariantId};
pub use road_network::RoadNetwork;
