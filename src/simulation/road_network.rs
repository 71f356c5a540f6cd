//! The road network: owns the lanes and drives the per-tick update
//!
//! This is the only mutation entry point for external systems. Traffic
//! lights and collision logic call `start`, `stop` and `crash` with tile
//! positions; everything else reads through the query API.

use anyhow::Result;
use log::{debug, info};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::car::Car;
use super::config::RoadConfig;
use super::crash::solve_stop_positions;
use super::lane::Lane;
use super::occupancy::TileOccupancy;
use super::spawn::SpawnModel;
use super::types::{CarIdGen, LaneId, Mode, TilePos};

/// A crash that has been triggered but not yet taken effect
#[derive(Debug, Clone, Copy)]
struct PendingCrash {
    impact: TilePos,
    origin: usize,
    fire_at: f64,
}

/// The full road: lanes, spawned traffic and tile occupancy
#[derive(Debug)]
pub struct RoadNetwork {
    config: RoadConfig,
    lanes: Vec<Lane>,
    occupancy: TileOccupancy,
    spawn: SpawnModel,
    rng: StdRng,
    ids: CarIdGen,
    /// Simulation time in seconds, advanced by `update`. Accumulated in
    /// f64: summing many small f32 ticks lands short of the deferred
    /// crash and control-lock deadlines.
    time: f64,
    pending_crash: Option<PendingCrash>,
    control_locked_until: f64,
}

impl RoadNetwork {
    /// Build a road network with an OS-seeded random source
    pub fn new(config: RoadConfig) -> Result<Self> {
        Self::new_internal(config, StdRng::from_os_rng())
    }

    /// Build a road network with a fixed seed, for deterministic runs
    pub fn new_with_seed(config: RoadConfig, seed: u64) -> Result<Self> {
        Self::new_internal(config, StdRng::seed_from_u64(seed))
    }

    fn new_internal(config: RoadConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let spawn = SpawnModel::new(&config.variants)?;

        let lanes = config
            .lane_centers
            .iter()
            .zip(&config.lane_dirs)
            .enumerate()
            .map(|(index, (&center_y, &dir))| Lane::new(index, dir, center_y))
            .collect();

        let mut network = Self {
            config,
            lanes,
            occupancy: TileOccupancy::new(),
            spawn,
            rng,
            ids: CarIdGen::new(),
            time: 0.0,
            pending_crash: None,
            control_locked_until: 0.0,
        };

        // Seed each lane at the spawn edge; traffic streams in over the
        // first few simulated seconds.
        for lane in &mut network.lanes {
            lane.fill(
                &network.config,
                &network.spawn,
                &mut network.ids,
                &mut network.rng,
            );
        }
        info!(
            "road network ready: {} lanes, {} cars",
            network.lanes.len(),
            network.lanes.iter().map(|l| l.cars.len()).sum::<usize>()
        );
        Ok(network)
    }

    /// Advance the simulation by one tick of `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.time += dt as f64;

        if let Some(pending) = self.pending_crash {
            if self.time >= pending.fire_at {
                self.pending_crash = None;
                self.commit_crash(pending.impact, pending.origin);
            }
        }

        let Self {
            config,
            lanes,
            occupancy,
            spawn,
            rng,
            ids,
            ..
        } = self;
        for lane in lanes.iter_mut() {
            lane.update(dt, config, spawn, occupancy, ids, rng);
        }
    }

    /// Lanes whose vertical band overlaps the given tile row. Lane width may
    /// be narrower than a tile, so one row can map to several lanes.
    fn lanes_covering_row(&self, row: i32) -> Vec<usize> {
        let th = self.config.tile_size.1;
        let (tile_lo, tile_hi) = (row as f32 * th, (row + 1) as f32 * th);
        let half = self.config.lane_width / 2.0;

        self.lanes
            .iter()
            .filter(|lane| lane.center_y - half < tile_hi && lane.center_y + half > tile_lo)
            .map(|lane| lane.index)
            .collect()
    }

    /// The single lane a crash at the given row originates in: the first
    /// covering lane, or the one whose center is closest to the row.
    fn lane_at_row(&self, row: i32) -> usize {
        if let Some(&lane) = self.lanes_covering_row(row).first() {
            return lane;
        }
        let row_center = (row as f32 + 0.5) * self.config.tile_size.1;
        self.lanes
            .iter()
            .min_by_key(|lane| OrderedFloat((lane.center_y - row_center).abs()))
            .map(|lane| lane.index)
            .unwrap_or(0)
    }

    /// Whether control input is currently suspended by a recent crash
    pub fn controls_locked(&self) -> bool {
        self.time < self.control_locked_until
    }

    /// Resume traffic in every lane covering the given tile row. Idempotent.
    pub fn start(&mut self, pos: TilePos) {
        if self.controls_locked() {
            debug!("start({:?}) ignored: controls locked", pos);
            return;
        }
        for lane in self.lanes_covering_row(pos.y) {
            self.lanes[lane].start();
        }
    }

    /// Halt traffic in every lane covering the given tile row, at the
    /// tile-boundary edge nearest each lane's travel direction.
    pub fn stop(&mut self, pos: TilePos) {
        if self.controls_locked() {
            debug!("stop({:?}) ignored: controls locked", pos);
            return;
        }
        for lane in self.lanes_covering_row(pos.y) {
            let stop_x = self.config.tile_edge(self.lanes[lane].dir, pos.x);
            self.lanes[lane].stop(stop_x);
        }
    }

    /// Trigger the deferred multi-lane crash sequence
    ///
    /// The visible effect lands `crash_delay` seconds later; control input
    /// is suspended for `crash_control_lock` seconds from the trigger.
    /// Re-triggering while a crash is pending, or on a lane that is already
    /// crashed, is ignored.
    pub fn crash(&mut self, impact: TilePos) {
        if self.controls_locked() || self.pending_crash.is_some() {
            debug!("crash({:?}) ignored: sequence already underway", impact);
            return;
        }
        let origin = self.lane_at_row(impact.y);
        if self.lanes[origin].mode == Mode::Crashed {
            debug!("crash({:?}) ignored: lane {} already crashed", impact, origin);
            return;
        }

        info!(
            "crash triggered at {:?} in lane {}, effect in {}s",
            impact, origin, self.config.crash_delay
        );
        self.pending_crash = Some(PendingCrash {
            impact,
            origin,
            fire_at: self.time + self.config.crash_delay as f64,
        });
        self.control_locked_until = self.time + self.config.crash_control_lock as f64;
    }

    /// Solve stop positions for every lane and rebuild their traffic as
    /// crashed queues anchored at the solved positions
    fn commit_crash(&mut self, impact: TilePos, origin: usize) {
        let stops = solve_stop_positions(&self.config, impact, origin, &mut self.rng);
        info!("crash committed at {:?}: stop positions {:?}", impact, stops);

        let Self {
            config,
            lanes,
            occupancy,
            spawn,
            rng,
            ids,
            ..
        } = self;
        for (lane, &stop_x) in lanes.iter_mut().zip(&stops) {
            lane.refill_crashed(stop_x, config, spawn, occupancy, ids, rng);
        }
    }

    /// Whether at least one lane covering the given tile row is moving
    pub fn lane_moving(&self, row: i32) -> bool {
        self.lanes_covering_row(row)
            .into_iter()
            .any(|lane| self.lanes[lane].mode == Mode::Moving)
    }

    /// The road's current tile footprint
    pub fn occupied_tiles(&self) -> Vec<TilePos> {
        self.config.tile_rect.tiles()
    }

    /// Every car on the road, with its lane
    pub fn cars(&self) -> impl Iterator<Item = (LaneId, &Car)> {
        self.lanes
            .iter()
            .flat_map(|lane| lane.cars.iter().map(|car| (LaneId(lane.index), car)))
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn occupancy(&self) -> &TileOccupancy {
        &self.occupancy
    }

    pub fn config(&self) -> &RoadConfig {
        &self.config
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::Direction;

    #[test]
    fn one_tile_row_can_map_to_several_lanes() {
        let mut config = RoadConfig::default();
        // Two narrow lanes inside the same 40-unit tile row.
        config.lane_centers = vec![210.0, 230.0, 327.0, 375.0];
        config.lane_width = 18.0;
        let network = RoadNetwork::new_with_seed(config, 1).unwrap();

        assert_eq!(network.lanes_covering_row(5), vec![0, 1]);
        assert_eq!(network.lanes_covering_row(8), vec![2]);
    }

    #[test]
    fn crash_origin_falls_back_to_nearest_lane() {
        let network = RoadNetwork::new_with_seed(RoadConfig::default(), 1).unwrap();
        // Row 0 is far above every lane; lane 0 is closest.
        assert_eq!(network.lane_at_row(0), 0);
        // Row 20 is far below; the last lane is closest.
        assert_eq!(network.lane_at_row(20), 3);
    }

    #[test]
    fn construction_rejects_broken_config() {
        let mut config = RoadConfig::default();
        config.lane_dirs = vec![Direction::Right];
        assert!(RoadNetwork::new_with_seed(config, 1).is_err());
    }
}
