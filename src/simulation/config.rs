//! Road configuration and construction-time validation
//!
//! All numeric constants the traffic engine consumes from its environment
//! live here. Speeds are expressed in world units per second and scaled by
//! the tick duration passed to `RoadNetwork::update`, so the simulation is
//! independent of render cadence.

use anyhow::{bail, Result};

use super::types::{Direction, Mode, TileRect};

/// A vehicle appearance variant with its spawn weight
///
/// The weight is the product of the vehicle-model weight and the colour
/// weight; `SpawnModel` normalizes over the whole table.
#[derive(Debug, Clone)]
pub struct VariantWeight {
    pub model: String,
    pub colour: String,
    pub weight: f32,
}

impl VariantWeight {
    pub fn new(model: &str, colour: &str, weight: f32) -> Self {
        Self {
            model: model.to_string(),
            colour: colour.to_string(),
            weight,
        }
    }
}

/// Configuration for the road and its lanes
#[derive(Debug, Clone)]
pub struct RoadConfig {
    /// Size of one level tile in world units
    pub tile_size: (f32, f32),
    /// The rectangular tile region the road occupies
    pub tile_rect: TileRect,
    /// Vertical center of each lane in world units
    pub lane_centers: Vec<f32>,
    /// Vertical extent of a lane in world units
    pub lane_width: f32,
    /// Travel direction of each lane, fixed at construction
    pub lane_dirs: Vec<Direction>,
    /// Per-lane `[min, max]` tile-x range a crash stop position may occupy
    pub lane_bounds: Vec<(i32, i32)>,
    /// Car extent in world units (length along the lane, width across it)
    pub car_size: (f32, f32),
    /// Nominal car speed in world units per second
    pub car_speed: f32,
    /// Mean of the exponential per-tick speed variation (world units/second)
    pub speed_jitter: f32,
    /// Minimum gap to the car ahead while it is moving
    pub gap_moving: f32,
    /// Minimum gap to the car ahead once it has stopped
    pub gap_stopped: f32,
    /// Minimum gap to the car ahead after a crash
    pub gap_crashed: f32,
    /// Distance a crashing car travels past the impact point
    pub crash_follow_through: f32,
    /// Mean of the exponential displacement applied to crash stop positions
    pub crash_pos_jitter: f32,
    /// Seconds between the crash trigger and its visible effect
    pub crash_delay: f32,
    /// Seconds that control input stays suspended after the trigger
    pub crash_control_lock: f32,
    /// Weighted table of vehicle variants for spawning
    pub variants: Vec<VariantWeight>,
}

impl RoadConfig {
    pub fn lane_count(&self) -> usize {
        self.lane_centers.len()
    }

    /// Minimum gap behind a car in the given mode
    pub fn gap(&self, mode: Mode) -> f32 {
        match mode {
            Mode::Moving => self.gap_moving,
            Mode::Stopped => self.gap_stopped,
            Mode::Crashed => self.gap_crashed,
        }
    }

    /// Left edge of the road in world units
    pub fn road_x0(&self) -> f32 {
        self.tile_rect.x as f32 * self.tile_size.0
    }

    /// Right edge of the road in world units
    pub fn road_x1(&self) -> f32 {
        (self.tile_rect.x + self.tile_rect.w) as f32 * self.tile_size.0
    }

    /// The side of the tile column that traffic travelling `dir` reaches first,
    /// in world units. This is where a stop marker at that column resolves to.
    pub fn tile_edge(&self, dir: Direction, tile_x: i32) -> f32 {
        let lead = match dir {
            Direction::Right => 1,
            Direction::Left => 0,
        };
        (tile_x + lead) as f32 * self.tile_size.0
    }

    /// A lane's crash stop bounds converted to world units
    pub fn lane_world_bounds(&self, lane: usize) -> (f32, f32) {
        let (lo, hi) = self.lane_bounds[lane];
        (lo as f32 * self.tile_size.0, hi as f32 * self.tile_size.0)
    }

    /// Validate the configuration. Errors here are fatal: the simulation
    /// refuses to start rather than run with a broken setup.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size.0 <= 0.0 || self.tile_size.1 <= 0.0 {
            bail!("tile size must be positive, got {:?}", self.tile_size);
        }
        if self.tile_rect.w <= 0 || self.tile_rect.h <= 0 {
            bail!("road tile rect must be non-empty, got {:?}", self.tile_rect);
        }
        let n = self.lane_count();
        if n == 0 {
            bail!("road must have at least one lane");
        }
        if self.lane_dirs.len() != n {
            bail!(
                "lane direction table has {} entries for {} lanes",
                self.lane_dirs.len(),
                n
            );
        }
        if self.lane_bounds.len() != n {
            bail!(
                "lane bounds table has {} entries for {} lanes",
                self.lane_bounds.len(),
                n
            );
        }
        for (lane, &(lo, hi)) in self.lane_bounds.iter().enumerate() {
            if lo > hi {
                bail!("lane {} has malformed stop bounds [{}, {}]", lane, lo, hi);
            }
        }
        // Lanes are parallel channels split once by travel direction.
        let switches = self
            .lane_dirs
            .windows(2)
            .filter(|pair| pair[0] != pair[1])
            .count();
        if switches > 1 {
            bail!("lane directions must form at most one direction boundary");
        }
        if self.lane_width <= 0.0 {
            bail!("lane width must be positive");
        }
        if self.car_size.0 <= 0.0 || self.car_size.1 <= 0.0 {
            bail!("car size must be positive, got {:?}", self.car_size);
        }
        if self.car_speed < 0.0 || self.speed_jitter < 0.0 || self.crash_pos_jitter < 0.0 {
            bail!("speeds and jitter means must be non-negative");
        }
        if self.gap_moving < 0.0 || self.gap_stopped < 0.0 || self.gap_crashed < 0.0 {
            bail!("minimum gaps must be non-negative");
        }
        if self.crash_delay < 0.0 || self.crash_control_lock < 0.0 {
            bail!("crash timings must be non-negative");
        }
        if self.variants.is_empty() {
            bail!("spawn weight table is empty");
        }
        for variant in &self.variants {
            if !(variant.weight > 0.0 && variant.weight.is_finite()) {
                bail!(
                    "variant {} {} has invalid weight {}",
                    variant.model,
                    variant.colour,
                    variant.weight
                );
            }
        }
        Ok(())
    }
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            tile_size: (40.0, 40.0),
            tile_rect: TileRect::new(0, 5, 15, 5),
            lane_centers: vec![231.0, 275.0, 327.0, 375.0],
            lane_width: 40.0,
            lane_dirs: vec![
                Direction::Right,
                Direction::Right,
                Direction::Left,
                Direction::Left,
            ],
            lane_bounds: vec![(2, 12); 4],
            car_size: (60.0, 30.0),
            car_speed: 600.0,
            speed_jitter: 20.0,
            gap_moving: 50.0,
            gap_stopped: 5.0,
            gap_crashed: 0.0,
            crash_follow_through: 30.0,
            crash_pos_jitter: 50.0,
            crash_delay: 5.0,
            crash_control_lock: 3.0,
            variants: vec![
                VariantWeight::new("car0", "red", 1.0),
                VariantWeight::new("car0", "blue", 1.0),
                VariantWeight::new("car0", "yellow", 0.3),
                VariantWeight::new("van0", "white", 0.3),
                VariantWeight::new("lorry0", "blue", 0.2),
                VariantWeight::new("lorry0", "orange", 0.1),
            ],
        }
    }
}
