//! Multi-lane crash stop-position solver
//!
//! Given one impact tile, derives a stop position for every lane at once.
//! Positions are propagated outward from the impacted lane, jittered, and
//! clamped into each lane's configured bounds; at the travel-direction
//! boundary the bounds are additionally tightened off the already-solved
//! side so a gap always remains for traffic to thread through.

use rand::rngs::StdRng;

use super::config::RoadConfig;
use super::spawn::signed_jitter;
use super::types::{Direction, TilePos};

/// Solve a stop position for every lane following an impact in `origin`
pub(crate) fn solve_stop_positions(
    config: &RoadConfig,
    impact: TilePos,
    origin: usize,
    rng: &mut StdRng,
) -> Vec<f32> {
    let n = config.lane_count();
    let mut stops = vec![0.0f32; n];

    let origin_dir = config.lane_dirs[origin];
    let raw =
        config.tile_edge(origin_dir, impact.x) + origin_dir.sign() * config.crash_follow_through;
    stops[origin] = jitter_clamp(raw, config.lane_world_bounds(origin), config, rng);

    propagate(config, &mut stops, origin, (origin + 1..n).collect(), rng);
    propagate(config, &mut stops, origin, (0..origin).rev().collect(), rng);

    stops
}

/// Walk outward from the origin, seeding each lane from the neighbor just
/// solved and tightening bounds past the direction boundary
fn propagate(
    config: &RoadConfig,
    stops: &mut [f32],
    origin: usize,
    lanes: Vec<usize>,
    rng: &mut StdRng,
) {
    let mut prev = origin;
    // Set once the walk crosses the direction boundary; every lane at and
    // beyond the crossing keeps this limit, not just its static bounds.
    let mut far_limit: Option<f32> = None;

    for lane in lanes {
        let dir = config.lane_dirs[lane];
        if dir != config.lane_dirs[prev] {
            // Opposing queues face each other here: reserve a minimum gap on
            // each side of the solved neighbor so a path stays open.
            let slack = 2.0 * config.gap_moving;
            far_limit = Some(match dir {
                Direction::Left => stops[prev] + slack,
                Direction::Right => stops[prev] - slack,
            });
        }

        let (static_lo, static_hi) = config.lane_world_bounds(lane);
        let (mut lo, mut hi) = (static_lo, static_hi);
        if let Some(limit) = far_limit {
            match dir {
                Direction::Left => lo = lo.max(limit),
                Direction::Right => hi = hi.min(limit),
            }
        }

        stops[lane] = if lo <= hi {
            jitter_clamp(stops[prev], (lo, hi), config, rng)
        } else {
            // Tightening collapsed the range; saturate to the static edge
            // nearest the reserved region rather than fail.
            match dir {
                Direction::Left => static_hi,
                Direction::Right => static_lo,
            }
        };
        prev = lane;
    }
}

/// Displace a position by a random, exponentially distributed offset and
/// clamp it into the given bounds. Clamping is saturating, never a rejection.
fn jitter_clamp(seed: f32, (lo, hi): (f32, f32), config: &RoadConfig, rng: &mut StdRng) -> f32 {
    (seed + signed_jitter(config.crash_pos_jitter, rng)).clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::simulation::types::TileRect;
    use crate::simulation::RoadConfig;

    fn solver_config() -> RoadConfig {
        RoadConfig {
            tile_size: (1.0, 1.0),
            tile_rect: TileRect::new(0, 0, 100, 4),
            lane_centers: vec![0.5, 1.5, 2.5, 3.5],
            lane_width: 1.0,
            lane_dirs: vec![
                Direction::Right,
                Direction::Right,
                Direction::Left,
                Direction::Left,
            ],
            lane_bounds: vec![(5, 44), (5, 44), (50, 95), (50, 95)],
            car_size: (6.0, 1.0),
            car_speed: 8.0,
            speed_jitter: 0.0,
            gap_moving: 5.0,
            gap_stopped: 2.0,
            gap_crashed: 0.0,
            crash_follow_through: 3.0,
            crash_pos_jitter: 4.0,
            crash_delay: 1.0,
            crash_control_lock: 0.5,
            variants: vec![crate::simulation::VariantWeight::new("car0", "red", 1.0)],
        }
    }

    #[test]
    fn positions_stay_within_configured_bounds() {
        let config = solver_config();
        let mut rng = StdRng::seed_from_u64(11);
        for seed_tile in [0, 20, 44, 70, 99] {
            let stops =
                solve_stop_positions(&config, TilePos::new(seed_tile, 1), 1, &mut rng);
            for (lane, &stop) in stops.iter().enumerate() {
                let (lo, hi) = config.lane_world_bounds(lane);
                assert!(
                    stop >= lo && stop <= hi,
                    "lane {} stop {} outside [{}, {}]",
                    lane,
                    stop,
                    lo,
                    hi
                );
            }
        }
    }

    #[test]
    fn boundary_lanes_keep_the_reserved_slack() {
        let config = solver_config();
        for seed in 0..50u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let stops = solve_stop_positions(&config, TilePos::new(30, 0), 0, &mut rng);
            // Lane 1 travels right, lane 2 left; their queues face each other.
            assert!(
                stops[2] - stops[1] >= config.gap_moving,
                "seed {}: boundary stops {} / {} leave no slack",
                seed,
                stops[1],
                stops[2]
            );
        }
    }

    #[test]
    fn no_jitter_puts_origin_at_follow_through() {
        let mut config = solver_config();
        config.crash_pos_jitter = 0.0;
        let mut rng = StdRng::seed_from_u64(0);
        let stops = solve_stop_positions(&config, TilePos::new(20, 0), 0, &mut rng);
        // Leading edge of column 20 for rightward travel is 21.
        assert_eq!(stops[0], 21.0 + config.crash_follow_through);
    }

    #[test]
    fn collapsed_bounds_still_yield_a_position() {
        let mut config = solver_config();
        // Force the left-side lanes into a range the boundary tightening
        // cannot satisfy.
        config.lane_bounds = vec![(40, 44), (40, 44), (40, 44), (40, 44)];
        config.crash_pos_jitter = 0.0;
        let mut rng = StdRng::seed_from_u64(3);
        let stops = solve_stop_positions(&config, TilePos::new(43, 0), 0, &mut rng);
        for (lane, &stop) in stops.iter().enumerate() {
            let (lo, hi) = config.lane_world_bounds(lane);
            assert!(
                stop >= lo && stop <= hi,
                "lane {} degenerate stop {} escaped [{}, {}]",
                lane,
                stop,
                lo,
                hi
            );
        }
    }

    #[test]
    fn degenerate_single_point_bounds() {
        let mut config = solver_config();
        config.lane_bounds = vec![(30, 30); 4];
        let mut rng = StdRng::seed_from_u64(9);
        let stops = solve_stop_positions(&config, TilePos::new(10, 0), 0, &mut rng);
        assert_eq!(stops[0], 30.0);
        assert_eq!(stops[1], 30.0);
    }
}
