//! Traffic flow validation tests
//!
//! Exercises spawning, the per-tick movement pass, stop/start control and
//! the tile occupancy bookkeeping through the public RoadNetwork API.

use road_sim::simulation::{
    Direction, Mode, RoadConfig, RoadNetwork, TilePos, TileRect, VariantWeight,
};

/// One rightward lane on a unit tile grid, with no speed jitter, so
/// positions can be asserted exactly.
fn single_lane_config() -> RoadConfig {
    RoadConfig {
        tile_size: (1.0, 1.0),
        tile_rect: TileRect::new(0, 0, 100, 1),
        lane_centers: vec![0.5],
        lane_width: 1.0,
        lane_dirs: vec![Direction::Right],
        lane_bounds: vec![(0, 99)],
        car_size: (6.0, 1.0),
        car_speed: 10.0,
        speed_jitter: 0.0,
        gap_moving: 5.0,
        gap_stopped: 2.0,
        gap_crashed: 0.0,
        crash_follow_through: 3.0,
        crash_pos_jitter: 0.0,
        crash_delay: 1.0,
        crash_control_lock: 0.5,
        variants: vec![VariantWeight::new("car0", "red", 1.0)],
    }
}

/// Signed distance from a car's front to the back of the car ahead of it
fn gap_between(ahead: &road_sim::simulation::Car, behind: &road_sim::simulation::Car, dir: Direction) -> f32 {
    dir.sign() * (ahead.back(dir) - behind.front(dir))
}

#[test]
fn test_free_flow_keeps_the_moving_gap() {
    let config = RoadConfig::default();
    let gap_moving = config.gap_moving;
    let mut network = RoadNetwork::new_with_seed(config, 42).unwrap();

    for _ in 0..300 {
        network.update(0.05);
        for lane in network.lanes() {
            for pair in lane.cars.windows(2) {
                let gap = gap_between(&pair[0], &pair[1], lane.dir);
                assert!(
                    gap >= gap_moving - 1e-3,
                    "lane {} gap {} below moving minimum",
                    lane.index,
                    gap
                );
            }
        }
    }
}

#[test]
fn test_cars_never_overlap_under_control_churn() {
    let mut network = RoadNetwork::new_with_seed(RoadConfig::default(), 7).unwrap();

    for tick in 0..600u32 {
        // Stop and restart different rows on a rolling schedule.
        let row = 5 + (tick / 40) as i32 % 5;
        match tick % 80 {
            0 => network.stop(TilePos::new(7, row)),
            40 => network.start(TilePos::new(7, row)),
            _ => {}
        }
        network.update(0.05);

        for lane in network.lanes() {
            for pair in lane.cars.windows(2) {
                let gap = gap_between(&pair[0], &pair[1], lane.dir);
                assert!(
                    gap >= -1e-3,
                    "lane {} cars overlap by {} at tick {}",
                    lane.index,
                    -gap,
                    tick
                );
            }
        }
    }
}

#[test]
fn test_spawn_gap_follows_the_back_most_cars_mode() {
    let config = single_lane_config();
    let mut network = RoadNetwork::new_with_seed(config, 17).unwrap();
    network.stop(TilePos::new(50, 0));

    // While the queue forms, spawns land behind both moving and stopped
    // back-most cars; the gap must match the predecessor's current mode
    // every tick, not just stay non-negative.
    for tick in 0..400 {
        network.update(0.5);
        let lane = &network.lanes()[0];
        for pair in lane.cars.windows(2) {
            let needed = network.config().gap(pair[0].mode);
            let gap = gap_between(&pair[0], &pair[1], lane.dir);
            assert!(
                gap >= needed - 1e-3,
                "tick {}: gap {} to a {:?} predecessor needs {}",
                tick,
                gap,
                pair[0].mode,
                needed
            );
        }
    }
}

#[test]
fn test_cars_past_the_marker_drive_off_the_road() {
    let config = single_lane_config();
    let mut network = RoadNetwork::new_with_seed(config, 13).unwrap();

    // Let the lead car get downstream of column 50 before the stop lands.
    for _ in 0..5 {
        network.update(1.0);
    }
    let lead_front = network.lanes()[0].cars[0].front(Direction::Right);
    assert!(lead_front > 51.0);

    network.stop(TilePos::new(50, 0));
    network.update(1.0);

    // The car past the marker keeps full speed instead of freezing.
    let lane = &network.lanes()[0];
    assert_eq!(lane.cars[0].mode, Mode::Moving);
    assert_eq!(lane.cars[0].front(Direction::Right), lead_front + 10.0);

    // Once it clears the road, the queue settles exactly at the marker and
    // nothing ends up stopped beyond it.
    for _ in 0..30 {
        network.update(1.0);
    }
    let lane = &network.lanes()[0];
    assert_eq!(lane.cars[0].mode, Mode::Stopped);
    assert_eq!(lane.cars[0].front(Direction::Right), 51.0);
    for car in &lane.cars {
        if car.mode == Mode::Stopped {
            assert!(car.front(Direction::Right) <= 51.0);
        }
    }
}

#[test]
fn test_stopped_cars_hold_their_position() {
    let mut network = RoadNetwork::new_with_seed(RoadConfig::default(), 3).unwrap();
    for row in 5..10 {
        network.stop(TilePos::new(7, row));
    }
    for _ in 0..200 {
        network.update(0.1);
    }

    let frozen: Vec<(usize, Vec<f32>)> = network
        .lanes()
        .iter()
        .map(|lane| {
            (
                lane.index,
                lane.cars
                    .iter()
                    .filter(|car| car.mode == Mode::Stopped)
                    .map(|car| car.x)
                    .collect(),
            )
        })
        .collect();
    assert!(
        frozen.iter().any(|(_, xs)| !xs.is_empty()),
        "no car settled after 20 simulated seconds"
    );

    network.update(0.1);

    for (index, xs) in frozen {
        let after: Vec<f32> = network.lanes()[index]
            .cars
            .iter()
            .filter(|car| car.mode == Mode::Stopped)
            .map(|car| car.x)
            .collect();
        for &x in &xs {
            assert!(
                after.contains(&x),
                "stopped car in lane {} drifted from x={}",
                index,
                x
            );
        }
    }
}

#[test]
fn test_queue_settles_exactly_at_the_stop_marker() {
    let config = single_lane_config();
    let mut network = RoadNetwork::new_with_seed(config, 11).unwrap();

    // Tile column 50, rightward travel: the stop marker resolves to x=51.
    network.stop(TilePos::new(50, 0));
    for _ in 0..200 {
        network.update(1.0);
    }

    let lane = &network.lanes()[0];
    let lead = &lane.cars[0];
    assert_eq!(lead.mode, Mode::Stopped);
    assert_eq!(lead.front(Direction::Right), 51.0);

    let second = &lane.cars[1];
    assert_eq!(second.mode, Mode::Stopped);
    assert_eq!(
        second.front(Direction::Right),
        lead.back(Direction::Right) - 2.0
    );

    // Zero net drift once settled.
    let before: Vec<f32> = lane.cars.iter().map(|car| car.x).collect();
    network.update(1.0);
    let after: Vec<f32> = network.lanes()[0].cars.iter().map(|car| car.x).collect();
    assert_eq!(before[..2], after[..2]);
}

#[test]
fn test_start_is_idempotent() {
    let config = RoadConfig::default();
    let mut once = RoadNetwork::new_with_seed(config.clone(), 9).unwrap();
    let mut twice = RoadNetwork::new_with_seed(config, 9).unwrap();

    for network in [&mut once, &mut twice] {
        network.stop(TilePos::new(7, 5));
        for _ in 0..50 {
            network.update(0.1);
        }
    }

    once.start(TilePos::new(7, 5));
    twice.start(TilePos::new(7, 5));
    twice.start(TilePos::new(7, 5));

    for _ in 0..50 {
        once.update(0.1);
        twice.update(0.1);
    }

    for (a, b) in once.lanes().iter().zip(twice.lanes()) {
        assert_eq!(a.mode, b.mode);
        assert_eq!(a.cars.len(), b.cars.len());
        for (car_a, car_b) in a.cars.iter().zip(&b.cars) {
            assert_eq!(car_a.x, car_b.x);
            assert_eq!(car_a.mode, car_b.mode);
        }
    }
}

#[test]
fn test_lane_moving_query_tracks_control() {
    let mut network = RoadNetwork::new_with_seed(RoadConfig::default(), 4).unwrap();
    assert!(network.lane_moving(5));

    network.stop(TilePos::new(7, 5));
    assert!(!network.lane_moving(5));
    // Other rows are unaffected.
    assert!(network.lane_moving(8));

    network.start(TilePos::new(7, 5));
    assert!(network.lane_moving(5));
}

#[test]
fn test_blocking_markers_match_stopped_extents() {
    let mut network = RoadNetwork::new_with_seed(single_lane_config(), 2).unwrap();
    network.stop(TilePos::new(50, 0));
    for _ in 0..200 {
        network.update(1.0);
    }

    let stopped: Vec<_> = network.lanes()[0]
        .cars
        .iter()
        .filter(|car| car.mode == Mode::Stopped)
        .cloned()
        .collect();
    assert!(!stopped.is_empty());

    for car in &stopped {
        let covered = car.covered_tiles((1.0, 1.0));
        assert_eq!(car.blocking_tiles(), covered.as_slice());
        for &tile in car.blocking_tiles() {
            assert!(
                network.occupancy().is_blocked(tile),
                "tile {:?} under a stopped car is not blocked",
                tile
            );
        }
    }

    // Resuming clears every marker on the next tick.
    network.start(TilePos::new(50, 0));
    network.update(1.0);
    assert_eq!(network.occupancy().blocked_tiles().count(), 0);
}

#[test]
fn test_occupied_tiles_cover_the_road_footprint() {
    let network = RoadNetwork::new_with_seed(RoadConfig::default(), 1).unwrap();
    let tiles = network.occupied_tiles();

    assert_eq!(tiles.len(), 15 * 5);
    assert!(tiles.contains(&TilePos::new(0, 5)));
    assert!(tiles.contains(&TilePos::new(14, 9)));
    assert!(!tiles.contains(&TilePos::new(0, 0)));
}

#[test]
fn test_spawned_cars_fill_a_fresh_lane() {
    let network = RoadNetwork::new_with_seed(RoadConfig::default(), 6).unwrap();
    for lane in network.lanes() {
        assert!(
            !lane.cars.is_empty(),
            "lane {} spawned no traffic at construction",
            lane.index
        );
        assert!(lane.cars.iter().all(|car| car.mode == Mode::Moving));
    }
}
