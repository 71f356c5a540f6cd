//! A single-direction traffic lane
//!
//! Cars are kept ordered from lane-front (exit side) to lane-back (spawn
//! side). The per-tick pass walks that order, so every car sees the already
//! updated position of the car directly ahead of it.

use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use super::car::Car;
use super::config::RoadConfig;
use super::occupancy::TileOccupancy;
use super::spawn::{signed_jitter, SpawnModel};
use super::types::{CarIdGen, Direction, Mode};

/// A lane of the road
#[derive(Debug)]
pub struct Lane {
    pub index: usize,
    pub dir: Direction,
    /// The mode the lane's cars converge to
    pub mode: Mode,
    /// Position non-moving cars may not advance their front edge past
    pub stop_x: Option<f32>,
    /// Vertical center in world units
    pub center_y: f32,
    /// Cars ordered front-to-back along the travel direction
    pub cars: Vec<Car>,
}

impl Lane {
    pub fn new(index: usize, dir: Direction, center_y: f32) -> Self {
        Self {
            index,
            dir,
            mode: Mode::Moving,
            stop_x: None,
            center_y,
            cars: Vec::new(),
        }
    }

    /// Resume traffic. Idempotent.
    pub fn start(&mut self) {
        if self.mode != Mode::Moving {
            debug!("lane {} resuming", self.index);
        }
        self.mode = Mode::Moving;
        self.stop_x = None;
    }

    /// Halt traffic at the given stop position
    pub fn stop(&mut self, stop_x: f32) {
        debug!("lane {} stopping at x={}", self.index, stop_x);
        self.mode = Mode::Stopped;
        self.stop_x = Some(stop_x);
    }

    /// Whether there is room for one more car behind the back-most one
    fn needs_car(&self, config: &RoadConfig) -> bool {
        match self.cars.last() {
            None => true,
            Some(last) => match self.dir {
                Direction::Right => last.x >= config.road_x0(),
                Direction::Left => last.x + last.length <= config.road_x1(),
            },
        }
    }

    /// Whether the front-most car has fully left the road
    fn front_oob(&self, config: &RoadConfig) -> bool {
        match self.cars.first() {
            None => false,
            Some(first) => match self.dir {
                Direction::Right => first.x >= config.road_x1(),
                Direction::Left => first.x + first.length <= config.road_x0(),
            },
        }
    }

    /// Spawn one car at the lane's back, or at a random offset from the
    /// spawn edge when the lane is empty
    pub(crate) fn spawn_back(
        &mut self,
        config: &RoadConfig,
        spawn: &SpawnModel,
        ids: &mut CarIdGen,
        rng: &mut StdRng,
    ) {
        let (length, width) = config.car_size;

        let x = match self.cars.last() {
            // Spacing is keyed by the current mode of the car ahead, so a
            // spawn behind a still-moving car keeps the full moving gap.
            Some(last) => last.x - self.dir.sign() * (length + config.gap(last.mode)),
            None => {
                let gap = config.gap(self.mode);
                let offset = if gap > 0.0 {
                    rng.random_range(0.0..=gap)
                } else {
                    0.0
                };
                match self.dir {
                    Direction::Right => config.road_x0() + offset,
                    Direction::Left => config.road_x1() - length - offset,
                }
            }
        };

        let y = self.center_y - width / 2.0;
        let car = Car::new(ids.next(), x, y, length, width, spawn.sample(rng));
        self.cars.push(car);
    }

    /// Fill the lane until no more cars fit behind the back-most one
    pub(crate) fn fill(
        &mut self,
        config: &RoadConfig,
        spawn: &SpawnModel,
        ids: &mut CarIdGen,
        rng: &mut StdRng,
    ) {
        while self.needs_car(config) {
            self.spawn_back(config, spawn, ids, rng);
        }
    }

    /// Remove every car, dropping their blocking markers
    pub(crate) fn clear_cars(&mut self, occupancy: &mut TileOccupancy) {
        for mut car in self.cars.drain(..) {
            car.clear_markers(occupancy);
        }
    }

    /// Replace the lane's traffic with a crashed queue anchored so the lead
    /// car's front edge sits exactly at `stop_x`
    pub(crate) fn refill_crashed(
        &mut self,
        stop_x: f32,
        config: &RoadConfig,
        spawn: &SpawnModel,
        occupancy: &mut TileOccupancy,
        ids: &mut CarIdGen,
        rng: &mut StdRng,
    ) {
        self.clear_cars(occupancy);
        self.mode = Mode::Crashed;
        self.stop_x = Some(stop_x);

        let (length, width) = config.car_size;
        let y = self.center_y - width / 2.0;
        let mut lead = Car::new(ids.next(), 0.0, y, length, width, spawn.sample(rng));
        lead.move_front_to(self.dir, stop_x);
        lead.set_mode(Mode::Crashed, occupancy, config.tile_size);
        self.cars.push(lead);

        // Each car crashes in place before the next spawns behind it, so
        // the queue packs at the crashed gap.
        while self.needs_car(config) {
            self.spawn_back(config, spawn, ids, rng);
            if let Some(car) = self.cars.last_mut() {
                car.set_mode(Mode::Crashed, occupancy, config.tile_size);
            }
        }
    }

    /// Advance the lane by one tick: recycle, spawn, then move front-to-back
    pub fn update(
        &mut self,
        dt: f32,
        config: &RoadConfig,
        spawn: &SpawnModel,
        occupancy: &mut TileOccupancy,
        ids: &mut CarIdGen,
        rng: &mut StdRng,
    ) {
        // Recycle the car that has fully left the road.
        if self.front_oob(config) {
            let mut car = self.cars.remove(0);
            car.clear_markers(occupancy);
        }

        // Top up from the spawn edge.
        if self.needs_car(config) {
            self.spawn_back(config, spawn, ids, rng);
        }

        let dir = self.dir;
        let sign = dir.sign();
        let target = self.mode;
        let stop_x = self.stop_x;

        // True while every car processed so far is already in the lane's
        // target mode; a stop only propagates backwards through the queue
        // once each preceding car has actually stopped.
        let mut ahead_settled = true;

        for i in 0..self.cars.len() {
            let prev = if i > 0 {
                let ahead = &self.cars[i - 1];
                Some((ahead.back(dir), ahead.mode))
            } else {
                None
            };

            let car = &mut self.cars[i];

            if target == Mode::Moving {
                car.set_mode(Mode::Moving, occupancy, config.tile_size);
            }
            if car.mode != Mode::Moving {
                ahead_settled = ahead_settled && car.mode == target;
                continue;
            }

            let nominal = (config.car_speed + signed_jitter(config.speed_jitter, rng)).max(0.0) * dt;
            let mut advance = nominal;
            // The exact front position of the binding constraint, so a
            // clamped car lands on it without floating-point drift.
            let mut snap: Option<f32> = None;

            // Stop marker: binds only the first car whose queue ahead has
            // fully settled. A car already past the marker keeps full speed
            // and drives off the road; the marker then binds the first car
            // still behind it.
            let mut past_marker = false;
            if target != Mode::Moving && ahead_settled {
                if let Some(stop) = stop_x {
                    let room = sign * (stop - car.front(dir));
                    if room < 0.0 {
                        past_marker = true;
                    } else if room < advance {
                        advance = room;
                        snap = Some(stop);
                    }
                }
            }

            // Gap to the car directly ahead, keyed by that car's current
            // mode. Enforced every tick so jitter can never cause overlap.
            if let Some((prev_back, prev_mode)) = prev {
                let limit = prev_back - sign * config.gap(prev_mode);
                let room = sign * (limit - car.front(dir));
                if room < advance {
                    advance = room.max(0.0);
                    snap = if room >= 0.0 { Some(limit) } else { None };
                }
            }

            if advance <= 0.0 {
                // Settle only once everything ahead has; a fast car must not
                // adopt the target mode while a slower one is still braking.
                if target != Mode::Moving && ahead_settled && !past_marker && advance < nominal {
                    car.set_mode(target, occupancy, config.tile_size);
                    continue;
                }
            } else if advance < nominal {
                match snap {
                    Some(front) => car.move_front_to(dir, front),
                    None => car.advance(dir, advance),
                }
            } else {
                car.advance(dir, advance);
            }

            // A run-off car beyond the marker does not hold up the queue
            // behind it.
            if !past_marker {
                ahead_settled = false;
            }
        }
    }
}
