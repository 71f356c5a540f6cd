//! A single vehicle in the traffic simulation

use super::occupancy::{Obstacle, TileOccupancy};
use super::types::{CarId, Direction, Mode, TilePos, VariantId};

/// A car in a lane
///
/// The extent is an axis-aligned rectangle; which of its horizontal edges is
/// the front depends on the lane's travel direction. While the car is
/// `Stopped` or `Crashed` it keeps a blocking marker on every tile its
/// extent covers, and that set is kept exactly in sync at every mode
/// transition.
#[derive(Debug, Clone)]
pub struct Car {
    pub id: CarId,
    /// Left edge in world units
    pub x: f32,
    /// Top edge in world units
    pub y: f32,
    /// Extent along the lane
    pub length: f32,
    /// Extent across the lane
    pub width: f32,
    pub variant: VariantId,
    pub mode: Mode,
    markers: Vec<TilePos>,
}

impl Car {
    pub fn new(id: CarId, x: f32, y: f32, length: f32, width: f32, variant: VariantId) -> Self {
        Self {
            id,
            x,
            y,
            length,
            width,
            variant,
            mode: Mode::Moving,
            markers: Vec::new(),
        }
    }

    /// The leading edge for the given travel direction
    pub fn front(&self, dir: Direction) -> f32 {
        match dir {
            Direction::Right => self.x + self.length,
            Direction::Left => self.x,
        }
    }

    /// The trailing edge for the given travel direction
    pub fn back(&self, dir: Direction) -> f32 {
        match dir {
            Direction::Right => self.x,
            Direction::Left => self.x + self.length,
        }
    }

    /// Advance along the travel direction by a non-negative distance
    pub fn advance(&mut self, dir: Direction, distance: f32) {
        self.x += dir.sign() * distance;
    }

    /// Place the car so its front edge sits exactly at the given position
    pub fn move_front_to(&mut self, dir: Direction, front: f32) {
        self.x = match dir {
            Direction::Right => front - self.length,
            Direction::Left => front,
        };
    }

    /// Tiles covered by the car's current extent
    pub fn covered_tiles(&self, tile_size: (f32, f32)) -> Vec<TilePos> {
        let (tw, th) = tile_size;
        let x0 = (self.x / tw).floor() as i32;
        let x1 = ((self.x + self.length) / tw).ceil() as i32;
        let y0 = (self.y / th).floor() as i32;
        let y1 = ((self.y + self.width) / th).ceil() as i32;

        let mut tiles = Vec::with_capacity(((x1 - x0) * (y1 - y0)).max(0) as usize);
        for y in y0..y1 {
            for x in x0..x1 {
                tiles.push(TilePos::new(x, y));
            }
        }
        tiles
    }

    /// Tiles currently holding this car's blocking markers
    pub fn blocking_tiles(&self) -> &[TilePos] {
        &self.markers
    }

    /// Transition the car's mode, keeping the blocking markers in sync
    ///
    /// Idempotent: re-entering the current mode is a no-op.
    pub fn set_mode(&mut self, mode: Mode, occupancy: &mut TileOccupancy, tile_size: (f32, f32)) {
        if mode == self.mode {
            return;
        }
        match (self.mode.blocks(), mode.blocks()) {
            (false, true) => {
                debug_assert!(self.markers.is_empty(), "moving car holds markers");
                self.markers = self.covered_tiles(tile_size);
                for &tile in &self.markers {
                    occupancy.place(tile, Obstacle { owner: self.id });
                }
            }
            (true, false) => {
                self.clear_markers(occupancy);
            }
            // Stopped <-> Crashed: the car has not moved, markers stay valid.
            (true, true) => {
                debug_assert_eq!(self.markers, self.covered_tiles(tile_size));
            }
            (false, false) => {}
        }
        self.mode = mode;
    }

    /// Remove all of this car's markers, e.g. before the car is destroyed
    pub fn clear_markers(&mut self, occupancy: &mut TileOccupancy) {
        for tile in self.markers.drain(..) {
            occupancy.remove(tile, self.id);
        }
    }
}
