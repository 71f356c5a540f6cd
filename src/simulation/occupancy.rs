//! Tile occupancy left behind by stopped traffic
//!
//! Stopped and crashed cars place a plain obstacle record on every tile
//! their extent covers. External pathfinding treats those tiles as blocked;
//! nothing here is part of an object hierarchy.

use std::collections::HashMap;

use super::types::{CarId, TilePos};

/// Capability for anything that blocks movement through a tile
pub trait Solid {
    fn is_solid(&self) -> bool;
}

/// A placeholder obstacle a stopped or crashed car leaves on a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obstacle {
    pub owner: CarId,
}

impl Solid for Obstacle {
    fn is_solid(&self) -> bool {
        true
    }
}

/// Store of per-tile obstacle records
#[derive(Debug, Default)]
pub struct TileOccupancy {
    tiles: HashMap<TilePos, Vec<Obstacle>>,
}

impl TileOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, pos: TilePos, obstacle: Obstacle) {
        self.tiles.entry(pos).or_default().push(obstacle);
    }

    /// Remove the given owner's marker from a tile, dropping the entry once empty
    pub fn remove(&mut self, pos: TilePos, owner: CarId) {
        if let Some(markers) = self.tiles.get_mut(&pos) {
            markers.retain(|o| o.owner != owner);
            if markers.is_empty() {
                self.tiles.remove(&pos);
            }
        }
    }

    pub fn is_blocked(&self, pos: TilePos) -> bool {
        self.tiles
            .get(&pos)
            .map(|markers| markers.iter().any(|o| o.is_solid()))
            .unwrap_or(false)
    }

    pub fn blocked_tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.tiles.keys().copied()
    }

    pub fn markers_at(&self, pos: TilePos) -> &[Obstacle] {
        self.tiles.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_and_remove_round_trip() {
        let mut occupancy = TileOccupancy::new();
        let pos = TilePos::new(3, 7);

        occupancy.place(pos, Obstacle { owner: CarId(1) });
        occupancy.place(pos, Obstacle { owner: CarId(2) });
        assert!(occupancy.is_blocked(pos));

        occupancy.remove(pos, CarId(1));
        assert!(occupancy.is_blocked(pos), "other owner's marker remains");

        occupancy.remove(pos, CarId(2));
        assert!(!occupancy.is_blocked(pos));
        assert_eq!(occupancy.blocked_tiles().count(), 0);
    }
}
