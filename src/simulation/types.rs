//! Core types for the road traffic engine
//!
//! These are standalone types that don't depend on any renderer.

/// A unique identifier for a spawned car
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CarId(pub usize);

/// Index of a lane within the road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneId(pub usize);

/// Index into the configured vehicle variant table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantId(pub usize);

/// A tile coordinate on the level grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A rectangular region of tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl TileRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        pos.x >= self.x && pos.x < self.x + self.w && pos.y >= self.y && pos.y < self.y + self.h
    }

    /// All tile positions covered by the rectangle
    pub fn tiles(&self) -> Vec<TilePos> {
        let mut tiles = Vec::with_capacity((self.w * self.h).max(0) as usize);
        for y in self.y..self.y + self.h {
            for x in self.x..self.x + self.w {
                tiles.push(TilePos::new(x, y));
            }
        }
        tiles
    }
}

/// Travel direction of a lane along the x axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards increasing x
    Right,
    /// Towards decreasing x
    Left,
}

impl Direction {
    /// Sign of the direction for position arithmetic (+1.0 or -1.0)
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Right => 1.0,
            Direction::Left => -1.0,
        }
    }
}

/// Mode of a lane or car
///
/// A lane's mode is the target its cars converge to; a car's own mode lags
/// behind until it has physically reached its stop point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Moving,
    Stopped,
    Crashed,
}

impl Mode {
    /// Whether a car in this mode leaves blocking markers on the tiles it covers
    pub fn blocks(&self) -> bool {
        !matches!(self, Mode::Moving)
    }
}

/// Allocates unique car ids
#[derive(Debug, Default)]
pub struct CarIdGen {
    next: usize,
}

impl CarIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self) -> CarId {
        let id = CarId(self.next);
        self.next += 1;
        id
    }
}
