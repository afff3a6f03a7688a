/// Tile cells and their collision classification.
/// Passability rules live on `TileCollision` so every system
/// (controller, resolver, actors, renderer) asks the same questions.

use crate::domain::geometry::Rect;
use crate::sim::assets::AssetHandle;

/// Tile size in pixels. Level space is `width * TILE_WIDTH` by `height * TILE_HEIGHT`.
pub const TILE_WIDTH: i32 = 40;
pub const TILE_HEIGHT: i32 = 32;
/// Horizontal center of a tile, used by ladder alignment.
pub const TILE_CENTER: i32 = TILE_WIDTH / 2;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TileCollision {
    /// Open space; never blocks.
    #[default]
    Passable,
    /// Blocks on every side.
    Impassable,
    /// One-way: only blocks an actor landing from above.
    Platform,
    /// Climbable; acts as ground only at the top of its column.
    Ladder,
}

impl TileCollision {
    /// Does the resolver need to look at this cell at all?
    pub fn is_obstacle(self) -> bool {
        !matches!(self, TileCollision::Passable)
    }

    /// Blocks horizontal movement.
    pub fn blocks_sideways(self) -> bool {
        matches!(self, TileCollision::Impassable)
    }

    pub fn is_ladder(self) -> bool {
        matches!(self, TileCollision::Ladder)
    }

    /// Surfaces that always resolve vertically regardless of overlap shape.
    pub fn prefers_vertical(self) -> bool {
        matches!(self, TileCollision::Platform)
    }
}

/// One cell of the static grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Tile {
    pub collision: TileCollision,
    /// Visual reference for the renderer; the simulation never reads it.
    pub visual: Option<AssetHandle>,
}

impl Tile {
    pub const fn new(collision: TileCollision, visual: Option<AssetHandle>) -> Self {
        Tile { collision, visual }
    }

    pub const fn open() -> Self {
        Tile { collision: TileCollision::Passable, visual: None }
    }
}

/// Pixel bounds of cell `(x, y)`.
pub fn cell_bounds(x: i32, y: i32) -> Rect {
    Rect::new(x * TILE_WIDTH, y * TILE_HEIGHT, TILE_WIDTH, TILE_HEIGHT)
}

/// Cell containing the pixel coordinate (floor division, so negatives map left/up).
pub fn cell_of(px: f32, py: f32) -> (i32, i32) {
    (
        (px / TILE_WIDTH as f32).floor() as i32,
        (py / TILE_HEIGHT as f32).floor() as i32,
    )
}
