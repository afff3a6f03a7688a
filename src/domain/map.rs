/// TileCollisionMap: the immutable static grid of a loaded level.
///
/// ## Boundary policy
///
/// ```text
///   query              | result
///   -------------------|------------
///   x < 0 or x >= w    | Impassable   (level ends are walls)
///   y < 0 or y >= h    | Passable     (open sky above, pit below)
///   inside             | stored cell
/// ```
///
/// The x test runs first, so the corners outside the grid are walls.
/// The two foot queries used by ladder logic (`collision_behind`,
/// `collision_below`) also clamp a negative row to 0.

use glam::Vec2;

use crate::domain::geometry::Rect;
use crate::domain::tile::{cell_bounds, Tile, TileCollision, TILE_HEIGHT, TILE_WIDTH};

#[derive(Clone, Debug)]
pub struct TileCollisionMap {
    width: i32,
    height: i32,
    cells: Vec<Tile>,
}

impl TileCollisionMap {
    /// Build from row-major cells. `cells.len()` must equal `width * height`.
    pub fn new(width: usize, height: usize, cells: Vec<Tile>) -> Self {
        debug_assert_eq!(cells.len(), width * height);
        TileCollisionMap { width: width as i32, height: height as i32, cells }
    }

    /// Width in cells.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Level extent in pixels.
    pub fn pixel_size(&self) -> (i32, i32) {
        (self.width * TILE_WIDTH, self.height * TILE_HEIGHT)
    }

    /// Collision classification with the boundary policy applied.
    pub fn classify(&self, x: i32, y: i32) -> TileCollision {
        if x < 0 || x >= self.width {
            return TileCollision::Impassable;
        }
        if y < 0 || y >= self.height {
            return TileCollision::Passable;
        }
        self.cells[(y * self.width + x) as usize].collision
    }

    /// Stored cell, or `None` outside the grid.
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize)
    }

    /// Pixel bounds of a cell (valid for out-of-range cells too).
    pub fn bounds(&self, x: i32, y: i32) -> Rect {
        cell_bounds(x, y)
    }

    /// Cell the foot point sits in, one pixel above the feet.
    /// Used when climbing up.
    pub fn collision_behind(&self, foot: Vec2) -> TileCollision {
        self.classify_foot(foot.x, foot.y - 1.0)
    }

    /// Cell the foot point sits in. Used when climbing down.
    pub fn collision_below(&self, foot: Vec2) -> TileCollision {
        self.classify_foot(foot.x, foot.y)
    }

    fn classify_foot(&self, px: f32, py: f32) -> TileCollision {
        let x = (px / TILE_WIDTH as f32).floor() as i32;
        let y = ((py / TILE_HEIGHT as f32).floor() as i32).max(0);
        self.classify(x, y)
    }

    /// Inclusive cell range covered by `rect`: `(left, top, right, bottom)`.
    pub fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let left = (rect.left as f32 / TILE_WIDTH as f32).floor() as i32;
        let right = (rect.right() as f32 / TILE_WIDTH as f32).ceil() as i32 - 1;
        let top = (rect.top as f32 / TILE_HEIGHT as f32).floor() as i32;
        let bottom = (rect.bottom() as f32 / TILE_HEIGHT as f32).ceil() as i32 - 1;
        (left, top, right, bottom)
    }

    /// Is this ladder cell the top of its column (nothing climbable above it)?
    pub fn is_ladder_top(&self, x: i32, y: i32) -> bool {
        self.classify(x, y).is_ladder() && !self.classify(x, y - 1).is_ladder()
    }

    pub fn has_ladders(&self) -> bool {
        self.cells.iter().any(|t| t.collision.is_ladder())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Build a map from a diagram: `#` wall, `-` platform, `L` ladder, anything else open.
    pub(crate) fn map_from(rows: &[&str]) -> TileCollisionMap {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        let cells = rows
            .iter()
            .flat_map(|row| row.chars())
            .map(|ch| {
                let collision = match ch {
                    '#' => TileCollision::Impassable,
                    '-' => TileCollision::Platform,
                    'L' => TileCollision::Ladder,
                    _ => TileCollision::Passable,
                };
                Tile::new(collision, None)
            })
            .collect();
        TileCollisionMap::new(width, height, cells)
    }

    fn sample() -> TileCollisionMap {
        map_from(&[
            "....",
            ".L-.",
            ".L..",
            "####",
        ])
    }

    #[test]
    fn inside_cells_return_stored_collision() {
        let m = sample();
        assert_eq!(m.classify(1, 1), TileCollision::Ladder);
        assert_eq!(m.classify(2, 1), TileCollision::Platform);
        assert_eq!(m.classify(0, 3), TileCollision::Impassable);
        assert_eq!(m.classify(3, 0), TileCollision::Passable);
    }

    #[test]
    fn corners_outside_are_walls() {
        let m = sample();
        assert_eq!(m.classify(-1, -1), TileCollision::Impassable);
        assert_eq!(m.classify(4, 10), TileCollision::Impassable);
    }

    #[test]
    fn foot_queries_clamp_negative_rows() {
        let m = map_from(&[
            ".L..",
            "....",
        ]);
        // Feet far above the level still read row 0.
        let foot = Vec2::new(60.0, -200.0);
        assert_eq!(m.collision_behind(foot), TileCollision::Ladder);
        assert_eq!(m.collision_below(foot), TileCollision::Ladder);
    }

    #[test]
    fn behind_reads_one_pixel_above_feet() {
        let m = sample();
        // Feet exactly on the boundary between row 1 and row 2 of the ladder column.
        let foot = Vec2::new(60.0, 64.0);
        assert_eq!(m.collision_behind(foot), TileCollision::Ladder); // row 1
        assert_eq!(m.collision_below(foot), TileCollision::Ladder); // row 2
        // Standing on the floor under the ladder.
        let foot = Vec2::new(60.0, 96.0);
        assert_eq!(m.collision_behind(foot), TileCollision::Ladder);
        assert_eq!(m.collision_below(foot), TileCollision::Impassable);
    }

    #[test]
    fn ladder_top_detection() {
        let m = sample();
        assert!(m.is_ladder_top(1, 1));
        assert!(!m.is_ladder_top(1, 2));
        assert!(!m.is_ladder_top(2, 1));
    }

    #[test]
    fn cell_range_covers_partial_cells() {
        let m = sample();
        let r = Rect::new(30, 20, 24, 30); // spans x 30..54, y 20..50
        assert_eq!(m.cell_range(&r), (0, 0, 1, 1));
        let r = Rect::new(40, 32, 40, 32); // exactly one cell
        assert_eq!(m.cell_range(&r), (1, 1, 1, 1));
    }

    proptest! {
        #[test]
        fn columns_outside_are_impassable(x in prop_oneof![-1000i32..0, 4i32..1000], y in -1000i32..1000) {
            prop_assert_eq!(sample().classify(x, y), TileCollision::Impassable);
        }

        #[test]
        fn rows_outside_are_passable(x in 0i32..4, y in prop_oneof![-1000i32..0, 4i32..1000]) {
            prop_assert_eq!(sample().classify(x, y), TileCollision::Passable);
        }
    }
}
