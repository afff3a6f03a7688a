/// Dynamic actors that live alongside the static grid.
///
/// Moving actors hold their own position and a per-frame `velocity` that is the
/// *displacement applied this frame* (pixels, already scaled by dt), so a
/// rider can be carried by adding it straight to its position.

use glam::Vec2;

use crate::domain::geometry::{Circle, Rect};
use crate::domain::map::TileCollisionMap;
use crate::domain::player::Facing;
use crate::domain::tile::{TileCollision, TILE_HEIGHT, TILE_WIDTH};

pub const ENEMY_WIDTH: i32 = 22;
pub const ENEMY_HEIGHT: i32 = 28;

/// Gem bobbing: radians per second, height as a fraction of a tile, phase per pixel.
const GEM_BOUNCE_RATE: f32 = 3.0;
const GEM_BOUNCE_HEIGHT: f32 = 0.18;
const GEM_BOUNCE_SYNC: f32 = -0.75;

/// Anything the player's rectangle is resolved against besides grid cells.
pub trait Obstacle {
    fn bounds(&self) -> Rect;
    fn collision(&self) -> TileCollision;
}

// ── Movable platform ──

#[derive(Clone, Debug)]
pub struct MovableTile {
    /// Center of the tile.
    pub position: Vec2,
    pub velocity: Vec2,
    pub direction: Facing,
    pub speed: f32,
    pub wait: f32,
    pub collision: TileCollision,
    pub player_on: bool,
}

impl MovableTile {
    pub fn new(position: Vec2, speed: f32) -> Self {
        MovableTile {
            position,
            velocity: Vec2::ZERO,
            direction: Facing::Left,
            speed,
            wait: 0.0,
            collision: TileCollision::Platform,
            player_on: false,
        }
    }

    /// Patrol: travel until the cell ahead is solid, pause, turn around.
    pub fn update(&mut self, map: &TileCollisionMap, dt: f32, max_wait: f32) {
        if self.wait > 0.0 {
            self.velocity = Vec2::ZERO;
            self.wait = (self.wait - dt).max(0.0);
            if self.wait <= 0.0 {
                self.direction = self.direction.flipped();
            }
            return;
        }

        let probe = self.position.x + self.direction.sign() * (TILE_WIDTH as f32 / 2.0);
        let cell_x = (probe / TILE_WIDTH as f32).floor() as i32;
        let cell_y = (self.position.y / TILE_HEIGHT as f32).floor() as i32;

        match map.classify(cell_x, cell_y) {
            TileCollision::Impassable | TileCollision::Platform => {
                self.velocity = Vec2::ZERO;
                self.wait = max_wait;
            }
            _ => {
                self.velocity = Vec2::new(self.direction.sign() * self.speed * dt, 0.0);
                self.position += self.velocity;
            }
        }
    }
}

impl Obstacle for MovableTile {
    fn bounds(&self) -> Rect {
        Rect::from_center(self.position, TILE_WIDTH, TILE_HEIGHT)
    }

    fn collision(&self) -> TileCollision {
        self.collision
    }
}

// ── Wall-jump surface ──

#[derive(Clone, Debug)]
pub struct WallTile {
    /// Center of the tile.
    pub position: Vec2,
    pub collision: TileCollision,
    pub player_adjacent: bool,
}

impl WallTile {
    pub fn new(position: Vec2) -> Self {
        WallTile {
            position,
            collision: TileCollision::Impassable,
            player_adjacent: false,
        }
    }
}

impl Obstacle for WallTile {
    fn bounds(&self) -> Rect {
        Rect::from_center(self.position, TILE_WIDTH, TILE_HEIGHT)
    }

    fn collision(&self) -> TileCollision {
        self.collision
    }
}

// ── Enemy ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyKind {
    A,
    B,
    C,
    D,
}

impl EnemyKind {
    pub fn from_char(ch: char) -> Option<EnemyKind> {
        match ch {
            'A' => Some(EnemyKind::A),
            'B' => Some(EnemyKind::B),
            'C' => Some(EnemyKind::C),
            'D' => Some(EnemyKind::D),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub kind: EnemyKind,
    /// Bottom-center.
    pub position: Vec2,
    pub velocity: Vec2,
    pub direction: Facing,
    pub wait: f32,
    pub alive: bool,
    pub collision: TileCollision,
    pub player_on: bool,
    pub attacked_from_above: bool,
}

impl Enemy {
    pub fn new(kind: EnemyKind, position: Vec2) -> Self {
        Enemy {
            kind,
            position,
            velocity: Vec2::ZERO,
            direction: Facing::Left,
            wait: 0.0,
            alive: true,
            collision: TileCollision::Passable,
            player_on: false,
            attacked_from_above: false,
        }
    }

    /// Walk back and forth, pausing at walls and ledges.
    pub fn update(&mut self, map: &TileCollisionMap, dt: f32, speed: f32, max_wait: f32) {
        self.velocity = Vec2::ZERO;
        if !self.alive {
            return;
        }

        if self.wait > 0.0 {
            self.wait = (self.wait - dt).max(0.0);
            if self.wait <= 0.0 {
                self.direction = self.direction.flipped();
            }
            return;
        }

        let probe = self.position.x + self.direction.sign() * (ENEMY_WIDTH as f32 / 2.0);
        let ahead = (probe / TILE_WIDTH as f32).floor() as i32;
        // Feet rest on the top edge of `ground_row`.
        let ground_row = (self.position.y / TILE_HEIGHT as f32).floor() as i32;
        let wall = map.classify(ahead, ground_row - 1) == TileCollision::Impassable;
        let ledge = map.classify(ahead, ground_row) == TileCollision::Passable;
        if wall || ledge {
            self.wait = max_wait;
        } else {
            self.velocity = Vec2::new(self.direction.sign() * speed * dt, 0.0);
            self.position += self.velocity;
        }
    }

    pub fn kill(&mut self) {
        self.alive = false;
        self.velocity = Vec2::ZERO;
        self.player_on = false;
        self.attacked_from_above = false;
    }
}

impl Obstacle for Enemy {
    fn bounds(&self) -> Rect {
        Rect::from_bottom_center(self.position, ENEMY_WIDTH, ENEMY_HEIGHT)
    }

    fn collision(&self) -> TileCollision {
        self.collision
    }
}

// ── Gem ──

#[derive(Clone, Debug)]
pub struct Gem {
    /// Center of the gem's home cell.
    pub position: Vec2,
    pub points: u32,
    pub power_up: bool,
    bob_time: f32,
}

impl Gem {
    pub fn new(position: Vec2, points: u32, power_up: bool) -> Self {
        Gem { position, points, power_up, bob_time: 0.0 }
    }

    pub fn update(&mut self, dt: f32) {
        self.bob_time += dt;
    }

    /// Vertical draw offset in pixels. Cosmetic only.
    pub fn bounce(&self) -> f32 {
        let t = self.bob_time * GEM_BOUNCE_RATE + self.position.x * GEM_BOUNCE_SYNC;
        t.sin() * GEM_BOUNCE_HEIGHT * TILE_HEIGHT as f32
    }

    pub fn bounding_circle(&self) -> Circle {
        Circle::new(self.position, TILE_WIDTH as f32 / 3.0)
    }
}
