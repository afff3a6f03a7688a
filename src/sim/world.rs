/// WorldState: the LevelOrchestrator's state for one running session.
///
/// ## Ownership
///
/// The world exclusively owns the grid, every actor collection, the
/// player and the controller. The controller only ever sees the actors
/// through a borrowed `Surroundings` built inside `step`.
///
/// ## Phase
///
/// Not stored; derived from state each time it is asked for:
///
/// ```text
///   reached exit, time left      → Tallying
///   reached exit, time drained   → Cleared
///   dead, lives left             → Dead
///   dead, no lives               → GameOver
///   alive, timer at 0            → TimeUp
///   otherwise                    → Playing
/// ```
///
/// ## Camera / Viewport
///
/// Cell coordinates, one world cell per viewport cell. The renderer sets
/// the viewport size from the terminal and calls `follow` every frame.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::config::GameConfig;
use crate::domain::actor::{Enemy, Gem, MovableTile, WallTile};
use crate::domain::controller::PlayerController;
use crate::domain::map::TileCollisionMap;
use crate::domain::player::{Capabilities, Player};
use crate::domain::tile::cell_of;
use crate::sim::assets::ResourceProvider;
use crate::sim::level::{LevelDef, LevelError, LevelLoader};
use crate::sim::props::{self, Prop, PropPhysics};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Dead,
    TimeUp,
    Tallying,
    Cleared,
    GameOver,
}

/// Camera: a viewport into the world.
///
/// `(x, y)` is the world cell shown at the viewport's top-left corner.
/// Negative values center a map smaller than the viewport.
#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: i32,
    pub view_h: i32,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dead-zone follow: scroll only when the target leaves the inner 60%.
    pub fn follow(&mut self, target: (i32, i32), world: (i32, i32)) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        self.x = follow_axis(self.x, target.0, self.view_w, world.0);
        self.y = follow_axis(self.y, target.1, self.view_h, world.1);
    }

    /// Snap straight onto the target. Used on level load and respawn.
    pub fn center_on(&mut self, target: (i32, i32), world: (i32, i32)) {
        if self.view_w == 0 || self.view_h == 0 {
            return;
        }
        self.x = center_axis(target.0, self.view_w, world.0);
        self.y = center_axis(target.1, self.view_h, world.1);
    }

    /// World cell → viewport cell, or `None` when off screen.
    pub fn world_to_view(&self, wx: i32, wy: i32) -> Option<(i32, i32)> {
        let vx = wx - self.x;
        let vy = wy - self.y;
        (vx >= 0 && vx < self.view_w && vy >= 0 && vy < self.view_h).then_some((vx, vy))
    }
}

fn follow_axis(current: i32, target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    let margin = view / 5;
    let mut pos = current;
    if target < current + margin {
        pos = target - margin;
    } else if target > current + view - margin - 1 {
        pos = target - view + margin + 1;
    }
    pos.clamp(0, world - view)
}

fn center_axis(target: i32, view: i32, world: i32) -> i32 {
    if world <= view {
        return -((view - world) / 2);
    }
    (target - view / 2).clamp(0, world - view)
}

pub struct WorldState {
    pub config: GameConfig,

    // ── Level ──
    pub levels: Vec<LevelDef>,
    pub current_level: usize,
    pub level_name: String,
    pub map: TileCollisionMap,
    pub start: Vec2,
    pub exit: Vec2,

    // ── Entities ──
    pub player: Player,
    pub controller: PlayerController,
    pub gems: Vec<Gem>,
    pub gems_total: usize,
    pub enemies: Vec<Enemy>,
    pub movable_tiles: Vec<MovableTile>,
    pub wall_tiles: Vec<WallTile>,
    pub props: Vec<Prop>,
    pub prop_physics: Box<dyn PropPhysics>,

    // ── Session ──
    pub score: u32,
    /// Score when the current level was entered; restored on restart.
    pub level_start_score: u32,
    pub time_remaining: f32,
    pub reached_exit: bool,
    pub time_expired_reported: bool,
    pub camera: Camera,

    pub(crate) rng: StdRng,
    loader: LevelLoader,
    assets: Box<dyn ResourceProvider>,
}

impl WorldState {
    /// Build a session on the first level of `levels`.
    pub fn new(
        config: GameConfig,
        levels: Vec<LevelDef>,
        assets: Box<dyn ResourceProvider>,
        prop_physics: Box<dyn PropPhysics>,
    ) -> Result<Self, LevelError> {
        let controller = PlayerController::new(
            config.physics.clone(),
            config.timing.clone(),
            Capabilities::NONE,
        );
        let mut world = WorldState {
            levels,
            current_level: 0,
            level_name: String::new(),
            map: TileCollisionMap::new(0, 0, Vec::new()),
            start: Vec2::ZERO,
            exit: Vec2::ZERO,
            player: Player::new(Vec2::ZERO, config.actors.lives),
            controller,
            gems: Vec::new(),
            gems_total: 0,
            enemies: Vec::new(),
            movable_tiles: Vec::new(),
            wall_tiles: Vec::new(),
            props: Vec::new(),
            prop_physics,
            score: 0,
            level_start_score: 0,
            time_remaining: 0.0,
            reached_exit: false,
            time_expired_reported: false,
            camera: Camera::new(),
            rng: StdRng::seed_from_u64(config.seed),
            loader: LevelLoader::new(config.seed, config.actors.clone()),
            assets,
            config,
        };
        world.load_level(0)?;
        Ok(world)
    }

    /// Replace the level with `levels[index]`. Lives and score carry over.
    pub fn load_level(&mut self, index: usize) -> Result<(), LevelError> {
        let def = self.levels.get(index).ok_or(LevelError::NoSuchLevel { index })?;
        let level = self.loader.load(def, self.assets.as_mut())?;

        for prop in self.props.drain(..) {
            self.prop_physics.remove_body(prop.body);
        }
        self.props = level
            .props
            .iter()
            .map(|&(kind, position)| props::spawn(self.prop_physics.as_mut(), kind, position))
            .collect();

        self.controller.capabilities = Capabilities::resolve(
            &self.config.capabilities,
            level.map.has_ladders(),
            !level.wall_tiles.is_empty(),
        );
        info!(level = %level.name, capabilities = ?self.controller.capabilities, "entering level");

        self.current_level = index;
        self.level_name = level.name;
        self.map = level.map;
        self.start = level.start;
        self.exit = level.exit;
        self.gems_total = level.gems.len();
        self.gems = level.gems;
        self.enemies = level.enemies;
        self.movable_tiles = level.movable_tiles;
        self.wall_tiles = level.wall_tiles;

        let lives = self.player.lives;
        self.player = Player::new(self.start, lives);
        self.time_remaining = self.config.timing.level_time;
        self.reached_exit = false;
        self.time_expired_reported = false;
        self.level_start_score = self.score;
        self.camera.center_on(self.player_cell(), self.world_cells());
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        if self.reached_exit {
            if self.time_remaining > 0.0 {
                Phase::Tallying
            } else {
                Phase::Cleared
            }
        } else if !self.player.is_alive() {
            if self.player.lives == 0 {
                Phase::GameOver
            } else {
                Phase::Dead
            }
        } else if self.time_remaining <= 0.0 {
            Phase::TimeUp
        } else {
            Phase::Playing
        }
    }

    /// Level height in pixels; anything whose top is below this has fallen out.
    pub fn pixel_bottom(&self) -> i32 {
        self.map.pixel_size().1
    }

    pub fn player_cell(&self) -> (i32, i32) {
        let b = self.player.bounds().center();
        cell_of(b.x, b.y)
    }

    pub fn world_cells(&self) -> (i32, i32) {
        (self.map.width(), self.map.height())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim::assets::NameRegistry;
    use crate::sim::props::StillProps;

    pub(crate) fn world_from(rows: &[&str]) -> WorldState {
        let def = LevelDef { name: "test".into(), rows: rows.iter().map(|r| r.to_string()).collect() };
        WorldState::new(
            GameConfig::default(),
            vec![def],
            Box::new(NameRegistry::new()),
            Box::new(StillProps::new()),
        )
        .unwrap()
    }

    #[test]
    fn loads_first_level() {
        let w = world_from(&["1.GX", "####"]);
        assert_eq!(w.start, Vec2::new(20.0, 32.0));
        assert_eq!(w.gems_total, 1);
        assert_eq!(w.phase(), Phase::Playing);
        assert_eq!(w.time_remaining, 390.0);
    }

    #[test]
    fn capabilities_follow_level_content() {
        let w = world_from(&["1.LX", "####"]);
        assert!(w.controller.capabilities.climbing);
        assert!(!w.controller.capabilities.wall_jump);
        let w = world_from(&["1.WX", "####"]);
        assert!(!w.controller.capabilities.climbing);
        assert!(w.controller.capabilities.wall_jump);
    }

    #[test]
    fn props_spawn_on_load() {
        let w = world_from(&["1fX.", "FFFF"]);
        assert_eq!(w.props.len(), 5);
    }

    #[test]
    fn phase_is_derived_from_state() {
        let mut w = world_from(&["1.X", "###"]);
        w.time_remaining = 0.0;
        assert_eq!(w.phase(), Phase::TimeUp);
        w.player.kill();
        assert_eq!(w.phase(), Phase::Dead);
        w.player.lives = 0;
        assert_eq!(w.phase(), Phase::GameOver);
        w.reached_exit = true;
        assert_eq!(w.phase(), Phase::Cleared);
        w.time_remaining = 3.0;
        assert_eq!(w.phase(), Phase::Tallying);
    }

    #[test]
    fn camera_centers_small_maps() {
        let mut cam = Camera { x: 0, y: 0, view_w: 10, view_h: 10 };
        cam.center_on((2, 2), (4, 6));
        assert_eq!((cam.x, cam.y), (-3, -2));
    }

    #[test]
    fn camera_scrolls_only_outside_dead_zone() {
        let mut cam = Camera { x: 0, y: 0, view_w: 10, view_h: 10 };
        cam.follow((5, 5), (40, 10));
        assert_eq!(cam.x, 0);
        cam.follow((9, 5), (40, 10));
        assert_eq!(cam.x, 2);
        cam.follow((39, 5), (40, 10));
        assert_eq!(cam.x, 30);
        assert_eq!(cam.world_to_view(35, 3), Some((5, 3)));
        assert_eq!(cam.world_to_view(29, 3), None);
    }
}
