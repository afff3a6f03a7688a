/// The step function: advances the world by one frame.
///
/// Processing order while playing:
///   1. Timer countdown
///   2. Player (input → physics → collision pass)
///   3. Contact flags onto actors (riding, wall, stomp)
///   4. Gem pickup
///   5. Fall-out check
///   6. Enemies (patrol, stomp kill, ride, touch damage)
///   7. Movable tiles (patrol, carry rider)
///   8. Wall tiles (re-derive on_wall)
///   9. Exit check
///  10. Timer expiry
///
/// Dead or out of time: physics only, input frozen.
/// Exit reached: remaining time drains into score instead.
/// Props step every frame regardless.

use rand::Rng;
use tracing::debug;

use crate::domain::actor::Obstacle;
use crate::domain::collision::{Contacts, Surroundings};
use crate::domain::controller::Intent;
use crate::domain::player::FrameInput;
use crate::sim::event::{DeathCause, GameEvent};
use crate::sim::level::LevelError;
use crate::sim::props::{self, PropKind};
use crate::sim::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: &FrameInput, elapsed: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let dt = clamp_delta(elapsed, world.config.timing.max_frame_delta);
    if dt <= 0.0 {
        return events;
    }

    if input.spawn_crate {
        spawn_crate(world);
    }

    if !world.player.is_alive() || world.time_remaining <= 0.0 {
        let env = Surroundings {
            map: &world.map,
            movable_tiles: &world.movable_tiles,
            wall_tiles: &world.wall_tiles,
            enemies: &world.enemies,
        };
        world.controller.apply_physics(&mut world.player, &Intent::default(), dt, &env);
        resolve_fall(world, &mut events);
    } else if world.reached_exit {
        resolve_tally(world, dt);
    } else {
        world.time_remaining -= dt;
        let contacts = resolve_player(world, input, dt, &mut events);
        apply_contacts(world, &contacts);
        resolve_gems(world, dt, &mut events);
        resolve_fall(world, &mut events);
        resolve_enemies(world, dt, &mut events);
        resolve_movable_tiles(world, dt);
        resolve_wall_tiles(world);
        resolve_exit(world, &mut events);
        resolve_timer(world, &mut events);
    }

    resolve_props(world, dt, &mut events);
    events
}

/// Large gaps (a stalled terminal, a debugger pause) would tunnel
/// through floors. `max <= 0` turns clamping off.
pub fn clamp_delta(elapsed: f32, max: f32) -> f32 {
    let dt = elapsed.max(0.0);
    if max > 0.0 {
        dt.min(max)
    } else {
        dt
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, input: &FrameInput, dt: f32, events: &mut Vec<GameEvent>) -> Contacts {
    let env = Surroundings {
        map: &world.map,
        movable_tiles: &world.movable_tiles,
        wall_tiles: &world.wall_tiles,
        enemies: &world.enemies,
    };
    let report = world.controller.update(&mut world.player, input, dt, &env);
    if report.jumped {
        events.push(GameEvent::Jumped);
    }
    report.contacts
}

/// Reset every actor flag, then set the ones this frame's pass touched.
fn apply_contacts(world: &mut WorldState, contacts: &Contacts) {
    for tile in &mut world.movable_tiles {
        tile.player_on = false;
    }
    for wall in &mut world.wall_tiles {
        wall.player_adjacent = false;
    }
    for enemy in &mut world.enemies {
        enemy.player_on = false;
        enemy.attacked_from_above = false;
    }

    for &i in &contacts.riding {
        world.movable_tiles[i].player_on = true;
    }
    for &i in &contacts.walls {
        world.wall_tiles[i].player_adjacent = true;
    }
    for &i in &contacts.enemies_under {
        world.enemies[i].player_on = true;
    }
    for &i in &contacts.enemies_stomped {
        world.enemies[i].attacked_from_above = true;
    }

    // A charged rider drives the platform.
    let actors = &world.config.actors;
    for tile in &mut world.movable_tiles {
        if tile.player_on && world.player.is_charged() {
            tile.speed = actors.movable_speed * actors.movable_charged_multiplier;
            tile.direction = world.player.facing;
        } else {
            tile.speed = actors.movable_speed;
        }
    }
}

fn kill_player(world: &mut WorldState, cause: DeathCause, events: &mut Vec<GameEvent>) {
    world.player.kill();
    debug!(?cause, lives = world.player.lives, "player killed");
    events.push(GameEvent::PlayerKilled { cause });
}

// ══════════════════════════════════════════════════════════════
// Gems
// ══════════════════════════════════════════════════════════════

fn resolve_gems(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let bounds = world.player.bounds();
    let mut i = 0;
    while i < world.gems.len() {
        world.gems[i].update(dt);
        if !world.gems[i].bounding_circle().intersects(&bounds) {
            i += 1;
            continue;
        }
        let gem = world.gems.remove(i);
        world.score += gem.points;
        events.push(GameEvent::GemCollected { points: gem.points, at: gem.position });
        if gem.power_up {
            world.player.power_up = world.config.timing.power_up;
            debug!(seconds = world.player.power_up, "powered up");
            events.push(GameEvent::PoweredUp);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Fall-out
// ══════════════════════════════════════════════════════════════

fn resolve_fall(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.player.is_alive() && world.player.bounds().top >= world.pixel_bottom() {
        kill_player(world, DeathCause::FellOut, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let speed = world.config.actors.enemy_speed;
    let wait = world.config.actors.enemy_wait;

    for i in 0..world.enemies.len() {
        world.enemies[i].update(&world.map, dt, speed, wait);
        if !world.enemies[i].alive {
            continue;
        }

        if world.enemies[i].attacked_from_above {
            world.enemies[i].kill();
            world.player.velocity.y -= world.config.physics.thrust_bounce;
            world.player.position.y -= world.config.physics.thrust_hop;
            debug!(enemy = i, "enemy stomped");
            events.push(GameEvent::EnemyKilled { index: i, stomped: true });
            continue;
        }

        if world.enemies[i].player_on {
            world.player.position += world.enemies[i].velocity;
        }

        if world.player.is_alive() && world.enemies[i].bounds().intersects(&world.player.bounds()) {
            touch_enemy(world, i, events);
        }
    }
}

fn touch_enemy(world: &mut WorldState, i: usize, events: &mut Vec<GameEvent>) {
    if world.player.is_powered_up() {
        world.enemies[i].kill();
        debug!(enemy = i, "enemy killed by powered-up player");
        events.push(GameEvent::EnemyKilled { index: i, stomped: false });
        return;
    }
    if world.player.is_invulnerable() {
        return;
    }

    world.player.lives = world.player.lives.saturating_sub(1);
    world.player.invulnerable = Some(world.config.timing.invulnerable);
    debug!(enemy = i, lives = world.player.lives, "player hurt");
    events.push(GameEvent::PlayerHurt { lives_left: world.player.lives });
    if world.player.lives == 0 {
        kill_player(world, DeathCause::OutOfLives, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Platforms and walls
// ══════════════════════════════════════════════════════════════

fn resolve_movable_tiles(world: &mut WorldState, dt: f32) {
    let wait = world.config.actors.movable_wait;
    for tile in &mut world.movable_tiles {
        tile.update(&world.map, dt, wait);
        if tile.player_on {
            world.player.position += tile.velocity;
        }
    }
}

fn resolve_wall_tiles(world: &mut WorldState) {
    world.player.on_wall = world.wall_tiles.iter().any(|w| w.player_adjacent);
}

// ══════════════════════════════════════════════════════════════
// Win / time
// ══════════════════════════════════════════════════════════════

fn resolve_exit(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player = &world.player;
    if !player.is_alive() || !player.grounded || !player.bounds().contains(world.exit) {
        return;
    }
    if world.config.rules.require_all_gems && !world.gems.is_empty() {
        return;
    }
    world.reached_exit = true;
    world.player.celebrate();
    debug!(level = %world.level_name, time_left = world.time_remaining, "exit reached");
    events.push(GameEvent::ExitReached);
}

fn resolve_timer(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.time_remaining > 0.0 {
        return;
    }
    world.time_remaining = 0.0;
    if !world.time_expired_reported && !world.reached_exit {
        world.time_expired_reported = true;
        events.push(GameEvent::TimeExpired);
    }
}

/// Drain remaining time into score, about 100 seconds per real second.
fn resolve_tally(world: &mut WorldState, dt: f32) {
    if world.time_remaining <= 0.0 {
        return;
    }
    let seconds = (dt * 100.0).round().min(world.time_remaining.ceil());
    world.time_remaining = (world.time_remaining - seconds).max(0.0);
    world.score += seconds as u32 * world.config.timing.points_per_second;
}

// ══════════════════════════════════════════════════════════════
// Props
// ══════════════════════════════════════════════════════════════

fn resolve_props(world: &mut WorldState, dt: f32, events: &mut Vec<GameEvent>) {
    let bottom = world.pixel_bottom() as f32;
    let removed = props::advance(world.prop_physics.as_mut(), &mut world.props, dt, bottom);
    events.extend(removed.into_iter().map(|index| GameEvent::PropRemoved { index }));
}

fn spawn_crate(world: &mut WorldState) {
    let x = world.rng.gen_range(10..100) as f32;
    let crate_prop = props::spawn(world.prop_physics.as_mut(), PropKind::Crate, glam::Vec2::new(x, 100.0));
    world.props.push(crate_prop);
}

// ══════════════════════════════════════════════════════════════
// Session control
// ══════════════════════════════════════════════════════════════

/// Bring a dead player back at the start. Lives, score and level state stay.
pub fn respawn(world: &mut WorldState) {
    world.player.reset(world.start);
    world.camera.center_on(world.player_cell(), world.world_cells());
}

/// Reload the current level from its source with full lives.
pub fn restart_level(world: &mut WorldState) -> Result<(), LevelError> {
    world.score = world.level_start_score;
    world.player.lives = world.config.actors.lives;
    world.load_level(world.current_level)
}

/// Advance to the next level, wrapping after the last one.
pub fn next_level(world: &mut WorldState) -> Result<(), LevelError> {
    let next = (world.current_level + 1) % world.levels.len().max(1);
    world.load_level(next)
}
