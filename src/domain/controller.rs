/// PlayerController: input interpretation, integration and the movement
/// state machine.
///
/// One frame:
///
/// ```text
///   interpret   FrameInput → Intent     (ladder alignment may snap x)
///   enter       Intent → Climbing / leave ladder
///   integrate   gravity or climb speed, horizontal accel + drag, jump curve
///   move        position += velocity * dt (sub-pixel; bounds round)
///   resolve     collision::resolve_frame → Contacts
///   stall       zero velocity into whatever stopped the body
///   status      power-up, invulnerability, charge meter
///   settle      Contacts + Intent → resting Locomotion
/// ```
///
/// Transition table (`settle`, after collision):
///
/// ```text
///   from            | condition                | to
///   ----------------|--------------------------|---------------------------
///   Dead/Celebrate  | any                      | unchanged
///   Climbing        | landed on solid          | ground pose
///   Climbing        | otherwise                | Climbing
///   Jumping         | landed on solid          | ground pose
///   Jumping         | otherwise                | Jumping
///   anything else   | grounded                 | ground pose
///   anything else   | airborne                 | Falling
///
///   ground pose: duck → Ducking, moving → Running, look → Looking, else Idle
/// ```

use glam::Vec2;

use crate::config::{PhysicsConfig, TimingConfig};
use crate::domain::collision::{resolve_frame, Contacts, Stance, Surroundings};
use crate::domain::map::TileCollisionMap;
use crate::domain::player::{
    Capabilities, ChargeMeter, Facing, FrameInput, Locomotion, Player, Thrust, STICK_DEADZONE,
};
use crate::domain::tile::{TILE_CENTER, TILE_WIDTH};

/// What the player is trying to do this frame, after capability and
/// ladder checks. Built fresh every frame; nothing here persists.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Intent {
    /// x in [-1, 1]; y only while climbing (negative = up).
    pub movement: Vec2,
    pub jump: bool,
    pub duck: bool,
    pub look: bool,
    pub climb: bool,
    pub wall_jump: bool,
    pub thrust: Thrust,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub contacts: Contacts,
    /// A jump or wall-jump started this frame.
    pub jumped: bool,
}

#[derive(Clone, Debug)]
pub struct PlayerController {
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub capabilities: Capabilities,
}

impl PlayerController {
    pub fn new(physics: PhysicsConfig, timing: TimingConfig, capabilities: Capabilities) -> Self {
        PlayerController { physics, timing, capabilities }
    }

    /// Full frame: input, physics, collision, state.
    pub fn update(
        &self,
        player: &mut Player,
        input: &FrameInput,
        dt: f32,
        env: &Surroundings,
    ) -> FrameReport {
        let intent = self.interpret(player, input, env.map);
        let report = self.apply_physics(player, &intent, dt, env);
        // Re-derived by the wall-tile pass after this returns.
        player.on_wall = false;
        report
    }

    // ── Input ──

    pub fn interpret(&self, player: &mut Player, input: &FrameInput, map: &TileCollisionMap) -> Intent {
        if matches!(player.locomotion, Locomotion::Dead | Locomotion::Celebrating) {
            return Intent::default();
        }

        let mut intent = Intent {
            movement: Vec2::new(deadzone(input.horizontal), 0.0),
            jump: input.jump,
            look: input.up(),
            ..Intent::default()
        };

        if self.capabilities.thrust && input.jump {
            if input.up() {
                intent.thrust = Thrust::Up;
            } else if input.down() && !player.is_charged() {
                intent.thrust = Thrust::Down;
            }
        }
        intent.wall_jump = self.capabilities.wall_jump && input.jump && player.on_wall;

        if input.up() {
            if let Some(offset) = self.ladder_offset(player, map) {
                if map.collision_behind(player.position).is_ladder() {
                    self.begin_climb(player, &mut intent, offset, -1.0);
                }
            }
        } else if input.down() {
            match self.ladder_offset(player, map) {
                Some(offset) => {
                    if map.collision_below(player.position).is_ladder() {
                        self.begin_climb(player, &mut intent, offset, 1.0);
                    }
                }
                None => intent.duck = true,
            }
        }

        intent
    }

    /// Horizontal distance from the ladder column's center, if the player is
    /// close enough to a ladder to grab it.
    fn ladder_offset(&self, player: &Player, map: &TileCollisionMap) -> Option<i32> {
        if !self.capabilities.climbing {
            return None;
        }
        let x = player.position.x.round() as i32;
        let offset = x.rem_euclid(TILE_WIDTH) - TILE_CENTER;
        if offset.abs() > self.physics.ladder_alignment {
            return None;
        }
        let below = map.collision_below(player.position + Vec2::new(0.0, 1.0));
        let behind = map.collision_behind(player.position - Vec2::new(0.0, 1.0));
        (below.is_ladder() || behind.is_ladder()).then_some(offset)
    }

    fn begin_climb(&self, player: &mut Player, intent: &mut Intent, offset: i32, direction: f32) {
        player.position.x = (player.position.x.round() as i32 - offset) as f32;
        player.grounded = false;
        intent.climb = true;
        intent.movement.y = direction * self.physics.climb_speed;
        intent.jump = false;
        intent.duck = false;
        intent.wall_jump = false;
        intent.thrust = Thrust::None;
    }

    // ── Physics ──

    /// Integrate one frame for the given intent. Also used on its own
    /// (with `Intent::default()`) while the player is dead or time is up.
    pub fn apply_physics(
        &self,
        player: &mut Player,
        intent: &Intent,
        dt: f32,
        env: &Surroundings,
    ) -> FrameReport {
        let ph = &self.physics;
        let mut report = FrameReport::default();

        if intent.climb {
            player.locomotion = Locomotion::Climbing;
        } else if player.locomotion.is_climbing() {
            player.locomotion = Locomotion::Falling;
        }
        if player.is_alive() {
            player.thrust = intent.thrust;
        }

        let boost = if player.is_charged() || player.is_powered_up() {
            ph.boost_multiplier
        } else {
            1.0
        };

        let mut vy = if intent.climb {
            intent.movement.y * ph.move_acceleration * dt
        } else if player.was_climbing {
            0.0
        } else {
            (player.velocity.y + ph.gravity * dt).clamp(-ph.max_fall_speed, ph.max_fall_speed)
        };
        let vx = horizontal_velocity(player.velocity.x, intent.movement.x, player.grounded, boost, dt, ph);
        vy = self.jump(player, intent, vy, dt, &mut report);

        player.velocity = Vec2::new(vx, vy);
        player.position += player.velocity * dt;

        let stance = Stance {
            climbing: intent.climb,
            jumping: player.locomotion.is_jumping(),
            thrusting_down: player.is_thrusting_down(),
            rising: vy < 0.0,
        };
        let mut body = player.body();
        report.contacts = resolve_frame(&mut body, stance, env, ph.contact_band);
        player.position = body.position;
        player.previous_bottom = body.previous_bottom;
        player.grounded = report.contacts.grounded;

        let contacts = &report.contacts;
        if contacts.blocked_x {
            player.velocity.x = 0.0;
        }
        if contacts.blocked_y || (contacts.grounded && player.velocity.y > 0.0) {
            player.velocity.y = 0.0;
        }

        self.tick_status(player, intent, dt);
        self.settle(player, intent, &report.contacts);

        player.was_climbing = intent.climb;
        player.was_jump_held = intent.jump;
        if player.velocity.x > 0.0 {
            player.facing = Facing::Right;
        } else if player.velocity.x < 0.0 {
            player.facing = Facing::Left;
        }

        report
    }

    /// Vertical velocity after jump handling. Starts, continues or ends an ascent.
    fn jump(&self, player: &mut Player, intent: &Intent, vy: f32, dt: f32, report: &mut FrameReport) -> f32 {
        let ph = &self.physics;
        if !intent.jump {
            if player.locomotion.is_jumping() {
                player.locomotion = Locomotion::Falling;
            }
            return vy;
        }

        let max = player.max_jump_time(ph);
        let power = player.jump_control_power(ph);

        if !player.locomotion.is_jumping() && !player.was_jump_held && player.grounded {
            player.locomotion = Locomotion::Jumping { ascent: 0.0 };
            report.jumped = true;
        }

        if let Locomotion::Jumping { ascent } = player.locomotion {
            if ascent <= max {
                player.locomotion = Locomotion::Jumping { ascent: ascent + dt };
                return jump_velocity(ascent, max, ph.jump_launch_velocity, power);
            }
            // Apex: gravity takes over.
            player.locomotion = Locomotion::Falling;
            return vy;
        }

        if !player.was_jump_held && intent.wall_jump {
            player.locomotion = Locomotion::WallJumping;
            report.jumped = true;
            // A wall jump is a fresh launch, so it starts at t = 0.
            return wall_jump_velocity(0.0, max, ph.jump_launch_velocity, power);
        }

        vy
    }

    fn tick_status(&self, player: &mut Player, intent: &Intent, dt: f32) {
        if player.power_up > 0.0 {
            player.power_up = (player.power_up - dt).max(0.0);
        }

        if let Some(left) = player.invulnerable {
            let left = left - dt;
            player.invulnerable = (left > 0.0).then_some(left);
        }

        if intent.duck && player.thrust != Thrust::Down {
            let hold = player.charge.hold + dt;
            player.charge = ChargeMeter {
                hold,
                charged: hold > self.timing.charge_min && hold < self.timing.charge_max,
            };
        } else {
            player.charge = ChargeMeter::default();
        }
    }

    fn settle(&self, player: &mut Player, intent: &Intent, contacts: &Contacts) {
        player.locomotion = match player.locomotion {
            Locomotion::Dead | Locomotion::Celebrating => return,
            Locomotion::Climbing | Locomotion::Jumping { .. } if !contacts.landed_solid => return,
            _ if player.grounded => ground_pose(player, intent),
            _ => Locomotion::Falling,
        };
    }
}

fn ground_pose(player: &Player, intent: &Intent) -> Locomotion {
    if intent.duck {
        Locomotion::Ducking
    } else if intent.movement.x != 0.0 || player.velocity.x.abs() > 0.02 {
        Locomotion::Running
    } else if intent.look {
        Locomotion::Looking
    } else {
        Locomotion::Idle
    }
}

fn deadzone(axis: f32) -> f32 {
    if axis.abs() < STICK_DEADZONE {
        0.0
    } else {
        axis.clamp(-1.0, 1.0)
    }
}

/// Horizontal velocity after one frame of acceleration, drag and clamping.
pub fn horizontal_velocity(
    vx: f32,
    movement: f32,
    grounded: bool,
    boost: f32,
    dt: f32,
    physics: &PhysicsConfig,
) -> f32 {
    let vx = vx + movement * physics.move_acceleration * boost * dt;
    let drag = if grounded { physics.ground_drag } else { physics.air_drag };
    (vx * drag).clamp(-physics.max_move_speed, physics.max_move_speed)
}

/// Ascent curve: full launch speed at t = 0, easing to zero at `max`.
pub fn jump_velocity(t: f32, max: f32, launch: f32, power: f32) -> f32 {
    launch * (1.0 - (t / max).powf(power))
}

/// Wall-jump curve: the power term is added instead of subtracted.
pub fn wall_jump_velocity(t: f32, max: f32, launch: f32, power: f32) -> f32 {
    launch * (1.0 + (t / max).powf(power))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::MovableTile;
    use crate::domain::collision::Surroundings;
    use crate::domain::map::tests::map_from;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn controller(capabilities: Capabilities) -> PlayerController {
        PlayerController::new(PhysicsConfig::default(), TimingConfig::default(), capabilities)
    }

    fn env(map: &TileCollisionMap) -> Surroundings<'_> {
        Surroundings { map, movable_tiles: &[], wall_tiles: &[], enemies: &[] }
    }

    /// Player resting on the floor of `map` after one settling frame.
    fn grounded_player(ctl: &PlayerController, map: &TileCollisionMap, foot: Vec2) -> Player {
        let mut p = Player::new(foot, 3);
        ctl.update(&mut p, &FrameInput::default(), DT, &env(map));
        assert!(p.grounded, "fixture player should settle onto the floor");
        p
    }

    fn open_room() -> TileCollisionMap {
        map_from(&[
            "......",
            "......",
            "......",
            "######",
        ])
    }

    #[test]
    fn jump_curve_starts_at_launch_velocity() {
        assert_eq!(jump_velocity(0.0, 0.4, -2600.0, 0.09), -2600.0);
    }

    #[test]
    fn jump_curve_fades_near_apex() {
        let v = jump_velocity(0.4 * 0.999, 0.4, -2600.0, 0.09);
        assert!(v < 0.0 && v.abs() < 1.0, "got {v}");
        assert_eq!(jump_velocity(0.4, 0.4, -2600.0, 0.09), 0.0);
    }

    #[test]
    fn wall_jump_curve_grows_instead_of_shrinking() {
        assert_eq!(wall_jump_velocity(0.0, 0.4, -2600.0, 0.09), -2600.0);
        assert!(wall_jump_velocity(0.2, 0.4, -2600.0, 0.09) < -2600.0);
    }

    #[test]
    fn drag_is_stronger_on_the_ground() {
        let ph = PhysicsConfig::default();
        let grounded = horizontal_velocity(100.0, 0.0, true, 1.0, DT, &ph);
        let airborne = horizontal_velocity(100.0, 0.0, false, 1.0, DT, &ph);
        assert!((grounded - 48.0).abs() < 1e-3);
        assert!((airborne - 58.0).abs() < 1e-3);
        assert!(grounded < airborne);
    }

    #[test]
    fn boost_doubles_acceleration() {
        let ph = PhysicsConfig::default();
        let normal = horizontal_velocity(0.0, 1.0, false, 1.0, DT, &ph);
        let boosted = horizontal_velocity(0.0, 1.0, false, 2.0, DT, &ph);
        assert!((boosted - 2.0 * normal).abs() < 1e-3);
    }

    #[test]
    fn horizontal_speed_is_clamped() {
        let ph = PhysicsConfig::default();
        let v = horizontal_velocity(10_000.0, 1.0, false, 1.0, DT, &ph);
        assert_eq!(v, ph.max_move_speed);
    }

    #[test]
    fn pressing_jump_on_ground_launches() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 96.0));

        let input = FrameInput { jump: true, ..FrameInput::default() };
        let report = ctl.update(&mut p, &input, DT, &env(&map));

        assert!(report.jumped);
        assert!(!p.grounded);
        assert_eq!(p.velocity.y, ctl.physics.jump_launch_velocity);
        assert!(p.locomotion.is_jumping());
    }

    #[test]
    fn holding_jump_does_not_rejump_after_landing() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 96.0));
        p.was_jump_held = true;

        let input = FrameInput { jump: true, ..FrameInput::default() };
        let report = ctl.update(&mut p, &input, DT, &env(&map));
        assert!(!report.jumped);
        assert!(p.grounded);
    }

    #[test]
    fn releasing_jump_ends_ascent() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 96.0));
        let held = FrameInput { jump: true, ..FrameInput::default() };
        ctl.update(&mut p, &held, DT, &env(&map));
        ctl.update(&mut p, &FrameInput::default(), DT, &env(&map));
        assert_eq!(p.locomotion, Locomotion::Falling);
    }

    #[test]
    fn ascent_ends_after_max_jump_time() {
        let map = map_from(&[
            "......", "......", "......", "......", "......", "......",
            "......", "......", "......", "......", "......", "######",
        ]);
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 352.0));
        let held = FrameInput { jump: true, ..FrameInput::default() };
        for _ in 0..30 {
            ctl.update(&mut p, &held, DT, &env(&map));
        }
        // 0.4 s of ascent is 24 frames at 60 Hz.
        assert_eq!(p.locomotion, Locomotion::Falling);
    }

    #[test]
    fn duck_charges_inside_window_only() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 96.0));
        let duck = FrameInput { vertical: 1.0, ..FrameInput::default() };

        for _ in 0..60 {
            ctl.update(&mut p, &duck, 0.01, &env(&map));
        }
        assert!(p.charge.hold > 0.59 && p.charge.hold < 0.61);
        assert!(p.is_charged());
        assert_eq!(p.locomotion, Locomotion::Ducking);

        for _ in 0..140 {
            ctl.update(&mut p, &duck, 0.01, &env(&map));
        }
        assert!(p.charge.hold > 1.9);
        assert!(!p.is_charged());
    }

    #[test]
    fn releasing_duck_resets_charge() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 96.0));
        let duck = FrameInput { vertical: 1.0, ..FrameInput::default() };
        for _ in 0..60 {
            ctl.update(&mut p, &duck, 0.01, &env(&map));
        }
        ctl.update(&mut p, &FrameInput::default(), 0.01, &env(&map));
        assert_eq!(p.charge, ChargeMeter::default());
    }

    #[test]
    fn charged_jump_is_not_a_thrust() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 96.0));
        p.charge = ChargeMeter { hold: 0.7, charged: true };
        let input = FrameInput { vertical: 1.0, jump: true, ..FrameInput::default() };
        let intent = ctl.interpret(&mut p, &input, &map);
        assert_eq!(intent.thrust, Thrust::None);

        p.charge = ChargeMeter::default();
        let intent = ctl.interpret(&mut p, &input, &map);
        assert_eq!(intent.thrust, Thrust::Down);
    }

    #[test]
    fn wall_jump_from_air() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = Player::new(Vec2::new(60.0, 60.0), 3);
        p.locomotion = Locomotion::Falling;
        p.on_wall = true;

        let input = FrameInput { jump: true, ..FrameInput::default() };
        let report = ctl.update(&mut p, &input, DT, &env(&map));
        assert!(report.jumped);
        assert_eq!(p.velocity.y, ctl.physics.jump_launch_velocity);
        assert!(!p.on_wall);
    }

    #[test]
    fn wall_jump_needs_the_capability() {
        let map = open_room();
        let ctl = controller(Capabilities { wall_jump: false, ..Capabilities::ALL });
        let mut p = Player::new(Vec2::new(60.0, 60.0), 3);
        p.on_wall = true;
        let input = FrameInput { jump: true, ..FrameInput::default() };
        let report = ctl.update(&mut p, &input, DT, &env(&map));
        assert!(!report.jumped);
        assert!(p.velocity.y > 0.0);
    }

    fn ladder_room() -> TileCollisionMap {
        map_from(&[
            "......",
            "#L####",
            ".L....",
            ".L....",
            "######",
        ])
    }

    #[test]
    fn climbing_up_snaps_to_ladder_center() {
        let map = ladder_room();
        let ctl = controller(Capabilities::ALL);
        // Ladder column x = 40..80, center 60; stand 8 px right of center.
        let mut p = grounded_player(&ctl, &map, Vec2::new(68.0, 128.0));
        let up = FrameInput { vertical: -1.0, ..FrameInput::default() };
        ctl.update(&mut p, &up, DT, &env(&map));

        assert_eq!(p.locomotion, Locomotion::Climbing);
        assert_eq!(p.position.x, 60.0);
        assert!(p.velocity.y < 0.0);
        assert!(!p.grounded);
        assert!(p.position.y < 128.0);
    }

    #[test]
    fn misaligned_player_cannot_grab_ladder() {
        let map = ladder_room();
        let ctl = controller(Capabilities::ALL);
        // 13 px from center: outside the 12 px tolerance.
        let mut p = grounded_player(&ctl, &map, Vec2::new(73.0, 128.0));
        let up = FrameInput { vertical: -1.0, ..FrameInput::default() };
        ctl.update(&mut p, &up, DT, &env(&map));
        assert_ne!(p.locomotion, Locomotion::Climbing);
        assert_eq!(p.position.x, 73.0);
    }

    #[test]
    fn climbing_down_from_ladder_top() {
        let map = ladder_room();
        let ctl = controller(Capabilities::ALL);
        // Standing on the top of the ladder column.
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 32.0));
        let down = FrameInput { vertical: 1.0, ..FrameInput::default() };
        ctl.update(&mut p, &down, DT, &env(&map));
        assert_eq!(p.locomotion, Locomotion::Climbing);
        assert!(p.position.y > 32.0);
        assert_eq!(p.charge, ChargeMeter::default());
    }

    #[test]
    fn no_climbing_without_capability() {
        let map = ladder_room();
        let ctl = controller(Capabilities::NONE);
        let mut p = grounded_player(&ctl, &map, Vec2::new(60.0, 32.0));
        let down = FrameInput { vertical: 1.0, ..FrameInput::default() };
        ctl.update(&mut p, &down, DT, &env(&map));
        assert_eq!(p.locomotion, Locomotion::Ducking);
        assert_eq!(p.position.y, 32.0);
    }

    #[test]
    fn stepping_off_ladder_zeroes_vertical_speed_once() {
        let map = ladder_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = Player::new(Vec2::new(60.0, 100.0), 3);
        let up = FrameInput { vertical: -1.0, ..FrameInput::default() };
        ctl.update(&mut p, &up, DT, &env(&map));
        assert_eq!(p.locomotion, Locomotion::Climbing);

        ctl.update(&mut p, &FrameInput::default(), DT, &env(&map));
        assert_eq!(p.locomotion, Locomotion::Falling);
        assert_eq!(p.velocity.y, 0.0);
    }

    const DT_120: f32 = 1.0 / 120.0;

    #[test]
    fn resting_player_stays_grounded_at_120hz() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = Player::new(Vec2::new(60.0, 96.0), 3);
        for _ in 0..30 {
            ctl.update(&mut p, &FrameInput::default(), DT_120, &env(&map));
            assert!(p.grounded);
        }
        assert_eq!(p.locomotion, Locomotion::Idle);
        assert_eq!(p.bounds().bottom(), 96);
        assert_eq!(p.velocity.y, 0.0);
    }

    #[test]
    fn idle_jump_launches_at_120hz() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = Player::new(Vec2::new(60.0, 96.0), 3);
        for _ in 0..30 {
            ctl.update(&mut p, &FrameInput::default(), DT_120, &env(&map));
        }
        let input = FrameInput { jump: true, ..FrameInput::default() };
        let report = ctl.update(&mut p, &input, DT_120, &env(&map));
        assert!(report.jumped);
        assert!(!p.grounded);
        assert_eq!(p.velocity.y, ctl.physics.jump_launch_velocity);
    }

    #[test]
    fn climbing_makes_progress_at_120hz() {
        let map = ladder_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = Player::new(Vec2::new(60.0, 128.0), 3);
        ctl.update(&mut p, &FrameInput::default(), DT_120, &env(&map));
        let up = FrameInput { vertical: -1.0, ..FrameInput::default() };
        for _ in 0..120 {
            ctl.update(&mut p, &up, DT_120, &env(&map));
        }
        assert_eq!(p.locomotion, Locomotion::Climbing);
        assert!(p.position.y < 118.0, "climbed only to {}", p.position.y);
    }

    #[test]
    fn climbing_down_onto_moving_platform_ends_climb() {
        let map = map_from(&[
            ".L....",
            ".L....",
            "......",
            "######",
        ]);
        let ctl = controller(Capabilities::ALL);
        // Platform top at y = 64, right under the ladder's foot.
        let tiles = [MovableTile::new(Vec2::new(60.0, 80.0), 120.0)];
        let env = Surroundings { map: &map, movable_tiles: &tiles, wall_tiles: &[], enemies: &[] };
        let mut p = Player::new(Vec2::new(60.0, 63.5), 3);
        p.locomotion = Locomotion::Climbing;
        p.was_climbing = true;

        let down = FrameInput { vertical: 1.0, ..FrameInput::default() };
        let report = ctl.update(&mut p, &down, DT, &env);
        assert!(report.contacts.landed_solid);
        assert!(p.grounded);
        assert_eq!(p.locomotion, Locomotion::Idle);
        assert_eq!(p.bounds().bottom(), 64);
    }

    #[test]
    fn facing_follows_velocity() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(100.0, 96.0));
        let left = FrameInput { horizontal: -1.0, ..FrameInput::default() };
        ctl.update(&mut p, &left, DT, &env(&map));
        assert_eq!(p.facing, Facing::Left);
        assert_eq!(p.locomotion, Locomotion::Running);
    }

    #[test]
    fn dead_player_ignores_input() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(100.0, 96.0));
        p.kill();
        let input = FrameInput { horizontal: 1.0, jump: true, ..FrameInput::default() };
        assert_eq!(ctl.interpret(&mut p, &input, &map), Intent::default());
        ctl.update(&mut p, &input, DT, &env(&map));
        assert_eq!(p.locomotion, Locomotion::Dead);
        assert_eq!(p.velocity.x, 0.0);
    }

    #[test]
    fn invulnerability_wears_off() {
        let map = open_room();
        let ctl = controller(Capabilities::ALL);
        let mut p = grounded_player(&ctl, &map, Vec2::new(100.0, 96.0));
        p.invulnerable = Some(0.05);
        for _ in 0..3 {
            ctl.update(&mut p, &FrameInput::default(), DT, &env(&map));
        }
        assert!(!p.is_invulnerable());
    }

    proptest! {
        #[test]
        fn jump_curve_stays_between_launch_and_rest(t in 0.0f32..=0.4) {
            let v = jump_velocity(t, 0.4, -2600.0, 0.09);
            prop_assert!(v >= -2600.0 && v <= 0.0);
        }

        #[test]
        fn jump_curve_weakens_over_time(a in 0.0f32..0.4, b in 0.0f32..0.4) {
            let (early, late) = if a < b { (a, b) } else { (b, a) };
            prop_assert!(jump_velocity(early, 0.4, -2600.0, 0.09) <= jump_velocity(late, 0.4, -2600.0, 0.09));
        }
    }
}
