/// Player state and the movement state machine's vocabulary.
///
/// Movement is one tagged value (`Locomotion`) plus two orthogonal
/// overlays that can coexist with it:
///
/// ```text
///   Locomotion  Idle | Running | Ducking | Looking | Jumping{ascent}
///               | WallJumping | Falling | Climbing | Dead | Celebrating
///   Thrust      None | Up | Down          (attack overlay, input-held)
///   Status      charge meter, power-up timer, invulnerability timer
/// ```
///
/// Transitions are decided in `controller.rs`; this module only holds
/// the data and the read-only views derived from it.

use glam::Vec2;

use crate::config::{CapabilityConfig, PhysicsConfig};
use crate::domain::collision::Body;
use crate::domain::geometry::Rect;

/// Bounding box size, origin at bottom-center.
pub const PLAYER_WIDTH: i32 = 24;
pub const PLAYER_HEIGHT: i32 = 30;

/// Analog stick magnitude below which input is ignored.
pub const STICK_DEADZONE: f32 = 0.5;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// One frame of already-merged keyboard/gamepad input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// -1 (left) ..= 1 (right)
    pub horizontal: f32,
    /// -1 (up) ..= 1 (down)
    pub vertical: f32,
    pub jump: bool,
    /// Debug: drop a decorative crate into the level.
    pub spawn_crate: bool,
}

impl FrameInput {
    pub fn up(&self) -> bool {
        self.vertical <= -STICK_DEADZONE
    }

    pub fn down(&self) -> bool {
        self.vertical >= STICK_DEADZONE
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Locomotion {
    Idle,
    Running,
    Ducking,
    Looking,
    /// Ascent in progress; `ascent` is time already spent rising.
    Jumping { ascent: f32 },
    /// The single frame a wall-jump impulse is applied.
    WallJumping,
    Falling,
    Climbing,
    Dead,
    Celebrating,
}

impl Locomotion {
    pub fn is_jumping(self) -> bool {
        matches!(self, Locomotion::Jumping { .. })
    }

    pub fn is_climbing(self) -> bool {
        matches!(self, Locomotion::Climbing)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Thrust {
    #[default]
    None,
    Up,
    Down,
}

/// Duck-and-hold charge. `charged` is true only inside the timing window.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ChargeMeter {
    pub hold: f32,
    pub charged: bool,
}

/// Which optional moves this level allows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Capabilities {
    pub climbing: bool,
    pub wall_jump: bool,
    pub thrust: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities { climbing: true, wall_jump: true, thrust: true };
    pub const NONE: Capabilities = Capabilities { climbing: false, wall_jump: false, thrust: false };

    /// Config switches narrowed by what the level actually contains.
    pub fn resolve(config: &CapabilityConfig, has_ladders: bool, has_walls: bool) -> Self {
        Capabilities {
            climbing: config.climbing && has_ladders,
            wall_jump: config.wall_jump && has_walls,
            thrust: config.thrust,
        }
    }
}

/// What the renderer should be showing, derived from state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationIntent {
    Idle,
    Run,
    Jump,
    Duck,
    Look,
    ClimbUp,
    ClimbDown,
    ThrustUp,
    ThrustDown,
    Die,
    Celebrate,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub locomotion: Locomotion,
    pub thrust: Thrust,
    pub charge: ChargeMeter,
    pub grounded: bool,
    /// Set by the orchestrator after the wall-tile pass; read on the next frame.
    pub on_wall: bool,
    /// Seconds of power-up left (0 = not powered).
    pub power_up: f32,
    /// Seconds of invulnerability left.
    pub invulnerable: Option<f32>,
    pub lives: u32,
    pub was_jump_held: bool,
    pub was_climbing: bool,
    pub previous_bottom: i32,
}

impl Player {
    pub fn new(start: Vec2, lives: u32) -> Self {
        let mut player = Player {
            position: start,
            velocity: Vec2::ZERO,
            facing: Facing::Right,
            locomotion: Locomotion::Idle,
            thrust: Thrust::None,
            charge: ChargeMeter::default(),
            grounded: false,
            on_wall: false,
            power_up: 0.0,
            invulnerable: None,
            lives,
            was_jump_held: false,
            was_climbing: false,
            previous_bottom: 0,
        };
        player.previous_bottom = player.bounds().bottom();
        player
    }

    /// Bring the player back to life at `start`. Lives are untouched.
    pub fn reset(&mut self, start: Vec2) {
        let lives = self.lives;
        *self = Player::new(start, lives);
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_bottom_center(self.position, PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    pub fn body(&self) -> Body {
        Body {
            position: self.position,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            previous_bottom: self.previous_bottom,
        }
    }

    pub fn is_alive(&self) -> bool {
        !matches!(self.locomotion, Locomotion::Dead)
    }

    pub fn is_charged(&self) -> bool {
        self.charge.charged
    }

    pub fn is_powered_up(&self) -> bool {
        self.power_up > 0.0
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable.is_some()
    }

    pub fn is_thrusting_down(&self) -> bool {
        self.thrust == Thrust::Down
    }

    /// Ascent window; extended while powered up.
    pub fn max_jump_time(&self, physics: &PhysicsConfig) -> f32 {
        if self.is_powered_up() {
            physics.powered_max_jump_time
        } else {
            physics.max_jump_time
        }
    }

    /// Jump curve exponent; doubled while charged for a snappier arc.
    pub fn jump_control_power(&self, physics: &PhysicsConfig) -> f32 {
        if self.is_charged() {
            physics.jump_control_power * 2.0
        } else {
            physics.jump_control_power
        }
    }

    pub fn kill(&mut self) {
        self.locomotion = Locomotion::Dead;
        self.thrust = Thrust::None;
        self.charge = ChargeMeter::default();
    }

    pub fn celebrate(&mut self) {
        self.locomotion = Locomotion::Celebrating;
        self.thrust = Thrust::None;
    }

    pub fn animation(&self) -> AnimationIntent {
        match self.locomotion {
            Locomotion::Dead => AnimationIntent::Die,
            Locomotion::Celebrating => AnimationIntent::Celebrate,
            Locomotion::Climbing => {
                if self.velocity.y > 0.02 {
                    AnimationIntent::ClimbDown
                } else {
                    AnimationIntent::ClimbUp
                }
            }
            _ if self.grounded => {
                if self.velocity.x.abs() > 0.02 {
                    AnimationIntent::Run
                } else if self.locomotion == Locomotion::Ducking {
                    AnimationIntent::Duck
                } else if self.locomotion == Locomotion::Looking {
                    AnimationIntent::Look
                } else {
                    AnimationIntent::Idle
                }
            }
            _ => match self.thrust {
                Thrust::Up => AnimationIntent::ThrustUp,
                Thrust::Down => AnimationIntent::ThrustDown,
                Thrust::None => AnimationIntent::Jump,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_player_stands_on_start_point() {
        let p = Player::new(Vec2::new(60.0, 96.0), 3);
        let b = p.bounds();
        assert_eq!(b.bottom(), 96);
        assert_eq!(b.left, 48);
        assert_eq!(p.previous_bottom, 96);
        assert!(p.is_alive());
    }

    #[test]
    fn reset_keeps_lives_and_revives() {
        let mut p = Player::new(Vec2::ZERO, 3);
        p.lives = 1;
        p.power_up = 4.0;
        p.kill();
        p.reset(Vec2::new(20.0, 32.0));
        assert!(p.is_alive());
        assert_eq!(p.lives, 1);
        assert!(!p.is_powered_up());
        assert_eq!(p.position, Vec2::new(20.0, 32.0));
    }

    #[test]
    fn power_up_extends_ascent_and_charge_doubles_exponent() {
        let physics = PhysicsConfig::default();
        let mut p = Player::new(Vec2::ZERO, 3);
        assert_eq!(p.max_jump_time(&physics), 0.40);
        p.power_up = 1.0;
        assert_eq!(p.max_jump_time(&physics), 0.99);
        p.charge.charged = true;
        assert_eq!(p.jump_control_power(&physics), 0.18);
    }

    #[test]
    fn capabilities_narrow_to_level_content() {
        let cfg = CapabilityConfig::default();
        let caps = Capabilities::resolve(&cfg, false, true);
        assert!(!caps.climbing);
        assert!(caps.wall_jump);
        assert!(caps.thrust);
    }

    #[test]
    fn airborne_animation_follows_thrust() {
        let mut p = Player::new(Vec2::ZERO, 3);
        p.locomotion = Locomotion::Falling;
        p.thrust = Thrust::Down;
        assert_eq!(p.animation(), AnimationIntent::ThrustDown);
        p.thrust = Thrust::None;
        assert_eq!(p.animation(), AnimationIntent::Jump);
        p.kill();
        assert_eq!(p.animation(), AnimationIntent::Die);
    }
}
