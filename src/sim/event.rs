/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and HUD messages.

use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    FellOut,
    OutOfLives,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    GemCollected { points: u32, at: Vec2 },
    PoweredUp,
    /// `stomped` is true for a downward-thrust kill.
    EnemyKilled { index: usize, stomped: bool },
    PlayerHurt { lives_left: u32 },
    PlayerKilled { cause: DeathCause },
    ExitReached,
    TimeExpired,
    PropRemoved { index: usize },
}

/// Fire-and-forget audio cue.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Cue {
    Jump,
    Gem,
    PowerUp,
    LandKill,
    Hurt,
    Death,
    ExitReached,
}

impl Cue {
    pub const ALL: [Cue; 7] = [
        Cue::Jump,
        Cue::Gem,
        Cue::PowerUp,
        Cue::LandKill,
        Cue::Hurt,
        Cue::Death,
        Cue::ExitReached,
    ];
}

impl GameEvent {
    /// At most one cue per event.
    pub fn cue(&self) -> Option<Cue> {
        match self {
            GameEvent::Jumped => Some(Cue::Jump),
            GameEvent::GemCollected { .. } => Some(Cue::Gem),
            GameEvent::PoweredUp => Some(Cue::PowerUp),
            GameEvent::EnemyKilled { stomped: true, .. } => Some(Cue::LandKill),
            GameEvent::EnemyKilled { stomped: false, .. } => None,
            GameEvent::PlayerHurt { .. } => Some(Cue::Hurt),
            GameEvent::PlayerKilled { .. } => Some(Cue::Death),
            GameEvent::ExitReached => Some(Cue::ExitReached),
            GameEvent::TimeExpired | GameEvent::PropRemoved { .. } => None,
        }
    }
}
