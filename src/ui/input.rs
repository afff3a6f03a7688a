/// Keyboard state tracker.
///
/// Tracks which keys are held so movement and jump stay continuous
/// between key-repeat events:
///   - Arrows / WASD        → movement axes
///   - Space / Z / K        → jump (held for a higher jump)
///   - Enter                → confirm (respawn, restart, next level)
///   - R                    → restart level
///   - C                    → drop a crate
///   - Esc / Q              → quit
///
/// Release events are honoured when the terminal supports keyboard
/// enhancement. Otherwise a key counts as released once no press or
/// repeat has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::player::FrameInput;

/// After this long without a Press/Repeat event, the key is released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('h')];
const RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('l')];
const UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w')];
const DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('j')];
const JUMP: &[KeyCode] = &[KeyCode::Char(' '), KeyCode::Char('z'), KeyCode::Char('k')];
const CONFIRM: &[KeyCode] = &[KeyCode::Enter];
const RESTART: &[KeyCode] = &[KeyCode::Char('r')];
const SPAWN_CRATE: &[KeyCode] = &[KeyCode::Char('c')];
const QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    pub raw_events: Vec<KeyEvent>,
    /// Only true when keyboard enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain pending terminal events. Call once per frame before `step`.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            self.raw_events.push(key);
            let code = normalize(key.code);
            match key.kind {
                KeyEventKind::Release if self.honor_release => {
                    self.last_active.remove(&code);
                }
                KeyEventKind::Release => {}
                _ => {
                    if !self.is_held(code) {
                        self.fresh_presses.push(code);
                    }
                    self.last_active.insert(code, Instant::now());
                }
            }
        }

        if !self.honor_release {
            let now = Instant::now();
            self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .is_some_and(|t| self.honor_release || t.elapsed() < HOLD_TIMEOUT)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    /// This frame's keyboard contribution to player input.
    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            horizontal: axis(self.any_held(LEFT), self.any_held(RIGHT)),
            vertical: axis(self.any_held(UP), self.any_held(DOWN)),
            jump: self.any_held(JUMP),
            spawn_crate: self.any_pressed(SPAWN_CRATE),
        }
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_pressed(CONFIRM)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_pressed(RESTART)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(QUIT) || self.ctrl_c_pressed()
    }

    fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }
}

/// Shift-letter and plain letter are the same key for gameplay.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// Two opposing digital inputs as one axis. Both held cancel out.
fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// Keyboard and gamepad both feed the same frame; the stronger axis wins.
pub fn merge(a: FrameInput, b: FrameInput) -> FrameInput {
    let stronger = |x: f32, y: f32| if y.abs() > x.abs() { y } else { x };
    FrameInput {
        horizontal: stronger(a.horizontal, b.horizontal),
        vertical: stronger(a.vertical, b.vertical),
        jump: a.jump || b.jump,
        spawn_crate: a.spawn_crate || b.spawn_crate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_keys_cancel() {
        assert_eq!(axis(true, true), 0.0);
        assert_eq!(axis(true, false), -1.0);
        assert_eq!(axis(false, true), 1.0);
    }

    #[test]
    fn merge_prefers_stronger_axis_and_ors_buttons() {
        let kb = FrameInput { horizontal: -1.0, jump: true, ..FrameInput::default() };
        let pad = FrameInput { horizontal: 0.4, vertical: 0.8, ..FrameInput::default() };
        let m = merge(kb, pad);
        assert_eq!(m.horizontal, -1.0);
        assert_eq!(m.vertical, 0.8);
        assert!(m.jump);
    }

    #[test]
    fn idle_keyboard_gives_idle_input() {
        assert_eq!(InputState::new().frame_input(), FrameInput::default());
    }

    #[test]
    fn shifted_letters_normalize() {
        assert_eq!(normalize(KeyCode::Char('R')), KeyCode::Char('r'));
        assert_eq!(normalize(KeyCode::Enter), KeyCode::Enter);
    }
}
