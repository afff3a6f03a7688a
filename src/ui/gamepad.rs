/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Movement (stick is analog)
///   A / B                 →  Jump (held)
///   Start / A             →  Confirm (outside play)
///   Y                     →  Restart level
///   Select                →  Quit
///
/// The left stick is passed through unquantized; the controller applies
/// its own dead zone. The d-pad always reads as a full deflection.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::player::FrameInput;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BUTTON_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    jump: Vec<Btn>,
    confirm: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: vec![Btn::A, Btn::B],
            confirm: vec![Btn::Start, Btn::A],
            restart: vec![Btn::Y],
            quit: vec![Btn::Select],
        }
    }
}

/// Held state of the four d-pad directions.
#[derive(Clone, Copy, Debug, Default)]
struct DPad {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BUTTON_COUNT],
    dpad: DPad,
    /// Left stick, gilrs convention: +y is up.
    stick_x: f32,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                tracing::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BUTTON_COUNT],
            dpad: DPad::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unrecognised lists keep
    /// the default binding for that action.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn apply(target: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *target = parsed;
            }
        }
        let map = &mut self.action_map;
        apply(&mut map.jump, &cfg.jump);
        apply(&mut map.confirm, &cfg.confirm);
        apply(&mut map.restart, &cfg.restart);
        apply(&mut map.quit, &cfg.quit);
    }

    /// Poll pending events. Call once per frame before reading state.
    pub fn update(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else {
            return;
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => {
                    self.connected = true;
                    tracing::info!("gamepad connected");
                }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                    tracing::info!("gamepad disconnected");
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp => self.dpad.up = held,
            Button::DPadDown => self.dpad.down = held,
            Button::DPadLeft => self.dpad.left = held,
            Button::DPadRight => self.dpad.right = held,
            other => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    let state = &mut self.buttons[btn as usize];
                    if held && !state.held {
                        state.just_pressed = true;
                    }
                    state.held = held;
                }
            }
        }
    }

    // ── Action queries (config-driven) ──

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].held)
    }

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.quit)
    }

    /// -1 (left) ..= 1 (right). The d-pad overrides the stick.
    pub fn horizontal(&self) -> f32 {
        match (self.dpad.left, self.dpad.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => self.stick_x.clamp(-1.0, 1.0),
        }
    }

    /// -1 (up) ..= 1 (down), screen convention.
    pub fn vertical(&self) -> f32 {
        match (self.dpad.up, self.dpad.down) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => (-self.stick_y).clamp(-1.0, 1.0),
        }
    }

    pub fn frame_input(&self) -> FrameInput {
        FrameInput {
            horizontal: self.horizontal(),
            vertical: self.vertical(),
            jump: self.any_held(&self.action_map.jump),
            spawn_crate: false,
        }
    }

    // ── Internal ──

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BUTTON_COUNT];
        self.dpad = DPad::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}
