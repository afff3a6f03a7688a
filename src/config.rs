/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Every key is optional; missing sections and keys fall back to the
/// tuned defaults below, so an empty file is a valid config.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub timing: TimingConfig,
    pub actors: ActorConfig,
    pub capabilities: CapabilityConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub seed: u64,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

/// Player movement tunables. Units are pixels and seconds.
#[derive(Clone, Debug, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_move_acceleration")]
    pub move_acceleration: f32,
    #[serde(default = "default_max_move_speed")]
    pub max_move_speed: f32,
    #[serde(default = "default_ground_drag")]
    pub ground_drag: f32,
    #[serde(default = "default_air_drag")]
    pub air_drag: f32,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    #[serde(default = "default_max_fall_speed")]
    pub max_fall_speed: f32,
    /// Negative: up is -y.
    #[serde(default = "default_jump_launch_velocity")]
    pub jump_launch_velocity: f32,
    #[serde(default = "default_max_jump_time")]
    pub max_jump_time: f32,
    #[serde(default = "default_powered_max_jump_time")]
    pub powered_max_jump_time: f32,
    #[serde(default = "default_jump_control_power")]
    pub jump_control_power: f32,
    /// Acceleration multiplier while charged or powered up.
    #[serde(default = "default_boost_multiplier")]
    pub boost_multiplier: f32,
    /// Vertical input magnitude while on a ladder.
    #[serde(default = "default_climb_speed")]
    pub climb_speed: f32,
    #[serde(default = "default_ladder_alignment")]
    pub ladder_alignment: i32,
    /// Vertical slack for "standing on" / "touching" actor tests.
    #[serde(default = "default_contact_band")]
    pub contact_band: i32,
    #[serde(default = "default_thrust_bounce")]
    pub thrust_bounce: f32,
    #[serde(default = "default_thrust_hop")]
    pub thrust_hop: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_charge_min")]
    pub charge_min: f32,
    #[serde(default = "default_charge_max")]
    pub charge_max: f32,
    #[serde(default = "default_invulnerable")]
    pub invulnerable: f32,
    #[serde(default = "default_power_up")]
    pub power_up: f32,
    #[serde(default = "default_level_time")]
    pub level_time: f32,
    #[serde(default = "default_points_per_second")]
    pub points_per_second: u32,
    /// Largest dt a single step integrates; 0 disables the clamp.
    #[serde(default = "default_max_frame_delta")]
    pub max_frame_delta: f32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActorConfig {
    #[serde(default = "default_lives")]
    pub lives: u32,
    #[serde(default = "default_movable_speed")]
    pub movable_speed: f32,
    #[serde(default = "default_movable_charged_multiplier")]
    pub movable_charged_multiplier: f32,
    #[serde(default = "default_movable_wait")]
    pub movable_wait: f32,
    #[serde(default = "default_enemy_speed")]
    pub enemy_speed: f32,
    #[serde(default = "default_enemy_wait")]
    pub enemy_wait: f32,
    #[serde(default = "default_gem_points")]
    pub gem_points: u32,
    #[serde(default = "default_power_up_points")]
    pub power_up_points: u32,
}

/// Feature switches; a level can only narrow these (see `Capabilities::resolve`).
#[derive(Clone, Debug, Deserialize)]
pub struct CapabilityConfig {
    #[serde(default = "default_true")]
    pub climbing: bool,
    #[serde(default = "default_true")]
    pub wall_jump: bool,
    #[serde(default = "default_true")]
    pub thrust: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RulesConfig {
    /// Exit only counts once every gem is collected.
    #[serde(default)]
    pub require_all_gems: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_jump_buttons")]
    pub jump: Vec<String>,
    #[serde(default = "default_confirm_buttons")]
    pub confirm: Vec<String>,
    #[serde(default = "default_restart_buttons")]
    pub restart: Vec<String>,
    #[serde(default = "default_quit_buttons")]
    pub quit: Vec<String>,
}

// ── TOML Schema ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: Option<PhysicsConfig>,
    #[serde(default)]
    timing: Option<TimingConfig>,
    #[serde(default)]
    actors: Option<ActorConfig>,
    #[serde(default)]
    capabilities: Option<CapabilityConfig>,
    #[serde(default)]
    rules: RulesConfig,
    #[serde(default)]
    gamepad: Option<GamepadConfig>,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_move_acceleration() -> f32 { 13000.0 }
fn default_max_move_speed() -> f32 { 1750.0 }
fn default_ground_drag() -> f32 { 0.48 }
fn default_air_drag() -> f32 { 0.58 }
fn default_gravity() -> f32 { 2600.0 }
fn default_max_fall_speed() -> f32 { 450.0 }
fn default_jump_launch_velocity() -> f32 { -2600.0 }
fn default_max_jump_time() -> f32 { 0.40 }
fn default_powered_max_jump_time() -> f32 { 0.99 }
fn default_jump_control_power() -> f32 { 0.09 }
fn default_boost_multiplier() -> f32 { 2.0 }
fn default_climb_speed() -> f32 { 0.2 }
fn default_ladder_alignment() -> i32 { 12 }
fn default_contact_band() -> i32 { 4 }
fn default_thrust_bounce() -> f32 { 2000.0 }
fn default_thrust_hop() -> f32 { 50.0 }

fn default_charge_min() -> f32 { 0.5 }
fn default_charge_max() -> f32 { 1.9 }
fn default_invulnerable() -> f32 { 1.0 }
fn default_power_up() -> f32 { 9.0 }
fn default_level_time() -> f32 { 390.0 } // 6.5 minutes
fn default_points_per_second() -> u32 { 5 }
fn default_max_frame_delta() -> f32 { 0.05 }
fn default_frame_rate() -> u32 { 60 }

fn default_lives() -> u32 { 3 }
fn default_movable_speed() -> f32 { 120.0 }
fn default_movable_charged_multiplier() -> f32 { 3.0 }
fn default_movable_wait() -> f32 { 0.1 }
fn default_enemy_speed() -> f32 { 64.0 }
fn default_enemy_wait() -> f32 { 0.5 }
fn default_gem_points() -> u32 { 30 }
fn default_power_up_points() -> u32 { 100 }

fn default_true() -> bool { true }

fn default_jump_buttons() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm_buttons() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_restart_buttons() -> Vec<String> { vec!["Y".into()] }
fn default_quit_buttons() -> Vec<String> { vec!["Select".into()] }

fn default_levels_dir() -> String { "levels".into() }
fn default_seed() -> u64 { 354668 }
fn default_log_level() -> String { "warn".into() }

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            move_acceleration: default_move_acceleration(),
            max_move_speed: default_max_move_speed(),
            ground_drag: default_ground_drag(),
            air_drag: default_air_drag(),
            gravity: default_gravity(),
            max_fall_speed: default_max_fall_speed(),
            jump_launch_velocity: default_jump_launch_velocity(),
            max_jump_time: default_max_jump_time(),
            powered_max_jump_time: default_powered_max_jump_time(),
            jump_control_power: default_jump_control_power(),
            boost_multiplier: default_boost_multiplier(),
            climb_speed: default_climb_speed(),
            ladder_alignment: default_ladder_alignment(),
            contact_band: default_contact_band(),
            thrust_bounce: default_thrust_bounce(),
            thrust_hop: default_thrust_hop(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            charge_min: default_charge_min(),
            charge_max: default_charge_max(),
            invulnerable: default_invulnerable(),
            power_up: default_power_up(),
            level_time: default_level_time(),
            points_per_second: default_points_per_second(),
            max_frame_delta: default_max_frame_delta(),
            frame_rate: default_frame_rate(),
        }
    }
}

impl Default for ActorConfig {
    fn default() -> Self {
        ActorConfig {
            lives: default_lives(),
            movable_speed: default_movable_speed(),
            movable_charged_multiplier: default_movable_charged_multiplier(),
            movable_wait: default_movable_wait(),
            enemy_speed: default_enemy_speed(),
            enemy_wait: default_enemy_wait(),
            gem_points: default_gem_points(),
            power_up_points: default_power_up_points(),
        }
    }
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        CapabilityConfig { climbing: true, wall_jump: true, thrust: true }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: default_jump_buttons(),
            confirm: default_confirm_buttons(),
            restart: default_restart_buttons(),
            quit: default_quit_buttons(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default(), PathBuf::from(default_levels_dir()))
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            seed: default_seed(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        Self::from_schema(toml_cfg, levels_dir)
    }

    /// Parse config text directly (no file search; levels dir taken as written).
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        let levels_dir = PathBuf::from(&cfg.general.levels_dir);
        Ok(Self::from_schema(cfg, levels_dir))
    }

    fn from_schema(cfg: TomlConfig, levels_dir: PathBuf) -> Self {
        GameConfig {
            physics: cfg.physics.unwrap_or_default(),
            timing: cfg.timing.unwrap_or_default(),
            actors: cfg.actors.unwrap_or_default(),
            capabilities: cfg.capabilities.unwrap_or_default(),
            rules: cfg.rules,
            gamepad: cfg.gamepad.unwrap_or_default(),
            levels_dir,
            seed: cfg.general.seed,
            log_level: cfg.general.log_level,
            log_file: cfg.general.log_file.map(PathBuf::from),
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds data next to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ratiki");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/ratiki");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!("config.toml parse error, using defaults: {e}");
                    return TomlConfig::default();
                }
            },
            Err(e) => warn!("could not read {}: {e}", path.display()),
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.physics.ground_drag, 0.48);
        assert_eq!(cfg.physics.jump_launch_velocity, -2600.0);
        assert_eq!(cfg.timing.level_time, 390.0);
        assert_eq!(cfg.actors.lives, 3);
        assert!(cfg.capabilities.climbing);
        assert!(!cfg.rules.require_all_gems);
        assert_eq!(cfg.seed, 354668);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[physics]\ngravity = 1000.0\n\n[capabilities]\nthrust = false\n\n[general]\nseed = 7\n",
        )
        .unwrap();
        assert_eq!(cfg.physics.gravity, 1000.0);
        assert_eq!(cfg.physics.max_fall_speed, 450.0);
        assert!(!cfg.capabilities.thrust);
        assert!(cfg.capabilities.wall_jump);
        assert_eq!(cfg.seed, 7);
    }

    #[test]
    fn built_in_default_matches_empty_file() {
        let built_in = GameConfig::default();
        let parsed = GameConfig::from_toml_str("").unwrap();
        assert_eq!(built_in.seed, 354668);
        assert_eq!(built_in.seed, parsed.seed);
        assert_eq!(built_in.log_level, "warn");
        assert_eq!(built_in.log_level, parsed.log_level);
        assert_eq!(built_in.levels_dir, parsed.levels_dir);
        assert_eq!(built_in.gamepad.confirm, parsed.gamepad.confirm);
    }

    #[test]
    fn malformed_text_is_an_error() {
        assert!(GameConfig::from_toml_str("[physics\ngravity = ").is_err());
    }
}
