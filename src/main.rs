/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::assets::NameRegistry;
use sim::event::GameEvent;
use sim::level;
use sim::props::StillProps;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{self, InputState};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let levels = level::load_levels(&config.levels_dir);
    info!(count = levels.len(), dir = %config.levels_dir.display(), "levels available");

    let mut world = match WorldState::new(
        config,
        levels,
        Box::new(NameRegistry::new()),
        Box::new(StillProps::new()),
    ) {
        Ok(world) => world,
        Err(e) => {
            error!("could not start: {e}");
            eprintln!("Could not load the first level: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_key_release();

    let sound = SoundEngine::new();
    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), enhanced);

    if enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        error!("game loop stopped: {e}");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Ratiki!");
    println!("Final Score: {}", world.score);
}

/// Log to `log_file` when configured, otherwise stderr. `RUST_LOG` wins
/// over the configured level.
fn init_logging(config: &GameConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &config.log_file {
        Some(path) => match std::fs::File::create(path) {
            Ok(file) => builder.with_ansi(false).with_writer(std::sync::Mutex::new(file)).init(),
            Err(e) => {
                builder.with_writer(io::stderr).init();
                warn!(path = %path.display(), "could not open log file: {e}");
            }
        },
        None => builder.with_writer(io::stderr).init(),
    }
}

/// Ask the terminal for key-release events so a held jump ends exactly
/// when the key comes up. Returns whether the request was accepted.
fn enable_key_release() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        debug!("keyboard enhancement unsupported, using hold timeout");
        return false;
    }
    execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    honor_release: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&world.config.gamepad);

    let frame = Duration::from_secs_f64(1.0 / f64::from(world.config.timing.frame_rate.max(1)));
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_pressed() || gp.quit_pressed() {
            break;
        }
        if kb.restart_pressed() || gp.restart_pressed() {
            step::restart_level(world)?;
        } else if kb.confirm_pressed() || gp.confirm_pressed() {
            confirm(world)?;
        }

        let now = Instant::now();
        let elapsed = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let frame_input = input::merge(kb.frame_input(), gp.frame_input());
        let events = step::step(world, &frame_input, elapsed);
        process_events(sound, &events);

        renderer.render(world)?;

        let spent = now.elapsed();
        if spent < frame {
            std::thread::sleep(frame - spent);
        }
    }
    Ok(())
}

/// Confirm advances whatever the current phase is waiting on.
fn confirm(world: &mut WorldState) -> Result<(), level::LevelError> {
    match world.phase() {
        Phase::Dead => step::respawn(world),
        Phase::TimeUp | Phase::GameOver => step::restart_level(world)?,
        Phase::Cleared => step::next_level(world)?,
        Phase::Playing | Phase::Tallying => {}
    }
    Ok(())
}

fn process_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    for event in events {
        debug!(?event, "game event");
        if let (Some(sfx), Some(cue)) = (sound, event.cue()) {
            sfx.play(cue);
        }
    }
}
