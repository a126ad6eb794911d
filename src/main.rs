/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::entity::FrameInput;
use sim::level::{builtin_record, decode_record, encode_record, read_pack, LEVEL_COUNT};
use sim::step;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_BACK, KEYS_CONFIRM, KEYS_PAUSE};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Terminal coin-and-spike platformer.
#[derive(Parser, Debug)]
#[command(name = "ledgehop", version)]
struct Cli {
    /// Read levels from PATH instead of the configured levels file
    #[arg(long, value_name = "PATH")]
    levels: Option<PathBuf>,

    /// Write the log to PATH
    #[arg(long, value_name = "PATH", default_value = "ledgehop.log")]
    log: PathBuf,

    /// Print the built-in levels in levels-file format and exit
    #[arg(long)]
    dump_levels: bool,
}

/// Log to a file; the terminal belongs to the renderer.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging(path: &Path) {
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", path.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn dump_levels() {
    for index in 0..LEVEL_COUNT {
        let Some(record) = builtin_record(index) else { continue };
        match decode_record(record) {
            Ok(level) => {
                println!("; Level {}", index + 1);
                println!("{}", encode_record(&level));
                println!();
            }
            Err(e) => eprintln!("Built-in level {} is broken: {e}", index + 1),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if cli.dump_levels {
        dump_levels();
        return;
    }

    init_logging(&cli.log);

    let config = GameConfig::load();
    let levels_path = cli.levels.unwrap_or_else(|| config.levels_file.clone());
    let pack = match read_pack(&levels_path) {
        Ok(text) => {
            info!(path = %levels_path.display(), "levels file loaded");
            Some(text)
        }
        Err(e) => {
            warn!(path = %levels_path.display(), "using built-in levels: {e}");
            None
        }
    };

    let mut world = WorldState::new(config.physics.clone(), config.enemy.clone(), pack);
    let mut renderer = Renderer::new(config.speed.tick_rate_ms);

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Ledgehop!");
    println!("Final Score: {}", world.player.total_score());
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            info!("interrupted");
            break;
        }
        if handle_meta(world, sound, &kb, &gp) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            match world.phase {
                Phase::Playing => {
                    let events = step::step(world, frame_input(&kb, &gp));
                    if let Some(sfx) = sound {
                        sfx.play_events(&events);
                    }
                }
                Phase::Dying => step::tick_dying(world),
                _ => world.anim_tick = world.anim_tick.wrapping_add(1),
            }
            // Playing already ticks the message inside step().
            if world.phase != Phase::Playing {
                world.tick_message();
            }
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Keyboard and gamepad merged into one tick's movement input.
fn frame_input(kb: &InputState, gp: &GamepadState) -> FrameInput {
    let keys = kb.frame_input();
    FrameInput {
        left: keys.left || gp.left_held(),
        right: keys.right || gp.right_held(),
        jump: keys.jump || gp.jump_held(),
    }
}

/// Screen navigation: confirm, pause and back. Returns true to quit.
fn handle_meta(world: &mut WorldState, sound: Option<&SoundEngine>, kb: &InputState, gp: &GamepadState) -> bool {
    if kb.any_pressed(KEYS_BACK) || gp.back_pressed() {
        return step::back(world);
    }

    let pause = kb.any_pressed(KEYS_PAUSE) || gp.pause_pressed();
    if pause && matches!(world.phase, Phase::Playing | Phase::Paused) {
        step::toggle_pause(world);
        return false;
    }

    if kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed() {
        let events = step::confirm(world);
        if let Some(sfx) = sound {
            sfx.play_events(&events);
        }
    }

    false
}
