/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
///
/// ```toml
/// [general]
/// levels_file = "data/levels.rle"
///
/// [speed]
/// tick_rate_ms = 16
///
/// [physics]
/// gravity = 0.01
/// jump_strength = 0.3
///
/// [enemy]
/// detection_range = 5.0
/// ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub physics: PhysicsConfig,
    pub enemy: EnemyConfig,
    pub gamepad: GamepadConfig,
    /// Run-length encoded levels file. Missing or broken → built-in levels.
    pub levels_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

/// Player physics and scoring. All distances in grid units per tick.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub move_speed: f32,
    pub gravity: f32,
    pub jump_strength: f32,
    pub ceiling_bounce: f32, // small downward push after hitting a ceiling
    pub enemy_bounce: f32,   // upward speed after stomping an enemy
    pub max_lives: u32,
    pub level_time_ticks: u32, // countdown; the exit opens at zero
    pub coin_points: u32,
}

/// Enemy AI tuning.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnemyConfig {
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub patrol_distance: f32,
    pub detection_range: f32,
    pub chase_range: f32,
    pub return_epsilon: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub pause: Vec<String>,
    pub back: Vec<String>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            move_speed: 0.1,
            gravity: 0.01,
            jump_strength: 0.3,
            ceiling_bounce: 0.05,
            enemy_bounce: 0.1,
            max_lives: 3,
            level_time_ticks: 50 * 60, // 50 s at 60 Hz
            coin_points: 10,
        }
    }
}

impl Default for EnemyConfig {
    fn default() -> Self {
        EnemyConfig {
            patrol_speed: 0.05,
            chase_speed: 0.1,
            patrol_distance: 3.0,
            detection_range: 5.0,
            chase_range: 8.0,
            return_epsilon: 0.1,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    physics: PhysicsConfig,
    #[serde(default)]
    enemy: EnemyConfig,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_back")]
    back: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_file")]
    levels_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 } // ~60 Hz
fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_back() -> Vec<String> { vec!["Select".into()] }
fn default_levels_file() -> String { "data/levels.rle".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            pause: default_pause(),
            back: default_back(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_file: default_levels_file() }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_schema(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_schema(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Relative paths are resolved against
    /// `search_dirs` the same way `load()` does.
    pub fn from_toml_str(text: &str, search_dirs: &[PathBuf]) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_schema(toml_cfg, search_dirs))
    }

    fn from_schema(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        GameConfig {
            speed: SpeedConfig { tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1) },
            physics: toml_cfg.physics,
            enemy: toml_cfg.enemy,
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                pause: toml_cfg.gamepad.pause,
                back: toml_cfg.gamepad.back,
            },
            levels_file: resolve_data_path(&toml_cfg.general.levels_file, search_dirs),
        }
    }
}

/// Absolute paths are kept; relative ones resolve to the first candidate
/// directory containing them, else stay relative to the CWD.
fn resolve_data_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(raw))
        .find(|p| p.exists())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
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
        if path.exists() {
            return load_toml_file(&path);
        }
    }
    debug!("no config.toml found, using defaults");
    TomlConfig::default()
}

fn load_toml_file(path: &Path) -> TomlConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => {
                debug!(path = %path.display(), "loaded config");
                cfg
            }
            Err(e) => {
                warn!(path = %path.display(), "config.toml parse error, using defaults: {e}");
                TomlConfig::default()
            }
        },
        Err(e) => {
            warn!("could not read {}: {e}", path.display());
            TomlConfig::default()
        }
    }
}
