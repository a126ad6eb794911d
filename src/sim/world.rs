/// WorldState: the complete snapshot of a running game.
///
/// One owned value threaded through the loop by `&mut`: the level grid,
/// the player, the enemy list, the phase machine and the tuning it runs on.
/// The renderer reads it once per frame; only `sim::step`, `sim::level` and
/// the meta handlers in `main.rs` mutate it.
///
/// ## Phase machine
///
/// ```text
///   Menu ──confirm──▶ Playing ◀──pause──▶ Paused
///                      │  │
///           player dead│  │exit reached
///                      ▼  ▼
///                  Dying  LevelComplete ──confirm──▶ Playing (next level)
///                   │  │                 └─(last level)──▶ Victory
///     confirm, lives│  │confirm, no lives
///                   ▼  ▼
///            Playing   GameOver ──confirm──▶ Playing (level 1, stats reset)
/// ```

use crate::config::{EnemyConfig, PhysicsConfig};
use crate::domain::entity::{Enemy, Player};
use crate::domain::grid::Level;
use super::level;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Menu,
    Playing,
    Paused,
    Dying,
    LevelComplete,
    GameOver,
    Victory,
}

pub struct WorldState {
    // ── Level ──
    pub level: Level,
    /// Contents of the levels file, if one was readable.
    pub pack: Option<String>,
    pub level_count: usize,
    pub current_level: usize,
    pub level_name: String,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,

    // ── Tuning ──
    pub physics: PhysicsConfig,
    pub enemy_cfg: EnemyConfig,

    // ── Meta ──
    pub phase: Phase,
    pub tick: u64,
    /// Ticks spent in the current non-playing phase, for blinking text.
    pub anim_tick: u32,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(physics: PhysicsConfig, enemy_cfg: EnemyConfig, pack: Option<String>) -> Self {
        let level_count = level::level_count(pack.as_deref());
        let player = Player::new(level_count, physics.max_lives, physics.level_time_ticks);
        WorldState {
            level: Level::new(),
            pack,
            level_count,
            current_level: 0,
            level_name: String::new(),
            player,
            enemies: vec![],
            physics,
            enemy_cfg,
            phase: Phase::Menu,
            tick: 0,
            anim_tick: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    pub fn is_last_level(&self) -> bool {
        self.current_level + 1 >= self.level_count
    }

    /// Show `msg` in the message bar. A duration of 0 keeps it until cleared.
    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn clear_message(&mut self) {
        self.message.clear();
        self.message_timer = 0;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }

    /// Leave the current session: drop the level and its entities.
    pub fn return_to_menu(&mut self) {
        self.level.unload();
        self.enemies.clear();
        self.clear_message();
        self.anim_tick = 0;
        self.phase = Phase::Menu;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(pack: Option<&str>) -> WorldState {
        WorldState::new(PhysicsConfig::default(), EnemyConfig::default(), pack.map(String::from))
    }

    #[test]
    fn new_world_starts_in_menu_with_full_stats() {
        let w = world(None);
        assert_eq!(w.phase, Phase::Menu);
        assert_eq!(w.player.lives, w.physics.max_lives);
        assert_eq!(w.player.level_scores.len(), level::LEVEL_COUNT);
        assert!(!w.level.is_loaded());
    }

    #[test]
    fn score_slots_follow_longer_levels_file() {
        let w = world(Some("3#\n\n3#\n\n3#\n\n3#\n\n3#\n"));
        assert_eq!(w.level_count, 5);
        assert_eq!(w.player.level_scores.len(), 5);
    }

    #[test]
    fn last_level_detection() {
        let mut w = world(None);
        w.current_level = level::LEVEL_COUNT - 2;
        assert!(!w.is_last_level());
        w.current_level += 1;
        assert!(w.is_last_level());
    }

    #[test]
    fn message_expires() {
        let mut w = world(None);
        w.set_message("hi", 2);
        w.tick_message();
        assert_eq!(w.message, "hi");
        w.tick_message();
        assert!(w.message.is_empty());
    }

    #[test]
    fn sticky_message_stays() {
        let mut w = world(None);
        w.set_message("PAUSED", 0);
        for _ in 0..10 { w.tick_message(); }
        assert_eq!(w.message, "PAUSED");
    }
}
