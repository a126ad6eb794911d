/// Player physics: horizontal movement, jumping, gravity integration,
/// death and scoring.
///
/// ## Gravity truth table (one tick)
///
/// ┌───────────────┬──────────────────────┬──────────────────────────────┐
/// │ Velocity      │ Wall at proposed y?  │ Result                       │
/// ├───────────────┼──────────────────────┼──────────────────────────────┤
/// │ > 0 (falling) │ yes                  │ y = floor(y'), v = 0, ground │
/// │ > 0 (falling) │ no                   │ y = y', airborne             │
/// │ ≤ 0 (rising)  │ yes                  │ y = ceil(y'), v = bounce     │
/// │ ≤ 0 (rising)  │ no                   │ y = y'                       │
/// └───────────────┴──────────────────────┴──────────────────────────────┘
///
/// Falling below the last row kills. Gravity runs even while dead so the
/// death hop plays out.
///
/// Interactions with coins, spikes, the exit and enemies are resolved by
/// `sim::step`, which owns the enemy list and the event queue.

use glam::Vec2;
use tracing::debug;

use crate::config::PhysicsConfig;
use super::cell::Cell;
use super::collision;
use super::entity::{Facing, Player};
use super::grid::Level;

impl Player {
    /// Place the player on the level's spawn marker, consuming it.
    /// Without a marker, falls back to column 1 of the second-to-last row.
    pub fn spawn(&mut self, level: &mut Level) {
        let markers = level.take_markers(Cell::Player);
        self.pos = match markers.first() {
            Some(&(row, column)) => Vec2::new(column as f32, row as f32),
            None => {
                debug!("no player marker in level, using default spawn");
                Vec2::new(1.0, level.rows().saturating_sub(2) as f32)
            }
        };
        self.y_velocity = 0.0;
        self.on_ground = false;
        self.moving = false;
        self.dead = false;
    }

    pub fn move_horizontally(&mut self, delta: f32, level: &Level) {
        if self.dead { return; }
        self.moving = delta != 0.0;
        if let Some(facing) = Facing::from_delta(delta) {
            self.facing = facing;
        }

        let proposed = Vec2::new(self.pos.x + delta, self.pos.y);
        if !collision::is_colliding(level, proposed, Cell::Wall) {
            self.pos = proposed;
        }
    }

    pub fn jump(&mut self, physics: &PhysicsConfig) {
        if self.on_ground && !self.dead {
            self.y_velocity = -physics.jump_strength;
            self.on_ground = false;
        }
    }

    /// Integrate one tick of gravity. Returns true if the player died
    /// by falling out of the level during this call.
    pub fn update_gravity(&mut self, level: &Level, physics: &PhysicsConfig) -> bool {
        self.y_velocity += physics.gravity;
        let new_y = self.pos.y + self.y_velocity;
        let hits_wall = collision::is_colliding(level, Vec2::new(self.pos.x, new_y), Cell::Wall);

        if self.y_velocity > 0.0 {
            if hits_wall {
                self.pos.y = new_y.floor();
                self.y_velocity = 0.0;
                self.on_ground = true;
            } else {
                self.pos.y = new_y;
                self.on_ground = false;
            }
        } else if hits_wall {
            self.pos.y = new_y.ceil();
            self.y_velocity = physics.ceiling_bounce;
        } else {
            self.pos.y = new_y;
        }

        if self.pos.y > level.rows() as f32 {
            return self.kill(physics);
        }
        false
    }

    pub fn update_timer(&mut self) {
        self.timer = self.timer.saturating_sub(1);
    }

    pub fn reset_timer(&mut self, physics: &PhysicsConfig) {
        self.timer = physics.level_time_ticks;
    }

    /// Kill the player. Re-entrant calls while dead do nothing.
    /// Returns true if this call caused the death.
    pub fn kill(&mut self, physics: &PhysicsConfig) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.y_velocity = -physics.jump_strength * 0.5;
        self.lives = self.lives.saturating_sub(1);
        true
    }

    pub fn add_score(&mut self, level_index: usize, points: u32) {
        if let Some(slot) = self.level_scores.get_mut(level_index) {
            *slot += points;
        }
    }

    pub fn level_score(&self, level_index: usize) -> u32 {
        self.level_scores.get(level_index).copied().unwrap_or(0)
    }

    pub fn total_score(&self) -> u32 {
        self.level_scores.iter().sum()
    }

    /// Full restart: lives, alive, timer and every level score.
    pub fn reset_stats(&mut self, physics: &PhysicsConfig) {
        self.lives = physics.max_lives;
        self.dead = false;
        self.timer = physics.level_time_ticks;
        self.level_scores.iter_mut().for_each(|s| *s = 0);
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn level_from(rows: &[&str]) -> Level {
        let rows = rows
            .iter()
            .map(|r| r.chars().map(|c| Cell::from_glyph(c).unwrap()).collect())
            .collect();
        Level::from_rows(rows).unwrap()
    }

    fn physics() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn player_at(x: f32, y: f32) -> Player {
        let p = physics();
        let mut player = Player::new(3, p.max_lives, p.level_time_ticks);
        player.pos = Vec2::new(x, y);
        player
    }

    // ── spawn ──

    #[test]
    fn spawn_consumes_marker() {
        let mut l = level_from(&["#####", "#-@-#", "#####"]);
        let mut player = player_at(0.0, 0.0);
        player.dead = true;
        player.spawn(&mut l);
        assert_eq!(player.pos, Vec2::new(2.0, 1.0));
        assert!(!player.dead);
        assert_eq!(l.cell(1, 2), Cell::Air);
    }

    #[test]
    fn spawn_without_marker_uses_default() {
        let mut l = level_from(&["-----", "-----", "-----", "#####"]);
        let mut player = player_at(0.0, 0.0);
        player.spawn(&mut l);
        assert_eq!(player.pos, Vec2::new(1.0, 2.0));
    }

    // ── horizontal movement ──

    #[test]
    fn move_blocked_by_wall() {
        let l = level_from(&["#####", "#---#", "#####"]);
        let mut player = player_at(3.0, 1.0);
        player.move_horizontally(0.1, &l);
        assert_eq!(player.pos.x, 3.0);
        assert_eq!(player.facing, Facing::Right);
        assert!(player.moving);
    }

    #[test]
    fn move_sets_facing_and_position() {
        let l = level_from(&["#####", "#---#", "#####"]);
        let mut player = player_at(2.0, 1.0);
        player.move_horizontally(-0.1, &l);
        assert!((player.pos.x - 1.9).abs() < 1e-6);
        assert_eq!(player.facing, Facing::Left);
    }

    #[test]
    fn zero_delta_clears_moving_keeps_facing() {
        let l = level_from(&["#####", "#---#", "#####"]);
        let mut player = player_at(2.0, 1.0);
        player.move_horizontally(-0.1, &l);
        player.move_horizontally(0.0, &l);
        assert!(!player.moving);
        assert_eq!(player.facing, Facing::Left);
    }

    #[test]
    fn dead_player_cannot_move() {
        let l = level_from(&["#####", "#---#", "#####"]);
        let mut player = player_at(2.0, 1.0);
        player.dead = true;
        player.move_horizontally(0.1, &l);
        assert_eq!(player.pos.x, 2.0);
    }

    // ── jump ──

    #[test]
    fn jump_requires_ground() {
        let p = physics();
        let mut player = player_at(1.0, 1.0);
        player.jump(&p);
        assert_eq!(player.y_velocity, 0.0);

        player.on_ground = true;
        player.jump(&p);
        assert_eq!(player.y_velocity, -p.jump_strength);
        assert!(!player.on_ground);
    }

    #[test]
    fn dead_player_cannot_jump() {
        let p = physics();
        let mut player = player_at(1.0, 1.0);
        player.on_ground = true;
        player.dead = true;
        player.jump(&p);
        assert_eq!(player.y_velocity, 0.0);
    }

    // ── gravity ──

    #[test]
    fn lands_on_floor_within_two_ticks() {
        let l = crate::sim::level::decode_record("5#|#3-#|5#").unwrap();
        let p = physics();
        let mut player = player_at(1.0, 1.0);
        for _ in 0..2 {
            player.update_gravity(&l, &p);
        }
        assert!(player.on_ground);
        assert_eq!(player.pos.y, 1.0);
    }

    #[test]
    fn resting_player_stays_grounded() {
        let l = level_from(&["#####", "#---#", "#####"]);
        let p = physics();
        let mut player = player_at(2.0, 1.0);
        for _ in 0..500 {
            player.update_gravity(&l, &p);
            assert!(player.on_ground);
            assert_eq!(player.y_velocity, 0.0);
            assert_eq!(player.pos.y, 1.0);
        }
    }

    #[test]
    fn falls_freely_in_air() {
        let l = level_from(&["-----", "-----", "-----", "-----", "#####"]);
        let p = physics();
        let mut player = player_at(1.0, 0.0);
        player.update_gravity(&l, &p);
        player.update_gravity(&l, &p);
        assert!(!player.on_ground);
        assert!((player.y_velocity - 0.02).abs() < 1e-6);
        assert!((player.pos.y - 0.03).abs() < 1e-6);
    }

    #[test]
    fn ceiling_hit_bounces_down() {
        // Wall directly above a player standing in a one-high tunnel.
        let l = level_from(&["#####", "#---#", "#####"]);
        let p = physics();
        let mut player = player_at(2.0, 1.0);
        player.on_ground = true;
        player.jump(&p);
        player.update_gravity(&l, &p);
        assert_eq!(player.pos.y, 1.0);
        assert_eq!(player.y_velocity, p.ceiling_bounce);
    }

    #[test]
    fn falling_out_of_level_kills() {
        let l = level_from(&["---", "---"]);
        let p = physics();
        let mut player = player_at(1.0, 1.95);
        player.y_velocity = 0.2;
        assert!(player.update_gravity(&l, &p));
        assert!(player.dead);
        assert_eq!(player.lives, p.max_lives - 1);
    }

    #[test]
    fn gravity_runs_while_dead() {
        let l = level_from(&["-----", "-----", "-----", "-----", "#####"]);
        let p = physics();
        let mut player = player_at(1.0, 2.0);
        player.kill(&p);
        let y0 = player.pos.y;
        player.update_gravity(&l, &p);
        assert!(player.pos.y < y0, "death hop should move the player up first");
    }

    // ── kill ──

    #[test]
    fn kill_is_idempotent() {
        let p = physics();
        let mut player = player_at(1.0, 1.0);
        assert!(player.kill(&p));
        assert!(!player.kill(&p));
        assert_eq!(player.lives, p.max_lives - 1);
        assert_eq!(player.y_velocity, -p.jump_strength * 0.5);
    }

    #[test]
    fn lives_never_go_negative() {
        let p = physics();
        let mut player = player_at(1.0, 1.0);
        player.lives = 0;
        player.kill(&p);
        assert_eq!(player.lives, 0);
    }

    // ── timer / score ──

    #[test]
    fn timer_floors_at_zero() {
        let mut player = player_at(1.0, 1.0);
        player.timer = 1;
        player.update_timer();
        player.update_timer();
        assert_eq!(player.timer, 0);
    }

    #[test]
    fn scores_per_level_and_total() {
        let p = physics();
        let mut player = player_at(1.0, 1.0);
        player.add_score(0, 10);
        player.add_score(2, 30);
        player.add_score(9, 99); // no such level: ignored
        assert_eq!(player.level_score(0), 10);
        assert_eq!(player.level_score(1), 0);
        assert_eq!(player.total_score(), 40);

        player.kill(&p);
        player.timer = 0;
        player.reset_stats(&p);
        assert_eq!(player.total_score(), 0);
        assert_eq!(player.lives, p.max_lives);
        assert_eq!(player.timer, p.level_time_ticks);
        assert!(!player.dead);
    }
}
