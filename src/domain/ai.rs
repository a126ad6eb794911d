/// Enemy AI: patrol / chase / return state machine.
///
/// ```text
///            sees player (in detection range + line of sight)
///   Patrolling ─────────────────────────────────────────────▶ Chasing
///       ▲                                                       │
///       │ back at anchor                 out of chase range or  │
///       │ (distance reset)               sight lost             ▼
///       └────────────────────────── Returning ◀─────────────────┘
///                                       │  ▲
///                                       └──┘ re-detect → Chasing
/// ```
///
/// Movement is horizontal only and gated by Wall cells alone; enemies never
/// jump, fall, or react to coins, spikes or exits. Enemies only read the
/// level, so every enemy in a tick sees the same grid.

use glam::Vec2;

use crate::config::EnemyConfig;
use super::cell::Cell;
use super::collision;
use super::entity::{Enemy, EnemyState, Facing};
use super::grid::Level;

impl Enemy {
    /// Run state transitions for this tick against the player's position.
    /// Returns the (possibly new) state.
    pub fn update_state(&mut self, player_pos: Vec2, level: &Level, cfg: &EnemyConfig) -> EnemyState {
        let distance = self.pos.distance(player_pos);
        match self.state {
            EnemyState::Patrolling | EnemyState::Returning => {
                if distance < cfg.detection_range
                    && collision::has_line_of_sight(level, self.pos, player_pos)
                {
                    self.state = EnemyState::Chasing;
                }
            }
            EnemyState::Chasing => {
                if distance > cfg.chase_range
                    || !collision::has_line_of_sight(level, self.pos, player_pos)
                {
                    self.state = EnemyState::Returning;
                }
            }
        }
        self.state
    }

    /// Full tick: transitions, then movement for the resulting state.
    pub fn update(&mut self, player_pos: Vec2, level: &Level, cfg: &EnemyConfig) {
        match self.update_state(player_pos, level, cfg) {
            EnemyState::Patrolling => self.patrol(level, cfg),
            EnemyState::Chasing => self.chase(player_pos, level, cfg),
            EnemyState::Returning => self.return_to_anchor(level, cfg),
        }
    }

    // ── Movement policies ──

    fn patrol(&mut self, level: &Level, cfg: &EnemyConfig) {
        let next_x = self.pos.x + self.facing.sign() * cfg.patrol_speed;

        if self.blocked_at(next_x, level) {
            // The wall caps the range; never below one step so an enemy
            // spawned against a wall can still walk away from it.
            let reach = (self.pos.x - self.anchor.x).abs();
            if reach >= cfg.patrol_speed {
                self.patrol_distance = self.patrol_distance.min(reach);
            }
            self.facing = self.facing.flipped();
        } else if (next_x - self.anchor.x).abs() > self.patrol_distance {
            self.facing = self.facing.flipped();
        } else {
            self.pos.x = next_x;
        }
    }

    fn chase(&mut self, player_pos: Vec2, level: &Level, cfg: &EnemyConfig) {
        let dx = player_pos.x - self.pos.x;
        if let Some(facing) = Facing::from_delta(dx) {
            self.facing = facing;
        }
        let step = dx.clamp(-cfg.chase_speed, cfg.chase_speed);
        if step == 0.0 { return; }

        let next_x = self.pos.x + step;
        if !self.blocked_at(next_x, level) {
            self.pos.x = next_x;
        }
    }

    fn return_to_anchor(&mut self, level: &Level, cfg: &EnemyConfig) {
        let dx = self.anchor.x - self.pos.x;
        if dx.abs() <= cfg.return_epsilon {
            self.pos.x = self.anchor.x;
            self.resume_patrol();
            return;
        }
        if let Some(facing) = Facing::from_delta(dx) {
            self.facing = facing;
        }

        let next_x = self.pos.x + dx.clamp(-cfg.patrol_speed, cfg.patrol_speed);
        if self.blocked_at(next_x, level) {
            // Can't get home: make this spot home.
            self.anchor.x = self.pos.x;
            self.resume_patrol();
            return;
        }
        self.pos.x = next_x;
        if (self.anchor.x - self.pos.x).abs() <= cfg.return_epsilon {
            self.pos.x = self.anchor.x;
            self.resume_patrol();
        }
    }

    fn resume_patrol(&mut self) {
        self.state = EnemyState::Patrolling;
        self.patrol_distance = self.initial_patrol_distance;
    }

    #[inline]
    fn blocked_at(&self, x: f32, level: &Level) -> bool {
        collision::is_colliding(level, Vec2::new(x, self.pos.y), Cell::Wall)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
