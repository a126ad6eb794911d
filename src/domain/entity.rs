/// Entities: Player and Enemy, plus the per-tick input intent.
/// Behaviour lives in `player.rs` (physics) and `ai.rs` (enemy state machine).

use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn from_delta(delta: f32) -> Option<Facing> {
        if delta > 0.0 {
            Some(Facing::Right)
        } else if delta < 0.0 {
            Some(Facing::Left)
        } else {
            None
        }
    }

    /// -1.0 for Left, +1.0 for Right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Facing {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Enemy AI state. Cycles Patrolling → Chasing → Returning → Patrolling.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyState {
    Patrolling,
    Chasing,
    Returning,
}

/// Frame input: held directions plus the jump key.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl FrameInput {
    /// Net horizontal direction: -1, 0 or +1 (both keys cancel out).
    pub fn horizontal(&self) -> f32 {
        (self.right as i32 - self.left as i32) as f32
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    /// Top-left corner of the unit hitbox, in grid units.
    pub pos: Vec2,
    /// Vertical velocity; positive is downward.
    pub y_velocity: f32,
    pub on_ground: bool,
    pub facing: Facing,
    pub moving: bool,
    pub dead: bool,
    pub lives: u32,
    /// Ticks left before the exit opens.
    pub timer: u32,
    /// One score slot per level.
    pub level_scores: Vec<u32>,
}

impl Player {
    pub fn new(level_count: usize, lives: u32, timer: u32) -> Self {
        Player {
            pos: Vec2::ZERO,
            y_velocity: 0.0,
            on_ground: false,
            facing: Facing::Right,
            moving: false,
            dead: false,
            lives,
            timer,
            level_scores: vec![0; level_count],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub pos: Vec2,
    pub facing: Facing,
    pub state: EnemyState,
    /// Home point while patrolling / returning.
    pub anchor: Vec2,
    /// Current patrol half-width around the anchor. Shrinks on wall bumps,
    /// restored to `initial_patrol_distance` after a return.
    pub patrol_distance: f32,
    pub initial_patrol_distance: f32,
}

impl Enemy {
    pub fn new(id: usize, pos: Vec2, patrol_distance: f32) -> Self {
        Enemy {
            id,
            pos,
            facing: Facing::Right,
            state: EnemyState::Patrolling,
            anchor: pos,
            patrol_distance,
            initial_patrol_distance: patrol_distance,
        }
    }
}
