/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Horizontal movement (input)
///   2. Jump (input)
///   3. Player interactions: timer → coin → exit → enemies → spikes
///   4. Player gravity
///   5. Enemy AI
///   6. Phase transitions
///
/// Enemies never write to the level, so every enemy in a tick sees the same
/// grid. The only level mutation is coin pickup in step 3.
///
/// Meta intents (confirm / pause / back) drive the phase machine outside
/// `Playing`; see `sim::world` for the diagram.

use tracing::{debug, info};

use crate::domain::cell::Cell;
use crate::domain::collision;
use crate::domain::entity::FrameInput;
use super::event::GameEvent;
use super::level::load_level;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.tick_message();

    let delta = input.horizontal() * world.physics.move_speed;
    world.player.move_horizontally(delta, &world.level);
    if input.jump {
        world.player.jump(&world.physics);
    }

    if resolve_player_interactions(world, &mut events) {
        finish_level(world);
        return events;
    }

    if world.player.update_gravity(&world.level, &world.physics) {
        events.push(GameEvent::PlayerDied);
    }

    resolve_enemies(world);

    if world.player.dead {
        debug!(level = world.current_level, lives = world.player.lives, "player died");
        world.phase = Phase::Dying;
        world.anim_tick = 0;
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Player interactions
// ══════════════════════════════════════════════════════════════

/// Timer, pickups, exit, enemy combat and hazards for one tick.
/// Returns true if the player reached an open exit.
pub fn resolve_player_interactions(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.player.dead { return false; }

    world.player.update_timer();

    resolve_coin(world, events);

    if world.player.timer == 0 && collision::is_colliding(&world.level, world.player.pos, Cell::Exit) {
        events.push(GameEvent::ExitReached);
        return true;
    }

    resolve_enemy_combat(world, events);

    if !world.player.dead && collision::is_colliding(&world.level, world.player.pos, Cell::Spike) {
        if world.player.kill(&world.physics) {
            events.push(GameEvent::PlayerDied);
        }
    }

    false
}

fn resolve_coin(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let pos = world.player.pos;
    if !collision::is_colliding(&world.level, pos, Cell::Coin) { return; }

    if let Some((row, column)) = collision::find_matching_cell(&world.level, pos, Cell::Coin) {
        world.level.set_cell(row, column, Cell::Air);
        world.player.add_score(world.current_level, world.physics.coin_points);
        events.push(GameEvent::CoinCollected { row, column });
    }
}

/// Single pass over the enemy list. Stomped enemies are dropped in place;
/// the first enemy that hurts the player ends the pass.
fn resolve_enemy_combat(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player = &mut world.player;
    let physics = &world.physics;
    let stomping = player.y_velocity > 0.0;
    let mut hurt = false;

    world.enemies.retain(|enemy| {
        if hurt || !collision::entities_overlap(player.pos, enemy.pos) {
            return true;
        }
        if stomping && player.pos.y < enemy.pos.y {
            events.push(GameEvent::EnemyKilled { id: enemy.id });
            player.y_velocity = -physics.enemy_bounce;
            return false;
        }
        hurt = true;
        if player.kill(physics) {
            events.push(GameEvent::PlayerDied);
        }
        true
    });
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemies(world: &mut WorldState) {
    let target = world.player.pos;
    for enemy in &mut world.enemies {
        enemy.update(target, &world.level, &world.enemy_cfg);
    }
}

// ══════════════════════════════════════════════════════════════
// Phase handling
// ══════════════════════════════════════════════════════════════

fn finish_level(world: &mut WorldState) {
    info!(level = world.current_level, score = world.player.level_score(world.current_level), "level complete");
    world.anim_tick = 0;
    world.phase = if world.is_last_level() { Phase::Victory } else { Phase::LevelComplete };
}

/// While dying, gravity keeps running so the death hop plays out.
pub fn tick_dying(world: &mut WorldState) {
    if world.phase != Phase::Dying { return; }
    world.anim_tick = world.anim_tick.wrapping_add(1);
    world.player.update_gravity(&world.level, &world.physics);
}

/// Begin a fresh run from the first level.
pub fn start_game(world: &mut WorldState) {
    world.player.reset_stats(&world.physics);
    load_level(world, 0);
}

/// Reload the current level, keeping lives and score.
pub fn restart_level(world: &mut WorldState) {
    load_level(world, world.current_level);
}

/// Confirm (Enter / Start): advance whichever screen is showing.
pub fn confirm(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = vec![];
    match world.phase {
        Phase::Menu | Phase::GameOver => start_game(world),
        Phase::Dying => {
            if world.player.lives > 0 {
                restart_level(world);
            } else {
                info!(total = world.player.total_score(), "game over");
                world.level.unload();
                world.enemies.clear();
                world.anim_tick = 0;
                world.phase = Phase::GameOver;
                events.push(GameEvent::GameOver);
            }
        }
        Phase::LevelComplete => load_level(world, world.current_level + 1),
        Phase::Victory => {
            world.player.reset_stats(&world.physics);
            world.return_to_menu();
        }
        Phase::Playing | Phase::Paused => {}
    }
    events
}

/// Toggle `Playing ↔ Paused`. Other phases ignore it.
pub fn toggle_pause(world: &mut WorldState) {
    match world.phase {
        Phase::Playing => {
            world.phase = Phase::Paused;
            world.set_message("PAUSED", 0);
        }
        Phase::Paused => {
            world.phase = Phase::Playing;
            world.clear_message();
        }
        _ => {}
    }
}

/// Back (Esc / Select). Returns true if the game should quit.
pub fn back(world: &mut WorldState) -> bool {
    match world.phase {
        Phase::Menu => true,
        Phase::Playing => {
            toggle_pause(world);
            false
        }
        Phase::Victory => {
            world.player.reset_stats(&world.physics);
            world.return_to_menu();
            false
        }
        _ => {
            world.return_to_menu();
            false
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
