/// Collision engine: grid-cell hit testing with unit AABBs.
///
/// ## Query model
///
/// Every entity is a 1×1 box whose top-left corner is its position.
/// A query examines only the 3×3 block of cells around `floor(point)`:
/// at the supported speeds no entity moves more than one cell per tick,
/// so nothing further away can overlap.
///
/// Overlap is strict: boxes that merely touch along an edge do not
/// collide. Cells are visited row-major, column ascending, and the first
/// hit wins, which makes tie-breaks deterministic.
///
/// Shared by player physics, enemy AI and pickup detection.

use glam::Vec2;

use super::cell::Cell;
use super::grid::Level;

/// Distance between line-of-sight samples, in grid units.
pub const LINE_OF_SIGHT_STEP: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    /// Unit box anchored at `pos` (top-left corner).
    #[inline]
    pub fn unit(pos: Vec2) -> Self {
        Aabb { x: pos.x, y: pos.y, w: 1.0, h: 1.0 }
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

/// First overlapped cell of type `look_for` around `pos`, as (row, column).
pub fn find_collision(level: &Level, pos: Vec2, look_for: Cell) -> Option<(usize, usize)> {
    let hitbox = Aabb::unit(pos);
    let base_row = pos.y.floor() as i64;
    let base_col = pos.x.floor() as i64;

    for row in base_row - 1..=base_row + 1 {
        for column in base_col - 1..=base_col + 1 {
            if !level.is_inside(row, column) { continue; }
            let (r, c) = (row as usize, column as usize);
            if level.cell(r, c) != look_for { continue; }
            let block = Aabb::unit(Vec2::new(column as f32, row as f32));
            if hitbox.intersects(&block) {
                return Some((r, c));
            }
        }
    }
    None
}

/// Does a unit box at `pos` overlap any cell of type `look_for`?
pub fn is_colliding(level: &Level, pos: Vec2, look_for: Cell) -> bool {
    find_collision(level, pos, look_for).is_some()
}

/// Like `find_collision`, but when nothing matches falls back to the cell
/// directly under `floor(pos)` (if inside the grid). The fallback is not a
/// hit: callers confirm a collision first.
pub fn find_matching_cell(level: &Level, pos: Vec2, look_for: Cell) -> Option<(usize, usize)> {
    if let Some(hit) = find_collision(level, pos, look_for) {
        return Some(hit);
    }
    let row = pos.y.floor() as i64;
    let column = pos.x.floor() as i64;
    if level.is_inside(row, column) {
        Some((row as usize, column as usize))
    } else {
        None
    }
}

/// Unit-box overlap between two entities.
#[inline]
pub fn entities_overlap(a: Vec2, b: Vec2) -> bool {
    Aabb::unit(a).intersects(&Aabb::unit(b))
}

/// Walk the segment `from → to` in `LINE_OF_SIGHT_STEP` increments; sight is
/// blocked if any intermediate sample overlaps a wall. Coincident points are
/// always visible.
pub fn has_line_of_sight(level: &Level, from: Vec2, to: Vec2) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return true;
    }
    let dir = delta / distance;
    let mut travelled = LINE_OF_SIGHT_STEP;
    while travelled < distance {
        if is_colliding(level, from + dir * travelled, Cell::Wall) {
            return false;
        }
        travelled += LINE_OF_SIGHT_STEP;
    }
    true
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

    // ── Aabb ──

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = Aabb::unit(Vec2::new(0.0, 0.0));
        assert!(!a.intersects(&Aabb::unit(Vec2::new(1.0, 0.0))));
        assert!(!a.intersects(&Aabb::unit(Vec2::new(0.0, 1.0))));
        assert!(!a.intersects(&Aabb::unit(Vec2::new(1.0, 1.0))));
        assert!(a.intersects(&Aabb::unit(Vec2::new(0.99, 0.5))));
    }

    // ── is_colliding ──

    #[test]
    fn collides_iff_exact_overlap_with_adjacent_wall() {
        // Single wall in the middle of a 5×5 field of air.
        let l = level_from(&["-----", "-----", "--#--", "-----", "-----"]);
        let wall = Aabb::unit(Vec2::new(2.0, 2.0));

        let mut y = 0.0_f32;
        while y <= 4.0 {
            let mut x = 0.0_f32;
            while x <= 4.0 {
                let p = Vec2::new(x, y);
                let expected = Aabb::unit(p).intersects(&wall);
                assert_eq!(is_colliding(&l, p, Cell::Wall), expected, "point {p:?}");
                x += 0.25;
            }
            y += 0.25;
        }
    }

    #[test]
    fn only_matching_type_collides() {
        let l = level_from(&["-*-", "---"]);
        let p = Vec2::new(1.0, 0.5);
        assert!(is_colliding(&l, p, Cell::Coin));
        assert!(!is_colliding(&l, p, Cell::Wall));
        assert!(!is_colliding(&l, p, Cell::Spike));
    }

    #[test]
    fn out_of_bounds_neighbourhood_is_ignored() {
        let l = level_from(&["#"]);
        assert!(is_colliding(&l, Vec2::new(0.5, 0.5), Cell::Wall));
        assert!(!is_colliding(&l, Vec2::new(-3.0, -3.0), Cell::Wall));
        assert!(!is_colliding(&l, Vec2::new(1.0, 0.0), Cell::Wall));
    }

    #[test]
    fn first_hit_is_row_major() {
        // Box at (0.5, 0.5) overlaps all four cells; coins at (0,1) and (1,0).
        let l = level_from(&["-*", "*-"]);
        assert_eq!(find_collision(&l, Vec2::new(0.5, 0.5), Cell::Coin), Some((0, 1)));
    }

    // ── find_matching_cell ──

    #[test]
    fn matching_cell_falls_back_to_floored_cell() {
        let l = level_from(&["---", "---"]);
        assert_eq!(find_matching_cell(&l, Vec2::new(1.5, 1.2), Cell::Coin), Some((1, 1)));
        assert_eq!(find_matching_cell(&l, Vec2::new(7.0, 7.0), Cell::Coin), None);
    }

    // ── entities_overlap ──

    #[test]
    fn entity_overlap() {
        assert!(entities_overlap(Vec2::new(1.0, 1.0), Vec2::new(1.5, 1.9)));
        assert!(!entities_overlap(Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0)));
    }

    // ── has_line_of_sight ──

    #[test]
    fn sight_blocked_by_wall() {
        let l = level_from(&["-------", "---#---", "-------"]);
        assert!(!has_line_of_sight(&l, Vec2::new(0.0, 1.0), Vec2::new(6.0, 1.0)));
    }

    #[test]
    fn sight_clear_in_open_corridor() {
        let l = level_from(&["#######", "-------", "#######"]);
        assert!(has_line_of_sight(&l, Vec2::new(0.0, 1.0), Vec2::new(6.0, 1.0)));
    }

    #[test]
    fn coincident_points_are_visible() {
        let l = level_from(&["###", "###"]);
        let p = Vec2::new(1.0, 0.0);
        assert!(has_line_of_sight(&l, p, p));
    }
}
