/// Level store: run-length encoded level records, the levels file, and
/// loading a level into the world.
///
/// ## Sources (priority order):
///   1. The levels file (`levels.rle`, path from config or `--levels`)
///   2. Built-in compiled-in records
///
/// Any failure of (1) for a given index is logged and falls back to (2) for
/// the same index. Only an index missing from both is an error; the world
/// treats that as "no more levels".
///
/// ## Record format
///   ```
///   ; comment
///   5#|#3-#|5#
///   ```
/// Digits accumulate into a repeat count for the next glyph (default 1);
/// `|` breaks the row. Short rows are padded with Air. Records are separated
/// by blank lines or `;` comment lines; consecutive lines are joined.
///
/// ## Glyphs:
///   '-' = Air     '#' = Wall    '=' = Dark wall (decoration)
///   '^' = Spike   '*' = Coin    'E' = Exit
///   '@' = Player  '&' = Enemy

use std::io;
use std::path::Path;

use glam::Vec2;
use tracing::{debug, info, warn};

use crate::domain::cell::Cell;
use crate::domain::entity::Enemy;
use crate::domain::grid::Level;
use super::world::{Phase, WorldState};

pub const LEVEL_COUNT: usize = 3;

/// Upper bound on decoded grid area, checked before anything is allocated.
pub const MAX_LEVEL_CELLS: usize = 1 << 16;

const BUILTIN_RECORDS: [&str; LEVEL_COUNT] = [
    "40#|#38-#|#38-#|#17-*-*-*16-#|#16-7#15-#|#38-#|#6-*-*21-*-*5-#|\
     #5-5#11-&7-5#4-#|#19-5#14-#|#-@8-*-*-*12-&6-*2-E#|8#3-9#2^18#|20=20#",
    "46#|#44-#|#13-*-*-*19-*-*-*2-#|#12-7#17-7#-#|#26-&17-#|#7-*-*11-11#12-#|\
     #6-5#33-#|#18-*11-*13-#|#15-7#5-7#10-#|#-@7-*-*6-&19-&3-E-#|\
     5#2^13#8^6#2^10#|6=40#",
    "52#|#50-#|#3-*-*-*26-*-*-*11-#|#2-7#5-&19-7#5-E3-#|#13-5#8-&19-5#|\
     #24-5#21-#|#7-*-*-*24-*-*11-#|#6-7#11-&10-5#10-#|#19-9#22-#|\
     #-@6-*26-*7-&6-#|6#2-3#5^4#12^6#3^11#|20#15=17#",
];

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(thiserror::Error, Debug)]
pub enum LevelLoadError {
    #[error("cannot read levels file: {0}")]
    Unreadable(#[from] io::Error),
    #[error("levels file contains no level records")]
    NoRecords,
    #[error("no level with index {0}")]
    InvalidIndex(usize),
    #[error("unknown level glyph {0:?}")]
    UnknownGlyph(char),
    /// A repeat count with no glyph after it.
    #[error("repeat count without a glyph")]
    DanglingCount,
    #[error("degenerate level ({rows} rows x {columns} columns)")]
    Degenerate { rows: usize, columns: usize },
    /// Decoding would exceed `MAX_LEVEL_CELLS`.
    #[error("level exceeds {} cells", MAX_LEVEL_CELLS)]
    TooLarge,
}

/// Where a loaded level came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelOrigin {
    File,
    Builtin,
}

// ══════════════════════════════════════════════════════════════
// Codec
// ══════════════════════════════════════════════════════════════

pub fn builtin_record(index: usize) -> Option<&'static str> {
    BUILTIN_RECORDS.get(index).copied()
}

/// Decode one run-length encoded record into a grid.
pub fn decode_record(record: &str) -> Result<Level, LevelLoadError> {
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new()];
    let mut count: usize = 0;
    let mut counting = false;
    let mut emitted: usize = 0;

    for ch in record.trim().chars() {
        if let Some(digit) = ch.to_digit(10) {
            count = count.saturating_mul(10).saturating_add(digit as usize);
            counting = true;
            continue;
        }
        let repeat = count.max(1);
        count = 0;
        counting = false;

        if ch == '|' {
            if rows.len().saturating_add(repeat) > MAX_LEVEL_CELLS {
                return Err(LevelLoadError::TooLarge);
            }
            rows.extend(std::iter::repeat_with(Vec::new).take(repeat));
            continue;
        }
        let cell = Cell::from_glyph(ch).ok_or(LevelLoadError::UnknownGlyph(ch))?;
        emitted = emitted.saturating_add(repeat);
        if emitted > MAX_LEVEL_CELLS {
            return Err(LevelLoadError::TooLarge);
        }
        if let Some(row) = rows.last_mut() {
            row.extend(std::iter::repeat(cell).take(repeat));
        }
    }
    if counting {
        return Err(LevelLoadError::DanglingCount);
    }

    let row_count = rows.len();
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if row_count.saturating_mul(columns) > MAX_LEVEL_CELLS {
        return Err(LevelLoadError::TooLarge);
    }
    Level::from_rows(rows).ok_or(LevelLoadError::Degenerate { rows: row_count, columns })
}

/// Encode a grid as a single-line record. Inverse of `decode_record`.
pub fn encode_record(level: &Level) -> String {
    let mut out = String::new();
    for (i, row) in level.row_slices().enumerate() {
        if i > 0 { out.push('|'); }
        let mut cells = row.iter().peekable();
        while let Some(&cell) = cells.next() {
            let mut run = 1;
            while cells.next_if_eq(&&cell).is_some() {
                run += 1;
            }
            if run > 1 {
                out.push_str(&run.to_string());
            }
            out.push(cell.glyph());
        }
    }
    out
}

/// Split a levels file into records.
pub fn parse_pack(text: &str) -> Result<Vec<String>, LevelLoadError> {
    let mut records = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        records.push(current);
    }

    if records.is_empty() {
        Err(LevelLoadError::NoRecords)
    } else {
        Ok(records)
    }
}

pub fn read_pack(path: &Path) -> Result<String, LevelLoadError> {
    Ok(std::fs::read_to_string(path)?)
}

/// Number of playable levels: the longer of the levels file and the
/// built-in table.
pub fn level_count(pack: Option<&str>) -> usize {
    pack.and_then(|text| parse_pack(text).ok())
        .map_or(0, |records| records.len())
        .max(LEVEL_COUNT)
}

fn decode_from_pack(text: &str, index: usize) -> Result<Level, LevelLoadError> {
    let records = parse_pack(text)?;
    let record = records.get(index).ok_or(LevelLoadError::InvalidIndex(index))?;
    decode_record(record)
}

impl Level {
    /// Replace this grid with level `index`, from the levels file if given
    /// and usable, else from the built-in table.
    pub fn load(&mut self, index: usize, pack: Option<&str>) -> Result<LevelOrigin, LevelLoadError> {
        self.unload();

        if let Some(text) = pack {
            match decode_from_pack(text, index) {
                Ok(level) => {
                    *self = level;
                    return Ok(LevelOrigin::File);
                }
                Err(e) => warn!(index, "levels file unusable ({e}), using built-in level"),
            }
        }

        let record = builtin_record(index).ok_or(LevelLoadError::InvalidIndex(index))?;
        *self = decode_record(record)?;
        Ok(LevelOrigin::Builtin)
    }
}

// ══════════════════════════════════════════════════════════════
// World loading
// ══════════════════════════════════════════════════════════════

/// Load a level into the world state. Preserves score and lives.
/// An index past the last level ends the game in `Victory`.
pub fn load_level(world: &mut WorldState, index: usize) {
    match world.level.load(index, world.pack.as_deref()) {
        Ok(origin) => {
            debug!(index, ?origin, rows = world.level.rows(), columns = world.level.columns(), "level loaded");
        }
        Err(e) => {
            info!(index, "no more levels ({e})");
            world.enemies.clear();
            world.phase = Phase::Victory;
            return;
        }
    }

    world.current_level = index;
    world.level_name = format!("Level {}", index + 1);
    spawn_entities(world);
    world.player.reset_timer(&world.physics);
    world.tick = 0;
    world.phase = Phase::Playing;
}

/// Consume the level's Player and Enemy markers.
pub(crate) fn spawn_entities(world: &mut WorldState) {
    world.player.spawn(&mut world.level);

    let patrol_distance = world.enemy_cfg.patrol_distance;
    world.enemies = world.level
        .take_markers(Cell::Enemy)
        .into_iter()
        .enumerate()
        .map(|(id, (row, column))| Enemy::new(id, Vec2::new(column as f32, row as f32), patrol_distance))
        .collect();
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnemyConfig, PhysicsConfig};

    fn row_string(level: &Level, row: usize) -> String {
        (0..level.columns()).map(|c| level.cell(row, c).glyph()).collect()
    }

    // ── decode_record ──

    #[test]
    fn decodes_runs_and_pads_rows() {
        let l = decode_record("3#2*|1^").unwrap();
        assert_eq!((l.rows(), l.columns()), (2, 5));
        assert_eq!(row_string(&l, 0), "###**");
        assert_eq!(row_string(&l, 1), "^----");
    }

    #[test]
    fn decodes_box() {
        let l = decode_record("5#|#3-#|5#").unwrap();
        assert_eq!((l.rows(), l.columns()), (3, 5));
        assert_eq!(row_string(&l, 1), "#---#");
    }

    #[test]
    fn multi_digit_counts() {
        let l = decode_record("12-").unwrap();
        assert_eq!(l.columns(), 12);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let l = decode_record("  2#|2#\n").unwrap();
        assert_eq!((l.rows(), l.columns()), (2, 2));
    }

    #[test]
    fn rejects_unknown_glyph() {
        assert!(matches!(decode_record("3#X"), Err(LevelLoadError::UnknownGlyph('X'))));
    }

    #[test]
    fn blanks_inside_a_record_are_rejected() {
        assert!(matches!(decode_record("# #"), Err(LevelLoadError::UnknownGlyph(' '))));
        assert!(matches!(decode_record("2#|#\t#"), Err(LevelLoadError::UnknownGlyph('\t'))));
    }

    #[test]
    fn oversized_runs_are_rejected_before_allocating() {
        assert!(matches!(decode_record("99999999999999999999999#"), Err(LevelLoadError::TooLarge)));
        assert!(matches!(decode_record("1000000000|#"), Err(LevelLoadError::TooLarge)));
        assert!(matches!(decode_record("300#|300|#"), Err(LevelLoadError::TooLarge)));
        assert!(decode_record("256#|255|256#").is_ok());
    }

    #[test]
    fn rejects_dangling_count() {
        assert!(matches!(decode_record("3#12"), Err(LevelLoadError::DanglingCount)));
    }

    #[test]
    fn rejects_degenerate() {
        assert!(matches!(decode_record(""), Err(LevelLoadError::Degenerate { columns: 0, .. })));
        assert!(matches!(decode_record("||"), Err(LevelLoadError::Degenerate { rows: 3, columns: 0 })));
    }

    // ── encode_record ──

    #[test]
    fn encode_inverts_decode() {
        for index in 0..LEVEL_COUNT {
            let record = builtin_record(index).unwrap();
            let level = decode_record(record).unwrap();
            assert_eq!(decode_record(&encode_record(&level)).unwrap(), level);
        }
        let l = decode_record("3#2*|1^").unwrap();
        assert_eq!(encode_record(&l), "3#2*|^4-");
    }

    // ── parse_pack ──

    #[test]
    fn pack_splits_on_blank_and_comment_lines() {
        let text = "; header\n3#\n\n2*|\n2*\n; two\n^\n";
        let records = parse_pack(text).unwrap();
        assert_eq!(records, vec!["3#", "2*|2*", "^"]);
    }

    #[test]
    fn empty_pack_has_no_records() {
        assert!(matches!(parse_pack("; nothing\n\n"), Err(LevelLoadError::NoRecords)));
    }

    #[test]
    fn shipped_levels_file_matches_builtins() {
        let records = parse_pack(include_str!("../../data/levels.rle")).unwrap();
        assert_eq!(records.len(), LEVEL_COUNT);
        for (index, record) in records.iter().enumerate() {
            let shipped = decode_record(record).unwrap();
            let builtin = decode_record(builtin_record(index).unwrap()).unwrap();
            assert_eq!(shipped, builtin, "level {index}");
        }
    }

    #[test]
    fn builtin_levels_are_playable() {
        for index in 0..LEVEL_COUNT {
            let l = decode_record(builtin_record(index).unwrap()).unwrap();
            assert_eq!(l.rows(), 12);
            assert_eq!(l.count(Cell::Player), 1, "level {index}");
            assert_eq!(l.count(Cell::Exit), 1, "level {index}");
            assert!(l.count(Cell::Enemy) > 0);
            assert!(l.count(Cell::Coin) > 0);
        }
    }

    #[test]
    fn level_count_prefers_longer_source() {
        assert_eq!(level_count(None), LEVEL_COUNT);
        assert_eq!(level_count(Some("3#\n\n3#\n\n3#\n\n3#\n")), 4);
        assert_eq!(level_count(Some("3#\n")), LEVEL_COUNT);
        assert_eq!(level_count(Some("")), LEVEL_COUNT);
    }

    // ── Level::load ──

    #[test]
    fn load_prefers_levels_file() {
        let mut l = Level::new();
        assert_eq!(l.load(0, Some("5#|#@--#|5#")).unwrap(), LevelOrigin::File);
        assert_eq!(l.columns(), 5);
    }

    #[test]
    fn broken_levels_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("levels.rle");
        std::fs::write(&path, "3#X|3#\n").unwrap();
        let text = read_pack(&path).unwrap();

        let mut l = Level::new();
        assert_eq!(l.load(0, Some(&text)).unwrap(), LevelOrigin::Builtin);
        assert_eq!(l, decode_record(builtin_record(0).unwrap()).unwrap());
    }

    #[test]
    fn oversized_record_falls_back_to_builtin() {
        let mut l = Level::new();
        let origin = l.load(0, Some("99999999999999999999999#")).unwrap();
        assert_eq!(origin, LevelOrigin::Builtin);
        assert_eq!(l, decode_record(builtin_record(0).unwrap()).unwrap());
    }

    #[test]
    fn short_levels_file_falls_back_per_index() {
        let mut l = Level::new();
        assert_eq!(l.load(1, Some("5#|#@--#|5#")).unwrap(), LevelOrigin::Builtin);
        assert_eq!(l.columns(), 46);
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_pack(&dir.path().join("nope.rle")).unwrap_err();
        assert!(matches!(err, LevelLoadError::Unreadable(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("cannot read levels file"));
    }

    #[test]
    fn index_past_everything_is_invalid() {
        let mut l = decode_record("3#").unwrap();
        assert!(matches!(l.load(LEVEL_COUNT, None), Err(LevelLoadError::InvalidIndex(3))));
        assert!(!l.is_loaded());
    }

    // ── load_level ──

    fn world() -> WorldState {
        WorldState::new(PhysicsConfig::default(), EnemyConfig::default(), None)
    }

    #[test]
    fn load_level_spawns_entities_and_clears_markers() {
        let mut w = world();
        w.player.timer = 0;
        load_level(&mut w, 0);
        assert_eq!(w.phase, Phase::Playing);
        assert_eq!(w.level.count(Cell::Player), 0);
        assert_eq!(w.level.count(Cell::Enemy), 0);
        assert_eq!(w.enemies.len(), 2);
        assert_eq!(w.player.pos, Vec2::new(2.0, 9.0));
        assert_eq!(w.player.timer, w.physics.level_time_ticks);
    }

    #[test]
    fn load_level_past_last_is_victory() {
        let mut w = world();
        load_level(&mut w, LEVEL_COUNT);
        assert_eq!(w.phase, Phase::Victory);
    }
}
