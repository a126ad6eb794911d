/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into the `front` buffer
///   2. Compare each glyph with the `back` buffer (previous frame)
///   3. Only emit terminal commands for glyphs that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each level cell is two terminal columns wide. Entities sit at
/// fractional positions and are drawn at half-cell horizontal resolution,
/// rounded to the nearest row. Levels wider than the terminal scroll
/// horizontally with the player.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::Cell;
use crate::domain::entity::{EnemyState, Facing};
use crate::sim::world::{Phase, WorldState};

// ── Glyph: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Glyph {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Glyph {
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 32 };

    const BLANK: Glyph = Glyph { ch: ' ', fg: Color::White, bg: Glyph::BASE_BG };

    /// Never equal to a real glyph, so the next diff repaints everything.
    const INVALID: Glyph = Glyph { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Glyph::BASE_BG } else { bg };
        Glyph { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Glyphs ──

struct FrameBuffer {
    width: usize,
    height: usize,
    glyphs: Vec<Glyph>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, glyphs: vec![Glyph::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.glyphs = vec![Glyph::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.glyphs.fill(Glyph::BLANK);
    }

    fn invalidate(&mut self) {
        self.glyphs.fill(Glyph::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, glyph: Glyph) {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x] = glyph;
        }
    }

    fn get(&self, x: usize, y: usize) -> Glyph {
        if x < self.width && y < self.height {
            self.glyphs[y * self.width + x]
        } else {
            Glyph::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i, y, Glyph::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Glyph::new(' ', Color::White, bg));
        }
    }

    /// Centre `s` on row `y`.
    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, Color::Reset);
    }
}

// ── Layout ──

/// Terminal columns per level cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const HUD_BG: Color = Color::Rgb { r: 30, g: 30, b: 70 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const TITLE_C: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GOOD_C: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const BAD_C: Color = Color::Rgb { r: 255, g: 70, b: 70 };

/// First visible level column so that `focus_x` stays centred, clamped to
/// the level. Levels narrower than the view start at 0.
fn scroll_x(focus_x: f32, level_cols: usize, view_cols: usize) -> usize {
    if level_cols <= view_cols {
        return 0;
    }
    let centred = focus_x.round() as i64 - (view_cols / 2) as i64;
    centred.clamp(0, (level_cols - view_cols) as i64) as usize
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    tick_rate_ms: u64,
    keyboard_enhanced: bool,
}

impl Renderer {
    pub fn new(tick_rate_ms: u64) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            tick_rate_ms,
            keyboard_enhanced: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Glyph::BASE_BG),
            Clear(ClearType::All)
        )?;

        // Release events let held keys end immediately instead of timing out.
        self.keyboard_enhanced = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.keyboard_enhanced {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.invalidate();
        Ok(())
    }

    pub fn keyboard_enhanced(&self) -> bool {
        self.keyboard_enhanced
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.keyboard_enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        if resized {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
        }
        if resized || self.last_phase != Some(world.phase) {
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(Glyph::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Menu => self.compose_menu(world),
            Phase::Playing => self.compose_game(world),
            Phase::Paused => {
                self.compose_game(world);
                self.compose_banner(world, "PAUSED", TITLE_C, &["P  Resume", "ESC  Menu"]);
            }
            Phase::Dying => {
                self.compose_game(world);
                let hint = if world.player.lives > 0 { "ENTER  Try again" } else { "ENTER  Continue" };
                self.compose_banner(world, "YOU DIED", BAD_C, &[hint, "ESC  Menu"]);
            }
            Phase::LevelComplete => {
                self.compose_game(world);
                let score = format!("Level score: {}", world.player.level_score(world.current_level));
                self.compose_banner(world, "LEVEL COMPLETE", GOOD_C, &[score.as_str(), "ENTER  Next level"]);
            }
            Phase::GameOver => self.compose_game_over(world),
            Phase::Victory => self.compose_victory(world),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed glyphs ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Glyph::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let glyph = self.front.get(x, y);
                if glyph == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if glyph.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(glyph.fg))?;
                    last_fg = glyph.fg;
                }
                if glyph.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(glyph.bg))?;
                    last_bg = glyph.bg;
                }
                queue!(self.writer, Print(glyph.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);

        let level = &w.level;
        if !level.is_loaded() {
            return;
        }
        let view_cols = (self.front.width / CELL_W).max(1);
        let first_col = scroll_x(w.player.pos.x, level.columns(), view_cols);
        let visible = level.columns().min(view_cols);

        for row in 0..level.rows() {
            let y = MAP_ROW + row;
            if y >= self.front.height { break; }
            for col in first_col..first_col + visible {
                let x = (col - first_col) * CELL_W;
                self.compose_cell(w, level.cell(row, col), x, y);
            }
        }

        let origin = first_col as f32;
        for enemy in &w.enemies {
            let (text, fg) = match enemy.state {
                EnemyState::Chasing => ("<>", BAD_C),
                _ => ("<>", Color::Magenta),
            };
            self.compose_entity(enemy.pos.x - origin, enemy.pos.y, text, fg);
        }

        let player_text = if w.player.dead {
            "xx"
        } else {
            match w.player.facing {
                Facing::Left => "<@",
                Facing::Right => "@>",
            }
        };
        let player_fg = if w.player.dead { BAD_C } else { Color::Cyan };
        self.compose_entity(w.player.pos.x - origin, w.player.pos.y, player_text, player_fg);

        let msg_row = MAP_ROW + level.rows() + 1;
        if !w.message.is_empty() && msg_row < self.front.height {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(1, msg_row, &w.message, Color::Black, MSG_BG);
        }

        let help_row = msg_row + 1;
        if help_row < self.front.height {
            let help = " Move: Arrows/AD   Jump: Up/W/Space   Pause: P   Menu: Esc";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_hud(&mut self, w: &WorldState) {
        let player = &w.player;
        let exit = if player.timer == 0 {
            "EXIT OPEN".to_string()
        } else {
            format!("Exit in {:>3}s", self.ticks_to_secs(player.timer))
        };
        let hud = format!(
            " {}/{}  Score {:<6} Lives {}  {}",
            w.level_name.trim_start_matches("Level "),
            w.level_count,
            player.total_score(),
            "♥".repeat(player.lives as usize),
            exit,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_cell(&mut self, w: &WorldState, cell: Cell, x: usize, y: usize) {
        let (text, fg, bg) = match cell {
            Cell::Wall => ("██", Color::Rgb { r: 120, g: 110, b: 100 }, Color::Reset),
            Cell::WallDark => ("▓▓", Color::Rgb { r: 55, g: 50, b: 50 }, Color::Reset),
            Cell::Spike => ("^^", BAD_C, Color::Reset),
            Cell::Coin => ("()", TITLE_C, Color::Reset),
            Cell::Exit if w.player.timer == 0 => ("[]", GOOD_C, Color::Rgb { r: 20, g: 70, b: 20 }),
            Cell::Exit => ("[]", Color::DarkGrey, Color::Reset),
            // Markers are consumed on spawn; draw any leftover as background.
            Cell::Air | Cell::Player | Cell::Enemy => return,
        };
        self.front.put_str(x, y, text, fg, bg);
    }

    /// Draw a two-column entity at level position (`lx`, `ly`) relative to
    /// the scroll origin. Anything off-map is skipped.
    fn compose_entity(&mut self, lx: f32, ly: f32, text: &str, fg: Color) {
        let row = ly.round();
        let col = (lx * CELL_W as f32).round();
        if row < 0.0 || col < 0.0 {
            return;
        }
        let y = MAP_ROW + row as usize;
        let x = col as usize;
        if x + CELL_W > self.front.width {
            return;
        }
        let bg = self.front.get(x, y).bg;
        self.front.put_str(x, y, text, fg, bg);
    }

    /// Boxed banner over the map area.
    fn compose_banner(&mut self, w: &WorldState, title: &str, color: Color, lines: &[&str]) {
        let box_bg = Color::Rgb { r: 40, g: 40, b: 50 };
        let width = lines
            .iter()
            .map(|l| l.chars().count())
            .chain(std::iter::once(title.chars().count()))
            .max()
            .unwrap_or(0)
            + 6;
        let height = lines.len() + 4;
        let map_h = w.level.rows().max(height);
        let x0 = self.front.width.saturating_sub(width) / 2;
        let y0 = MAP_ROW + map_h.saturating_sub(height) / 2;

        for y in y0..y0 + height {
            for x in x0..x0 + width {
                self.front.set(x, y, Glyph::new(' ', Color::White, box_bg));
            }
        }
        let blink = (w.anim_tick / 20) % 2 == 0 || w.phase != Phase::Dying;
        if blink {
            self.front.put_str(x0 + 3, y0 + 1, title, color, box_bg);
        }
        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(x0 + 3, y0 + 3 + i, line, Color::White, box_bg);
        }
    }

    fn compose_menu(&mut self, w: &WorldState) {
        let title = [
            r" _        _              _                  ",
            r"| | ___ _| | __ _  ___  | |__   ___  _ __   ",
            r"| |/ -_) _` |/ _` |/ -_) | '_ \ / _ \| '_ \  ",
            r"|_|\___\__,_|\__, |\___| |_| |_|\___/| .__/  ",
            r"             |___/                   |_|     ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_centered(2 + i, line, TITLE_C);
        }

        let base = 9;
        self.front.put_centered(base, "ENTER  Start", GOOD_C);
        self.front.put_centered(base + 1, "ESC    Quit ", Color::White);

        let help = [
            "Collect coins, stomp enemies, avoid spikes.",
            "The exit opens when the timer runs out.",
            "",
            "Arrows / A D   Move       Up / W / Space   Jump",
            "P              Pause      Esc              Back",
        ];
        for (i, line) in help.iter().enumerate() {
            self.front.put_centered(base + 3 + i, line, Color::DarkGrey);
        }

        let levels = format!("{} levels", w.level_count);
        self.front.put_centered(base + 9, &levels, Color::DarkGrey);
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        self.front.put_centered(4, "G A M E   O V E R", BAD_C);
        let score = format!("Final score: {}", w.player.total_score());
        let reached = format!("Reached level {}", w.current_level + 1);
        self.front.put_centered(7, &score, Color::White);
        self.front.put_centered(8, &reached, Color::White);
        self.front.put_centered(10, "ENTER  Play again", GOOD_C);
        self.front.put_centered(11, "ESC    Menu      ", Color::DarkGrey);
    }

    fn compose_victory(&mut self, w: &WorldState) {
        self.front.put_centered(3, "*  V I C T O R Y  *", TITLE_C);
        for (i, score) in w.player.level_scores.iter().enumerate() {
            let line = format!("Level {:>2}   {:>6}", i + 1, score);
            self.front.put_centered(6 + i, &line, Color::White);
        }
        let y = 7 + w.player.level_scores.len();
        let total = format!("Total      {:>6}", w.player.total_score());
        self.front.put_centered(y, &total, GOOD_C);
        self.front.put_centered(y + 2, "ENTER / ESC  Menu", Color::DarkGrey);
    }

    fn ticks_to_secs(&self, ticks: u32) -> u64 {
        (ticks as u64 * self.tick_rate_ms).div_ceil(1000)
    }
}
