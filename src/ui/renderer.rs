/// Terminal front-end: double-buffered, diff-based renderer.
///
/// Each frame:
///   1. Fit the camera viewport to the terminal and follow the player
///   2. Compose the frame into `front` (tiles, props, actors, HUD)
///   3. Emit terminal commands only for cells that differ from `back`
///   4. Flush once, swap front/back
///
/// Screen layout:
///
/// ```text
///   row 0        HUD (level, score, time, lives, gems, status)
///   row 1        blank
///   rows 2..     map viewport, one tile = 2 columns x 1 row
///   below map    phase message
///   last         key help
/// ```
///
/// Tiles land on whole cells. Actors are placed at half-tile horizontal
/// resolution (one terminal column = TILE_WIDTH / 2 pixels) so movement
/// reads smoothly even though the grid is coarse.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};
use glam::Vec2;

use crate::domain::player::{AnimationIntent, Facing};
use crate::domain::tile::{cell_of, TileCollision, TILE_HEIGHT, TILE_WIDTH};
use crate::sim::props::PropKind;
use crate::sim::world::{Camera, Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every empty cell. Using the same RGB for
    /// `Clear` and for cells keeps VTE terminals from showing row seams.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a composed cell; forces a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = FrameBuffer::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Layout ──

/// Terminal columns per tile.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap + message + gap + help.
const RESERVED_ROWS: usize = MAP_ROW + 3;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

/// Glyph pair and color for a static tile.
fn tile_glyph(collision: TileCollision) -> Option<([char; 2], Color)> {
    match collision {
        TileCollision::Passable => None,
        TileCollision::Impassable => Some((['█', '█'], Color::Rgb { r: 140, g: 90, b: 60 })),
        TileCollision::Platform => Some((['▀', '▀'], Color::Rgb { r: 170, g: 170, b: 190 })),
        TileCollision::Ladder => Some((['╟', '╢'], Color::Rgb { r: 200, g: 150, b: 80 })),
    }
}

/// Darken an RGB color by `step` notches.
fn shade(color: Color, step: u32) -> Color {
    match color {
        Color::Rgb { r, g, b } => {
            let k = 1.0 - 0.12 * step as f32;
            let f = |c: u8| (c as f32 * k) as u8;
            Color::Rgb { r: f(r), g: f(g), b: f(b) }
        }
        other => other,
    }
}

fn player_glyph(intent: AnimationIntent, facing: Facing) -> char {
    match intent {
        AnimationIntent::Idle => '@',
        AnimationIntent::Run => match facing {
            Facing::Left => '<',
            Facing::Right => '>',
        },
        AnimationIntent::Jump => '^',
        AnimationIntent::Duck => '_',
        AnimationIntent::Look => '?',
        AnimationIntent::ClimbUp | AnimationIntent::ClimbDown => '#',
        AnimationIntent::ThrustUp => '↑',
        AnimationIntent::ThrustDown => '↓',
        AnimationIntent::Die => 'x',
        AnimationIntent::Celebrate => '*',
    }
}

/// `m:ss`, rounding partial seconds up so the clock reads 0:00 only when empty.
fn format_time(secs: f32) -> String {
    let total = secs.max(0.0).ceil() as u32;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Viewport cell for a world pixel: column at half-tile resolution.
fn screen_pos(cam: &Camera, p: Vec2) -> Option<(usize, usize)> {
    let half = (TILE_WIDTH / CELL_W as i32) as f32;
    let col = (p.x / half).floor() as i32 - cam.x * CELL_W as i32;
    let row = (p.y / TILE_HEIGHT as f32).floor() as i32 - cam.y;
    let in_view = col >= 0 && col < cam.view_w * CELL_W as i32 && row >= 0 && row < cam.view_h;
    in_view.then_some((col as usize, MAP_ROW + row as usize))
}

fn phase_message(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::Playing => None,
        Phase::Dead => Some("You fell! ENTER to try again"),
        Phase::TimeUp => Some("Out of time! ENTER to restart the level"),
        Phase::Tallying => Some("Exit reached! Counting remaining time..."),
        Phase::Cleared => Some("Level cleared! ENTER for the next level"),
        Phase::GameOver => Some("Game over. ENTER to start the level again"),
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    last_level: Option<usize>,
    /// Frame counter for blinking effects.
    tick: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            last_level: None,
            tick: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.fit_terminal()
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Resize buffers to the terminal and force a full repaint.
    fn fit_terminal(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.invalidate()
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    pub fn render(&mut self, world: &mut WorldState) -> io::Result<()> {
        self.tick = self.tick.wrapping_add(1);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.fit_terminal()?;
        }

        // Viewport in tiles, capped to the level so small maps center.
        let (world_w, world_h) = world.world_cells();
        world.camera.view_w = ((self.term_w / CELL_W) as i32).min(world_w).max(1);
        world.camera.view_h = (self.term_h.saturating_sub(RESERVED_ROWS) as i32).min(world_h).max(1);

        let phase = world.phase();
        let level_changed = self.last_level != Some(world.current_level);
        if level_changed || self.last_phase != Some(phase) {
            self.invalidate()?;
            self.last_phase = Some(phase);
        }
        if level_changed {
            world.camera.center_on(world.player_cell(), (world_w, world_h));
            self.last_level = Some(world.current_level);
        } else {
            world.camera.follow(world.player_cell(), (world_w, world_h));
        }

        self.front.clear();
        self.compose_hud(world);
        self.compose_map(world);
        self.compose_props(world);
        self.compose_actors(world);
        self.compose_player(world);
        self.compose_footer(world, phase);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        // Cursor position after the last print, if known.
        let mut cursor: Option<(usize, usize)> = None;

        // Explicit base colors, never ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_hud(&mut self, w: &WorldState) {
        let p = &w.player;
        let lives: String = "♥".repeat(p.lives as usize);
        let collected = w.gems_total - w.gems.len();
        let mut status = String::new();
        if p.is_powered_up() {
            status.push_str(&format!(" POWER {:.0}s", p.power_up.ceil()));
        }
        if p.is_charged() {
            status.push_str(" CHARGED");
        }
        let hud = format!(
            " {} ({}/{})  Score:{:<7} Time:{:>5}  {:<5} ◆{}/{}{}",
            w.level_name,
            w.current_level + 1,
            w.levels.len(),
            w.score,
            format_time(w.time_remaining),
            lives,
            collected,
            w.gems_total,
            status,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_map(&mut self, w: &WorldState) {
        let cam = &w.camera;
        for vy in 0..cam.view_h {
            let row = MAP_ROW + vy as usize;
            for vx in 0..cam.view_w {
                let Some(tile) = w.map.tile(cam.x + vx, cam.y + vy) else {
                    continue;
                };
                let Some((glyphs, fg)) = tile_glyph(tile.collision) else {
                    continue;
                };
                // Tile variants get slightly different shades.
                let fg = shade(fg, tile.visual.map_or(0, |h| h.index() % 3));
                let col = vx as usize * CELL_W;
                self.front.set(col, row, Cell::new(glyphs[0], fg, Color::Reset));
                self.front.set(col + 1, row, Cell::new(glyphs[1], fg, Color::Reset));
            }
        }

        let (exit_x, exit_y) = cell_of(w.exit.x, w.exit.y);
        if let Some((vx, vy)) = cam.world_to_view(exit_x, exit_y) {
            let fg = if w.reached_exit { Color::Green } else { Color::Rgb { r: 80, g: 255, b: 80 } };
            self.front.put_str(vx as usize * CELL_W, MAP_ROW + vy as usize, "[]", fg, Color::Reset);
        }
    }

    fn compose_props(&mut self, w: &WorldState) {
        for prop in &w.props {
            let (ch, fg) = match prop.kind {
                PropKind::Floor => ('▓', Color::Rgb { r: 110, g: 110, b: 120 }),
                PropKind::Crate => ('▣', Color::Rgb { r: 190, g: 140, b: 70 }),
            };
            if let Some((col, row)) = screen_pos(&w.camera, prop.position) {
                self.front.set(col, row, Cell::new(ch, fg, Color::Reset));
            }
        }
    }

    fn compose_actors(&mut self, w: &WorldState) {
        use crate::domain::actor::Obstacle;

        let cam = &w.camera;
        for tile in &w.movable_tiles {
            let b = tile.bounds();
            let left = Vec2::new(b.left as f32, b.center().y);
            if let Some((col, row)) = screen_pos(cam, left) {
                self.front.put_str(col, row, "══", Color::Cyan, Color::Reset);
            }
        }
        for tile in &w.wall_tiles {
            if let Some((col, row)) = screen_pos(cam, tile.bounds().center()) {
                let fg = if tile.player_adjacent { Color::Yellow } else { Color::Grey };
                self.front.set(col, row, Cell::new('▐', fg, Color::Reset));
            }
        }
        for gem in &w.gems {
            let at = gem.position + Vec2::new(0.0, gem.bounce());
            let (ch, fg) = if gem.power_up { ('✦', Color::Magenta) } else { ('◆', Color::Yellow) };
            if let Some((col, row)) = screen_pos(cam, at) {
                self.front.set(col, row, Cell::new(ch, fg, Color::Reset));
            }
        }
        for enemy in w.enemies.iter().filter(|e| e.alive) {
            use crate::domain::actor::EnemyKind;
            let (ch, fg) = match enemy.kind {
                EnemyKind::A => ('A', Color::Red),
                EnemyKind::B => ('B', Color::Rgb { r: 255, g: 140, b: 0 }),
                EnemyKind::C => ('C', Color::Rgb { r: 200, g: 80, b: 255 }),
                EnemyKind::D => ('D', Color::Rgb { r: 255, g: 80, b: 160 }),
            };
            if let Some((col, row)) = screen_pos(cam, enemy.bounds().center()) {
                self.front.set(col, row, Cell::new(ch, fg, Color::Reset));
            }
        }
    }

    fn compose_player(&mut self, w: &WorldState) {
        let p = &w.player;
        // Blink while invulnerable.
        if p.is_invulnerable() && (self.tick / 4) % 2 == 0 {
            return;
        }
        let fg = if p.is_powered_up() {
            const CYCLE: [Color; 3] = [Color::Red, Color::Yellow, Color::Cyan];
            CYCLE[((self.tick / 3) % CYCLE.len() as u64) as usize]
        } else if p.is_charged() {
            Color::Rgb { r: 255, g: 220, b: 50 }
        } else {
            Color::White
        };
        let ch = player_glyph(p.animation(), p.facing);
        if let Some((col, row)) = screen_pos(&w.camera, p.bounds().center()) {
            self.front.set(col, row, Cell::new(ch, fg, Color::Reset));
        }
    }

    fn compose_footer(&mut self, w: &WorldState, phase: Phase) {
        let msg_row = MAP_ROW + w.camera.view_h.max(0) as usize + 1;
        if let Some(msg) = phase_message(phase) {
            if msg_row < self.front.height {
                self.front.fill_row(msg_row, MSG_BG);
                self.front.put_str(1, msg_row, msg, Color::Black, MSG_BG);
            }
        }
        let help_row = self.front.height.saturating_sub(1);
        if help_row > msg_row {
            let help = " ←→:Move  ↑↓:Climb/Look/Duck  Space:Jump  C:Crate  R:Restart  Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }
}
