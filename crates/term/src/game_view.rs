//! GameView: maps a core `GameSnapshot` into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.
//!
//! Each grid cell shows the top tile of its stack: a glyph and color per
//! identity, the stack height, and a row of pips for the layers underneath.
//! Host decorations (cursor, hint, match flash, adapter status) come in
//! through [`HostOverlay`] and never from the core.

use crate::core::GameSnapshot;
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{
    LossReason, MatchEvent, RoundStatus, MAX_GRID_SIZE, MAX_HOLD, SCORE_PER_MATCH,
};

const GRID: usize = MAX_GRID_SIZE as usize;

/// Width reserved for the side panel.
const PANEL_W: u16 = 22;
const PANEL_GAP: u16 = 2;

const GLYPHS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const PALETTE: [Rgb; 12] = [
    Rgb::new(220, 80, 80),
    Rgb::new(80, 170, 230),
    Rgb::new(110, 210, 110),
    Rgb::new(240, 200, 70),
    Rgb::new(190, 110, 230),
    Rgb::new(250, 150, 60),
    Rgb::new(70, 210, 200),
    Rgb::new(235, 110, 180),
    Rgb::new(160, 160, 240),
    Rgb::new(170, 200, 80),
    Rgb::new(200, 150, 110),
    Rgb::new(150, 150, 150),
];

const BOARD_BG: Rgb = Rgb::new(30, 30, 40);
const PANEL_BG: Rgb = Rgb::new(0, 0, 0);

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterStatusView {
    pub enabled: bool,
    pub client_count: u16,
    pub controller_id: Option<usize>,
    pub streaming_count: u16,
}

/// Host-side decorations drawn over the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostOverlay {
    pub cursor: Option<(u8, u8)>,
    pub hint: Option<(u8, u8)>,
    /// A recent match to flash in the side panel.
    pub flash: Option<MatchEvent>,
    pub adapter: Option<AdapterStatusView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

/// Glyph shown for an identity.
pub fn identity_glyph(identity: u16) -> char {
    GLYPHS[identity as usize % GLYPHS.len()] as char
}

/// Base color of an identity.
pub fn identity_color(identity: u16) -> Rgb {
    PALETTE[identity as usize % PALETTE.len()]
}

/// Screen rectangle of the bordered board.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
}

/// Top tile (index into `snap.board`) and stack height per grid cell.
struct CellTable {
    top: [[Option<u16>; GRID]; GRID],
    height: [[u8; GRID]; GRID],
}

impl CellTable {
    fn build(snap: &GameSnapshot) -> Self {
        let mut table = Self {
            top: [[None; GRID]; GRID],
            height: [[0; GRID]; GRID],
        };
        for (i, t) in snap.board.iter().enumerate() {
            let (x, y) = (t.pos.x as usize, t.pos.y as usize);
            if x >= GRID || y >= GRID {
                continue;
            }
            table.height[y][x] += 1;
            let higher = match table.top[y][x] {
                Some(j) => t.pos.layer > snap.board[j as usize].pos.layer,
                None => true,
            };
            if higher {
                table.top[y][x] = Some(i as u16);
            }
        }
        table
    }
}

/// A lightweight terminal renderer for the tile board.
pub struct GameView {
    /// Grid cell width in terminal columns.
    cell_w: u16,
    /// Grid cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
}

impl Default for GameView {
    fn default() -> Self {
        // 4x2 keeps cells roughly square with typical glyph aspect ratios.
        Self {
            cell_w: 4,
            cell_h: 2,
            anchor_y: AnchorY::Center,
        }
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(3),
            cell_h: cell_h.max(1),
            anchor_y: AnchorY::Center,
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    fn frame(&self, snap: &GameSnapshot, viewport: Viewport) -> Frame {
        let cols = snap.cols.min(MAX_GRID_SIZE) as u16;
        let rows = snap.rows.min(MAX_GRID_SIZE) as u16;
        let w = cols * self.cell_w + 2;
        let h = rows * self.cell_h + 2;

        let total_w = w + PANEL_GAP + PANEL_W;
        let x = viewport.width.saturating_sub(total_w) / 2;
        let y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(h) / 2,
            AnchorY::Top => 0,
        };
        Frame { x, y, w, h }
    }

    /// Grid cell under terminal position `(col, row)`, for mouse picks.
    pub fn cell_at(
        &self,
        snap: &GameSnapshot,
        viewport: Viewport,
        col: u16,
        row: u16,
    ) -> Option<(u8, u8)> {
        let frame = self.frame(snap, viewport);
        let left = frame.x + 1;
        let top = frame.y + 1;
        if col < left || row < top {
            return None;
        }
        let gx = (col - left) / self.cell_w;
        let gy = (row - top) / self.cell_h;
        if gx >= snap.cols.min(MAX_GRID_SIZE) as u16 || gy >= snap.rows.min(MAX_GRID_SIZE) as u16 {
            return None;
        }
        Some((gx as u8, gy as u8))
    }

    /// Render the snapshot into an existing framebuffer.
    ///
    /// This is the allocation-free hot path. Callers can reuse a framebuffer
    /// across frames and only resize when the terminal size changes.
    pub fn render_into(&self, snap: &GameSnapshot, viewport: Viewport, fb: &mut FrameBuffer) {
        self.render_into_with(snap, &HostOverlay::default(), viewport, fb);
    }

    pub fn render_into_with(
        &self,
        snap: &GameSnapshot,
        overlay: &HostOverlay,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().cell(' '));

        let frame = self.frame(snap, viewport);
        let border = CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG);

        fb.fill_rect(
            frame.x + 1,
            frame.y + 1,
            frame.w - 2,
            frame.h - 2,
            ' ',
            CellStyle::new(BOARD_BG, BOARD_BG),
        );
        draw_border(fb, frame, border);

        let table = CellTable::build(snap);
        for gy in 0..snap.rows.min(MAX_GRID_SIZE) {
            for gx in 0..snap.cols.min(MAX_GRID_SIZE) {
                self.draw_cell(fb, frame, snap, &table, gx, gy, overlay);
            }
        }

        self.draw_side_panel(fb, snap, overlay, viewport, frame);

        match snap.status {
            RoundStatus::Won => {
                draw_overlay(fb, frame, "VICTORY!", Some("enter: next level"));
            }
            RoundStatus::Lost => {
                let reason = match snap.loss_reason {
                    Some(LossReason::TimeUp) => "time up - enter: retry",
                    Some(LossReason::HoldOverflow) => "hold full - enter: retry",
                    None => "enter: retry",
                };
                draw_overlay(fb, frame, "YOU LOST!", Some(reason));
            }
            RoundStatus::Playing if snap.paused => {
                draw_overlay(fb, frame, "PAUSED", Some("p: resume"));
            }
            RoundStatus::Playing => {}
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, snap: &GameSnapshot, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, viewport, &mut fb);
        fb
    }

    pub fn render_with(
        &self,
        snap: &GameSnapshot,
        overlay: &HostOverlay,
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into_with(snap, overlay, viewport, &mut fb);
        fb
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_cell(
        &self,
        fb: &mut FrameBuffer,
        frame: Frame,
        snap: &GameSnapshot,
        table: &CellTable,
        gx: u8,
        gy: u8,
        overlay: &HostOverlay,
    ) {
        let px = frame.x + 1 + gx as u16 * self.cell_w;
        let py = frame.y + 1 + gy as u16 * self.cell_h;
        let right = px + self.cell_w - 1;

        let (bg, base) = match table.top[gy as usize][gx as usize] {
            Some(i) => {
                let tile = &snap.board[i as usize];
                let color = identity_color(tile.identity);
                let bg = if tile.free { color.shade(110) } else { color.shade(50) };
                let face = CellStyle::new(Rgb::new(250, 250, 250), bg).bold();
                fb.fill_rect(px, py, self.cell_w, self.cell_h, ' ', face);
                fb.put_char(px + 1, py, identity_glyph(tile.identity), face);

                let height = table.height[gy as usize][gx as usize];
                if height > 1 {
                    let digit = char::from_digit(height as u32 % 10, 10).unwrap_or('+');
                    fb.put_char(px + 2, py, digit, CellStyle::new(color, bg));
                }
                if self.cell_h > 1 {
                    let pips = CellStyle::new(color.shade(200), bg.shade(160));
                    fb.fill_rect(px, py + 1, self.cell_w, 1, ' ', pips);
                    for i in 0..(height as u16).min(self.cell_w - 2) {
                        fb.put_char(px + 1 + i, py + 1, '▪', pips);
                    }
                }
                (bg, face)
            }
            None => {
                let empty = CellStyle::new(Rgb::new(90, 90, 100), BOARD_BG).dim();
                fb.put_char(px + 1, py, '·', empty);
                (BOARD_BG, empty)
            }
        };

        if overlay.hint == Some((gx, gy)) {
            let marker = CellStyle::new(Rgb::new(80, 230, 230), bg).bold();
            let row = py + self.cell_h - 1;
            fb.put_char(px, row, '<', marker);
            fb.put_char(right, row, '>', marker);
        }
        if overlay.cursor == Some((gx, gy)) {
            let marker = CellStyle {
                fg: Rgb::new(255, 230, 80),
                ..base
            }
            .bold();
            fb.put_char(px, py, '[', marker);
            fb.put_char(right, py, ']', marker);
        }
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GameSnapshot,
        overlay: &HostOverlay,
        viewport: Viewport,
        frame: Frame,
    ) {
        let panel_x = frame.x.saturating_add(frame.w).saturating_add(PANEL_GAP);
        if panel_x >= viewport.width || viewport.width - panel_x < 12 {
            return;
        }

        let label = CellStyle::new(Rgb::new(220, 220, 220), PANEL_BG).bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), PANEL_BG);
        let dim = value.dim();

        let mut y = frame.y;
        fb.put_str(panel_x, y, "SCORE", label);
        fb.put_u32(panel_x, y + 1, snap.score, value);
        y += 3;

        fb.put_str(panel_x, y, "LEVEL", label);
        fb.put_u32(panel_x, y + 1, snap.level, value);
        y += 3;

        fb.put_str(panel_x, y, "TIME", label);
        let clock = snap.clock_label();
        let time_style = if snap.remaining_ms <= 30_000 && snap.status == RoundStatus::Playing {
            CellStyle::new(Rgb::new(240, 90, 90), PANEL_BG).bold()
        } else {
            value
        };
        fb.put_str(panel_x, y + 1, clock.as_str(), time_style);
        y += 3;

        fb.put_str(panel_x, y, "TILES", label);
        let end = fb.put_u32(panel_x, y + 1, snap.board.len() as u32, value);
        fb.put_str(end + 1, y + 1, "left", dim);
        y += 3;

        fb.put_str(panel_x, y, "HOLD", label);
        y += 1;
        for slot in 0..MAX_HOLD.max(snap.hold.len()) {
            let x = panel_x + slot as u16 * 2;
            match snap.hold.get(slot) {
                Some(t) if slot >= MAX_HOLD => {
                    let over = CellStyle::new(Rgb::new(255, 60, 60), PANEL_BG).bold();
                    fb.put_char(x, y, identity_glyph(t.identity), over);
                }
                Some(t) => {
                    let style = CellStyle::new(identity_color(t.identity), PANEL_BG).bold();
                    fb.put_char(x, y, identity_glyph(t.identity), style);
                }
                None => {
                    fb.put_char(x, y, '·', dim);
                }
            }
        }
        y += 1;
        if let Some(m) = overlay.flash {
            let style = CellStyle::new(identity_color(m.identity), PANEL_BG).bold();
            let mut x = fb.put_str(panel_x, y, "MATCH ", style);
            for _ in 0..m.tiles.len() {
                fb.put_char(x, y, identity_glyph(m.identity), style);
                x += 1;
            }
            fb.put_char(x + 1, y, '+', style);
            fb.put_u32(x + 2, y, SCORE_PER_MATCH, style);
        }
        y += 2;

        fb.put_str(panel_x, y, "AI", label);
        y += 1;
        match overlay.adapter {
            Some(st) if st.enabled => {
                fb.put_str(panel_x, y, "ON", value);
                fb.put_str(panel_x + 3, y, "clients", dim);
                fb.put_u32(panel_x + 11, y, st.client_count as u32, value);
                y += 1;
                fb.put_str(panel_x, y, "CTRL", value);
                match st.controller_id {
                    Some(id) => {
                        fb.put_u32(panel_x + 5, y, id as u32, value);
                    }
                    None => {
                        fb.put_str(panel_x + 5, y, "-", value);
                    }
                }
                fb.put_str(panel_x + 8, y, "obs", dim);
                fb.put_u32(panel_x + 12, y, st.streaming_count as u32, value);
            }
            _ => {
                fb.put_str(panel_x, y, "OFF", value);
            }
        }
        y += 2;

        const HELP: [&str; 4] = ["arrows  enter pick", "u undo  r reset", "p pause ? hint", "q quit"];
        for line in HELP {
            if y >= viewport.height {
                break;
            }
            fb.put_str(panel_x, y, line, dim);
            y += 1;
        }
    }
}

fn draw_border(fb: &mut FrameBuffer, frame: Frame, style: CellStyle) {
    let Frame { x, y, w, h } = frame;
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '╭', style);
    fb.put_char(x + w - 1, y, '╮', style);
    fb.put_char(x, y + h - 1, '╰', style);
    fb.put_char(x + w - 1, y + h - 1, '╯', style);
    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

fn draw_overlay(fb: &mut FrameBuffer, frame: Frame, title: &str, detail: Option<&str>) {
    let lines = if detail.is_some() { 2 } else { 1 };
    let text_w = title
        .chars()
        .count()
        .max(detail.map_or(0, |d| d.chars().count())) as u16;
    let box_w = (text_w + 4).min(frame.w);
    let box_x = frame.x + frame.w.saturating_sub(box_w) / 2;
    let mid_y = frame.y + frame.h / 2;
    let box_y = mid_y.saturating_sub(1);

    let bg = CellStyle::new(Rgb::new(255, 255, 255), Rgb::new(10, 10, 10));
    fb.fill_rect(box_x, box_y, box_w, lines + 2, ' ', bg);

    let put_centered = |fb: &mut FrameBuffer, y: u16, text: &str, style: CellStyle| {
        let w = text.chars().count() as u16;
        fb.put_str(frame.x + frame.w.saturating_sub(w) / 2, y, text, style);
    };
    put_centered(fb, mid_y, title, bg.bold());
    if let Some(detail) = detail {
        put_centered(fb, mid_y + 1, detail, bg.dim());
    }
}
