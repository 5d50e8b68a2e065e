//! TerminalRenderer: flushes a framebuffer to a real terminal.
//!
//! Frames are diffed against the previous one and only changed runs are
//! re-encoded. The writer is generic so tests can capture the byte stream.

use std::io::{self, Write};

use anyhow::Result;

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, QueueableCommand,
};

use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};

/// Unchanged cells shorter than this between two dirty runs are re-sent
/// instead of paying for another cursor move.
const RUN_GAP: u16 = 3;

pub struct TerminalRenderer<W: Write = io::Stdout> {
    out: W,
    last: Option<FrameBuffer>,
    buf: Vec<u8>,
    mouse: bool,
}

impl TerminalRenderer<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for TerminalRenderer<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            last: None,
            buf: Vec::with_capacity(64 * 1024),
            mouse: true,
        }
    }

    /// Capture mouse clicks while the renderer owns the terminal.
    pub fn with_mouse(mut self, mouse: bool) -> Self {
        self.mouse = mouse;
        self
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        if self.mouse {
            self.buf.queue(EnableMouseCapture)?;
        }
        self.buf.queue(cursor::Hide)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        self.flush_buf()?;
        self.last = None;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.queue(ResetColor)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        if self.mouse {
            self.buf.queue(DisableMouseCapture)?;
        }
        self.buf.queue(terminal::EnableLineWrap)?;
        self.buf.queue(cursor::Show)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.flush_buf()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Force the next draw to be a full redraw (terminal resize).
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Draw a framebuffer, swapping it into internal state.
    ///
    /// The renderer diffs against the previous frame and then swaps buffers so
    /// the caller gets the old one back to draw the next frame into.
    /// Returns the number of bytes written.
    pub fn draw_swap(&mut self, fb: &mut FrameBuffer) -> Result<usize> {
        self.buf.clear();
        let mut prev = match self.last.take() {
            Some(prev) if prev.width() == fb.width() && prev.height() == fb.height() => {
                encode_diff_into(&prev, fb, &mut self.buf)?;
                prev
            }
            Some(mut prev) => {
                encode_full_into(fb, &mut self.buf)?;
                prev.resize(fb.width(), fb.height());
                prev
            }
            None => {
                encode_full_into(fb, &mut self.buf)?;
                FrameBuffer::new(fb.width(), fb.height())
            }
        };
        self.flush_buf()?;

        std::mem::swap(&mut prev, fb);
        self.last = Some(prev);
        Ok(self.buf.len())
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.out.write_all(&self.buf)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Tracks the terminal's current SGR state so only changes are emitted.
#[derive(Default)]
struct StyleState {
    current: Option<CellStyle>,
}

impl StyleState {
    fn apply(&mut self, out: &mut Vec<u8>, style: CellStyle) -> Result<()> {
        let prev = match self.current {
            Some(prev) if prev == style => return Ok(()),
            Some(prev) if prev.bold == style.bold && prev.dim == style.dim => Some(prev),
            _ => None,
        };

        match prev {
            Some(prev) => {
                if prev.fg != style.fg {
                    out.queue(SetForegroundColor(rgb_to_color(style.fg)))?;
                }
                if prev.bg != style.bg {
                    out.queue(SetBackgroundColor(rgb_to_color(style.bg)))?;
                }
            }
            None => {
                // SGR reset clears colors too, so both are re-sent.
                out.queue(SetAttribute(Attribute::Reset))?;
                if style.bold {
                    out.queue(SetAttribute(Attribute::Bold))?;
                }
                if style.dim {
                    out.queue(SetAttribute(Attribute::Dim))?;
                }
                out.queue(SetForegroundColor(rgb_to_color(style.fg)))?;
                out.queue(SetBackgroundColor(rgb_to_color(style.bg)))?;
            }
        }
        self.current = Some(style);
        Ok(())
    }
}

fn put_cells(out: &mut Vec<u8>, state: &mut StyleState, cells: &[Cell]) -> Result<()> {
    for cell in cells {
        state.apply(out, cell.style)?;
        out.queue(Print(cell.ch))?;
    }
    Ok(())
}

fn finish(out: &mut Vec<u8>) -> Result<()> {
    out.queue(ResetColor)?;
    out.queue(SetAttribute(Attribute::Reset))?;
    Ok(())
}

/// Encode a full-frame redraw into `out`.
pub fn encode_full_into(fb: &FrameBuffer, out: &mut Vec<u8>) -> Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let mut state = StyleState::default();
    let w = fb.width() as usize;
    if w > 0 {
        for (y, row) in fb.cells().chunks(w).enumerate() {
            out.queue(cursor::MoveTo(0, y as u16))?;
            put_cells(out, &mut state, row)?;
        }
    }
    finish(out)
}

/// Encode a diff redraw (changed runs) into `out`.
///
/// Frames of different sizes fall back to a full redraw.
pub fn encode_diff_into(prev: &FrameBuffer, next: &FrameBuffer, out: &mut Vec<u8>) -> Result<()> {
    if prev.width() != next.width() || prev.height() != next.height() {
        return encode_full_into(next, out);
    }

    let mut state = StyleState::default();
    let w = next.width() as usize;
    if w == 0 {
        return Ok(());
    }
    for (y, (a, b)) in prev.cells().chunks(w).zip(next.cells().chunks(w)).enumerate() {
        for (start, len) in changed_runs(a, b) {
            out.queue(cursor::MoveTo(start, y as u16))?;
            let start = start as usize;
            put_cells(out, &mut state, &b[start..start + len as usize])?;
        }
    }
    finish(out)
}

/// Changed `(start, len)` runs within one row, merging runs separated by a
/// short unchanged gap.
fn changed_runs<'a>(a: &'a [Cell], b: &'a [Cell]) -> impl Iterator<Item = (u16, u16)> + 'a {
    let w = b.len().min(a.len());
    let mut x = 0usize;
    std::iter::from_fn(move || {
        while x < w && a[x] == b[x] {
            x += 1;
        }
        if x >= w {
            return None;
        }
        let start = x;
        let mut end = x + 1;
        let mut gap = 0u16;
        x += 1;
        while x < w {
            if a[x] == b[x] {
                gap += 1;
                if gap >= RUN_GAP {
                    break;
                }
            } else {
                gap = 0;
                end = x + 1;
            }
            x += 1;
        }
        x = end;
        Some((start as u16, (end - start) as u16))
    })
}

fn rgb_to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}
