//! Terminal tile-matching runner (default binary).
//!
//! This is the primary gameplay entrypoint. It uses crossterm for input and
//! the framebuffer-based renderer from the `term` crate, and optionally
//! starts the TCP control adapter.

use std::fs::File;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use log::{debug, info, warn};

use tui_tilematch::adapter::Adapter;
use tui_tilematch::config::RunConfig;
use tui_tilematch::core::{GameSnapshot, GameState};
use tui_tilematch::engine::{apply_pick, hint, PickTarget};
use tui_tilematch::input::{handle_key_event, mouse_click, should_quit, BoardCursor, InputCommand};
use tui_tilematch::term::{
    AdapterStatusView, FrameBuffer, GameView, HostOverlay, TerminalRenderer, Viewport,
};
use tui_tilematch::types::{CoreEvent, MatchEvent, RoundStatus, TICK_MS};

/// How long a resolved match stays highlighted in the side panel.
const MATCH_FLASH_MS: u32 = 600;

fn main() -> Result<()> {
    let cli = RunConfig::parse();
    init_logging()?;

    let config = cli.game_config()?;
    info!(
        "starting seed={} level={} assets={}",
        config.seed,
        config.start_level,
        config.assets.len()
    );
    let state = GameState::new(config);

    let adapter = if cli.no_adapter {
        None
    } else {
        match Adapter::start_from_env() {
            Ok(adapter) => adapter,
            Err(e) => {
                warn!("control adapter unavailable: {:#}", e);
                None
            }
        }
    };

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = App::new(state, adapter).run(&mut term);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// The terminal owns stdout, so logs go to `TILEMATCH_LOG_FILE` or nowhere.
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var_os("TILEMATCH_LOG_FILE") else {
        return Ok(());
    };
    let file = File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.to_string_lossy()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

struct App {
    state: GameState,
    snap: GameSnapshot,
    adapter: Option<Adapter>,
    view: GameView,
    fb: FrameBuffer,
    viewport: Viewport,
    cursor: BoardCursor,
    hint: Option<(u8, u8)>,
    flash: Option<(MatchEvent, u32)>,
}

impl App {
    fn new(state: GameState, adapter: Option<Adapter>) -> Self {
        let snap = state.snapshot();
        let cursor = BoardCursor::new(snap.cols, snap.rows);
        Self {
            state,
            snap,
            adapter,
            view: GameView::default(),
            fb: FrameBuffer::new(0, 0),
            viewport: Viewport::new(80, 24),
            cursor,
            hint: None,
            flash: None,
        }
    }

    fn run(mut self, term: &mut TerminalRenderer) -> Result<()> {
        let tick_duration = Duration::from_millis(TICK_MS as u64);
        let mut last_tick = Instant::now();

        loop {
            let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
            if (w, h) != (self.viewport.width, self.viewport.height) {
                self.viewport = Viewport::new(w, h);
                term.invalidate();
            }
            self.draw(term)?;

            // Input with timeout until next tick.
            let timeout = tick_duration.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if should_quit(key) {
                            return Ok(());
                        }
                        if let Some(command) = handle_key_event(key) {
                            self.on_command(command);
                        }
                    }
                    Event::Mouse(mouse) => {
                        let cell = mouse_click(mouse)
                            .and_then(|(col, row)| self.view.cell_at(&self.snap, self.viewport, col, row));
                        if let Some((x, y)) = cell {
                            self.cursor.set(x, y);
                            self.on_command(InputCommand::Pick);
                        }
                    }
                    Event::Resize(..) => term.invalidate(),
                    _ => {}
                }
            }

            let since = last_tick.elapsed();
            if since >= tick_duration {
                // Sub-millisecond remainders roll into the next tick.
                let ms = elapsed_ms(since);
                last_tick += Duration::from_millis(u64::from(ms));
                self.tick(ms);
            }
        }
    }

    fn draw(&mut self, term: &mut TerminalRenderer) -> Result<()> {
        let overlay = HostOverlay {
            cursor: Some(self.cursor.position()),
            hint: self.hint,
            flash: self.flash.map(|(m, _)| m),
            adapter: self.adapter.as_ref().map(|a| {
                let st = a.status();
                AdapterStatusView {
                    enabled: true,
                    client_count: st.client_count,
                    controller_id: st.controller_id,
                    streaming_count: st.streaming_count,
                }
            }),
        };
        self.view
            .render_into_with(&self.snap, &overlay, self.viewport, &mut self.fb);
        term.draw_swap(&mut self.fb)?;
        Ok(())
    }

    fn on_command(&mut self, command: InputCommand) {
        match command {
            InputCommand::Move { dx, dy } => {
                self.cursor.move_by(dx, dy);
            }
            InputCommand::Pick => match self.state.status() {
                RoundStatus::Won => {
                    self.state.advance_level();
                }
                RoundStatus::Lost => self.state.reset_round(),
                RoundStatus::Playing => {
                    let (x, y) = self.cursor.position();
                    if let Err(e) = apply_pick(&mut self.state, PickTarget::Cell { x, y }) {
                        debug!("pick at ({}, {}) ignored: {}", x, y, e.message());
                    }
                }
            },
            InputCommand::Hint => {
                self.hint = hint(&self.state).map(|h| (h.tile.pos.x, h.tile.pos.y));
                if let Some((x, y)) = self.hint {
                    self.cursor.set(x, y);
                }
            }
            InputCommand::Game(action) => {
                self.state.apply_action(action);
            }
        }
        self.state.snapshot_into(&mut self.snap);
        self.drain_events();
    }

    fn tick(&mut self, elapsed_ms: u32) {
        let mut force = false;
        if let Some(adapter) = self.adapter.as_mut() {
            force = adapter.service(&mut self.state) > 0;
        }

        self.state.step_into(elapsed_ms, &mut self.snap);
        force |= self.drain_events();

        self.flash = self.flash.and_then(|(m, ms)| {
            let left = ms.saturating_sub(elapsed_ms);
            (left > 0).then_some((m, left))
        });

        if let Some(adapter) = self.adapter.as_mut() {
            adapter.publish(&self.snap, force);
        }
    }

    /// React to core events. Returns whether there were any.
    fn drain_events(&mut self) -> bool {
        let events = self.state.take_events();
        for ev in &events {
            match *ev {
                CoreEvent::LevelStarted { level, tiles } => {
                    self.cursor.resize(self.snap.cols, self.snap.rows);
                    self.hint = None;
                    self.flash = None;
                    debug!("level {} dealt with {} tiles", level, tiles);
                }
                CoreEvent::Matched(m) => {
                    self.flash = Some((m, MATCH_FLASH_MS));
                }
                CoreEvent::Picked(_)
                | CoreEvent::Undone(_)
                | CoreEvent::Won { .. }
                | CoreEvent::Lost { .. } => {
                    self.hint = None;
                }
            }
        }
        !events.is_empty()
    }
}

/// Whole milliseconds in `d`, saturating at `u32::MAX`.
fn elapsed_ms(d: Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}
