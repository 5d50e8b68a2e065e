//! Rendering snapshots into the terminal framebuffer.

use tui_tilematch::core::{GameConfig, GameSnapshot, GameState};
use tui_tilematch::engine::apply_assist;
use tui_tilematch::term::{
    encode_full_into, identity_glyph, AdapterStatusView, FrameBuffer, GameView, HostOverlay,
    TerminalRenderer, Viewport,
};
use tui_tilematch::types::{GameAction, RoundStatus, TICK_MS};

const VIEWPORT: Viewport = Viewport {
    width: 100,
    height: 30,
};

fn game(seed: u32) -> GameState {
    GameState::new(GameConfig {
        assets: (0..20).map(|i| format!("{}.png", i)).collect(),
        ..GameConfig::with_seed(seed)
    })
}

fn screen(fb: &FrameBuffer) -> String {
    (0..fb.height())
        .map(|y| fb.row_text(y))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(snap: &GameSnapshot, overlay: &HostOverlay) -> String {
    screen(&GameView::default().render_with(snap, overlay, VIEWPORT))
}

#[test]
fn test_playing_frame_shows_panel() {
    let snap = game(2).snapshot();
    let text = render(&snap, &HostOverlay::default());

    for label in ["SCORE", "LEVEL", "TIME", "03:00", "TILES", "18", "HOLD", "AI", "OFF"] {
        assert!(text.contains(label), "missing {:?}", label);
    }
    assert!(!text.contains("VICTORY!"));
    assert!(!text.contains("PAUSED"));

    let glyph = identity_glyph(snap.board[0].identity);
    assert!(text.contains(glyph));
}

#[test]
fn test_round_overlays() {
    let mut state = game(2);
    state.apply_action(GameAction::Pause);
    assert!(render(&state.snapshot(), &HostOverlay::default()).contains("PAUSED"));

    state.apply_action(GameAction::Resume);
    while state.status() == RoundStatus::Playing {
        apply_assist(&mut state).unwrap();
        state.step(TICK_MS);
    }
    let text = render(&state.snapshot(), &HostOverlay::default());
    assert!(text.contains("VICTORY!"));
    assert!(text.contains("enter: next level"));

    let mut timed = GameState::new(GameConfig {
        timer_limit_ms: 100,
        ..GameConfig::with_seed(3)
    });
    let snap = timed.step(100);
    let text = render(&snap, &HostOverlay::default());
    assert!(text.contains("YOU LOST!"));
    assert!(text.contains("time up"));
}

#[test]
fn test_overlay_cursor_hint_and_adapter() {
    let snap = game(4).snapshot();
    let view = GameView::default();
    let plain = view.render(&snap, VIEWPORT);

    let overlay = HostOverlay {
        cursor: Some((1, 1)),
        hint: Some((2, 0)),
        flash: None,
        adapter: Some(AdapterStatusView {
            enabled: true,
            client_count: 2,
            controller_id: Some(1),
            streaming_count: 1,
        }),
    };
    let decorated = view.render_with(&snap, &overlay, VIEWPORT);
    let text = screen(&decorated);
    assert!(text.contains('['));
    assert!(text.contains('<'));
    assert!(text.contains("clients"));
    assert!(text.contains("CTRL"));
    assert_ne!(plain, decorated);

    // The cursor brackets sit on the cell that `cell_at` maps back to (1, 1).
    let (col, row) = (0..VIEWPORT.height)
        .flat_map(|y| (0..VIEWPORT.width).map(move |x| (x, y)))
        .find(|&(x, y)| decorated.get(x, y).map(|c| c.ch) == Some('['))
        .unwrap();
    assert_eq!(view.cell_at(&snap, VIEWPORT, col, row), Some((1, 1)));
}

#[test]
fn test_renderer_diffs_steady_frames() {
    let state = game(6);
    let snap = state.snapshot();
    let view = GameView::default();
    let mut renderer = TerminalRenderer::with_writer(Vec::new()).with_mouse(false);

    let mut fb = FrameBuffer::new(0, 0);
    view.render_into(&snap, VIEWPORT, &mut fb);
    let first = renderer.draw_swap(&mut fb).unwrap();

    view.render_into(&snap, VIEWPORT, &mut fb);
    let second = renderer.draw_swap(&mut fb).unwrap();
    assert!(second < first / 10, "steady frame wrote {} of {}", second, first);

    let mut full = Vec::new();
    encode_full_into(&view.render(&snap, VIEWPORT), &mut full).unwrap();
    assert_eq!(full.len(), first);
}
