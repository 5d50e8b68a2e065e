//! Round lifecycle through the public facade: generation, picks, matches,
//! win, loss, undo and pause.

use tui_tilematch::core::{
    solve, GameConfig, GameState, GenerationPolicy, PausePolicy, DEFAULT_NODE_BUDGET,
};
use tui_tilematch::engine::{apply_assist, apply_pick, hint, PickError, PickTarget};
use tui_tilematch::types::{
    CoreEvent, GameAction, LossReason, RoundStatus, TileId, MAX_HOLD, SCORE_PER_MATCH, TICK_MS,
    TIMER_LIMIT,
};

fn config(seed: u32, level: u32) -> GameConfig {
    GameConfig {
        start_level: level,
        assets: (0..20).map(|i| format!("tiles/{:02}.png", i)).collect(),
        ..GameConfig::with_seed(seed)
    }
}

/// Assist until the round ends, ticking after every pick.
fn play_out(state: &mut GameState) {
    for _ in 0..1_000 {
        if state.status() != RoundStatus::Playing {
            return;
        }
        apply_assist(state).unwrap();
        state.step(TICK_MS);
    }
    panic!("round did not finish");
}

#[test]
fn test_level_one_deals_eighteen_free_tiles() {
    let state = GameState::new(config(99, 1));
    let snap = state.snapshot();
    assert_eq!((snap.rows, snap.cols), (6, 6));
    assert_eq!(snap.board.len(), 18);
    assert_eq!(snap.free_count(), 18);
    assert_eq!(snap.limit_ms, TIMER_LIMIT * 1000);
    assert!(snap.playable());

    // Whole triples of every identity.
    let mut counts = std::collections::HashMap::new();
    for t in &snap.board {
        *counts.entry(t.identity).or_insert(0) += 1;
    }
    assert!(counts.values().all(|&n| n % 3 == 0));
}

#[test]
fn test_same_seed_same_round() {
    let a = GameState::new(config(31337, 3)).snapshot();
    let b = GameState::new(config(31337, 3)).snapshot();
    assert_eq!(a, b);

    let c = GameState::new(config(31338, 3)).snapshot();
    assert_ne!(a.board, c.board);
}

#[test]
fn test_assist_wins_and_advance_keeps_score() {
    let mut state = GameState::new(config(5, 1));
    play_out(&mut state);
    assert_eq!(state.status(), RoundStatus::Won);
    assert_eq!(state.score(), 6 * SCORE_PER_MATCH);
    assert!(state
        .take_events()
        .contains(&CoreEvent::Won { level: 1, score: 60 }));

    // Input is ignored until the host advances.
    assert_eq!(apply_pick(&mut state, PickTarget::Cell { x: 0, y: 0 }), Err(PickError::NotPlayable));

    assert!(state.apply_action(GameAction::AdvanceLevel));
    assert_eq!(state.level(), 2);
    assert_eq!(state.score(), 60);
    assert_eq!(state.board().len(), 21);
    assert_eq!(state.status(), RoundStatus::Playing);

    play_out(&mut state);
    assert_eq!(state.status(), RoundStatus::Won);
    assert_eq!(state.score(), 130);
}

#[test]
fn test_overflow_loss_then_reset() {
    let mut state = GameState::new(config(3, 7));
    let mut firsts: Vec<TileId> = Vec::new();
    let mut seen = Vec::new();
    for t in state.board().tiles() {
        if !seen.contains(&t.identity) {
            seen.push(t.identity);
            firsts.push(t.id);
        }
    }
    assert!(firsts.len() > MAX_HOLD);

    for id in &firsts[..=MAX_HOLD] {
        apply_pick(&mut state, PickTarget::Tile(*id)).unwrap();
        state.step(TICK_MS);
    }
    assert_eq!(state.status(), RoundStatus::Lost);
    assert_eq!(state.loss_reason(), Some(LossReason::HoldOverflow));
    assert!(hint(&state).is_none());

    let round = state.round_id();
    state.apply_action(GameAction::Reset);
    assert_eq!(state.status(), RoundStatus::Playing);
    assert_eq!(state.level(), 7);
    assert_eq!(state.score(), 0);
    assert_eq!(state.round_id(), round + 1);
    assert!(state.hold().is_empty());
}

#[test]
fn test_undo_restores_board_exactly() {
    let mut state = GameState::new(config(12, 2));
    let before = state.snapshot().board;

    apply_pick(&mut state, PickTarget::Cell { x: 4, y: 1 }).unwrap();
    apply_pick(&mut state, PickTarget::Cell { x: 0, y: 2 }).unwrap();
    assert!(state.apply_action(GameAction::Undo));
    assert!(state.apply_action(GameAction::Undo));
    assert!(!state.apply_action(GameAction::Undo));

    assert_eq!(state.snapshot().board, before);
}

#[test]
fn test_pause_policies() {
    let mut frozen = GameState::new(config(8, 1));
    frozen.apply_action(GameAction::TogglePause);
    assert!(frozen.paused());
    assert_eq!(
        apply_pick(&mut frozen, PickTarget::Cell { x: 0, y: 0 }),
        Err(PickError::NotPlayable)
    );
    let snap = frozen.step(TIMER_LIMIT * 1000);
    assert_eq!(snap.status, RoundStatus::Playing);
    assert_eq!(snap.remaining_ms, TIMER_LIMIT * 1000);

    let mut open = GameState::new(GameConfig {
        pause_policy: PausePolicy::AllowInteraction,
        ..config(8, 1)
    });
    open.apply_action(GameAction::Pause);
    assert!(apply_pick(&mut open, PickTarget::Cell { x: 0, y: 0 }).is_ok());
    assert!(open.apply_action(GameAction::Undo));
    assert_eq!(open.remaining_ms(), TIMER_LIMIT * 1000);
}

#[test]
fn test_short_timer_runs_out() {
    let mut state = GameState::new(GameConfig {
        timer_limit_ms: 1_000,
        ..config(8, 1)
    });
    let mut ticks = 0;
    while state.status() == RoundStatus::Playing {
        state.step(TICK_MS);
        ticks += 1;
    }
    assert_eq!(ticks, (1_000 + TICK_MS - 1) / TICK_MS);
    assert_eq!(state.loss_reason(), Some(LossReason::TimeUp));
    assert_eq!(state.remaining_ms(), 0);
}

#[test]
fn test_solvable_generation_is_proven() {
    let state = GameState::new(GameConfig {
        generation: GenerationPolicy::solvable(4),
        ..config(77, 2)
    });
    assert!(solve(state.board(), &[], DEFAULT_NODE_BUDGET).is_solved());
}

#[test]
fn test_no_assets_uses_single_identity() {
    let state = GameState::new(GameConfig::with_seed(1));
    let snap = state.snapshot();
    assert_eq!(snap.board.len(), 18);
    assert!(snap.board.iter().all(|t| t.identity == 0));
    assert_eq!(state.catalog().resolve(snap.board[0].asset), tui_tilematch::types::MISSING_ASSET);
}
