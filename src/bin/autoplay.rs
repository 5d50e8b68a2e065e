//! Headless autoplay: clears consecutive levels with solver-backed hints and
//! logs how each round went.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};

use tui_tilematch::config::RunConfig;
use tui_tilematch::core::{GameState, DEFAULT_NODE_BUDGET};
use tui_tilematch::engine::{apply_pick, hint_with_budget, HintSource, PickTarget};
use tui_tilematch::types::{CoreEvent, RoundStatus, TICK_MS};

#[derive(Debug, Parser)]
#[command(name = "autoplay", about = "Play consecutive levels with the assist engine")]
struct Args {
    #[command(flatten)]
    run: RunConfig,

    /// Number of levels to attempt
    #[arg(long, default_value_t = 5)]
    levels: u32,

    /// Solver node budget per hint
    #[arg(long, default_value_t = DEFAULT_NODE_BUDGET)]
    budget: u32,

    /// Keep going after a lost round (retrying the level)
    #[arg(long)]
    keep_going: bool,
}

#[derive(Debug, Default)]
struct RoundReport {
    level: u32,
    tiles: u16,
    picks: u32,
    matches: u32,
    solver_hints: u32,
    heuristic_hints: u32,
    game_ms: u32,
    wall: Duration,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = args.run.game_config()?;
    info!(
        "autoplay seed={} start_level={} levels={} generation={:?}",
        config.seed, config.start_level, args.levels, config.generation
    );
    let mut state = GameState::new(config);

    let mut won = 0u32;
    let mut lost = 0u32;
    for _ in 0..args.levels {
        let report = play_round(&mut state, args.budget);
        match state.status() {
            RoundStatus::Won => {
                won += 1;
                info!(
                    "level {} cleared: {} tiles, {} picks, {} matches ({} solver / {} heuristic hints), score {}, {} ms game time, {:?} wall",
                    report.level,
                    report.tiles,
                    report.picks,
                    report.matches,
                    report.solver_hints,
                    report.heuristic_hints,
                    state.score(),
                    report.game_ms,
                    report.wall
                );
                state.advance_level();
            }
            status => {
                lost += 1;
                warn!(
                    "level {} ended {} ({}) after {} picks with {} tiles left",
                    report.level,
                    status.as_str(),
                    state.loss_reason().map_or("stuck", |r| r.as_str()),
                    report.picks,
                    state.board().len()
                );
                if !args.keep_going {
                    break;
                }
                state.reset_round();
            }
        }
    }

    info!("autoplay finished: {} won, {} lost", won, lost);
    if won == 0 && lost > 0 {
        bail!("no level was cleared");
    }
    Ok(())
}

/// Play the current round until it ends or no hint is available.
fn play_round(state: &mut GameState, budget: u32) -> RoundReport {
    let started = Instant::now();
    let mut report = RoundReport {
        level: state.level(),
        tiles: state.round_tiles(),
        ..RoundReport::default()
    };

    let mut idle_ticks = 0;
    while state.status() == RoundStatus::Playing {
        match hint_with_budget(state, budget) {
            Some(h) => {
                idle_ticks = 0;
                match h.source {
                    HintSource::Solver => report.solver_hints += 1,
                    HintSource::Heuristic => report.heuristic_hints += 1,
                }
                match apply_pick(state, PickTarget::Tile(h.tile.id)) {
                    Ok(_) => report.picks += 1,
                    Err(e) => {
                        warn!("hinted pick rejected: {}", e.message());
                        break;
                    }
                }
            }
            // A full Holding Area may still resolve a match on the next step.
            None if idle_ticks == 0 => idle_ticks += 1,
            None => break,
        }
        state.tick(TICK_MS);
        report.game_ms += TICK_MS;
        report.matches += state
            .take_events()
            .iter()
            .filter(|e| matches!(e, CoreEvent::Matched(_)))
            .count() as u32;
    }

    report.wall = started.elapsed();
    report
}
