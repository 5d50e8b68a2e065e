//! Command-line configuration for the terminal host.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

use crate::core::{GameConfig, GenerationPolicy, PausePolicy};
use crate::types::TIMER_LIMIT;

/// Image extensions recognised in an asset directory.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Tile faces used when no asset directory is given. The terminal draws
/// identities as glyphs, so these only need to be distinct.
const BUILTIN_TILE_COUNT: usize = 36;

/// Solver attempts per level under `--solvable`.
const SOLVABLE_ATTEMPTS: u32 = 16;

#[derive(Debug, Clone, Parser)]
#[command(name = "tui-tilematch", version, about = "Layered tile-matching puzzle for the terminal")]
pub struct RunConfig {
    /// Seed for level generation (random when absent)
    #[arg(long, env = "TILEMATCH_SEED")]
    pub seed: Option<u32>,

    /// Level to start at
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub level: u32,

    /// Round time limit in seconds
    #[arg(long, default_value_t = TIMER_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
    pub timer: u32,

    /// Only deal boards the solver can clear
    #[arg(long)]
    pub solvable: bool,

    /// Allow picks and undo while paused
    #[arg(long)]
    pub pause_interactive: bool,

    /// Directory of tile images
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Do not start the TCP control adapter
    #[arg(long)]
    pub no_adapter: bool,
}

impl RunConfig {
    /// The configured seed, or one derived from the wall clock.
    pub fn resolved_seed(&self) -> u32 {
        self.seed.unwrap_or_else(|| {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .subsec_nanos();
            nanos | 1
        })
    }

    pub fn game_config(&self) -> Result<GameConfig> {
        let assets = match self.assets.as_deref() {
            Some(dir) => discover_assets(dir)?,
            None => builtin_assets(),
        };

        Ok(GameConfig {
            seed: self.resolved_seed(),
            start_level: self.level,
            timer_limit_ms: self.timer.saturating_mul(1000),
            pause_policy: if self.pause_interactive {
                PausePolicy::AllowInteraction
            } else {
                PausePolicy::FreezeAll
            },
            generation: if self.solvable {
                GenerationPolicy::solvable(SOLVABLE_ATTEMPTS)
            } else {
                GenerationPolicy::Unchecked
            },
            assets,
        })
    }
}

/// List the image files of `dir`, sorted by path.
pub fn discover_assets(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read asset directory {}", dir.display()))?;

    let mut assets = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if is_image && path.is_file() {
            assets.push(path.to_string_lossy().into_owned());
        }
    }
    assets.sort();
    log::info!("found {} tile images in {}", assets.len(), dir.display());
    Ok(assets)
}

pub fn builtin_assets() -> Vec<String> {
    (0..BUILTIN_TILE_COUNT)
        .map(|i| format!("builtin/{:02}", i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RunConfig {
        RunConfig::try_parse_from(std::iter::once("tui-tilematch").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&["--seed", "9"]);
        let game = cfg.game_config().unwrap();
        assert_eq!(game.seed, 9);
        assert_eq!(game.start_level, 1);
        assert_eq!(game.timer_limit_ms, TIMER_LIMIT * 1000);
        assert_eq!(game.pause_policy, PausePolicy::FreezeAll);
        assert_eq!(game.generation, GenerationPolicy::Unchecked);
        assert_eq!(game.assets.len(), BUILTIN_TILE_COUNT);
        assert!(!cfg.no_adapter);
    }

    #[test]
    fn test_flags() {
        let cfg = parse(&[
            "--seed",
            "3",
            "--level",
            "7",
            "--timer",
            "60",
            "--solvable",
            "--pause-interactive",
            "--no-adapter",
        ]);
        let game = cfg.game_config().unwrap();
        assert_eq!(game.start_level, 7);
        assert_eq!(game.timer_limit_ms, 60_000);
        assert_eq!(game.pause_policy, PausePolicy::AllowInteraction);
        assert!(matches!(game.generation, GenerationPolicy::Solvable { .. }));
        assert!(cfg.no_adapter);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = |args: &[&str]| {
            RunConfig::try_parse_from(std::iter::once("tui-tilematch").chain(args.iter().copied()))
                .is_err()
        };
        assert!(bad(&["--level", "0"]));
        assert!(bad(&["--timer", "soon"]));
        assert!(bad(&["--frobnicate"]));
    }

    #[test]
    fn test_discover_assets_filters_and_sorts() {
        let dir = std::env::temp_dir().join(format!("tilematch-assets-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt", "c.webp"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let found = discover_assets(&dir).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.jpg", "b.PNG", "c.webp"]);

        std::fs::remove_dir_all(&dir).unwrap();
        assert!(discover_assets(&dir).is_err());
    }
}
