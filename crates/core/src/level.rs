//! Level generation - grid size, tile count and the shuffled identity multiset
//!
//! Difficulty grows with the level number:
//!
//! | Level | Grid | Tiles | Identity cap |
//! |-------|------|-------|--------------|
//! | 1 | 6x6 | 18 | 6 |
//! | 4 | 7x7 | 27 | 7 |
//! | 10 | 9x9 | 45 | 9 |
//! | 19+ | 12x12 | 72+ | 12+ |
//!
//! Every generated multiset is a whole number of triples. Generation never
//! fails: without tile images it falls back to a single synthetic identity.

use crate::rng::SimpleRng;
use crate::types::{
    AssetId, BASE_GRID_SIZE, BASE_IDENTITY_CAP, BASE_TILE_COUNT, MAX_GRID_SIZE, MAX_LAYERS,
    MISSING_ASSET, TILES_PER_MATCH,
};

/// Sorted pool of opaque tile image identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetCatalog {
    names: Vec<String>,
}

impl AssetCatalog {
    /// Build a catalog; names are sorted so generation does not depend on
    /// directory listing order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve an asset id. Unknown ids (including everything on an empty
    /// catalog) resolve to the synthetic placeholder.
    pub fn resolve(&self, id: AssetId) -> &str {
        self.names
            .get(id.0 as usize)
            .map(String::as_str)
            .unwrap_or(MISSING_ASSET)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Derived sizing for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelParams {
    pub level: u32,
    pub rows: u8,
    pub cols: u8,
    pub total_tiles: u32,
    pub groups: u32,
    /// Distinct identities in play (at least 1).
    pub unique: u32,
    /// Leading slice of the sorted catalog that identities are sampled from.
    pub pool: u32,
}

/// One generated tile before placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileSpec {
    pub identity: u16,
    pub asset: AssetId,
}

/// Output of [`generate`]: grid dimensions plus the shuffled multiset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLevel {
    pub params: LevelParams,
    pub tiles: Vec<TileSpec>,
}

impl GeneratedLevel {
    pub fn rows(&self) -> u8 {
        self.params.rows
    }

    pub fn cols(&self) -> u8 {
        self.params.cols
    }
}

/// Grid side for a level: grows by one every three levels, capped.
pub fn grid_size(level: u32) -> (u8, u8) {
    let level = level.max(1);
    let side = (BASE_GRID_SIZE as u32 + (level - 1) / 3).min(MAX_GRID_SIZE as u32) as u8;
    (side, side)
}

/// Compute the sizing of `level` given how many tile images exist.
pub fn level_params(level: u32, available_assets: usize) -> LevelParams {
    let level = level.max(1);
    let (rows, cols) = grid_size(level);
    let per_match = TILES_PER_MATCH as u32;

    // Every generated tile must find a slot in the stack.
    let capacity = rows as u32 * cols as u32 * MAX_LAYERS as u32;
    let mut total = BASE_TILE_COUNT
        .saturating_add((level - 1).saturating_mul(per_match))
        .min(capacity);
    if total % per_match != 0 {
        total += per_match - total % per_match;
    }
    total = total.min(capacity - capacity % per_match);

    let groups = total / per_match;
    let cap = BASE_IDENTITY_CAP + (level - 1) / 3;
    let pool = (available_assets as u32).min(cap);
    let unique = groups.min(pool).max(1);

    LevelParams {
        level,
        rows,
        cols,
        total_tiles: total,
        groups,
        unique,
        pool,
    }
}

/// Generate the shuffled tile multiset for `level`.
///
/// Identities are sampled without replacement from the leading `pool` assets
/// of the catalog; group `g` uses identity `g % unique`, three tiles each.
pub fn generate(level: u32, catalog: &AssetCatalog, rng: &mut SimpleRng) -> GeneratedLevel {
    let params = level_params(level, catalog.len());

    let selected: Vec<AssetId> = if params.pool == 0 {
        log::warn!("no tile assets available, using {}", MISSING_ASSET);
        vec![AssetId(0)]
    } else {
        rng.sample_indices(params.pool as usize, params.unique as usize)
            .into_iter()
            .map(|i| AssetId(i as u16))
            .collect()
    };

    let mut tiles = Vec::with_capacity(params.total_tiles as usize);
    for group in 0..params.groups {
        let identity = (group % params.unique) as u16;
        let spec = TileSpec {
            identity,
            asset: selected[identity as usize],
        };
        for _ in 0..TILES_PER_MATCH {
            tiles.push(spec);
        }
    }
    rng.shuffle(&mut tiles);

    log::debug!(
        "generated level {}: {}x{} grid, {} tiles, {} identities",
        params.level,
        params.rows,
        params.cols,
        tiles.len(),
        params.unique
    );

    GeneratedLevel { params, tiles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn catalog(n: usize) -> AssetCatalog {
        AssetCatalog::new((0..n).map(|i| format!("tiles/{:02}.png", i)))
    }

    #[test]
    fn test_grid_size_progression() {
        assert_eq!(grid_size(1), (6, 6));
        assert_eq!(grid_size(3), (6, 6));
        assert_eq!(grid_size(4), (7, 7));
        assert_eq!(grid_size(19), (12, 12));
        assert_eq!(grid_size(500), (12, 12));
        assert_eq!(grid_size(0), (6, 6));
    }

    #[test]
    fn test_level_one_params() {
        let p = level_params(1, 20);
        assert_eq!(p.total_tiles, 18);
        assert_eq!(p.groups, 6);
        assert_eq!(p.unique, 6);
        assert_eq!(p.pool, 6);
    }

    #[test]
    fn test_identity_cap_grows_every_three_levels() {
        assert_eq!(level_params(4, 20).unique, 7);
        assert_eq!(level_params(7, 20).unique, 8);
        // Scarce assets cap the identity count.
        assert_eq!(level_params(7, 3).unique, 3);
    }

    #[test]
    fn test_tile_count_clamped_to_stack_capacity() {
        let p = level_params(200, 50);
        assert_eq!(p.total_tiles, 12 * 12 * 3);
        assert_eq!(p.total_tiles % 3, 0);
    }

    #[test]
    fn test_huge_level_is_capped() {
        let p = level_params(u32::MAX, 20);
        assert_eq!(p.total_tiles, 432);
        assert_eq!((p.rows, p.cols), (12, 12));

        let level = generate(u32::MAX, &catalog(20), &mut SimpleRng::new(3));
        assert_eq!(level.tiles.len(), 432);
    }

    #[test]
    fn test_generate_groups_of_three() {
        let cat = catalog(20);
        let mut rng = SimpleRng::new(5);
        for level in [1, 2, 5, 13, 44, 90] {
            let gen = generate(level, &cat, &mut rng);
            assert_eq!(gen.tiles.len() % 3, 0);
            assert_eq!(gen.tiles.len() as u32, gen.params.total_tiles);

            let mut counts: HashMap<u16, usize> = HashMap::new();
            for t in &gen.tiles {
                *counts.entry(t.identity).or_default() += 1;
            }
            for (identity, n) in counts {
                assert_eq!(n % 3, 0, "identity {} has {} tiles", identity, n);
                assert!((identity as u32) < gen.params.unique);
            }
        }
    }

    #[test]
    fn test_identities_map_to_distinct_assets_within_pool() {
        let cat = catalog(30);
        let mut rng = SimpleRng::new(11);
        let gen = generate(1, &cat, &mut rng);

        let mut by_identity: HashMap<u16, AssetId> = HashMap::new();
        for t in &gen.tiles {
            let prev = by_identity.insert(t.identity, t.asset);
            if let Some(prev) = prev {
                assert_eq!(prev, t.asset);
            }
            assert!(t.asset.0 < 6, "asset outside the truncated pool");
        }
        let mut assets: Vec<u16> = by_identity.values().map(|a| a.0).collect();
        assets.sort_unstable();
        assets.dedup();
        assert_eq!(assets.len(), 6);
    }

    #[test]
    fn test_missing_assets_fall_back_to_one_identity() {
        let cat = AssetCatalog::default();
        let mut rng = SimpleRng::new(1);
        let gen = generate(3, &cat, &mut rng);

        assert_eq!(gen.params.unique, 1);
        assert!(gen.tiles.iter().all(|t| t.identity == 0));
        assert_eq!(cat.resolve(gen.tiles[0].asset), MISSING_ASSET);
    }

    #[test]
    fn test_generation_is_seed_deterministic() {
        let cat = catalog(12);
        let a = generate(8, &cat, &mut SimpleRng::new(77));
        let b = generate(8, &cat, &mut SimpleRng::new(77));
        assert_eq!(a, b);
    }

    #[test]
    fn test_catalog_sorts_names() {
        let cat = AssetCatalog::new(["b.png", "a.png", "c.png"]);
        assert_eq!(cat.resolve(AssetId(0)), "a.png");
        assert_eq!(cat.resolve(AssetId(9)), MISSING_ASSET);
    }
}
