//! Observation building and the deterministic state hash.

use std::hash::{Hash, Hasher};

use crate::core::GameSnapshot;
use crate::protocol::{
    current_timestamp_ms, GridInfo, HeldTile, MatchObservation, ObservationMessage,
    ObservationType, StateHash, TileObservation,
};

/// Stable 64-bit FNV-1a hasher for `state_hash`.
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Hash everything an observation reports except `seq` and `ts`.
pub fn state_hash(snap: &GameSnapshot) -> StateHash {
    let mut h = Fnv1aHasher::new();
    snap.level.hash(&mut h);
    snap.score.hash(&mut h);
    snap.remaining_ms.hash(&mut h);
    snap.limit_ms.hash(&mut h);
    snap.status.as_str().hash(&mut h);
    snap.loss_reason.map(|r| r.as_str()).hash(&mut h);
    snap.paused.hash(&mut h);
    snap.round_id.hash(&mut h);
    snap.seed.hash(&mut h);
    snap.rows.hash(&mut h);
    snap.cols.hash(&mut h);

    snap.board.len().hash(&mut h);
    for t in &snap.board {
        t.id.0.hash(&mut h);
        t.identity.hash(&mut h);
        t.pos.x.hash(&mut h);
        t.pos.y.hash(&mut h);
        t.pos.layer.hash(&mut h);
        t.free.hash(&mut h);
    }

    snap.hold.len().hash(&mut h);
    for t in &snap.hold {
        t.id.0.hash(&mut h);
        t.identity.hash(&mut h);
    }

    snap.matched.is_some().hash(&mut h);
    if let Some(m) = snap.matched.as_ref() {
        m.identity.hash(&mut h);
        m.tiles.iter().for_each(|t| t.id.0.hash(&mut h));
        m.score.hash(&mut h);
    }
    StateHash(h.finish())
}

/// Build an observation message from a snapshot.
pub fn build_observation(snap: &GameSnapshot, seq: u64) -> ObservationMessage {
    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        playable: snap.playable(),
        paused: snap.paused,
        status: snap.status.as_str().to_string(),
        loss_reason: snap.loss_reason.map(|r| r.as_str().to_string()),
        level: snap.level,
        score: snap.score,
        remaining_ms: snap.remaining_ms,
        limit_ms: snap.limit_ms,
        round_id: snap.round_id,
        seed: snap.seed,
        grid: GridInfo {
            rows: snap.rows,
            cols: snap.cols,
        },
        tiles: snap
            .board
            .iter()
            .map(|t| TileObservation {
                id: t.id.0,
                identity: t.identity,
                x: t.pos.x,
                y: t.pos.y,
                layer: t.pos.layer,
                free: t.free,
            })
            .collect(),
        hold: snap
            .hold
            .iter()
            .map(|t| HeldTile {
                id: t.id.0,
                identity: t.identity,
            })
            .collect(),
        last_match: snap.matched.map(|m| MatchObservation {
            identity: m.identity,
            tiles: m.tiles.map(|t| t.id.0),
            score: m.score,
        }),
        state_hash: state_hash(snap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameConfig, GameState};

    #[test]
    fn test_fnv1a_known_vector() {
        let mut h = Fnv1aHasher::new();
        h.write(b"a");
        assert_eq!(h.finish(), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_hash_is_deterministic_across_instances() {
        let a = GameState::new(GameConfig::with_seed(77)).snapshot();
        let b = GameState::new(GameConfig::with_seed(77)).snapshot();
        assert_eq!(state_hash(&a), state_hash(&b));

        let c = GameState::new(GameConfig::with_seed(78)).snapshot();
        assert_ne!(state_hash(&a), state_hash(&c));
    }

    #[test]
    fn test_hash_tracks_picks_and_clock() {
        let mut gs = GameState::new(GameConfig::with_seed(5));
        let before = state_hash(&gs.snapshot());

        let (x, y) = {
            let t = gs.snapshot().board.iter().find(|t| t.free).map(|t| t.pos).unwrap();
            (t.x, t.y)
        };
        assert!(gs.pick_cell(x, y).is_picked());
        let picked = state_hash(&gs.snapshot());
        assert_ne!(before, picked);

        let stepped = gs.step(16);
        assert_ne!(picked, state_hash(&stepped));
    }

    #[test]
    fn test_observation_mirrors_snapshot() {
        let mut gs = GameState::new(GameConfig::with_seed(9));
        let (x, y) = {
            let snap = gs.snapshot();
            let t = snap.board.iter().find(|t| t.free).unwrap();
            (t.pos.x, t.pos.y)
        };
        gs.pick_cell(x, y);
        let snap = gs.snapshot();

        let obs = build_observation(&snap, 12);
        assert_eq!(obs.seq, 12);
        assert_eq!(obs.tiles.len(), snap.board.len());
        assert_eq!(obs.hold.len(), 1);
        assert_eq!(obs.status, "playing");
        assert!(obs.playable);
        assert_eq!(obs.grid, GridInfo { rows: 6, cols: 6 });

        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["type"], "observation");
        assert_eq!(json["state_hash"].as_str().unwrap().len(), 16);
        assert!(json.get("last_match").is_none());
    }
}
