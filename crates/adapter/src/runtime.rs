//! Adapter runtime integration.
//!
//! Bridges the sync game loop with the async TCP server: commands arrive on a
//! bounded queue, replies and observations go back on an unbounded one.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use arrayvec::ArrayVec;
use log::{info, warn};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot, watch};

use crate::core::{GameSnapshot, GameState};
use crate::engine::{apply_assist, apply_pick, AssistError, PickError, PickTarget};
use crate::observe::build_observation;
use crate::protocol::{
    create_ack, create_error, AckMessage, ErrorCode, ErrorMessage, ObservationMessage, StateHash,
    MAX_ACTIONS,
};
use crate::server::{run_server, AdapterStatus, ServerConfig};
use crate::types::{GameAction, Point, TileId};

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// A client just said hello and wants an observation right away.
    SnapshotRequest,
}

/// Command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Actions(ArrayVec<GameAction, MAX_ACTIONS>),
    Pick { x: u8, y: u8 },
    Tap(Point),
    Assist,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientAck { client_id: usize, ack: AckMessage },
    ToClientError { client_id: usize, err: ErrorMessage },
    ToClientObservation { client_id: usize, obs: ObservationMessage },
    BroadcastObservation { obs: ObservationMessage },
}

/// A command the game rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<PickError> for CommandError {
    fn from(e: PickError) -> Self {
        Self {
            code: ErrorCode::from_code(e.code()),
            message: e.message().to_string(),
        }
    }
}

impl From<AssistError> for CommandError {
    fn from(e: AssistError) -> Self {
        Self {
            code: ErrorCode::from_code(e.code()),
            message: e.message().to_string(),
        }
    }
}

/// Apply one client command to the game.
///
/// Returns the tile a pick, tap or assist moved into the Holding Area.
/// Actions are applied in order and acknowledged even when one is a no-op.
pub fn apply_command(
    state: &mut GameState,
    command: &ClientCommand,
) -> Result<Option<TileId>, CommandError> {
    match command {
        ClientCommand::Actions(actions) => {
            for &action in actions {
                state.apply_action(action);
            }
            Ok(None)
        }
        ClientCommand::Pick { x, y } => {
            let tile = apply_pick(state, PickTarget::Cell { x: *x, y: *y })?;
            Ok(Some(tile.id))
        }
        ClientCommand::Tap(p) => {
            let tile = apply_pick(state, PickTarget::Point(*p))?;
            Ok(Some(tile.id))
        }
        ClientCommand::Assist => {
            let tile = apply_assist(state)?;
            Ok(Some(tile.id))
        }
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    local_addr: SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status_rx: watch::Receiver<AdapterStatus>,
    observe_interval: Duration,
    obs_seq: u64,
    last_publish: Option<Instant>,
    last_hash: Option<StateHash>,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `TILEMATCH_AI_DISABLED` is set.
    pub fn start_from_env() -> Result<Option<Self>> {
        if ServerConfig::disabled_from_env() {
            info!("control adapter disabled (TILEMATCH_AI_DISABLED)");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Bind the server and wait until it listens.
    pub fn start(config: ServerConfig) -> Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let observe_interval = Duration::from_millis(config.observe_interval_ms);
        let addr = config.socket_addr()?;

        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (status_tx, status_rx) = watch::channel(AdapterStatus::default());
        let (ready_tx, ready_rx) = oneshot::channel();

        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tilematch-adapter")
            .enable_all()
            .build()
            .context("failed to create adapter runtime")?;

        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, Some(ready_tx), Some(status_tx)).await {
                warn!("control adapter stopped: {:#}", e);
            }
        });

        let local_addr = rt
            .block_on(async { tokio::time::timeout(Duration::from_secs(5), ready_rx).await })
            .map_err(|_| anyhow!("control adapter did not start listening on {}", addr))?
            .map_err(|_| anyhow!("control adapter failed to bind {}", addr))?;

        Ok(Self {
            _rt: rt,
            local_addr,
            cmd_rx,
            out_tx,
            status_rx,
            observe_interval,
            obs_seq: 0,
            last_publish: None,
            last_hash: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Connected clients and roles, as last reported by the server.
    pub fn status(&self) -> AdapterStatus {
        *self.status_rx.borrow()
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    fn next_seq(&mut self) -> u64 {
        self.obs_seq += 1;
        self.obs_seq
    }

    /// Drain queued commands into the game, replying to each sender.
    ///
    /// Returns how many commands were applied successfully.
    pub fn service(&mut self, state: &mut GameState) -> usize {
        let mut applied = 0;
        while let Some(cmd) = self.try_recv() {
            match cmd.payload {
                InboundPayload::SnapshotRequest => {
                    let seq = self.next_seq();
                    let obs = build_observation(&state.snapshot(), seq);
                    self.send(OutboundMessage::ToClientObservation {
                        client_id: cmd.client_id,
                        obs,
                    });
                }
                InboundPayload::Command(command) => match apply_command(state, &command) {
                    Ok(picked) => {
                        applied += 1;
                        self.send(OutboundMessage::ToClientAck {
                            client_id: cmd.client_id,
                            ack: create_ack(cmd.seq, picked.map(|id| id.0)),
                        });
                    }
                    Err(e) => {
                        warn!(
                            "client {} command {} rejected: {}",
                            cmd.client_id, cmd.seq, e.message
                        );
                        self.send(OutboundMessage::ToClientError {
                            client_id: cmd.client_id,
                            err: create_error(cmd.seq, e.code, &e.message),
                        });
                    }
                },
            }
        }
        applied
    }

    /// Broadcast an observation if the state changed and the stream interval
    /// elapsed. `force` skips the interval (after commands or core events).
    pub fn publish(&mut self, snap: &GameSnapshot, force: bool) -> bool {
        let now = Instant::now();
        let due = force
            || self
                .last_publish
                .map_or(true, |t| now.duration_since(t) >= self.observe_interval);
        if !due {
            return false;
        }

        let obs = build_observation(snap, self.obs_seq + 1);
        if self.last_hash == Some(obs.state_hash) {
            return false;
        }
        self.obs_seq += 1;
        self.last_hash = Some(obs.state_hash);
        self.last_publish = Some(now);
        self.send(OutboundMessage::BroadcastObservation { obs });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GameConfig, PausePolicy};
    use crate::types::RoundStatus;

    fn game() -> GameState {
        GameState::new(GameConfig::with_seed(4242))
    }

    #[test]
    fn test_actions_apply_in_order() {
        let mut gs = game();
        let mut actions = ArrayVec::new();
        actions.push(GameAction::Pause);
        actions.push(GameAction::TogglePause);
        assert_eq!(apply_command(&mut gs, &ClientCommand::Actions(actions)), Ok(None));
        assert!(!gs.paused());
    }

    #[test]
    fn test_pick_reports_tile() {
        let mut gs = game();
        let (x, y) = gs.board().free_tiles().next().map(|(_, t)| (t.pos.x, t.pos.y)).unwrap();
        let picked = apply_command(&mut gs, &ClientCommand::Pick { x, y }).unwrap();
        assert_eq!(gs.hold().last().map(|t| t.id), picked);
    }

    #[test]
    fn test_pick_errors_carry_wire_codes() {
        let mut gs = game();
        let err = apply_command(&mut gs, &ClientCommand::Pick { x: 40, y: 0 }).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPick);

        let err = apply_command(&mut gs, &ClientCommand::Tap(Point::new(-500, -500))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPick);

        assert!(gs.set_paused(true));
        assert_eq!(gs.config().pause_policy, PausePolicy::FreezeAll);
        let err = apply_command(&mut gs, &ClientCommand::Assist).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotPlayable);
    }

    #[test]
    fn test_assist_picks_while_playing() {
        let mut gs = game();
        let picked = apply_command(&mut gs, &ClientCommand::Assist).unwrap();
        assert!(picked.is_some());
        assert_eq!(gs.hold().len(), 1);
        assert_eq!(gs.status(), RoundStatus::Playing);
    }
}
