//! TCP server for the control adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch, Mutex};

use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::types::Point;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_pending_commands: usize,
    /// Minimum spacing of streamed observations when nothing forces one.
    pub observe_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7788,
            max_pending_commands: 10,
            observe_interval_ms: 100,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("TILEMATCH_AI_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = env::var("TILEMATCH_AI_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);
        let max_pending_commands = env::var("TILEMATCH_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_pending_commands);
        let observe_interval_ms = env::var("TILEMATCH_AI_OBS_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.observe_interval_ms);

        Self {
            host,
            port,
            max_pending_commands,
            observe_interval_ms,
        }
    }

    /// Check if the adapter is disabled via environment
    pub fn disabled_from_env() -> bool {
        std::env::var("TILEMATCH_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid adapter address {}:{}", self.host, self.port))
    }
}

/// Connected clients and roles, published for the host's status panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdapterStatus {
    pub client_count: u16,
    pub controller_id: Option<usize>,
    pub streaming_count: u16,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Ack(AckMessage),
    Error(ErrorMessage),
    Welcome(WelcomeMessage),
    Observation(ObservationMessage),
}

/// Handle to a connected client
struct ClientEntry {
    id: usize,
    addr: SocketAddr,
    handshaken: bool,
    stream_observations: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
}

/// Client list and controller assignment.
#[derive(Default)]
struct Registry {
    clients: Vec<ClientEntry>,
    controller: Option<usize>,
}

impl Registry {
    fn add(&mut self, id: usize, addr: SocketAddr, tx: mpsc::UnboundedSender<ClientOutbound>) {
        self.clients.push(ClientEntry {
            id,
            addr,
            handshaken: false,
            stream_observations: false,
            last_seq: None,
            tx,
        });
    }

    fn get_mut(&mut self, id: usize) -> Option<&mut ClientEntry> {
        self.clients.iter_mut().find(|c| c.id == id)
    }

    fn is_handshaken(&self, id: usize) -> bool {
        self.clients.iter().any(|c| c.id == id && c.handshaken)
    }

    fn is_controller(&self, id: usize) -> bool {
        self.controller == Some(id)
    }

    /// Accept `seq` only if it is above everything this client sent before.
    fn check_seq(&mut self, id: usize, seq: u64) -> bool {
        let Some(client) = self.get_mut(id) else {
            return false;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    /// Record a hello; the first client to say hello becomes controller.
    fn hello(&mut self, id: usize, stream: bool) -> (AssignedRole, Option<usize>) {
        if let Some(client) = self.get_mut(id) {
            client.handshaken = true;
            client.stream_observations = stream;
        }
        if self.controller.is_none() {
            self.controller = Some(id);
            info!("adapter client {} is now controller", id);
        }
        let role = if self.is_controller(id) {
            AssignedRole::Controller
        } else {
            AssignedRole::Observer
        };
        (role, self.controller)
    }

    fn claim(&mut self, id: usize) -> Result<(), ErrorCode> {
        match self.controller {
            None => {
                self.controller = Some(id);
                info!("adapter client {} claimed control", id);
                Ok(())
            }
            Some(c) if c == id => Ok(()),
            Some(_) => Err(ErrorCode::ControllerActive),
        }
    }

    fn release(&mut self, id: usize) -> Result<(), ErrorCode> {
        if !self.is_controller(id) {
            return Err(ErrorCode::NotController);
        }
        self.controller = None;
        info!("adapter client {} released control", id);
        Ok(())
    }

    /// Drop a client. A departing controller hands over to the lowest
    /// remaining handshaken id, which is returned.
    fn remove(&mut self, id: usize) -> Option<usize> {
        if let Some(pos) = self.clients.iter().position(|c| c.id == id) {
            let client = self.clients.remove(pos);
            debug!("adapter client {} ({}) removed", id, client.addr);
        }
        if !self.is_controller(id) {
            return None;
        }
        self.controller = self
            .clients
            .iter()
            .filter(|c| c.handshaken)
            .map(|c| c.id)
            .min();
        match self.controller {
            Some(next) => info!("adapter controller {} left; promoted {}", id, next),
            None => info!("adapter controller {} left; no controller", id),
        }
        self.controller
    }

    fn send(&self, id: usize, msg: ClientOutbound) {
        if let Some(c) = self.clients.iter().find(|c| c.id == id) {
            let _ = c.tx.send(msg);
        }
    }

    fn broadcast(&self, obs: &ObservationMessage) {
        for c in self.clients.iter().filter(|c| c.handshaken && c.stream_observations) {
            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
        }
    }

    fn status(&self) -> AdapterStatus {
        AdapterStatus {
            client_count: self.clients.len() as u16,
            controller_id: self.controller,
            streaming_count: self
                .clients
                .iter()
                .filter(|c| c.handshaken && c.stream_observations)
                .count() as u16,
        }
    }
}

/// Shared server state
struct ServerState {
    registry: Mutex<Registry>,
    status_tx: Option<watch::Sender<AdapterStatus>>,
}

impl ServerState {
    /// Run `f` on the registry and publish the resulting status.
    async fn update<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        let mut registry = self.registry.lock().await;
        let out = f(&mut registry);
        if let Some(tx) = self.status_tx.as_ref() {
            tx.send_if_modified(|st| {
                let next = registry.status();
                let changed = *st != next;
                *st = next;
                changed
            });
        }
        out
    }
}

/// Start the TCP server
///
/// `ready_tx` receives the bound address once the listener is up.
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
    status_tx: Option<watch::Sender<AdapterStatus>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!("control adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState {
        registry: Mutex::new(Registry::default()),
        status_tx,
    });
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let registry = state.registry.lock().await;
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        registry.send(client_id, ClientOutbound::Ack(ack));
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        registry.send(client_id, ClientOutbound::Error(err));
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        registry.send(client_id, ClientOutbound::Observation(obs));
                    }
                    OutboundMessage::BroadcastObservation { obs } => {
                        registry.broadcast(&obs);
                    }
                }
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        info!("adapter client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, &state, command_tx).await {
                warn!("adapter client {} error: {:#}", client_id, e);
            }
            info!("adapter client {} disconnected", client_id);
        });
    }
}

/// Serialize outbound messages as JSON lines until the channel closes.
async fn write_loop(
    mut writer: tokio::io::WriteHalf<TcpStream>,
    mut rx: mpsc::UnboundedReceiver<ClientOutbound>,
) {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    while let Some(msg) = rx.recv().await {
        buf.clear();
        let encoded = match &msg {
            ClientOutbound::Ack(m) => serde_json::to_writer(&mut buf, m),
            ClientOutbound::Error(m) => serde_json::to_writer(&mut buf, m),
            ClientOutbound::Welcome(m) => serde_json::to_writer(&mut buf, m),
            ClientOutbound::Observation(m) => serde_json::to_writer(&mut buf, m),
        };
        if let Err(e) = encoded {
            warn!("failed to encode adapter message: {}", e);
            continue;
        }
        buf.push(b'\n');
        if writer.write_all(&buf).await.is_err() || writer.flush().await.is_err() {
            break;
        }
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: &ServerState,
    command_tx: mpsc::Sender<InboundCommand>,
) -> anyhow::Result<()> {
    let (reader, writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, rx) = mpsc::unbounded_channel::<ClientOutbound>();
    state.update(|r| r.add(client_id, addr, tx.clone())).await;
    let write_task = tokio::spawn(write_loop(writer, rx));

    let reply_error = |seq: u64, code: ErrorCode, message: &str| {
        debug!("adapter client {} error {:?}: {}", client_id, code, message);
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    let result: anyhow::Result<()> = async {
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let parsed = match parse_message(trimmed) {
                Ok(parsed) => parsed,
                Err(e) => {
                    let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                    reply_error(seq, ErrorCode::InvalidCommand, &format!("JSON parse error: {}", e));
                    continue;
                }
            };

            let seq = match &parsed {
                ParsedMessage::Hello(m) => m.seq,
                ParsedMessage::Command(m) => m.seq,
                ParsedMessage::Control(m) => m.seq,
                ParsedMessage::Unknown(m) => m.seq,
            };

            // Everything but the first hello needs a completed handshake.
            let handshaken = state.update(|r| r.is_handshaken(client_id)).await;
            if !handshaken && !matches!(parsed, ParsedMessage::Hello(_)) {
                reply_error(seq, ErrorCode::HandshakeRequired, "Send hello first");
                continue;
            }

            // Sequencing: enforce monotonic seq per sender.
            if !state.update(|r| r.check_seq(client_id, seq)).await {
                reply_error(seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                continue;
            }

            match parsed {
                ParsedMessage::Hello(hello) => {
                    if !version_compatible(&hello.protocol_version) {
                        reply_error(
                            hello.seq,
                            ErrorCode::ProtocolMismatch,
                            &format!("Protocol version {} not supported", hello.protocol_version),
                        );
                        break;
                    }

                    let stream = hello.requested.stream_observations;
                    let (role, controller) = state.update(|r| r.hello(client_id, stream)).await;
                    info!(
                        "adapter client {} hello from {} {} as {:?}",
                        client_id, hello.client.name, hello.client.version, role
                    );
                    let welcome =
                        create_welcome(hello.seq, client_id as u64, role, controller.map(|c| c as u64));
                    let _ = tx.send(ClientOutbound::Welcome(welcome));

                    if stream {
                        let _ = command_tx.try_send(InboundCommand {
                            client_id,
                            seq: hello.seq,
                            payload: InboundPayload::SnapshotRequest,
                        });
                    }
                }

                ParsedMessage::Command(cmd) => {
                    if !state.update(|r| r.is_controller(client_id)).await {
                        reply_error(cmd.seq, ErrorCode::NotController, "Only controller may send commands");
                        continue;
                    }

                    let mapped = match map_command(&cmd) {
                        Ok(c) => c,
                        Err((code, message)) => {
                            reply_error(cmd.seq, code, &message);
                            continue;
                        }
                    };

                    // Backpressure: bounded queue. The game loop acks once applied.
                    if command_tx
                        .try_send(InboundCommand {
                            client_id,
                            seq: cmd.seq,
                            payload: InboundPayload::Command(mapped),
                        })
                        .is_err()
                    {
                        reply_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                    }
                }

                ParsedMessage::Control(ctrl) => {
                    let result = state
                        .update(|r| match ctrl.action {
                            ControlAction::Claim => r.claim(client_id),
                            ControlAction::Release => r.release(client_id),
                        })
                        .await;
                    match result {
                        Ok(()) => {
                            let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq, None)));
                        }
                        Err(ErrorCode::ControllerActive) => {
                            reply_error(ctrl.seq, ErrorCode::ControllerActive, "Controller already assigned");
                        }
                        Err(code) => reply_error(ctrl.seq, code, "Only controller may release"),
                    }
                }

                ParsedMessage::Unknown(m) => {
                    reply_error(m.seq, ErrorCode::InvalidCommand, "Unknown message type");
                }
            }
        }

        Ok(())
    }
    .await;

    // Removing the client drops the registry's sender; the writer then
    // flushes whatever is queued and exits.
    state.update(|r| r.remove(client_id)).await;
    drop(tx);
    let _ = write_task.await;
    result
}

/// Map a protocol command into a game-loop command.
fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, (ErrorCode, String)> {
    match cmd.mode {
        CommandMode::Action => match cmd.actions.as_ref() {
            Some(list) if !list.0.is_empty() => Ok(ClientCommand::Actions(list.0.clone())),
            _ => Err((ErrorCode::InvalidCommand, "Missing actions".to_string())),
        },
        CommandMode::Pick => cmd
            .pick
            .map(|c| ClientCommand::Pick { x: c.x, y: c.y })
            .ok_or_else(|| (ErrorCode::InvalidPick, "Missing pick".to_string())),
        CommandMode::Tap => cmd
            .tap
            .map(|p| ClientCommand::Tap(Point::new(p.x, p.y)))
            .ok_or_else(|| (ErrorCode::InvalidPick, "Missing tap".to_string())),
        CommandMode::Assist => Ok(ClientCommand::Assist),
    }
}
