//! Control adapter over a real socket: handshake, roles, sequencing,
//! command forwarding, replies and controller hand-over.

use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};

use tui_tilematch::adapter::{
    apply_command, build_observation, create_ack, create_hello, hello_line, run_server,
    AdapterStatus, ClientCommand, InboundCommand, InboundPayload, OutboundMessage, ServerConfig,
};
use tui_tilematch::core::GameState;

const WAIT: Duration = Duration::from_secs(2);

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect failed");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn hello(&mut self, seq: u64, name: &str, stream: bool) -> Value {
        let line = hello_line(&create_hello(seq, name, stream)).unwrap();
        self.send(&line).await;
        self.recv().await
    }

    async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .unwrap()
            .expect("connection closed");
        serde_json::from_str(&line).unwrap()
    }
}

struct Harness {
    addr: std::net::SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    status_rx: watch::Receiver<AdapterStatus>,
    server: tokio::task::JoinHandle<()>,
}

impl Harness {
    async fn start(max_pending: usize) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_pending_commands: max_pending,
            ..ServerConfig::default()
        };
        let (cmd_tx, cmd_rx) = mpsc::channel(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let (status_tx, status_rx) = watch::channel(AdapterStatus::default());

        let server = tokio::spawn(async move {
            let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx), Some(status_tx)).await;
        });
        let addr = tokio::time::timeout(WAIT, ready_rx)
            .await
            .expect("server did not signal ready")
            .expect("ready channel dropped");

        Self {
            addr,
            cmd_rx,
            out_tx,
            status_rx,
            server,
        }
    }

    async fn next_command(&mut self) -> InboundCommand {
        tokio::time::timeout(WAIT, self.cmd_rx.recv())
            .await
            .expect("timed out waiting for a command")
            .expect("command channel closed")
    }

    async fn wait_status(&mut self, pred: impl Fn(&AdapterStatus) -> bool) -> AdapterStatus {
        let st = tokio::time::timeout(WAIT, self.status_rx.wait_for(|s| pred(s)))
            .await
            .expect("timed out waiting for adapter status")
            .expect("status channel closed");
        *st
    }
}

#[tokio::test]
async fn test_handshake_snapshot_and_pick() {
    let mut h = Harness::start(8).await;
    let mut game = GameState::with_seed(42);
    let mut a = Client::connect(h.addr).await;

    a.send(r#"{"type":"command","seq":1,"ts":0,"mode":"assist"}"#).await;
    let err = a.recv().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "handshake_required");
    assert_eq!(err["seq"], 1);

    let welcome = a.hello(1, "e2e", true).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["client_id"], 1);
    assert_eq!(welcome["protocol_version"], "1.0.0");
    assert_eq!(welcome["game_id"], "tui-tilematch");

    // A streaming hello asks the game loop for an immediate snapshot.
    let req = h.next_command().await;
    assert!(matches!(req.payload, InboundPayload::SnapshotRequest));
    h.out_tx
        .send(OutboundMessage::ToClientObservation {
            client_id: req.client_id,
            obs: build_observation(&game.snapshot(), 1),
        })
        .unwrap();
    let obs = a.recv().await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["status"], "playing");
    assert_eq!(obs["grid"]["rows"], 6);
    assert_eq!(obs["tiles"].as_array().unwrap().len(), 18);
    assert_eq!(obs["state_hash"].as_str().unwrap().len(), 16);

    a.send(r#"{"type":"command","seq":2,"ts":0,"mode":"pick","pick":{"x":0,"y":0}}"#)
        .await;
    let cmd = h.next_command().await;
    assert_eq!(cmd.seq, 2);
    let InboundPayload::Command(command) = cmd.payload else {
        panic!("expected a command");
    };
    assert_eq!(command, ClientCommand::Pick { x: 0, y: 0 });

    let picked = apply_command(&mut game, &command).unwrap();
    h.out_tx
        .send(OutboundMessage::ToClientAck {
            client_id: cmd.client_id,
            ack: create_ack(cmd.seq, picked.map(|id| id.0)),
        })
        .unwrap();
    let ack = a.recv().await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["status"], "ok");
    assert_eq!(ack["picked"], picked.unwrap().0);

    // Replayed seq is rejected without reaching the game loop.
    a.send(r#"{"type":"command","seq":2,"ts":0,"mode":"assist"}"#).await;
    let err = a.recv().await;
    assert_eq!(err["code"], "invalid_command");
    assert!(h.cmd_rx.try_recv().is_err());

    h.server.abort();
}

#[tokio::test]
async fn test_malformed_and_unknown_messages() {
    let h = Harness::start(8).await;
    let mut a = Client::connect(h.addr).await;
    a.hello(1, "e2e", false).await;

    a.send(r#"{"type":"command","seq":5,"ts":0,"mode":"action","actions":["jump"]}"#)
        .await;
    let err = a.recv().await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 5);

    a.send(r#"{"type":"command","seq":6,"ts":0,"mode":"pick"}"#).await;
    let err = a.recv().await;
    assert_eq!(err["code"], "invalid_pick");

    a.send(r#"{"type":"dance","seq":7}"#).await;
    let err = a.recv().await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 7);

    h.server.abort();
}

#[tokio::test]
async fn test_protocol_mismatch_closes_connection() {
    let h = Harness::start(8).await;
    let mut a = Client::connect(h.addr).await;

    a.send(r#"{"type":"hello","seq":1,"ts":0,"client":{"name":"old","version":"0"},"protocol_version":"0.9.0"}"#)
        .await;
    let err = a.recv().await;
    assert_eq!(err["code"], "protocol_mismatch");

    let eof = tokio::time::timeout(WAIT, a.lines.next_line())
        .await
        .expect("server kept the connection open")
        .unwrap();
    assert!(eof.is_none());

    h.server.abort();
}

#[tokio::test]
async fn test_observer_roles_and_controller_handover() {
    let mut h = Harness::start(8).await;
    let mut a = Client::connect(h.addr).await;
    let mut b = Client::connect(h.addr).await;

    assert_eq!(a.hello(1, "a", false).await["role"], "controller");
    let welcome = b.hello(1, "b", true).await;
    assert_eq!(welcome["role"], "observer");
    assert_eq!(welcome["controller_id"], 1);
    let _snapshot_request = h.next_command().await;

    b.send(r#"{"type":"command","seq":2,"ts":0,"mode":"assist"}"#).await;
    assert_eq!(b.recv().await["code"], "not_controller");

    b.send(r#"{"type":"control","seq":3,"ts":0,"action":"claim"}"#).await;
    assert_eq!(b.recv().await["code"], "controller_active");

    let st = h
        .wait_status(|s| s.client_count == 2 && s.streaming_count == 1)
        .await;
    assert_eq!(st.controller_id, Some(1));

    // Only streaming clients get broadcasts.
    let game = GameState::with_seed(9);
    h.out_tx
        .send(OutboundMessage::BroadcastObservation {
            obs: build_observation(&game.snapshot(), 1),
        })
        .unwrap();
    assert_eq!(b.recv().await["type"], "observation");

    drop(a);
    let st = h.wait_status(|s| s.client_count == 1).await;
    assert_eq!(st.controller_id, Some(2));

    b.send(r#"{"type":"command","seq":4,"ts":0,"mode":"action","actions":["pause","undo"]}"#)
        .await;
    let cmd = h.next_command().await;
    assert_eq!(cmd.client_id, 2);
    assert_eq!(cmd.seq, 4);

    h.server.abort();
}

#[tokio::test]
async fn test_full_queue_reports_backpressure() {
    let h = Harness::start(1).await;
    let mut a = Client::connect(h.addr).await;
    a.hello(1, "a", false).await;

    // Nobody drains the queue: the first command fills it.
    a.send(r#"{"type":"command","seq":2,"ts":0,"mode":"assist"}"#).await;
    a.send(r#"{"type":"command","seq":3,"ts":0,"mode":"assist"}"#).await;
    let err = a.recv().await;
    assert_eq!(err["code"], "backpressure");
    assert_eq!(err["seq"], 3);

    h.server.abort();
}
