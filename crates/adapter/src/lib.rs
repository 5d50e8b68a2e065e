//! Adapter module - external control via TCP socket with a JSON protocol
//!
//! This module lets an external agent (a bot, a test harness, a remote
//! player) drive the puzzle through a TCP socket.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to the TCP socket (default: 127.0.0.1:7788)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Observation Streaming**: Server sends snapshots to clients that asked
//! 5. **Commanding**: Controller sends commands; the game loop acks each one
//!    after applying it
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and `requested.stream_observations`
//! - **command**: `action` (undo, reset, advanceLevel, pause, resume,
//!   togglePause), `pick` (grid cell), `tap` (layout point) or `assist`
//! - **control**: Claim or release controller status
//!
//! ## Server → Client
//!
//! - **welcome**: Assigned id and role, server capabilities
//! - **observation**: Full round snapshot with a stable `state_hash`
//! - **ack**: Command applied (`picked` names the tile a pick moved)
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `TILEMATCH_AI_HOST`: Bind address (default: "127.0.0.1")
//! - `TILEMATCH_AI_PORT`: Port number (default: 7788)
//! - `TILEMATCH_AI_MAX_PENDING`: Command queue depth before `backpressure` (default: 10)
//! - `TILEMATCH_AI_OBS_MS`: Observation stream spacing in ms (default: 100)
//! - `TILEMATCH_AI_DISABLED`: Set to "1" or "true" to disable the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":...,"level":1,"score":0,"tiles":[...],...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"mode":"pick","pick":{"x":3,"y":0}}
//! Server -> Client: {"type":"ack","seq":2,"ts":...,"status":"ok","picked":3}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7788
//! {"type":"hello","seq":1,"ts":0,"client":{"name":"nc","version":"0"},"protocol_version":"1.0.0"}
//! ```

pub mod observe;
pub mod protocol;
pub mod runtime;
pub mod server;

pub use tui_tilematch_core as core;
pub use tui_tilematch_engine as engine;
pub use tui_tilematch_types as types;

pub use observe::{build_observation, state_hash, Fnv1aHasher};
pub use protocol::*;
pub use runtime::{
    apply_command, Adapter, ClientCommand, CommandError, InboundCommand, InboundPayload,
    OutboundMessage,
};
pub use server::{run_server, AdapterStatus, ClientOutbound, ServerConfig};
