//! Client session: reconnecting socket loop, inbound dispatch, and delta
//! publishing.
//!
//! The session is a constrained subset of the server's machinery: one task
//! owns the socket and a serial receive/dispatch loop (read exactly one
//! header, then exactly that payload). The frame table is behind an
//! explicit lock because the input/render context mutates the local side
//! while the socket task stores remote state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::core::FrameTable;
use crate::types::{Attack, Side, DEFAULT_PORT, RECONNECT_DELAY_MS};
use crate::wire::{self, Message, Payload, HEADER_SIZE};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("NETRIS_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("NETRIS_SERVER_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let reconnect_ms = env::var("NETRIS_RECONNECT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(RECONNECT_DELAY_MS);

        Self {
            host,
            port,
            reconnect_delay: Duration::from_millis(reconnect_ms),
        }
    }
}

/// State shared between the socket task and the local input/render context
#[derive(Debug)]
pub struct SessionState {
    pub frames: FrameTable,
    /// Assigned by the server; local input effects wait for this
    pub side: Option<Side>,
}

/// A running client session
pub struct Session {
    state: Arc<Mutex<SessionState>>,
    writer: Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>>,
    _task: JoinHandle<()>,
}

impl Session {
    /// Spawn the session's reconnect/receive loop. `seed` drives the local
    /// engine's piece supply.
    pub fn connect(config: ClientConfig, seed: u32) -> Self {
        let state = Arc::new(Mutex::new(SessionState {
            frames: FrameTable::new(seed),
            side: None,
        }));
        let writer: Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>> =
            Arc::new(tokio::sync::Mutex::new(None));

        let task = tokio::spawn(run_loop(config, Arc::clone(&state), Arc::clone(&writer)));

        Self {
            state,
            writer,
            _task: task,
        }
    }

    /// The side the server granted us, if any yet
    pub fn side(&self) -> Option<Side> {
        self.state.lock().expect("session lock poisoned").side
    }

    /// Run `f` with the shared state locked
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.state.lock().expect("session lock poisoned");
        f(&mut guard)
    }

    /// Send one encoded message to the server
    pub async fn publish(&self, message: &Message) -> Result<()> {
        let bytes = wire::encode_to_vec(message);
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(w) => {
                w.write_all(&bytes).await.context("send failed")?;
                Ok(())
            }
            None => bail!("not connected"),
        }
    }

    fn local_message(&self, build: impl FnOnce(&SessionState, Side) -> Option<Payload>) -> Result<Message> {
        let guard = self.state.lock().expect("session lock poisoned");
        let Some(side) = guard.side else {
            bail!("no side assigned yet");
        };
        match build(&guard, side) {
            Some(payload) => Ok(Message::new(side, payload)),
            None => bail!("no local piece"),
        }
    }

    /// Publish the local board snapshot
    pub async fn publish_board(&self) -> Result<()> {
        let message =
            self.local_message(|s, side| Some(Payload::Field(s.frames.get(side).board().clone())))?;
        self.publish(&message).await
    }

    /// Publish the local piece state
    pub async fn publish_piece(&self) -> Result<()> {
        let message =
            self.local_message(|s, side| s.frames.get(side).piece().map(|p| Payload::Move(p.into())))?;
        self.publish(&message).await
    }

    /// Publish a placement of the given piece state
    pub async fn publish_drop(&self, state: wire::PieceState) -> Result<()> {
        let message = self.local_message(|_, _| Some(Payload::Drop(state)))?;
        self.publish(&message).await
    }

    /// Publish an attack against the opponent
    pub async fn publish_attack(&self, attack: Attack) -> Result<()> {
        let guard = self.state.lock().expect("session lock poisoned");
        let Some(side) = guard.side else {
            bail!("no side assigned yet");
        };
        drop(guard);
        let message = Message::new(side.opposite(), Payload::Attack(attack));
        self.publish(&message).await
    }
}

async fn run_loop(
    config: ClientConfig,
    state: Arc<Mutex<SessionState>>,
    writer: Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>>,
) {
    loop {
        match TcpStream::connect((config.host.as_str(), config.port)).await {
            Ok(stream) => {
                info!(host = %config.host, port = config.port, "connected");
                let (mut read_half, write_half) = stream.into_split();
                *writer.lock().await = Some(write_half);

                if let Err(e) = receive_loop(&mut read_half, &state).await {
                    warn!(error = %e, "session receive failed");
                }

                *writer.lock().await = None;
                state.lock().expect("session lock poisoned").side = None;
            }
            Err(e) => {
                warn!(error = %e, "connect failed");
            }
        }
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Serial dispatch: exactly one header, then exactly that payload
async fn receive_loop(read_half: &mut OwnedReadHalf, state: &Arc<Mutex<SessionState>>) -> Result<()> {
    loop {
        let mut header_buf = [0u8; HEADER_SIZE];
        read_half.read_exact(&mut header_buf).await?;
        let header = wire::decode_header(&header_buf)?;

        let mut payload = vec![0u8; header.length as usize];
        read_half.read_exact(&mut payload).await?;
        let message = wire::decode_payload(&header, &payload)?;

        dispatch(state, message);
    }
}

fn dispatch(state: &Arc<Mutex<SessionState>>, message: Message) {
    let mut guard = state.lock().expect("session lock poisoned");
    let side = message.side;
    match message.payload {
        Payload::SideAssign => {
            info!(side = side.as_u8(), "side assigned");
            guard.side = Some(side);
        }
        Payload::Field(board) => {
            guard.frames.get_mut(side).set_board(board);
        }
        Payload::Move(piece_state) => {
            guard.frames.get_mut(side).set_piece(piece_state.into());
        }
        Payload::Drop(piece_state) => {
            // Mirror the relay's bookkeeping so the remote board stays
            // consistent between snapshots.
            let frame = guard.frames.get_mut(side);
            frame.set_piece(piece_state.into());
            frame.place_current();
        }
        Payload::Attack(attack) => {
            guard.frames.get_mut(side).queue_attack(attack);
        }
    }
}
