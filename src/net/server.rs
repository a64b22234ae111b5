//! Relay server: accepts connections, allocates sides, and rebroadcasts
//! validated state between participants.
//!
//! All authoritative state (the frame table, the side pool, the connection
//! registry) is owned by a single relay task; connection tasks only do
//! socket I/O and forward decoded messages over a channel. That keeps at
//! most one dispatch in flight per connection with no locking.

use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::core::FrameTable;
use crate::net::conn::{serve_connection, ConnCommand};
use crate::types::{Side, DEFAULT_PORT};
use crate::wire::{Message, Payload};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("NETRIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("NETRIS_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { host, port }
    }
}

/// Events flowing from accept loop and connection tasks into the relay
#[derive(Debug)]
pub(crate) enum RelayEvent {
    Connected {
        id: u64,
        tx: mpsc::UnboundedSender<ConnCommand>,
    },
    Inbound {
        id: u64,
        message: Message,
    },
    Disconnected {
        id: u64,
    },
}

struct ConnEntry {
    side: Option<Side>,
    tx: mpsc::UnboundedSender<ConnCommand>,
}

struct Relay {
    frames: FrameTable,
    /// Free side tokens; allocated on connect, returned on disconnect
    pool: Vec<Side>,
    conns: HashMap<u64, ConnEntry>,
}

impl Relay {
    fn new() -> Self {
        Self {
            frames: FrameTable::new(0),
            pool: vec![Side::One, Side::Zero],
            conns: HashMap::new(),
        }
    }

    fn send(entry: &ConnEntry, message: Message) {
        let _ = entry.tx.send(ConnCommand::Send(message));
    }

    /// Queue a message to every *assigned* connection except `origin`'s side
    fn broadcast(&self, origin: Side, message: &Message) {
        for entry in self.conns.values() {
            match entry.side {
                Some(side) if side != origin => Self::send(entry, message.clone()),
                _ => {}
            }
        }
    }

    /// Queue a message to every assigned connection except the sender
    fn forward(&self, sender: u64, message: &Message) {
        for (id, entry) in &self.conns {
            if *id != sender && entry.side.is_some() {
                Self::send(entry, message.clone());
            }
        }
    }

    fn on_connected(&mut self, id: u64, tx: mpsc::UnboundedSender<ConnCommand>) {
        let side = self.pool.pop();
        let entry = ConnEntry { side, tx };

        match side {
            Some(side) => {
                info!(id, side = side.as_u8(), "side assigned");
                Self::send(&entry, Message::new(side, Payload::SideAssign));
                // Catch the newcomer up on every other side's state.
                for other in Side::ALL {
                    if other == side {
                        continue;
                    }
                    let frame = self.frames.get(other);
                    Self::send(&entry, Message::new(other, Payload::Field(frame.board().clone())));
                    if let Some(piece) = frame.piece() {
                        Self::send(&entry, Message::new(other, Payload::Move(piece.into())));
                    }
                }
            }
            None => warn!(id, "no sides remain; connection stays unassigned"),
        }

        self.conns.insert(id, entry);
    }

    /// A connection may only speak for sides not owned by someone else.
    /// (A side with no live connection is fair game: state for it is still
    /// stored and relayed.)
    fn side_conflicts(&self, sender: u64, side: Side) -> bool {
        self.conns
            .iter()
            .any(|(id, entry)| *id != sender && entry.side == Some(side))
    }

    fn drop_conn(&mut self, id: u64) {
        if let Some(entry) = self.conns.get(&id) {
            let _ = entry.tx.send(ConnCommand::Close);
        }
    }

    fn on_inbound(&mut self, id: u64, message: Message) {
        let side = message.side;
        match &message.payload {
            Payload::SideAssign => {
                // Only the server assigns sides.
                warn!(id, "client sent side-assign; dropping connection");
                self.drop_conn(id);
            }
            Payload::Field(_) | Payload::Move(_) | Payload::Drop(_)
                if self.side_conflicts(id, side) =>
            {
                warn!(id, side = side.as_u8(), "message for a side owned elsewhere");
                self.drop_conn(id);
            }
            Payload::Field(board) => {
                self.frames.get_mut(side).set_board(board.clone());
                self.broadcast(side, &message);
            }
            Payload::Move(state) => {
                self.frames.get_mut(side).set_piece((*state).into());
                self.broadcast(side, &message);
            }
            Payload::Drop(state) => {
                // Re-simulate placement so garbage sequencing stays
                // consistent with the sender.
                let frame = self.frames.get_mut(side);
                frame.set_piece((*state).into());
                let summary = frame.place_current();
                debug!(
                    id,
                    side = side.as_u8(),
                    cleared = summary.cleared,
                    garbage = summary.garbage_rows,
                    "placement"
                );
                self.broadcast(side, &message);
            }
            Payload::Attack(attack) => {
                // The header names the victim, not the sender.
                debug!(id, victim = side.as_u8(), rows = attack.rows, "attack queued");
                self.frames.get_mut(side).queue_attack(*attack);
                self.forward(id, &message);
            }
        }
    }

    fn on_disconnected(&mut self, id: u64) {
        if let Some(entry) = self.conns.remove(&id) {
            if let Some(side) = entry.side {
                info!(id, side = side.as_u8(), "side returned to pool");
                self.pool.push(side);
            }
        }
    }
}

async fn relay_loop(mut events: mpsc::Receiver<RelayEvent>) {
    let mut relay = Relay::new();
    while let Some(event) = events.recv().await {
        match event {
            RelayEvent::Connected { id, tx } => relay.on_connected(id, tx),
            RelayEvent::Inbound { id, message } => relay.on_inbound(id, message),
            RelayEvent::Disconnected { id } => relay.on_disconnected(id),
        }
    }
}

/// Bind and run the relay server. `ready_tx`, when given, receives the
/// bound address once the listener is up (tests bind port 0).
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let bound = listener.local_addr()?;
    info!(%bound, "listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let (event_tx, event_rx) = mpsc::channel::<RelayEvent>(64);
    tokio::spawn(relay_loop(event_rx));

    let mut next_id: u64 = 0;
    loop {
        let (stream, addr) = listener.accept().await?;
        next_id += 1;
        let id = next_id;
        info!(id, %addr, "accepted");

        let (tx, rx) = mpsc::unbounded_channel::<ConnCommand>();
        if event_tx.send(RelayEvent::Connected { id, tx }).await.is_err() {
            anyhow::bail!("relay task gone");
        }
        tokio::spawn(serve_connection(id, stream, rx, event_tx.clone()));
    }
}
