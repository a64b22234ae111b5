//! Per-connection I/O: readiness-driven, non-blocking, explicitly buffered.
//!
//! Each connection owns a receive assembler and an outbox. Reads pull
//! whatever the socket has into the assembler tail and drain complete
//! messages; writes serialize queued messages lazily, one at a time, and a
//! short write leaves the unsent remainder at the buffer front for the
//! next writable notification. Write interest is only registered while
//! something is pending, so an idle connection never spins on a
//! permanently writable socket.

use std::collections::VecDeque;
use std::io;

use tokio::io::Interest;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::net::server::RelayEvent;
use crate::wire::{self, Assembler, Message, MAX_MESSAGE_SIZE};

/// Commands the relay sends a connection task
#[derive(Debug)]
pub(crate) enum ConnCommand {
    Send(Message),
    Close,
}

/// Outbound queue plus the partially-sent remainder of one message.
/// Messages are serialized only when the socket is writable; a message
/// that started sending is never re-serialized.
#[derive(Debug)]
pub(crate) struct Outbox {
    queue: VecDeque<Message>,
    buf: [u8; MAX_MESSAGE_SIZE],
    buf_len: usize,
}

impl Outbox {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            buf: [0u8; MAX_MESSAGE_SIZE],
            buf_len: 0,
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.buf_len == 0
    }

    /// Drain as much as the socket accepts right now. Returns on
    /// would-block with the remainder kept for the next notification.
    pub(crate) fn write_to(&mut self, stream: &TcpStream) -> io::Result<()> {
        loop {
            if self.buf_len == 0 {
                let Some(message) = self.queue.pop_front() else {
                    return Ok(());
                };
                self.buf_len = wire::encode(&message, &mut self.buf)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            }
            match stream.try_write(&self.buf[..self.buf_len]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => {
                    self.buf.copy_within(n..self.buf_len, 0);
                    self.buf_len -= n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }
}

/// Read whatever the socket has, draining complete messages to the relay.
/// Returns true on peer EOF.
async fn read_available(
    id: u64,
    stream: &TcpStream,
    assembler: &mut Assembler,
    events: &mpsc::Sender<RelayEvent>,
) -> anyhow::Result<bool> {
    loop {
        let space = assembler.free_space();
        if space.is_empty() {
            // Peer outran dispatch; let the queued messages drain first.
            return Ok(false);
        }
        match stream.try_read(space) {
            Ok(0) => return Ok(true),
            Ok(n) => {
                assembler.commit(n);
                while let Some(message) = assembler.next_message()? {
                    events
                        .send(RelayEvent::Inbound { id, message })
                        .await
                        .map_err(|_| anyhow::anyhow!("relay gone"))?;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) => return Err(e.into()),
        }
    }
}

async fn pump(
    id: u64,
    stream: TcpStream,
    rx: &mut mpsc::UnboundedReceiver<ConnCommand>,
    events: &mpsc::Sender<RelayEvent>,
) -> anyhow::Result<()> {
    let mut assembler = Assembler::new();
    let mut outbox = Outbox::new();

    loop {
        let interest = if outbox.is_empty() {
            Interest::READABLE
        } else {
            Interest::READABLE | Interest::WRITABLE
        };

        tokio::select! {
            command = rx.recv() => match command {
                Some(ConnCommand::Send(message)) => outbox.push(message),
                Some(ConnCommand::Close) | None => return Ok(()),
            },
            ready = stream.ready(interest) => {
                let ready = ready?;
                if ready.is_readable()
                    && read_available(id, &stream, &mut assembler, events).await?
                {
                    debug!(id, "peer closed");
                    return Ok(());
                }
                if ready.is_writable() {
                    outbox.write_to(&stream)?;
                }
            }
        }
    }
}

/// Run one connection until EOF, error, or a Close command, then report
/// the disconnect to the relay.
pub(crate) async fn serve_connection(
    id: u64,
    stream: TcpStream,
    mut rx: mpsc::UnboundedReceiver<ConnCommand>,
    events: mpsc::Sender<RelayEvent>,
) {
    match pump(id, stream, &mut rx, &events).await {
        Ok(()) => debug!(id, "connection closed"),
        Err(e) => warn!(id, error = %e, "connection failed"),
    }
    let _ = events.send(RelayEvent::Disconnected { id }).await;
}
