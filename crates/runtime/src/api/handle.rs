//! Cloneable façade over the session worker.
//!
//! [`ServerHandle`] hides channel plumbing: it opens [`Connection`]s, queries
//! stats, and streams events from specific topics. A [`Connection`] is one
//! participant's duplex link; transports split it into a sending half and an
//! outbox, in-process callers use it directly.
use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::protocol::{ClientRequest, RequestEnvelope, ResponseBody, ServerMessage};
use crate::workers::Command;

/// Server-assigned identifier of one live connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStats {
    pub rooms: usize,
    pub connections: usize,
    /// Connections currently seated in a room.
    pub participants: usize,
}

/// Client-facing handle to interact with the session server
#[derive(Clone)]
pub struct ServerHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl ServerHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    /// Registers a new connection with the session worker.
    pub async fn connect(&self) -> Result<Connection> {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Connect {
                outbox: outbox_tx.clone(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        let id = reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?;

        Ok(Connection {
            sender: ConnectionSender {
                id,
                command_tx: self.command_tx.clone(),
                outbox_tx,
            },
            outbox: outbox_rx,
            buffered: VecDeque::new(),
            next_request_id: 1,
        })
    }

    pub async fn stats(&self) -> Result<ServerStats> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Stats { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Runs the idle-room sweep immediately; returns how many rooms closed.
    pub async fn sweep_now(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(Command::Sweep { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Room` - Room lifecycle
    /// - `Topic::Sync` - Digest mismatches and winner disagreements
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut sync_rx = handle.subscribe(Topic::Sync);
    /// while let Ok(event) = sync_rx.recv().await {
    ///     // Alert on divergent replicas
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Asks the worker to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(Command::Shutdown)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}

/// Sending half of a connection.
///
/// Dropping every sender (the worker holds one until disconnect) ends the
/// outbox stream.
#[derive(Clone)]
pub struct ConnectionSender {
    id: ConnectionId,
    command_tx: mpsc::Sender<Command>,
    outbox_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionSender {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub async fn send(&self, envelope: RequestEnvelope) -> Result<()> {
        self.command_tx
            .send(Command::Request {
                connection: self.id,
                envelope,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }

    /// Answers a request that never reached the worker, e.g. unparseable input.
    pub fn reject(&self, id: Option<u64>, code: &str, message: impl Into<String>) -> Result<()> {
        self.outbox_tx
            .send(ServerMessage::error(id, code, message))
            .map_err(|_| RuntimeError::ConnectionClosed)
    }

    /// Tells the worker this connection is gone.
    pub async fn close(self) -> Result<()> {
        self.command_tx
            .send(Command::Disconnect {
                connection: self.id,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)
    }
}

/// One participant's link to the session server.
pub struct Connection {
    sender: ConnectionSender,
    outbox: mpsc::UnboundedReceiver<ServerMessage>,
    /// Room events that arrived while waiting for a response.
    buffered: VecDeque<ServerMessage>,
    next_request_id: u64,
}

impl Connection {
    pub fn id(&self) -> ConnectionId {
        self.sender.id
    }

    pub async fn send(&self, envelope: RequestEnvelope) -> Result<()> {
        self.sender.send(envelope).await
    }

    /// Sends `request` and waits for its response, buffering any room events
    /// that arrive first.
    pub async fn request(&mut self, request: ClientRequest) -> Result<ResponseBody> {
        let id = self.next_request_id;
        self.next_request_id += 1;
        let kind = request.kind();

        self.send(RequestEnvelope::new(Some(id), request)).await?;

        loop {
            let message = self
                .outbox
                .recv()
                .await
                .ok_or(RuntimeError::ConnectionClosed)?;

            match message {
                ServerMessage::Response {
                    id: Some(received),
                    success,
                    error,
                    code,
                    body,
                } if received == id => {
                    if success {
                        return Ok(body);
                    }
                    return Err(RuntimeError::Refused {
                        request: kind,
                        code: code.unwrap_or_default(),
                        message: error.unwrap_or_default(),
                    });
                }
                other => self.buffered.push_back(other),
            }
        }
    }

    /// Next message, buffered events first. `None` once the server dropped
    /// this connection.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        match self.buffered.pop_front() {
            Some(message) => Some(message),
            None => self.outbox.recv().await,
        }
    }

    pub async fn close(self) -> Result<()> {
        self.sender.close().await
    }

    pub fn into_split(self) -> (ConnectionSender, mpsc::UnboundedReceiver<ServerMessage>) {
        (self.sender, self.outbox)
    }
}
