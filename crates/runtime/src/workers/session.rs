//! Session worker that owns every room.
//!
//! Receives commands from [`ServerHandle`](crate::api::ServerHandle) and
//! connections, applies them to the [`SessionStore`] one at a time, and routes
//! the resulting messages into per-connection outboxes. The requester's
//! response is always queued before any notice the request caused.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::{ConnectionId, ServerStats};
use crate::events::EventBus;
use crate::protocol::{RequestEnvelope, ServerMessage};
use crate::session::{Notice, SessionStore};

/// Commands that can be sent to the session worker
pub enum Command {
    /// Registers an outbox and returns the new connection's id.
    Connect {
        outbox: mpsc::UnboundedSender<ServerMessage>,
        reply: oneshot::Sender<ConnectionId>,
    },
    /// A parsed request from a connection. Answered through its outbox.
    Request {
        connection: ConnectionId,
        envelope: RequestEnvelope,
    },
    /// The transport behind `connection` is gone.
    Disconnect { connection: ConnectionId },
    Stats { reply: oneshot::Sender<ServerStats> },
    /// Sweep idle rooms now; replies with the number closed.
    Sweep { reply: oneshot::Sender<usize> },
    Shutdown,
}

/// Background task that processes session commands.
pub struct SessionWorker {
    store: SessionStore,
    outboxes: HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
    next_connection: u64,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    sweep_interval: Duration,
}

impl SessionWorker {
    pub fn new(
        store: SessionStore,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            store,
            outboxes: HashMap::new(),
            next_connection: 1,
            command_rx,
            event_bus,
            sweep_interval,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let mut sweep = time::interval_at(Instant::now() + self.sweep_interval, self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("all handles dropped");
                        break;
                    };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                _ = sweep.tick() => {
                    self.sweep(Instant::now());
                }
            }
        }

        info!(
            rooms = self.store.room_count(),
            connections = self.outboxes.len(),
            "session worker stopped"
        );
    }

    /// Returns `false` once the worker should stop.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Connect { outbox, reply } => {
                let id = ConnectionId(self.next_connection);
                self.next_connection += 1;
                self.outboxes.insert(id, outbox);
                debug!(connection = %id, "connection opened");
                if reply.send(id).is_err() {
                    debug!("Connect reply channel closed (caller dropped)");
                    self.disconnect(id);
                }
            }
            Command::Request {
                connection,
                envelope,
            } => self.handle_request(connection, envelope),
            Command::Disconnect { connection } => self.disconnect(connection),
            Command::Stats { reply } => {
                let stats = ServerStats {
                    rooms: self.store.room_count(),
                    connections: self.outboxes.len(),
                    participants: self.store.participant_count(),
                };
                if reply.send(stats).is_err() {
                    debug!("Stats reply channel closed (caller dropped)");
                }
            }
            Command::Sweep { reply } => {
                let closed = self.sweep(Instant::now());
                if reply.send(closed).is_err() {
                    debug!("Sweep reply channel closed (caller dropped)");
                }
            }
            Command::Shutdown => return false,
        }
        true
    }

    fn handle_request(&mut self, connection: ConnectionId, envelope: RequestEnvelope) {
        let RequestEnvelope { id, request } = envelope;
        let kind = request.kind();

        let (response, notices) = match self.store.handle(connection, request, Instant::now()) {
            Ok(reply) => (ServerMessage::ok(id, reply.body), reply.notices),
            Err(err) => {
                debug!(%connection, request = kind, code = err.code(), "request refused: {err}");
                (ServerMessage::error(id, err.code(), err.to_string()), Vec::new())
            }
        };

        self.deliver(connection, response);
        self.route(notices);
        self.publish_events();
    }

    fn disconnect(&mut self, connection: ConnectionId) {
        if self.outboxes.remove(&connection).is_none() {
            return;
        }
        debug!(%connection, "connection closed");
        let notices = self.store.disconnect(connection, Instant::now());
        self.route(notices);
        self.publish_events();
    }

    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.store.room_count();
        let notices = self.store.sweep(now);
        let closed = before - self.store.room_count();
        if closed > 0 {
            info!(closed, remaining = self.store.room_count(), "expired idle rooms");
        }
        self.route(notices);
        self.publish_events();
        closed
    }

    fn route(&mut self, notices: Vec<Notice>) {
        for Notice { to, message } in notices {
            self.deliver(to, message);
        }
    }

    fn deliver(&mut self, to: ConnectionId, message: ServerMessage) {
        let Some(outbox) = self.outboxes.get(&to) else {
            return;
        };
        if outbox.send(message).is_err() {
            warn!(connection = %to, "outbox closed without disconnect; dropping connection");
            self.disconnect(to);
        }
    }

    fn publish_events(&mut self) {
        for event in self.store.drain_events() {
            self.event_bus.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use game_content::CharacterRoster;

    use super::*;

    #[tokio::test]
    async fn worker_stops_when_every_sender_is_dropped() {
        let roster = CharacterRoster::bundled().expect("bundled roster");
        let store = SessionStore::new(
            Arc::new(roster),
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        let (command_tx, command_rx) = mpsc::channel(8);
        let worker = SessionWorker::new(store, command_rx, EventBus::new(), Duration::from_millis(5));
        let task = tokio::spawn(worker.run());

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(command_tx);

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("worker exits")
            .expect("worker task");
    }
}
