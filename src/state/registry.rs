//! Live player connections and fan-out.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identity of one WebSocket session.
pub type ConnectionId = Uuid;

#[derive(Clone, Debug)]
/// Handle used to push messages to a connected player.
pub struct PlayerConnection {
    pub id: ConnectionId,
    /// Transport-level peer identity, used as the claimant for answer locks.
    pub peer: String,
    pub tx: mpsc::UnboundedSender<Message>,
}

impl PlayerConnection {
    /// Create a handle with a fresh identifier.
    pub fn new(peer: impl Into<String>, tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: Uuid::new_v4(),
            peer: peer.into(),
            tx,
        }
    }

    /// Queue a text frame; fails once the writer side has gone away.
    fn send_text(&self, text: &str) -> bool {
        self.tx.send(Message::Text(text.into())).is_ok()
    }
}

/// Registry of active player sockets keyed by their identifier.
///
/// Broadcasts iterate over a snapshot of the senders so that connections may join or leave
/// concurrently; failed recipients are removed after the snapshot is released.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, PlayerConnection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `connection` eligible for broadcasts.
    pub fn register(&self, connection: PlayerConnection) {
        debug!(connection = %connection.id, peer = %connection.peer, "registering connection");
        self.connections.insert(connection.id, connection);
    }

    /// Forget a connection. Unknown identifiers are ignored; returns whether one was removed.
    pub fn unregister(&self, id: &ConnectionId) -> bool {
        self.connections.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Send `text` to a single connection, unregistering it when its writer is gone.
    pub fn deliver(&self, connection: &PlayerConnection, text: &str) -> bool {
        if connection.send_text(text) {
            return true;
        }
        warn!(connection = %connection.id, "send failed (writer closed), removing connection");
        self.unregister(&connection.id);
        false
    }

    /// Send `text` to every registered connection; returns how many accepted it.
    pub fn broadcast_text(&self, text: &str) -> usize {
        let recipients: Vec<PlayerConnection> = self
            .connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut delivered = 0;
        let mut failed = Vec::new();
        for connection in &recipients {
            if connection.send_text(text) {
                delivered += 1;
            } else {
                failed.push(connection.id);
            }
        }

        for id in failed {
            warn!(connection = %id, "broadcast failed (writer closed), removing connection");
            self.unregister(&id);
        }

        delivered
    }

    /// Ask every writer to close its socket and empty the registry.
    pub fn close_all(&self) -> usize {
        let ids: Vec<ConnectionId> = self.connections.iter().map(|entry| *entry.key()).collect();
        let mut closed = 0;
        for id in ids {
            if let Some((_, connection)) = self.connections.remove(&id) {
                let _ = connection.tx.send(Message::Close(None));
                closed += 1;
            }
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(peer: &str) -> (PlayerConnection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (PlayerConnection::new(peer, tx), rx)
    }

    fn texts(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let Message::Text(text) = message {
                out.push(text.as_str().to_owned());
            }
        }
        out
    }

    #[test]
    fn broadcast_reaches_every_registered_connection() {
        let registry = ConnectionRegistry::new();
        let (a, mut rx_a) = connection("10.0.0.1");
        let (b, mut rx_b) = connection("10.0.0.2");
        registry.register(a);
        registry.register(b);

        assert_eq!(registry.broadcast_text("New question: 2+2?"), 2);
        assert_eq!(texts(&mut rx_a), vec!["New question: 2+2?"]);
        assert_eq!(texts(&mut rx_b), vec!["New question: 2+2?"]);
    }

    #[test]
    fn unregister_is_idempotent_and_tolerates_unknown_ids() {
        let registry = ConnectionRegistry::new();
        let (a, _rx_a) = connection("10.0.0.1");
        let (b, mut rx_b) = connection("10.0.0.2");
        let a_id = a.id;
        registry.register(a);
        registry.register(b);

        assert!(registry.unregister(&a_id));
        assert!(!registry.unregister(&a_id));
        assert!(!registry.unregister(&Uuid::new_v4()));

        assert_eq!(registry.broadcast_text("hello"), 1);
        assert_eq!(texts(&mut rx_b), vec!["hello"]);
    }

    #[test]
    fn failing_connection_is_dropped_without_affecting_others() {
        let registry = ConnectionRegistry::new();
        let (dead, rx_dead) = connection("10.0.0.1");
        let (alive, mut rx_alive) = connection("10.0.0.2");
        let dead_id = dead.id;
        registry.register(dead);
        registry.register(alive);
        drop(rx_dead);

        assert_eq!(registry.broadcast_text("round over"), 1);
        assert_eq!(registry.len(), 1);
        assert!(!registry.unregister(&dead_id), "evicted on send failure");
        assert_eq!(texts(&mut rx_alive), vec!["round over"]);
    }

    #[test]
    fn deliver_unregisters_on_failure() {
        let registry = ConnectionRegistry::new();
        let (player, rx) = connection("10.0.0.1");
        registry.register(player.clone());

        assert!(registry.deliver(&player, "hi"));
        drop(rx);
        assert!(!registry.deliver(&player, "hi again"));
        assert!(registry.is_empty());
    }

    #[test]
    fn close_all_sends_close_frames_and_clears() {
        let registry = ConnectionRegistry::new();
        let (player, mut rx) = connection("10.0.0.1");
        registry.register(player);

        assert_eq!(registry.close_all(), 1);
        assert!(registry.is_empty());
        assert!(matches!(rx.try_recv(), Ok(Message::Close(None))));
    }
}
