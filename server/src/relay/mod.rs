pub mod connection;
pub mod listener;
pub mod router;

use dashmap::DashMap;
use sqlx::SqlitePool;
use tokio::sync::mpsc;

use crate::config::RelayConfig;
use crate::discord::DiscordClient;
use crate::protocol::identification::ProfileResolver;

/// Live game-server connections, keyed by entity id. Server-bound traffic is
/// written through the registered sender; a server that is offline simply
/// has no entry and the delivery is skipped.
#[derive(Default)]
pub struct ConnectionRegistry {
    senders: DashMap<String, mpsc::UnboundedSender<Vec<u8>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection's outbound sender to an entity id. A reconnecting
    /// server replaces its stale entry.
    pub fn register(&self, entity_id: &str, tx: mpsc::UnboundedSender<Vec<u8>>) {
        self.senders.insert(entity_id.to_string(), tx);
    }

    pub fn unregister(&self, entity_id: &str) {
        self.senders.remove(entity_id);
    }

    /// Queue a frame for an entity's connection. Returns false when the
    /// entity has no live connection (or its writer has gone away).
    pub fn send(&self, entity_id: &str, frame: Vec<u8>) -> bool {
        match self.senders.get(entity_id) {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    pub fn connected_count(&self) -> usize {
        self.senders.len()
    }
}

/// Shared state handed to every connection task.
pub struct RelayState {
    pub db: SqlitePool,
    pub config: RelayConfig,
    pub discord: DiscordClient,
    pub resolver: ProfileResolver,
    pub registry: ConnectionRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_register_send_unregister() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert!(!registry.send("tf2-east", vec![1]));

        registry.register("tf2-east", tx);
        assert_eq!(registry.connected_count(), 1);
        assert!(registry.send("tf2-east", vec![1, 2]));
        assert_eq!(rx.try_recv().unwrap(), vec![1, 2]);

        registry.unregister("tf2-east");
        assert!(!registry.send("tf2-east", vec![3]));
        assert_eq!(registry.connected_count(), 0);
    }

    #[test]
    fn test_registry_send_to_dropped_receiver() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.register("srv", tx);
        drop(rx);
        assert!(!registry.send("srv", vec![0]));
    }
}
