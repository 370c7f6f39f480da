//! Client registry implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::client::{pair, ClientId, ClientSink, ClientStream};

/// Default number of chunks buffered per listener
pub const DEFAULT_CLIENT_BUFFER: usize = 1024;

/// Registry of connected listeners
///
/// Owned by the engine and shared with the transport layer through `Arc`.
/// Entries are removed exactly once: by `unregister` or by fan-out pruning.
pub struct ClientRegistry {
    /// Map of connection id to open sink
    pub(super) clients: RwLock<HashMap<ClientId, ClientSink>>,

    /// Next connection id to allocate
    next_id: AtomicU64,

    /// Per-listener buffer depth in chunks
    buffer_chunks: usize,
}

impl ClientRegistry {
    /// Create a registry with the default listener buffer depth
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_CLIENT_BUFFER)
    }

    /// Create a registry buffering up to `chunks` chunks per listener
    pub fn with_buffer(chunks: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_chunks: chunks.max(1),
        }
    }

    /// Register a new listener
    ///
    /// The returned stream is immediately eligible for fan-out writes; it
    /// simply receives nothing until a broadcast is live.
    pub async fn register(&self) -> (ClientId, ClientStream) {
        let id = ClientId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sink, stream) = pair(id, self.buffer_chunks);

        let mut clients = self.clients.write().await;
        clients.insert(id, sink);

        tracing::info!(client = %id, clients = clients.len(), "Client registered");

        (id, stream)
    }

    /// Remove a listener; no-op if it is already gone
    ///
    /// Returns whether an entry was removed.
    pub async fn unregister(&self, id: ClientId) -> bool {
        let removed = self.clients.write().await.remove(&id).is_some();

        if removed {
            tracing::info!(client = %id, "Closing connection");
        }

        removed
    }

    /// Check whether a listener is registered
    pub async fn contains(&self, id: ClientId) -> bool {
        self.clients.read().await.contains_key(&id)
    }

    /// Identifiers of all registered listeners
    pub async fn ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.clients.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of registered listeners
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Whether no listener is registered
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_allocates_unique_ids() {
        let registry = ClientRegistry::new();

        let (a, stream_a) = registry.register().await;
        let (b, stream_b) = registry.register().await;

        assert_ne!(a, b);
        assert_eq!(stream_a.id(), a);
        assert_eq!(stream_b.id(), b);
        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.ids().await, vec![a, b]);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = ClientRegistry::new();
        let (id, _stream) = registry.register().await;

        assert!(registry.unregister(id).await);
        assert!(!registry.unregister(id).await);
        assert!(!registry.contains(id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_ids_not_reused() {
        let registry = ClientRegistry::new();

        let (first, _) = registry.register().await;
        registry.unregister(first).await;
        let (second, _) = registry.register().await;

        assert!(second > first);
    }
}
