//! Fan-out sink
//!
//! Single write entry point feeding every registered listener.

use std::sync::Arc;

use bytes::Bytes;

use crate::stats::BroadcastCounters;

use super::client::{ClientId, Delivery};
use super::store::ClientRegistry;

/// Outcome of one fan-out write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Listeners that received the chunk
    pub delivered: usize,
    /// Listeners that skipped the chunk because their buffer was full
    pub dropped: usize,
    /// Entries pruned because their sink had closed
    pub pruned: usize,
}

/// Write destination shared by the engine's pacing stages
///
/// Cheap to clone; all clones feed the same registry.
#[derive(Clone)]
pub struct FanOut {
    registry: Arc<ClientRegistry>,
    counters: Arc<BroadcastCounters>,
}

impl FanOut {
    /// Create a fan-out over the given registry
    pub fn new(registry: Arc<ClientRegistry>, counters: Arc<BroadcastCounters>) -> Self {
        Self { registry, counters }
    }

    /// Get the registry this fan-out feeds
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Write a chunk to every open listener
    ///
    /// Never waits on, or fails because of, an individual listener. Closed
    /// sinks are pruned lazily here.
    pub async fn write(&self, chunk: Bytes) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut closed: Vec<ClientId> = Vec::new();

        {
            let clients = self.registry.clients.read().await;
            for (id, sink) in clients.iter() {
                if sink.is_closed() {
                    closed.push(*id);
                    continue;
                }
                match sink.deliver(&chunk) {
                    Delivery::Sent => report.delivered += 1,
                    Delivery::Dropped => {
                        report.dropped += 1;
                        tracing::trace!(client = %id, bytes = chunk.len(), "Listener buffer full, chunk dropped");
                    }
                    Delivery::Closed => closed.push(*id),
                }
            }
        }

        if !closed.is_empty() {
            let mut clients = self.registry.clients.write().await;
            for id in closed {
                // An explicit unregister may have won the race
                if clients.remove(&id).is_some() {
                    report.pruned += 1;
                    tracing::debug!(client = %id, "Listener closed, pruned");
                }
            }
        }

        self.counters
            .record_chunk(chunk.len(), report.dropped as u64, report.pruned as u64);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fan_out(registry: &Arc<ClientRegistry>) -> FanOut {
        FanOut::new(Arc::clone(registry), Arc::new(BroadcastCounters::new()))
    }

    #[tokio::test]
    async fn test_write_reaches_every_listener_in_order() {
        let registry = Arc::new(ClientRegistry::new());
        let fanout = fan_out(&registry);
        let (_, mut a) = registry.register().await;
        let (_, mut b) = registry.register().await;

        fanout.write(Bytes::from_static(b"one")).await;
        let report = fanout.write(Bytes::from_static(b"two")).await;

        assert_eq!(report.delivered, 2);
        for stream in [&mut a, &mut b] {
            assert_eq!(stream.recv().await.unwrap(), Bytes::from_static(b"one"));
            assert_eq!(stream.recv().await.unwrap(), Bytes::from_static(b"two"));
        }
    }

    #[tokio::test]
    async fn test_closed_listener_is_pruned_once() {
        let registry = Arc::new(ClientRegistry::new());
        let fanout = fan_out(&registry);
        let (gone, stream) = registry.register().await;
        let (_, mut alive) = registry.register().await;
        drop(stream);

        let report = fanout.write(Bytes::from_static(b"x")).await;
        assert_eq!(report.pruned, 1);
        assert_eq!(report.delivered, 1);
        assert!(!registry.contains(gone).await);

        // Already pruned: neither a second write nor unregister finds it
        let report = fanout.write(Bytes::from_static(b"y")).await;
        assert_eq!(report.pruned, 0);
        assert!(!registry.unregister(gone).await);

        assert_eq!(alive.recv().await.unwrap(), Bytes::from_static(b"x"));
        assert_eq!(alive.recv().await.unwrap(), Bytes::from_static(b"y"));
    }

    #[tokio::test]
    async fn test_slow_listener_does_not_block_others() {
        let registry = Arc::new(ClientRegistry::with_buffer(1));
        let fanout = fan_out(&registry);
        let (slow, _slow_stream) = registry.register().await;
        let (_, mut fast) = registry.register().await;

        fanout.write(Bytes::from_static(b"1")).await;
        assert_eq!(fast.recv().await.unwrap(), Bytes::from_static(b"1"));

        let report = fanout.write(Bytes::from_static(b"2")).await;
        assert_eq!(report.dropped, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(fast.recv().await.unwrap(), Bytes::from_static(b"2"));

        // Full is not closed: the slow listener stays registered
        assert!(registry.contains(slow).await);
    }

    #[tokio::test]
    async fn test_write_without_listeners() {
        let registry = Arc::new(ClientRegistry::new());
        let counters = Arc::new(BroadcastCounters::new());
        let fanout = FanOut::new(Arc::clone(&registry), Arc::clone(&counters));

        let report = fanout.write(Bytes::from_static(b"abcd")).await;
        assert_eq!(report, FanOutReport::default());
        assert_eq!(counters.snapshot().bytes_broadcast, 4);
    }
}
