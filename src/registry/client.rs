//! Per-listener sink and stream types

use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Unique identifier for a listener connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Result of handing one chunk to one sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// Queued for the listener
    Sent,
    /// Listener buffer full, chunk dropped for this listener only
    Dropped,
    /// Listener went away
    Closed,
}

/// Writing half of a listener connection, owned by the registry
#[derive(Debug)]
pub(crate) struct ClientSink {
    tx: mpsc::Sender<Bytes>,
}

impl ClientSink {
    /// Non-blocking write; never waits on a slow listener
    pub(crate) fn deliver(&self, chunk: &Bytes) -> Delivery {
        match self.tx.try_send(chunk.clone()) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Dropped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reading half of a listener connection, handed to the transport layer
///
/// Dropping (or closing) the stream closes the sink; the fan-out prunes the
/// registry entry on its next write.
#[derive(Debug)]
pub struct ClientStream {
    id: ClientId,
    rx: mpsc::Receiver<Bytes>,
}

impl ClientStream {
    /// Connection identifier
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Wait for the next chunk; `None` once the sink is gone
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Take a chunk if one is already buffered
    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }

    /// Mark the listener as gone while keeping buffered chunks readable
    pub fn close(&mut self) {
        self.rx.close();
    }
}

/// Create a connected sink/stream pair
pub(crate) fn pair(id: ClientId, capacity: usize) -> (ClientSink, ClientStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ClientSink { tx }, ClientStream { id, rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_delivers_to_stream() {
        let (sink, mut stream) = pair(ClientId::new(7), 4);

        assert_eq!(sink.deliver(&Bytes::from_static(b"abc")), Delivery::Sent);
        assert_eq!(stream.recv().await.unwrap(), Bytes::from_static(b"abc"));
        assert_eq!(stream.id().to_string(), "client-7");
    }

    #[test]
    fn test_full_buffer_drops() {
        let (sink, _stream) = pair(ClientId::new(1), 1);

        assert_eq!(sink.deliver(&Bytes::from_static(b"a")), Delivery::Sent);
        assert_eq!(sink.deliver(&Bytes::from_static(b"b")), Delivery::Dropped);
    }

    #[test]
    fn test_closed_stream_closes_sink() {
        let (sink, mut stream) = pair(ClientId::new(1), 1);
        assert!(!sink.is_closed());

        stream.close();
        assert!(sink.is_closed());
        assert_eq!(sink.deliver(&Bytes::from_static(b"a")), Delivery::Closed);

        let (sink, stream) = pair(ClientId::new(2), 1);
        drop(stream);
        assert_eq!(sink.deliver(&Bytes::from_static(b"a")), Delivery::Closed);
    }
}
