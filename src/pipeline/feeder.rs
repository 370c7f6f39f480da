//! Source feeder
//!
//! Pulls chunks from a source into a pacing stage's input. Pulling is
//! governed by the pacing stage: the input channel is small, so the feeder
//! only reads ahead as fast as chunks are paced out.

use std::io;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::source::{unread, AudioSource};

/// Why a feeder stopped
pub enum FeederExit {
    /// Detached on request; the source is handed back unharmed, including
    /// any chunk that was read but not yet forwarded
    Detached(AudioSource),
    /// The source reached end of stream
    Exhausted,
    /// The pacing stage stopped accepting input
    Abandoned,
    /// Reading the source failed
    Failed(io::Error),
}

impl std::fmt::Debug for FeederExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeederExit::Detached(_) => write!(f, "Detached"),
            FeederExit::Exhausted => write!(f, "Exhausted"),
            FeederExit::Abandoned => write!(f, "Abandoned"),
            FeederExit::Failed(e) => write!(f, "Failed({})", e),
        }
    }
}

/// Handle to a running feeder task
///
/// Dropping the handle stops the feeder and drops its source.
pub struct Feeder {
    detach: Option<oneshot::Sender<()>>,
    handle: JoinHandle<FeederExit>,
}

impl Feeder {
    /// Start pumping `source` into `output` in reads of `chunk_size` bytes
    pub fn spawn(source: AudioSource, output: mpsc::Sender<Bytes>, chunk_size: usize) -> Self {
        let (detach_tx, detach_rx) = oneshot::channel();
        let handle = tokio::spawn(run(source, output, chunk_size.max(1), detach_rx));

        Self {
            detach: Some(detach_tx),
            handle,
        }
    }

    /// Whether the feeder has stopped on its own
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop pulling and wait until the source is released
    ///
    /// Resolves exactly once, after the feeder has fully let go of the
    /// source and of the pacing input.
    pub async fn detach(mut self) -> FeederExit {
        if let Some(tx) = self.detach.take() {
            let _ = tx.send(());
        }

        match (&mut self.handle).await {
            Ok(exit) => exit,
            Err(e) => FeederExit::Failed(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }
}

async fn run(
    mut source: AudioSource,
    output: mpsc::Sender<Bytes>,
    chunk_size: usize,
    mut detach: oneshot::Receiver<()>,
) -> FeederExit {
    let mut buf = vec![0u8; chunk_size];

    loop {
        // A dropped handle resolves the receiver too, which stops the feeder
        let n = tokio::select! {
            biased;
            _ = &mut detach => return FeederExit::Detached(source),
            read = source.read(&mut buf) => match read {
                Ok(0) => return FeederExit::Exhausted,
                Ok(n) => n,
                Err(e) => return FeederExit::Failed(e),
            },
        };
        let chunk = Bytes::copy_from_slice(&buf[..n]);

        let permit = tokio::select! {
            biased;
            _ = &mut detach => return FeederExit::Detached(unread(Some(chunk), source)),
            permit = output.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => return FeederExit::Abandoned,
            },
        };
        permit.send(chunk);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn memory_source(data: &[u8]) -> AudioSource {
        Box::new(Cursor::new(data.to_vec()))
    }

    #[tokio::test]
    async fn test_feeds_until_exhausted() {
        let (tx, mut rx) = mpsc::channel(8);
        let feeder = Feeder::spawn(memory_source(b"abcdefg"), tx, 3);

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.extend_from_slice(&chunk);
        }

        assert_eq!(received, b"abcdefg");
        assert!(matches!(feeder.detach().await, FeederExit::Exhausted));
    }

    #[tokio::test]
    async fn test_detach_returns_unsent_bytes() {
        // Capacity one: the first chunk is queued, the second waits for room
        let (tx, mut rx) = mpsc::channel(1);
        let feeder = Feeder::spawn(memory_source(b"aabbccdd"), tx, 2);

        tokio::task::yield_now().await;
        let exit = feeder.detach().await;

        let mut forwarded = Vec::new();
        while let Some(chunk) = rx.recv().await {
            forwarded.extend_from_slice(&chunk);
        }

        let mut rest = Vec::new();
        match exit {
            FeederExit::Detached(mut source) => {
                source.read_to_end(&mut rest).await.unwrap();
            }
            other => panic!("unexpected exit: {:?}", other),
        }

        // Nothing lost, nothing duplicated across the detach point
        forwarded.extend_from_slice(&rest);
        assert_eq!(forwarded, b"aabbccdd");
    }

    #[tokio::test]
    async fn test_closed_output_abandons() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let feeder = Feeder::spawn(memory_source(b"abc"), tx, 1);
        let exit = feeder.detach().await;

        // Either branch may win; both release the source
        assert!(matches!(
            exit,
            FeederExit::Abandoned | FeederExit::Detached(_)
        ));
    }
}
