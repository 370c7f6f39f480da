//! Pacing stage
//!
//! Rate-limits the bytes flowing from a source into the fan-out so that
//! listeners receive audio at real-time playback speed rather than as a
//! bulk transfer.
//!
//! Chunks are cut into slices of a tenth of a second of audio. Each slice is
//! released no earlier than the instant at which the bytes already emitted
//! would have finished playing.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::registry::FanOut;

/// Slices per second of audio
const SLICES_PER_SEC: u64 = 10;

/// Resolves once a pacing stage has written its last byte
#[derive(Clone)]
pub struct Retirement {
    rx: watch::Receiver<bool>,
}

impl Retirement {
    /// Wait for the stage to retire
    pub async fn wait(mut self) {
        // A dropped sender also means the stage is gone
        let _ = self.rx.wait_for(|retired| *retired).await;
    }

    /// Whether the stage has already retired
    pub fn is_retired(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Handle to a running pacing stage
///
/// Dropping the handle ends the stage.
pub struct PacingStage {
    byte_rate: u64,
    end: Option<oneshot::Sender<()>>,
    retired: watch::Receiver<bool>,
    handle: JoinHandle<u64>,
}

impl PacingStage {
    /// Spawn a stage pacing at `byte_rate` bytes/sec into `fanout`
    ///
    /// Returns the stage and the sender feeding it. The stage keeps running
    /// until that sender (and every clone) is dropped and the queue is
    /// drained, or until [`end`](Self::end) is called. With a predecessor,
    /// nothing is written before the predecessor has retired, and this
    /// stage never retires before its predecessor does.
    pub fn spawn(
        byte_rate: u64,
        fanout: FanOut,
        queue_chunks: usize,
        predecessor: Option<Retirement>,
    ) -> (Self, mpsc::Sender<Bytes>) {
        let byte_rate = byte_rate.max(1);
        let (input_tx, input_rx) = mpsc::channel(queue_chunks.max(1));
        let (end_tx, end_rx) = oneshot::channel();
        let (retired_tx, retired_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let emitted = run(byte_rate, fanout, input_rx, end_rx, predecessor.clone()).await;
            // Ended early: still retire after the predecessor
            if let Some(predecessor) = predecessor {
                predecessor.wait().await;
            }
            let _ = retired_tx.send(true);
            emitted
        });

        let stage = Self {
            byte_rate,
            end: Some(end_tx),
            retired: retired_rx,
            handle,
        };

        (stage, input_tx)
    }

    /// Target rate in bytes per second
    pub fn byte_rate(&self) -> u64 {
        self.byte_rate
    }

    /// Signal end of stream
    ///
    /// The stage stops at once, discarding queued input, and writes nothing
    /// further to the fan-out.
    pub fn end(&mut self) {
        if let Some(tx) = self.end.take() {
            let _ = tx.send(());
        }
    }

    /// Whether the stage has stopped
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished() || *self.retired.borrow()
    }

    /// Signal that resolves when this stage retires
    pub fn retirement(&self) -> Retirement {
        Retirement {
            rx: self.retired.clone(),
        }
    }

    /// Wait for the stage (and any predecessor) to stop, returning the
    /// bytes this stage emitted
    pub async fn finished(mut self) -> u64 {
        (&mut self.handle).await.unwrap_or(0)
    }
}

/// Byte-rate clock
struct Throttle {
    byte_rate: u64,
    slice: usize,
    started: Option<Instant>,
    emitted: u64,
}

impl Throttle {
    fn new(byte_rate: u64) -> Self {
        Self {
            byte_rate,
            slice: (byte_rate / SLICES_PER_SEC).max(1) as usize,
            started: None,
            emitted: 0,
        }
    }

    /// Instant at which everything emitted so far has played out
    fn deadline(&mut self) -> Instant {
        let started = *self.started.get_or_insert_with(Instant::now);
        started + Duration::from_secs_f64(self.emitted as f64 / self.byte_rate as f64)
    }

    fn record(&mut self, bytes: usize) {
        self.emitted += bytes as u64;
    }
}

async fn run(
    byte_rate: u64,
    fanout: FanOut,
    mut input: mpsc::Receiver<Bytes>,
    mut end: oneshot::Receiver<()>,
    predecessor: Option<Retirement>,
) -> u64 {
    if let Some(predecessor) = predecessor {
        tokio::select! {
            biased;
            _ = &mut end => return 0,
            _ = predecessor.wait() => {}
        }
    }

    let mut throttle = Throttle::new(byte_rate);

    loop {
        let mut chunk = tokio::select! {
            biased;
            _ = &mut end => break,
            chunk = input.recv() => match chunk {
                Some(chunk) => chunk,
                None => break,
            },
        };

        while !chunk.is_empty() {
            let slice = chunk.split_to(throttle.slice.min(chunk.len()));

            tokio::select! {
                biased;
                _ = &mut end => return throttle.emitted,
                _ = sleep_until(throttle.deadline()) => {}
            }

            let len = slice.len();
            fanout.write(slice).await;
            throttle.record(len);
        }
    }

    throttle.emitted
}
