//! Statistics and metrics for the broadcast engine

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Point-in-time broadcast statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastStats {
    /// Total bytes handed to the fan-out
    pub bytes_broadcast: u64,
    /// Total chunks handed to the fan-out
    pub chunks_broadcast: u64,
    /// Listener entries removed because their sink had closed
    pub clients_pruned: u64,
    /// Chunks dropped for a single listener whose buffer was full
    pub chunks_dropped: u64,
    /// Pipelines started (including re-arms)
    pub pipelines_started: u64,
    /// Effects spliced into the live mix
    pub effects_injected: u64,
    /// Time since the engine was created
    pub uptime: Duration,
}

impl BroadcastStats {
    /// Average fan-out throughput in bits per second over the uptime
    pub fn bitrate(&self) -> u64 {
        let secs = self.uptime.as_secs();
        if secs > 0 {
            (self.bytes_broadcast * 8) / secs
        } else {
            0
        }
    }
}

/// Live counters shared by the fan-out and the controller
#[derive(Debug)]
pub struct BroadcastCounters {
    started_at: Instant,
    bytes_broadcast: AtomicU64,
    chunks_broadcast: AtomicU64,
    clients_pruned: AtomicU64,
    chunks_dropped: AtomicU64,
    pipelines_started: AtomicU64,
    effects_injected: AtomicU64,
}

impl BroadcastCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            bytes_broadcast: AtomicU64::new(0),
            chunks_broadcast: AtomicU64::new(0),
            clients_pruned: AtomicU64::new(0),
            chunks_dropped: AtomicU64::new(0),
            pipelines_started: AtomicU64::new(0),
            effects_injected: AtomicU64::new(0),
        }
    }

    /// Record one chunk written to the fan-out
    pub fn record_chunk(&self, bytes: usize, dropped: u64, pruned: u64) {
        self.bytes_broadcast.fetch_add(bytes as u64, Ordering::Relaxed);
        self.chunks_broadcast.fetch_add(1, Ordering::Relaxed);
        self.chunks_dropped.fetch_add(dropped, Ordering::Relaxed);
        self.clients_pruned.fetch_add(pruned, Ordering::Relaxed);
    }

    pub fn record_pipeline_started(&self) {
        self.pipelines_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_effect_injected(&self) {
        self.effects_injected.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot
    pub fn snapshot(&self) -> BroadcastStats {
        BroadcastStats {
            bytes_broadcast: self.bytes_broadcast.load(Ordering::Relaxed),
            chunks_broadcast: self.chunks_broadcast.load(Ordering::Relaxed),
            clients_pruned: self.clients_pruned.load(Ordering::Relaxed),
            chunks_dropped: self.chunks_dropped.load(Ordering::Relaxed),
            pipelines_started: self.pipelines_started.load(Ordering::Relaxed),
            effects_injected: self.effects_injected.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for BroadcastCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let stats = BroadcastCounters::new().snapshot();
        assert_eq!(stats.bytes_broadcast, 0);
        assert_eq!(stats.chunks_broadcast, 0);
        assert_eq!(stats.clients_pruned, 0);
        assert_eq!(stats.chunks_dropped, 0);
        assert_eq!(stats.pipelines_started, 0);
        assert_eq!(stats.effects_injected, 0);
    }

    #[test]
    fn test_record_chunk() {
        let counters = BroadcastCounters::new();
        counters.record_chunk(4096, 1, 0);
        counters.record_chunk(1024, 0, 2);
        counters.record_effect_injected();
        counters.record_pipeline_started();

        let stats = counters.snapshot();
        assert_eq!(stats.bytes_broadcast, 5120);
        assert_eq!(stats.chunks_broadcast, 2);
        assert_eq!(stats.chunks_dropped, 1);
        assert_eq!(stats.clients_pruned, 2);
        assert_eq!(stats.effects_injected, 1);
        assert_eq!(stats.pipelines_started, 1);
    }

    #[test]
    fn test_bitrate() {
        let stats = BroadcastStats {
            bytes_broadcast: 160_000,
            uptime: Duration::from_secs(10),
            ..Default::default()
        };

        // 160,000 bytes * 8 bits / 10 seconds = 128,000 bps
        assert_eq!(stats.bitrate(), 128_000);
    }

    #[test]
    fn test_bitrate_zero_duration() {
        let stats = BroadcastStats {
            bytes_broadcast: 1_000_000,
            ..Default::default()
        };

        assert_eq!(stats.bitrate(), 0);
    }
}
