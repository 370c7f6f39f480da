//! Broadcast statistics

pub mod metrics;

pub use metrics::{BroadcastCounters, BroadcastStats};
