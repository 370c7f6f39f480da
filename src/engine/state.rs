//! Broadcast state machine

use std::fmt;

/// Externally visible broadcast state
///
/// Effect splicing happens within `Streaming`; callers never observe the
/// broadcast stopping because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastState {
    /// No pipeline feeds the fan-out
    Idle,
    /// Exactly one live pipeline feeds the fan-out
    Streaming,
}

impl fmt::Display for BroadcastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastState::Idle => write!(f, "idle"),
            BroadcastState::Streaming => write!(f, "streaming"),
        }
    }
}

/// Steps of a live effect splice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewirePhase {
    /// Next pacing stage is wired and gated; waiting for the source to be
    /// released by the current feeder
    PendingDetach,
    /// Source released; building the mixed source
    Merging,
    /// Mixed source feeds the next pacing stage, which is now current
    Installed,
}

impl fmt::Display for RewirePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewirePhase::PendingDetach => write!(f, "pending-detach"),
            RewirePhase::Merging => write!(f, "merging"),
            RewirePhase::Installed => write!(f, "installed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(BroadcastState::Idle.to_string(), "idle");
        assert_eq!(BroadcastState::Streaming.to_string(), "streaming");
        assert_eq!(RewirePhase::PendingDetach.to_string(), "pending-detach");
        assert_eq!(RewirePhase::Installed.to_string(), "installed");
    }
}
