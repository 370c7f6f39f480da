//! Pipeline stages
//!
//! A live pipeline is a chain of spawned tasks:
//!
//! ```text
//!   source ──► Feeder ──► mpsc ──► PacingStage ──► FanOut ──► listeners
//!     ▲
//!     └── file, or the output of an EffectMixer wrapping the previous source
//! ```
//!
//! The feeder owns the source and can hand it back on detach. The pacing
//! stage owns nothing upstream: it stops when its input closes or when it
//! is told to end, and can be gated on a predecessor so two stages never
//! write to the fan-out at once.

pub mod feeder;
pub mod mixer;
pub mod pacing;
pub mod source;

pub use feeder::{Feeder, FeederExit};
pub use mixer::{merge, MergeError};
pub use pacing::{PacingStage, Retirement};
pub use source::AudioSource;
