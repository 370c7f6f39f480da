//! Live audio broadcast engine
//!
//! One audio source is paced to real-time playback speed and fanned out to
//! any number of connected listeners. Operators can start and stop the
//! broadcast and splice sound effects into the live mix without
//! disconnecting anyone.
//!
//! Audio analysis and mixing are delegated to an external tool (`sox` by
//! default) driven through its standard channels; the engine itself only
//! decides when and how streams are connected.
//!
//! # Example
//!
//! ```no_run
//! use airwave::{BroadcastEngine, EngineConfig};
//!
//! # async fn example() -> airwave::Result<()> {
//! let config = EngineConfig::with_source("audio/songs/conversation.mp3")
//!     .effects_dir("audio/fx");
//! let engine = BroadcastEngine::new(config);
//!
//! let (_id, mut listener) = engine.register().await;
//! engine.start().await?;
//! engine.inject_effect("applause").await?;
//!
//! while let Some(chunk) = listener.recv().await {
//!     // write chunk to the listener's socket
//!     # let _ = chunk;
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod engine;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod registry;
pub mod stats;
pub mod tool;

pub use catalog::EffectCatalog;
pub use engine::{BroadcastEngine, BroadcastState, CommandOutcome, EngineConfig, RewirePhase};
pub use error::{Error, ProbeError, Result};
pub use media::BitRate;
pub use registry::{ClientId, ClientRegistry, ClientStream, FanOut};
pub use stats::BroadcastStats;
pub use tool::{AudioTool, MemoryTool, SoxTool};
