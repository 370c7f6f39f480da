//! Broadcast engine
//!
//! The controller owns the live pipeline and performs start, stop and live
//! effect splicing. Listeners are managed through the shared registry and
//! never notice a pipeline change.

pub mod command;
pub mod config;
pub mod controller;
pub mod state;

pub use command::CommandOutcome;
pub use config::EngineConfig;
pub use controller::BroadcastEngine;
pub use state::{BroadcastState, RewirePhase};
