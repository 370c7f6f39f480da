//! Media inspection
//!
//! The engine never decodes audio itself; it only needs the encoded bit rate
//! of a source to pace it at real-time speed.

pub mod bitrate;

pub use bitrate::{probe, probe_or_fallback, BitRate};
