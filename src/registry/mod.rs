//! Listener registry and fan-out
//!
//! The registry maps connection identifiers to open client sinks. The
//! fan-out sink is the single write destination for the live pacing stage:
//! every chunk it receives is handed to every still-open client.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<ClientRegistry>
//!                  ┌──────────────────────────┐
//!                  │ clients: HashMap<Id,     │
//!                  │   ClientSink (mpsc::Tx)> │
//!                  └────────────┬─────────────┘
//!                               │
//!   [Pacing stage] ──► FanOut::write() ──┬──► ClientStream ──► listener
//!                                        ├──► ClientStream ──► listener
//!                                        └──► (closed: pruned)
//! ```
//!
//! # Zero-Copy Design
//!
//! Chunks are `bytes::Bytes`, so handing the same chunk to every listener
//! only bumps a reference count.

pub mod client;
pub mod fanout;
pub mod store;

pub use client::{ClientId, ClientStream};
pub use fanout::{FanOut, FanOutReport};
pub use store::ClientRegistry;
