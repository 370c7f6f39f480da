//! External audio tool adapter
//!
//! Audio analysis and mixing are delegated to a separately running program.
//! The engine only sees its three standard channels as independent byte
//! streams, so the tool can be swapped for an in-memory fake in tests.
//!
//! ```text
//!   engine ──► stdin  ──►┌────────────┐──► stdout ──► engine
//!                        │ audio tool │
//!                        └────────────┘──► stderr ──► engine
//! ```

pub mod args;
pub mod memory;
pub mod sox;

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

pub use memory::{MemoryTool, MixBehavior, ProbeReply};
pub use sox::SoxTool;

/// Writable tool channel
pub type ToolInput = Box<dyn AsyncWrite + Send + Unpin>;

/// Readable tool channel
pub type ToolOutput = Box<dyn AsyncRead + Send + Unpin>;

/// A launched tool process, exposed as its three standard channels
pub struct ToolProcess {
    /// Standard input
    pub stdin: ToolInput,
    /// Standard output
    pub stdout: ToolOutput,
    /// Standard error
    pub stderr: ToolOutput,
}

/// Capability to launch the external audio tool
///
/// Implementations must not block: the process runs asynchronously and
/// its failure surfaces through its channels.
pub trait AudioTool: Send + Sync + 'static {
    /// Launch the tool with the given argument list
    fn spawn(&self, args: &[String]) -> io::Result<ToolProcess>;
}
