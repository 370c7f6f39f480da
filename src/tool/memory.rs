//! In-memory audio tool
//!
//! Answers probe requests with canned bytes and performs a trivial byte-wise
//! "mix" of its input, so pipelines can be exercised without the real tool.

use std::io::{self, Cursor};
use std::sync::Mutex;

use tokio::io::{duplex, sink, AsyncReadExt, AsyncWriteExt};

use super::args::is_probe;
use super::{AudioTool, ToolProcess};

/// In-memory pipe capacity between the fake tool and its caller
const PIPE_CAPACITY: usize = 16 * 1024;

/// How the fake answers a bit-rate probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeReply {
    /// Write this text to stdout
    Output(String),
    /// Write this text to stderr
    Error(String),
    /// Refuse to launch
    LaunchFailure,
}

/// How the fake answers a mix request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixBehavior {
    /// Add the given value (wrapping) to every input byte; 0 echoes input
    Overlay(u8),
    /// Refuse to launch
    LaunchFailure,
    /// Launch, write an error and end output immediately
    Crash,
}

/// Audio tool fake that never touches the filesystem or spawns processes
#[derive(Debug)]
pub struct MemoryTool {
    probe: ProbeReply,
    mix: MixBehavior,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MemoryTool {
    /// Create a fake reporting a 128k bit rate and echoing mixes
    pub fn new() -> Self {
        Self {
            probe: ProbeReply::Output("128k\n".to_string()),
            mix: MixBehavior::Overlay(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Set the probe answer
    pub fn probe(mut self, reply: ProbeReply) -> Self {
        self.probe = reply;
        self
    }

    /// Set the mix behavior
    pub fn mix(mut self, behavior: MixBehavior) -> Self {
        self.mix = behavior;
        self
    }

    /// Argument lists of every launch attempt, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn refused() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "audio tool unavailable")
    }

    fn canned(stdout: &str, stderr: &str) -> ToolProcess {
        ToolProcess {
            stdin: Box::new(sink()),
            stdout: Box::new(Cursor::new(stdout.as_bytes().to_vec())),
            stderr: Box::new(Cursor::new(stderr.as_bytes().to_vec())),
        }
    }

    fn overlay(value: u8) -> ToolProcess {
        let (stdin, mut mix_in) = duplex(PIPE_CAPACITY);
        let (mut mix_out, stdout) = duplex(PIPE_CAPACITY);

        tokio::spawn(async move {
            let mut buf = vec![0u8; PIPE_CAPACITY];
            loop {
                let n = match mix_in.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                for byte in &mut buf[..n] {
                    *byte = byte.wrapping_add(value);
                }
                if mix_out.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
            let _ = mix_out.shutdown().await;
        });

        ToolProcess {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(Cursor::new(Vec::new())),
        }
    }
}

impl Default for MemoryTool {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioTool for MemoryTool {
    fn spawn(&self, args: &[String]) -> io::Result<ToolProcess> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.to_vec());
        }

        if is_probe(args) {
            return match &self.probe {
                ProbeReply::Output(text) => Ok(Self::canned(text, "")),
                ProbeReply::Error(text) => Ok(Self::canned("", text)),
                ProbeReply::LaunchFailure => Err(Self::refused()),
            };
        }

        match self.mix {
            MixBehavior::Overlay(value) => Ok(Self::overlay(value)),
            MixBehavior::LaunchFailure => Err(Self::refused()),
            MixBehavior::Crash => Ok(Self::canned("", "mixer crashed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_all(mut reader: crate::tool::ToolOutput) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_probe_output() {
        let tool = MemoryTool::new().probe(ProbeReply::Output("320k".into()));
        let args = vec!["--i".to_string(), "-B".to_string(), "a.mp3".to_string()];

        let process = tool.spawn(&args).unwrap();
        assert_eq!(read_all(process.stdout).await, b"320k");
        assert!(read_all(process.stderr).await.is_empty());
        assert_eq!(tool.calls(), vec![args]);
    }

    #[tokio::test]
    async fn test_overlay_mix() {
        let tool = MemoryTool::new().mix(MixBehavior::Overlay(1));

        let mut process = tool.spawn(&["-m".to_string()]).unwrap();
        process.stdin.write_all(&[1, 2, 255]).await.unwrap();
        process.stdin.shutdown().await.unwrap();
        drop(process.stdin);

        assert_eq!(read_all(process.stdout).await, vec![2, 3, 0]);
    }

    #[tokio::test]
    async fn test_launch_failures() {
        let tool = MemoryTool::new()
            .probe(ProbeReply::LaunchFailure)
            .mix(MixBehavior::LaunchFailure);

        assert!(tool.spawn(&["--i".to_string()]).is_err());
        assert!(tool.spawn(&["-m".to_string()]).is_err());
        assert_eq!(tool.calls().len(), 2);
    }
}
