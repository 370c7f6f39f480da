//! Subprocess-backed audio tool

use std::io;
use std::process::Stdio;

use tokio::process::Command;

use super::{AudioTool, ToolProcess};

/// Runs the real audio tool (`sox` by default) as a child process
#[derive(Debug, Clone)]
pub struct SoxTool {
    program: String,
}

impl SoxTool {
    /// Create an adapter for the given executable
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Get the executable name
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for SoxTool {
    fn default() -> Self {
        Self::new("sox")
    }
}

fn missing(channel: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("{} was not captured", channel),
    )
}

impl AudioTool for SoxTool {
    fn spawn(&self, args: &[String]) -> io::Result<ToolProcess> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let program = self.program.clone();
        let pid = child.id();
        tracing::trace!(program = %program, pid = ?pid, args = ?args, "Audio tool launched");

        // Reap the child so it never lingers as a zombie
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::trace!(program = %program, pid = ?pid, "Audio tool exited");
                }
                Ok(status) => {
                    tracing::warn!(program = %program, pid = ?pid, %status, "Audio tool failed");
                }
                Err(e) => {
                    tracing::warn!(program = %program, pid = ?pid, error = %e, "Audio tool wait failed");
                }
            }
        });

        Ok(ToolProcess {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_program() {
        assert_eq!(SoxTool::default().program(), "sox");
    }

    #[tokio::test]
    async fn test_spawn_missing_program_fails() {
        let tool = SoxTool::new("airwave-no-such-audio-tool");

        let result = tool.spawn(&["--version".to_string()]);
        assert!(result.is_err());
    }
}
