//! Operator command dispatch
//!
//! Maps free-form operator commands onto engine operations: anything
//! mentioning "start" or "stop" controls the broadcast, everything else is
//! treated as an effect name.

use std::fmt;

use crate::error::{Error, Result};
use crate::tool::AudioTool;

use super::controller::BroadcastEngine;

/// Result reported back to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Command applied
    Ok,
    /// No effect matched the command
    NotFound,
}

impl CommandOutcome {
    /// Wire text for the transport layer
    pub fn as_str(self) -> &'static str {
        match self {
            CommandOutcome::Ok => "ok",
            CommandOutcome::NotFound => "command not found",
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<T: AudioTool> BroadcastEngine<T> {
    /// Apply an operator command
    ///
    /// Unknown effect names yield [`CommandOutcome::NotFound`]; any other
    /// failure is returned as an error for the transport to report.
    pub async fn handle_command(&self, command: &str) -> Result<CommandOutcome> {
        tracing::info!(command = %command, "Command received");
        let cmd = command.trim().to_lowercase();

        if cmd.contains("start") {
            self.start().await?;
            return Ok(CommandOutcome::Ok);
        }
        if cmd.contains("stop") {
            self.stop().await;
            return Ok(CommandOutcome::Ok);
        }

        match self.inject_effect(&cmd).await {
            Ok(()) => Ok(CommandOutcome::Ok),
            Err(Error::EffectNotFound(name)) => {
                tracing::info!(effect = %name, "Command not found");
                Ok(CommandOutcome::NotFound)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_text() {
        assert_eq!(CommandOutcome::Ok.as_str(), "ok");
        assert_eq!(CommandOutcome::NotFound.to_string(), "command not found");
    }
}
