//! Effect mixer
//!
//! Merges an effect file, at reduced volume, into a primary source at
//! normal volume by running the audio tool with the primary fed through its
//! standard input. The mixed audio is read back from its standard output.

use std::fmt;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::engine::EngineConfig;
use crate::error::Error;
use crate::tool::args::mix_args;
use crate::tool::AudioTool;

use super::source::AudioSource;

/// The tool could not be launched; the primary source is handed back
pub struct MergeError {
    /// Launch failure
    pub error: Error,
    /// The untouched primary source
    pub primary: AudioSource,
}

impl fmt::Debug for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Mix `effect` into `primary`, returning the combined stream
///
/// The tool runs in the background. If it fails after launch, its error
/// output is logged and the combined stream simply ends.
pub fn merge<T: AudioTool + ?Sized>(
    tool: &T,
    config: &EngineConfig,
    effect: &Path,
    mut primary: AudioSource,
) -> Result<AudioSource, MergeError> {
    let process = match tool.spawn(&mix_args(config, effect)) {
        Ok(process) => process,
        Err(e) => {
            return Err(MergeError {
                error: Error::AdapterProcess(format!("failed to launch mixer: {}", e)),
                primary,
            })
        }
    };

    let mut stdin = process.stdin;
    let mut stderr = process.stderr;
    let effect_name = effect.display().to_string();

    // Primary source -> tool input
    let feed_effect = effect_name.clone();
    tokio::spawn(async move {
        match tokio::io::copy(&mut primary, &mut stdin).await {
            Ok(bytes) => {
                tracing::debug!(effect = %feed_effect, bytes = bytes, "Mixer input complete");
            }
            Err(e) => {
                tracing::debug!(effect = %feed_effect, error = %e, "Mixer input closed early");
            }
        }
        let _ = stdin.shutdown().await;
    });

    // Tool error channel -> log
    tokio::spawn(async move {
        let mut err = Vec::new();
        let _ = stderr.read_to_end(&mut err).await;
        if !err.is_empty() {
            tracing::error!(
                effect = %effect_name,
                message = %String::from_utf8_lossy(&err).trim(),
                "Mixer reported an error, mixed stream will end"
            );
        }
    });

    Ok(process.stdout)
}
