//! Error types
//!
//! One error enum for every engine operation. Probe failures have their own
//! type because they are always recovered locally with the fallback rate.

use std::fmt;
use std::io;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for engine operations
#[derive(Debug)]
pub enum Error {
    /// I/O failure (source file, effects directory, sockets)
    Io(io::Error),
    /// Bit-rate probe failed
    Probe(ProbeError),
    /// Requested effect name matched no file
    EffectNotFound(String),
    /// External audio tool failed to launch or reported an error
    AdapterProcess(String),
    /// Operation needs a live broadcast
    NotStreaming,
    /// The live source was already fully read when an effect was requested
    SourceExhausted,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Probe(e) => write!(f, "Bit rate probe failed: {}", e),
            Error::EffectNotFound(name) => write!(f, "The effect {} was not found", name),
            Error::AdapterProcess(msg) => write!(f, "Audio tool error: {}", msg),
            Error::NotStreaming => write!(f, "Broadcast is not streaming"),
            Error::SourceExhausted => write!(f, "Live source already exhausted"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Probe(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProbeError> for Error {
    fn from(e: ProbeError) -> Self {
        Error::Probe(e)
    }
}

/// Bit-rate probe failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The tool wrote to its error channel
    Tool(String),
    /// The tool output was not a usable bit rate
    Parse(String),
    /// The tool could not be spawned or its pipes failed
    Io(String),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Tool(msg) => write!(f, "tool reported: {}", msg),
            ProbeError::Parse(text) => write!(f, "unparseable bit rate {:?}", text),
            ProbeError::Io(msg) => write!(f, "tool I/O failed: {}", msg),
        }
    }
}

impl std::error::Error for ProbeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_effect_not_found() {
        let err = Error::EffectNotFound("applause".into());
        assert_eq!(err.to_string(), "The effect applause was not found");
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_probe_conversion() {
        let err: Error = ProbeError::Tool("no such file".into()).into();
        assert_eq!(
            err.to_string(),
            "Bit rate probe failed: tool reported: no such file"
        );
    }
}
