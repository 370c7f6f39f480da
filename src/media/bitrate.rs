//! Bit-rate probing
//!
//! The audio tool reports a file's encoded bit rate as text such as `128k`
//! or `1.41M`. A failed probe is never fatal: callers fall back to the
//! configured default and keep broadcasting.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tokio::io::AsyncReadExt;

use crate::error::ProbeError;
use crate::tool::args::probe_args;
use crate::tool::{AudioTool, ToolProcess};

/// Encoded bit rate of a source, in bits per second (always positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitRate(u64);

impl BitRate {
    /// Create a bit rate; zero is rejected
    pub fn new(bits_per_sec: u64) -> Option<Self> {
        (bits_per_sec > 0).then_some(Self(bits_per_sec))
    }

    /// Bits per second
    pub fn bits_per_sec(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BitRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

impl FromStr for BitRate {
    type Err = ProbeError;

    /// Parse tool output, normalizing a trailing `k`/`M` unit suffix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let parse_error = || ProbeError::Parse(text.to_string());

        let (digits, multiplier) = match text.char_indices().last() {
            Some((i, 'k' | 'K')) => (&text[..i], 1_000.0),
            Some((i, 'M')) => (&text[..i], 1_000_000.0),
            Some(_) => (text, 1.0),
            None => return Err(parse_error()),
        };

        let value: f64 = digits.trim().parse().map_err(|_| parse_error())?;
        let bits = (value * multiplier).round();
        if !bits.is_finite() || bits < 1.0 || bits > u64::MAX as f64 {
            return Err(parse_error());
        }

        BitRate::new(bits as u64).ok_or_else(parse_error)
    }
}

/// Ask the audio tool for the bit rate of `path`
///
/// Both output channels are drained to completion. Any bytes on the error
/// channel fail the probe with their text.
pub async fn probe<T: AudioTool + ?Sized>(tool: &T, path: &Path) -> Result<BitRate, ProbeError> {
    let ToolProcess {
        stdin,
        mut stdout,
        mut stderr,
    } = tool
        .spawn(&probe_args(path))
        .map_err(|e| ProbeError::Io(e.to_string()))?;
    drop(stdin);

    let mut out = Vec::new();
    let mut err = Vec::new();
    let (out_result, err_result) = tokio::join!(
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err)
    );
    out_result.map_err(|e| ProbeError::Io(e.to_string()))?;
    err_result.map_err(|e| ProbeError::Io(e.to_string()))?;

    if !err.is_empty() {
        return Err(ProbeError::Tool(
            String::from_utf8_lossy(&err).trim().to_string(),
        ));
    }

    String::from_utf8_lossy(&out).parse()
}

/// Probe `path`, falling back to `fallback` bits/sec on any failure
pub async fn probe_or_fallback<T: AudioTool + ?Sized>(
    tool: &T,
    path: &Path,
    fallback: u64,
) -> BitRate {
    match probe(tool, path).await {
        Ok(rate) => {
            tracing::debug!(path = %path.display(), bit_rate = %rate, "Bit rate probed");
            rate
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                fallback = fallback,
                "Bit rate error, using fallback"
            );
            BitRate(fallback.max(1))
        }
    }
}
