//! Engine configuration

use std::path::PathBuf;

/// Default bit rate used when probing fails (bits/sec)
pub const FALLBACK_BIT_RATE: u64 = 128_000;

/// Divisor turning a bit rate into a byte rate
pub const BIT_RATE_DIVISOR: u64 = 8;

/// Broadcast engine configuration options
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Audio file broadcast by `start()`
    pub source_path: PathBuf,

    /// Directory searched when resolving effect names
    pub effects_dir: PathBuf,

    /// External audio tool executable
    pub tool_program: String,

    /// Media type passed to the tool for every stream (`-t`)
    pub media_type: String,

    /// Volume of the primary source when mixing
    pub sound_volume: String,

    /// Volume of the effect when mixing
    pub effect_volume: String,

    /// Bit rate used when the probe fails (bits/sec)
    pub fallback_bit_rate: u64,

    /// Bit rate to byte rate divisor
    pub bit_rate_divisor: u64,

    /// Bytes pulled from a source per read
    pub read_chunk_size: usize,

    /// Chunks buffered between a source and its pacing stage
    pub pacing_queue_chunks: usize,

    /// Chunks buffered per listener before chunks are dropped for it
    pub client_buffer_chunks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("audio/songs/conversation.mp3"),
            effects_dir: PathBuf::from("audio/fx"),
            tool_program: "sox".to_string(),
            media_type: "mp3".to_string(),
            sound_volume: "0.99".to_string(),
            effect_volume: "0.1".to_string(),
            fallback_bit_rate: FALLBACK_BIT_RATE,
            bit_rate_divisor: BIT_RATE_DIVISOR,
            read_chunk_size: 8 * 1024, // 8KB
            pacing_queue_chunks: 2,
            client_buffer_chunks: 1024,
        }
    }
}

impl EngineConfig {
    /// Create a config broadcasting the given source file
    pub fn with_source(path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: path.into(),
            ..Default::default()
        }
    }

    /// Set the source file
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    /// Set the effects directory
    pub fn effects_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.effects_dir = dir.into();
        self
    }

    /// Set the external tool executable
    pub fn tool_program(mut self, program: impl Into<String>) -> Self {
        self.tool_program = program.into();
        self
    }

    /// Set the fallback bit rate
    pub fn fallback_bit_rate(mut self, rate: u64) -> Self {
        self.fallback_bit_rate = rate.max(1);
        self
    }

    /// Set the source read size
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Set the per-listener buffer depth
    pub fn client_buffer_chunks(mut self, chunks: usize) -> Self {
        self.client_buffer_chunks = chunks.max(1);
        self
    }

    /// Set the mixing volumes (primary, effect)
    pub fn volumes(mut self, sound: impl Into<String>, effect: impl Into<String>) -> Self {
        self.sound_volume = sound.into();
        self.effect_volume = effect.into();
        self
    }

    /// Pacing byte rate for a probed bit rate
    pub fn byte_rate(&self, bit_rate: u64) -> u64 {
        (bit_rate / self.bit_rate_divisor.max(1)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.tool_program, "sox");
        assert_eq!(config.media_type, "mp3");
        assert_eq!(config.sound_volume, "0.99");
        assert_eq!(config.effect_volume, "0.1");
        assert_eq!(config.fallback_bit_rate, 128_000);
        assert_eq!(config.bit_rate_divisor, 8);
    }

    #[test]
    fn test_byte_rate() {
        let config = EngineConfig::default();

        assert_eq!(config.byte_rate(128_000), 16_000);
        // Never paces at zero
        assert_eq!(config.byte_rate(0), 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = EngineConfig::with_source("/tmp/song.mp3")
            .effects_dir("/tmp/fx")
            .tool_program("/usr/local/bin/sox")
            .fallback_bit_rate(0)
            .read_chunk_size(0)
            .client_buffer_chunks(16)
            .volumes("1.0", "0.2");

        assert_eq!(config.source_path, PathBuf::from("/tmp/song.mp3"));
        assert_eq!(config.effects_dir, PathBuf::from("/tmp/fx"));
        assert_eq!(config.tool_program, "/usr/local/bin/sox");
        assert_eq!(config.fallback_bit_rate, 1);
        assert_eq!(config.read_chunk_size, 1);
        assert_eq!(config.client_buffer_chunks, 16);
        assert_eq!(config.sound_volume, "1.0");
        assert_eq!(config.effect_volume, "0.2");
    }
}
