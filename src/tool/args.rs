//! Argument contracts for the audio tool

use std::path::Path;

use crate::engine::EngineConfig;

/// Stdin/stdout placeholder understood by the tool
const STREAM: &str = "-";

/// Arguments asking the tool for a file's encoded bit rate
pub fn probe_args(path: &Path) -> Vec<String> {
    vec![
        "--i".to_string(),
        "-B".to_string(),
        path.to_string_lossy().into_owned(),
    ]
}

/// Arguments merging stdin (normal volume) with an effect file (reduced
/// volume) into a single stream on stdout
pub fn mix_args(config: &EngineConfig, effect: &Path) -> Vec<String> {
    let media = config.media_type.as_str();
    vec![
        "-t".to_string(),
        media.to_string(),
        "-v".to_string(),
        config.sound_volume.clone(),
        "-m".to_string(),
        STREAM.to_string(),
        "-t".to_string(),
        media.to_string(),
        "-v".to_string(),
        config.effect_volume.clone(),
        effect.to_string_lossy().into_owned(),
        "-t".to_string(),
        media.to_string(),
        STREAM.to_string(),
    ]
}

/// Whether an argument list is a bit-rate probe
pub fn is_probe(args: &[String]) -> bool {
    args.first().map(String::as_str) == Some("--i")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_args() {
        let args = probe_args(Path::new("/audio/song.mp3"));

        assert_eq!(args, vec!["--i", "-B", "/audio/song.mp3"]);
        assert!(is_probe(&args));
    }

    #[test]
    fn test_mix_args() {
        let config = EngineConfig::default();
        let args = mix_args(&config, Path::new("/audio/fx/applause.mp3"));

        assert_eq!(
            args,
            vec![
                "-t", "mp3", "-v", "0.99", "-m", "-", "-t", "mp3", "-v", "0.1",
                "/audio/fx/applause.mp3", "-t", "mp3", "-"
            ]
        );
        assert!(!is_probe(&args));
    }
}
