//! Audio sources

use std::io::{self, Cursor};
use std::path::Path;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Any readable stream of encoded audio
pub type AudioSource = Box<dyn AsyncRead + Send + Unpin>;

/// Open a fresh read of an audio file
pub async fn open(path: &Path) -> io::Result<AudioSource> {
    let file = File::open(path).await?;
    Ok(Box::new(file))
}

/// Put bytes read ahead of a source back in front of it
pub fn unread(pending: Option<Bytes>, source: AudioSource) -> AudioSource {
    match pending {
        Some(chunk) if !chunk.is_empty() => Box::new(Cursor::new(chunk).chain(source)),
        _ => source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unread_prepends_pending() {
        let rest: AudioSource = Box::new(Cursor::new(b"world".to_vec()));
        let mut source = unread(Some(Bytes::from_static(b"hello ")), rest);

        let mut out = String::new();
        source.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let result = open(Path::new("/nonexistent/airwave/source.mp3")).await;
        assert!(result.is_err());
    }
}
