//! Effect catalog
//!
//! Resolves an effect name to a file in the effects directory by
//! case-insensitive substring match on the file name.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Directory of effect audio files
#[derive(Debug, Clone)]
pub struct EffectCatalog {
    dir: PathBuf,
}

impl EffectCatalog {
    /// Create a catalog over `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Effects directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve `name` to the first matching file, in file name order
    pub async fn resolve(&self, name: &str) -> Result<PathBuf> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::EffectNotFound(name.to_string()));
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        names
            .into_iter()
            .find(|file| file.to_lowercase().contains(&needle))
            .map(|file| self.dir.join(file))
            .ok_or_else(|| Error::EffectNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(files: &[&str]) -> (tempfile::TempDir, EffectCatalog) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"fx").unwrap();
        }
        let catalog = EffectCatalog::new(dir.path());
        (dir, catalog)
    }

    #[tokio::test]
    async fn test_resolve_case_insensitive() {
        let (dir, catalog) = catalog_with(&["Applause Sound Effect.mp3", "boo.mp3"]);

        let path = catalog.resolve("applause").await.unwrap();
        assert_eq!(path, dir.path().join("Applause Sound Effect.mp3"));

        let path = catalog.resolve("BOO").await.unwrap();
        assert_eq!(path, dir.path().join("boo.mp3"));
    }

    #[tokio::test]
    async fn test_resolve_first_in_name_order() {
        let (dir, catalog) = catalog_with(&["laugh-2.mp3", "laugh-1.mp3"]);

        let path = catalog.resolve("laugh").await.unwrap();
        assert_eq!(path, dir.path().join("laugh-1.mp3"));
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let (_dir, catalog) = catalog_with(&["boo.mp3"]);

        let err = catalog.resolve("fanfare").await.unwrap_err();
        assert!(matches!(err, Error::EffectNotFound(ref name) if name == "fanfare"));

        let err = catalog.resolve("  ").await.unwrap_err();
        assert!(matches!(err, Error::EffectNotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let catalog = EffectCatalog::new("/nonexistent/airwave/fx");

        let err = catalog.resolve("boo").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
