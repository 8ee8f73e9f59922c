//! Session-scoped staging storage for fetched segments and
//! intermediate chunks.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::RestitchError;

/// The two staging areas owned by one download session.
///
/// Dropping the value deletes both directories and their contents, on
/// the success and the failure path alike. [`SessionStaging::keep`]
/// detaches them instead, for post-mortem inspection.
pub struct SessionStaging {
    segments: TempDir,
    chunks: TempDir,
}

impl SessionStaging {
    pub fn create() -> Result<Self, RestitchError> {
        Ok(Self {
            segments: staging_dir("restitch-segments-")?,
            chunks: staging_dir("restitch-chunks-")?,
        })
    }

    /// Path for the 1-based `index`-th segment file. Names are
    /// zero-padded so lexical order equals sequence order.
    pub fn segment_path(&self, index: usize) -> PathBuf {
        self.segments.path().join(format!("{index:06}.ts"))
    }

    /// Path for the 1-based `ordinal`-th merged chunk file.
    pub fn chunk_path(&self, ordinal: usize) -> PathBuf {
        self.chunks.path().join(format!("chunk-{ordinal:04}.ts"))
    }

    pub fn segment_dir(&self) -> &Path {
        self.segments.path()
    }

    pub fn chunk_dir(&self) -> &Path {
        self.chunks.path()
    }

    /// Detaches both directories from deletion and returns their paths.
    pub fn keep(self) -> (PathBuf, PathBuf) {
        (self.segments.keep(), self.chunks.keep())
    }
}

fn staging_dir(prefix: &str) -> Result<TempDir, RestitchError> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|e| RestitchError::io("create staging directory", &std::env::temp_dir(), e))
}

/// Writes one staged file, wrapping failures with the target path.
pub async fn write_staged(path: &Path, bytes: &[u8]) -> Result<(), RestitchError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| RestitchError::io("write staged file", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_areas_are_distinct_directories() {
        let staging = SessionStaging::create().unwrap();
        assert!(staging.segment_dir().is_dir());
        assert!(staging.chunk_dir().is_dir());
        assert_ne!(staging.segment_dir(), staging.chunk_dir());
    }

    #[test]
    fn staged_names_order_lexically_by_sequence_index() {
        let staging = SessionStaging::create().unwrap();
        let first = staging.segment_path(1);
        let later = staging.segment_path(130);
        assert!(first.to_string_lossy().ends_with("000001.ts"));
        assert!(later.to_string_lossy().ends_with("000130.ts"));
        assert!(first < later);

        assert!(
            staging
                .chunk_path(3)
                .to_string_lossy()
                .ends_with("chunk-0003.ts")
        );
    }

    #[test]
    fn dropping_staging_removes_both_directories() {
        let staging = SessionStaging::create().unwrap();
        let segments = staging.segment_dir().to_path_buf();
        let chunks = staging.chunk_dir().to_path_buf();

        drop(staging);

        assert!(!segments.exists());
        assert!(!chunks.exists());
    }

    #[test]
    fn keep_detaches_the_directories() {
        let staging = SessionStaging::create().unwrap();
        let (segments, chunks) = staging.keep();

        assert!(segments.is_dir());
        assert!(chunks.is_dir());

        std::fs::remove_dir_all(&segments).unwrap();
        std::fs::remove_dir_all(&chunks).unwrap();
    }

    #[tokio::test]
    async fn staged_writes_land_on_disk() {
        let staging = SessionStaging::create().unwrap();
        let path = staging.segment_path(7);

        write_staged(&path, b"segment payload").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"segment payload");
    }

    #[tokio::test]
    async fn staged_write_failures_carry_the_path() {
        let staging = SessionStaging::create().unwrap();
        let path = staging.segment_dir().join("missing").join("000001.ts");

        let err = write_staged(&path, b"payload").await.unwrap_err();

        assert!(matches!(err, RestitchError::Io { .. }));
        assert!(err.to_string().contains("000001.ts"));
    }
}
