// SPDX-License-Identifier: MPL-2.0

//! Durable storage for captured photos

use crate::backends::camera::Frame;
use crate::errors::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reference to a persisted photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// Where the photo was written
    pub path: PathBuf,
    /// Number of bytes written
    pub size: usize,
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Persists one frame durably
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn persist(&self, frame: Frame) -> Result<AssetRef, StoreError>;
}

/// Stores photos as timestamped files in a directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Most recently modified photo in the directory, if any
    pub async fn latest(&self) -> Option<PathBuf> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            let entries = std::fs::read_dir(&dir).ok()?;
            entries
                .flatten()
                .filter(|entry| {
                    entry
                        .path()
                        .extension()
                        .map(|ext| {
                            let ext = ext.to_string_lossy();
                            ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("png")
                        })
                        .unwrap_or(false)
                })
                .max_by_key(|entry| entry.metadata().ok().and_then(|m| m.modified().ok()))
                .map(|entry| entry.path())
        })
        .await
        .ok()?
    }
}

/// Pick `IMG_<timestamp>.<ext>`, adding `_N` when that name is taken
fn unique_path(dir: &Path, frame: &Frame) -> PathBuf {
    let stem = format!("IMG_{}", frame.captured_at.format("%Y%m%d_%H%M%S"));
    let ext = frame.format.extension();

    let candidate = dir.join(format!("{}.{}", stem, ext));
    if !candidate.exists() {
        return candidate;
    }

    (1..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, ext)))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[async_trait]
impl AssetStore for DirectoryStore {
    async fn persist(&self, frame: Frame) -> Result<AssetRef, StoreError> {
        let dir = self.dir.clone();

        // Write to disk in background task (I/O-bound)
        let asset = tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&dir).map_err(|e| {
                StoreError::DirectoryUnavailable(format!("{}: {}", dir.display(), e))
            })?;

            let path = unique_path(&dir, &frame);
            debug!(path = %path.display(), size = frame.len(), "Saving photo");

            // create_new so a concurrent writer can never be overwritten
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)?;
            std::io::Write::write_all(&mut file, &frame.data)?;
            file.sync_all()?;

            Ok::<_, StoreError>(AssetRef {
                path,
                size: frame.len(),
            })
        })
        .await
        .map_err(|e| StoreError::WriteFailed(format!("Save task error: {}", e)))??;

        info!(path = %asset.path.display(), size = asset.size, "Photo saved successfully");
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::EncodingFormat;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn frame_at(second: u32) -> Frame {
        Frame {
            data: Arc::from(vec![0xFFu8, 0xD8, 0xFF, 0xD9].into_boxed_slice()),
            format: EncodingFormat::Jpeg,
            width: 1,
            height: 1,
            captured_at: chrono::Local
                .with_ymd_and_hms(2026, 3, 14, 15, 9, second)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_persist_creates_directory_and_names_file() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path().join("photos"));

        let asset = store.persist(frame_at(26)).await.unwrap();

        assert_eq!(
            asset.path.file_name().unwrap().to_str().unwrap(),
            "IMG_20260314_150926.jpg"
        );
        assert_eq!(asset.size, 4);
        assert_eq!(std::fs::read(&asset.path).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xD9]);
    }

    #[tokio::test]
    async fn test_persist_same_second_gets_suffix() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path());

        let first = store.persist(frame_at(5)).await.unwrap();
        let second = store.persist(frame_at(5)).await.unwrap();

        assert_ne!(first.path, second.path);
        assert!(
            second
                .path
                .to_string_lossy()
                .ends_with("IMG_20260314_150905_1.jpg")
        );
    }

    #[tokio::test]
    async fn test_persist_into_file_path_fails() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let store = DirectoryStore::new(&blocker);
        let result = store.persist(frame_at(0)).await;
        assert!(matches!(result, Err(StoreError::DirectoryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_latest_ignores_other_files() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path());
        assert_eq!(store.latest().await, None);

        std::fs::write(root.path().join("notes.txt"), b"x").unwrap();
        let asset = store.persist(frame_at(1)).await.unwrap();

        assert_eq!(store.latest().await, Some(asset.path));
    }
}
