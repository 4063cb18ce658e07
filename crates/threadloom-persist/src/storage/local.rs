use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::{DirEntry, FileStat, Storage};

/// Local filesystem storage (tokio::fs)
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(FileStat {
            is_directory: metadata.is_dir(),
            len: metadata.len(),
        })
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let is_directory = entry.file_type().await?.is_dir();
            out.push(DirEntry { name, is_directory });
        }
        Ok(out)
    }

    async fn read_file(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        tokio::fs::rename(from, to).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_read_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let dir = temp_dir.path().join("nested/threads");

        storage.mkdir(&dir).await.unwrap();
        storage.mkdir(&dir).await.unwrap();
        storage.write_file(&dir.join("a.json"), "{}").await.unwrap();

        assert_eq!(storage.read_file(&dir.join("a.json")).await.unwrap(), "{}");
        let entries = storage.read_dir(&dir).await.unwrap();
        assert_eq!(
            entries,
            vec![DirEntry {
                name: "a.json".to_string(),
                is_directory: false
            }]
        );
        assert_eq!(storage.stat(&dir.join("a.json")).await.unwrap().len, 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let err = storage
            .read_file(&temp_dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rename_replaces_target() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new();
        let from = temp_dir.path().join("tmp");
        let to = temp_dir.path().join("target");

        storage.write_file(&to, "old").await.unwrap();
        storage.write_file(&from, "new").await.unwrap();
        storage.rename(&from, &to).await.unwrap();

        assert_eq!(storage.read_file(&to).await.unwrap(), "new");
        assert!(storage.stat(&from).await.is_err());
    }
}
