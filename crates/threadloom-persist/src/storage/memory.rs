use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use super::{DirEntry, FileStat, Storage};

#[derive(Debug, Clone)]
enum Entry {
    File(String),
    Dir,
}

/// In-memory storage for testing and embedders without a disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: tokio::sync::RwLock<BTreeMap<PathBuf, Entry>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with an I/O error (until reset).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Paths of all stored files
    pub async fn files(&self) -> Vec<PathBuf> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn check_writable(&self, path: &Path) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other(format!("write rejected: {}", path.display())));
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {}", path.display()))
}

fn has_children(entries: &BTreeMap<PathBuf, Entry>, dir: &Path) -> bool {
    entries.keys().any(|p| p.parent() == Some(dir))
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let entries = self.entries.read().await;
        match entries.get(path) {
            Some(Entry::File(contents)) => Ok(FileStat {
                is_directory: false,
                len: contents.len() as u64,
            }),
            Some(Entry::Dir) => Ok(FileStat {
                is_directory: true,
                len: 0,
            }),
            None if has_children(&entries, path) => Ok(FileStat {
                is_directory: true,
                len: 0,
            }),
            None => Err(not_found(path)),
        }
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let entries = self.entries.read().await;
        let is_dir = matches!(entries.get(path), Some(Entry::Dir)) || has_children(&entries, path);
        if !is_dir {
            return Err(not_found(path));
        }
        Ok(entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .filter_map(|(p, entry)| {
                let name = p.file_name()?.to_str()?.to_string();
                Some(DirEntry {
                    name,
                    is_directory: matches!(entry, Entry::Dir),
                })
            })
            .collect())
    }

    async fn read_file(&self, path: &Path) -> io::Result<String> {
        let entries = self.entries.read().await;
        match entries.get(path) {
            Some(Entry::File(contents)) => Ok(contents.clone()),
            Some(Entry::Dir) => Err(io::Error::other(format!("is a directory: {}", path.display()))),
            None => Err(not_found(path)),
        }
    }

    async fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.check_writable(path)?;
        let mut entries = self.entries.write().await;
        entries.insert(path.to_path_buf(), Entry::File(contents.to_string()));
        Ok(())
    }

    async fn mkdir(&self, path: &Path) -> io::Result<()> {
        let mut entries = self.entries.write().await;
        for dir in path.ancestors().filter(|p| !p.as_os_str().is_empty()) {
            if let Some(Entry::File(_)) = entries.get(dir) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("file exists: {}", dir.display()),
                ));
            }
            entries.insert(dir.to_path_buf(), Entry::Dir);
        }
        Ok(())
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        let mut entries = self.entries.write().await;
        match entries.get(path) {
            Some(Entry::File(_)) => {
                entries.remove(path);
                Ok(())
            }
            Some(Entry::Dir) => Err(io::Error::other(format!("is a directory: {}", path.display()))),
            None => Err(not_found(path)),
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check_writable(to)?;
        let mut entries = self.entries.write().await;
        match entries.remove(from) {
            Some(Entry::File(contents)) => {
                entries.insert(to.to_path_buf(), Entry::File(contents));
                Ok(())
            }
            Some(dir) => {
                entries.insert(from.to_path_buf(), dir);
                Err(io::Error::other(format!("is a directory: {}", from.display())))
            }
            None => Err(not_found(from)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_dir_lists_direct_children_only() {
        let storage = MemoryStorage::new();
        storage.mkdir(Path::new("root/threads/deep")).await.unwrap();
        storage.write_file(Path::new("root/threads/a.json"), "a").await.unwrap();
        storage.write_file(Path::new("root/threads/deep/b.json"), "b").await.unwrap();

        let mut names: Vec<String> = storage
            .read_dir(Path::new("root/threads"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.json", "deep"]);
    }

    #[tokio::test]
    async fn test_missing_paths_are_not_found() {
        let storage = MemoryStorage::new();
        let err = storage.read_file(Path::new("nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        let err = storage.read_dir(Path::new("nope")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_failed_writes_leave_contents_untouched() {
        let storage = MemoryStorage::new();
        storage.write_file(Path::new("a"), "one").await.unwrap();
        storage.fail_writes(true);
        assert!(storage.write_file(Path::new("a"), "two").await.is_err());
        storage.fail_writes(false);
        assert_eq!(storage.read_file(Path::new("a")).await.unwrap(), "one");
    }
}
