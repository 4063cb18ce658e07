//! Byte-oriented object storage the thread store persists through.
//!
//! "Not found" is always reported as [`std::io::ErrorKind::NotFound`]; every
//! other error is treated as an I/O failure by the store.

mod local;
mod memory;

use async_trait::async_trait;
use std::io;
use std::path::Path;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub is_directory: bool,
    pub len: u64,
}

/// Storage capability supplied by the embedding application
#[async_trait]
pub trait Storage: Send + Sync {
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    async fn read_file(&self, path: &Path) -> io::Result<String>;

    async fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Create a directory and any missing parents. Succeeds if it exists.
    async fn mkdir(&self, path: &Path) -> io::Result<()>;

    async fn remove(&self, path: &Path) -> io::Result<()>;

    /// Move `from` onto `to`.
    ///
    /// The default copies the bytes to `to` and then removes `from`, which
    /// leaves a short window where `to` can be partially written. Backends
    /// with an atomic rename should override it.
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let contents = self.read_file(from).await?;
        self.write_file(to, &contents).await?;
        self.remove(from).await
    }
}

pub(crate) fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}
