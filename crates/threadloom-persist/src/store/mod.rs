//! The thread store facade.
//!
//! Every mutation runs inside the store's [`WriteQueue`] slot and follows the
//! same shape: load, validate, change in memory, recompute derived fields,
//! persist. Reads wait for in-flight writes first so they never see a write
//! from this process half-applied.

mod messages;
mod threads;

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use threadloom_context::TokenCounter;
use threadloom_types::ThreadRecord;

use crate::builder::ThreadStoreBuilder;
use crate::error::{PersistError, Result};
use crate::pricing::PricingCalculator;
use crate::queue::WriteQueue;
use crate::schema::{is_safe_thread_id, validate_thread_id, SchemaValidator};
use crate::storage::{is_not_found, Storage};

const THREAD_FILE_PREFIX: &str = "thread_";
const THREAD_FILE_SUFFIX: &str = ".json";
const TEMP_FILE_PREFIX: &str = ".tmp_";

/// Result of a mutation closure: whether the thread must be written back.
pub(crate) enum Mutation<T> {
    Changed(T),
    Unchanged(T),
}

/// File-per-thread conversation store over a [`Storage`] backend
pub struct ThreadStore {
    storage: Arc<dyn Storage>,
    root: PathBuf,
    validator: SchemaValidator,
    counter: Arc<dyn TokenCounter>,
    pricing: Option<Arc<dyn PricingCalculator>>,
    queue: WriteQueue,
}

impl ThreadStore {
    pub(crate) fn new(
        storage: Arc<dyn Storage>,
        root: PathBuf,
        validator: SchemaValidator,
        counter: Arc<dyn TokenCounter>,
        pricing: Option<Arc<dyn PricingCalculator>>,
    ) -> Self {
        Self {
            storage,
            root,
            validator,
            counter,
            pricing,
            queue: WriteQueue::new(),
        }
    }

    pub fn builder() -> ThreadStoreBuilder {
        ThreadStoreBuilder::new()
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    pub fn token_counter(&self) -> &dyn TokenCounter {
        self.counter.as_ref()
    }

    /// Canonical path of a thread's file. Fails on unsafe ids.
    pub fn thread_path(&self, thread_id: &str) -> Result<PathBuf> {
        validate_thread_id(thread_id)?;
        Ok(self.root.join(thread_file_name(thread_id)))
    }

    /// Read and validate one thread. Missing files are `None`.
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        let path = self.thread_path(thread_id)?;
        let raw = match self.storage.read_file(&path).await {
            Ok(raw) => raw,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(PersistError::read(&path, e)),
        };
        let thread = self.validator.decode(&raw)?;
        if thread.id != thread_id {
            return Err(PersistError::Validation(format!(
                "{} holds thread {:?}",
                path.display(),
                thread.id
            )));
        }
        Ok(Some(thread))
    }

    /// Validate and write a thread through a temporary object.
    async fn persist(&self, thread: &ThreadRecord) -> Result<()> {
        self.validator.check(thread)?;
        let path = self.thread_path(&thread.id)?;
        let raw = serde_json::to_string_pretty(thread)
            .map_err(|e| PersistError::Validation(format!("failed to serialize thread: {}", e)))?;

        self.storage
            .mkdir(&self.root)
            .await
            .map_err(|e| PersistError::write(&self.root, e))?;

        let temp = self.root.join(format!(
            "{}{}{}-{}{}",
            TEMP_FILE_PREFIX,
            THREAD_FILE_PREFIX,
            thread.id,
            uuid::Uuid::new_v4().simple(),
            THREAD_FILE_SUFFIX
        ));
        if let Err(e) = self.storage.write_file(&temp, &raw).await {
            self.discard_temp(&temp).await;
            return Err(PersistError::write(&temp, e));
        }
        if let Err(e) = self.storage.rename(&temp, &path).await {
            self.discard_temp(&temp).await;
            return Err(PersistError::write(&path, e));
        }

        tracing::debug!(
            thread_id = %thread.id,
            bytes = raw.len(),
            history = thread.history.len(),
            "Persisted thread"
        );
        Ok(())
    }

    async fn discard_temp(&self, temp: &Path) {
        match self.storage.remove(temp).await {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => {}
            Err(e) => tracing::warn!(
                path = %temp.display(),
                error = %e,
                "Failed to remove temporary thread file"
            ),
        }
    }

    /// Load, change and write back one live thread inside the write slot.
    ///
    /// Missing and soft-deleted threads yield `None` without calling `apply`.
    async fn mutate<T, F>(&self, thread_id: &str, apply: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut ThreadRecord) -> Result<Mutation<T>>,
    {
        let _slot = self.queue.acquire().await;
        let Some(mut thread) = self.load(thread_id).await? else {
            tracing::debug!(thread_id, "Thread not found");
            return Ok(None);
        };
        if thread.is_deleted() {
            tracing::debug!(thread_id, "Thread is deleted; ignoring mutation");
            return Ok(None);
        }
        match apply(&mut thread)? {
            Mutation::Changed(out) => {
                self.persist(&thread).await?;
                Ok(Some(out))
            }
            Mutation::Unchanged(out) => Ok(Some(out)),
        }
    }

    /// Like [`Self::mutate`] but bumps `updated_at` and refreshes derived
    /// fields before writing.
    async fn touch<T, F>(&self, thread_id: &str, apply: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut ThreadRecord) -> Result<T>,
    {
        self.mutate(thread_id, |thread| {
            let out = apply(thread)?;
            thread.updated_at = Utc::now();
            threadloom_context::refresh_derived(thread, self.counter.as_ref());
            Ok(Mutation::Changed(out))
        })
        .await
    }
}

fn thread_file_name(thread_id: &str) -> String {
    format!("{}{}{}", THREAD_FILE_PREFIX, thread_id, THREAD_FILE_SUFFIX)
}

/// Thread id encoded in a file name, if the name is a thread file.
fn thread_id_from_file_name(name: &str) -> Option<&str> {
    let id = name
        .strip_prefix(THREAD_FILE_PREFIX)?
        .strip_suffix(THREAD_FILE_SUFFIX)?;
    is_safe_thread_id(id).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_file_names() {
        assert_eq!(thread_file_name("abc"), "thread_abc.json");
        assert_eq!(thread_id_from_file_name("thread_abc.json"), Some("abc"));
        assert_eq!(thread_id_from_file_name("thread_.json"), None);
        assert_eq!(thread_id_from_file_name("thread_a b.json"), None);
        assert_eq!(thread_id_from_file_name("notes.json"), None);
        assert_eq!(
            thread_id_from_file_name(".tmp_thread_abc-0f0f.json"),
            None
        );
    }
}
