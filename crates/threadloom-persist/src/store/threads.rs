use chrono::Utc;
use futures::future::try_join_all;

use threadloom_context::{active_history, aggregate_context_size, aggregate_usage, ContextWindow};
use threadloom_types::{ThreadInfo, ThreadRecord};

use super::{thread_id_from_file_name, Mutation, ThreadStore};
use crate::error::{PersistError, Result};
use crate::models::{ListThreadsQuery, NewThread, ThreadSettings, ThreadWithMessages};
use crate::storage::is_not_found;

impl ThreadStore {
    /// Create a new, empty thread.
    ///
    /// Fails with `InvalidState` if the id is taken or unsafe. An id is
    /// generated when none is given.
    pub async fn create_thread(&self, new: NewThread) -> Result<ThreadRecord> {
        let id = new
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let path = self.thread_path(&id)?;

        let _slot = self.queue.acquire().await;
        match self.storage.stat(&path).await {
            Ok(_) => {
                return Err(PersistError::InvalidState(format!(
                    "thread {} already exists",
                    id
                )))
            }
            Err(e) if is_not_found(&e) => {}
            Err(e) => return Err(PersistError::read(&path, e)),
        }

        let thread = ThreadRecord::new(id, new.user_id, new.title, new.model_selection, Utc::now());
        self.persist(&thread).await?;
        tracing::info!(thread_id = %thread.id, user_id = %thread.user_id, "Created thread");
        Ok(thread)
    }

    /// Get a thread by id, including soft-deleted ones.
    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        self.queue.settled().await;
        self.load(thread_id).await
    }

    /// Get a thread together with its active history
    pub async fn get_thread_with_messages(
        &self,
        thread_id: &str,
    ) -> Result<Option<ThreadWithMessages>> {
        Ok(self.get_thread(thread_id).await?.map(|thread| {
            let messages = active_history(&thread);
            ThreadWithMessages { thread, messages }
        }))
    }

    /// Active history decoded for a model request
    pub async fn context_window(&self, thread_id: &str) -> Result<Option<ContextWindow>> {
        Ok(self
            .get_thread(thread_id)
            .await?
            .map(|thread| ContextWindow::from_thread(&thread)))
    }

    /// List thread metadata, most recently updated first.
    ///
    /// Only `thread_<id>.json` entries are considered. A file that disappears
    /// between listing and reading is skipped; any other read or validation
    /// failure is returned.
    pub async fn list_threads(&self, query: &ListThreadsQuery) -> Result<Vec<ThreadInfo>> {
        self.queue.settled().await;

        let entries = match self.storage.read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if is_not_found(&e) => return Ok(Vec::new()),
            Err(e) => return Err(PersistError::read(&self.root, e)),
        };
        let ids: Vec<&str> = entries
            .iter()
            .filter(|entry| !entry.is_directory)
            .filter_map(|entry| thread_id_from_file_name(&entry.name))
            .collect();

        let loaded = try_join_all(ids.iter().map(|id| self.load(id))).await?;

        let mut threads = Vec::with_capacity(loaded.len());
        for (id, thread) in ids.iter().zip(loaded) {
            match thread {
                Some(thread) if query.matches(&thread) => threads.push(thread),
                Some(_) => {}
                None => tracing::debug!(thread_id = %id, "Thread file vanished while listing"),
            }
        }
        threads.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(threads
            .iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(ThreadInfo::from)
            .collect())
    }

    /// Soft-delete a thread. Returns `false` if it does not exist.
    ///
    /// Deleting an already deleted thread succeeds without touching its
    /// `deleted_at`.
    pub async fn soft_delete_thread(&self, thread_id: &str) -> Result<bool> {
        let _slot = self.queue.acquire().await;
        let Some(mut thread) = self.load(thread_id).await? else {
            return Ok(false);
        };
        if thread.is_deleted() {
            return Ok(true);
        }
        let now = Utc::now();
        thread.deleted_at = Some(now);
        thread.updated_at = now;
        self.persist(&thread).await?;
        tracing::info!(thread_id, "Soft-deleted thread");
        Ok(true)
    }

    /// Patch title and/or model selection
    pub async fn update_thread_settings(
        &self,
        thread_id: &str,
        settings: ThreadSettings,
    ) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, |thread| {
            if settings.title.is_none() && settings.model_selection.is_none() {
                return Ok(Mutation::Unchanged(thread.clone()));
            }
            if let Some(title) = settings.title {
                thread.title = title;
            }
            if let Some(model_selection) = settings.model_selection {
                thread.model_selection = model_selection;
            }
            thread.updated_at = Utc::now();
            Ok(Mutation::Changed(thread.clone()))
        })
        .await
    }

    /// Recompute the thread-level usage from history.
    ///
    /// Repairs leave `updated_at` alone, and nothing is written when the
    /// cached value is already correct.
    pub async fn update_thread_usage(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, |thread| {
            let usage = aggregate_usage(
                &thread.history,
                thread.last_compaction_ordinal,
                self.counter.as_ref(),
            );
            if usage == thread.usage {
                return Ok(Mutation::Unchanged(thread.clone()));
            }
            tracing::info!(
                thread_id = %thread.id,
                cached = ?thread.usage,
                actual = ?usage,
                "Repaired thread usage"
            );
            thread.usage = usage;
            Ok(Mutation::Changed(thread.clone()))
        })
        .await
    }

    /// Recompute the cached context size from the active history
    pub async fn update_context_size(&self, thread_id: &str) -> Result<Option<u64>> {
        self.mutate(thread_id, |thread| {
            let size = aggregate_context_size(&active_history(thread), self.counter.as_ref());
            if size == thread.context_size {
                return Ok(Mutation::Unchanged(size));
            }
            tracing::info!(
                thread_id = %thread.id,
                cached = thread.context_size,
                actual = size,
                "Repaired context size"
            );
            thread.context_size = size;
            Ok(Mutation::Changed(size))
        })
        .await
    }
}
