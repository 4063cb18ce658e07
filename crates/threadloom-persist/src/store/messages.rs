use chrono::Utc;

use threadloom_context::{
    apply_compaction, plan_compaction, should_compact, CompactionOutcome, CompactionPolicy,
    Summarizer,
};
use threadloom_types::{ThreadMessageRecord, ThreadRecord, Usage};

use super::{Mutation, ThreadStore};
use crate::error::{PersistError, Result};
use crate::models::UpsertMessage;
use crate::pricing::resolve_usage;

impl ThreadStore {
    /// Insert a message, or update the record whose id matches.
    ///
    /// Inserts take the next ordinal and a generated id when none is given.
    /// Updates replace the payload, add the new usage to the old, bump
    /// `version` and keep `ordinal` and `created_at`. Returns `None` if the
    /// thread is missing or deleted.
    pub async fn upsert_message(
        &self,
        thread_id: &str,
        upsert: UpsertMessage,
    ) -> Result<Option<ThreadMessageRecord>> {
        self.touch(thread_id, |thread| {
            let now = Utc::now();
            let usage = match &upsert.usage {
                Some(input) => resolve_usage(input, thread.model_id(), self.pricing.as_deref()),
                None => Usage::default(),
            };

            let existing = upsert
                .id
                .as_deref()
                .and_then(|id| thread.history.iter().position(|m| m.id == id));

            let record = match existing {
                Some(index) => {
                    let record = &mut thread.history[index];
                    record.message = upsert.message;
                    record.usage += usage;
                    record.version = record.version.saturating_add(1);
                    record.updated_at = now;
                    if upsert.error.is_some() {
                        record.error = upsert.error;
                    }
                    tracing::debug!(
                        thread_id = %thread.id,
                        message_id = %record.id,
                        ordinal = record.ordinal,
                        version = record.version,
                        "Updated message"
                    );
                    record.clone()
                }
                None => {
                    let ordinal = thread.next_ordinal();
                    let id = upsert
                        .id
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                    let mut record =
                        ThreadMessageRecord::new(id, ordinal, upsert.message, now).with_usage(usage);
                    record.error = upsert.error;
                    thread.history.push(record.clone());
                    tracing::debug!(
                        thread_id = %thread.id,
                        message_id = %record.id,
                        ordinal,
                        "Inserted message"
                    );
                    record
                }
            };
            Ok(record)
        })
        .await
    }

    /// Replace the whole history and clear the compaction boundary.
    ///
    /// Records are stored in ordinal order; duplicate ids or ordinals fail
    /// validation and nothing is written.
    pub async fn replace_messages(
        &self,
        thread_id: &str,
        mut messages: Vec<ThreadMessageRecord>,
    ) -> Result<Option<ThreadRecord>> {
        messages.sort_by_key(|m| m.ordinal);
        self.mutate(thread_id, |thread| {
            tracing::info!(
                thread_id = %thread.id,
                before = thread.history.len(),
                after = messages.len(),
                "Replacing thread history"
            );
            thread.history = messages;
            thread.last_compaction_ordinal = None;
            thread.updated_at = Utc::now();
            threadloom_context::refresh_derived(thread, self.counter.as_ref());
            Ok(Mutation::Changed(thread.clone()))
        })
        .await
    }

    /// Soft-delete one message.
    ///
    /// `None` if the thread is missing or deleted, `Some(false)` if no record
    /// has that id. Deleting twice keeps the first timestamp.
    pub async fn soft_delete_message(
        &self,
        thread_id: &str,
        message_id: &str,
    ) -> Result<Option<bool>> {
        self.mutate(thread_id, |thread| {
            let now = Utc::now();
            let Some(record) = thread.message_mut(message_id) else {
                return Ok(Mutation::Unchanged(false));
            };
            if record.is_deleted() {
                return Ok(Mutation::Unchanged(true));
            }
            record.deleted_at = Some(now);
            record.updated_at = now;
            thread.updated_at = now;
            threadloom_context::refresh_derived(thread, self.counter.as_ref());
            tracing::info!(thread_id = %thread.id, message_id, "Soft-deleted message");
            Ok(Mutation::Changed(true))
        })
        .await
    }

    /// Clear the compaction boundary so the whole non-deleted history is
    /// active again.
    pub async fn rebuild_active_history(&self, thread_id: &str) -> Result<Option<ThreadRecord>> {
        self.mutate(thread_id, |thread| {
            let previous = thread.last_compaction_ordinal.take();
            thread.updated_at = Utc::now();
            threadloom_context::refresh_derived(thread, self.counter.as_ref());
            tracing::info!(
                thread_id = %thread.id,
                previous_boundary = ?previous,
                context_size = thread.context_size,
                "Rebuilt active history"
            );
            Ok(Mutation::Changed(thread.clone()))
        })
        .await
    }

    /// Whether the thread's active history overflows `policy`.
    ///
    /// `None` if the thread is missing or deleted, matching
    /// [`compact_if_needed`](Self::compact_if_needed).
    pub async fn should_compact(
        &self,
        thread_id: &str,
        policy: &CompactionPolicy,
    ) -> Result<Option<bool>> {
        Ok(match self.get_thread(thread_id).await? {
            Some(thread) if !thread.is_deleted() => {
                Some(should_compact(&thread, policy, self.counter.as_ref()))
            }
            _ => None,
        })
    }

    /// Summarize the active history if it overflows `policy`.
    ///
    /// The summary is appended as a new record and the boundary moves past
    /// everything before it; earlier records stay in history. The summarizer
    /// runs while this store's write slot is held. Returns `None` if the
    /// thread is missing or deleted.
    pub async fn compact_if_needed(
        &self,
        thread_id: &str,
        policy: &CompactionPolicy,
        summarizer: &dyn Summarizer,
    ) -> Result<Option<CompactionOutcome>> {
        let _slot = self.queue.acquire().await;
        let Some(mut thread) = self.load(thread_id).await? else {
            return Ok(None);
        };
        if thread.is_deleted() {
            return Ok(None);
        }

        let Some(plan) = plan_compaction(&thread, policy, self.counter.as_ref()) else {
            tracing::debug!(
                thread_id,
                context_size = thread.context_size,
                max_context_tokens = policy.max_context_tokens,
                "No compaction needed"
            );
            return Ok(Some(CompactionOutcome {
                did_compact: false,
                thread,
            }));
        };

        let summary = summarizer
            .summarize(&plan.active)
            .await
            .map_err(PersistError::Summarization)?;
        apply_compaction(&mut thread, &summary, &plan, self.counter.as_ref(), Utc::now());
        self.persist(&thread).await?;

        Ok(Some(CompactionOutcome {
            did_compact: true,
            thread,
        }))
    }
}
