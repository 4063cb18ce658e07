use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::ThreadMessageRecord;
use crate::usage::Usage;

/// Version of the persisted thread shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Version of the message payload shape embedded in `history`.
pub const CONTENT_SCHEMA_VERSION: u32 = 1;

/// One persisted conversation.
///
/// `context_size` and `usage` are caches over `history`; they are recomputed
/// after every mutation and never treated as the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThreadRecord {
    pub schema_version: u32,
    pub content_schema_version: u32,
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub model_selection: Value,
    pub history: Vec<ThreadMessageRecord>,
    /// `None` until the first compaction; active history is everything
    /// non-deleted with an ordinal above this boundary.
    pub last_compaction_ordinal: Option<u64>,
    pub context_size: u64,
    pub usage: Usage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ThreadRecord {
    /// Create an empty thread at the current schema versions
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        model_selection: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            content_schema_version: CONTENT_SCHEMA_VERSION,
            id: id.into(),
            user_id: user_id.into(),
            title: title.into(),
            model_selection,
            history: Vec::new(),
            last_compaction_ordinal: None,
            context_size: 0,
            usage: Usage::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Highest ordinal ever assigned, or 0 for an empty history.
    pub fn last_ordinal(&self) -> u64 {
        self.history.iter().map(|m| m.ordinal).max().unwrap_or(0)
    }

    pub fn next_ordinal(&self) -> u64 {
        self.last_ordinal().saturating_add(1)
    }

    pub fn message(&self, message_id: &str) -> Option<&ThreadMessageRecord> {
        self.history.iter().find(|m| m.id == message_id)
    }

    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut ThreadMessageRecord> {
        self.history.iter_mut().find(|m| m.id == message_id)
    }

    /// Model id from `model_selection.model`, if the caller stored one there.
    pub fn model_id(&self) -> Option<&str> {
        self.model_selection.get("model").and_then(Value::as_str)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Thread metadata without the history array (listing view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadInfo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub model_selection: Value,
    pub message_count: usize,
    pub last_compaction_ordinal: Option<u64>,
    pub context_size: u64,
    pub usage: Usage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&ThreadRecord> for ThreadInfo {
    fn from(thread: &ThreadRecord) -> Self {
        Self {
            id: thread.id.clone(),
            user_id: thread.user_id.clone(),
            title: thread.title.clone(),
            model_selection: thread.model_selection.clone(),
            message_count: thread.history.iter().filter(|m| !m.is_deleted()).count(),
            last_compaction_ordinal: thread.last_compaction_ordinal,
            context_size: thread.context_size,
            usage: thread.usage,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            deleted_at: thread.deleted_at,
        }
    }
}

impl From<ThreadRecord> for ThreadInfo {
    fn from(thread: ThreadRecord) -> Self {
        Self::from(&thread)
    }
}
