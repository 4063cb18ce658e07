use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::usage::Usage;

/// One entry in a thread's history.
///
/// `ordinal` is assigned once at insertion and never reused; `version` starts
/// at 1 and increments on every in-place edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThreadMessageRecord {
    pub id: String,
    pub ordinal: u64,
    pub version: u32,
    /// Opaque payload; the store never interprets it beyond validation.
    pub message: Value,
    pub usage: Usage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ThreadMessageRecord {
    pub fn new(id: impl Into<String>, ordinal: u64, message: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            ordinal,
            version: 1,
            message,
            usage: Usage::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
            error: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
