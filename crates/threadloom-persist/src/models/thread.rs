use serde::{Deserialize, Serialize};
use serde_json::Value;

use threadloom_types::{ThreadMessageRecord, ThreadRecord};

/// Input for `create_thread`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThread {
    /// Generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub model_selection: Value,
}

impl NewThread {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            title: String::new(),
            model_selection: Value::Object(Default::default()),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_model_selection(mut self, model_selection: Value) -> Self {
        self.model_selection = model_selection;
        self
    }
}

/// Patch for `update_thread_settings`; `None` fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSettings {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub model_selection: Option<Value>,
}

impl ThreadSettings {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn model_selection(mut self, model_selection: Value) -> Self {
        self.model_selection = Some(model_selection);
        self
    }
}

/// Filters for `list_threads`. `limit` and `offset` apply after sorting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListThreadsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl ListThreadsQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub(crate) fn matches(&self, thread: &ThreadRecord) -> bool {
        if !self.include_deleted && thread.is_deleted() {
            return false;
        }
        match &self.user_id {
            Some(user_id) => &thread.user_id == user_id,
            None => true,
        }
    }
}

/// Full thread plus the history the model currently sees
#[derive(Debug, Clone)]
pub struct ThreadWithMessages {
    pub thread: ThreadRecord,
    pub messages: Vec<ThreadMessageRecord>,
}
