use serde::{Deserialize, Serialize};
use serde_json::Value;

use threadloom_types::{Message, UsageInput};

/// Input for `upsert_message`.
///
/// An `id` matching an existing record updates it in place; anything else
/// inserts a new record at the next ordinal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub message: Value,
    #[serde(default)]
    pub usage: Option<UsageInput>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UpsertMessage {
    pub fn new(message: Value) -> Self {
        Self {
            id: None,
            message,
            usage: None,
            error: None,
        }
    }

    /// Wrap a typed chat message.
    pub fn from_message(message: &Message) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::to_value(message)?))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_usage(mut self, usage: UsageInput) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
