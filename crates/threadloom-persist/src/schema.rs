use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use threadloom_types::{Message, ThreadRecord, CONTENT_SCHEMA_VERSION, SCHEMA_VERSION};

use crate::error::{PersistError, Result};

const MAX_THREAD_ID_LEN: usize = 128;

/// Checks that one message payload has the shape the caller expects.
///
/// Swappable so the payload shape can evolve without store changes.
pub trait MessageValidator: Send + Sync {
    fn validate(&self, payload: &Value) -> std::result::Result<(), String>;
}

/// Accepts payloads that decode as a chat [`Message`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatMessageValidator;

impl MessageValidator for ChatMessageValidator {
    fn validate(&self, payload: &Value) -> std::result::Result<(), String> {
        serde_json::from_value::<Message>(payload.clone())
            .map(|_| ())
            .map_err(|e| format!("not a chat message: {}", e))
    }
}

/// Accepts any JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyJsonValidator;

impl MessageValidator for AnyJsonValidator {
    fn validate(&self, payload: &Value) -> std::result::Result<(), String> {
        if payload.is_object() {
            Ok(())
        } else {
            Err("payload must be a JSON object".to_string())
        }
    }
}

pub(crate) fn is_safe_thread_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_THREAD_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Reject ids that are unsafe to embed in a storage path.
pub fn validate_thread_id(id: &str) -> Result<()> {
    if is_safe_thread_id(id) {
        Ok(())
    } else {
        Err(PersistError::InvalidState(format!(
            "thread id must be 1-{} characters of [A-Za-z0-9_-]: {:?}",
            MAX_THREAD_ID_LEN, id
        )))
    }
}

/// Validates thread records on the way in from storage and on the way out.
#[derive(Clone)]
pub struct SchemaValidator {
    messages: Arc<dyn MessageValidator>,
}

impl SchemaValidator {
    pub fn new(messages: Arc<dyn MessageValidator>) -> Self {
        Self { messages }
    }

    /// Parse stored bytes into a thread, refusing anything that does not
    /// match the current schema.
    pub fn decode(&self, raw: &str) -> Result<ThreadRecord> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| PersistError::Validation(format!("invalid JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| PersistError::Validation("thread must be a JSON object".to_string()))?;

        check_version(object.get("schemaVersion"), "schemaVersion", SCHEMA_VERSION)?;
        check_version(
            object.get("contentSchemaVersion"),
            "contentSchemaVersion",
            CONTENT_SCHEMA_VERSION,
        )?;

        let thread: ThreadRecord = serde_json::from_value(value)
            .map_err(|e| PersistError::Validation(format!("thread shape: {}", e)))?;
        self.check(&thread)?;
        Ok(thread)
    }

    /// Structural checks beyond what the types enforce.
    pub fn check(&self, thread: &ThreadRecord) -> Result<()> {
        if thread.schema_version != SCHEMA_VERSION {
            return Err(version_mismatch("schemaVersion", thread.schema_version as u64, SCHEMA_VERSION));
        }
        if thread.content_schema_version != CONTENT_SCHEMA_VERSION {
            return Err(version_mismatch(
                "contentSchemaVersion",
                thread.content_schema_version as u64,
                CONTENT_SCHEMA_VERSION,
            ));
        }
        if !is_safe_thread_id(&thread.id) {
            return Err(PersistError::Validation(format!("unsafe thread id {:?}", thread.id)));
        }
        if thread.user_id.is_empty() {
            return Err(PersistError::Validation("userId must not be empty".to_string()));
        }
        check_usage_cost(thread.usage.total_cost_usd, "usage")?;

        let mut ids = HashSet::new();
        let mut previous_ordinal = 0;
        for (index, record) in thread.history.iter().enumerate() {
            let at = format!("history[{}] (id {:?})", index, record.id);
            if record.id.is_empty() {
                return Err(PersistError::Validation(format!("{}: empty message id", at)));
            }
            if !ids.insert(record.id.as_str()) {
                return Err(PersistError::Validation(format!("{}: duplicate message id", at)));
            }
            if record.ordinal <= previous_ordinal {
                return Err(PersistError::Validation(format!(
                    "{}: ordinal {} does not follow {}",
                    at, record.ordinal, previous_ordinal
                )));
            }
            previous_ordinal = record.ordinal;
            if record.version == 0 {
                return Err(PersistError::Validation(format!("{}: version must be >= 1", at)));
            }
            check_usage_cost(record.usage.total_cost_usd, &at)?;
            self.messages
                .validate(&record.message)
                .map_err(|detail| PersistError::Validation(format!("{}: {}", at, detail)))?;
        }

        if let Some(boundary) = thread.last_compaction_ordinal {
            if boundary > previous_ordinal {
                return Err(PersistError::Validation(format!(
                    "lastCompactionOrdinal {} is past the last ordinal {}",
                    boundary, previous_ordinal
                )));
            }
        }
        Ok(())
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(Arc::new(ChatMessageValidator))
    }
}

fn check_version(value: Option<&Value>, field: &str, expected: u32) -> Result<()> {
    match value.and_then(Value::as_u64) {
        Some(found) if found == expected as u64 => Ok(()),
        Some(found) => Err(version_mismatch(field, found, expected)),
        None => Err(PersistError::Validation(format!(
            "{} missing or not an integer",
            field
        ))),
    }
}

fn version_mismatch(field: &str, found: u64, expected: u32) -> PersistError {
    PersistError::Validation(format!("unsupported {} {} (expected {})", field, found, expected))
}

fn check_usage_cost(cost: f64, at: &str) -> Result<()> {
    if cost.is_finite() && cost >= 0.0 {
        Ok(())
    } else {
        Err(PersistError::Validation(format!("{}: invalid cost {}", at, cost)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;
    use serde_json::json;
    use threadloom_types::ThreadMessageRecord;

    fn thread() -> ThreadRecord {
        let now = Utc::now();
        let mut thread = ThreadRecord::new("t1", "user_1", "Title", json!({}), now);
        thread.history.push(ThreadMessageRecord::new(
            "m1",
            1,
            json!({"role": "user", "content": "hi"}),
            now,
        ));
        thread
    }

    #[test]
    fn test_round_trips_valid_thread() {
        let original = thread();
        let raw = serde_json::to_string(&original).unwrap();
        let decoded = SchemaValidator::default().decode(&raw).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_rejects_future_schema_version() {
        let mut value = serde_json::to_value(thread()).unwrap();
        value["schemaVersion"] = json!(2);
        let err = SchemaValidator::default()
            .decode(&value.to_string())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("schemaVersion"));
    }

    #[test]
    fn test_rejects_garbage_bytes() {
        let err = SchemaValidator::default().decode("{not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_rejects_non_increasing_ordinals() {
        let mut t = thread();
        let mut second = t.history[0].clone();
        second.id = "m2".to_string();
        t.history.push(second);
        let err = SchemaValidator::default().check(&t).unwrap_err();
        assert!(err.to_string().contains("ordinal"));
    }

    #[test]
    fn test_rejects_payload_failing_message_validator() {
        let mut t = thread();
        t.history[0].message = json!({"role": "robot"});
        let err = SchemaValidator::default().check(&t).unwrap_err();
        assert!(err.to_string().contains("not a chat message"));

        let permissive = SchemaValidator::new(Arc::new(AnyJsonValidator));
        permissive.check(&t).unwrap();
    }

    #[test]
    fn test_rejects_boundary_past_history() {
        let mut t = thread();
        t.last_compaction_ordinal = Some(5);
        assert!(SchemaValidator::default().check(&t).is_err());
    }

    #[test]
    fn test_thread_id_rules() {
        assert!(validate_thread_id("thread-1_a").is_ok());
        let too_long = "x".repeat(129);
        for bad in ["", "../etc", "a/b", "a\\b", "a\0b", "a b", too_long.as_str()] {
            let err = validate_thread_id(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
    }
}
