use threadloom_types::{Message, ThreadMessageRecord, ThreadRecord};

/// Records the model currently sees.
///
/// Keeps records with `ordinal > boundary` (boundary defaults to 0) that are
/// not soft-deleted, sorted by ordinal.
pub fn derive_active_history(
    history: &[ThreadMessageRecord],
    last_compaction_ordinal: Option<u64>,
) -> Vec<ThreadMessageRecord> {
    let boundary = last_compaction_ordinal.unwrap_or(0);
    let mut active: Vec<ThreadMessageRecord> = history
        .iter()
        .filter(|m| m.ordinal > boundary && m.deleted_at.is_none())
        .cloned()
        .collect();
    active.sort_by_key(|m| m.ordinal);
    active
}

/// [`derive_active_history`] over a thread's own history and boundary
pub fn active_history(thread: &ThreadRecord) -> Vec<ThreadMessageRecord> {
    derive_active_history(&thread.history, thread.last_compaction_ordinal)
}

/// Active history decoded for a model request
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub messages: Vec<Message>,
    pub context_size: u64,
}

impl ContextWindow {
    /// Payloads that do not decode as a chat [`Message`] are skipped.
    pub fn from_thread(thread: &ThreadRecord) -> Self {
        let messages = active_history(thread)
            .into_iter()
            .filter_map(|record| serde_json::from_value(record.message).ok())
            .collect();
        Self {
            messages,
            context_size: thread.context_size,
        }
    }
}
