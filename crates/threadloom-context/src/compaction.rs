use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use threadloom_types::{Message, ThreadMessageRecord, ThreadRecord, ToolCall};

use crate::active::active_history;
use crate::tokens::TokenCounter;
use crate::usage::{aggregate_context_size, refresh_derived};

/// Reserved tool name marking a synthetic compaction summary.
pub const AUTO_COMPACT_TOOL_NAME: &str = "AutoCompactHistory";

/// Token budget a thread's active history must fit in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionPolicy {
    pub max_context_tokens: u64,
    #[serde(default)]
    pub reserved_output_tokens: u64,
}

impl CompactionPolicy {
    pub fn new(max_context_tokens: u64) -> Self {
        Self {
            max_context_tokens,
            reserved_output_tokens: 0,
        }
    }

    pub fn with_reserved_output(mut self, tokens: u64) -> Self {
        self.reserved_output_tokens = tokens;
        self
    }

    pub fn exceeded_by(&self, used_tokens: u64) -> bool {
        used_tokens.saturating_add(self.reserved_output_tokens) > self.max_context_tokens
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            max_context_tokens: 30_000,
            reserved_output_tokens: 4_096,
        }
    }
}

/// Reduces an active history to a single summary message.
///
/// Supplied by the caller; the store only orchestrates when it runs and
/// where the result lands.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, active_history: &[ThreadMessageRecord]) -> Result<Message>;
}

/// Result of a compaction check
#[derive(Debug, Clone)]
pub struct CompactionOutcome {
    pub did_compact: bool,
    pub thread: ThreadRecord,
}

/// Active records selected for summarization
#[derive(Debug, Clone)]
pub struct CompactionPlan {
    pub active: Vec<ThreadMessageRecord>,
    pub used_tokens: u64,
}

/// Whether the thread's active history overflows the policy.
pub fn should_compact(thread: &ThreadRecord, policy: &CompactionPolicy, counter: &dyn TokenCounter) -> bool {
    let used = aggregate_context_size(&active_history(thread), counter);
    policy.exceeded_by(used)
}

/// Decide whether to compact, and over which records.
///
/// Returns `None` when the window fits, when it is empty, or when it is
/// already a lone compaction summary that cannot shrink further.
pub fn plan_compaction(
    thread: &ThreadRecord,
    policy: &CompactionPolicy,
    counter: &dyn TokenCounter,
) -> Option<CompactionPlan> {
    let active = active_history(thread);
    let used_tokens = aggregate_context_size(&active, counter);
    if !policy.exceeded_by(used_tokens) || active.is_empty() {
        return None;
    }
    if active.len() == 1 && is_compaction_summary(&active[0].message) {
        tracing::warn!(
            thread_id = %thread.id,
            used_tokens,
            max_context_tokens = policy.max_context_tokens,
            "Active history is a single summary over budget; skipping compaction"
        );
        return None;
    }
    Some(CompactionPlan { active, used_tokens })
}

/// Append the summary record and advance the compaction boundary.
///
/// The boundary becomes the last ordinal before the summary, so the summary
/// is the entire active window afterwards. Returns the summary's ordinal.
pub fn apply_compaction(
    thread: &mut ThreadRecord,
    summary: &Message,
    plan: &CompactionPlan,
    counter: &dyn TokenCounter,
    now: DateTime<Utc>,
) -> u64 {
    let boundary = thread.last_ordinal();
    let ordinal = thread.next_ordinal();
    let payload = summary_payload(summary, boundary, plan.active.len());
    let record = ThreadMessageRecord::new(uuid::Uuid::new_v4().to_string(), ordinal, payload, now);
    let summary_tokens = aggregate_context_size(std::slice::from_ref(&record), counter);

    thread.history.push(record);
    thread.last_compaction_ordinal = Some(boundary);
    thread.updated_at = now;
    refresh_derived(thread, counter);

    if thread.context_size != summary_tokens {
        tracing::warn!(
            thread_id = %thread.id,
            context_size = thread.context_size,
            summary_tokens,
            "Post-compaction context size differs from the summary alone"
        );
    }

    tracing::info!(
        thread_id = %thread.id,
        boundary,
        summarized = plan.active.len(),
        tokens_before = plan.used_tokens,
        tokens_after = thread.context_size,
        "Compacted thread history"
    );
    ordinal
}

/// Wrap a summary as an assistant tool call so renderers can show it as-is.
pub fn summary_payload(summary: &Message, compacted_through: u64, message_count: usize) -> Value {
    let arguments = json!({
        "summary": summary.token_text(),
        "compactedThroughOrdinal": compacted_through,
        "messageCount": message_count,
    });
    let call = ToolCall::function(
        format!("compact_{}", uuid::Uuid::new_v4().simple()),
        AUTO_COMPACT_TOOL_NAME,
        arguments.to_string(),
    );
    json!(Message::ai_with_tools(vec![call]))
}

/// Whether a payload is a compaction summary written by [`apply_compaction`].
pub fn is_compaction_summary(payload: &Value) -> bool {
    summary_text(payload).is_some()
}

/// Summary text carried by a compaction summary payload
pub fn summary_text(payload: &Value) -> Option<String> {
    let message: Message = serde_json::from_value(payload.clone()).ok()?;
    let call = message
        .tool_calls()
        .iter()
        .find(|call| call.function.name == AUTO_COMPACT_TOOL_NAME)?;
    let arguments: Value = call.parse_arguments().ok()?;
    arguments.get("summary")?.as_str().map(str::to_string)
}
