//! Context accounting for Threadloom threads.
//!
//! Everything here is pure over a [`ThreadRecord`](threadloom_types::ThreadRecord):
//! token counting, usage aggregation, active-history derivation and the
//! compaction engine. The only async piece is the caller-supplied
//! [`Summarizer`].

mod active;
mod compaction;
mod templates;
mod tokens;
mod usage;

pub use active::{active_history, derive_active_history, ContextWindow};
pub use compaction::{
    apply_compaction, is_compaction_summary, plan_compaction, should_compact, summary_payload,
    summary_text, CompactionOutcome, CompactionPlan, CompactionPolicy, Summarizer,
    AUTO_COMPACT_TOOL_NAME,
};
pub use templates::{render_prompt, summarization_prompt, DEFAULT_SUMMARIZATION_PROMPT};
pub use tokens::{payload_text, CharEstimateCounter, TiktokenCounter, TokenCounter};
pub use usage::{aggregate_context_size, aggregate_usage, refresh_derived};
