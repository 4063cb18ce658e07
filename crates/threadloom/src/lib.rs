//! # Threadloom
//!
//! Durable memory for conversational agents.
//!
//! Each conversation is a thread: one JSON document holding its full message
//! history, a compaction boundary, and cached usage and context-size
//! figures. Threadloom stores threads through a pluggable storage backend,
//! serializes writes per store instance, validates everything it reads, and
//! compacts threads that outgrow their token budget by asking the caller for
//! a summary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use threadloom::prelude::*;
//!
//! struct Recap;
//!
//! #[async_trait]
//! impl Summarizer for Recap {
//!     async fn summarize(&self, history: &[ThreadMessageRecord]) -> anyhow::Result<Message> {
//!         Ok(Message::ai(format!("{} earlier messages", history.len())))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = ThreadStore::builder()
//!         .local_storage()
//!         .root_dir("data/threads")
//!         .build()?;
//!
//!     let thread = store
//!         .create_thread(NewThread::new("user_123").with_title("Rust questions"))
//!         .await?;
//!
//!     store
//!         .upsert_message(
//!             &thread.id,
//!             UpsertMessage::from_message(&Message::human("How do lifetimes work?"))?
//!                 .with_usage(UsageInput::new(12, 0, 0)),
//!         )
//!         .await?;
//!
//!     let outcome = store
//!         .compact_if_needed(&thread.id, &CompactionPolicy::default(), &Recap)
//!         .await?;
//!     if let Some(outcome) = outcome {
//!         println!("compacted: {}", outcome.did_compact);
//!     }
//!
//!     let window = store.context_window(&thread.id).await?;
//!     println!("{:?}", window.map(|w| w.context_size));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`threadloom-types`**: persisted records and the chat message payload
//! - **`threadloom-context`**: token counting, usage aggregation, active
//!   history and the compaction engine
//! - **`threadloom-persist`**: storage backends, validation, the write queue
//!   and the [`ThreadStore`] facade
//!
//! ## Known boundary
//!
//! Writes are serialized within one [`ThreadStore`]. Two processes (or two
//! store instances) writing the same thread are not coordinated.

pub mod prelude;

pub use threadloom_types::{
    Content, ContentPart, FunctionCall, Message, ThreadInfo, ThreadMessageRecord, ThreadRecord,
    ToolCall, Usage, UsageInput, CONTENT_SCHEMA_VERSION, SCHEMA_VERSION,
};

pub use threadloom_context::{
    active_history, aggregate_context_size, aggregate_usage, derive_active_history,
    is_compaction_summary, summarization_prompt, summary_text, CharEstimateCounter,
    CompactionOutcome, CompactionPolicy, ContextWindow, Summarizer, TiktokenCounter,
    TokenCounter, AUTO_COMPACT_TOOL_NAME, DEFAULT_SUMMARIZATION_PROMPT,
};

pub use threadloom_persist::{
    AnyJsonValidator, ChatMessageValidator, ErrorKind, ListThreadsQuery, LocalStorage,
    MemoryStorage, MessageValidator, ModelPricing, NewThread, PersistError, PricingCalculator,
    StaticPricing, Storage, StoreConfig, ThreadSettings, ThreadStore, ThreadStoreBuilder,
    ThreadWithMessages, UpsertMessage,
};
