//! Data model for the Threadloom conversation store.
//!
//! - [`ThreadRecord`] / [`ThreadMessageRecord`]: the persisted shapes
//! - [`Usage`]: token, duration and cost totals
//! - [`payload`]: the default chat message payload stored in history

pub mod payload;
pub mod record;
pub mod thread;
pub mod usage;

pub use payload::{Content, ContentPart, FunctionCall, Message, ToolCall};
pub use record::ThreadMessageRecord;
pub use thread::{ThreadInfo, ThreadRecord, CONTENT_SCHEMA_VERSION, SCHEMA_VERSION};
pub use usage::{Usage, UsageInput};
