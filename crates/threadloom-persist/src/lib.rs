//! File-per-thread conversation store.
//!
//! [`ThreadStore`] keeps each conversation as one JSON document in a
//! pluggable [`Storage`] backend. Writes are serialized per store instance,
//! every byte read is validated before use, and threads that outgrow their
//! token budget are compacted through a caller-supplied summarizer.
//!
//! ```no_run
//! use serde_json::json;
//! use threadloom_persist::{NewThread, ThreadStore, UpsertMessage};
//!
//! # async fn run() -> threadloom_persist::Result<()> {
//! let store = ThreadStore::builder()
//!     .local_storage()
//!     .root_dir("data/threads")
//!     .build()?;
//!
//! let thread = store.create_thread(NewThread::new("user_1").with_title("Hello")).await?;
//! store
//!     .upsert_message(&thread.id, UpsertMessage::new(json!({"role": "user", "content": "Hi!"})))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![doc(test(attr(deny(unused_imports))))]

pub mod builder;
pub mod config;
pub mod error;
pub mod models;
pub mod pricing;
pub mod queue;
pub mod schema;
pub mod storage;
mod store;

pub use builder::ThreadStoreBuilder;
pub use crate::config::{LoggingConfig, PricingConfig, StorageConfig, StoreConfig};
pub use error::{ErrorKind, PersistError, Result};
pub use models::{ListThreadsQuery, NewThread, ThreadSettings, ThreadWithMessages, UpsertMessage};
pub use pricing::{resolve_usage, ModelPricing, PricingCalculator, StaticPricing};
pub use queue::{WriteQueue, WriteSlot};
pub use schema::{validate_thread_id, AnyJsonValidator, ChatMessageValidator, MessageValidator, SchemaValidator};
pub use storage::{DirEntry, FileStat, LocalStorage, MemoryStorage, Storage};
pub use store::ThreadStore;
