//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use threadloom::prelude::*;
//! ```

pub use crate::{
    CompactionOutcome, CompactionPolicy, ContextWindow, ListThreadsQuery, LocalStorage,
    MemoryStorage, Message, NewThread, PersistError, Storage, Summarizer, ThreadInfo,
    ThreadMessageRecord, ThreadRecord, ThreadSettings, ThreadStore, UpsertMessage, Usage,
    UsageInput,
};

pub use async_trait::async_trait;
