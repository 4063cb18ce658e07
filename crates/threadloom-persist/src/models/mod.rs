mod message;
mod thread;

pub use message::UpsertMessage;
pub use thread::{ListThreadsQuery, NewThread, ThreadSettings, ThreadWithMessages};
