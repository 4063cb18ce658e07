mod content;
mod message;
mod tool;

pub use content::{Content, ContentPart};
pub use message::Message;
pub use tool::{FunctionCall, ToolCall};
