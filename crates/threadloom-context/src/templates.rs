use threadloom_types::{Message, ThreadMessageRecord};

use crate::compaction::summary_text;
use crate::tokens::payload_text;

pub const DEFAULT_SUMMARIZATION_PROMPT: &str = r#"You are compacting a long conversation so it can continue within a limited context window.

Previous summary:
<previous_summary>

Write a concise summary of the conversation below. Keep every fact, decision, open question and piece of user-provided data needed to continue the conversation. Do not add commentary.

Conversation:
<conversation>"#;

const NO_PREVIOUS_SUMMARY: &str = "None.";

/// Render the default summarization prompt for an active history.
///
/// An earlier compaction summary inside the history is folded into the
/// `<previous_summary>` slot instead of the transcript.
pub fn summarization_prompt(active_history: &[ThreadMessageRecord]) -> String {
    render_prompt(DEFAULT_SUMMARIZATION_PROMPT, active_history)
}

pub fn render_prompt(template: &str, active_history: &[ThreadMessageRecord]) -> String {
    let mut previous = Vec::new();
    let mut lines = Vec::new();

    for record in active_history {
        if let Some(summary) = summary_text(&record.message) {
            previous.push(summary);
            continue;
        }
        lines.push(transcript_line(record));
    }

    let previous_summary = if previous.is_empty() {
        NO_PREVIOUS_SUMMARY.to_string()
    } else {
        previous.join("\n\n")
    };

    template
        .replace("<previous_summary>", &previous_summary)
        .replace("<conversation>", &lines.join("\n"))
}

fn transcript_line(record: &ThreadMessageRecord) -> String {
    let label = match serde_json::from_value::<Message>(record.message.clone()) {
        Ok(Message::System { .. }) => "System",
        Ok(Message::Human { .. }) => "User",
        Ok(Message::AI { .. }) => "Assistant",
        Ok(Message::Tool { .. }) => "Tool",
        Err(_) => "Message",
    };
    format!("{}: {}", label, payload_text(&record.message))
}
