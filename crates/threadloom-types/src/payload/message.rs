use serde::{Deserialize, Serialize};
use super::content::Content;
use super::tool::ToolCall;

/// Chat message payload (provider-agnostic)
///
/// This is the default payload shape stored inside a thread's history. The
/// store itself keeps payloads as opaque JSON; this type is what the default
/// validator and the context window decode them into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt (instructions)
    System {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// User/Human message
    #[serde(rename = "user")]
    Human {
        content: Content,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Assistant/AI message
    #[serde(rename = "assistant")]
    AI {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<Content>,

        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,

        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Tool result message
    Tool {
        tool_call_id: String,
        content: Content,
    },
}

impl Message {
    /// Create system message
    pub fn system(content: impl Into<Content>) -> Self {
        Self::System {
            content: content.into(),
            name: None,
        }
    }

    /// Create human message
    pub fn human(content: impl Into<Content>) -> Self {
        Self::Human {
            content: content.into(),
            name: None,
        }
    }

    /// Create AI message with text
    pub fn ai(content: impl Into<Content>) -> Self {
        Self::AI {
            content: Some(content.into()),
            tool_calls: None,
            name: None,
        }
    }

    /// Create AI message with tool calls
    pub fn ai_with_tools(tool_calls: Vec<ToolCall>) -> Self {
        Self::AI {
            content: None,
            tool_calls: Some(tool_calls),
            name: None,
        }
    }

    /// Create tool result message
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<Content>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    /// Get role as string
    pub fn role(&self) -> &str {
        match self {
            Self::System { .. } => "system",
            Self::Human { .. } => "user",
            Self::AI { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }

    /// Tool calls carried by an assistant message
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::AI { tool_calls: Some(calls), .. } => calls,
            _ => &[],
        }
    }

    /// Text the model actually reads: content plus tool call names and arguments.
    pub fn token_text(&self) -> String {
        let mut pieces: Vec<String> = Vec::new();
        match self {
            Self::System { content, .. }
            | Self::Human { content, .. }
            | Self::Tool { content, .. } => pieces.push(content.to_plain_text()),
            Self::AI { content, tool_calls, .. } => {
                if let Some(content) = content {
                    pieces.push(content.to_plain_text());
                }
                for call in tool_calls.iter().flatten() {
                    pieces.push(call.function.name.clone());
                    pieces.push(call.function.arguments.clone());
                }
            }
        }
        pieces.retain(|p| !p.is_empty());
        pieces.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_with_wire_names() {
        let json = serde_json::to_value(Message::human("Hello")).unwrap();
        assert_eq!(json["role"], "user");

        let json = serde_json::to_value(Message::ai("Hi")).unwrap();
        assert_eq!(json["role"], "assistant");
    }

    #[test]
    fn test_token_text_includes_tool_calls() {
        let msg = Message::ai_with_tools(vec![ToolCall::function(
            "call_1",
            "get_weather",
            r#"{"city":"Lisbon"}"#,
        )]);
        let text = msg.token_text();
        assert!(text.contains("get_weather"));
        assert!(text.contains("Lisbon"));
    }

    #[test]
    fn test_tool_result_deserialization() {
        let json = r#"{"role":"tool","tool_call_id":"call_1","content":"42"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role(), "tool");
        assert_eq!(msg.token_text(), "42");
    }
}
