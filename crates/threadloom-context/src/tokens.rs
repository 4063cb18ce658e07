use anyhow::Result;
use serde_json::Value;
use tiktoken_rs::{cl100k_base, CoreBPE};

use threadloom_types::Message;

/// Counts tokens in a piece of text.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u64;
}

/// Token counter backed by tiktoken's `cl100k_base` encoding
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn new() -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| anyhow::anyhow!("Tokenizer error: {}", e))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len() as u64
    }
}

/// Estimate: 1 token ≈ 4 characters, rounded up
#[derive(Debug, Clone, Copy, Default)]
pub struct CharEstimateCounter;

impl TokenCounter for CharEstimateCounter {
    fn count(&self, text: &str) -> u64 {
        (text.chars().count() as u64).div_ceil(4)
    }
}

/// Text of an opaque message payload, as the model would read it.
///
/// Payloads that decode as a chat [`Message`] contribute their content and
/// tool calls; anything else contributes every string leaf it holds.
pub fn payload_text(payload: &Value) -> String {
    match serde_json::from_value::<Message>(payload.clone()) {
        Ok(message) => message.token_text(),
        Err(_) => {
            let mut leaves = Vec::new();
            collect_strings(payload, &mut leaves);
            leaves.join("\n")
        }
    }
}

fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}
