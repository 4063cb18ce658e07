use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Token, duration and cost totals.
///
/// Counts come from callers, so addition saturates at `u64::MAX`.
///
/// Stored per message and, aggregated, per thread. Thread-level
/// `input_tokens` is the token count of the active history rather than a
/// sum of per-message inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_duration_ms: u64,
    pub total_cost_usd: f64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64, total_duration_ms: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_duration_ms,
            total_cost_usd: 0.0,
        }
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.total_cost_usd = cost_usd;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.input_tokens == 0
            && self.output_tokens == 0
            && self.total_duration_ms == 0
            && self.total_cost_usd == 0.0
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, other: Usage) -> Usage {
        Usage {
            input_tokens: self.input_tokens.saturating_add(other.input_tokens),
            output_tokens: self.output_tokens.saturating_add(other.output_tokens),
            total_duration_ms: self.total_duration_ms.saturating_add(other.total_duration_ms),
            total_cost_usd: self.total_cost_usd + other.total_cost_usd,
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Usage) {
        *self = *self + other;
    }
}

/// Usage reported by a caller alongside a message.
///
/// `total_cost_usd` wins when present; otherwise the store prices the tokens
/// with its pricing calculator, keyed by `model_id` (or the thread's model).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInput {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
}

impl UsageInput {
    pub fn new(input_tokens: u64, output_tokens: u64, total_duration_ms: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_duration_ms,
            ..Default::default()
        }
    }

    pub fn cost(mut self, cost_usd: f64) -> Self {
        self.total_cost_usd = Some(cost_usd);
        self
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_add_is_field_wise() {
        let a = Usage::new(10, 1, 100).with_cost(0.5);
        let b = Usage::new(3, 8, 250).with_cost(0.25);
        let sum = a + b;
        assert_eq!(sum.input_tokens, 13);
        assert_eq!(sum.output_tokens, 9);
        assert_eq!(sum.total_duration_ms, 350);
        assert_eq!(sum.total_cost_usd, 0.75);
    }

    #[test]
    fn test_usage_add_saturates() {
        let big = Usage::new(u64::MAX, u64::MAX - 1, u64::MAX);
        let mut sum = big + Usage::new(1, 5, 1);
        assert_eq!(sum.input_tokens, u64::MAX);
        assert_eq!(sum.output_tokens, u64::MAX);
        assert_eq!(sum.total_duration_ms, u64::MAX);

        sum += big;
        assert_eq!(sum.output_tokens, u64::MAX);
    }

    #[test]
    fn test_usage_wire_names() {
        let json = serde_json::to_value(Usage::new(1, 2, 3)).unwrap();
        assert_eq!(json["inputTokens"], 1);
        assert_eq!(json["outputTokens"], 2);
        assert_eq!(json["totalDurationMs"], 3);
        assert_eq!(json["totalCostUsd"], 0.0);
    }
}
