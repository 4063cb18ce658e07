use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use threadloom_types::{Usage, UsageInput};

/// Prices token usage for a model.
///
/// `None` means the model is unknown to the calculator, in which case the
/// message is recorded at zero cost.
pub trait PricingCalculator: Send + Sync {
    fn cost_usd(&self, model_id: &str, input_tokens: u64, output_tokens: u64) -> Option<f64>;
}

/// Pricing per 1 million tokens (USD).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (output_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

/// Fixed price table keyed by model id
#[derive(Debug, Clone, Default)]
pub struct StaticPricing {
    models: HashMap<String, ModelPricing>,
}

impl StaticPricing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model_id: impl Into<String>, pricing: ModelPricing) -> Self {
        self.models.insert(model_id.into(), pricing);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl From<HashMap<String, ModelPricing>> for StaticPricing {
    fn from(models: HashMap<String, ModelPricing>) -> Self {
        Self { models }
    }
}

impl PricingCalculator for StaticPricing {
    fn cost_usd(&self, model_id: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
        self.models
            .get(model_id)
            .map(|pricing| pricing.cost(input_tokens, output_tokens))
    }
}

/// Turn caller-reported usage into stored usage.
///
/// Cost comes from, in order: the explicit cost on `input`, the calculator
/// keyed by `input.model_id` (else `fallback_model`), zero.
pub fn resolve_usage(
    input: &UsageInput,
    fallback_model: Option<&str>,
    pricing: Option<&dyn PricingCalculator>,
) -> Usage {
    let cost = input.total_cost_usd.or_else(|| {
        let model_id = input.model_id.as_deref().or(fallback_model)?;
        pricing?.cost_usd(model_id, input.input_tokens, input.output_tokens)
    });
    Usage::new(input.input_tokens, input.output_tokens, input.total_duration_ms)
        .with_cost(cost.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pricing() -> StaticPricing {
        StaticPricing::new().with_model("gpt-4o-mini", ModelPricing::new(0.15, 0.6))
    }

    #[test]
    fn test_model_pricing_is_per_million() {
        let cost = ModelPricing::new(2.0, 8.0).cost(1_000_000, 500_000);
        assert!((cost - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_cost_wins() {
        let input = UsageInput::new(1_000_000, 0, 10).cost(0.01).model("gpt-4o-mini");
        let usage = resolve_usage(&input, None, Some(&pricing()));
        assert_eq!(usage.total_cost_usd, 0.01);
        assert_eq!(usage.total_duration_ms, 10);
    }

    #[test]
    fn test_calculator_uses_fallback_model() {
        let input = UsageInput::new(1_000_000, 1_000_000, 0);
        let usage = resolve_usage(&input, Some("gpt-4o-mini"), Some(&pricing()));
        assert!((usage.total_cost_usd - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_or_no_calculator_is_free() {
        let input = UsageInput::new(500, 500, 0).model("unknown");
        assert_eq!(resolve_usage(&input, None, Some(&pricing())).total_cost_usd, 0.0);
        let input = UsageInput::new(500, 500, 0).model("gpt-4o-mini");
        assert_eq!(resolve_usage(&input, None, None).total_cost_usd, 0.0);
    }
}
