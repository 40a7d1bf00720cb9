//! Per-model dollar cost calculation.

use layer0::CostBreakdown;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Dollar price per token, input and output, for one model.
#[derive(Debug, Clone, Copy)]
struct ModelPrice {
    input_per_token: Decimal,
    output_per_token: Decimal,
}

/// A table of per-model token prices.
///
/// Looking up an unknown model yields zero cost, not an error — the
/// caller's token counts are still meaningful even when pricing isn't.
#[derive(Clone)]
pub struct CostModel {
    prices: HashMap<&'static str, ModelPrice>,
}

impl CostModel {
    /// The built-in price table, covering the models the bundled Anthropic
    /// adapter targets. Prices are dollars per token (list price / 1,000,000).
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();
        prices.insert(
            "claude-opus-4-5",
            ModelPrice {
                input_per_token: Decimal::new(1500, 8),  // $15 / 1M tokens
                output_per_token: Decimal::new(7500, 8), // $75 / 1M tokens
            },
        );
        prices.insert(
            "claude-sonnet-4-20250514",
            ModelPrice {
                input_per_token: Decimal::new(300, 8),  // $3 / 1M tokens
                output_per_token: Decimal::new(1500, 8), // $15 / 1M tokens
            },
        );
        prices.insert(
            "claude-haiku-4-5",
            ModelPrice {
                input_per_token: Decimal::new(80, 8),  // $0.80 / 1M tokens
                output_per_token: Decimal::new(400, 8), // $4 / 1M tokens
            },
        );
        Self { prices }
    }

    /// An empty price table; every model is unpriced.
    pub fn empty() -> Self {
        Self { prices: HashMap::new() }
    }

    /// Register or override the price for `model`.
    pub fn set_price(
        &mut self,
        model: &'static str,
        input_per_token: Decimal,
        output_per_token: Decimal,
    ) {
        self.prices.insert(model, ModelPrice { input_per_token, output_per_token });
    }

    /// Build a [`CostBreakdown`] for one provider call.
    ///
    /// An unknown `model` produces zero `input_cost`/`output_cost` while
    /// `total_tokens` is still populated from `prompt_tokens + completion_tokens`.
    pub fn new_cost_breakdown(
        &self,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
    ) -> CostBreakdown {
        match self.prices.get(model) {
            Some(price) => CostBreakdown::new(
                prompt_tokens,
                completion_tokens,
                Decimal::from(prompt_tokens) * price.input_per_token,
                Decimal::from(completion_tokens) * price.output_per_token,
            ),
            None => {
                CostBreakdown::new(prompt_tokens, completion_tokens, Decimal::ZERO, Decimal::ZERO)
            }
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_is_zero_cost_with_tokens_populated() {
        let model = CostModel::empty();
        let cost = model.new_cost_breakdown("made-up-model", 100, 50);
        assert_eq!(cost.total_tokens, 150);
        assert_eq!(cost.total_cost, Decimal::ZERO);
    }

    #[test]
    fn known_model_applies_price_table() {
        let model = CostModel::with_defaults();
        let cost = model.new_cost_breakdown("claude-sonnet-4-20250514", 1_000_000, 1_000_000);
        assert_eq!(cost.input_cost, Decimal::new(3, 0));
        assert_eq!(cost.output_cost, Decimal::new(15, 0));
        assert_eq!(cost.total_cost, Decimal::new(18, 0));
    }

    #[test]
    fn cost_breakdown_total_tokens_is_sum() {
        let model = CostModel::with_defaults();
        let cost = model.new_cost_breakdown("claude-haiku-4-5", 10, 20);
        assert_eq!(cost.total_tokens, 30);
    }
}
