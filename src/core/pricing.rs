//! Token pricing and conversation cost accounting.
//!
//! Costs are accumulated in USD. Conversion into the display currency is a
//! single multiplication applied when metrics are rendered, never stored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::message::Turn;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

pub const DEFAULT_CURRENCY_CODE: &str = "PLN";
pub const DEFAULT_CURRENCY_RATE: f64 = 3.97;

/// Price of a model in USD per token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_token_rate: f64,
    pub output_token_rate: f64,
}

impl ModelPricing {
    pub fn per_million(input: f64, output: f64) -> Self {
        Self {
            input_token_rate: input / TOKENS_PER_MILLION,
            output_token_rate: output / TOKENS_PER_MILLION,
        }
    }

    pub fn input_per_million(&self) -> f64 {
        self.input_token_rate * TOKENS_PER_MILLION
    }

    pub fn output_per_million(&self) -> f64 {
        self.output_token_rate * TOKENS_PER_MILLION
    }
}

/// A pricing row as written in TOML, rates per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingEntry {
    pub model: String,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl PricingEntry {
    fn to_pricing(&self) -> ModelPricing {
        ModelPricing::per_million(self.input_per_million, self.output_per_million)
    }
}

#[derive(Debug, Deserialize)]
struct BuiltinPricingConfig {
    pricing: Vec<PricingEntry>,
}

/// Read-only model id to price mapping, fixed once the session starts.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    models: BTreeMap<String, ModelPricing>,
}

impl PricingTable {
    /// Prices shipped with the binary.
    pub fn builtin() -> Self {
        const CONFIG_CONTENT: &str = include_str!("builtin_pricing.toml");

        let config: BuiltinPricingConfig =
            toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_pricing.toml");

        Self::from_entries(&config.pricing)
    }

    pub fn from_entries(entries: &[PricingEntry]) -> Self {
        let mut table = Self::default();
        table.apply(entries);
        table
    }

    /// Built-in prices with user entries layered on top.
    pub fn with_overrides(overrides: &[PricingEntry]) -> Self {
        let mut table = Self::builtin();
        table.apply(overrides);
        table
    }

    fn apply(&mut self, entries: &[PricingEntry]) {
        for entry in entries {
            self.models
                .insert(entry.model.to_ascii_lowercase(), entry.to_pricing());
        }
    }

    pub fn get(&self, model: &str) -> Option<ModelPricing> {
        self.models.get(&model.to_ascii_lowercase()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ModelPricing)> {
        self.models
            .iter()
            .map(|(model, pricing)| (model.as_str(), *pricing))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Total cost in USD of every turn that carries a usage record.
pub fn cost<'a, I>(turns: I, pricing: &ModelPricing) -> f64
where
    I: IntoIterator<Item = &'a Turn>,
{
    turns
        .into_iter()
        .filter_map(|turn| turn.usage.as_ref())
        .map(|usage| {
            usage.prompt_tokens as f64 * pricing.input_token_rate
                + usage.completion_tokens as f64 * pricing.output_token_rate
        })
        // An empty `sum()` of floats is -0.0
        .fold(0.0, |total, amount| total + amount)
}

/// Second currency shown next to the USD cost.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayCurrency {
    pub code: String,
    pub rate: f64,
}

impl DisplayCurrency {
    pub fn new(code: impl Into<String>, rate: f64) -> Self {
        Self {
            code: code.into(),
            rate,
        }
    }

    pub fn convert(&self, usd: f64) -> f64 {
        usd * self.rate
    }
}

impl Default for DisplayCurrency {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY_CODE, DEFAULT_CURRENCY_RATE)
    }
}

/// Both cost figures for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMetrics {
    pub usd: f64,
    pub converted: f64,
    pub currency_code: String,
}

impl CostMetrics {
    pub fn new(usd: f64, currency: &DisplayCurrency) -> Self {
        Self {
            usd,
            converted: currency.convert(usd),
            currency_code: currency.code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Usage;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn builtin_table_has_expected_models() {
        let table = PricingTable::builtin();
        let gpt4o = table.get("gpt-4o").expect("gpt-4o should be priced");
        assert_close(gpt4o.input_token_rate, 5.0 / 1_000_000.0);
        assert_close(gpt4o.output_token_rate, 15.0 / 1_000_000.0);

        let mini = table.get("GPT-4o-Mini").expect("lookup is case-insensitive");
        assert_close(mini.input_token_rate, 0.15 / 1_000_000.0);
        assert_close(mini.output_token_rate, 0.6 / 1_000_000.0);
    }

    #[test]
    fn overrides_replace_and_extend_builtins() {
        let table = PricingTable::with_overrides(&[
            PricingEntry {
                model: "gpt-4o".to_string(),
                input_per_million: 2.5,
                output_per_million: 10.0,
            },
            PricingEntry {
                model: "local-llama".to_string(),
                input_per_million: 0.0,
                output_per_million: 0.0,
            },
        ]);

        assert_close(
            table.get("gpt-4o").map(|p| p.input_token_rate).unwrap_or_default(),
            2.5 / 1_000_000.0,
        );
        assert!(table.get("local-llama").is_some());
        assert!(table.get("gpt-4o-mini").is_some());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn cost_sums_prompt_and_completion_tokens() {
        let pricing = ModelPricing {
            input_token_rate: 0.5,
            output_token_rate: 2.0,
        };
        let turns = vec![
            Turn::user("A"),
            Turn::assistant("B", Usage::new(10, 4, None)),
            Turn::user("C"),
            Turn::assistant("D", Usage::new(3, 1, Some(4))),
        ];

        assert_close(cost(&turns, &pricing), 13.0 * 0.5 + 5.0 * 2.0);
    }

    #[test]
    fn zero_usage_turn_leaves_cost_unchanged() {
        let pricing = PricingTable::builtin()
            .get("gpt-4o")
            .expect("gpt-4o should be priced");
        let mut turns = vec![Turn::assistant("B", Usage::new(120, 80, None))];
        let before = cost(&turns, &pricing);

        turns.push(Turn::assistant("empty", Usage::default()));
        turns.push(Turn::user("no usage at all"));

        assert_close(cost(&turns, &pricing), before);
    }

    #[test]
    fn empty_history_costs_nothing() {
        let pricing = ModelPricing::per_million(5.0, 15.0);
        let turns: Vec<Turn> = Vec::new();
        assert_eq!(cost(&turns, &pricing), 0.0);
        assert!(cost(&turns, &pricing).is_sign_positive());

        let prompts_only = vec![Turn::user("A"), Turn::user("B")];
        let total = cost(&prompts_only, &pricing);
        assert!(total.is_sign_positive());
        assert_eq!(format!("{total:.4}"), "0.0000");
    }

    #[test]
    fn display_currency_converts_at_render_time() {
        let metrics = CostMetrics::new(2.0, &DisplayCurrency::default());
        assert_close(metrics.usd, 2.0);
        assert_close(metrics.converted, 7.94);
        assert_eq!(metrics.currency_code, "PLN");
    }
}
