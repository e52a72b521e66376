//! Core types describing configured models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability/cost tier of a model.
///
/// Ordering goes from cheapest to most capable, so `max()` over a set of
/// tiers yields the highest-capability one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheapest and fastest.
    Economy,
    /// Default balance of cost and quality.
    Balanced,
    /// Highest capability, highest cost.
    Premium,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelTier::Economy => "economy",
            ModelTier::Balanced => "balanced",
            ModelTier::Premium => "premium",
        };
        f.write_str(s)
    }
}

/// Information about a configured model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Short alias used in configuration (e.g. `sonnet-4`).
    pub alias: String,
    /// Name sent to the provider API.
    pub name: String,
    /// Capability tier.
    pub tier: ModelTier,
    /// Cost in USD per thousand tokens (input and output billed alike).
    pub cost_per_1k_tokens: f64,
    /// Maximum context size in tokens.
    pub max_tokens: u32,
    /// Task classifications this model is a good fit for.
    pub best_for: Vec<String>,
}

impl ModelInfo {
    /// Create a new model info builder.
    pub fn builder(alias: &str, name: &str) -> ModelInfoBuilder {
        ModelInfoBuilder::new(alias, name)
    }

    /// Whether `name` refers to this model, by alias or API name.
    pub fn matches(&self, name: &str) -> bool {
        self.alias == name || self.name == name
    }

    /// Cost for a number of billed tokens.
    pub fn cost_for(&self, tokens: u64) -> f64 {
        tokens as f64 * self.cost_per_1k_tokens / 1000.0
    }
}

/// Builder for constructing `ModelInfo`.
#[derive(Debug)]
pub struct ModelInfoBuilder {
    alias: String,
    name: String,
    tier: ModelTier,
    cost_per_1k_tokens: f64,
    max_tokens: u32,
    best_for: Vec<String>,
}

impl ModelInfoBuilder {
    fn new(alias: &str, name: &str) -> Self {
        Self {
            alias: alias.to_string(),
            name: name.to_string(),
            tier: ModelTier::Balanced,
            cost_per_1k_tokens: 0.0,
            max_tokens: 200_000,
            best_for: Vec::new(),
        }
    }

    /// Set the tier.
    pub fn tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    /// Set the per-thousand-token rate.
    pub fn cost_per_1k(mut self, cost: f64) -> Self {
        self.cost_per_1k_tokens = cost;
        self
    }

    /// Set the context window size.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Set the classifications this model suits.
    pub fn best_for(mut self, uses: &[&str]) -> Self {
        self.best_for = uses.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Build the `ModelInfo`.
    pub fn build(self) -> ModelInfo {
        ModelInfo {
            alias: self.alias,
            name: self.name,
            tier: self.tier,
            cost_per_1k_tokens: self.cost_per_1k_tokens,
            max_tokens: self.max_tokens,
            best_for: self.best_for,
        }
    }
}
