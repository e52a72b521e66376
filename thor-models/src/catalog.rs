//! Catalog of configured models.
//!
//! The catalog keeps models in registration order and answers the three
//! questions the selector needs: which model is cheapest, which is the most
//! capable, and which is the balanced default.

use serde::{Deserialize, Serialize};

use crate::types::{ModelInfo, ModelTier};
use crate::{Error, Result};

/// Ordered set of models that can be selected and billed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    models: Vec<ModelInfo>,
}

impl ModelCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with the stock Claude aliases.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register(
            ModelInfo::builder("haiku-4", "claude-3-haiku-20240307")
                .tier(ModelTier::Economy)
                .cost_per_1k(0.00025)
                .best_for(&["simple_query", "quick_answer", "basic_task"])
                .build(),
        );
        catalog.register(
            ModelInfo::builder("sonnet-4", "claude-3-5-sonnet-20241022")
                .tier(ModelTier::Balanced)
                .cost_per_1k(0.003)
                .best_for(&["coding", "analysis", "general", "reasoning"])
                .build(),
        );
        catalog.register(
            ModelInfo::builder("opus-4", "claude-3-opus-20240229")
                .tier(ModelTier::Premium)
                .cost_per_1k(0.015)
                .best_for(&["architecture", "complex_analysis", "security_audit"])
                .build(),
        );
        catalog
    }

    /// Add a model, replacing any existing entry with the same alias.
    pub fn register(&mut self, info: ModelInfo) {
        if let Some(existing) = self.models.iter_mut().find(|m| m.alias == info.alias) {
            *existing = info;
        } else {
            self.models.push(info);
        }
    }

    /// Look up a model by alias or API name.
    pub fn get(&self, name: &str) -> Option<&ModelInfo> {
        self.models.iter().find(|m| m.matches(name))
    }

    /// Per-thousand-token rate for a model.
    pub fn rate(&self, name: &str) -> Result<f64> {
        self.get(name)
            .map(|m| m.cost_per_1k_tokens)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// All models in registration order.
    pub fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The model with the lowest rate. Ties keep registration order.
    pub fn cheapest(&self) -> Option<&ModelInfo> {
        self.models.iter().reduce(|best, m| {
            if m.cost_per_1k_tokens < best.cost_per_1k_tokens {
                m
            } else {
                best
            }
        })
    }

    /// The model in the highest tier, preferring the higher rate within a tier.
    pub fn most_capable(&self) -> Option<&ModelInfo> {
        self.models.iter().reduce(|best, m| {
            let better = m.tier > best.tier
                || (m.tier == best.tier && m.cost_per_1k_tokens > best.cost_per_1k_tokens);
            if better { m } else { best }
        })
    }

    /// The first balanced-tier model, or the median-priced model when the
    /// catalog has no balanced entry.
    pub fn balanced(&self) -> Option<&ModelInfo> {
        if let Some(m) = self.models.iter().find(|m| m.tier == ModelTier::Balanced) {
            return Some(m);
        }
        let mut by_cost: Vec<&ModelInfo> = self.models.iter().collect();
        by_cost.sort_by(|a, b| a.cost_per_1k_tokens.total_cmp(&b.cost_per_1k_tokens));
        by_cost.get(by_cost.len() / 2).copied()
    }
}
