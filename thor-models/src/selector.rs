//! Budget-aware model selection.
//!
//! [`ModelSelector`] maps a task classification and the day's spend onto a
//! model from the [`ModelCatalog`]. It never records usage; that belongs to
//! the cost ledger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::ModelCatalog;
use crate::types::ModelInfo;
use crate::{Error, Result};

/// Classification of a task for model routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskClass {
    Architecture,
    SecurityAudit,
    ComplexAnalysis,
    SimpleQuery,
    QuickAnswer,
    General,
}

impl TaskClass {
    /// Parse a classification string. Unrecognised strings are `General`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "architecture" => TaskClass::Architecture,
            "security_audit" => TaskClass::SecurityAudit,
            "complex_analysis" => TaskClass::ComplexAnalysis,
            "simple_query" => TaskClass::SimpleQuery,
            "quick_answer" | "quick_response" => TaskClass::QuickAnswer,
            _ => TaskClass::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskClass::Architecture => "architecture",
            TaskClass::SecurityAudit => "security_audit",
            TaskClass::ComplexAnalysis => "complex_analysis",
            TaskClass::SimpleQuery => "simple_query",
            TaskClass::QuickAnswer => "quick_answer",
            TaskClass::General => "general",
        }
    }

    fn wants_capability(&self) -> bool {
        matches!(
            self,
            TaskClass::Architecture | TaskClass::SecurityAudit | TaskClass::ComplexAnalysis
        )
    }

    fn wants_speed(&self) -> bool {
        matches!(self, TaskClass::SimpleQuery | TaskClass::QuickAnswer)
    }
}

impl FromStr for TaskClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(TaskClass::parse(s))
    }
}

impl fmt::Display for TaskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chooses models from a catalog and prices token usage.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    catalog: ModelCatalog,
}

impl ModelSelector {
    /// Create a selector. The catalog must contain at least one model.
    pub fn new(catalog: ModelCatalog) -> Result<Self> {
        if catalog.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self { catalog })
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Pick the model for a task.
    ///
    /// Once the day's spend reaches the budget the cheapest model wins no
    /// matter what the task asks for. Otherwise capability-heavy classes get
    /// the most capable model, quick classes get the cheapest, and everything
    /// else gets the balanced default.
    pub fn choose(&self, class: TaskClass, daily_cost: f64, daily_budget: f64) -> &ModelInfo {
        let pick = if daily_cost >= daily_budget {
            warn!(
                daily_cost,
                daily_budget,
                class = %class,
                "daily budget reached, using cheapest model"
            );
            self.catalog.cheapest()
        } else if class.wants_capability() {
            self.catalog.most_capable()
        } else if class.wants_speed() {
            self.catalog.cheapest()
        } else {
            self.catalog.balanced()
        };
        // The constructor rejects empty catalogs, so every pick is Some.
        match pick {
            Some(info) => info,
            None => &self.catalog.models()[0],
        }
    }

    /// API model name for a classification string.
    pub fn choose_model(&self, classification: &str, daily_cost: f64, daily_budget: f64) -> &str {
        &self
            .choose(TaskClass::parse(classification), daily_cost, daily_budget)
            .name
    }

    /// Estimated cost of a call: `(input + output) * rate / 1000`.
    pub fn estimate_cost(&self, input_tokens: u64, output_tokens: u64, model: &str) -> Result<f64> {
        let rate = self.catalog.rate(model)?;
        Ok((input_tokens + output_tokens) as f64 * rate / 1000.0)
    }
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self {
            catalog: ModelCatalog::with_defaults(),
        }
    }
}
