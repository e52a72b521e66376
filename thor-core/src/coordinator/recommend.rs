//! Keyword routing from a task description to agent types

use crate::agent::AgentType;

const ROUTES: &[(AgentType, &[&str])] = &[
    (
        AgentType::Legal,
        &["legal", "contract", "law", "compliance", "regulation"],
    ),
    (
        AgentType::Financial,
        &["financial", "budget", "investment", "cost", "profit"],
    ),
    (
        AgentType::Business,
        &["business", "strategy", "market", "competition"],
    ),
    (
        AgentType::Science,
        &["research", "analysis", "scientific", "data"],
    ),
    (
        AgentType::Healthcare,
        &["health", "medical", "clinical", "patient"],
    ),
];

/// Agent types whose keywords appear in `description`, in routing order.
///
/// Falls back to a single business agent when nothing matches.
pub fn recommend_agents(description: &str) -> Vec<AgentType> {
    let lower = description.to_lowercase();
    let picks: Vec<_> = ROUTES
        .iter()
        .filter(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(agent_type, _)| *agent_type)
        .collect();

    if picks.is_empty() {
        vec![AgentType::Business]
    } else {
        picks
    }
}
