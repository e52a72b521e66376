//! Agent type definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AgentError;

/// Unique identifier for an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create a new agent ID using UUID v7 (time-ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Specialisation of an agent
///
/// Determines the agent's capabilities and execution profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Business,
    Legal,
    Science,
    Healthcare,
    Financial,
    Technical,
    Creative,
}

impl AgentType {
    pub const ALL: [AgentType; 7] = [
        AgentType::Business,
        AgentType::Legal,
        AgentType::Science,
        AgentType::Healthcare,
        AgentType::Financial,
        AgentType::Technical,
        AgentType::Creative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Business => "business",
            AgentType::Legal => "legal",
            AgentType::Science => "science",
            AgentType::Healthcare => "healthcare",
            AgentType::Financial => "financial",
            AgentType::Technical => "technical",
            AgentType::Creative => "creative",
        }
    }

    /// Fixed capability set for this type.
    pub fn capabilities(&self) -> &'static [&'static str] {
        match self {
            AgentType::Business => &["market_analysis", "strategy", "competitive_intelligence"],
            AgentType::Legal => &["contract_review", "compliance", "legal_research"],
            AgentType::Science => &["research", "data_analysis", "literature_review"],
            AgentType::Healthcare => &["clinical_review", "medical_research", "patient_guidance"],
            AgentType::Financial => &["financial_analysis", "risk_assessment", "compliance_check"],
            AgentType::Technical => &["code_review", "architecture", "debugging"],
            AgentType::Creative => &["writing", "ideation", "editing"],
        }
    }

    /// Execution profile used when building prompts for this type.
    pub fn profile(&self) -> AgentProfile {
        let mut profile = AgentProfile {
            max_tokens: 4000,
            temperature: 0.7,
            specialization: format!("{}_analysis", self.as_str()),
            flags: Vec::new(),
        };
        match self {
            AgentType::Legal => {
                profile.specialization = "legal_analysis".into();
                profile.flags = vec!["citation_required".into(), "jurisdiction: general".into()];
            }
            AgentType::Financial => {
                profile.specialization = "financial_analysis".into();
                profile.flags = vec!["risk_assessment".into(), "compliance_check".into()];
            }
            AgentType::Business => {
                profile.specialization = "business_strategy".into();
                profile.flags = vec!["market_analysis".into(), "competitive_intelligence".into()];
            }
            _ => {}
        }
        profile
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        AgentType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| AgentError::UnknownAgentType(s.to_string()))
    }
}

/// Agent execution status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Waiting for work
    #[default]
    Idle,
    /// Running a sequential or supervisor step
    Active,
    /// Running one of several concurrent steps
    Busy,
    /// Marked faulty by an operator
    Error,
    /// Taken out of rotation
    Offline,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Active => "active",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
            AgentStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-type execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub max_tokens: u32,
    pub temperature: f32,
    pub specialization: String,
    pub flags: Vec<String>,
}

impl AgentProfile {
    /// System prompt describing the agent's role to the model.
    pub fn system_prompt(&self, agent_type: AgentType) -> String {
        let mut prompt = format!(
            "You are a {agent_type} specialist agent working as part of a coordinated team. \
             Your specialization is {}.",
            self.specialization.replace('_', " ")
        );
        if !self.flags.is_empty() {
            prompt.push_str(" Always apply: ");
            prompt.push_str(&self.flags.join(", ").replace('_', " "));
            prompt.push('.');
        }
        prompt.push_str(" Be concise and concrete.");
        prompt
    }
}

/// Success counters for an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub last_active: Option<DateTime<Utc>>,
}

impl AgentMetrics {
    /// completed / (completed + failed), or 1.0 before the first task.
    pub fn success_rate(&self) -> f64 {
        let total = self.tasks_completed + self.tasks_failed;
        if total == 0 {
            1.0
        } else {
            self.tasks_completed as f64 / total as f64
        }
    }

    pub(crate) fn record(&mut self, success: bool, at: DateTime<Utc>) {
        if success {
            self.tasks_completed += 1;
        } else {
            self.tasks_failed += 1;
        }
        self.last_active = Some(at);
    }
}

/// A registered agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub agent_type: AgentType,
    pub status: AgentStatus,
    pub capabilities: Vec<String>,
    pub metrics: AgentMetrics,
    pub profile: AgentProfile,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Create an idle agent of the given type
    pub fn new(agent_type: AgentType, created_at: DateTime<Utc>) -> Self {
        Self {
            id: AgentId::new(),
            agent_type,
            status: AgentStatus::Idle,
            capabilities: agent_type
                .capabilities()
                .iter()
                .map(|c| c.to_string())
                .collect(),
            metrics: AgentMetrics::default(),
            profile: agent_type.profile(),
            created_at,
        }
    }

    /// Short display name, e.g. `legal-0192f3a1`
    pub fn name(&self) -> String {
        let id = self.id.to_string();
        format!("{}-{}", self.agent_type, &id[id.len() - 8..])
    }
}
