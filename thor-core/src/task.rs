//! Task records
//!
//! A task is one call to `orchestrate`: a description, the agents it was
//! resolved to, the coordination mode, and the outcome of every step that
//! ran.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::{AgentId, AgentType};

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the agents of a task cooperate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskMode {
    /// Pipeline: each agent gets the previous successful output
    #[default]
    Sequential,
    /// Fan-out: every agent gets the original description
    Parallel,
    /// First agent briefs the rest, who then run in parallel
    Hierarchical,
}

impl TaskMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskMode::Sequential => "sequential",
            TaskMode::Parallel => "parallel",
            TaskMode::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(TaskMode::Sequential),
            "parallel" => Ok(TaskMode::Parallel),
            "hierarchical" => Ok(TaskMode::Hierarchical),
            other => Err(format!("unknown coordination mode: {other}")),
        }
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Error,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Error => "error",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one agent step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn succeeded(
        agent_id: AgentId,
        agent_type: AgentType,
        output: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            agent_id,
            agent_type,
            success: true,
            output: Some(output),
            error: None,
            duration_ms,
        }
    }

    pub fn failed(
        agent_id: AgentId,
        agent_type: AgentType,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            agent_id,
            agent_type,
            success: false,
            output: None,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// A submitted unit of work and, once terminal, its results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub agents: Vec<AgentId>,
    pub mode: TaskMode,
    pub status: TaskStatus,
    pub results: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(
        id: TaskId,
        description: impl Into<String>,
        agents: Vec<AgentId>,
        mode: TaskMode,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            agents,
            mode,
            status: TaskStatus::Pending,
            results: Vec::new(),
            error: None,
            created_at,
            finished_at: None,
        }
    }

    /// Move to a terminal state. Has no effect on a task that is already terminal.
    pub(crate) fn finish(
        &mut self,
        status: TaskStatus,
        results: Vec<StepOutcome>,
        error: Option<String>,
        at: DateTime<Utc>,
    ) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.results = results;
        self.error = error;
        self.finished_at = Some(at);
    }

    /// The caller-facing view of this task
    pub fn result(&self) -> TaskResult {
        TaskResult {
            task_id: self.id,
            status: self.status,
            mode: self.mode,
            results: self.results.clone(),
            error: self.error.clone(),
        }
    }
}

/// What `orchestrate` returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub mode: TaskMode,
    pub results: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn succeeded_steps(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Output of the last successful step
    pub fn final_output(&self) -> Option<&str> {
        self.results
            .iter()
            .rev()
            .find(|r| r.success)
            .and_then(|r| r.output.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_known_names() {
        assert_eq!("parallel".parse::<TaskMode>().unwrap(), TaskMode::Parallel);
        assert_eq!(
            "Hierarchical".parse::<TaskMode>().unwrap(),
            TaskMode::Hierarchical
        );
        assert!("swarm".parse::<TaskMode>().is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    #[test]
    fn terminal_task_is_immutable() {
        let now = Utc::now();
        let mut task = Task::new(TaskId::new(), "x", vec![], TaskMode::Parallel, now);
        task.finish(TaskStatus::Error, vec![], Some("boom".into()), now);
        task.finish(TaskStatus::Completed, vec![], None, now);

        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error.as_deref(), Some("boom"));
    }

    #[test]
    fn final_output_skips_failures() {
        let a = AgentId::new();
        let result = TaskResult {
            task_id: TaskId::new(),
            status: TaskStatus::Completed,
            mode: TaskMode::Sequential,
            results: vec![
                StepOutcome::succeeded(a, AgentType::Business, "first".into(), 1),
                StepOutcome::failed(a, AgentType::Legal, "nope", 1),
            ],
            error: None,
        };
        assert_eq!(result.final_output(), Some("first"));
        assert_eq!(result.succeeded_steps(), 1);
    }

    #[test]
    fn step_outcome_omits_empty_fields() {
        let outcome = StepOutcome::failed(AgentId::new(), AgentType::Legal, "timeout", 5);
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("output").is_none());
        assert_eq!(json["error"], "timeout");
        assert_eq!(json["agent_type"], "legal");
    }
}
