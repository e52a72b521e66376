//! Task coordination across agents
//!
//! The Coordinator turns a description and a list of agent types into a
//! finished [`Task`]:
//! - Types are parsed and agents resolved before anything runs
//! - Steps dispatch sequentially, in parallel, or supervisor-first
//! - The kill switch is honoured between steps
//! - Finished tasks land in an in-memory history and, when a ledger is
//!   attached, in the conversation log keyed by task id

mod hierarchical;
mod parallel;
mod recommend;
mod sequential;
mod step;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

pub use recommend::recommend_agents;

use crate::agent::{AgentExecutor, AgentId, AgentRegistry, AgentType};
use crate::error::AgentError;
use crate::kill_switch::KillSwitch;
use crate::ledger::{Clock, Ledger, MessageRole, SystemClock};
use crate::task::{StepOutcome, Task, TaskId, TaskMode, TaskResult, TaskStatus};
use step::StepRunner;

/// Coordinator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Concurrent steps per orchestration in parallel and hierarchical modes
    pub max_parallel: usize,
    /// Limit on a single step; exceeding it fails the step
    pub step_timeout: Duration,
    /// Finished tasks kept in history; the oldest go first
    pub history_limit: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            step_timeout: Duration::from_secs(300),
            history_limit: 1000,
        }
    }
}

/// Output of a dispatch strategy
struct Dispatch {
    results: Vec<StepOutcome>,
    /// True if the kill switch kept at least one step from starting
    cancelled: bool,
}

/// Runs tasks across agents and keeps their history
pub struct Coordinator {
    registry: Arc<AgentRegistry>,
    runner: StepRunner,
    kill_switch: KillSwitch,
    config: CoordinatorConfig,
    clock: Arc<dyn Clock>,
    ledger: Option<Arc<Ledger>>,
    history: RwLock<VecDeque<Task>>,
}

impl Coordinator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        executor: Arc<dyn AgentExecutor>,
        kill_switch: KillSwitch,
        config: CoordinatorConfig,
    ) -> Self {
        let runner = StepRunner {
            registry: registry.clone(),
            executor,
            step_timeout: config.step_timeout,
        };
        Self {
            registry,
            runner,
            kill_switch,
            config,
            clock: Arc::new(SystemClock),
            ledger: None,
            history: RwLock::new(VecDeque::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Log each task's description and outputs to this ledger
    pub fn with_ledger(mut self, ledger: Arc<Ledger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Run a task to a terminal state.
    ///
    /// Never fails: problems before dispatch give an `error` result with no
    /// agents created, and step failures are recorded in the results.
    #[instrument(skip(self, description, agent_types))]
    pub async fn orchestrate<S: AsRef<str>>(
        &self,
        description: &str,
        agent_types: &[S],
        mode: TaskMode,
    ) -> TaskResult {
        let task_id = TaskId::new();

        let types = match parse_types(agent_types) {
            Ok(types) => types,
            Err(e) => {
                warn!(%task_id, error = %e, "task rejected");
                let now = self.clock.now();
                let mut task = Task::new(task_id, description, Vec::new(), mode, now);
                task.finish(TaskStatus::Error, Vec::new(), Some(e.to_string()), now);
                return self.archive(task).await;
            }
        };

        let agents: Vec<(AgentId, AgentType)> = self
            .registry
            .resolve(&types)
            .await
            .into_iter()
            .zip(&types)
            .map(|((id, _), &agent_type)| (id, agent_type))
            .collect();
        let mut task = Task::new(
            task_id,
            description,
            agents.iter().map(|(id, _)| *id).collect(),
            mode,
            self.clock.now(),
        );
        info!(%task_id, agents = agents.len(), "task started");

        let dispatch = if self.kill_switch.is_engaged() {
            Dispatch {
                results: Vec::new(),
                cancelled: true,
            }
        } else {
            match mode {
                TaskMode::Sequential => {
                    sequential::run(&self.runner, &self.kill_switch, &agents, description).await
                }
                TaskMode::Parallel => {
                    parallel::run(
                        &self.runner,
                        &self.kill_switch,
                        &agents,
                        description,
                        self.config.max_parallel,
                    )
                    .await
                }
                TaskMode::Hierarchical => {
                    hierarchical::run(
                        &self.runner,
                        &self.kill_switch,
                        &agents,
                        description,
                        self.config.max_parallel,
                    )
                    .await
                }
            }
        };

        // Steps that ran released their agents; the rest were skipped
        for &(agent_id, _) in &agents {
            if !dispatch.results.iter().any(|r| r.agent_id == agent_id) {
                self.registry.release(agent_id).await;
            }
        }

        let (status, error) = if dispatch.cancelled || self.kill_switch.is_engaged() {
            let reason = self
                .kill_switch
                .reason()
                .unwrap_or_else(|| "kill switch engaged".to_string());
            (TaskStatus::Cancelled, Some(format!("cancelled: {reason}")))
        } else {
            (TaskStatus::Completed, None)
        };
        task.finish(status, dispatch.results, error, self.clock.now());
        info!(
            %task_id,
            status = %task.status,
            steps = task.results.len(),
            succeeded = task.results.iter().filter(|r| r.success).count(),
            "task finished"
        );

        self.audit(&task).await;
        self.archive(task).await
    }

    /// Snapshot of the retained tasks, oldest first
    pub async fn tasks(&self) -> Vec<Task> {
        self.history.read().await.iter().cloned().collect()
    }

    pub async fn task(&self, id: TaskId) -> Option<Task> {
        self.history
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn recommend_agents(&self, description: &str) -> Vec<AgentType> {
        recommend_agents(description)
    }

    async fn archive(&self, task: Task) -> TaskResult {
        let result = task.result();
        let mut history = self.history.write().await;
        history.push_back(task);
        while history.len() > self.config.history_limit {
            history.pop_front();
        }
        result
    }

    async fn audit(&self, task: &Task) {
        let Some(ledger) = &self.ledger else {
            return;
        };
        let session = task.id.to_string();
        let outputs = task
            .results
            .iter()
            .filter(|r| r.success)
            .filter_map(|r| r.output.as_deref());

        let entries = std::iter::once((MessageRole::User, task.description.as_str()))
            .chain(outputs.map(|o| (MessageRole::Assistant, o)));
        for (role, content) in entries {
            if let Err(e) = ledger.append_message(&session, role, content).await {
                warn!(task_id = %task.id, error = %e, "could not log task to ledger");
                return;
            }
        }
    }
}

/// Parse every requested type up front so a typo creates no agents
fn parse_types<S: AsRef<str>>(names: &[S]) -> Result<Vec<AgentType>, AgentError> {
    if names.is_empty() {
        return Err(AgentError::NoAgentsRequested);
    }
    names.iter().map(|n| n.as_ref().trim().parse()).collect()
}
