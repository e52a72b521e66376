//! Simulated agent execution
//!
//! SimulatedExecutor answers every step with a templated string after a
//! fixed delay. It backs the CLI's `--simulate` mode and gives tests
//! control over timing and failures per agent type.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::executor::AgentExecutor;
use super::types::{Agent, AgentId, AgentType};
use crate::error::ExecutionError;

/// One recorded call to [`SimulatedExecutor::execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub input: String,
}

/// Executor that fakes work with a delay and a templated reply
pub struct SimulatedExecutor {
    delay: Duration,
    type_delays: HashMap<AgentType, Duration>,
    failing: HashSet<AgentType>,
    invocations: Mutex<Vec<Invocation>>,
}

impl SimulatedExecutor {
    /// Create with the default delay for every type
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            type_delays: HashMap::new(),
            failing: HashSet::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Use a different delay for one agent type
    pub fn with_type_delay(mut self, agent_type: AgentType, delay: Duration) -> Self {
        self.type_delays.insert(agent_type, delay);
        self
    }

    /// Make every step of this agent type fail
    pub fn failing(mut self, agent_type: AgentType) -> Self {
        self.failing.insert(agent_type);
        self
    }

    /// Every call made so far, in start order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The reply produced for a type and input
    pub fn render(agent_type: AgentType, input: &str) -> String {
        format!("[{agent_type} agent] Processed task: {input}")
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl AgentExecutor for SimulatedExecutor {
    async fn execute(&self, agent: &Agent, input: &str) -> Result<String, ExecutionError> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Invocation {
                agent_id: agent.id,
                agent_type: agent.agent_type,
                input: input.to_string(),
            });

        let delay = self
            .type_delays
            .get(&agent.agent_type)
            .copied()
            .unwrap_or(self.delay);
        debug!(agent = %agent.name(), ?delay, "simulating step");
        tokio::time::sleep(delay).await;

        if self.failing.contains(&agent.agent_type) {
            return Err(ExecutionError::Failed(format!(
                "simulated failure for {} agent",
                agent.agent_type
            )));
        }
        Ok(Self::render(agent.agent_type, input))
    }
}
